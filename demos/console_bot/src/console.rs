//! A [`Connection`] over the terminal.
//!
//! Every stdin line becomes a message. Prefixes pick the channel shape:
//!
//! - `/dm <text>`: private channel
//! - `/self <text>`: shared channel, authored by the bot itself
//! - anything else: shared channel

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chatmux::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::sync::Mutex;

const SHARED_CHANNEL: &str = "C0CONSOLE";
const PRIVATE_CHANNEL: &str = "D0CONSOLE";

pub struct ConsoleConnection {
    bot_id: String,
    user: String,
    connected: AtomicBool,
    lines: Mutex<Lines<BufReader<Stdin>>>,
    stdout: Mutex<Stdout>,
}

impl ConsoleConnection {
    pub fn new(bot_id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            user: user.into(),
            connected: AtomicBool::new(false),
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }

    fn parse_line(&self, line: &str) -> ConnectionEvent {
        let line = line.trim();
        if line.is_empty() {
            return ConnectionEvent::Other;
        }

        let (channel, user, text) = if let Some(text) = line.strip_prefix("/dm ") {
            (PRIVATE_CHANNEL, self.user.as_str(), text)
        } else if let Some(text) = line.strip_prefix("/self ") {
            (SHARED_CHANNEL, self.bot_id.as_str(), text)
        } else {
            (SHARED_CHANNEL, self.user.as_str(), line)
        };

        ConnectionEvent::Message(BoxedEvent::new(MessageEvent::new(channel, user, text)))
    }

    async fn print(&self, line: String) -> TransportResult<()> {
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for ConsoleConnection {
    async fn next_event(&self) -> Option<ConnectionEvent> {
        // The terminal needs no credentials; report the identity first.
        if !self.connected.swap(true, Ordering::SeqCst) {
            return Some(ConnectionEvent::Connected {
                user_id: self.bot_id.clone(),
            });
        }

        match self.lines.lock().await.next_line().await {
            Ok(Some(line)) => Some(self.parse_line(&line)),
            Ok(None) => None,
            Err(e) => Some(ConnectionEvent::Error(e.into())),
        }
    }

    async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()> {
        self.print(format!("[{channel}] {}: {text}", self.bot_id)).await
    }

    async fn send_typing(&self, channel: &str) -> TransportResult<()> {
        self.print(format!("[{channel}] {} is typing...", self.bot_id))
            .await
    }
}
