//! Bot lifecycle.
//!
//! [`ChatBot`] owns the [`Router`] while rules are registered, authenticates
//! against a [`Connection`](chatmux_core::Connection), and then hands the
//! frozen router to a [`Dispatcher`] running on its own task:
//!
//! ```rust,ignore
//! use chatmux_runtime::ChatBot;
//! use tokio_util::sync::CancellationToken;
//!
//! let mut bot = ChatBot::new(connection).with_debugging();
//! bot.router_mut().hear("(?i)how are you").handler(how_are_you)?;
//!
//! let quit = CancellationToken::new();
//! let task = bot.run(quit.clone()).await?;
//! // ...
//! quit.cancel();
//! task.await?;
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::config::{BotSettings, ChatmuxConfig};
use crate::error::{RuntimeError, RuntimeResult};
use chatmux_core::{ApiResult, Bot, BoxedConnection, ConnectionEvent, Event};
use chatmux_framework::{Dispatcher, Router};

/// Milliseconds of simulated typing per character at multiplier `1.0`.
const TYPING_MS_PER_CHAR: f64 = 2.0;

/// Computes the simulated typing time for a reply of `text_len` bytes.
///
/// Zero when `multiplier` is not positive, otherwise capped at `max`.
pub fn typing_delay(text_len: usize, multiplier: f64, max: Duration) -> Duration {
    if multiplier.is_nan() || multiplier <= 0.0 {
        return Duration::ZERO;
    }

    let millis = (text_len as f64 * TYPING_MS_PER_CHAR * multiplier).min(max.as_millis() as f64);
    Duration::from_nanos((millis * 1_000_000.0) as u64)
}

// ============================================================================
// Bot handle
// ============================================================================

/// The authenticated bot as seen by handlers.
///
/// Placed in every routing context by the dispatcher.
#[derive(Clone)]
pub struct BotHandle {
    id: String,
    connection: BoxedConnection,
    settings: BotSettings,
}

impl BotHandle {
    /// Creates a handle for the account `id` replying through `connection`.
    pub fn new(id: impl Into<String>, connection: BoxedConnection, settings: BotSettings) -> Self {
        Self {
            id: id.into(),
            connection,
            settings,
        }
    }

    /// Returns the typing settings in effect.
    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Sends a typing indicator, then waits as long as typing `text` would take.
    pub async fn type_by_message(&self, event: &dyn Event, text: &str) -> ApiResult<()> {
        let delay = typing_delay(
            text.len(),
            self.settings.typing_delay_multiplier,
            self.settings.max_typing_delay(),
        );

        self.typing(event).await?;
        if !delay.is_zero() {
            trace!(delay_ms = delay.as_millis() as u64, "Simulating typing");
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Bot for BotHandle {
    fn id(&self) -> &str {
        &self.id
    }

    async fn reply(&self, event: &dyn Event, text: &str) -> ApiResult<()> {
        if self.settings.typing_delay_multiplier > 0.0 {
            self.type_by_message(event, text).await?;
        }
        self.connection.send_message(event.channel(), text).await?;
        Ok(())
    }

    async fn typing(&self, event: &dyn Event) -> ApiResult<()> {
        self.connection.send_typing(event.channel()).await?;
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl std::fmt::Debug for BotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotHandle")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ChatBot
// ============================================================================

/// A bot bound to one connection.
pub struct ChatBot {
    connection: BoxedConnection,
    router: Router,
    settings: BotSettings,
    debugging: bool,
}

impl ChatBot {
    /// Creates a bot with default settings and an empty router.
    pub fn new(connection: BoxedConnection) -> Self {
        Self {
            connection,
            router: Router::new(),
            settings: BotSettings::default(),
            debugging: false,
        }
    }

    /// Creates a bot using the `bot` section of a loaded configuration.
    pub fn from_config(connection: BoxedConnection, config: &ChatmuxConfig) -> Self {
        Self {
            debugging: config.bot.debug,
            ..Self::new(connection).with_settings(config.bot.clone())
        }
    }

    /// Replaces the bot settings.
    pub fn with_settings(mut self, settings: BotSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Logs connection lifecycle details at debug level.
    pub fn with_debugging(mut self) -> Self {
        self.debugging = true;
        self
    }

    /// Returns the bot settings.
    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Returns the router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the router for registering rules.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Authenticates and starts dispatching events.
    ///
    /// Returns once authentication has completed; events are then handled on
    /// the returned task until `quit` is cancelled or the connection ends.
    /// Fails without touching the connection if the router has a build error.
    pub async fn run(mut self, quit: CancellationToken) -> RuntimeResult<JoinHandle<()>> {
        if let Some(err) = self.router.err() {
            error!(error = %err, "Refusing to start with invalid routing rules");
            return Err(err.clone().into());
        }

        let bot_id = self.authenticate(&quit).await?;
        info!(bot_id = %bot_id, routes = self.router.len(), "Bot connected");

        self.router.set_bot_id(&bot_id);
        let handle = BotHandle::new(bot_id, Arc::clone(&self.connection), self.settings);
        let dispatcher = Dispatcher::new(self.router).with_bot(Arc::new(handle));

        Ok(tokio::spawn(event_loop(
            self.connection,
            dispatcher,
            quit,
            self.debugging,
        )))
    }

    /// Waits for the connection to report the bot identity.
    ///
    /// Every other event, including messages, is dropped until then.
    async fn authenticate(&self, quit: &CancellationToken) -> RuntimeResult<String> {
        loop {
            tokio::select! {
                biased;

                () = quit.cancelled() => {
                    if self.debugging {
                        debug!("Quit event received during authentication");
                    }
                    return Err(RuntimeError::QuitDuringAuthentication);
                }

                event = self.connection.next_event() => match event {
                    Some(ConnectionEvent::Connected { user_id }) => {
                        if self.debugging {
                            debug!(user_id = %user_id, "Authenticated");
                        }
                        return Ok(user_id);
                    }
                    Some(ConnectionEvent::InvalidAuth) => {
                        return Err(RuntimeError::AuthenticationFailed);
                    }
                    Some(_) => {}
                    None => return Err(RuntimeError::ConnectionClosed),
                },
            }
        }
    }
}

impl std::fmt::Debug for ChatBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBot")
            .field("routes", &self.router.len())
            .field("settings", &self.settings)
            .field("debugging", &self.debugging)
            .finish_non_exhaustive()
    }
}

async fn event_loop(
    connection: BoxedConnection,
    dispatcher: Dispatcher,
    quit: CancellationToken,
    debugging: bool,
) {
    loop {
        tokio::select! {
            biased;

            () = quit.cancelled() => {
                if debugging {
                    debug!("Quit event received");
                }
                break;
            }

            event = connection.next_event() => match event {
                Some(ConnectionEvent::Message(event)) => {
                    dispatcher.dispatch(event);
                }
                Some(ConnectionEvent::Error(err)) => {
                    error!(error = %err, "Transport error");
                }
                Some(_) => {}
                None => {
                    info!("Connection closed");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmux_core::{
        BoxedEvent, Connection, MessageEvent, RouteContext, TransportError, TransportResult,
    };
    use tokio::sync::{Mutex, mpsc};
    use tokio::time::timeout;

    #[test]
    fn test_typing_delay_scales_with_length() {
        let max = Duration::from_millis(2000);
        assert_eq!(typing_delay(100, 1.0, max), Duration::from_millis(200));
        assert_eq!(typing_delay(100, 0.5, max), Duration::from_millis(100));
        assert_eq!(typing_delay(100, 5.0, max), Duration::from_millis(1000));
    }

    #[test]
    fn test_typing_delay_is_capped() {
        let max = Duration::from_millis(2000);
        assert_eq!(typing_delay(10_000, 1.0, max), max);
        assert_eq!(typing_delay(1, 1e300, max), max);
    }

    #[test]
    fn test_typing_delay_disabled() {
        let max = Duration::from_millis(2000);
        assert_eq!(typing_delay(100, 0.0, max), Duration::ZERO);
        assert_eq!(typing_delay(100, -1.0, max), Duration::ZERO);
        assert_eq!(typing_delay(100, f64::NAN, max), Duration::ZERO);
    }

    #[derive(Debug, PartialEq)]
    enum Outbound {
        Message { channel: String, text: String },
        Typing { channel: String },
    }

    struct ScriptedConnection {
        events: Mutex<mpsc::UnboundedReceiver<ConnectionEvent>>,
        outbound: mpsc::UnboundedSender<Outbound>,
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn next_event(&self) -> Option<ConnectionEvent> {
            self.events.lock().await.recv().await
        }

        async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()> {
            self.outbound
                .send(Outbound::Message {
                    channel: channel.to_string(),
                    text: text.to_string(),
                })
                .map_err(|_| TransportError::ConnectionClosed {
                    reason: "test receiver dropped".to_string(),
                })
        }

        async fn send_typing(&self, channel: &str) -> TransportResult<()> {
            self.outbound
                .send(Outbound::Typing {
                    channel: channel.to_string(),
                })
                .map_err(|_| TransportError::ConnectionClosed {
                    reason: "test receiver dropped".to_string(),
                })
        }
    }

    struct Harness {
        events: mpsc::UnboundedSender<ConnectionEvent>,
        outbound: mpsc::UnboundedReceiver<Outbound>,
        bot: ChatBot,
    }

    fn harness() -> Harness {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let connection = ScriptedConnection {
            events: Mutex::new(events_rx),
            outbound: outbound_tx,
        };

        Harness {
            events: events_tx,
            outbound: outbound_rx,
            bot: ChatBot::new(Arc::new(connection)),
        }
    }

    fn message(channel: &str, user: &str, text: &str) -> ConnectionEvent {
        ConnectionEvent::Message(BoxedEvent::new(MessageEvent::new(channel, user, text)))
    }

    fn register_ping(bot: &mut ChatBot) {
        bot.router_mut()
            .hear("^ping$")
            .handler(|ctx: RouteContext| async move {
                if let (Some(bot), Some(event)) = (ctx.bot(), ctx.event()) {
                    bot.reply(&**event, "pong").await.ok();
                }
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_auth_fails() {
        let h = harness();
        h.events.send(ConnectionEvent::InvalidAuth).unwrap();

        let err = h.bot.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_quit_during_auth_aborts() {
        let h = harness();
        let quit = CancellationToken::new();
        quit.cancel();

        let err = h.bot.run(quit).await.unwrap_err();
        assert!(matches!(err, RuntimeError::QuitDuringAuthentication));
        drop(h.events);
    }

    #[tokio::test]
    async fn test_closed_connection_during_auth() {
        let h = harness();
        drop(h.events);

        let err = h.bot.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_build_error_refuses_to_start() {
        let mut h = harness();
        h.bot.router_mut().hear("(");
        h.events
            .send(ConnectionEvent::Connected {
                user_id: "UBOT".to_string(),
            })
            .unwrap();

        let err = h.bot.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Build(_)));
    }

    #[tokio::test]
    async fn test_messages_are_dispatched_after_connecting() {
        let mut h = harness();
        register_ping(&mut h.bot);

        // Dropped: arrives before authentication.
        h.events.send(message("C1", "U1", "ping")).unwrap();
        h.events.send(ConnectionEvent::Other).unwrap();
        h.events
            .send(ConnectionEvent::Connected {
                user_id: "UBOT".to_string(),
            })
            .unwrap();

        let quit = CancellationToken::new();
        let task = h.bot.run(quit.clone()).await.unwrap();

        h.events
            .send(ConnectionEvent::Error(TransportError::Protocol(
                "bad frame".to_string(),
            )))
            .unwrap();
        h.events.send(message("C2", "U1", "ping")).unwrap();

        let sent = timeout(Duration::from_secs(1), h.outbound.recv())
            .await
            .unwrap();
        assert_eq!(
            sent,
            Some(Outbound::Message {
                channel: "C2".to_string(),
                text: "pong".to_string(),
            })
        );

        quit.cancel();
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        assert!(h.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_own_messages_are_ignored() {
        let mut h = harness();
        register_ping(&mut h.bot);
        h.events
            .send(ConnectionEvent::Connected {
                user_id: "UBOT".to_string(),
            })
            .unwrap();

        let task = h.bot.run(CancellationToken::new()).await.unwrap();
        h.events.send(message("C1", "UBOT", "ping")).unwrap();
        h.events.send(message("C1", "U1", "ping")).unwrap();

        let sent = timeout(Duration::from_secs(1), h.outbound.recv())
            .await
            .unwrap();
        assert_eq!(
            sent,
            Some(Outbound::Message {
                channel: "C1".to_string(),
                text: "pong".to_string(),
            })
        );

        // Dropping the sender ends the connection and the loop.
        drop(h.events);
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_simulate_typing() {
        let mut h = harness();
        h.bot = h.bot.with_settings(BotSettings {
            typing_delay_multiplier: 1.0,
            ..BotSettings::default()
        });
        register_ping(&mut h.bot);
        h.events
            .send(ConnectionEvent::Connected {
                user_id: "UBOT".to_string(),
            })
            .unwrap();

        let _task = h.bot.run(CancellationToken::new()).await.unwrap();
        h.events.send(message("C1", "U1", "ping")).unwrap();

        assert_eq!(
            h.outbound.recv().await,
            Some(Outbound::Typing {
                channel: "C1".to_string()
            })
        );
        let typed_at = tokio::time::Instant::now();
        assert_eq!(
            h.outbound.recv().await,
            Some(Outbound::Message {
                channel: "C1".to_string(),
                text: "pong".to_string(),
            })
        );
        // "pong" is 4 bytes at 2ms each.
        assert!(typed_at.elapsed() >= Duration::from_millis(8));
    }
}
