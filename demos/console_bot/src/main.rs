//! Console Bot Example
//!
//! Chat with a chatmux bot in the terminal. Each line you type is delivered
//! to the router as a message in a shared channel; prefix it with `/dm` to
//! send it privately, or with `/self` to post as the bot.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --bot-id chatmux --typing 1.0
//! ```
//!
//! Then try `ping`, `/dm help`, `@chatmux hi`, `echo hello` or `admin uptime`.

mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chatmux::prelude::*;
use chatmux::runtime::config::{LogOutput, validate_config};
use clap::Parser;
use tracing::{error, info};

use crate::console::ConsoleConnection;

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "A chatmux bot talking over stdin/stdout")]
struct Args {
    /// Identity the bot answers to.
    #[arg(long, default_value = "chatmux")]
    bot_id: String,

    /// Identity of the person typing.
    #[arg(long, default_value = "U0HUMAN")]
    user: String,

    /// User allowed to run `admin` commands (defaults to `--user`).
    #[arg(long)]
    admin: Option<String>,

    /// Typing delay multiplier, overriding the configuration.
    #[arg(long)]
    typing: Option<f64>,

    /// Configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every routing decision.
    #[arg(long)]
    debug: bool,
}

/// When the bot started, injected into admin command contexts.
#[derive(Debug, Clone, Copy)]
struct Started(Instant);

const HELP: &str = "Commands: ping, echo <text>, help (in private or when mentioned), \
                    admin uptime, admin whoami";

// ============================================================================
// Handlers
// ============================================================================

async fn reply(ctx: &RouteContext, text: &str) {
    let (Some(bot), Some(event)) = (ctx.bot(), ctx.event()) else {
        return;
    };
    if let Err(e) = bot.reply(&**event, text).await {
        error!(error = %e, "Failed to send reply");
    }
}

async fn ping(ctx: RouteContext) {
    reply(&ctx, "pong").await;
}

async fn help(ctx: RouteContext) {
    reply(&ctx, HELP).await;
}

async fn echo(ctx: RouteContext) {
    let text = ctx
        .event()
        .map(|e| strip_direct_mention(e.text()))
        .and_then(|text| text.strip_prefix("echo"))
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    reply(&ctx, &text).await;
}

async fn mentioned(ctx: RouteContext) {
    reply(&ctx, "You rang? Try `help`.").await;
}

async fn uptime(ctx: RouteContext) {
    let text = match ctx.get_state::<Started>() {
        Some(Started(at)) => format!("Up for {}s", at.elapsed().as_secs()),
        None => "Uptime unknown".to_string(),
    };
    reply(&ctx, &text).await;
}

async fn whoami(ctx: RouteContext) {
    let text = match ctx.bot() {
        Some(bot) => format!("I am {}", bot.id()),
        None => "I do not know who I am".to_string(),
    };
    reply(&ctx, &text).await;
}

// ============================================================================
// Rules
// ============================================================================

fn register_rules(router: &mut Router, admin: String) -> BuildResult<()> {
    router.hear("(?i)^ping$").name("ping").handler(ping)?;
    router.hear("^echo\\b").name("echo").handler(echo)?;
    router
        .messages([MessageType::DirectMessage, MessageType::DirectMention])
        .hear("(?i)^help$")
        .name("help")
        .handler(help)?;

    let started = Started(Instant::now());
    let admin_commands = router
        .hear("^admin\\b")
        .name("admin")
        .check(move |ctx: &RouteContext| ctx.event().is_some_and(|e| e.user() == admin))
        .preprocess(move |ctx| ctx.with_state(started))
        .subrouter();
    admin_commands
        .hear("^admin uptime$")
        .name("admin-uptime")
        .handler(uptime)?;
    admin_commands
        .hear("^admin whoami$")
        .name("admin-whoami")
        .handler(whoami)?;

    router
        .messages([MessageType::DirectMention])
        .name("mention")
        .handler(mentioned)?;

    // Only route that sees the bot's own messages.
    router
        .talk_to_self()
        .check(|ctx: &RouteContext| {
            ctx.bot()
                .zip(ctx.event())
                .is_some_and(|(bot, event)| bot.id() == event.user())
        })
        .name("own-message")
        .handler(|ctx: RouteContext| async move {
            if let Some(event) = ctx.event() {
                info!(text = event.text(), "Saw my own message");
            }
        })?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::new().file(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if let Some(multiplier) = args.typing {
        config.bot.typing_delay_multiplier = multiplier;
    }
    config.bot.debug |= args.debug;
    if config.logging.output == LogOutput::Stdout {
        config.logging.output = LogOutput::Stderr;
    }
    validate_config(&config)?;

    LoggingBuilder::from_config(&config.logging)
        .debug_routing(config.bot.debug)
        .init();

    let connection = Arc::new(ConsoleConnection::new(&args.bot_id, &args.user));
    let mut bot = ChatBot::from_config(connection, &config);
    let admin = args.admin.unwrap_or_else(|| args.user.clone());
    register_rules(bot.router_mut(), admin)?;

    let quit = CancellationToken::new();
    let mut task = bot.run(quit.clone()).await?;
    info!(bot_id = %args.bot_id, "Console bot ready, type a message");

    tokio::select! {
        result = &mut task => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            quit.cancel();
            task.await?;
        }
    }

    Ok(())
}
