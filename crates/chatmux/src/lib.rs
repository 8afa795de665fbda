//! # chatmux
//!
//! A mux-style event router for chat bots.
//!
//! Incoming events are matched, in registration order, against a table of
//! rules. The first rule that fully matches runs its handler:
//!
//! ```text
//! ┌────────────┐     ┌─────────┐     ┌────────────┐     ┌────────┐     ┌─────────┐
//! │ Connection │────▶│ ChatBot │────▶│ Dispatcher │────▶│ Router │────▶│ Handler │
//! └────────────┘     └─────────┘     └────────────┘     └────────┘     └─────────┘
//!                   authenticate                        first match    own task
//! ```
//!
//! - **Connection**: the transport to a chat service, implemented by you
//! - **Router / Route**: ordered rules built from regex, message-type and
//!   closure matchers, optionally nesting subrouters
//! - **Handler**: async function receiving the [`RouteContext`](prelude::RouteContext)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chatmux::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = ChatBot::new(connect().await?);
//!
//!     bot.router_mut()
//!         .hear("(?i)how are you")
//!         .message_handler(|_ctx, bot, event| async move {
//!             if let (Some(bot), Some(event)) = (bot, event) {
//!                 bot.reply(&*event, "A bit tired. You get it? A bit?").await.ok();
//!             }
//!         })?;
//!
//!     let quit = CancellationToken::new();
//!     bot.run(quit).await?.await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `chatmux.toml` (default)
//! - `json-log`: JSON log output

pub use chatmux_core as core;
pub use chatmux_framework as framework;
pub use chatmux_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use chatmux::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use chatmux_runtime::{
        BotHandle, BotSettings, CancellationToken, ChatBot, ChatmuxConfig, ConfigLoader,
        LoggingBuilder, RuntimeError, RuntimeResult,
    };

    // Routing
    pub use chatmux_framework::{
        BuildError, BuildResult, Dispatcher, Matcher, MessageType, Route, RouteMatch, Router,
        is_direct_mention, is_direct_message, is_mentioned, strip_direct_mention,
    };

    // Core types
    pub use chatmux_core::{
        ApiError, ApiResult, Bot, BoxedBot, BoxedConnection, BoxedEvent, ChannelKind,
        Connection, ConnectionEvent, Event, MessageEvent, RouteContext, TransportError,
        TransportResult,
    };

    // Logging macros
    pub use chatmux_runtime::prelude::*;
}
