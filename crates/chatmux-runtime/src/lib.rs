//! chatmux runtime - connection lifecycle for chatmux bots.
//!
//! This crate provides:
//! - [`ChatBot`]: authentication handshake, identity broadcast and the
//!   dispatch loop over a [`Connection`](chatmux_core::Connection)
//! - [`BotHandle`]: the [`Bot`](chatmux_core::Bot) given to handlers, with
//!   simulated typing on replies
//! - Configuration loading ([`config`]) and logging setup ([`logging`])
//!
//! ```ignore
//! use chatmux_runtime::{ChatBot, config::load_config, logging};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let mut bot = ChatBot::from_config(connect().await?, &config);
//!     bot.router_mut().hear("^ping$").handler(ping)?;
//!
//!     let quit = CancellationToken::new();
//!     bot.run(quit.clone()).await?.await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use bot::{BotHandle, ChatBot, typing_delay};
pub use config::{BotSettings, ChatmuxConfig, ConfigError, ConfigLoader, ConfigResult};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

pub use tokio_util::sync::CancellationToken;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
