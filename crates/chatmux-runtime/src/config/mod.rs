//! Configuration module for the chatmux runtime.
//!
//! Settings are loaded with figment from built-in defaults, an optional
//! `chatmux.toml` and `CHATMUX_*` environment variables, then validated.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BotSettings, ChatmuxConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
