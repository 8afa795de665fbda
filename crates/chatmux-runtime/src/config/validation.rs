//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotSettings, ChatmuxConfig, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ChatmuxConfig) -> ConfigResult<()> {
    validate_bot_settings(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_settings(bot: &BotSettings) -> ConfigResult<()> {
    if !bot.typing_delay_multiplier.is_finite() {
        return Err(ConfigError::validation(
            "Typing delay multiplier must be a finite number",
        ));
    }

    if bot.typing_delay_multiplier < 0.0 {
        return Err(ConfigError::validation(format!(
            "Typing delay multiplier must not be negative, got {}",
            bot.typing_delay_multiplier
        )));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Log filter module name cannot be empty: {module:?}"
        )));
    }

    Ok(())
}
