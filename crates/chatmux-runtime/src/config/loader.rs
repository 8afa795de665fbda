//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides passed to [`ConfigLoader::merge`]
//! 3. Config file (`chatmux.toml`, with the `toml-config` feature)
//! 4. Environment variables (`CHATMUX_*`)
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `CHATMUX_` prefix with `__` as separator:
//!
//! - `CHATMUX_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `CHATMUX_BOT__TYPING_DELAY_MULTIPLIER=1.5` → `bot.typing_delay_multiplier = 1.5`
//!
//! # Example
//!
//! ```rust,ignore
//! use chatmux_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./deploy/chatmux.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::ChatmuxConfig;
use super::validation::validate_config;

/// File names searched in every search path, in order.
#[cfg(feature = "toml-config")]
const CONFIG_FILE_NAMES: &[&str] = &["chatmux.toml"];

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that searches the current directory and the user
    /// config directory, and reads environment variables.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    ///
    /// Once any search path is added, the default locations are not searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load. It must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration values programmatically, above the defaults.
    pub fn merge(mut self, config: ChatmuxConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<ChatmuxConfig> {
        let figment = self.build_figment()?;
        let config: ChatmuxConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            logging_level = %config.logging.level,
            typing_delay_multiplier = config.bot.typing_delay_multiplier,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ChatmuxConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with CHATMUX_ prefix");
            figment = figment.merge(Env::prefixed("CHATMUX_").split("__"));
        }

        Ok(figment)
    }

    /// Merges a single config file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("chatmux"));
        }
        paths
    }

    /// Merges the first config file found in the search paths.
    #[cfg(feature = "toml-config")]
    fn load_config_files(&self, figment: Figment) -> Figment {
        for search_path in self.resolve_search_paths() {
            for name in CONFIG_FILE_NAMES {
                let path = search_path.join(name);
                if path.exists() {
                    info!(path = %path.display(), "Loading configuration file");
                    return figment.merge(Toml::file(path));
                }
            }
        }

        debug!("No configuration file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn load_config_files(&self, figment: Figment) -> Figment {
        trace!(
            search_paths = ?self.resolve_search_paths(),
            "File configuration disabled, using defaults"
        );
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<ChatmuxConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ChatmuxConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================
