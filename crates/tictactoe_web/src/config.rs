//! Application configuration.
//!
//! Values are resolved in layers: built-in defaults, an optional TOML
//! file, the `APP_ENVIRONMENT` variable and finally command-line flags.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Environment variable naming the hosting environment.
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Hosting environment. Controls the exception handler and HSTS.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    /// Local development: detailed errors, no HSTS.
    Development,
    /// Pre-production.
    Staging,
    /// Production (the default).
    #[default]
    Production,
}

// Accepts any casing, as the environment variable and CLI do.
impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(|_| {
            de::Error::unknown_variant(&value, &["development", "staging", "production"])
        })
    }
}

impl Environment {
    /// Whether this is the development environment.
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address to bind.
    host: String,
    /// Plain HTTP port.
    port: u16,
    /// Port HTTPS redirection points at. No redirection when unset.
    https_port: Option<u16>,
    /// Hosting environment.
    environment: Environment,
    /// Directory served as static files.
    web_root: PathBuf,
    /// `max-age` of the Strict-Transport-Security header.
    hsts_max_age_secs: u64,
    /// Bearer token guarding the reset action. Anyone may reset when unset.
    reset_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            https_port: None,
            environment: Environment::default(),
            web_root: PathBuf::from("wwwroot"),
            hsts_max_age_secs: 30 * 24 * 60 * 60,
            reset_token: None,
        }
    }
}

/// Values given on the command line. `None` keeps the lower layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Address to bind.
    pub host: Option<String>,
    /// Plain HTTP port.
    pub port: Option<u16>,
    /// HTTPS redirection port.
    pub https_port: Option<u16>,
    /// Hosting environment.
    pub environment: Option<Environment>,
    /// Static file directory.
    pub web_root: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(environment = %config.environment, "Config loaded successfully");
        Ok(config)
    }

    /// Resolves the full configuration.
    ///
    /// `env_value` is the raw value of [`ENVIRONMENT_VAR`], passed in so
    /// callers decide where it comes from.
    #[instrument(skip(overrides, env_value))]
    pub fn resolve(
        file: Option<&Path>,
        env_value: Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(value) = env_value {
            config.environment = value.parse().map_err(|_| {
                ConfigError::new(format!("Unknown environment in {}: {}", ENVIRONMENT_VAR, value))
            })?;
        }

        if let Some(host) = overrides.host {
            config.host = host;
        }
        if let Some(port) = overrides.port {
            config.port = port;
        }
        if overrides.https_port.is_some() {
            config.https_port = overrides.https_port;
        }
        if let Some(environment) = overrides.environment {
            config.environment = environment;
        }
        if let Some(web_root) = overrides.web_root {
            config.web_root = web_root;
        }

        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    /// Returns a copy running in the given environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Returns a copy redirecting plain HTTP to the given HTTPS port.
    pub fn with_https_port(mut self, port: Option<u16>) -> Self {
        self.https_port = port;
        self
    }

    /// Returns a copy serving static files from `dir`.
    pub fn with_web_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.web_root = dir.into();
        self
    }

    /// Returns a copy guarding the reset action with `token`.
    pub fn with_reset_token(mut self, token: Option<String>) -> Self {
        self.reset_token = token;
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
