//! Server configuration.
//!
//! Values are layered with figment: built-in defaults, then an optional TOML
//! file, then `TASKDECK_`-prefixed environment variables (nested keys are
//! split on `__`, e.g. `TASKDECK_SESSION__COOKIE_NAME`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file, overridable with `TASKDECK_CONFIG`
pub const DEFAULT_CONFIG_FILE: &str = "taskdeck.toml";

/// Firebase secure-token signing keys
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

pub const DEFAULT_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";

/// Seven days, in seconds
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Configuration for the taskdeck server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub max_age_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            max_age_secs: SESSION_MAX_AGE_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Upper bound on a single token verification; exceeding it redirects to login
    pub verify_timeout_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            verify_timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub project_id: String,
    pub api_key: String,
    pub jwks_url: String,
    pub toolkit_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            toolkit_url: DEFAULT_TOOLKIT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::Development,
            session: SessionConfig::default(),
            gate: GateConfig::default(),
            identity: IdentityConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    /// Load from `TASKDECK_CONFIG` (or `taskdeck.toml`) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("TASKDECK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(path)
    }

    /// Load from a specific TOML file; a missing file is not an error
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path).extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TASKDECK_").split("__"))
    }

    /// Configuration for tests: loopback host, the given port (0 = any)
    pub fn test_config_with_port(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            identity: IdentityConfig {
                project_id: "taskdeck-test".to_string(),
                ..IdentityConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.cookie_name.is_empty() {
            return Err(invalid("session.cookie_name", "cannot be empty"));
        }

        if self.session.max_age_secs <= 0 {
            return Err(invalid("session.max_age_secs", "must be positive"));
        }

        if self.gate.verify_timeout_ms == 0 {
            return Err(invalid("gate.verify_timeout_ms", "must be at least 1"));
        }

        if self.backend.timeout_ms == 0 {
            return Err(invalid("backend.timeout_ms", "must be at least 1"));
        }

        if self.is_production() && self.identity.project_id.is_empty() {
            return Err(invalid("identity.project_id", "required in production"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.gate.verify_timeout_ms)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
