//! Configuration management

use crate::error::{ErrorContext, PortalError, PortalResult};
use crate::types::{PortalConfig, SessionConfig, StorageBackendKind, StorageConfig};

use std::path::{Path, PathBuf};
use tracing::info;

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::File,
            data_dir: "~/.portal/data".to_string(),
            key_prefix: "portal:".to_string(),
            quota_bytes: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_role: "admin".to_string(),
            simulated_latency_ms: 500,
            login_timeout_ms: 10_000,
            token_key: "auth_token".to_string(),
            user_key: "auth_user".to_string(),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~` replaced by the home directory
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

/// Replace a leading `~` with the user's home directory, if one is known
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    PathBuf::from(path)
}

impl PortalConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PortalResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PortalError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: PortalConfig = toml::from_str(&content).map_err(|e| PortalError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> PortalResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| PortalError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| PortalError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Candidate config file locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|d| d.join("portal").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".portal").join("config.toml")),
            Some(PathBuf::from("portal.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from an explicit path, the first existing default path, or defaults
    pub fn load(explicit: Option<&Path>) -> PortalResult<Self> {
        if let Some(path) = explicit {
            info!("Loading configuration from {:?}", path);
            return Self::from_file(path);
        }

        for path in Self::default_paths() {
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                return Self::from_file(&path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Validate configuration
    pub fn validate(&self) -> PortalResult<()> {
        if self.storage.key_prefix.is_empty() {
            return Err(invalid(
                "storage.key_prefix must not be empty",
                "Set storage.key_prefix, e.g. \"portal:\"",
            ));
        }

        if self.storage.backend == StorageBackendKind::File && self.storage.data_dir.is_empty() {
            return Err(invalid(
                "storage.data_dir must be set for the file backend",
                "Set storage.data_dir or switch storage.backend to \"memory\"",
            ));
        }

        if self.storage.quota_bytes == Some(0) {
            return Err(invalid(
                "storage.quota_bytes must be greater than 0 when set",
                "Remove storage.quota_bytes to disable the quota",
            ));
        }

        if self.session.token_key.is_empty() || self.session.user_key.is_empty() {
            return Err(invalid(
                "session.token_key and session.user_key must not be empty",
                "Use the defaults \"auth_token\" and \"auth_user\"",
            ));
        }

        if self.session.token_key == self.session.user_key {
            return Err(invalid(
                "session.token_key and session.user_key must differ",
                "Use distinct keys for the token and the user profile",
            ));
        }

        if self.session.login_timeout_ms <= self.session.simulated_latency_ms {
            return Err(invalid(
                "session.login_timeout_ms must exceed session.simulated_latency_ms",
                "Raise login_timeout_ms or lower simulated_latency_ms",
            ));
        }

        Ok(())
    }
}

/// Dotted keys accepted by [`PortalConfig::get_value`] and [`PortalConfig::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "storage.backend",
    "storage.data_dir",
    "storage.key_prefix",
    "storage.quota_bytes",
    "session.default_role",
    "session.simulated_latency_ms",
    "session.login_timeout_ms",
    "session.token_key",
    "session.user_key",
];

impl PortalConfig {
    /// Read a single value by dotted key, e.g. `session.token_key`
    pub fn get_value(&self, key: &str) -> PortalResult<String> {
        let parts: Vec<&str> = key.split('.').collect();
        let value = match parts.as_slice() {
            ["storage", "backend"] => self.storage.backend.to_string(),
            ["storage", "data_dir"] => self.storage.data_dir.clone(),
            ["storage", "key_prefix"] => self.storage.key_prefix.clone(),
            ["storage", "quota_bytes"] => self
                .storage
                .quota_bytes
                .map(|q| q.to_string())
                .unwrap_or_else(|| "none".to_string()),
            ["session", "default_role"] => self.session.default_role.clone(),
            ["session", "simulated_latency_ms"] => self.session.simulated_latency_ms.to_string(),
            ["session", "login_timeout_ms"] => self.session.login_timeout_ms.to_string(),
            ["session", "token_key"] => self.session.token_key.clone(),
            ["session", "user_key"] => self.session.user_key.clone(),
            _ => return Err(unknown_key(key, "config_get")),
        };

        Ok(value)
    }

    /// Set a single value by dotted key; the result is not validated
    pub fn set_value(&mut self, key: &str, value: &str) -> PortalResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["storage", "backend"] => {
                self.storage.backend = value.parse().map_err(|e: String| PortalError::Config {
                    message: e,
                    source: None,
                    context: ErrorContext::new("config_set")
                        .with_suggestion("Use \"memory\" or \"file\""),
                })?;
            }
            ["storage", "data_dir"] => self.storage.data_dir = value.to_string(),
            ["storage", "key_prefix"] => self.storage.key_prefix = value.to_string(),
            ["storage", "quota_bytes"] => {
                self.storage.quota_bytes = match value {
                    "" | "none" => None,
                    v => Some(parse_number(v, "config_set")?),
                };
            }
            ["session", "default_role"] => self.session.default_role = value.to_string(),
            ["session", "simulated_latency_ms"] => {
                self.session.simulated_latency_ms = parse_number(value, "config_set")?;
            }
            ["session", "login_timeout_ms"] => {
                self.session.login_timeout_ms = parse_number(value, "config_set")?;
            }
            ["session", "token_key"] => self.session.token_key = value.to_string(),
            ["session", "user_key"] => self.session.user_key = value.to_string(),
            _ => return Err(unknown_key(key, "config_set")),
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, component: &str) -> PortalResult<T> {
    value.parse().map_err(|_| PortalError::Config {
        message: format!("Invalid integer value: {}", value),
        source: None,
        context: ErrorContext::new(component),
    })
}

fn unknown_key(key: &str, component: &str) -> PortalError {
    PortalError::Config {
        message: format!("Unknown configuration key: {}", key),
        source: None,
        context: ErrorContext::new(component)
            .with_suggestion(&format!("Known keys: {}", CONFIG_KEYS.join(", "))),
    }
}

fn invalid(message: &str, suggestion: &str) -> PortalError {
    PortalError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("validate")
            .with_suggestion(suggestion),
    }
}
