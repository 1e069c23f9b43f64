//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/livechat/client.toml`
//! - Windows: `%APPDATA%/livechat/client.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use livechat_connection::{ChatConfig, ReconnectConfig};
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "ws://localhost:8080";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket URL of the chat server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Display name announced to the server. Prompted for when empty.
    #[serde(default)]
    pub username: String,

    /// Seconds to wait before reconnecting.
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_reconnect_secs() -> u64 {
    ReconnectConfig::default().delay.as_secs()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            username: String::new(),
            reconnect_secs: default_reconnect_secs(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub reconnect_secs: Option<u64>,
}

impl ClientConfig {
    /// Loads configuration from `path`, or writes and returns the defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ClientConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = ClientConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(secs) = overrides.reconnect_secs {
            self.reconnect_secs = secs;
        }
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig::new(&self.endpoint, &self.username)
    }

    /// Reconnect policy. Zero is clamped to one second so a dead server is
    /// not hammered.
    pub fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            delay: Duration::from_secs(self.reconnect_secs.max(1)),
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("livechat").join("client.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("livechat")
            .join("client.toml"))
    }
}
