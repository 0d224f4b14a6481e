use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use undotree_http::ClientConfig;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the undo-tree authority.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Quiet period after the last edit before a patch is pushed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    300
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?).await
    }

    /// Read a config file, falling back to defaults when it is missing,
    /// empty or unparsable.
    pub async fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).await?;

        if content.trim().is_empty() {
            tracing::warn!("Config file is empty, using default config");
            return Ok(Config::default());
        }

        let config: Config = match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config ({}), using default. File may be corrupted.",
                    e
                );
                return Ok(Config::default());
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?).await
    }

    pub async fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(SyncError::Config(format!(
                "server_url must be http(s): {}",
                self.server_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(SyncError::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout_ms: self.request_timeout_ms,
            ..ClientConfig::with_base_url(self.server_url.clone())
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let root = get_root_dir()?;
    Ok(root.join(".undotree").join("config"))
}

pub fn get_root_dir() -> Result<PathBuf> {
    let root_str = std::env::var("UNDOTREE_ROOT").unwrap_or_else(|_| "undotree_data".to_string());

    let root = PathBuf::from(root_str);
    if let Ok(abs) = std::fs::canonicalize(&root) {
        Ok(abs)
    } else {
        Ok(std::env::current_dir()?.join(root))
    }
}

/// Files whose content the char-level codec cannot represent.
pub fn is_binary(filename: &str) -> bool {
    let binary_extensions = [
        ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".zip", ".gz", ".tar", ".exe", ".dll", ".so",
        ".dylib", ".bin", ".mp3", ".mp4", ".wav", ".sqlite", ".db",
    ];

    let filename_lower = filename.to_lowercase();
    binary_extensions
        .iter()
        .any(|ext| filename_lower.ends_with(ext))
}
