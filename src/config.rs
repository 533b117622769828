use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{MemoError, Result};

/// Longest accepted notification interval (in seconds)
pub const MAX_NOTIFICATION_SECS: u64 = 3600;

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the flashcard server; `None` works offline
    pub server_url: Option<String>,

    /// Timeout for every request to the server (in seconds)
    pub request_timeout_secs: u64,

    /// Directory holding the local cache
    pub data_dir: PathBuf,

    /// How long a notification stays on screen (in seconds)
    pub notification_secs: u64,

    /// Editor used to type the text to generate cards from
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".memorize"));

        Self {
            server_url: None,
            request_timeout_secs: 10,
            data_dir,
            notification_secs: 4,
            editor_command: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "memorize")
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Result<PathBuf> {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.json"))
            .ok_or_else(|| MemoError::ConfigError {
                message: "could not determine a home directory".to_string(),
            })
    }

    /// Loads the configuration file, or the defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content).map_err(|e| MemoError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| MemoError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Updates one setting from a `key=value` string
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| MemoError::ConfigError {
                message: format!("expected key=value, got {:?}", assignment),
            })?;

        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        let seconds = |v: &str| {
            v.parse::<u64>().map_err(|_| MemoError::ConfigError {
                message: format!("{} must be a number of seconds, got {:?}", key, v),
            })
        };

        match key {
            "server_url" => self.server_url = optional(value),
            "request_timeout_secs" => self.request_timeout_secs = seconds(value)?,
            "data_dir" => self.data_dir = PathBuf::from(value),
            "notification_secs" => {
                let secs = seconds(value)?;
                if secs > MAX_NOTIFICATION_SECS {
                    return Err(MemoError::ConfigError {
                        message: format!(
                            "notification_secs must be at most {}, got {}",
                            MAX_NOTIFICATION_SECS, secs
                        ),
                    });
                }
                self.notification_secs = secs;
            }
            "editor_command" => self.editor_command = optional(value),
            _ => {
                return Err(MemoError::ConfigError {
                    message: format!("unknown setting: {}", key),
                })
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// How long notifications stay visible. Fails on values a hand-edited
    /// config file can hold but a duration cannot.
    pub fn notification_duration(&self) -> Result<chrono::Duration> {
        i64::try_from(self.notification_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| MemoError::ConfigError {
                message: format!(
                    "notification_secs is out of range: {}",
                    self.notification_secs
                ),
            })
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        // First try the configured editor
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        // Then try environment variable
        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        // Fall back to platform defaults
        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}
