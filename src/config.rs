//! Configuration for cerebro.
//!
//! Loaded from `~/.cerebro/config.toml`. Every field is optional:
//!
//! ```toml
//! # Shell to run (default: $SHELL, then /bin/bash)
//! shell = "/bin/zsh"
//!
//! # Log level for ~/.cerebro/cerebro.log
//! log_level = "info"
//!
//! # Cursor blink interval in milliseconds (0 disables blinking)
//! cursor_blink_ms = 500
//!
//! [ai]
//! program = "ollama"
//! model = "qwen2.5:7b"
//! # Modifier held with Enter to send the line to the AI: shift, alt, ctrl
//! trigger = "shift"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::input::Modifiers;

const CONFIG_DIR: &str = ".cerebro";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not determine home directory")]
    NoHome,
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell command
    pub shell: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Cursor blink interval in milliseconds
    pub cursor_blink_ms: u64,
    /// AI runtime settings
    pub ai: AiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            log_level: "info".to_string(),
            cursor_blink_ms: 500,
            ai: AiConfig::default(),
        }
    }
}

/// AI runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Runtime executable
    pub program: String,
    /// Model passed to `<program> run`
    pub model: String,
    /// Modifier that turns Enter into "send to AI"
    pub trigger: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            program: "ollama".to_string(),
            model: "qwen2.5:7b".to_string(),
            trigger: "shift".to_string(),
        }
    }
}

impl AiConfig {
    /// Trigger modifier; unknown names fall back to Shift
    pub fn trigger_modifier(&self) -> Modifiers {
        Modifiers::from_trigger_name(&self.trigger).unwrap_or_else(|| {
            warn!("Unknown AI trigger {:?}, using shift", self.trigger);
            Modifiers::SHIFT
        })
    }
}

impl Config {
    /// Load configuration from the default location.
    /// A missing or broken file yields the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::get_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::get_config_path().ok_or(ConfigError::NoHome)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get config file path
    pub fn get_config_path() -> Option<PathBuf> {
        data_dir().map(|dir| dir.join(CONFIG_FILE))
    }
}

/// `~/.cerebro`, created on first use
pub fn data_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(CONFIG_DIR);
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.shell, None);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.cursor_blink_ms, 500);
        assert_eq!(config.ai.program, "ollama");
        assert_eq!(config.ai.model, "qwen2.5:7b");
        assert_eq!(config.ai.trigger_modifier(), Modifiers::SHIFT);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "shell = \"/bin/zsh\"\n\n[ai]\nmodel = \"llama3\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.shell.as_deref(), Some("/bin/zsh"));
        assert_eq!(config.ai.model, "llama3");
        assert_eq!(config.ai.program, "ollama");
        assert_eq!(config.cursor_blink_ms, 500);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.shell = Some("/bin/sh".to_string());
        config.ai.trigger = "alt".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.ai.trigger_modifier(), Modifiers::ALT);
    }

    #[test]
    fn test_errors() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load_from(&missing), Err(ConfigError::Read { .. })));

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "cursor_blink_ms = \"fast\"\n").unwrap();
        let err = Config::load_from(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_unknown_trigger_falls_back_to_shift() {
        let ai = AiConfig {
            trigger: "hyper".to_string(),
            ..AiConfig::default()
        };
        assert_eq!(ai.trigger_modifier(), Modifiers::SHIFT);

        let ai = AiConfig {
            trigger: "Control".to_string(),
            ..AiConfig::default()
        };
        assert_eq!(ai.trigger_modifier(), Modifiers::CTRL);
    }
}
