// SPDX-License-Identifier: GPL-3.0-only

//! User settings
//!
//! Stored as TOML under the user config directory. A missing or broken
//! file never prevents startup; defaults are used instead.

use crate::constants::{APP_DIR_NAME, DEFAULT_MAX_RESULTS, VideoQuality};
use crate::errors::ConfigError;
use crate::media::ContainerFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Overrides `recognition.api_key`
pub const RECOGNITION_KEY_ENV: &str = "VISION_CAMERA_API_KEY";
/// Overrides `chat.api_key`
pub const CHAT_KEY_ENV: &str = "VISION_CAMERA_CHAT_KEY";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Recognition service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// `images:annotate` endpoint
    pub endpoint: String,
    /// Without a key the simulated annotator is used
    pub api_key: Option<String>,
    /// `maxResults` per feature
    pub max_results: u32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Chat assistant settings (OpenAI-compatible API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL, `/chat/completions` is appended
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.perplexity.ai".to_string(),
            api_key: None,
            model: "sonar".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recording quality preset
    pub quality: VideoQuality,
    /// Preferred recording container, used for mime negotiation
    pub format: ContainerFormat,
    /// Emit haptic feedback events
    pub haptic_feedback: bool,
    /// Hand captures to the gallery automatically
    pub auto_save: bool,
    pub recognition: RecognitionConfig,
    pub chat: ChatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: VideoQuality::default(),
            format: ContainerFormat::default(),
            haptic_feedback: true,
            auto_save: true,
            recognition: RecognitionConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Config {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }),
            _ => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write settings to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no config directory",
            ))
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply API keys from the environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(RECOGNITION_KEY_ENV).ok(),
            std::env::var(CHAT_KEY_ENV).ok(),
        )
    }

    fn with_overrides(mut self, recognition_key: Option<String>, chat_key: Option<String>) -> Self {
        if let Some(key) = recognition_key.filter(|k| !k.trim().is_empty()) {
            self.recognition.api_key = Some(key);
        }
        if let Some(key) = chat_key.filter(|k| !k.trim().is_empty()) {
            self.chat.api_key = Some(key);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            quality = "720p"
            auto_save = false

            [recognition]
            api_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.quality, VideoQuality::Hd);
        assert!(!config.auto_save);
        assert!(config.haptic_feedback);
        assert_eq!(config.recognition.api_key.as_deref(), Some("abc"));
        assert_eq!(config.recognition.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.format, ContainerFormat::WebM);
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = Config::default().with_overrides(Some("  ".into()), Some("chat-key".into()));
        assert_eq!(config.recognition.api_key, None);
        assert_eq!(config.chat.api_key.as_deref(), Some("chat-key"));
    }
}
