//! Application configuration, persisted as TOML.
//!
//! Lives at `~/.config/marquee/config.toml` (or the platform equivalent
//! via the `directories` crate). A missing file yields the defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "marquee.db";

/// Overrides `api.base_url` when set.
pub const API_URL_ENV: &str = "MARQUEE_API_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub carousel: CarouselConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            timeout_secs: 6,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// How long a token stays usable on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Window after `iat` in which an expired token can still be refreshed.
    pub refreshable_secs: i64,
    /// Treat tokens as expired this many seconds early.
    pub leeway_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refreshable_secs: 360_000,
            leeway_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub auto_advance_secs: u64,
    /// Horizontal drag distance, in pixels, that flips a slide.
    pub drag_threshold: f32,
    pub max_dots: usize,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            auto_advance_secs: 30,
            drag_threshold: 50.0,
            max_dots: 5,
        }
    }
}

impl AppConfig {
    /// Load from the platform config dir, falling back to defaults.
    pub fn load() -> Result<Self, CoreError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                Self::from_toml(&content)?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(content)?)
    }

    /// Write to the platform config dir.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = config_path()
            .ok_or_else(|| CoreError::Config("could not resolve config directory".into()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Ensure the data directory exists and return the database path.
    pub fn ensure_db_path() -> Result<PathBuf, CoreError> {
        let dir = data_dir()
            .ok_or_else(|| CoreError::Config("could not resolve data directory".into()))?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(DB_FILE))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }
}

/// Platform data directory (database, logs).
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "marquee").map(|dirs| dirs.data_dir().to_path_buf())
}

fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "marquee")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [api]
            base_url = "https://stream.example"

            [carousel]
            auto_advance_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://stream.example");
        assert_eq!(config.api.timeout_secs, 6);
        assert_eq!(config.carousel.auto_advance_secs, 5);
        assert_eq!(config.carousel.max_dots, 5);
        assert_eq!(config.session.refreshable_secs, 360_000);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = AppConfig::default();
        config.session.leeway_secs = 30;
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AppConfig::from_toml("[api\nbase_url = 1"),
            Err(CoreError::ConfigParse(_))
        ));
    }
}
