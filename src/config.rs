//! Configuration loading and management
//!
//! Handles parsing of `.taskboard.toml` configuration files.

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::series::Dimension;

pub const CONFIG_FILE: &str = ".taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Seed data configuration
    #[serde(default)]
    pub seed: SeedConfig,

    /// Dashboard configuration
    #[serde(default)]
    pub board: BoardConfig,
}

/// Session-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// User id to act as; the seed's current-user flag is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Seed data configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// JSON fixture file, relative to the config directory; built-in seed when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Preview cards per collection on the dashboard
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,

    /// Default chart dimension
    #[serde(default = "default_dimension")]
    pub dimension: String,

    /// First day of the week for completion periods
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

fn default_preview_limit() -> usize {
    3
}

fn default_dimension() -> String {
    "type".to_string()
}

fn default_week_start() -> String {
    "sunday".to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            preview_limit: default_preview_limit(),
            dimension: default_dimension(),
            week_start: default_week_start(),
        }
    }
}

impl BoardConfig {
    pub fn dimension(&self) -> crate::error::Result<Dimension> {
        self.dimension.parse().map_err(|_| {
            crate::error::Error::InvalidConfig(format!(
                "board.dimension: unknown dimension '{}' (expected type|status|priority)",
                self.dimension
            ))
        })
    }

    pub fn week_start(&self) -> crate::error::Result<Weekday> {
        self.week_start.trim().parse::<Weekday>().map_err(|_| {
            crate::error::Error::InvalidConfig(format!(
                "board.week_start: unknown weekday '{}'",
                self.week_start
            ))
        })
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.preview_limit == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "board.preview_limit must be > 0".to_string(),
            ));
        }
        self.dimension()?;
        self.week_start()?;
        Ok(())
    }
}

impl SessionConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if let Some(user) = &self.user {
            if user.trim().is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "session.user cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.taskboard.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults when absent
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Seed path resolved against the config directory.
    pub fn seed_path(&self, dir: &Path) -> Option<PathBuf> {
        self.seed.path.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                dir.join(path)
            }
        })
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.session.validate()?;
        self.board.validate()?;
        Ok(())
    }
}
