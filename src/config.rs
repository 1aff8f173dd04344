//! Settings persisted between runs as a JSON document.
//!
//! Every struct is `#[serde(default)]`, so a partial or older file still loads
//! with the missing keys taking their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const MIN_SAMPLES: u32 = 2;
pub const MAX_SAMPLES: u32 = 8;
pub const MIN_MAZE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not write config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialize config")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub fullscreen: bool,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            x: None,
            y: None,
            fullscreen: false,
            title: "Maze".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntialiasingConfig {
    pub enabled: bool,
    pub samples: u32,
}

impl Default for AntialiasingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            samples: 4,
        }
    }
}

impl AntialiasingConfig {
    /// Sample count requested from the surface, 1 when disabled.
    pub fn sample_count(&self) -> u32 {
        if self.enabled { self.samples } else { 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub width: usize,
    pub height: usize,
    /// A cell becomes a wall with probability `1 / (density_range + 1)`.
    pub density_range: u32,
    pub seed: Option<u64>,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
            density_range: 15,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub vsync: bool,
    pub antialiasing: AntialiasingConfig,
    pub maze: MazeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            vsync: true,
            antialiasing: AntialiasingConfig::default(),
            maze: MazeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, writing the defaults there first if the file does not exist.
    ///
    /// A file that cannot be parsed is left untouched and the defaults are used.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<AppConfig>(&text) {
                Ok(config) => {
                    log::info!("loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("config {} is invalid ({e}), using defaults", path.display());
                    AppConfig::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                match config.save(path) {
                    Ok(()) => log::info!("wrote default config to {}", path.display()),
                    Err(e) => log::warn!("{e:?}"),
                }
                config
            }
            Err(e) => {
                log::warn!("could not read config {} ({e}), using defaults", path.display());
                AppConfig::default()
            }
        };
        config.validate();
        config
    }

    /// Clamps out-of-range values in place, warning for each one.
    pub fn validate(&mut self) {
        let samples = self.antialiasing.samples.clamp(MIN_SAMPLES, MAX_SAMPLES);
        if samples != self.antialiasing.samples {
            log::warn!(
                "antialiasing.samples = {} outside [{MIN_SAMPLES}, {MAX_SAMPLES}], using {samples}",
                self.antialiasing.samples
            );
            self.antialiasing.samples = samples;
        }
        if self.window.width == 0 || self.window.height == 0 {
            log::warn!(
                "window size {}x{} is empty, using at least 1x1",
                self.window.width,
                self.window.height
            );
            self.window.width = self.window.width.max(1);
            self.window.height = self.window.height.max(1);
        }
        if self.maze.width < MIN_MAZE_SIZE || self.maze.height < MIN_MAZE_SIZE {
            log::warn!(
                "maze size {}x{} below {MIN_MAZE_SIZE}x{MIN_MAZE_SIZE}, enlarging",
                self.maze.width,
                self.maze.height
            );
            self.maze.width = self.maze.width.max(MIN_MAZE_SIZE);
            self.maze.height = self.maze.height.max(MIN_MAZE_SIZE);
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "vsync": false, "window": { "width": 1024 } }"#).unwrap();
        assert!(!config.vsync);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.antialiasing, AntialiasingConfig::default());
        assert_eq!(config.maze.width, 15);
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let mut config = AppConfig::default();
        config.antialiasing.samples = 32;
        config.window.height = 0;
        config.maze.width = 2;
        config.validate();
        assert_eq!(config.antialiasing.samples, MAX_SAMPLES);
        assert_eq!(config.window.height, 1);
        assert_eq!(config.maze.width, MIN_MAZE_SIZE);

        config.antialiasing.samples = 0;
        config.validate();
        assert_eq!(config.antialiasing.samples, MIN_SAMPLES);
    }

    #[test]
    fn sample_count_is_one_when_disabled() {
        let mut aa = AntialiasingConfig::default();
        assert_eq!(aa.sample_count(), 1);
        aa.enabled = true;
        assert_eq!(aa.sample_count(), 4);
    }
}
