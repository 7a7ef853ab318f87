//! Configuration system
//!
//! TOML configuration for drag behaviour: snap thresholds, tag defaults,
//! per-screen reservations and the button bindings that start drags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::input::{DragOperation, InputError, MouseBinding, MouseBindings};
use crate::layout::LayoutKind;
use crate::ratio::{MAX_SPLIT, MIN_SPLIT};
use crate::state::{Padding, StatusBar};

/// Semantic configuration errors caught by [`Config::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("split_fraction {0} is outside [0.1, 0.9]")]
    SplitFraction(f64),

    #[error("at least one tag must be configured")]
    NoTags,

    #[error("mouse binding {binding:?}: {source}")]
    MouseBinding {
        binding: String,
        #[source]
        source: InputError,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Per-screen overrides, by screen index
    pub screens: Vec<ScreenConfig>,

    /// Mouse bindings
    pub mouse_bindings: Vec<MouseBindingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            screens: Vec::new(),
            mouse_bindings: default_mouse_bindings(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).or_else(Self::find_config_file);

        match config_path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {:?}", path);
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {path:?}"))?;
                Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse config file: {path:?}"))
            },
            Some(path) => {
                warn!("Config file not found at {:?}, using defaults", path);
                Ok(Self::default())
            },
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            },
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            // XDG config
            dirs::config_dir().map(|p| p.join("tilegrab/config.toml")),
            // Home directory
            dirs::home_dir().map(|p| p.join(".config/tilegrab/config.toml")),
            // System-wide
            Some(PathBuf::from("/etc/tilegrab/config.toml")),
        ];

        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Generate default configuration as a string
    pub fn default_config_string() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = self.general.split_fraction;
        if !(MIN_SPLIT..=MAX_SPLIT).contains(&fraction) {
            return Err(ConfigError::SplitFraction(fraction));
        }
        if self.general.tags.is_empty() {
            return Err(ConfigError::NoTags);
        }
        self.mouse_bindings()?;
        Ok(())
    }

    pub fn screen_config(&self, index: usize) -> Option<&ScreenConfig> {
        self.screens.get(index)
    }

    /// Snap threshold for screen `index`, falling back to the global one.
    pub fn snap_for(&self, index: usize) -> u32 {
        self.screen_config(index)
            .and_then(|screen| screen.snap)
            .unwrap_or(self.general.snap)
    }

    /// Parse the configured mouse bindings.
    pub fn mouse_bindings(&self) -> Result<MouseBindings, ConfigError> {
        let mut bindings = MouseBindings::default();
        for entry in &self.mouse_bindings {
            let wrap = |source: InputError| ConfigError::MouseBinding {
                binding: entry.button.clone(),
                source,
            };
            let binding = MouseBinding::parse(&entry.button).map_err(wrap)?;
            let operation = DragOperation::from_command(&entry.command).map_err(wrap)?;
            bindings.add(binding, operation);
        }
        Ok(bindings)
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Snap threshold in pixels
    pub snap: u32,
    /// Layout new tags start with
    pub default_layout: LayoutKind,
    /// Initial master split
    pub split_fraction: f64,
    /// Initial number of master windows
    pub master_count: u32,
    /// Tag names, created on every screen
    pub tags: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            snap: 8,
            default_layout: LayoutKind::Tile,
            split_fraction: 0.5,
            master_count: 1,
            tags: (1..=9).map(|n| n.to_string()).collect(),
        }
    }
}

/// Per-screen overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Snap threshold override
    pub snap: Option<u32>,
    pub statusbar: StatusBar,
    pub padding: Padding,
}

/// Mouse binding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouseBindingConfig {
    /// Button and modifiers
    pub button: String,
    /// Drag to start
    pub command: String,
}

/// Generate default mouse bindings
fn default_mouse_bindings() -> Vec<MouseBindingConfig> {
    vec![
        MouseBindingConfig {
            button: "Mod4+button1".to_string(),
            command: "move".to_string(),
        },
        MouseBindingConfig {
            button: "Mod4+button3".to_string(),
            command: "resize".to_string(),
        },
    ]
}
