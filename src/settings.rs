use crate::apps::QuickApp;
use crate::gesture::SwipeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "shade_settings.json";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Distance from the top edge (px) within which a swipe can open the shade.
    #[serde(default = "default_edge_threshold")]
    pub edge_threshold: f32,
    /// Downward travel (px) that commits an opening swipe before release.
    #[serde(default = "default_activation_distance")]
    pub activation_distance: f32,
    /// Travel (px) mapped to fully-open; also the rendered panel height.
    #[serde(default = "default_overlay_height")]
    pub max_overlay_height: f32,
    /// Idle time before the open shade dismisses itself.
    #[serde(default = "default_dismiss_timeout_ms")]
    pub dismiss_timeout_ms: u64,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional log file path. If `None`, logs go to stdout only.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Entries shown on the quick-launch screen.
    #[serde(default)]
    pub quick_apps: Vec<QuickApp>,
}

fn default_edge_threshold() -> f32 {
    40.0
}

fn default_activation_distance() -> f32 {
    60.0
}

fn default_overlay_height() -> f32 {
    200.0
}

fn default_dismiss_timeout_ms() -> u64 {
    5000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            edge_threshold: default_edge_threshold(),
            activation_distance: default_activation_distance(),
            max_overlay_height: default_overlay_height(),
            dismiss_timeout_ms: default_dismiss_timeout_ms(),
            debug_logging: false,
            log_file: None,
            quick_apps: Vec::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn swipe_config(&self) -> SwipeConfig {
        SwipeConfig {
            edge_threshold: self.edge_threshold,
            activation_distance: self.activation_distance,
            max_overlay_height: self.max_overlay_height,
        }
    }

    pub fn dismiss_timeout(&self) -> Duration {
        Duration::from_millis(self.dismiss_timeout_ms)
    }
}
