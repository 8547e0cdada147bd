//! Configuration types for the bot.
//!
//! Loads settings from config.json at startup. Covers timing, the anchor
//! image location and diagnostics. Board geometry and tile colors are fixed
//! by the game and live in the `board` module instead.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<BotConfig> = OnceLock::new();

/// Complete bot configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Wait after a normal move (milliseconds). Doubled after a diamond.
    pub move_delay_ms: u64,
    /// Wait before the first capture, to switch to the game (milliseconds)
    pub start_delay_ms: u64,
    /// Wait before recapturing when the board is missing or unsettled (milliseconds)
    pub retry_delay_ms: u64,
    /// Anchor image sitting just above-left of the board.
    /// Relative paths are resolved against the executable directory.
    pub reference_image: String,
    /// Save the first capture of a run to the captures directory
    pub dump_first_capture: bool,
    /// Stop after this many moves (None = until aborted)
    pub max_moves: Option<u32>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            move_delay_ms: 700,
            start_delay_ms: 5000,
            retry_delay_ms: 200,
            reference_image: "resources/topleft_ref.png".to_string(),
            dump_first_capture: true,
            max_moves: None,
        }
    }
}

impl BotConfig {
    pub fn move_delay(&self) -> Duration {
        Duration::from_millis(self.move_delay_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Absolute path of the anchor image.
    pub fn reference_path(&self, base_dir: &Path) -> PathBuf {
        let path = Path::new(&self.reference_image);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

/// Reads a config file, falling back to defaults on any problem.
fn load_config_from(config_path: &Path) -> BotConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    BotConfig::default()
}

/// Initializes the global configuration from config.json next to the
/// executable. Call once at startup.
pub fn init_config() {
    let config_path = crate::paths::get_exe_dir().join("config.json");
    let _ = CONFIG.set(load_config_from(&config_path));
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static BotConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}
