//! Application-level configuration loading, including the default phrase pool.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::phrase::{GRID_SIZE, Phrase};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BINGO_BACK_CONFIG_PATH";
/// Text of the phrase placed at the centre of every board.
pub const DEFAULT_FREE_SQUARE: &str = "FREE";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    grid_size: usize,
    free_square: Option<String>,
    cache_enabled: bool,
    purge_after_days: u64,
    default_page_size: usize,
    default_phrases: Vec<Phrase>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        grid_size = app_config.grid_size,
                        phrases = app_config.default_phrases.len(),
                        cache_enabled = app_config.cache_enabled,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Number of phrases a board holds.
    pub fn board_size(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Text of the phrase pinned to the centre square, if any.
    pub fn free_square(&self) -> Option<&str> {
        self.free_square.as_deref()
    }

    /// Whether the read-through cache is on.
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Age after which games are removed by a purge.
    pub fn purge_after_days(&self) -> u64 {
        self.purge_after_days
    }

    /// Page size of game listings when the caller gives no limit.
    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Phrases seeded into the store when its pool is empty.
    pub fn default_phrases(&self) -> &[Phrase] {
        &self.default_phrases
    }

    /// Copy of this configuration with the cache switched on or off.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Copy of this configuration with another purge age.
    pub fn with_purge_after_days(mut self, days: u64) -> Self {
        self.purge_after_days = days;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            free_square: Some(DEFAULT_FREE_SQUARE.to_owned()),
            cache_enabled: true,
            purge_after_days: 30,
            default_page_size: 50,
            default_phrases: default_phrases(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    grid_size: Option<usize>,
    #[serde(default = "raw_free_square")]
    free_square: Option<String>,
    cache_enabled: Option<bool>,
    purge_after_days: Option<u64>,
    default_page_size: Option<usize>,
    default_phrases: Option<Vec<RawPhrase>>,
}

fn raw_free_square() -> Option<String> {
    Some(DEFAULT_FREE_SQUARE.to_owned())
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            grid_size: value
                .grid_size
                .map(supported_grid_size)
                .unwrap_or(defaults.grid_size),
            free_square: value.free_square,
            cache_enabled: value.cache_enabled.unwrap_or(defaults.cache_enabled),
            purge_after_days: value.purge_after_days.unwrap_or(defaults.purge_after_days),
            default_page_size: value
                .default_page_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.default_page_size),
            default_phrases: value
                .default_phrases
                .map(|phrases| phrases.into_iter().map(Into::into).collect())
                .unwrap_or(defaults.default_phrases),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single phrase inside the configuration file.
struct RawPhrase {
    id: String,
    text: String,
}

impl From<RawPhrase> for Phrase {
    fn from(value: RawPhrase) -> Self {
        Phrase::new(value.id, value.text)
    }
}

/// Board layout and bingo lines are fixed to a B-I-N-G-O grid; other sizes fall back to it.
fn supported_grid_size(requested: usize) -> usize {
    if requested != GRID_SIZE {
        warn!(
            requested,
            supported = GRID_SIZE,
            "unsupported grid size; using the standard grid"
        );
    }
    GRID_SIZE
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in phrase pool shipped with the binary.
fn default_phrases() -> Vec<Phrase> {
    [
        "Someone tells a dad joke",
        "Someone references an airplane",
        "\"We're all in this together\"",
        "\"the new normal\"",
        "Someone's child on screen",
        "\"OKRs\"",
        "\"Increased focus\"",
        "\"These uncertain times\"",
        "Someone's pet on screen",
        "\"working from home\"",
        "Someone speaks while muted",
        "\"Wash your hands\"",
        DEFAULT_FREE_SQUARE,
        "Awkward silence",
        "Sports metaphor",
        "Starts at least 5 min late",
        "Joke made, but no one laughs",
        "Someone eats on screen",
        "All questions answered",
        "\"self care\"",
        "\"Can you see my screen?\"",
        "\"headcount\"",
        "\"Let's take this offline\"",
        "\"Circle back\"",
        "\"You're on mute\"",
    ]
    .into_iter()
    .enumerate()
    .map(|(index, text)| Phrase::new((101 + index).to_string(), text))
    .collect()
}
