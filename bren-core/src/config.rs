use crate::placeholder::{RandomCase, DEFAULT_DATE_FORMAT, DEFAULT_RANDOM_LENGTH};
use crate::scanner::SortKey;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".bren";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// First number of a `#` sequence
    #[serde(default = "default_one")]
    pub num_start: i64,

    /// Step between sequence numbers
    #[serde(default = "default_one")]
    pub num_step: i64,

    /// strftime format for `${date}`, or "ms" for epoch milliseconds
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Length of `${random}` strings
    #[serde(default = "default_random_length")]
    pub random_length: usize,

    /// Character set of `${random}`: "mixed", "lower" or "upper"
    #[serde(default)]
    pub random_case: RandomCase,

    /// Sort matches within each directory
    #[serde(default)]
    pub sort: Option<SortKey>,

    /// Never write rollback logs
    #[serde(default)]
    pub no_log: bool,

    /// Preview format: "table" or "list"
    #[serde(default = "default_preview")]
    pub preview_format: String,

    /// Whether to use color output by default (None = auto-detect)
    #[serde(default)]
    pub use_color: Option<bool>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            num_start: 1,
            num_step: 1,
            date_format: default_date_format(),
            random_length: DEFAULT_RANDOM_LENGTH,
            random_case: RandomCase::Mixed,
            sort: None,
            no_log: false,
            preview_format: default_preview(),
            use_color: None,
        }
    }
}

fn default_one() -> i64 {
    1
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_random_length() -> usize {
    DEFAULT_RANDOM_LENGTH
}

fn default_preview() -> String {
    "table".to_string()
}

impl Config {
    /// Load `.bren/config.toml` from the current directory, then the user
    /// config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().ok();
        Self::load_from_locations(cwd.as_deref(), global_config_path().as_deref())
    }

    pub fn load_from_locations(dir: Option<&Path>, global: Option<&Path>) -> Result<Self> {
        if let Some(dir) = dir {
            let local = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if local.exists() {
                return Self::load_from_path(&local);
            }
        }

        if let Some(global) = global {
            if global.exists() {
                return Self::load_from_path(global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }
}

/// `<config dir>/bren/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bren").join(CONFIG_FILE))
}
