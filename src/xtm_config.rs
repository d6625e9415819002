// User configuration
// Grid size, mine count and display preferences, persisted as TOML in the per-user config directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const MIN_SIZE: usize = 2;
pub const MAX_SIZE: usize = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// User configuration
/// Persisted to disk as TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub size: usize,              // Board is size x size
    pub mines: usize,             // Mines per round
    pub use_question_marks: bool, // Enable three-state flagging (none/flag/?)
    pub ascii_icons: bool,        // Use ASCII fallback icons
}

impl Default for Config {
    fn default() -> Self {
        Config {
            size: 10,
            mines: 10,
            use_question_marks: false,
            ascii_icons: false,
        }
    }
}

impl Config {
    /// Check that the board fits the terminal range and keeps at least one safe cell
    /// A board without mines is allowed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.size) {
            return Err(ConfigError::Invalid(format!(
                "size must be between {} and {}, got {}",
                MIN_SIZE, MAX_SIZE, self.size
            )));
        }
        let cells = self.size * self.size;
        if self.mines >= cells {
            return Err(ConfigError::Invalid(format!(
                "mines must be between 0 and {} for a {}x{} board, got {}",
                cells - 1,
                self.size,
                self.size,
                self.mines
            )));
        }
        Ok(())
    }
}

/// Get the configuration file path
/// Uses platform-specific config directory (e.g., ~/.config/xtmines/xtmines.toml on Linux)
/// Falls back to current directory if ProjectDirs is unavailable
pub fn config_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem().and_then(|s| s.to_str())?.to_string();
    match ProjectDirs::from("com", "xhbl", &name) {
        Some(proj) => Some(proj.config_dir().join(format!("{}.toml", name))),
        None => env::current_dir()
            .ok()
            .map(|dir| dir.join(format!("{}.toml", name))),
    }
}

/// Read and validate a config file
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Write a config file, creating its directory if needed
pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let s = toml::to_string(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, s)?;
    Ok(())
}

/// Load configuration from disk, or create default if not found
/// A broken or invalid file is left in place and defaults are used for this run
pub fn load_or_create_config() -> Config {
    let Some(path) = config_path() else {
        warn!("No config location available, using defaults");
        return Config::default();
    };

    if path.exists() {
        return match read_config(&path) {
            Ok(cfg) => {
                info!("Loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Config::default()
            }
        };
    }

    let cfg = Config::default();
    match write_config(&path, &cfg) {
        Ok(()) => info!("Created default config at {}", path.display()),
        Err(e) => warn!("Could not create config {}: {}", path.display(), e),
    }
    cfg
}

/// Save configuration to disk as TOML
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    match config_path() {
        Some(path) => write_config(&path, cfg),
        None => Err(ConfigError::Invalid("no config location available".to_string())),
    }
}
