// Logging setup
// The terminal UI owns stdout, so events go to a log file in the per-user data directory

use directories::ProjectDirs;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "XTMINES_LOG";

/// Log file location, e.g. ~/.local/share/xtmines/xtmines.log on Linux
pub fn log_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "xhbl", "xtmines")?;
    Some(proj.data_local_dir().join("xtmines.log"))
}

/// Filter from XTMINES_LOG, then RUST_LOG, defaulting to info
pub fn env_filter() -> EnvFilter {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber; returns the log path when file logging is active
/// Without a writable log file logging stays off and the game runs anyway
pub fn init() -> Option<PathBuf> {
    let path = log_path()?;
    let file = open_log(&path).ok()?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;
    Some(path)
}
