//! Tracing setup; output goes to a file so the full-screen globe stays clean

use crate::settings::LogSettings;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "SANTA_TRACKER_LOG";

pub fn log_path(settings: &LogSettings) -> PathBuf {
    settings.path.clone().unwrap_or_else(|| {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("santa-tracker")
            .join("santa-tracker.log")
    })
}

/// Environment first, then settings, then `info`
pub fn filter_directive(env: Option<String>, settings: &LogSettings) -> String {
    env.filter(|s| !s.trim().is_empty())
        .or_else(|| settings.filter.clone())
        .unwrap_or_else(|| "info".to_string())
}

/// Install the global subscriber; returns the log file path
pub fn init(settings: &LogSettings) -> io::Result<PathBuf> {
    let path = log_path(settings);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let directive = filter_directive(std::env::var(LOG_ENV).ok(), settings);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests); keep the existing one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();

    tracing::info!("santa-tracker {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
    Ok(path)
}
