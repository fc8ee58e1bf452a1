use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub regions: RegionSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackerSettings {
    pub start: Option<DateTime<Utc>>,   // RFC 3339 lift-off time
    pub end: Option<DateTime<Utc>>,     // RFC 3339 return time
    pub feed_url: Option<String>,       // Base URL of a hosted journey service
    #[serde(default)]
    pub mute: bool,
    pub frame_time: Option<f32>,        // Seconds per frame
}

#[derive(Debug, Default, Deserialize)]
pub struct RegionSettings {
    pub path: Option<PathBuf>,          // GeoJSON FeatureCollection of countries
    pub code_property: Option<String>,  // Feature property holding the region code
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSettings {
    pub path: Option<PathBuf>,
    pub filter: Option<String>,         // tracing EnvFilter directive, e.g. "santa_tracker=debug"
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                eprintln!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("santa-tracker")
            .join("config.toml")
    }
}
