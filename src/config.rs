use crate::regions::{LayerSource, DEFAULT_CODE_PROPERTY};
use crate::settings::Settings;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::path::PathBuf;

/// Seconds per frame when neither the CLI nor settings say otherwise
pub const DEFAULT_FRAME_TIME: f32 = 0.05;

/// Flags given on the `track` command line
#[derive(Clone, Debug, Default)]
pub struct TrackArgs {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub feed: Option<String>,
    pub regions: Option<PathBuf>,
    pub mute: bool,
    pub time: Option<f32>,
}

/// Configuration for a tracking session
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub feed_url: Option<String>,
    pub layer: LayerSource,
    pub mute: bool,
    pub frame_time: f32,
}

/// Christmas Eve, midnight to midnight UTC, in the year of `now`
pub fn default_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(now.year(), 12, 24, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (start, start + Duration::hours(24))
}

impl TrackerConfig {
    /// CLI flags win over settings, settings over defaults
    pub fn resolve(args: TrackArgs, settings: &Settings, now: DateTime<Utc>) -> Self {
        let (default_start, default_end) = default_window(now);
        let start = args.start.or(settings.tracker.start).unwrap_or(default_start);
        let end = args
            .end
            .or(settings.tracker.end)
            .unwrap_or(if args.start.is_some() || settings.tracker.start.is_some() {
                start + Duration::hours(24)
            } else {
                default_end
            });

        let layer = match args.regions.or_else(|| settings.regions.path.clone()) {
            Some(path) => LayerSource::GeoJson {
                path,
                code_property: settings
                    .regions
                    .code_property
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CODE_PROPERTY.to_string()),
            },
            None => LayerSource::Builtin,
        };

        Self {
            start,
            end,
            feed_url: args.feed.or_else(|| settings.tracker.feed_url.clone()),
            layer,
            mute: args.mute || settings.tracker.mute,
            frame_time: args
                .time
                .or(settings.tracker.frame_time)
                .unwrap_or(DEFAULT_FRAME_TIME)
                .clamp(0.01, 1.0),
        }
    }
}
