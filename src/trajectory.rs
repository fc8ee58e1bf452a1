//! Closed-form flight path: maps elapsed-time progress to a position and place
//!
//! The path is a pure function of progress in [0, 1]. Outside the open
//! interval (and for NaN) the tracker sits at home: the route never visits
//! the boundary instants themselves.

use crate::geo::{normalize_longitude, Coordinate};
use chrono::{DateTime, Duration, Utc};
use std::f64::consts::TAU;

/// Home base at the geographic north pole
pub const HOME: Coordinate = Coordinate::new(0.0, 90.0);
pub const HOME_NAME: &str = "North Pole";

/// Latitude stays inside [-LAT_BAND, LAT_BAND]
pub const LAT_BAND: f64 = 60.0;
/// Full latitude oscillations across the window
const LAT_CYCLES: f64 = 2.0;

/// Equal-width progress buckets used for place names and simulated stops
pub const PLACE_BUCKETS: usize = 24;

const PLACES: [&str; 12] = [
    "Auckland",
    "Tokyo",
    "Beijing",
    "New Delhi",
    "Moscow",
    "Cairo",
    "Paris",
    "London",
    "Reykjavik",
    "Rio de Janeiro",
    "New York",
    "Honolulu",
];

/// Clamp progress into [0, 1], treating NaN as not started
#[inline]
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

#[inline]
fn at_home(progress: f64) -> bool {
    progress.is_nan() || progress <= 0.0 || progress >= 1.0
}

/// Position along the route for the given progress
pub fn location_at(progress: f64) -> Coordinate {
    if at_home(progress) {
        return HOME;
    }
    let lon = normalize_longitude(-180.0 + 360.0 * progress);
    let lat = (LAT_BAND * (TAU * LAT_CYCLES * progress).cos()).clamp(-LAT_BAND, LAT_BAND);
    Coordinate::new(lon, lat)
}

/// Human-readable place for the given progress
pub fn place_name_at(progress: f64) -> &'static str {
    if at_home(progress) {
        return HOME_NAME;
    }
    PLACES[bucket_of(progress) % PLACES.len()]
}

fn bucket_of(progress: f64) -> usize {
    ((progress * PLACE_BUCKETS as f64).floor() as usize).min(PLACE_BUCKETS - 1)
}

/// Fraction of the window [start, end] elapsed at `now`
pub fn progress_at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return if now >= end { 1.0 } else { 0.0 };
    }
    let elapsed = (now - start).num_milliseconds();
    clamp_progress(elapsed as f64 / total as f64)
}

/// Where the tracked flight is within its window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerPhase {
    NotStarted,
    InProgress,
    Complete,
}

impl TrackerPhase {
    pub fn from_progress(progress: f64) -> Self {
        let p = clamp_progress(progress);
        if p <= 0.0 {
            TrackerPhase::NotStarted
        } else if p >= 1.0 {
            TrackerPhase::Complete
        } else {
            TrackerPhase::InProgress
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackerPhase::NotStarted => "not started",
            TrackerPhase::InProgress => "in progress",
            TrackerPhase::Complete => "complete",
        }
    }
}

/// A scheduled stop
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub at: Coordinate,
    pub place: String,
    pub arrival: DateTime<Utc>,
}

/// Stops ordered by arrival time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(mut waypoints: Vec<Waypoint>) -> Self {
        waypoints.sort_by_key(|w| w.arrival);
        Self { waypoints }
    }

    /// One stop per place bucket, sampled at the bucket midpoint
    pub fn simulated(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let total_ms = (end - start).num_milliseconds().max(0) as f64;
        let waypoints = (0..PLACE_BUCKETS)
            .map(|b| {
                let p = (b as f64 + 0.5) / PLACE_BUCKETS as f64;
                Waypoint {
                    at: location_at(p),
                    place: place_name_at(p).to_string(),
                    arrival: start + Duration::milliseconds((total_ms * p) as i64),
                }
            })
            .collect();
        Self::new(waypoints)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Coordinates of stops reached strictly before `now`, in arrival order
    pub fn visited(&self, now: DateTime<Utc>) -> Vec<Coordinate> {
        self.waypoints
            .iter()
            .take_while(|w| w.arrival < now)
            .map(|w| w.at)
            .collect()
    }

    pub fn visited_count(&self, now: DateTime<Utc>) -> usize {
        self.waypoints.iter().take_while(|w| w.arrival < now).count()
    }
}
