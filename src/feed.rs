//! Where Santa's position comes from: a local simulation or a polled feed
//!
//! The HTTP feed never blocks the render loop. Requests run on a short-lived
//! worker thread and results are picked up on the next poll; a failed
//! request is logged and the last good snapshot stays on screen.

use crate::geo::Coordinate;
use crate::stats::JourneyStats;
use crate::trajectory::{
    location_at, place_name_at, progress_at, Route, TrackerPhase, Waypoint, HOME, HOME_NAME,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use thiserror::Error;

/// How often the stop list is refreshed while live
const POINTS_REFRESH_SECS: i64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },
    #[error("decoding {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

/// What the tracker needs for one tick
#[derive(Clone, Debug, PartialEq)]
pub struct JourneySnapshot {
    pub position: Coordinate,
    pub place: Option<String>,
    pub visited: Vec<Coordinate>,
    pub stats: JourneyStats,
}

impl JourneySnapshot {
    pub fn at_home() -> Self {
        Self {
            position: HOME,
            place: Some(HOME_NAME.to_string()),
            visited: Vec::new(),
            stats: JourneyStats::default(),
        }
    }
}

pub trait JourneyFeed {
    /// Latest snapshot for `now`; never blocks on the network
    fn poll(&mut self, now: DateTime<Utc>) -> JourneySnapshot;

    fn describe(&self) -> String;
}

/// Flies the closed-form route locally
pub struct SimulatedFeed {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    route: Route,
}

impl SimulatedFeed {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            route: Route::simulated(start, end),
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }
}

impl JourneyFeed for SimulatedFeed {
    fn poll(&mut self, now: DateTime<Utc>) -> JourneySnapshot {
        let progress = progress_at(self.start, self.end, now);
        let stops = self.route.visited(now);
        let stats = {
            let mut path = stops.clone();
            if TrackerPhase::from_progress(progress) == TrackerPhase::InProgress {
                path.push(location_at(progress));
            }
            JourneyStats::simulated(progress, stops.len(), &path)
        };

        let visited = match TrackerPhase::from_progress(progress) {
            TrackerPhase::InProgress => stops,
            _ => Vec::new(),
        };

        JourneySnapshot {
            position: location_at(progress),
            place: Some(place_name_at(progress).to_string()),
            visited,
            stats,
        }
    }

    fn describe(&self) -> String {
        "simulated route".to_string()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LocationRow {
    pub longitude: f64,
    pub latitude: f64,
    pub location_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct JourneyStatus {
    pub current_location: Option<LocationRow>,
    #[serde(default)]
    pub total_presents_delivered: Option<f64>,
    #[serde(default)]
    pub total_cookies_eaten: Option<f64>,
    #[serde(default)]
    pub total_distance_traveled: Option<f64>,
}

impl JourneyStatus {
    fn stats(&self) -> JourneyStats {
        let count = |v: Option<f64>| v.unwrap_or(0.0).max(0.0).round() as u64;
        JourneyStats {
            presents_delivered: count(self.total_presents_delivered),
            cookies_eaten: count(self.total_cookies_eaten),
            distance_km: self.total_distance_traveled.unwrap_or(0.0),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct JourneyPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub location_name: Option<String>,
    pub arrival_time: DateTime<Utc>,
}

/// `journey_status` comes back either bare or as a one-row array
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusPayload {
    One(JourneyStatus),
    Rows(Vec<JourneyStatus>),
}

pub fn decode_status(body: &str) -> Result<JourneyStatus, FeedError> {
    let payload: StatusPayload = serde_json::from_str(body).map_err(|e| FeedError::Decode {
        what: "journey status",
        reason: e.to_string(),
    })?;
    match payload {
        StatusPayload::One(status) => Ok(status),
        StatusPayload::Rows(rows) => rows.into_iter().next().ok_or_else(|| FeedError::Decode {
            what: "journey status",
            reason: "empty result".to_string(),
        }),
    }
}

pub fn decode_points(body: &str) -> Result<Vec<JourneyPoint>, FeedError> {
    serde_json::from_str(body).map_err(|e| FeedError::Decode {
        what: "journey points",
        reason: e.to_string(),
    })
}

fn route_from(points: &[JourneyPoint]) -> Route {
    Route::new(
        points
            .iter()
            .map(|p| Waypoint {
                at: Coordinate::new(p.longitude, p.latitude),
                place: p.location_name.clone().unwrap_or_default(),
                arrival: p.arrival_time,
            })
            .collect(),
    )
}

/// Build a snapshot from the last status and stop list; home when no location is set
pub fn snapshot_from(status: &JourneyStatus, route: &Route, now: DateTime<Utc>) -> JourneySnapshot {
    match &status.current_location {
        Some(loc) => JourneySnapshot {
            position: Coordinate::new(loc.longitude, loc.latitude),
            place: loc.location_name.clone(),
            visited: route.visited(now),
            stats: status.stats(),
        },
        None => JourneySnapshot {
            stats: status.stats(),
            ..JourneySnapshot::at_home()
        },
    }
}

enum Fetched {
    Status(Result<JourneyStatus, FeedError>),
    Points(Result<Vec<JourneyPoint>, FeedError>),
}

/// Polls a hosted journey service over HTTP
pub struct HttpFeed {
    base_url: String,
    agent: ureq::Agent,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: JourneyStatus,
    route: Route,
    points_fetched_at: Option<DateTime<Utc>>,
    status_pending: bool,
    points_pending: bool,
    sender: Sender<Fetched>,
    receiver: Receiver<Fetched>,
}

impl HttpFeed {
    pub fn new(base_url: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build();
        let (sender, receiver) = mpsc::channel();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
            start,
            end,
            status: JourneyStatus::default(),
            route: Route::default(),
            points_fetched_at: None,
            status_pending: false,
            points_pending: false,
            sender,
            receiver,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        TrackerPhase::from_progress(progress_at(self.start, self.end, now)) == TrackerPhase::InProgress
    }

    fn drain(&mut self, now: DateTime<Utc>) {
        loop {
            match self.receiver.try_recv() {
                Ok(Fetched::Status(result)) => {
                    self.status_pending = false;
                    match result {
                        Ok(status) => self.status = status,
                        Err(e) => tracing::warn!("journey status poll failed: {}", e),
                    }
                }
                Ok(Fetched::Points(result)) => {
                    self.points_pending = false;
                    match result {
                        Ok(points) => {
                            tracing::debug!("fetched {} journey points", points.len());
                            self.route = route_from(&points);
                            self.points_fetched_at = Some(now);
                        }
                        Err(e) => tracing::warn!("journey points poll failed: {}", e),
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn request<F>(&self, path: &str, wrap: F)
    where
        F: FnOnce(Result<String, FeedError>) -> Fetched + Send + 'static,
    {
        let url = format!("{}/{}", self.base_url, path);
        let agent = self.agent.clone();
        let tx = self.sender.clone();
        thread::spawn(move || {
            let body = agent
                .get(&url)
                .set("Accept", "application/json")
                .call()
                .map_err(|e| FeedError::Http {
                    url: url.clone(),
                    reason: e.to_string(),
                })
                .and_then(|resp| {
                    resp.into_string().map_err(|e| FeedError::Http {
                        url: url.clone(),
                        reason: e.to_string(),
                    })
                });
            let _ = tx.send(wrap(body));
        });
    }
}

impl JourneyFeed for HttpFeed {
    fn poll(&mut self, now: DateTime<Utc>) -> JourneySnapshot {
        self.drain(now);

        if !self.is_live(now) {
            return JourneySnapshot {
                stats: self.status.stats(),
                ..JourneySnapshot::at_home()
            };
        }

        let points_due = self
            .points_fetched_at
            .map_or(true, |at| now - at >= Duration::seconds(POINTS_REFRESH_SECS));
        if points_due && !self.points_pending {
            self.points_pending = true;
            self.request("santa_journey", |body| {
                Fetched::Points(body.and_then(|b| decode_points(&b)))
            });
        }
        if !self.status_pending {
            self.status_pending = true;
            self.request("journey_status", |body| {
                Fetched::Status(body.and_then(|b| decode_status(&b)))
            });
        }

        snapshot_from(&self.status, &self.route, now)
    }

    fn describe(&self) -> String {
        format!("feed {}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap(),
        )
    }

    const STATUS: &str = r#"{
        "current_location": { "longitude": 139.7, "latitude": 35.7, "location_name": "Tokyo" },
        "total_presents_delivered": 1234567,
        "total_cookies_eaten": 89.0,
        "total_distance_traveled": 40075.4
    }"#;

    const POINTS: &str = r#"[
        { "longitude": 151.2, "latitude": -33.9, "location_name": "Sydney", "arrival_time": "2024-12-24T10:00:00Z" },
        { "longitude": 174.8, "latitude": -36.8, "location_name": "Auckland", "arrival_time": "2024-12-24T09:00:00Z" },
        { "longitude": 139.7, "latitude": 35.7, "location_name": "Tokyo", "arrival_time": "2024-12-24T12:00:00+00:00" }
    ]"#;

    #[test]
    fn decodes_bare_and_row_status() {
        let bare = decode_status(STATUS).unwrap();
        assert_eq!(bare.current_location.unwrap().location_name.as_deref(), Some("Tokyo"));

        let rows = format!("[{}]", STATUS);
        let row = decode_status(&rows).unwrap();
        assert_eq!(row.stats().presents_delivered, 1_234_567);
        assert_eq!(row.stats().cookies_eaten, 89);

        assert!(decode_status("[]").is_err());
        assert!(decode_status("nope").is_err());
    }

    #[test]
    fn missing_location_means_home() {
        let status = decode_status(r#"{ "current_location": null }"#).unwrap();
        let snap = snapshot_from(&status, &Route::default(), window().0);
        assert_eq!(snap.position, HOME);
        assert_eq!(snap.place.as_deref(), Some(HOME_NAME));
        assert_eq!(snap.stats, JourneyStats::default());
    }

    #[test]
    fn visited_points_are_those_already_reached() {
        let (start, _) = window();
        let status = decode_status(STATUS).unwrap();
        let route = route_from(&decode_points(POINTS).unwrap());
        let snap = snapshot_from(&status, &route, start + Duration::hours(11));
        assert_eq!(
            snap.visited,
            vec![Coordinate::new(174.8, -36.8), Coordinate::new(151.2, -33.9)]
        );
        assert_eq!(snap.position, Coordinate::new(139.7, 35.7));
        assert_eq!(snap.place.as_deref(), Some("Tokyo"));
        assert!((snap.stats.distance_km - 40075.4).abs() < 1e-9);
    }

    #[test]
    fn bad_point_rows_fail_to_decode() {
        let err = decode_points(r#"[{ "longitude": 1.0 }]"#).unwrap_err();
        assert!(err.to_string().starts_with("decoding journey points"));
    }

    #[test]
    fn http_feed_stays_home_before_liftoff() {
        let (start, end) = window();
        let mut feed = HttpFeed::new("http://127.0.0.1:9/", start, end);
        let snap = feed.poll(start - Duration::hours(1));
        assert_eq!(snap, JourneySnapshot::at_home());
        assert!(!feed.status_pending);
        assert_eq!(feed.describe(), "feed http://127.0.0.1:9");
    }

    #[test]
    fn simulated_feed_midflight() {
        let (start, end) = window();
        let mut feed = SimulatedFeed::new(start, end);
        let snap = feed.poll(start + Duration::hours(12));
        assert_eq!(snap.position, Coordinate::new(0.0, 60.0));
        assert_eq!(snap.place.as_deref(), Some("Auckland"));
        assert_eq!(snap.visited.len(), 12);
        assert_eq!(snap.stats.cookies_eaten, 12 * crate::stats::COOKIES_PER_STOP);
        assert!(snap.stats.distance_km > 0.0);
    }

    #[test]
    fn simulated_feed_outside_window() {
        let (start, end) = window();
        let mut feed = SimulatedFeed::new(start, end);

        let before = feed.poll(start - Duration::days(1));
        assert_eq!(before.position, HOME);
        assert!(before.visited.is_empty());

        let after = feed.poll(end + Duration::minutes(5));
        assert_eq!(after.position, HOME);
        assert_eq!(after.place.as_deref(), Some(HOME_NAME));
        assert!(after.visited.is_empty());
        assert_eq!(after.stats.presents_delivered, 2_000_000_000);
        assert_eq!(feed.route().waypoints().len(), 24);
    }
}
