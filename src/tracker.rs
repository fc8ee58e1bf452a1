//! The interactive tracking session
//!
//! Once a second the ticker moves the marker and asks for a highlight pass;
//! the pass itself runs after the next frame is on screen, when the globe
//! reports it is idle. Every other frame only animates the camera.

use crate::chime::Chime;
use crate::colors::{status_to_scheme, ColorState, StatusColor};
use crate::config::TrackerConfig;
use crate::countdown::{notification, Countdown};
use crate::feed::{HttpFeed, JourneyFeed, JourneySnapshot, SimulatedFeed};
use crate::geo::Coordinate;
use crate::globe::{TerminalGlobe, DEFAULT_ZOOM};
use crate::help::{render_help_overlay, TRACKER_HELP};
use crate::highlight::{reconcile, CurrentRegion, HighlightReconciler, HighlightState, PassOutcome};
use crate::regions::RegionLayer;
use crate::spin::{GlobeSpin, SpinEvent};
use crate::stats::JourneyStats;
use crate::surface::RenderSurface;
use crate::terminal::Terminal;
use crate::trajectory::{location_at, place_name_at, progress_at, TrackerPhase};
use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

pub const TICK: Duration = Duration::from_secs(1);
/// How long after the last pan key the globe counts as being steered
const INTERACTION_GRACE: Duration = Duration::from_secs(2);
const PAN_STEP: f64 = 10.0;
const ZOOM_STEP: f64 = 0.5;

/// Fixed-rate tick source; stopped when the journey ends or dropped with the session
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
    running: bool,
}

impl Ticker {
    /// First tick is due immediately
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now,
            running: true,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once per elapsed period; missed periods collapse into one tick
    pub fn due(&mut self, now: Instant) -> bool {
        if !self.running || now < self.next {
            return false;
        }
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
        true
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!("ticker stopped");
        }
        self.running = false;
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct Session {
    config: TrackerConfig,
    feed: Box<dyn JourneyFeed>,
    globe: TerminalGlobe,
    reconciler: HighlightReconciler,
    spin: GlobeSpin,
    chime: Chime,
    colors: ColorState,
    ticker: Ticker,
    snapshot: JourneySnapshot,
    phase: TrackerPhase,
    paused: bool,
    show_help: bool,
    last_pan: Option<Instant>,
}

impl Session {
    pub fn new(config: TrackerConfig) -> Self {
        let feed: Box<dyn JourneyFeed> = match &config.feed_url {
            Some(url) => Box::new(HttpFeed::new(url, config.start, config.end)),
            None => Box::new(SimulatedFeed::new(config.start, config.end)),
        };
        let globe = TerminalGlobe::new(config.layer.clone());
        Self::with_parts(config, feed, globe, Instant::now())
    }

    pub fn with_parts(
        config: TrackerConfig,
        feed: Box<dyn JourneyFeed>,
        globe: TerminalGlobe,
        now: Instant,
    ) -> Self {
        tracing::info!(
            "tracking {} from {} to {}",
            feed.describe(),
            config.start.to_rfc3339(),
            config.end.to_rfc3339()
        );
        Self {
            chime: Chime::new(config.mute),
            config,
            feed,
            globe,
            reconciler: HighlightReconciler::new(),
            spin: GlobeSpin::new(),
            colors: ColorState::new(0),
            ticker: Ticker::new(TICK, now),
            snapshot: JourneySnapshot::at_home(),
            phase: TrackerPhase::NotStarted,
            paused: false,
            show_help: false,
            last_pan: None,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn highlight(&self) -> &HighlightState {
        self.reconciler.state()
    }

    /// Advance to `now`: position first, then arm a highlight pass
    pub fn tick<W: Write>(&mut self, now: DateTime<Utc>, bell: &mut W) -> io::Result<()> {
        let phase = TrackerPhase::from_progress(progress_at(self.config.start, self.config.end, now));
        let mut snapshot = self.feed.poll(now);
        if !snapshot.position.is_valid() {
            tracing::warn!(
                "{} reported an invalid position {}, keeping {}",
                self.feed.describe(),
                snapshot.position,
                self.snapshot.position
            );
            snapshot.position = self.snapshot.position;
        }
        self.snapshot = snapshot;
        self.globe.set_marker(self.snapshot.position);
        self.reconciler.request();

        if let Some(cue) = self.chime.observe(phase, self.snapshot.place.as_deref()) {
            self.chime.ring(&cue, bell)?;
        }
        if phase != self.phase {
            tracing::info!("journey {}", phase.label());
        }
        if phase == TrackerPhase::Complete {
            self.ticker.stop();
        }
        self.phase = phase;
        Ok(())
    }

    /// Raise the globe's idle signal for a finished frame and run any pending pass
    pub fn after_present(&mut self) -> PassOutcome {
        self.globe.mark_presented();
        if !self.globe.take_idle() {
            return PassOutcome::Idle;
        }
        self.reconciler
            .on_idle(self.snapshot.position, &self.snapshot.visited, &mut self.globe)
    }

    /// Returns true when the user asked to quit
    pub fn handle_key(&mut self, code: KeyCode, now: Instant) -> bool {
        if self.colors.handle_key(code) {
            return false;
        }
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Char('f') => self.globe.camera.follow = !self.globe.camera.follow,
            KeyCode::Char('s') => self.spin.handle(SpinEvent::ToggleSpin),
            KeyCode::Char('m') => {
                self.chime.toggle_mute();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.globe.camera.zoom_by(ZOOM_STEP),
            KeyCode::Char('-') | KeyCode::Char('_') => self.globe.camera.zoom_by(-ZOOM_STEP),
            KeyCode::Char('0') => self.globe.camera.zoom = DEFAULT_ZOOM,
            KeyCode::Left => self.pan(-PAN_STEP, 0.0, now),
            KeyCode::Right => self.pan(PAN_STEP, 0.0, now),
            KeyCode::Up => self.pan(0.0, PAN_STEP, now),
            KeyCode::Down => self.pan(0.0, -PAN_STEP, now),
            _ => {}
        }
        false
    }

    fn pan(&mut self, dlon: f64, dlat: f64, now: Instant) {
        self.globe.camera.follow = false;
        self.globe.camera.pan(dlon, dlat);
        if self.last_pan.is_none() {
            self.spin.handle(SpinEvent::InteractionStart);
        }
        self.last_pan = Some(now);
    }

    /// Terminals report no key release; a quiet spell ends the interaction
    fn settle_interaction(&mut self, now: Instant) {
        if let Some(at) = self.last_pan {
            if now.duration_since(at) >= INTERACTION_GRACE {
                self.spin.handle(SpinEvent::InteractionEnd);
                self.last_pan = None;
            }
        }
    }

    pub fn run(&mut self, term: &mut Terminal) -> io::Result<()> {
        let frame_time = self.config.frame_time;

        loop {
            term.refresh_size()?;
            let instant = Instant::now();

            if let Some((code, _mods)) = term.check_key()? {
                if self.handle_key(code, instant) {
                    break;
                }
            }
            self.settle_interaction(instant);

            let now = Utc::now();
            if !self.paused && self.ticker.due(instant) {
                self.tick(now, &mut io::stdout())?;
            }

            let spin = self.spin.step(self.globe.camera.zoom, frame_time as f64);
            self.globe.advance_camera(spin);

            term.clear();
            self.globe.render(term, self.colors.scheme, now, frame_time);
            self.draw_overlay(term, now);
            term.present()?;

            if let PassOutcome::Updated = self.after_present() {
                tracing::debug!("highlights now {:?}", self.reconciler.state().current);
            }
            term.sleep(frame_time);
        }

        Ok(())
    }

    fn draw_overlay(&self, term: &mut Terminal, now: DateTime<Utc>) {
        let (width, height) = term.size();
        let scheme = self.colors.scheme;

        let mut countdown = Countdown::until(self.config.start, now);
        countdown.is_live = self.phase == TrackerPhase::InProgress;
        let banner = notification(
            &countdown,
            self.phase == TrackerPhase::Complete,
            self.snapshot.place.as_deref(),
        );
        let banner_color = match self.phase {
            TrackerPhase::NotStarted => StatusColor::Info,
            TrackerPhase::InProgress => StatusColor::Good,
            TrackerPhase::Complete => StatusColor::Muted,
        };
        let x = (width as i32 - banner.chars().count() as i32).max(0) / 2;
        term.set_str(x, 0, &banner, Some(status_to_scheme(scheme, banner_color)), true);

        let region = self.region_line();
        let x = (width as i32 - region.chars().count() as i32).max(0) / 2;
        term.set_str(x, 1, &region, Some(status_to_scheme(scheme, StatusColor::Info)), false);

        let stats = self.snapshot.stats.lines();
        let stats_top = height as i32 - 2 - stats.len() as i32;
        for (i, line) in stats.iter().enumerate() {
            term.set_str(1, stats_top + i as i32, line, Some(status_to_scheme(scheme, StatusColor::Good)), false);
        }

        let status = self.status_line();
        term.set_str(1, height as i32 - 1, &status, Some(status_to_scheme(scheme, StatusColor::Muted)), false);

        if self.show_help {
            render_help_overlay(term, "SANTA TRACKER", TRACKER_HELP);
        }
    }

    fn region_line(&self) -> String {
        let position = self.snapshot.position;
        match &self.reconciler.state().current {
            CurrentRegion::HomeBase => format!("At the North Pole workshop ({})", position),
            CurrentRegion::Region(code) => {
                let name = self.globe.region_name(code).unwrap_or(code.as_str());
                format!("Over {} ({})", name, position)
            }
            CurrentRegion::Unresolved => format!("Over open water ({})", position),
        }
    }

    fn status_line(&self) -> String {
        let on_off = |b: bool| if b { "on" } else { "off" };
        let mut parts = vec![
            self.feed.describe(),
            format!("zoom {:.1}", self.globe.camera.zoom),
            format!("follow {}", on_off(self.globe.camera.follow)),
            format!("spin {}", on_off(self.spin.spin_enabled)),
            format!("chime {}", on_off(!self.chime.is_muted())),
            self.colors.name().to_string(),
        ];
        if self.globe.is_loading() {
            parts.push("loading regions".to_string());
        }
        if self.paused {
            parts.push("PAUSED".to_string());
        }
        parts.push("? help".to_string());
        parts.join(" │ ")
    }
}

/// Open the terminal and track until the user quits
pub fn run(config: TrackerConfig) -> io::Result<()> {
    let mut session = Session::new(config);
    let mut term = Terminal::new()?;
    let result = session.run(&mut term);
    drop(term);
    if let Err(e) = &result {
        tracing::error!("tracker stopped: {}", e);
    }
    result
}

/// One-shot snapshot of the simulated journey
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub at: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub progress: f64,
    pub phase: &'static str,
    pub location: Coordinate,
    pub place: String,
    pub stops_made: usize,
    pub stops_total: usize,
    pub notification: String,
    pub highlight: HighlightState,
    pub stats: JourneyStats,
}

impl StatusReport {
    pub fn at(config: &TrackerConfig, at: DateTime<Utc>) -> Self {
        let progress = progress_at(config.start, config.end, at);
        let phase = TrackerPhase::from_progress(progress);
        let mut feed = SimulatedFeed::new(config.start, config.end);
        let snapshot = feed.poll(at);
        let route = feed.route();

        let layer = RegionLayer::builtin();
        let highlight = reconcile(snapshot.position, &snapshot.visited, &layer).unwrap_or_else(|e| {
            tracing::warn!("status highlight failed: {}", e);
            HighlightState::default()
        });

        let mut countdown = Countdown::until(config.start, at);
        countdown.is_live = phase == TrackerPhase::InProgress;
        let place = place_name_at(progress);

        Self {
            at,
            start: config.start,
            end: config.end,
            progress,
            phase: phase.label(),
            location: location_at(progress),
            place: place.to_string(),
            stops_made: route.visited_count(at),
            stops_total: route.waypoints().len(),
            notification: notification(&countdown, phase == TrackerPhase::Complete, Some(place)),
            highlight,
            stats: snapshot.stats,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.notification)?;
        writeln!(f)?;
        writeln!(f, "Window:    {} → {}", self.start.to_rfc3339(), self.end.to_rfc3339())?;
        writeln!(f, "Progress:  {:.1}% ({})", self.progress * 100.0, self.phase)?;
        writeln!(f, "Location:  {}", self.location)?;
        writeln!(f, "Place:     {}", self.place)?;
        writeln!(f, "Stops:     {} of {}", self.stops_made, self.stops_total)?;
        let region = match &self.highlight.current {
            CurrentRegion::HomeBase => "home base".to_string(),
            CurrentRegion::Region(code) => code.to_string(),
            CurrentRegion::Unresolved => "none".to_string(),
        };
        writeln!(f, "Region:    {}", region)?;
        let visited: Vec<&str> = self.highlight.visited.iter().map(|c| c.as_str()).collect();
        writeln!(
            f,
            "Visited:   {}",
            if visited.is_empty() { "none".to_string() } else { visited.join(", ") }
        )?;
        let trail = self.highlight.trail.as_ref().map_or(0, Vec::len);
        writeln!(f, "Trail:     {} points", trail)?;
        for line in self.stats.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::LayerSource;
    use crate::trajectory::HOME;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use pretty_assertions::assert_eq;

    fn config() -> TrackerConfig {
        TrackerConfig {
            start: Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap(),
            feed_url: None,
            layer: LayerSource::Builtin,
            mute: false,
            frame_time: 0.05,
        }
    }

    fn session() -> Session {
        let config = config();
        let feed = Box::new(SimulatedFeed::new(config.start, config.end));
        Session::with_parts(config, feed, TerminalGlobe::with_layer(RegionLayer::builtin()), Instant::now())
    }

    #[test]
    fn ticker_fires_once_per_period() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(TICK, t0);
        assert!(ticker.due(t0));
        assert!(!ticker.due(t0 + Duration::from_millis(500)));
        assert!(ticker.due(t0 + Duration::from_millis(1000)));
        // a long stall yields one tick, not a burst
        assert!(ticker.due(t0 + Duration::from_secs(10)));
        assert!(!ticker.due(t0 + Duration::from_millis(10_500)));
        ticker.stop();
        assert!(!ticker.due(t0 + Duration::from_secs(60)));
        assert!(!ticker.is_running());
    }

    #[test]
    fn tick_moves_marker_before_highlighting() {
        let mut session = session();
        let mut bell = Vec::<u8>::new();
        let noon = config().start + ChronoDuration::hours(12);
        session.tick(noon, &mut bell).unwrap();

        assert_eq!(session.globe.marker(), Coordinate::new(0.0, 60.0));
        assert_eq!(session.phase(), TrackerPhase::InProgress);
        assert!(session.reconciler.is_armed());
        assert_eq!(session.highlight(), &HighlightState::default());

        assert_eq!(session.after_present(), PassOutcome::Updated);
        let trail = session.highlight().trail.as_ref().unwrap();
        assert_eq!(trail.len(), 13);
        assert_eq!(trail.last(), Some(&Coordinate::new(0.0, 60.0)));
        assert_eq!(session.after_present(), PassOutcome::Idle);
    }

    /// Replays canned snapshots, repeating the last one
    struct ScriptedFeed(Vec<JourneySnapshot>);

    impl JourneyFeed for ScriptedFeed {
        fn poll(&mut self, _now: DateTime<Utc>) -> JourneySnapshot {
            if self.0.len() > 1 {
                self.0.remove(0)
            } else {
                self.0[0].clone()
            }
        }

        fn describe(&self) -> String {
            "scripted feed".to_string()
        }
    }

    fn snapshot_at(position: Coordinate) -> JourneySnapshot {
        JourneySnapshot {
            position,
            place: Some("Somewhere".to_string()),
            visited: Vec::new(),
            stats: JourneyStats::default(),
        }
    }

    #[test]
    fn invalid_feed_position_keeps_previous_marker() {
        let config = config();
        let tokyo = Coordinate::new(139.7, 35.7);
        let feed = Box::new(ScriptedFeed(vec![
            snapshot_at(tokyo),
            snapshot_at(Coordinate::new(400.0, 200.0)),
        ]));
        let globe = TerminalGlobe::with_layer(RegionLayer::builtin());
        let mut session = Session::with_parts(config.clone(), feed, globe, Instant::now());

        session.tick(config.start + ChronoDuration::hours(1), &mut io::sink()).unwrap();
        assert_eq!(session.globe.marker(), tokyo);

        session.tick(config.start + ChronoDuration::hours(2), &mut io::sink()).unwrap();
        assert_eq!(session.globe.marker(), tokyo);
        assert_eq!(session.snapshot.position, tokyo);

        for _ in 0..40 {
            session.globe.advance_camera(0.0);
        }
        assert!(session.globe.camera.center.is_valid());
        assert!((session.globe.camera.center.lat - tokyo.lat).abs() < 1.0);

        assert_eq!(session.after_present(), PassOutcome::Updated);
        assert_eq!(
            session.highlight().current,
            CurrentRegion::Region(crate::highlight::RegionCode::new("JPN"))
        );
    }

    #[test]
    fn pass_retries_until_layer_loads() {
        let config = config();
        let feed = Box::new(SimulatedFeed::new(config.start, config.end));
        let globe = TerminalGlobe::new(LayerSource::Builtin);
        let mut session = Session::with_parts(config, feed, globe, Instant::now());
        session.tick(session.config.start + ChronoDuration::hours(3), &mut io::sink()).unwrap();

        let mut outcome = session.after_present();
        assert_eq!(outcome, PassOutcome::Retry);
        for _ in 0..500 {
            if outcome != PassOutcome::Retry {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
            outcome = session.after_present();
        }
        assert_eq!(outcome, PassOutcome::Updated);
    }

    #[test]
    fn completion_stops_ticker_and_goes_home() {
        let mut session = session();
        let mut bell = Vec::<u8>::new();
        session.tick(config().end + ChronoDuration::minutes(1), &mut bell).unwrap();
        assert_eq!(session.phase(), TrackerPhase::Complete);
        assert!(!session.ticker.is_running());
        assert_eq!(session.globe.marker(), HOME);

        session.after_present();
        assert_eq!(session.highlight().current, CurrentRegion::HomeBase);
        assert_eq!(session.highlight().trail, None);
    }

    #[test]
    fn liftoff_rings_the_bell() {
        let mut session = session();
        let mut bell = Vec::<u8>::new();
        let start = config().start;
        session.tick(start - ChronoDuration::seconds(1), &mut bell).unwrap();
        assert!(bell.is_empty());
        session.tick(start + ChronoDuration::seconds(1), &mut bell).unwrap();
        assert_eq!(bell, b"\x07");
    }

    #[test]
    fn muted_session_stays_quiet() {
        let mut session = session();
        assert!(!session.handle_key(KeyCode::Char('m'), Instant::now()));
        let mut bell = Vec::<u8>::new();
        let start = config().start;
        session.tick(start - ChronoDuration::seconds(1), &mut bell).unwrap();
        session.tick(start + ChronoDuration::seconds(1), &mut bell).unwrap();
        assert!(bell.is_empty());
    }

    #[test]
    fn panning_takes_over_the_camera() {
        let mut session = session();
        let t0 = Instant::now();
        assert!(session.globe.camera.follow);

        session.handle_key(KeyCode::Left, t0);
        assert!(!session.globe.camera.follow);
        assert!(session.spin.user_interacting);

        session.settle_interaction(t0 + Duration::from_millis(500));
        assert!(session.spin.user_interacting);
        session.settle_interaction(t0 + INTERACTION_GRACE);
        assert!(!session.spin.user_interacting);
    }

    #[test]
    fn keys_toggle_session_state() {
        let mut session = session();
        let now = Instant::now();
        assert!(!session.handle_key(KeyCode::Char('?'), now));
        assert!(session.show_help);
        session.handle_key(KeyCode::Char(' '), now);
        assert!(session.paused);
        session.handle_key(KeyCode::Char('s'), now);
        assert!(!session.spin.spin_enabled);
        session.handle_key(KeyCode::Char('+'), now);
        assert_eq!(session.globe.camera.zoom, DEFAULT_ZOOM + ZOOM_STEP);
        session.handle_key(KeyCode::Char('0'), now);
        assert_eq!(session.globe.camera.zoom, DEFAULT_ZOOM);
        assert!(session.handle_key(KeyCode::Char('q'), now));
        assert!(session.handle_key(KeyCode::Esc, now));
    }

    #[test]
    fn status_report_midflight() {
        let config = config();
        let report = StatusReport::at(&config, config.start + ChronoDuration::hours(12));
        assert_eq!(report.progress, 0.5);
        assert_eq!(report.phase, "in progress");
        assert_eq!(report.location, Coordinate::new(0.0, 60.0));
        assert_eq!(report.place, "Auckland");
        assert_eq!(report.notification, "Santa is currently in Auckland!");
        assert_eq!(report.highlight.trail.as_ref().map(Vec::len), Some(13));
        assert_eq!((report.stops_made, report.stops_total), (12, 24));

        let text = report.to_string();
        assert!(text.contains("Progress:  50.0% (in progress)"));
        assert!(text.contains("Place:     Auckland"));
    }

    #[test]
    fn status_report_before_liftoff() {
        let config = config();
        let report = StatusReport::at(&config, config.start - ChronoDuration::minutes(90));
        assert_eq!(report.phase, "not started");
        assert_eq!(report.place, "North Pole");
        assert_eq!(report.notification, "Santa takes off in: 0d 1h 30m 0s");
        assert_eq!(report.highlight.current, CurrentRegion::HomeBase);
    }
}
