//! Audible cue for lift-off and for each new stop

use crate::trajectory::TrackerPhase;
use std::io::{self, Write};

/// Why the bell rang
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cue {
    Liftoff,
    Arrived(String),
}

/// Rings the terminal bell; owned by the tracking session
#[derive(Debug)]
pub struct Chime {
    muted: bool,
    last_phase: Option<TrackerPhase>,
    last_place: Option<String>,
}

impl Chime {
    pub fn new(muted: bool) -> Self {
        Self {
            muted,
            last_phase: None,
            last_place: None,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        tracing::debug!("chime muted: {}", self.muted);
        self.muted
    }

    /// Decide whether this tick deserves a cue.
    ///
    /// The first observation only primes the state so starting the tracker
    /// mid-flight stays quiet.
    pub fn observe(&mut self, phase: TrackerPhase, place: Option<&str>) -> Option<Cue> {
        let previous_phase = self.last_phase.replace(phase);
        let previous_place = std::mem::replace(&mut self.last_place, place.map(str::to_string));

        let previous_phase = previous_phase?;
        if phase != TrackerPhase::InProgress {
            return None;
        }
        if previous_phase == TrackerPhase::NotStarted {
            return Some(Cue::Liftoff);
        }
        match (previous_place.as_deref(), place) {
            (Some(before), Some(now)) if before != now && !now.is_empty() => {
                Some(Cue::Arrived(now.to_string()))
            }
            _ => None,
        }
    }

    /// Write a BEL to `out` unless muted; returns whether it rang
    pub fn ring<W: Write>(&self, cue: &Cue, out: &mut W) -> io::Result<bool> {
        if self.muted {
            return Ok(false);
        }
        tracing::debug!("chime: {:?}", cue);
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_only_primes() {
        let mut chime = Chime::new(false);
        assert_eq!(chime.observe(TrackerPhase::InProgress, Some("Tokyo")), None);
        assert_eq!(chime.observe(TrackerPhase::InProgress, Some("Tokyo")), None);
    }

    #[test]
    fn rings_on_liftoff() {
        let mut chime = Chime::new(false);
        chime.observe(TrackerPhase::NotStarted, Some("North Pole"));
        assert_eq!(
            chime.observe(TrackerPhase::InProgress, Some("Auckland")),
            Some(Cue::Liftoff)
        );
    }

    #[test]
    fn rings_on_new_place() {
        let mut chime = Chime::new(false);
        chime.observe(TrackerPhase::InProgress, Some("Auckland"));
        assert_eq!(
            chime.observe(TrackerPhase::InProgress, Some("Tokyo")),
            Some(Cue::Arrived("Tokyo".to_string()))
        );
        assert_eq!(chime.observe(TrackerPhase::InProgress, None), None);
        assert_eq!(chime.observe(TrackerPhase::Complete, Some("North Pole")), None);
    }

    #[test]
    fn muted_chime_writes_nothing() {
        let mut chime = Chime::new(true);
        let mut out = Vec::<u8>::new();
        assert!(!chime.ring(&Cue::Liftoff, &mut out).unwrap());
        assert!(out.is_empty());

        assert!(!chime.toggle_mute());
        assert!(chime.ring(&Cue::Liftoff, &mut out).unwrap());
        assert_eq!(out, b"\x07");
    }
}
