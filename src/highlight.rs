//! Region highlight reconciliation
//!
//! Works out which regions are "current" and "visited" from the tracked
//! position and the stops already made, using the surface's spatial query.
//! The computed [`HighlightState`] is the source of truth; pushing it to a
//! surface is a one-way projection (two selector updates plus one trail
//! replace), so every pass fully replaces what the previous one drew.

use crate::geo::Coordinate;
use crate::surface::{HighlightLayer, RenderSurface, SpatialQuery};
use crate::trajectory::HOME;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Distance in degrees of latitude from home that counts as being at home
pub const HOME_BASE_TOLERANCE: f64 = 0.1;

/// Identifier of a region in the highlight layer (ISO 3166-1 alpha-3)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HighlightError {
    #[error("invalid coordinate {0:?}")]
    InvalidCoordinate(Coordinate),
    #[error("region data not loaded yet")]
    QueryUnavailable,
    #[error("region query failed: {0}")]
    QueryFailure(String),
}

/// Region under the tracked position
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum CurrentRegion {
    /// No region contains the position
    #[default]
    Unresolved,
    Region(RegionCode),
    /// At the polar home base; no lookup is made
    HomeBase,
}

impl CurrentRegion {
    pub fn code(&self) -> Option<&RegionCode> {
        match self {
            CurrentRegion::Region(code) => Some(code),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HighlightState {
    pub current: CurrentRegion,
    /// Never contains the current region's code
    pub visited: BTreeSet<RegionCode>,
    /// Visited stops followed by the current position
    pub trail: Option<Vec<Coordinate>>,
}

impl HighlightState {
    /// Project this state onto a surface, replacing whatever was there
    pub fn apply<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        let current: BTreeSet<RegionCode> = self.current.code().cloned().into_iter().collect();
        surface.set_highlight_filter(HighlightLayer::Current, &current);
        surface.set_highlight_filter(HighlightLayer::Visited, &self.visited);
        surface.replace_trail(self.trail.as_deref());
    }
}

/// True when `at` is close enough to the pole to count as home base
pub fn is_home_base(at: Coordinate) -> bool {
    (at.lat - HOME.lat).abs() <= HOME_BASE_TOLERANCE
}

/// Compute a fresh highlight state.
///
/// Invalid visited entries are dropped; an invalid `current` or a failing
/// query aborts the whole pass.
pub fn reconcile(
    current: Coordinate,
    visited: &[Coordinate],
    query: &dyn SpatialQuery,
) -> Result<HighlightState, HighlightError> {
    let current = current.checked()?;

    let stops: Vec<Coordinate> = visited.iter().copied().filter(Coordinate::is_valid).collect();

    let current_region = if is_home_base(current) {
        CurrentRegion::HomeBase
    } else {
        match query.query_region(current)? {
            Some(code) if !code.is_empty() => CurrentRegion::Region(code),
            _ => CurrentRegion::Unresolved,
        }
    };

    let mut codes = BTreeSet::new();
    for stop in &stops {
        if let Some(code) = query.query_region(*stop)? {
            if !code.is_empty() {
                codes.insert(code);
            }
        }
    }
    if let Some(code) = current_region.code() {
        codes.remove(code);
    }

    let trail = if stops.is_empty() {
        None
    } else {
        let mut path = stops;
        path.push(current);
        Some(path)
    };

    Ok(HighlightState {
        current: current_region,
        visited: codes,
        trail,
    })
}

/// Result of one reconciliation attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// A new state was computed
    Updated,
    /// Region data was not ready; the pass stays armed for the next idle signal
    Retry,
    /// The pass was dropped and the previous state kept
    Skipped,
    /// Nothing was requested since the last pass
    Idle,
}

/// Keeps the last good state and decides when a pass is due
#[derive(Debug, Default)]
pub struct HighlightReconciler {
    state: HighlightState,
    armed: bool,
}

impl HighlightReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Ask for a pass on the next readiness signal
    pub fn request(&mut self) {
        self.armed = true;
    }

    /// Run a pass now, keeping the previous state on any failure
    pub fn run(
        &mut self,
        current: Coordinate,
        visited: &[Coordinate],
        query: &dyn SpatialQuery,
    ) -> PassOutcome {
        match reconcile(current, visited, query) {
            Ok(state) => {
                self.state = state;
                self.armed = false;
                PassOutcome::Updated
            }
            Err(HighlightError::QueryUnavailable) => {
                tracing::debug!("region data not ready, retrying on next idle");
                self.armed = true;
                PassOutcome::Retry
            }
            Err(err @ HighlightError::InvalidCoordinate(_)) => {
                tracing::warn!("skipping highlight update: {}", err);
                self.armed = false;
                PassOutcome::Skipped
            }
            Err(err) => {
                tracing::warn!("error updating region highlights: {}", err);
                self.armed = false;
                PassOutcome::Skipped
            }
        }
    }

    /// Handle a readiness signal: run an armed pass and project the result
    pub fn on_idle<S: RenderSurface>(
        &mut self,
        current: Coordinate,
        visited: &[Coordinate],
        surface: &mut S,
    ) -> PassOutcome {
        if !self.armed {
            return PassOutcome::Idle;
        }
        let outcome = self.run(current, visited, &*surface);
        if outcome == PassOutcome::Updated {
            self.state.apply(surface);
        }
        outcome
    }
}
