//! Seams between the tracker core and whatever draws the globe

use crate::geo::Coordinate;
use crate::highlight::{HighlightError, RegionCode};
use std::collections::BTreeSet;

/// Region containment lookup exposed by the rendering surface
pub trait SpatialQuery {
    /// Region containing `at`, `Ok(None)` when no region does.
    ///
    /// Returns `QueryUnavailable` while supporting data is still loading.
    fn query_region(&self, at: Coordinate) -> Result<Option<RegionCode>, HighlightError>;
}

/// The two highlight selectors a surface keeps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightLayer {
    Current,
    Visited,
}

impl HighlightLayer {
    pub fn name(&self) -> &'static str {
        match self {
            HighlightLayer::Current => "country-current",
            HighlightLayer::Visited => "country-visited",
        }
    }
}

/// Everything the tracker pushes to a surface
pub trait RenderSurface: SpatialQuery {
    /// Replace the selector for `layer` with exactly `codes`
    fn set_highlight_filter(&mut self, layer: HighlightLayer, codes: &BTreeSet<RegionCode>);

    /// Replace the trail overlay; `None` retracts it
    fn replace_trail(&mut self, trail: Option<&[Coordinate]>);

    /// Place or move the tracked marker
    fn set_marker(&mut self, at: Coordinate);

    /// Consume the readiness signal raised after a finished render pass
    fn take_idle(&mut self) -> bool;
}
