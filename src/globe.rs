//! Braille globe the tracker draws on
//!
//! Orthographic projection of the region layer with the two highlight
//! selectors, the trail and the marker on top. The layer is loaded on a
//! worker thread after the first frame is on screen; until it arrives the
//! globe answers region queries with `QueryUnavailable`.

use crate::colors::scheme_color;
use crate::geo::{longitude_delta, normalize_longitude, Coordinate};
use crate::highlight::{is_home_base, HighlightError, RegionCode};
use crate::regions::{LayerSource, Region, RegionLayer, RegionLoadError};
use crate::surface::{HighlightLayer, RenderSurface, SpatialQuery};
use crate::terminal::Terminal;
use chrono::{DateTime, Timelike, Utc};
use crossterm::style::Color;
use rand::prelude::*;
use std::collections::BTreeSet;
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 6.0;
pub const DEFAULT_ZOOM: f64 = 1.5;

/// Fraction of the remaining distance covered per follow step
pub const FOLLOW_EASE: f64 = 0.15;
/// Latitude of the ring drawn around the pole while Santa is home
const HOME_RING_LAT: f64 = 85.0;
const SNOWFLAKES: usize = 60;

/// Braille dot bit for each (row, column) inside a cell
const DOT_BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

/// What a dot was drawn for; later variants win when dots share a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ink {
    Snow,
    Night,
    Grid,
    Outline,
    Visited,
    Current,
    Trail,
    Ring,
    Marker,
}

impl Ink {
    pub fn color(self, scheme: u8) -> (Color, bool) {
        match self {
            Ink::Snow => (Color::White, false),
            Ink::Night => scheme_color(scheme, 0, false),
            Ink::Grid => scheme_color(scheme, 1, false),
            Ink::Outline => scheme_color(scheme, 2, false),
            Ink::Visited => scheme_color(scheme, 3, true),
            Ink::Current => (Color::Red, true),
            Ink::Trail => (Color::Grey, false),
            Ink::Ring => (Color::Yellow, false),
            Ink::Marker => (Color::Yellow, true),
        }
    }
}

/// Dot grid two dots wide and four tall per terminal cell
#[derive(Clone, Debug)]
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    dots: Vec<Option<Ink>>,
}

impl BrailleCanvas {
    pub fn new(cols: u16, rows: u16) -> Self {
        let width = cols as usize * 2;
        let height = rows as usize * 4;
        Self {
            width,
            height,
            dots: vec![None; width * height],
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.dots.fill(None);
    }

    pub fn plot(&mut self, x: i32, y: i32, ink: Ink) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let dot = &mut self.dots[y as usize * self.width + x as usize];
        if dot.map_or(true, |old| old < ink) {
            *dot = Some(ink);
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Ink> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.dots[y * self.width + x]
    }

    /// Braille glyph and strongest ink for terminal cell (cx, cy)
    pub fn cell(&self, cx: usize, cy: usize) -> Option<(char, Ink)> {
        let mut bits = 0u8;
        let mut strongest: Option<Ink> = None;
        for (row, row_bits) in DOT_BITS.iter().enumerate() {
            for (col, bit) in row_bits.iter().enumerate() {
                if let Some(ink) = self.get(cx * 2 + col, cy * 4 + row) {
                    bits |= bit;
                    strongest = strongest.max(Some(ink));
                }
            }
        }
        let ink = strongest?;
        char::from_u32(0x2800 + bits as u32).map(|ch| (ch, ink))
    }
}

/// Where the globe is looking
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub center: Coordinate,
    pub zoom: f64,
    /// Ease toward the marker every frame
    pub follow: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Coordinate::new(0.0, 45.0),
            zoom: DEFAULT_ZOOM,
            follow: true,
        }
    }
}

impl Camera {
    /// Radius multiplier relative to the default zoom
    pub fn scale(&self) -> f32 {
        2f64.powf(self.zoom - DEFAULT_ZOOM) as f32
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Move the centre by a screen-sized step; smaller when zoomed in
    pub fn pan(&mut self, dlon: f64, dlat: f64) {
        let step = 1.0 / self.scale() as f64;
        self.center.lon = normalize_longitude(self.center.lon + dlon * step);
        self.center.lat = (self.center.lat + dlat * step).clamp(-89.0, 89.0);
    }

    pub fn ease_toward(&mut self, target: Coordinate, amount: f64) {
        let amount = amount.clamp(0.0, 1.0);
        self.center.lon =
            normalize_longitude(self.center.lon + longitude_delta(self.center.lon, target.lon) * amount);
        self.center.lat = (self.center.lat + (target.lat - self.center.lat) * amount).clamp(-89.0, 89.0);
    }

    /// Rotate the view westward by `degrees`
    pub fn spin(&mut self, degrees: f64) {
        self.center.lon = normalize_longitude(self.center.lon - degrees);
    }
}

/// Orthographic projection for one frame, in braille dot units
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    half_w: f32,
    half_h: f32,
    radius: f32,
    rotation: f32,
    sin_tilt: f32,
    cos_tilt: f32,
}

impl Projection {
    pub fn new(cols: u16, rows: u16, camera: &Camera) -> Self {
        let w = cols as f32;
        let h = rows as f32;
        let base_radius = (h * 1.8).min(w * 0.8) * 0.4;
        let (lat, lon) = camera.center.lat_lon_radians();
        let (sin_tilt, cos_tilt) = (-lat).sin_cos();
        Self {
            half_w: w / 2.0,
            half_h: h / 2.0,
            radius: base_radius * camera.scale(),
            rotation: -lon,
            sin_tilt,
            cos_tilt,
        }
    }

    /// Dot position of `at`, `None` on the far side of the globe
    pub fn to_dots(&self, at: Coordinate) -> Option<(i32, i32)> {
        let (lat, lon) = at.lat_lon_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = (lon + self.rotation).sin_cos();

        let x = cos_lat * sin_lon;
        let y = cos_lat * cos_lon;
        let z = sin_lat;

        let depth = y * self.cos_tilt - z * self.sin_tilt;
        let up = y * self.sin_tilt + z * self.cos_tilt;
        if depth < 0.0 {
            return None;
        }

        let screen_x = self.half_w + x * self.radius;
        let screen_y = self.half_h - up * self.radius * 0.5;
        Some(((screen_x * 2.0).floor() as i32, (screen_y * 4.0).floor() as i32))
    }

    fn unit_offsets(&self, bx: i32, by: i32) -> (f32, f32) {
        let screen_x = (bx as f32 + 0.5) / 2.0;
        let screen_y = (by as f32 + 0.5) / 4.0;
        (
            (screen_x - self.half_w) / self.radius,
            (self.half_h - screen_y) / (self.radius * 0.5),
        )
    }

    pub fn on_disk(&self, bx: i32, by: i32) -> bool {
        let (x, up) = self.unit_offsets(bx, by);
        x * x + up * up <= 1.0
    }

    /// Coordinate under dot (bx, by), `None` off the disk
    pub fn from_dots(&self, bx: i32, by: i32) -> Option<Coordinate> {
        let (x, up) = self.unit_offsets(bx, by);
        let r2 = x * x + up * up;
        if r2 > 1.0 {
            return None;
        }
        let depth = (1.0 - r2).sqrt();
        let y = depth * self.cos_tilt + up * self.sin_tilt;
        let z = -depth * self.sin_tilt + up * self.cos_tilt;

        let lat = z.clamp(-1.0, 1.0).asin().to_degrees() as f64;
        let lon = (x.atan2(y) - self.rotation).to_degrees() as f64;
        Some(Coordinate::new(normalize_longitude(lon), lat))
    }
}

/// Longitude (radians) where the sun is overhead at `now`
pub fn solar_longitude(now: DateTime<Utc>) -> f32 {
    let hours_utc = now.num_seconds_from_midnight() as f32 / 3600.0;
    ((12.0 - hours_utc) / 24.0) * TAU
}

/// 1.0 in full daylight, 0.0 at night, linear across the terminator
pub fn daylight_level(solar_lon: f32, lon: f32) -> f32 {
    let mut delta = lon - solar_lon;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    let abs_delta = delta.abs();
    let day_edge = FRAC_PI_2;
    let night_edge = FRAC_PI_2 + 0.314;
    if abs_delta < day_edge {
        1.0
    } else if abs_delta > night_edge {
        0.0
    } else {
        1.0 - (abs_delta - day_edge) / (night_edge - day_edge)
    }
}

struct Flake {
    x: f32,
    y: f32,
    speed: f32,
}

/// Snow drifting behind the globe
struct Snowfall {
    flakes: Vec<Flake>,
    rng: StdRng,
}

impl Snowfall {
    fn new() -> Self {
        Self {
            flakes: Vec::with_capacity(SNOWFLAKES),
            rng: StdRng::from_entropy(),
        }
    }

    fn step(&mut self, width: usize, height: usize, dt: f32) {
        if width == 0 || height == 0 {
            return;
        }
        let (w, h) = (width as f32, height as f32);
        while self.flakes.len() < SNOWFLAKES {
            self.flakes.push(Flake {
                x: self.rng.gen_range(0.0..w),
                y: self.rng.gen_range(0.0..h),
                speed: self.rng.gen_range(2.0..8.0),
            });
        }
        for flake in &mut self.flakes {
            flake.y += flake.speed * dt;
            flake.x = (flake.x + self.rng.gen_range(-0.5..0.5)).rem_euclid(w);
            if flake.y >= h {
                flake.y = 0.0;
                flake.x = self.rng.gen_range(0.0..w);
            }
        }
    }
}

enum LayerState {
    Pending(LayerSource),
    Loading(Receiver<Result<RegionLayer, RegionLoadError>>),
    Ready(RegionLayer),
    Failed(String),
}

/// The terminal rendering surface
pub struct TerminalGlobe {
    pub camera: Camera,
    layer: LayerState,
    current: BTreeSet<RegionCode>,
    visited: BTreeSet<RegionCode>,
    trail: Option<Vec<Coordinate>>,
    marker: Coordinate,
    pulse: f32,
    idle: bool,
    canvas: BrailleCanvas,
    snow: Snowfall,
}

impl TerminalGlobe {
    /// A globe whose region layer loads from `source` after the first frame
    pub fn new(source: LayerSource) -> Self {
        Self::with_state(LayerState::Pending(source))
    }

    /// A globe with its region layer already in place
    #[cfg(test)]
    pub fn with_layer(layer: RegionLayer) -> Self {
        Self::with_state(LayerState::Ready(layer))
    }

    fn with_state(layer: LayerState) -> Self {
        Self {
            camera: Camera::default(),
            layer,
            current: BTreeSet::new(),
            visited: BTreeSet::new(),
            trail: None,
            marker: crate::trajectory::HOME,
            pulse: 0.0,
            idle: false,
            canvas: BrailleCanvas::new(0, 0),
            snow: Snowfall::new(),
        }
    }

    #[cfg(test)]
    pub fn marker(&self) -> Coordinate {
        self.marker
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.layer, LayerState::Pending(_) | LayerState::Loading(_))
    }

    pub fn layer(&self) -> Option<&RegionLayer> {
        match &self.layer {
            LayerState::Ready(layer) => Some(layer),
            _ => None,
        }
    }

    /// Display name for a region code, when the layer knows it
    pub fn region_name(&self, code: &RegionCode) -> Option<&str> {
        self.layer()?.find(code).map(|r| r.name.as_str())
    }

    /// Called once the frame is on screen: raises the idle signal and
    /// moves the region layer load along.
    pub fn mark_presented(&mut self) {
        self.idle = true;

        match &self.layer {
            LayerState::Pending(source) => {
                let source = source.clone();
                let (tx, rx) = mpsc::channel();
                thread::spawn(move || {
                    let _ = tx.send(source.load());
                });
                tracing::debug!("loading region layer");
                self.layer = LayerState::Loading(rx);
            }
            LayerState::Loading(rx) => match rx.try_recv() {
                Ok(Ok(layer)) => {
                    tracing::info!("region layer ready ({} regions)", layer.len());
                    self.layer = LayerState::Ready(layer);
                }
                Ok(Err(e)) => {
                    tracing::warn!("region layer failed to load: {}", e);
                    self.layer = LayerState::Failed(e.to_string());
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("region loader exited without a result");
                    self.layer = LayerState::Failed("region loader exited".to_string());
                }
            },
            LayerState::Ready(_) | LayerState::Failed(_) => {}
        }
    }

    /// Follow the marker or apply idle spin, once per frame
    pub fn advance_camera(&mut self, spin_degrees: f64) {
        if self.camera.follow {
            self.camera.ease_toward(self.marker, FOLLOW_EASE);
        } else if spin_degrees != 0.0 {
            self.camera.spin(spin_degrees);
        }
    }

    /// Draw the globe into the terminal buffer
    pub fn render(&mut self, term: &mut Terminal, scheme: u8, now: DateTime<Utc>, dt: f32) {
        let (cols, rows) = term.size();
        self.draw(cols, rows, now, dt);

        for cy in 0..rows as usize {
            for cx in 0..cols as usize {
                if let Some((ch, ink)) = self.canvas.cell(cx, cy) {
                    let (color, bold) = ink.color(scheme);
                    term.set(cx as i32, cy as i32, ch, Some(color), bold);
                }
            }
        }
    }

    fn draw(&mut self, cols: u16, rows: u16, now: DateTime<Utc>, dt: f32) {
        if self.canvas.dims() != (cols as usize * 2, rows as usize * 4) {
            self.canvas = BrailleCanvas::new(cols, rows);
        }
        self.canvas.clear();

        let proj = Projection::new(cols, rows, &self.camera);
        let solar_lon = solar_longitude(now);

        self.draw_fills(&proj);
        self.draw_graticule(&proj, solar_lon);
        self.draw_outlines(&proj, solar_lon);
        self.draw_trail(&proj);
        if is_home_base(self.marker) {
            self.draw_home_ring(&proj);
        }
        self.pulse += dt * 3.0;
        self.draw_marker(&proj);

        let (w, h) = self.canvas.dims();
        self.snow.step(w, h, dt);
        for flake in &self.snow.flakes {
            let (x, y) = (flake.x as i32, flake.y as i32);
            if !proj.on_disk(x, y) {
                self.canvas.plot(x, y, Ink::Snow);
            }
        }
    }

    fn draw_fills(&mut self, proj: &Projection) {
        let LayerState::Ready(layer) = &self.layer else {
            return;
        };
        let targets: Vec<(&Region, Ink)> = self
            .current
            .iter()
            .map(|c| (c, Ink::Current))
            .chain(self.visited.iter().map(|c| (c, Ink::Visited)))
            .filter_map(|(code, ink)| layer.find(code).map(|r| (r, ink)))
            .collect();
        if targets.is_empty() {
            return;
        }

        let (w, h) = self.canvas.dims();
        for by in 0..h as i32 {
            for bx in 0..w as i32 {
                let Some(at) = proj.from_dots(bx, by) else {
                    continue;
                };
                if let Some((_, ink)) = targets.iter().find(|(r, _)| r.contains(at)) {
                    // visited regions get a hatched fill
                    if *ink == Ink::Current || (bx + by) % 2 == 0 {
                        self.canvas.plot(bx, by, *ink);
                    }
                }
            }
        }
    }

    fn draw_graticule(&mut self, proj: &Projection, solar_lon: f32) {
        for lat_deg in (-60..=60).step_by(30) {
            for lon_deg in -180..180 {
                let at = Coordinate::new(lon_deg as f64, lat_deg as f64);
                self.plot_daylit(proj, at, solar_lon);
            }
        }
        for lon_deg in (-180..180).step_by(30) {
            for lat_deg in -90..=90 {
                let at = Coordinate::new(lon_deg as f64, lat_deg as f64);
                self.plot_daylit(proj, at, solar_lon);
            }
        }
    }

    fn plot_daylit(&mut self, proj: &Projection, at: Coordinate, solar_lon: f32) {
        if daylight_level(solar_lon, at.lon.to_radians() as f32) <= 0.5 {
            return;
        }
        if let Some((bx, by)) = proj.to_dots(at) {
            self.canvas.plot(bx, by, Ink::Grid);
        }
    }

    fn draw_outlines(&mut self, proj: &Projection, solar_lon: f32) {
        let LayerState::Ready(layer) = &self.layer else {
            return;
        };
        let scale = self.camera.scale() as f64;
        for region in layer.regions() {
            for ring in region.polygons.iter().flat_map(|p| p.rings.iter()) {
                for (i, &a) in ring.iter().enumerate() {
                    let b = ring[(i + 1) % ring.len()];
                    for at in interpolate(a, b, scale) {
                        let Some((bx, by)) = proj.to_dots(at) else {
                            continue;
                        };
                        let ink = if daylight_level(solar_lon, at.lon.to_radians() as f32) > 0.7 {
                            Ink::Outline
                        } else {
                            Ink::Night
                        };
                        self.canvas.plot(bx, by, ink);
                    }
                }
            }
        }
    }

    fn draw_trail(&mut self, proj: &Projection) {
        let Some(trail) = &self.trail else {
            return;
        };
        let scale = self.camera.scale() as f64;
        for pair in trail.windows(2) {
            for (i, at) in interpolate(pair[0], pair[1], scale).into_iter().enumerate() {
                if i % 3 != 0 {
                    continue;
                }
                if let Some((bx, by)) = proj.to_dots(at) {
                    self.canvas.plot(bx, by, Ink::Trail);
                }
            }
        }
    }

    fn draw_home_ring(&mut self, proj: &Projection) {
        for lon_deg in (-180..180).step_by(3) {
            let at = Coordinate::new(lon_deg as f64, HOME_RING_LAT);
            if let Some((bx, by)) = proj.to_dots(at) {
                self.canvas.plot(bx, by, Ink::Ring);
            }
        }
    }

    fn draw_marker(&mut self, proj: &Projection) {
        let Some((bx, by)) = proj.to_dots(self.marker) else {
            return;
        };
        let size = ((self.pulse.sin() + 1.0) * 1.5 + 1.0) as i32;
        for dy in -size..=size {
            for dx in -size..=size {
                if dx.abs() + dy.abs() <= size {
                    self.canvas.plot(bx + dx, by + dy, Ink::Marker);
                }
            }
        }
    }
}

/// Points along the segment a→b, taking the short way round in longitude
fn interpolate(a: Coordinate, b: Coordinate, scale: f64) -> Vec<Coordinate> {
    let dlon = longitude_delta(a.lon, b.lon);
    let dlat = b.lat - a.lat;
    let span = dlon.abs().max(dlat.abs());
    let steps = ((span * 2.0 * scale).ceil() as usize).clamp(1, 720);
    (0..steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            Coordinate::new(normalize_longitude(a.lon + dlon * t), a.lat + dlat * t)
        })
        .collect()
}

impl SpatialQuery for TerminalGlobe {
    fn query_region(&self, at: Coordinate) -> Result<Option<RegionCode>, HighlightError> {
        match &self.layer {
            LayerState::Pending(_) | LayerState::Loading(_) => Err(HighlightError::QueryUnavailable),
            LayerState::Failed(reason) => Err(HighlightError::QueryFailure(reason.clone())),
            LayerState::Ready(layer) => layer.query_region(at),
        }
    }
}

impl RenderSurface for TerminalGlobe {
    fn set_highlight_filter(&mut self, layer: HighlightLayer, codes: &BTreeSet<RegionCode>) {
        tracing::trace!("{} filter -> {:?}", layer.name(), codes);
        match layer {
            HighlightLayer::Current => self.current = codes.clone(),
            HighlightLayer::Visited => self.visited = codes.clone(),
        }
    }

    fn replace_trail(&mut self, trail: Option<&[Coordinate]>) {
        self.trail = trail.map(<[Coordinate]>::to_vec);
    }

    fn set_marker(&mut self, at: Coordinate) {
        self.marker = at;
    }

    fn take_idle(&mut self) -> bool {
        std::mem::take(&mut self.idle)
    }
}
