//! Journey statistics shown in the corner panel

use crate::geo::{path_length_km, Coordinate};
use serde::Serialize;

/// Presents delivered over a complete simulated night
pub const SIMULATED_PRESENTS: f64 = 2_000_000_000.0;
/// Cookies eaten per simulated stop
pub const COOKIES_PER_STOP: u64 = 7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct JourneyStats {
    pub presents_delivered: u64,
    pub cookies_eaten: u64,
    pub distance_km: f64,
}

impl JourneyStats {
    /// Figures for the simulated route: `path` is the ground track flown so far
    pub fn simulated(progress: f64, stops_made: usize, path: &[Coordinate]) -> Self {
        let p = crate::trajectory::clamp_progress(progress);
        Self {
            presents_delivered: (p * SIMULATED_PRESENTS).floor() as u64,
            cookies_eaten: stops_made as u64 * COOKIES_PER_STOP,
            distance_km: path_length_km(path),
        }
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("{} Presents Delivered", group_thousands(self.presents_delivered)),
            format!("{} Cookies Eaten", group_thousands(self.cookies_eaten)),
            format!("{} km Traveled", group_thousands(self.distance_km.max(0.0).round() as u64)),
        ]
    }
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
