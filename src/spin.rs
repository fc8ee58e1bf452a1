//! Idle rotation of the globe while nobody is steering it

/// Input that changes whether the globe may spin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinEvent {
    InteractionStart,
    InteractionEnd,
    ToggleSpin,
}

#[derive(Clone, Debug)]
pub struct GlobeSpin {
    pub spin_enabled: bool,
    pub user_interacting: bool,
    pub seconds_per_revolution: f64,
    /// Above this zoom the globe stands still
    pub max_spin_zoom: f64,
    /// Between this and `max_spin_zoom` rotation slows linearly
    pub slow_spin_zoom: f64,
}

impl Default for GlobeSpin {
    fn default() -> Self {
        Self {
            spin_enabled: true,
            user_interacting: false,
            seconds_per_revolution: 240.0,
            max_spin_zoom: 5.0,
            slow_spin_zoom: 3.0,
        }
    }
}

impl GlobeSpin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: SpinEvent) {
        match event {
            SpinEvent::InteractionStart => self.user_interacting = true,
            SpinEvent::InteractionEnd => self.user_interacting = false,
            SpinEvent::ToggleSpin => self.spin_enabled = !self.spin_enabled,
        }
    }

    /// Degrees to rotate westward for a frame of `dt` seconds at `zoom`
    pub fn step(&self, zoom: f64, dt: f64) -> f64 {
        if !self.spin_enabled || self.user_interacting || zoom >= self.max_spin_zoom {
            return 0.0;
        }
        let mut degrees_per_second = 360.0 / self.seconds_per_revolution;
        if zoom > self.slow_spin_zoom {
            let zoom_dif = (self.max_spin_zoom - zoom) / (self.max_spin_zoom - self.slow_spin_zoom);
            degrees_per_second *= zoom_dif;
        }
        degrees_per_second * dt.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_speed_at_low_zoom() {
        let spin = GlobeSpin::new();
        assert!((spin.step(1.5, 1.0) - 1.5).abs() < 1e-12);
        assert!((spin.step(3.0, 2.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn slows_between_thresholds() {
        let spin = GlobeSpin::new();
        assert!((spin.step(4.0, 1.0) - 0.75).abs() < 1e-12);
        assert_eq!(spin.step(5.0, 1.0), 0.0);
        assert_eq!(spin.step(6.0, 1.0), 0.0);
    }

    #[test]
    fn interaction_pauses_spin() {
        let mut spin = GlobeSpin::new();
        spin.handle(SpinEvent::InteractionStart);
        assert_eq!(spin.step(1.0, 1.0), 0.0);
        spin.handle(SpinEvent::InteractionEnd);
        assert!(spin.step(1.0, 1.0) > 0.0);
    }

    #[test]
    fn toggle_disables_and_reenables() {
        let mut spin = GlobeSpin::new();
        spin.handle(SpinEvent::ToggleSpin);
        assert!(!spin.spin_enabled);
        assert_eq!(spin.step(1.0, 10.0), 0.0);
        spin.handle(SpinEvent::ToggleSpin);
        assert!(spin.step(1.0, 10.0) > 0.0);
    }

    #[test]
    fn negative_frame_time_does_not_reverse() {
        assert_eq!(GlobeSpin::new().step(1.0, -1.0), 0.0);
    }
}
