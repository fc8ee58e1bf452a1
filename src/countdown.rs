//! Countdown to lift-off and the notification line above the globe

use chrono::{DateTime, Duration, Utc};

/// How long after lift-off the flight counts as live
pub fn live_window() -> Duration {
    Duration::hours(24)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub is_live: bool,
}

impl Countdown {
    /// Time left until `target`; all zero once it has passed
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let diff = target - now;
        let is_live = diff <= Duration::zero() && diff >= -live_window();

        if diff < Duration::zero() {
            return Self {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
                is_live,
            };
        }

        let total = diff.num_seconds();
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
            is_live,
        }
    }
}

/// Banner text for the top of the screen
pub fn notification(countdown: &Countdown, finished: bool, place: Option<&str>) -> String {
    if finished {
        return "Santa is back at the North Pole. See you next year!".to_string();
    }
    if !countdown.is_live {
        return format!(
            "Santa takes off in: {}d {}h {}m {}s",
            countdown.days, countdown.hours, countdown.minutes, countdown.seconds
        );
    }
    match place {
        Some(p) if !p.is_empty() => format!("Santa is currently in {}!", p),
        _ => "Santa is on his way!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn liftoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap()
    }

    #[test]
    fn splits_remaining_time() {
        let now = liftoff() - Duration::seconds(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
        let c = Countdown::until(liftoff(), now);
        assert_eq!((c.days, c.hours, c.minutes, c.seconds), (2, 3, 4, 5));
        assert!(!c.is_live);
    }

    #[test]
    fn sub_second_remainders_round_down() {
        let now = liftoff() - Duration::milliseconds(1_500);
        let c = Countdown::until(liftoff(), now);
        assert_eq!(c.seconds, 1);
        assert!(!c.is_live);
    }

    #[test]
    fn live_at_and_after_liftoff() {
        let c = Countdown::until(liftoff(), liftoff());
        assert!(c.is_live);
        assert_eq!((c.days, c.hours, c.minutes, c.seconds), (0, 0, 0, 0));

        let c = Countdown::until(liftoff(), liftoff() + Duration::hours(5));
        assert!(c.is_live);
        assert_eq!((c.days, c.hours, c.minutes, c.seconds), (0, 0, 0, 0));
    }

    #[test]
    fn not_live_after_window() {
        let c = Countdown::until(liftoff(), liftoff() + Duration::hours(24) + Duration::seconds(1));
        assert!(!c.is_live);
        assert_eq!((c.days, c.hours, c.minutes, c.seconds), (0, 0, 0, 0));
    }

    #[test]
    fn notification_variants() {
        let before = Countdown::until(liftoff(), liftoff() - Duration::seconds(61));
        assert_eq!(notification(&before, false, None), "Santa takes off in: 0d 0h 1m 1s");

        let live = Countdown::until(liftoff(), liftoff() + Duration::hours(1));
        assert_eq!(notification(&live, false, Some("Tokyo")), "Santa is currently in Tokyo!");
        assert_eq!(notification(&live, false, None), "Santa is on his way!");
        assert_eq!(notification(&live, false, Some("")), "Santa is on his way!");
        assert!(notification(&live, true, None).contains("back at the North Pole"));
    }
}
