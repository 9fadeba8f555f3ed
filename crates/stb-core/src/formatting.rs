//! Reply text for the slot timer.

use chrono::{DateTime, Duration, Utc};

/// Whole minutes and seconds held, truncated. Never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Elapsed {
    pub minutes: i64,
    pub seconds: i64,
}

impl Elapsed {
    pub fn between(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_duration(now.signed_duration_since(start))
    }

    pub fn from_duration(d: Duration) -> Self {
        let total = d.num_seconds().max(0);
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }
}

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} минут {} секунд", self.minutes, self.seconds)
    }
}

pub fn acquired(holder: &str) -> String {
    format!("Номер у {holder} стал")
}

pub fn preempted(holder: &str, elapsed: Elapsed) -> String {
    format!("Номер стоял у {holder}: {elapsed}")
}

pub fn released(holder: &str, elapsed: Elapsed) -> String {
    format!("Номер стоял у {holder} (слёт): {elapsed}")
}

pub fn status(holder: &str, elapsed: Elapsed) -> String {
    format!("Таймер работает у {holder}: {elapsed}")
}

pub fn not_running() -> String {
    "Таймер не запущен".to_string()
}

pub fn nickname_usage(command: &str) -> String {
    format!("Используйте: /{command} @username кличка\nПример: /{command} @test_user Орел")
}

pub fn nickname_set(username: &str, nickname: &str) -> String {
    format!("Кличка для @{username} установлена: {nickname}")
}

pub fn unknown_user(username: &str) -> String {
    format!("Пользователь @{username} не найден. Он должен был хотя бы раз написать в чат.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_truncates_fractional_seconds() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let now = start + Duration::milliseconds(125_999);
        let e = Elapsed::between(start, now);
        assert_eq!(e, Elapsed { minutes: 2, seconds: 5 });
        assert_eq!(e.to_string(), "2 минут 5 секунд");
    }

    #[test]
    fn elapsed_has_no_upper_bound_on_minutes() {
        let e = Elapsed::from_duration(Duration::hours(3) + Duration::seconds(59));
        assert_eq!(e, Elapsed { minutes: 180, seconds: 59 });
    }

    #[test]
    fn elapsed_clamps_clock_skew_to_zero() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_100, 0).unwrap();
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(Elapsed::between(start, now), Elapsed { minutes: 0, seconds: 0 });
    }

    #[test]
    fn usage_names_the_command_and_gives_example() {
        let text = nickname_usage("user");
        assert!(text.contains("/user @username кличка"));
        assert!(text.contains("Пример: /user @test_user Орел"));
    }
}
