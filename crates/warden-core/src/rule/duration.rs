//! Duration literals such as `9m`, `2 hours` or `1h 30m`.

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;

static TIMEDELTA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^",
        r"((?P<weeks>\d+?)\s?(weeks?|w))?\s?",
        r"((?P<days>\d+?)\s?(days?|d))?\s?",
        r"((?P<hours>\d+?)\s?(hours?|hrs|hr?))?\s?",
        r"((?P<minutes>\d+?)\s?(minutes?|mins?|m))?\s?",
        r"((?P<seconds>\d+?)\s?(seconds?|secs?|s))?",
        r"$",
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    const ALL: [TimeUnit; 5] = [
        TimeUnit::Weeks,
        TimeUnit::Days,
        TimeUnit::Hours,
        TimeUnit::Minutes,
        TimeUnit::Seconds,
    ];

    fn group(self) -> &'static str {
        match self {
            TimeUnit::Weeks => "weeks",
            TimeUnit::Days => "days",
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
        }
    }

    fn span(self, amount: i64) -> Option<Duration> {
        match self {
            TimeUnit::Weeks => Duration::try_weeks(amount),
            TimeUnit::Days => Duration::try_days(amount),
            TimeUnit::Hours => Duration::try_hours(amount),
            TimeUnit::Minutes => Duration::try_minutes(amount),
            TimeUnit::Seconds => Duration::try_seconds(amount),
        }
    }
}

/// Parse a duration literal using any unit.
pub fn parse_timedelta(text: &str) -> Option<Duration> {
    parse_timedelta_with(text, &TimeUnit::ALL)
}

/// Parse a duration literal, rejecting units outside `allowed`.
pub fn parse_timedelta_with(text: &str, allowed: &[TimeUnit]) -> Option<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let caps = TIMEDELTA_RE.captures(text)?;

    let mut total = Duration::zero();
    let mut matched = false;
    for unit in TimeUnit::ALL {
        let Some(amount) = caps.name(unit.group()) else {
            continue;
        };
        if !allowed.contains(&unit) {
            return None;
        }
        let amount: i64 = amount.as_str().parse().ok()?;
        total = total.checked_add(&unit.span(amount)?)?;
        matched = true;
    }

    matched.then_some(total)
}

/// Render a duration in a form [`parse_timedelta`] reads back.
pub fn format_timedelta(duration: Duration) -> String {
    let seconds = duration.num_seconds();
    if seconds % 3600 == 0 {
        format!("{} hours", seconds / 3600)
    } else if seconds % 60 == 0 {
        format!("{} minutes", seconds / 60)
    } else {
        format!("{} seconds", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_timedelta("9m"), Some(Duration::minutes(9)));
        assert_eq!(parse_timedelta("50m"), Some(Duration::minutes(50)));
        assert_eq!(parse_timedelta("2 hours"), Some(Duration::hours(2)));
        assert_eq!(parse_timedelta("15 minutes"), Some(Duration::minutes(15)));
        assert_eq!(
            parse_timedelta("1h 30m"),
            Some(Duration::hours(1) + Duration::minutes(30))
        );
        assert_eq!(parse_timedelta("1 week 2 days"), Some(Duration::days(9)));
        assert_eq!(parse_timedelta("10 SECONDS"), Some(Duration::seconds(10)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timedelta(""), None);
        assert_eq!(parse_timedelta("soon"), None);
        assert_eq!(parse_timedelta("5 months"), None);
        assert_eq!(parse_timedelta("m"), None);
    }

    #[test]
    fn test_allowed_units() {
        let hm = [TimeUnit::Hours, TimeUnit::Minutes];
        assert_eq!(parse_timedelta_with("2 hours", &hm), Some(Duration::hours(2)));
        assert_eq!(parse_timedelta_with("2 days", &hm), None);
        assert_eq!(parse_timedelta_with("30s", &hm), None);
    }

    #[test]
    fn test_format_reparses() {
        for d in [Duration::hours(3), Duration::minutes(90), Duration::seconds(75)] {
            assert_eq!(parse_timedelta(&format_timedelta(d)), Some(d));
        }
    }
}
