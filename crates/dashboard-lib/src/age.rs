//! Pod age bucketing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 86_400;

/// Elapsed time since creation, bucketed to the largest whole unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Age {
    Days(i64),
    Hours(i64),
    Minutes(i64),
    Seconds(i64),
    /// Creation instant was missing or unparseable
    Unknown,
}

impl Age {
    /// Bucket an elapsed duration. Negative durations clamp to zero.
    pub fn from_elapsed(elapsed: chrono::Duration) -> Self {
        let secs = elapsed.num_seconds().max(0);

        if secs >= SECS_PER_DAY {
            Age::Days(secs / SECS_PER_DAY)
        } else if secs >= SECS_PER_HOUR {
            Age::Hours(secs / SECS_PER_HOUR)
        } else if secs >= SECS_PER_MINUTE {
            Age::Minutes(secs / SECS_PER_MINUTE)
        } else {
            Age::Seconds(secs)
        }
    }

    pub fn between(created: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_elapsed(now - created)
    }

    /// Age of an RFC 3339 creation timestamp relative to `now`
    pub fn from_timestamp(created: Option<&str>, now: DateTime<Utc>) -> Self {
        match created.and_then(parse_timestamp) {
            Some(created) => Self::between(created, now),
            None => Age::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Age::Unknown)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Age::Days(n) => write!(f, "{}d", n),
            Age::Hours(n) => write!(f, "{}h", n),
            Age::Minutes(n) => write!(f, "{}m", n),
            Age::Seconds(n) => write!(f, "{}s", n),
            Age::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn age_after(secs: i64) -> String {
        Age::between(now() - Duration::seconds(secs), now()).to_string()
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(age_after(0), "0s");
        assert_eq!(age_after(59), "59s");
        assert_eq!(age_after(60), "1m");
        assert_eq!(age_after(90), "1m");
        assert_eq!(age_after(3599), "59m");
        assert_eq!(age_after(3600), "1h");
        assert_eq!(age_after(7200), "2h");
        assert_eq!(age_after(86_399), "23h");
        assert_eq!(age_after(86_400), "1d");
        assert_eq!(age_after(2 * 86_400), "2d");
    }

    #[test]
    fn test_future_creation_clamps_to_zero() {
        assert_eq!(age_after(-30), "0s");
    }

    #[test]
    fn test_from_timestamp_parses_rfc3339() {
        let age = Age::from_timestamp(Some("2024-05-10T10:00:00Z"), now());
        assert_eq!(age, Age::Hours(2));

        let offset = Age::from_timestamp(Some("2024-05-10T13:00:00+02:00"), now());
        assert_eq!(offset, Age::Hours(1));
    }

    #[test]
    fn test_malformed_timestamp_is_unknown() {
        assert_eq!(Age::from_timestamp(Some("yesterday"), now()), Age::Unknown);
        assert_eq!(Age::from_timestamp(Some(""), now()), Age::Unknown);
        assert_eq!(Age::from_timestamp(None, now()), Age::Unknown);
        assert_eq!(Age::Unknown.to_string(), "unknown");
        assert!(!Age::Unknown.is_known());
    }
}
