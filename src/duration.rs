//! Human-readable breakdown of millisecond durations.

use std::collections::BTreeMap;
use std::fmt;

const MS_IN_SECOND: u64 = 1000;
const MS_IN_MINUTE: u64 = 60 * MS_IN_SECOND;
const MS_IN_HOUR: u64 = 60 * MS_IN_MINUTE;
const MS_IN_DAY: u64 = 24 * MS_IN_HOUR;
const MS_IN_WEEK: u64 = 7 * MS_IN_DAY;
// Calendar approximations: 30-day months, 365-day years.
const MS_IN_MONTH: u64 = 30 * MS_IN_DAY;
const MS_IN_YEAR: u64 = 365 * MS_IN_DAY;

/// A duration split into units, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationParts {
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub milliseconds: u64,
}

impl DurationParts {
    pub fn from_millis(milliseconds: u64) -> Self {
        let mut rest = milliseconds;
        let mut take = |unit: u64| {
            let n = rest / unit;
            rest %= unit;
            n
        };
        let years = take(MS_IN_YEAR);
        let months = take(MS_IN_MONTH);
        let weeks = take(MS_IN_WEEK);
        let days = take(MS_IN_DAY);
        let hours = take(MS_IN_HOUR);
        let minutes = take(MS_IN_MINUTE);
        let seconds = take(MS_IN_SECOND);
        DurationParts {
            years,
            months,
            weeks,
            days,
            hours,
            minutes,
            seconds,
            milliseconds: rest,
        }
    }

    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    /// Non-zero units as `(name, value, abbreviation)`.
    pub fn parts(&self) -> Vec<(&'static str, u64, &'static str)> {
        [
            ("years", self.years, "y"),
            ("months", self.months, "mo"),
            ("weeks", self.weeks, "w"),
            ("days", self.days, "d"),
            ("hours", self.hours, "h"),
            ("minutes", self.minutes, "m"),
            ("seconds", self.seconds, "s"),
            ("milliseconds", self.milliseconds, "ms"),
        ]
        .into_iter()
        .filter(|(_, value, _)| *value > 0)
        .collect()
    }

    /// e.g. `"1h 5m 1s 23ms"` with a `" "` delimiter. Zero is `""`.
    pub fn to_abbreviated(&self, delimiter: &str) -> String {
        self.parts()
            .iter()
            .map(|(_, value, abbr)| format!("{}{}", value, abbr))
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    pub fn to_list(&self) -> Vec<(&'static str, u64)> {
        self.parts()
            .into_iter()
            .map(|(name, value, _)| (name, value))
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, u64> {
        self.to_list().into_iter().collect()
    }
}

impl fmt::Display for DurationParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_abbreviated(" "))
    }
}
