//! Conversion between schedule periods and calendar dates.
//!
//! The scheduling core works on a bare integer time axis. This helper sits at
//! the boundary for collaborators that need to label periods with dates.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown time scale name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown time scale: {0}")]
pub struct UnknownTimeScale(pub String);

/// Length of one period on the time axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeScale {
    #[default]
    Day,
    Week,
}

impl FromStr for TimeScale {
    type Err = UnknownTimeScale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(UnknownTimeScale(s.to_string())),
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
        }
    }
}

/// Calendar anchoring of a project's time axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline {
    /// Date of period 0.
    pub start: NaiveDate,
    pub scale: TimeScale,
    /// Current period marker. Only read by display collaborators.
    pub now: i32,
}

impl Timeline {
    pub fn new(start: NaiveDate, scale: TimeScale) -> Self {
        Self {
            start,
            scale,
            now: 0,
        }
    }

    /// Date at which `period` begins.
    ///
    /// Week periods are aligned to the Sunday on or before `start`.
    /// Returns `None` if the date falls outside chrono's calendar range.
    pub fn date_of(&self, period: i32) -> Option<NaiveDate> {
        let days = match self.scale {
            TimeScale::Day => i64::from(period),
            TimeScale::Week => i64::from(period) * 7 - self.week_offset(),
        };
        self.start.checked_add_signed(Duration::days(days))
    }

    /// Period containing `date`. Inverse of [`Timeline::date_of`].
    pub fn period_of(&self, date: NaiveDate) -> i32 {
        let days = (date - self.start).num_days();
        let period = match self.scale {
            TimeScale::Day => days,
            TimeScale::Week => (days + self.week_offset()).div_euclid(7),
        };
        period.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Date of the current period marker.
    pub fn now_date(&self) -> Option<NaiveDate> {
        self.date_of(self.now)
    }

    fn week_offset(&self) -> i64 {
        i64::from(self.start.weekday().num_days_from_sunday())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_time_scale() {
        assert_eq!("day".parse::<TimeScale>(), Ok(TimeScale::Day));
        assert_eq!(" Week ".parse::<TimeScale>(), Ok(TimeScale::Week));
        assert_eq!(
            "month".parse::<TimeScale>(),
            Err(UnknownTimeScale("month".to_string()))
        );
        assert_eq!(TimeScale::Week.to_string(), "week");
    }

    #[test]
    fn test_day_scale() {
        let timeline = Timeline::new(date(2025, 1, 1), TimeScale::Day);
        assert_eq!(timeline.date_of(0), Some(date(2025, 1, 1)));
        assert_eq!(timeline.date_of(31), Some(date(2025, 2, 1)));
        assert_eq!(timeline.date_of(-1), Some(date(2024, 12, 31)));
        assert_eq!(timeline.period_of(date(2025, 2, 1)), 31);
    }

    #[test]
    fn test_week_scale_aligns_to_sunday() {
        // 2025-01-01 is a Wednesday; the week containing it starts Sunday 2024-12-29
        let timeline = Timeline::new(date(2025, 1, 1), TimeScale::Week);
        assert_eq!(timeline.date_of(0), Some(date(2024, 12, 29)));
        assert_eq!(timeline.date_of(1), Some(date(2025, 1, 5)));
        assert_eq!(timeline.period_of(date(2025, 1, 1)), 0);
        assert_eq!(timeline.period_of(date(2025, 1, 4)), 0);
        assert_eq!(timeline.period_of(date(2025, 1, 5)), 1);
        assert_eq!(timeline.period_of(date(2024, 12, 28)), -1);
    }

    #[test]
    fn test_now_date() {
        let mut timeline = Timeline::new(date(2025, 3, 1), TimeScale::Day);
        timeline.now = 14;
        assert_eq!(timeline.now_date(), Some(date(2025, 3, 15)));
    }
}
