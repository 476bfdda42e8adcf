//! Reporting periods and the date windows they resolve to.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// Named date-range selector applied before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Period {
    #[default]
    #[serde(rename = "all")]
    All,
    /// Since Monday 00:00 of the current week.
    #[serde(rename = "week")]
    Week,
    /// Since the first day of the current month.
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "30days")]
    Last30Days,
}

impl Period {
    /// Parse a period selector. Unknown or missing values mean `All`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            Some("7days") => Self::Last7Days,
            Some("30days") => Self::Last30Days,
            Some(other) => {
                tracing::debug!(
                    period = %other,
                    "Unrecognized period, reporting over all feedback"
                );
                Self::All
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Week => "week",
            Self::Month => "month",
            Self::Last7Days => "7days",
            Self::Last30Days => "30days",
        }
    }

    /// Inclusive lower bound on `created_at`, or `None` for no bound.
    ///
    /// Calendar-aligned periods are computed in `tz`.
    pub fn lower_bound(self, now: DateTime<Utc>, tz: FixedOffset) -> Option<DateTime<Utc>> {
        let local_today = now.with_timezone(&tz).date_naive();
        match self {
            Self::All => None,
            Self::Week => {
                let back = i64::from(local_today.weekday().num_days_from_monday());
                start_of_day(local_today - Duration::days(back), tz)
            }
            Self::Month => start_of_day(local_today.with_day(1)?, tz),
            Self::Last7Days => Some(now - Duration::days(7)),
            Self::Last30Days => Some(now - Duration::days(30)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Midnight of `date` in `tz`, as a UTC instant.
pub fn start_of_day(date: NaiveDate, tz: FixedOffset) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
