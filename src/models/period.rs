//! Period filters for transaction listings.
//!
//! A period is selected by name (`today`, `week`, `month`, `year`, `period`,
//! `all`) and resolved against the current time into a half-open
//! `[from, until)` window over the operation date.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

pub const DEFAULT_LIST_LIMIT: i64 = 10;
pub const MAX_LIST_LIMIT: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// The current calendar day in UTC.
    Today,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
    /// The last 365 days.
    Year,
    /// Explicit bounds; `until` is already exclusive.
    Range {
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    },
    All,
}

/// Half-open window over operation dates. Missing bounds are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.until.is_none_or(|until| at < until)
    }
}

impl Period {
    /// Select a period by name. `period` without two parseable bounds, `all`
    /// and unrecognised names are all unfiltered.
    pub fn parse(name: Option<&str>, start_date: Option<&str>, end_date: Option<&str>) -> Self {
        match name.map(str::trim).unwrap_or_default() {
            "today" => Self::Today,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            "period" => {
                let from = start_date.and_then(parse_start_bound);
                let until = end_date.and_then(parse_end_bound);
                match (from, until) {
                    (Some(from), Some(until)) => Self::Range { from, until },
                    _ => Self::All,
                }
            }
            _ => Self::All,
        }
    }

    pub fn window(&self, now: DateTime<Utc>) -> DateWindow {
        match *self {
            Self::Today => {
                let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
                DateWindow {
                    from: Some(midnight),
                    until: Some(midnight + Duration::days(1)),
                }
            }
            Self::Week => trailing_days(now, 7),
            Self::Month => trailing_days(now, 30),
            Self::Year => trailing_days(now, 365),
            Self::Range { from, until } => DateWindow {
                from: Some(from),
                until: Some(until),
            },
            Self::All => DateWindow::default(),
        }
    }
}

fn trailing_days(now: DateTime<Utc>, days: i64) -> DateWindow {
    DateWindow {
        from: Some(now - Duration::days(days)),
        until: None,
    }
}

fn parse_start_bound(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

/// The end bound is inclusive for the caller: a date covers the whole day and
/// a timestamp covers its own microsecond, the finest unit PostgreSQL stores.
fn parse_end_bound(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc) + Duration::microseconds(1));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc() + Duration::days(1))
}

/// Missing or non-positive limits become the default; large ones are clamped.
pub fn resolve_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(limit) if limit > 0 => limit.min(MAX_LIST_LIMIT),
        _ => DEFAULT_LIST_LIMIT,
    }
}
