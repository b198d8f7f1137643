//! Local calendar days and month/quarter periods

use crate::store::DocumentQuery;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// One local calendar day
///
/// Source rows are selected over `[start, end)`, the instants of local
/// midnight and the next local midnight. The summary itself is keyed by
/// the local date at 00:00 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDay {
    pub date: NaiveDate,
    pub key: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LocalDay {
    pub fn new(tz: Tz, date: NaiveDate) -> Self {
        let next = date.succ_opt().unwrap_or(date);
        Self {
            date,
            key: date_key(date),
            start: local_midnight(tz, date),
            end: local_midnight(tz, next),
        }
    }
}

/// The date at 00:00 UTC
pub fn date_key(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// First valid local instant of `date` in `tz`
///
/// Zones that skip midnight for DST start the day at the first hour that exists.
pub fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..24)
        .find_map(|h| tz.from_local_datetime(&(midnight + Duration::hours(h))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Every local day from `first` through `last`, ascending
pub fn days_between(tz: Tz, first: NaiveDate, last: NaiveDate) -> Vec<LocalDay> {
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| LocalDay::new(tz, d))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    Month,
    Quarter,
}

impl PeriodKind {
    pub fn months(self) -> u32 {
        match self {
            PeriodKind::Month => 1,
            PeriodKind::Quarter => 3,
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKind::Month => write!(f, "monthly"),
            PeriodKind::Quarter => write!(f, "quarterly"),
        }
    }
}

/// A month (index 1-12) or quarter (index 1-4) of a year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodKey {
    pub kind: PeriodKind,
    pub index: u32,
    pub year: i32,
}

impl PeriodKey {
    pub fn containing(kind: PeriodKind, date: NaiveDate) -> Self {
        let index = (date.month() - 1) / kind.months() + 1;
        Self {
            kind,
            index,
            year: date.year(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        let month = (self.index - 1) * self.kind.months() + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Self {
        let per_year = 12 / self.kind.months();
        if self.index == per_year {
            Self {
                kind: self.kind,
                index: 1,
                year: self.year + 1,
            }
        } else {
            Self {
                kind: self.kind,
                index: self.index + 1,
                year: self.year,
            }
        }
    }

    /// Daily keys covered by the period: `[first day, next period's first day)` at 00:00 UTC
    pub fn daily_range(&self) -> DocumentQuery {
        DocumentQuery::range(date_key(self.first_day()), date_key(self.next().first_day()))
    }

    pub fn field_name(&self) -> &'static str {
        match self.kind {
            PeriodKind::Month => "month",
            PeriodKind::Quarter => "quarter",
        }
    }

    /// Identity of the stored summary document
    pub fn identity(&self) -> DocumentQuery {
        DocumentQuery::all()
            .with(self.field_name(), self.index.to_string())
            .with("year", self.year.to_string())
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PeriodKind::Month => write!(f, "{}-{:02}", self.year, self.index),
            PeriodKind::Quarter => write!(f, "{}-Q{}", self.year, self.index),
        }
    }
}

/// Periods from the one containing `first` through the one containing `last`
pub fn periods_between(kind: PeriodKind, first: NaiveDate, last: NaiveDate) -> Vec<PeriodKey> {
    let end = PeriodKey::containing(kind, last);
    let mut current = PeriodKey::containing(kind, first);
    let mut periods = Vec::new();
    while (current.year, current.index) <= (end.year, end.index) {
        periods.push(current);
        current = current.next();
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_la_paz_day_bounds() {
        // La Paz is UTC-4 year round
        let day = LocalDay::new(chrono_tz::America::La_Paz, date(2024, 3, 14));
        assert_eq!(day.key, Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(day.start, Utc.with_ymd_and_hms(2024, 3, 14, 4, 0, 0).unwrap());
        assert_eq!(day.end, Utc.with_ymd_and_hms(2024, 3, 15, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_days_between_inclusive() {
        let days = days_between(chrono_tz::UTC, date(2024, 2, 27), date(2024, 3, 1));
        assert_eq!(days.len(), 4);
        assert_eq!(days[2].date, date(2024, 2, 29));
        assert!(days_between(chrono_tz::UTC, date(2024, 3, 2), date(2024, 3, 1)).is_empty());
    }

    #[test]
    fn test_period_iteration() {
        let quarters = periods_between(PeriodKind::Quarter, date(2022, 1, 1), date(2023, 5, 20));
        assert_eq!(quarters.len(), 6);
        assert_eq!(quarters[5].to_string(), "2023-Q2");
        assert_eq!(quarters[5].first_day(), date(2023, 4, 1));

        let months = periods_between(PeriodKind::Month, date(2022, 11, 15), date(2023, 2, 1));
        let labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2022-11", "2022-12", "2023-01", "2023-02"]);
    }

    #[test]
    fn test_period_identity_and_range() {
        let q4 = PeriodKey::containing(PeriodKind::Quarter, date(2023, 11, 3));
        assert_eq!(q4.index, 4);
        assert_eq!(q4.next().first_day(), date(2024, 1, 1));
        assert_eq!(
            q4.identity(),
            DocumentQuery::all().with("quarter", "4").with("year", "2023")
        );
        assert_eq!(
            q4.daily_range(),
            DocumentQuery::range(date_key(date(2023, 10, 1)), date_key(date(2024, 1, 1)))
        );
    }
}
