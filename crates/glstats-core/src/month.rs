//! Calendar months and their selection windows.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// A calendar month, `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// `month` is 1-based; returns `None` outside 1..=12
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month of the wall-clock date of `dt` in its own timezone
    #[must_use]
    pub fn of<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.month
    }

    /// Shift by a signed number of months
    #[must_use]
    pub fn checked_add_months(self, delta: i64) -> Option<Self> {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 + delta;
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
        Some(Self { year, month })
    }

    #[must_use]
    pub fn succ(self) -> Option<Self> {
        self.checked_add_months(1)
    }

    #[must_use]
    pub fn pred(self) -> Option<Self> {
        self.checked_add_months(-1)
    }

    /// First day of the month, `None` outside chrono's supported years
    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Selection window of one month: from its first to its last instant,
/// both taken as wall-clock times in a fixed reference offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub month: YearMonth,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    #[must_use]
    pub fn new(month: YearMonth, offset: FixedOffset) -> Option<Self> {
        let start = local_midnight(month.first_day()?, offset)?;
        let next_start = local_midnight(month.succ()?.first_day()?, offset)?;
        Some(Self {
            month,
            start,
            end: next_start - Duration::nanoseconds(1),
        })
    }

    /// Strictly inside the window, or exactly on either bound
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        (at > self.start && at < self.end) || at == self.start || at == self.end
    }
}

fn local_midnight(day: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Half-open range of calendar months `[begin, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub begin: YearMonth,
    pub end: YearMonth,
}

impl MonthRange {
    #[must_use]
    pub fn new(begin: YearMonth, end: YearMonth) -> Self {
        Self { begin, end }
    }

    /// The `months_back` complete months before the month containing `now`.
    ///
    /// The current, still running month is not part of the range.
    #[must_use]
    pub fn trailing(now: DateTime<Utc>, offset: FixedOffset, months_back: u32) -> Option<Self> {
        let current = YearMonth::of(&now.with_timezone(&offset));
        Some(Self {
            begin: current.checked_add_months(-i64::from(months_back))?,
            end: current,
        })
    }

    /// Months of the range in ascending order
    pub fn months(&self) -> impl Iterator<Item = YearMonth> {
        let end = self.end;
        std::iter::successors(Some(self.begin), |m| m.succ()).take_while(move |m| *m < end)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.months().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// One window per month, `None` if a month falls outside chrono's range
    #[must_use]
    pub fn windows(&self, offset: FixedOffset) -> Option<Vec<MonthWindow>> {
        self.months().map(|m| MonthWindow::new(m, offset)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_year_month_arithmetic() {
        assert_eq!(ym(2024, 1).pred(), Some(ym(2023, 12)));
        assert_eq!(ym(2023, 12).succ(), Some(ym(2024, 1)));
        assert_eq!(ym(2024, 3).checked_add_months(-14), Some(ym(2023, 1)));
        assert_eq!(ym(2024, 3).checked_add_months(22), Some(ym(2026, 1)));
        assert!(YearMonth::new(2024, 13).is_none());
        assert!(YearMonth::new(2024, 0).is_none());
        assert_eq!(ym(987, 4).to_string(), "0987-04");
    }

    #[test]
    fn test_window_bounds_utc() {
        let window = MonthWindow::new(ym(2024, 2), FixedOffset::east_opt(0).unwrap()).unwrap();
        assert_eq!(window.start.to_rfc3339(), "2024-02-01T00:00:00+00:00");
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() - Duration::nanoseconds(1)
        );
    }

    #[test]
    fn test_window_bounds_follow_reference_offset() {
        let paris = FixedOffset::east_opt(3600).unwrap();
        let window = MonthWindow::new(ym(2024, 1), paris).unwrap();
        assert_eq!(window.start.to_rfc3339(), "2023-12-31T23:00:00+00:00");
        assert!(window.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 0, 0).unwrap()));
    }

    #[test]
    fn test_window_includes_both_bounds() {
        let window = MonthWindow::new(ym(2024, 4), FixedOffset::east_opt(0).unwrap()).unwrap();
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(window.start - Duration::nanoseconds(1)));
        assert!(!window.contains(window.end + Duration::nanoseconds(1)));
    }

    #[test]
    fn test_trailing_range() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let range = MonthRange::trailing(now, FixedOffset::east_opt(0).unwrap(), 6).unwrap();
        assert_eq!(range.begin, ym(2023, 9));
        assert_eq!(range.end, ym(2024, 3));
        assert_eq!(range.len(), 6);

        let labels: Vec<String> = range.months().map(|m| m.to_string()).collect();
        assert_eq!(labels.first().map(String::as_str), Some("2023-09"));
        assert_eq!(labels.last().map(String::as_str), Some("2024-02"));
    }

    #[test]
    fn test_trailing_range_uses_local_month() {
        // Already April in UTC+2
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 23, 0, 0).unwrap();
        let range = MonthRange::trailing(now, FixedOffset::east_opt(7200).unwrap(), 1).unwrap();
        assert_eq!(range.begin, ym(2024, 3));
        assert_eq!(range.len(), 1);

        let range = MonthRange::trailing(now, FixedOffset::east_opt(7200).unwrap(), 0).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn test_empty_range() {
        let range = MonthRange::new(ym(2024, 5), ym(2024, 5));
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.windows(FixedOffset::east_opt(0).unwrap()), Some(Vec::new()));
    }
}
