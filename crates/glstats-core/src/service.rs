//! Entry points exposed to the CLI: record a snapshot, read back monthly series.

use chrono::{DateTime, Duration, FixedOffset};
use glstats_storage::{CorruptRecord, Counts, SnapshotStore, SubjectRef};

use crate::clock::Clock;
use crate::error::{Result, StatsError};
use crate::metrics;
use crate::month::{MonthRange, MonthWindow};
use crate::selector::{MonthlyPoint, MonthlySelector};
use crate::series::{self, BasicSeries, EnhancedSeries};

/// Ties a snapshot store to the aggregation pipeline
pub struct StatsService<'a> {
    store: &'a dyn SnapshotStore,
    clock: &'a dyn Clock,
    selector: MonthlySelector,
}

impl<'a> StatsService<'a> {
    /// `offset` is the reference offset used for month boundaries
    #[must_use]
    pub fn new(store: &'a dyn SnapshotStore, clock: &'a dyn Clock, offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            selector: MonthlySelector::new(offset),
        }
    }

    /// Persist one observation of `subject`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for negative counters and `Persistence` if the store fails
    pub fn record_snapshot(
        &self,
        subject: SubjectRef,
        counts: Counts,
        taken_at: DateTime<FixedOffset>,
    ) -> Result<()> {
        if counts.opened < 0 || counts.closed < 0 || counts.total < 0 {
            return Err(StatsError::InvalidInput(format!(
                "negative counters for {subject}: {counts:?}"
            )));
        }
        if counts.total != counts.opened + counts.closed {
            log::warn!(
                "Counters of {subject} do not add up: opened={} closed={} total={}",
                counts.opened,
                counts.closed,
                counts.total
            );
        }
        self.store
            .insert_snapshot(subject, counts, taken_at)
            .map_err(store_error)
    }

    /// Record `counts` stamped with the clock's current time in the reference offset
    ///
    /// # Errors
    ///
    /// See [`StatsService::record_snapshot`]
    pub fn record_snapshot_now(
        &self,
        subject: SubjectRef,
        counts: Counts,
    ) -> Result<DateTime<FixedOffset>> {
        let taken_at = self.clock.now().with_timezone(&self.selector.offset());
        self.record_snapshot(subject, counts, taken_at)?;
        Ok(taken_at)
    }

    /// The `months_back` complete months before the current one
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `months_back` is zero or the range leaves the supported calendar
    pub fn trailing_range(&self, months_back: u32) -> Result<MonthRange> {
        if months_back == 0 {
            return Err(StatsError::InvalidInput(
                "at least one month back is needed".to_string(),
            ));
        }
        MonthRange::trailing(self.clock.now(), self.selector.offset(), months_back).ok_or_else(
            || StatsError::InvalidInput(format!("{months_back} months back is out of range")),
        )
    }

    /// One point per month of `range`, absent where no snapshot qualifies
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject is unknown or has no snapshot in the range,
    /// `Persistence` if the store fails
    pub fn monthly_points(
        &self,
        subject: SubjectRef,
        range: &MonthRange,
    ) -> Result<Vec<MonthlyPoint>> {
        let windows = self.selector.windows(range).ok_or_else(|| {
            StatsError::InvalidInput(format!(
                "months {} to {} are out of range",
                range.begin, range.end
            ))
        })?;
        let (Some(first), Some(last)) = (windows.first(), windows.last()) else {
            return Err(StatsError::InvalidInput("empty month range".to_string()));
        };

        let snapshots = self
            .store
            .query_range(subject, first.start, last.end + Duration::nanoseconds(1))
            .map_err(store_error)?;

        if snapshots.is_empty() {
            return Err(self.not_found(subject, first, last)?);
        }

        log::debug!(
            "Selecting among {} snapshots of {subject} over {} months",
            snapshots.len(),
            windows.len()
        );
        Ok(self.selector.select(&windows, &snapshots))
    }

    /// Monthly currently-open, opened, closed and velocity series for the
    /// last `months_back` complete months
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when there is nothing to aggregate, `Persistence` on
    /// storage failures, `SeriesLengthMismatch` if assembly goes wrong
    pub fn get_monthly_series(
        &self,
        subject: SubjectRef,
        months_back: u32,
    ) -> Result<EnhancedSeries> {
        let range = self.trailing_range(months_back)?;
        let points = self.monthly_points(subject, &range)?;
        let metrics = metrics::compute(&points);
        if metrics.is_empty() {
            log::info!("No two consecutive months with data for {subject}");
        }
        series::assemble(&metrics)
    }

    /// Raw opened/closed counters for each month with data
    ///
    /// # Errors
    ///
    /// Same as [`StatsService::get_monthly_series`]
    pub fn get_basic_series(&self, subject: SubjectRef, months_back: u32) -> Result<BasicSeries> {
        let range = self.trailing_range(months_back)?;
        let points = self.monthly_points(subject, &range)?;
        BasicSeries::from_points(&points)
    }

    fn not_found(
        &self,
        subject: SubjectRef,
        first: &MonthWindow,
        last: &MonthWindow,
    ) -> Result<StatsError> {
        let known = self
            .store
            .get_subject(subject)
            .map_err(store_error)?
            .is_some();
        let reason = if known {
            format!("no snapshots between {} and {}", first.month, last.month)
        } else {
            "unknown subject".to_string()
        };
        Ok(StatsError::not_found(subject, reason))
    }
}

/// Undecodable stored data is a `Decode` error, everything else a `Persistence` one
fn store_error(err: anyhow::Error) -> StatsError {
    match err.downcast_ref::<CorruptRecord>() {
        Some(corrupt) => StatsError::Decode {
            what: corrupt.what.to_string(),
            message: corrupt.message.clone(),
        },
        None => StatsError::Persistence(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::month::YearMonth;
    use chrono::{TimeZone, Utc};
    use glstats_storage::Database;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap())
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_monthly_series_end_to_end() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());
        let subject = SubjectRef::project(10);

        service
            .record_snapshot(subject, Counts::new(20, 10, 30), at("2024-01-31T08:00:00Z"))
            .unwrap();
        service
            .record_snapshot(subject, Counts::new(27, 18, 45), at("2024-02-28T08:00:00Z"))
            .unwrap();
        service
            .record_snapshot(subject, Counts::new(25, 22, 47), at("2024-03-10T08:00:00Z"))
            .unwrap();

        let series = service.get_monthly_series(subject, 6).unwrap();
        assert_eq!(series.labels(), &["2024-02".to_string(), "2024-03".to_string()]);
        assert_eq!(series.opened_during_period(), &[15.0, 2.0]);
        assert_eq!(series.closed_during_period(), &[8.0, 4.0]);
        assert_eq!(series.velocity(), &[7.0, -2.0]);
        assert_eq!(series.currently_open(), &[27.0, 25.0]);
    }

    #[test]
    fn test_snapshots_outside_range_are_ignored() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());
        let subject = SubjectRef::group(3);

        service
            .record_snapshot(subject, Counts::new(1, 0, 1), at("2023-09-30T23:59:59Z"))
            .unwrap();
        service
            .record_snapshot(subject, Counts::new(2, 0, 2), at("2023-10-01T00:00:00Z"))
            .unwrap();
        service
            .record_snapshot(subject, Counts::new(3, 0, 3), at("2024-04-01T00:00:00Z"))
            .unwrap();

        let basic = service.get_basic_series(subject, 6).unwrap();
        assert_eq!(basic.opened(), &[2.0]);
        assert_eq!(basic.labels(), &["2023-10".to_string()]);
    }

    #[test]
    fn test_unknown_subject_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());

        let err = service.get_monthly_series(SubjectRef::project(99), 6).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("unknown subject"));
    }

    #[test]
    fn test_no_snapshots_in_range_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());
        let subject = SubjectRef::project(1);
        service
            .record_snapshot(subject, Counts::new(1, 0, 1), at("2020-01-01T00:00:00Z"))
            .unwrap();

        let err = service.get_monthly_series(subject, 6).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("2023-10 and 2024-03"));
    }

    #[test]
    fn test_single_month_gives_empty_series() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());
        let subject = SubjectRef::project(1);
        service
            .record_snapshot(subject, Counts::new(1, 0, 1), at("2024-03-01T00:00:00Z"))
            .unwrap();

        assert!(service.get_monthly_series(subject, 6).unwrap().is_empty());
    }

    #[test]
    fn test_record_now_uses_clock_and_offset() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let service = StatsService::new(&db, &clock, tokyo);
        let subject = SubjectRef::project(1);

        let taken_at = service
            .record_snapshot_now(subject, Counts::new(1, 1, 2))
            .unwrap();
        assert_eq!(taken_at.to_rfc3339(), "2024-04-15T21:00:00+09:00");

        let april = YearMonth::new(2024, 4).unwrap();
        let points = service
            .monthly_points(subject, &MonthRange::new(april, april.succ().unwrap()))
            .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].snapshot.as_ref().unwrap().taken_at, taken_at);
    }

    #[test]
    fn test_negative_counts_rejected() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());

        let err = service
            .record_snapshot(
                SubjectRef::project(1),
                Counts::new(-1, 0, 0),
                at("2024-03-01T00:00:00Z"),
            )
            .unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput(_)));
    }

    #[test]
    fn test_current_month_is_excluded() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());
        let subject = SubjectRef::project(1);
        service
            .record_snapshot(subject, Counts::new(1, 0, 1), at("2024-04-02T00:00:00Z"))
            .unwrap();

        let err = service.get_basic_series(subject, 3).unwrap_err();
        assert!(err.is_not_found());

        let err = service.get_basic_series(subject, 0).unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput(_)));
    }

    #[test]
    fn test_out_of_range_months_back() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let service = StatsService::new(&db, &clock, utc());

        let err = service
            .get_monthly_series(SubjectRef::project(1), u32::MAX)
            .unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput(_)));
    }

    #[test]
    fn test_corrupted_store_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "[{\"dateExec\": 12}]").unwrap();
        let store = glstats_storage::JsonFileStore::new(path);
        let clock = clock();
        let service = StatsService::new(&store, &clock, utc());

        let err = service.get_monthly_series(SubjectRef::project(1), 6).unwrap_err();
        assert!(matches!(err, StatsError::Decode { .. }));
    }
}
