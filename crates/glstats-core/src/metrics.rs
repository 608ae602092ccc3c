//! Period Metrics Calculator.
//!
//! For every pair of consecutive months that both have a snapshot:
//! - `opened_during_period` is the growth of the *total* ticket count,
//!   `cur.total - prev.total`
//! - `closed_during_period` is `cur.closed - prev.closed`
//! - `velocity` is `opened_during_period - closed_during_period`
//! - `currently_open` is `cur.opened`, passed through
//!
//! Pairs with an absent side produce nothing.

use chrono::{DateTime, Utc};

use crate::month::YearMonth;
use crate::selector::MonthlyPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodMetrics {
    pub month: YearMonth,
    /// Timestamp of the snapshot representing `month`
    pub taken_at: DateTime<Utc>,
    pub currently_open: i64,
    pub opened_during_period: i64,
    pub closed_during_period: i64,
    pub velocity: i64,
}

/// Derive period metrics from month-aligned points
#[must_use]
pub fn compute(points: &[MonthlyPoint]) -> Vec<PeriodMetrics> {
    points
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].snapshot.as_ref()?;
            let cur = pair[1].snapshot.as_ref()?;

            let opened_during_period = cur.counts.total - prev.counts.total;
            let closed_during_period = cur.counts.closed - prev.counts.closed;

            Some(PeriodMetrics {
                month: pair[1].month,
                taken_at: cur.taken_at_utc(),
                currently_open: cur.counts.opened,
                opened_during_period,
                closed_during_period,
                velocity: opened_during_period - closed_during_period,
            })
        })
        .collect()
}
