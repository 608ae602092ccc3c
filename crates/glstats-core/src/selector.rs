//! Monthly Selector: one representative snapshot per calendar month.

use chrono::FixedOffset;
use glstats_storage::Snapshot;

use crate::month::{MonthRange, MonthWindow, YearMonth};

/// Snapshot chosen to represent a month, or `None` when the month has no data.
///
/// Absent months are never zero-count months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    pub snapshot: Option<Snapshot>,
}

impl MonthlyPoint {
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Picks, for each month window, the last qualifying snapshot in chronological order
#[derive(Debug, Clone, Copy)]
pub struct MonthlySelector {
    offset: FixedOffset,
}

impl MonthlySelector {
    /// Month windows are computed as wall-clock times in `offset`
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    #[must_use]
    pub fn windows(&self, range: &MonthRange) -> Option<Vec<MonthWindow>> {
        range.windows(self.offset)
    }

    /// Select one point per window.
    ///
    /// `snapshots` may be in any order; they are scanned in ascending UTC
    /// timestamp order and each qualifying one replaces the previous choice.
    #[must_use]
    pub fn select(&self, windows: &[MonthWindow], snapshots: &[Snapshot]) -> Vec<MonthlyPoint> {
        let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
        ordered.sort_by_key(|s| s.taken_at_utc());

        windows
            .iter()
            .map(|window| {
                let mut chosen = None;
                for snapshot in &ordered {
                    if window.contains(snapshot.taken_at_utc()) {
                        chosen = Some(*snapshot);
                    }
                }
                if chosen.is_none() {
                    log::debug!("No snapshot for month {}", window.month);
                }
                MonthlyPoint {
                    month: window.month,
                    snapshot: chosen.cloned(),
                }
            })
            .collect()
    }
}
