//! Series Assembler: aligned, chart-ready float sequences.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chart::ChartData;
use crate::error::{Result, StatsError};
use crate::metrics::PeriodMetrics;
use crate::selector::MonthlyPoint;

pub const ENHANCED_TITLE: &str = "GitLab Issues Statistics";

pub const ENHANCED_SERIES_NAMES: [&str; 4] = [
    "Currently Open Issues",
    "Issues Opened This Period",
    "Issues Closed This Period",
    "Velocity (Net Change)",
];

pub const BASIC_SERIES_NAME: &str = "Opened issues";

/// Four metric series plus timestamps and `YYYY-MM` labels, all the same length
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnhancedSeries {
    currently_open: Vec<f64>,
    opened_during_period: Vec<f64>,
    closed_during_period: Vec<f64>,
    velocity: Vec<f64>,
    timestamps: Vec<DateTime<Utc>>,
    labels: Vec<String>,
}

impl EnhancedSeries {
    /// Build from raw sequences, deriving labels from `timestamps`.
    ///
    /// # Errors
    ///
    /// Returns `SeriesLengthMismatch` if any sequence differs in length from `currently_open`
    pub fn from_parts(
        currently_open: Vec<f64>,
        opened_during_period: Vec<f64>,
        closed_during_period: Vec<f64>,
        velocity: Vec<f64>,
        timestamps: Vec<DateTime<Utc>>,
    ) -> Result<Self> {
        let expected = currently_open.len();
        check_len("opened_during_period", expected, opened_during_period.len())?;
        check_len("closed_during_period", expected, closed_during_period.len())?;
        check_len("velocity", expected, velocity.len())?;
        check_len("timestamps", expected, timestamps.len())?;

        let labels = timestamps.iter().map(month_label).collect();
        Ok(Self {
            currently_open,
            opened_during_period,
            closed_during_period,
            velocity,
            timestamps,
            labels,
        })
    }

    #[must_use]
    pub fn currently_open(&self) -> &[f64] {
        &self.currently_open
    }

    #[must_use]
    pub fn opened_during_period(&self) -> &[f64] {
        &self.opened_during_period
    }

    #[must_use]
    pub fn closed_during_period(&self) -> &[f64] {
        &self.closed_during_period
    }

    #[must_use]
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.currently_open.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.currently_open.is_empty()
    }

    #[must_use]
    pub fn chart_data(&self) -> ChartData {
        ChartData {
            title: Some(ENHANCED_TITLE.to_string()),
            values: vec![
                self.currently_open.clone(),
                self.opened_during_period.clone(),
                self.closed_during_period.clone(),
                self.velocity.clone(),
            ],
            labels: self.labels.clone(),
            series_names: ENHANCED_SERIES_NAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Zip period metrics into an [`EnhancedSeries`]
///
/// # Errors
///
/// Returns `SeriesLengthMismatch` if the zipped sequences end up misaligned
pub fn assemble(metrics: &[PeriodMetrics]) -> Result<EnhancedSeries> {
    let mut currently_open = Vec::with_capacity(metrics.len());
    let mut opened = Vec::with_capacity(metrics.len());
    let mut closed = Vec::with_capacity(metrics.len());
    let mut velocity = Vec::with_capacity(metrics.len());
    let mut timestamps = Vec::with_capacity(metrics.len());

    for m in metrics {
        currently_open.push(to_f64(m.currently_open));
        opened.push(to_f64(m.opened_during_period));
        closed.push(to_f64(m.closed_during_period));
        velocity.push(to_f64(m.velocity));
        timestamps.push(m.taken_at);
    }

    EnhancedSeries::from_parts(currently_open, opened, closed, velocity, timestamps)
}

/// Raw opened/closed counters of every present month
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BasicSeries {
    opened: Vec<f64>,
    closed: Vec<f64>,
    timestamps: Vec<DateTime<Utc>>,
    labels: Vec<String>,
}

impl BasicSeries {
    /// # Errors
    ///
    /// Returns `SeriesLengthMismatch` if the sequences differ in length
    pub fn from_parts(
        opened: Vec<f64>,
        closed: Vec<f64>,
        timestamps: Vec<DateTime<Utc>>,
    ) -> Result<Self> {
        check_len("closed", opened.len(), closed.len())?;
        check_len("timestamps", opened.len(), timestamps.len())?;
        let labels = timestamps.iter().map(month_label).collect();
        Ok(Self {
            opened,
            closed,
            timestamps,
            labels,
        })
    }

    /// Absent months are skipped
    ///
    /// # Errors
    ///
    /// Returns `SeriesLengthMismatch` if the sequences end up misaligned
    pub fn from_points(points: &[MonthlyPoint]) -> Result<Self> {
        let present: Vec<_> = points.iter().filter_map(|p| p.snapshot.as_ref()).collect();
        Self::from_parts(
            present.iter().map(|s| to_f64(s.counts.opened)).collect(),
            present.iter().map(|s| to_f64(s.counts.closed)).collect(),
            present.iter().map(|s| s.taken_at_utc()).collect(),
        )
    }

    #[must_use]
    pub fn opened(&self) -> &[f64] {
        &self.opened
    }

    #[must_use]
    pub fn closed(&self) -> &[f64] {
        &self.closed
    }

    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.opened.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty()
    }

    /// Only the opened series is charted
    #[must_use]
    pub fn chart_data(&self) -> ChartData {
        ChartData {
            title: None,
            values: vec![self.opened.clone()],
            labels: self.labels.clone(),
            series_names: vec![BASIC_SERIES_NAME.to_string()],
        }
    }
}

fn check_len(series: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(StatsError::SeriesLengthMismatch {
            series,
            expected,
            got,
        })
    }
}

fn month_label(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m").to_string()
}

// Counters stay far below 2^53, so the conversion is exact
#[allow(clippy::cast_precision_loss)]
fn to_f64(value: i64) -> f64 {
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::YearMonth;
    use chrono::TimeZone;

    fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn metrics(month: u32, open: i64, opened: i64, closed: i64) -> PeriodMetrics {
        PeriodMetrics {
            month: YearMonth::new(2024, month).unwrap(),
            taken_at: ts(2024, month, 28),
            currently_open: open,
            opened_during_period: opened,
            closed_during_period: closed,
            velocity: opened - closed,
        }
    }

    #[test]
    fn test_assemble_aligned() {
        let series = assemble(&[metrics(2, 27, 15, 8), metrics(3, 25, 4, 6)]).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.currently_open(), &[27.0, 25.0]);
        assert_eq!(series.opened_during_period(), &[15.0, 4.0]);
        assert_eq!(series.closed_during_period(), &[8.0, 6.0]);
        assert_eq!(series.velocity(), &[7.0, -2.0]);
        assert_eq!(series.labels(), &["2024-02".to_string(), "2024-03".to_string()]);
    }

    #[test]
    fn test_assemble_empty() {
        let series = assemble(&[]).unwrap();
        assert!(series.is_empty());
        assert!(series.labels().is_empty());
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let err = EnhancedSeries::from_parts(
            vec![1.0, 2.0],
            vec![1.0, 2.0],
            vec![1.0, 2.0],
            vec![1.0],
            vec![ts(2024, 1, 1), ts(2024, 2, 1)],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            StatsError::SeriesLengthMismatch {
                series: "velocity",
                expected: 2,
                got: 1
            }
        ));

        let err = BasicSeries::from_parts(vec![1.0], vec![1.0], vec![]).unwrap_err();
        assert!(matches!(err, StatsError::SeriesLengthMismatch { .. }));
    }

    #[test]
    fn test_labels_are_utc_months() {
        let late_january_in_utc = DateTime::parse_from_rfc3339("2024-02-01T01:00:00+02:00")
            .unwrap()
            .with_timezone(&Utc);
        let series = EnhancedSeries::from_parts(
            vec![1.0],
            vec![1.0],
            vec![1.0],
            vec![0.0],
            vec![late_january_in_utc],
        )
        .unwrap();
        assert_eq!(series.labels(), &["2024-01".to_string()]);
    }

    #[test]
    fn test_enhanced_chart_data() {
        let chart = assemble(&[metrics(2, 27, 15, 8)]).unwrap().chart_data();
        assert_eq!(chart.values.len(), 4);
        assert_eq!(chart.series_names.len(), 4);
        assert_eq!(chart.series_names[3], "Velocity (Net Change)");
        assert_eq!(chart.labels, vec!["2024-02".to_string()]);
        assert_eq!(chart.title.as_deref(), Some(ENHANCED_TITLE));
    }
}
