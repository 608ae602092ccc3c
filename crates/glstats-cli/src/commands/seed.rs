/// Test data generator command handler
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use glstats_core::{Clock, MonthWindow, StatsService, SystemClock};
use glstats_storage::Counts;
use rand::Rng;

use super::helpers::open_store;
use super::{AppContext, SubjectArgs};

/// Upper bound of issues created in one month
const MAX_NEW_PER_MONTH: i64 = 20;

pub fn handle_seed_command(ctx: &AppContext, args: SubjectArgs, months: Option<u32>) -> Result<()> {
    let subject = args
        .subject()
        .context("Seeding needs an explicit subject (-p or -g)")?;

    let store = open_store(ctx)?;
    let clock = SystemClock;
    let service = StatsService::new(store.as_store(), &clock, ctx.offset);

    let range = service.trailing_range(ctx.months_back(months))?;
    let windows = range
        .windows(ctx.offset)
        .context("Month range is out of bounds")?;

    let mut rng = rand::thread_rng();
    let generated = generate(&mut rng, &windows, clock.now());
    for (counts, taken_at) in &generated {
        service.record_snapshot(subject, *counts, taken_at.with_timezone(&ctx.offset))?;
    }

    println!(
        "Seeded {} snapshots for {subject} over {} months",
        generated.len(),
        windows.len()
    );
    Ok(())
}

/// One snapshot per month at a random instant, never later than `now`.
///
/// Counters evolve like a real tracker: the total never shrinks and closed
/// issues only come from open ones.
fn generate<R: Rng>(
    rng: &mut R,
    windows: &[MonthWindow],
    now: DateTime<Utc>,
) -> Vec<(Counts, DateTime<Utc>)> {
    let mut opened = 0i64;
    let mut closed = 0i64;

    windows
        .iter()
        .filter(|w| w.start <= now)
        .map(|w| {
            let created = rng.gen_range(0..=MAX_NEW_PER_MONTH);
            let resolved = rng.gen_range(0..=opened + created);
            opened += created - resolved;
            closed += resolved;

            let span = (w.end.min(now) - w.start).num_seconds();
            let taken_at = w.start + Duration::seconds(rng.gen_range(0..=span));
            (Counts::new(opened, closed, opened + closed), taken_at)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use glstats_core::{MonthRange, YearMonth};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_counters_are_plausible() {
        let range = MonthRange::new(
            YearMonth::new(2023, 10).unwrap(),
            YearMonth::new(2024, 4).unwrap(),
        );
        let windows = range.windows(FixedOffset::east_opt(0).unwrap()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let generated = generate(&mut rng, &windows, now);
        assert_eq!(generated.len(), 6);

        let mut previous = Counts::default();
        for ((counts, taken_at), window) in generated.iter().zip(&windows) {
            assert!(window.contains(*taken_at));
            assert!(*taken_at <= now);
            assert_eq!(counts.total, counts.opened + counts.closed);
            assert!(counts.opened >= 0);
            assert!(counts.total >= previous.total);
            assert!(counts.closed >= previous.closed);
            previous = *counts;
        }
    }

    #[test]
    fn test_future_months_are_skipped() {
        let range = MonthRange::new(
            YearMonth::new(2024, 1).unwrap(),
            YearMonth::new(2024, 3).unwrap(),
        );
        let windows = range.windows(FixedOffset::east_opt(0).unwrap()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();

        let generated = generate(&mut StdRng::seed_from_u64(1), &windows, now);
        assert_eq!(generated.len(), 1);
    }
}
