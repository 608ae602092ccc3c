/// Table output command handlers
use anyhow::Result;
use glstats_core::{EnhancedSeries, StatsService, SystemClock};
use glstats_storage::SubjectRef;
use tabled::{Table, Tabled};

use super::helpers::{open_database, open_store, resolve_subject};
use super::{AppContext, SubjectArgs};

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Currently open")]
    currently_open: f64,
    #[tabled(rename = "Opened")]
    opened: f64,
    #[tabled(rename = "Closed")]
    closed: f64,
    #[tabled(rename = "Velocity")]
    velocity: f64,
}

#[derive(Tabled)]
struct SubjectRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Snapshots")]
    snapshots: usize,
}

fn month_rows(series: &EnhancedSeries) -> Vec<MonthRow> {
    (0..series.len())
        .map(|i| MonthRow {
            month: series.labels()[i].clone(),
            currently_open: series.currently_open()[i],
            opened: series.opened_during_period()[i],
            closed: series.closed_during_period()[i],
            velocity: series.velocity()[i],
        })
        .collect()
}

pub async fn handle_show_command(
    ctx: &AppContext,
    args: SubjectArgs,
    months: Option<u32>,
) -> Result<()> {
    let subject = resolve_subject(ctx, args).await?.subject;
    let store = open_store(ctx)?;
    let service = StatsService::new(store.as_store(), &SystemClock, ctx.offset);

    let series = service.get_monthly_series(subject, ctx.months_back(months))?;
    if series.is_empty() {
        println!("Not enough monthly data for {subject} yet; need two consecutive months.");
        return Ok(());
    }

    println!("\nIssue statistics for {subject}");
    println!("{}", Table::new(month_rows(&series)));
    Ok(())
}

pub fn handle_subjects_command(ctx: &AppContext) -> Result<()> {
    if ctx.json_store.is_some() {
        anyhow::bail!("Listing subjects needs the SQLite database");
    }
    let db = open_database(&ctx.db_path)?;
    let subjects = db.get_all_subjects()?;

    if subjects.is_empty() {
        println!("No snapshots recorded yet.");
        println!("Run `gitlab-stats collect` inside a GitLab clone, or pass -p/-g.");
        return Ok(());
    }

    let rows = subjects
        .into_iter()
        .map(|s| {
            let subject = SubjectRef {
                id: s.id,
                kind: s.kind,
            };
            Ok(SubjectRow {
                kind: s.kind.to_string(),
                id: s.id,
                name: s.name,
                snapshots: db.count_snapshots(subject)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{}", Table::new(rows));
    Ok(())
}
