/// Snapshot collection command handler
use anyhow::Result;
use glstats_core::{StatsError, StatsService, SystemClock};
use glstats_integrations::{GitLabError, StatisticsSource};

use super::helpers::{gitlab_client, open_store, resolve_subject};
use super::{AppContext, SubjectArgs};

pub async fn handle_collect_command(ctx: &AppContext, args: SubjectArgs) -> Result<()> {
    let client = gitlab_client(&ctx.config)?;
    let resolved = resolve_subject(ctx, args).await?;
    let subject = resolved.subject;

    let counts = client.fetch_counts(subject).await.map_err(fetch_error)?;
    log::info!(
        "{} reports {subject}: opened={} closed={} all={}",
        client.source_name(),
        counts.opened,
        counts.closed,
        counts.total
    );

    let store = open_store(ctx)?;
    let service = StatsService::new(store.as_store(), &SystemClock, ctx.offset);
    let taken_at = service.record_snapshot_now(subject, counts)?;

    if let (Some(db), Some(name)) = (store.database(), resolved.name.as_deref()) {
        db.set_subject_name(subject, name)?;
    }

    println!(
        "Recorded {subject} at {}: {} opened, {} closed, {} total",
        taken_at.to_rfc3339(),
        counts.opened,
        counts.closed,
        counts.total
    );
    Ok(())
}

/// A payload GitLab sent but we cannot read is a `Decode` error like a corrupt stored row
fn fetch_error(err: GitLabError) -> anyhow::Error {
    match err {
        GitLabError::Decode { what, message } => StatsError::Decode {
            what: what.to_string(),
            message,
        }
        .into(),
        other => other.into(),
    }
}
