/// Chart output command handler
use anyhow::Result;
use glstats_core::{
    write_chart, ChartRenderer, JsonChartRenderer, PngChartRenderer, StatsService, SystemClock,
};
use std::path::{Path, PathBuf};

use super::helpers::{open_store, resolve_subject};
use super::{AppContext, SubjectArgs};

pub async fn handle_graph_command(
    ctx: &AppContext,
    args: SubjectArgs,
    months: Option<u32>,
    basic: bool,
    json: bool,
    output: &Path,
) -> Result<()> {
    let subject = resolve_subject(ctx, args).await?.subject;
    let months_back = ctx.months_back(months);

    let store = open_store(ctx)?;
    let service = StatsService::new(store.as_store(), &SystemClock, ctx.offset);

    let chart = if basic {
        service.get_basic_series(subject, months_back)?.chart_data()
    } else {
        let series = service.get_monthly_series(subject, months_back)?;
        if series.is_empty() {
            println!("Not enough monthly data for {subject} yet; need two consecutive months.");
        }
        series.chart_data()
    };

    let renderer = renderer(json);
    let path = with_default_extension(output, renderer.as_ref());
    write_chart(renderer.as_ref(), &chart, &path)?;

    println!("Chart for {subject} written to {}", path.display());
    Ok(())
}

fn renderer(json: bool) -> Box<dyn ChartRenderer> {
    if json {
        Box::new(JsonChartRenderer)
    } else {
        Box::new(PngChartRenderer::default())
    }
}

fn with_default_extension(output: &Path, renderer: &dyn ChartRenderer) -> PathBuf {
    if output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.with_extension(renderer.extension())
    }
}
