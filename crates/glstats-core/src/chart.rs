//! Chart boundary: series in, encoded buffer out.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Values, x-axis labels and legend, ready for a chart renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub title: Option<String>,
    pub values: Vec<Vec<f64>>,
    pub labels: Vec<String>,
    pub series_names: Vec<String>,
}

/// Encodes chart data into a file payload
pub trait ChartRenderer {
    /// # Errors
    ///
    /// Returns an error if the chart cannot be encoded
    fn render(&self, chart: &ChartData) -> Result<Vec<u8>>;

    /// File extension of the rendered output
    fn extension(&self) -> &'static str;
}

/// Renders chart data as pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer;

impl ChartRenderer for JsonChartRenderer {
    fn render(&self, chart: &ChartData) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(chart).context("Failed to encode chart data")
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// Render `chart` and write it to `path`, creating the parent directory.
///
/// The directory is created owner-only (0700) and the file written 0600 on Unix.
///
/// # Errors
///
/// Returns an error if rendering, directory creation or the write fails
pub fn write_chart(renderer: &dyn ChartRenderer, chart: &ChartData, path: &Path) -> Result<()> {
    let buf = renderer.render(chart)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_private_dir(parent)?;
    }

    std::fs::write(path, buf)
        .with_context(|| format!("Failed to write chart to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }

    log::info!("Chart written to {}", path.display());
    Ok(())
}

fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    #[cfg(not(unix))]
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> ChartData {
        ChartData {
            title: None,
            values: vec![vec![1.0, 2.5]],
            labels: vec!["2024-01".to_string(), "2024-02".to_string()],
            series_names: vec!["Opened issues".to_string()],
        }
    }

    #[test]
    fn test_json_renderer_round_trips() {
        let bytes = JsonChartRenderer.render(&chart()).unwrap();
        let decoded: ChartData = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, chart());
    }

    #[test]
    fn test_write_chart_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("graph.json");

        write_chart(&JsonChartRenderer, &chart(), &path).unwrap();
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
            let dir_mode = std::fs::metadata(path.parent().unwrap())
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(dir_mode & 0o777, 0o700);
        }
    }
}
