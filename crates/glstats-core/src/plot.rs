//! PNG line charts drawn with plotters.
//!
//! Text needs a TrueType font from the system. When none of the known font
//! files exists the chart is still drawn, without caption, tick labels or
//! legend.

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;
use plotters::style::register_font;
use std::sync::OnceLock;

use crate::chart::{ChartData, ChartRenderer};

const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Line colors, cycled when there are more series
const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(0x54, 0x70, 0xc6),
    RGBColor(0x91, 0xcc, 0x75),
    RGBColor(0xee, 0x66, 0x66),
    RGBColor(0xfa, 0xc8, 0x58),
];

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Renders chart data as a PNG line chart, one line per series
#[derive(Debug, Clone, Copy)]
pub struct PngChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for PngChartRenderer {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
        }
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render(&self, chart: &ChartData) -> Result<Vec<u8>> {
        let pixels = self.draw(chart, font_registered())?;
        encode_png(&pixels, self.width, self.height)
    }

    fn extension(&self) -> &'static str {
        "png"
    }
}

impl PngChartRenderer {
    /// Raw RGB pixels of the chart
    fn draw(&self, chart: &ChartData, with_text: bool) -> Result<Vec<u8>> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("Chart size must not be empty");
        }
        let len = usize::try_from(u64::from(self.width) * u64::from(self.height) * 3)
            .context("Chart size too large")?;
        let mut pixels = vec![0u8; len];

        {
            let size = (self.width, self.height);
            let root = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
            root.fill(&WHITE).map_err(drawing)?;

            let (lo, hi) = value_bounds(&chart.values);
            let x_max = chart.labels.len().saturating_sub(1).max(1);

            let mut builder = ChartBuilder::on(&root);
            builder.margin(20);
            if with_text {
                builder.x_label_area_size(40).y_label_area_size(60);
                if let Some(title) = &chart.title {
                    builder.caption(title, (FONT_FAMILY, 24));
                }
            }
            let mut ctx = builder
                .build_cartesian_2d(0..x_max, lo..hi)
                .map_err(drawing)?;

            if with_text {
                let label_of = |i: &usize| chart.labels.get(*i).cloned().unwrap_or_default();
                ctx.configure_mesh()
                    .x_labels(chart.labels.len().max(2))
                    .x_label_formatter(&label_of)
                    .label_style((FONT_FAMILY, 14))
                    .draw()
                    .map_err(drawing)?;
            }

            let names = chart.series_names.iter().map(String::as_str);
            let colors = SERIES_COLORS.iter().copied().cycle();
            for ((values, name), color) in chart.values.iter().zip(names).zip(colors) {
                let line = LineSeries::new(
                    values.iter().enumerate().map(|(i, v)| (i, *v)),
                    color.stroke_width(2),
                );
                let series = ctx.draw_series(line).map_err(drawing)?;
                if with_text {
                    series.label(name).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }

            if with_text && !chart.series_names.is_empty() {
                ctx.configure_series_labels()
                    .position(SeriesLabelPosition::UpperLeft)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .label_font((FONT_FAMILY, 14))
                    .draw()
                    .map_err(drawing)?;
            }

            root.present().map_err(drawing)?;
        }

        Ok(pixels)
    }
}

fn drawing(err: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("Failed to draw chart: {err}")
}

/// Y axis range covering every value with some headroom
fn value_bounds(values: &[Vec<f64>]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo.min(0.0) - pad, hi + pad)
}

fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().context("Failed to write PNG header")?;
        writer
            .write_image_data(pixels)
            .context("Failed to encode PNG data")?;
        writer.finish().context("Failed to finish PNG")?;
    }
    debug_assert!(out.starts_with(&PNG_SIGNATURE));
    Ok(out)
}

/// Register the first system font found, once per process
fn font_registered() -> bool {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    *REGISTERED.get_or_init(|| {
        for path in FONT_CANDIDATES {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                log::debug!("Chart font loaded from {path}");
                return true;
            }
        }
        log::warn!("No usable font found, charts are drawn without text");
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> ChartData {
        ChartData {
            title: Some("Issues".to_string()),
            values: vec![vec![27.0, 25.0, 30.0], vec![15.0, 2.0, 9.0], vec![7.0, -2.0, 4.0]],
            labels: vec![
                "2024-02".to_string(),
                "2024-03".to_string(),
                "2024-04".to_string(),
            ],
            series_names: vec![
                "Currently open".to_string(),
                "Opened".to_string(),
                "Velocity".to_string(),
            ],
        }
    }

    #[test]
    fn test_png_signature() {
        let renderer = PngChartRenderer::default();
        let bytes = renderer.render(&chart()).unwrap();
        assert!(bytes.starts_with(&PNG_SIGNATURE));
        assert_eq!(renderer.extension(), "png");
    }

    #[test]
    fn test_lines_are_drawn_without_text() {
        let renderer = PngChartRenderer {
            width: 200,
            height: 100,
        };
        let pixels = renderer.draw(&chart(), false).unwrap();
        assert_eq!(pixels.len(), 200 * 100 * 3);
        assert!(pixels.chunks(3).any(|px| px != [255, 255, 255]));

        let encoded = encode_png(&pixels, 200, 100).unwrap();
        assert!(encoded.starts_with(&PNG_SIGNATURE));
    }

    #[test]
    fn test_empty_chart_still_renders() {
        let empty = ChartData {
            title: None,
            values: vec![Vec::new()],
            labels: Vec::new(),
            series_names: vec!["Opened issues".to_string()],
        };
        let bytes = PngChartRenderer::default().render(&empty).unwrap();
        assert!(bytes.starts_with(&PNG_SIGNATURE));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let renderer = PngChartRenderer {
            width: 0,
            height: 100,
        };
        assert!(renderer.render(&chart()).is_err());
    }

    #[test]
    fn test_value_bounds() {
        assert_eq!(value_bounds(&[]), (0.0, 1.0));
        let (lo, hi) = value_bounds(&[vec![-2.0, 40.0]]);
        assert!(lo < -2.0 && hi > 40.0);
        let (lo, hi) = value_bounds(&[vec![5.0]]);
        assert!(lo <= 0.0 && hi > 5.0);
    }
}
