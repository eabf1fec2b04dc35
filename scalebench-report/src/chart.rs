//! Chart Layout and Rendering
//!
//! The comparison chart is described by a plain `ChartLayout` first, then
//! drawn with `plotters`. Keeping the layout separate lets the semantic
//! contract (which series exist, where the ticks go, what is annotated) be
//! checked without a font stack.
//!
//! The output backend is picked from the file extension: `.png` renders a
//! bitmap, `.svg` a vector image.

use crate::comparison::ComparisonReport;
use plotters::coord::Shift;
use plotters::prelude::*;
use scalebench_core::{ParallelismUnit, Technology, Trial};
use scalebench_stats::speedup;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default comparison chart file name
pub const DEFAULT_CHART_FILE: &str = "master_comparison_graph.png";

/// Default image size in pixels
pub const DEFAULT_CHART_SIZE: (u32, u32) = (1200, 700);

const FONT: &str = "sans-serif";

/// Chart rendering failure
#[derive(Debug, Error)]
pub enum ChartError {
    /// Extension is neither `.png` nor `.svg`
    #[error("Unsupported chart format for {}: use .png or .svg", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Output directory could not be created
    #[error("Failed to create {}: {source}", path.display())]
    Io {
        /// Directory path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The drawing backend failed
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

/// RGB color of a chart element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

/// Fixed color per technology
pub fn technology_color(technology: Technology) -> Rgb {
    match technology {
        Technology::Baseline => Rgb(90, 90, 90),
        Technology::SharedMemory => Rgb(31, 119, 180),
        Technology::DistributedMemory => Rgb(255, 127, 14),
        Technology::Accelerator => Rgb(214, 39, 40),
    }
}

/// Horizontal dashed reference line at the baseline time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    /// Legend text
    pub label: String,
    /// Y value
    pub seconds: f64,
}

/// Connected line series of one worker-scaled technology
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesLayout {
    /// Technology plotted
    pub technology: Technology,
    /// Legend text
    pub label: String,
    /// Line and marker color
    pub color: Rgb,
    /// `(workers, seconds)` in ascending worker order
    pub points: Vec<(u32, f64)>,
}

/// Emphasized single bar for the accelerator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLayout {
    /// Axis position (synthetic)
    pub position: u32,
    /// Bar height
    pub seconds: f64,
    /// Text drawn above the bar
    pub annotation: String,
    /// Fill color
    pub color: Rgb,
}

/// Labelled x-axis tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    /// Axis position
    pub position: u32,
    /// Label text
    pub label: String,
}

/// Everything drawn on the comparison chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    /// Chart caption
    pub title: String,
    /// X-axis description
    pub x_desc: String,
    /// Y-axis description
    pub y_desc: String,
    /// Baseline reference line
    pub reference: ReferenceLine,
    /// Worker-scaled series in technology order
    pub series: Vec<SeriesLayout>,
    /// Accelerator bar, if measured
    pub accelerator: Option<BarLayout>,
    /// X-axis ticks in ascending position
    pub ticks: Vec<Tick>,
    /// Upper bound of the x-axis
    pub x_max: f64,
    /// Upper bound of the y-axis
    pub y_max: f64,
}

impl ChartLayout {
    /// Lay out a built comparison report
    pub fn from_report(report: &ComparisonReport, title: impl Into<String>) -> Self {
        let mut label = format!(
            "{} Baseline ({:.2}s)",
            report.baseline_label, report.baseline.seconds
        );
        if report.baseline.is_fallback() {
            label.push_str(" (fallback)");
        }
        let reference = ReferenceLine {
            label,
            seconds: report.baseline.seconds,
        };

        let series: Vec<SeriesLayout> = [Technology::SharedMemory, Technology::DistributedMemory]
            .into_iter()
            .filter_map(|technology| {
                let points: Vec<(u32, f64)> = report
                    .entries_for(technology)
                    .filter_map(|e| e.parallelism_unit.workers().map(|w| (w, e.elapsed_seconds)))
                    .collect();
                let label = report.entries_for(technology).next()?.label.clone();
                Some(SeriesLayout {
                    technology,
                    label,
                    color: technology_color(technology),
                    points,
                })
            })
            .collect();

        let accelerator = report
            .entries_for(Technology::Accelerator)
            .find_map(|e| match e.parallelism_unit {
                ParallelismUnit::Placeholder(position) => Some(BarLayout {
                    position,
                    seconds: e.elapsed_seconds,
                    annotation: format!("{} / {:.2}s", e.label, e.elapsed_seconds),
                    color: technology_color(Technology::Accelerator),
                }),
                ParallelismUnit::Workers(_) => None,
            });

        let mut ticks: Vec<Tick> = report
            .entries
            .iter()
            .filter_map(|e| e.parallelism_unit.workers())
            .map(|w| Tick {
                position: w,
                label: w.to_string(),
            })
            .collect();
        if let Some(bar) = &accelerator {
            ticks.push(Tick {
                position: bar.position,
                label: report.accelerator_label.clone(),
            });
        }
        ticks.sort_by_key(|t| t.position);
        ticks.dedup_by_key(|t| t.position);

        let x_max = ticks.last().map(|t| t.position).unwrap_or(1) as f64 + 1.0;
        let y_top = report
            .entries
            .iter()
            .map(|e| e.elapsed_seconds)
            .fold(report.baseline.seconds, f64::max);
        let y_max = if y_top > 0.0 { y_top * 1.15 } else { 1.0 };

        Self {
            title: title.into(),
            x_desc: "Threads / Processes".to_string(),
            y_desc: "Execution Time (s)".to_string(),
            reference,
            series,
            accelerator,
            ticks,
            x_max,
            y_max,
        }
    }
}

/// Output backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    /// Raster image
    Png,
    /// Vector image
    Svg,
}

impl ChartFormat {
    /// Format implied by the file extension
    pub fn from_path(path: &Path) -> Result<Self, ChartError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => Ok(ChartFormat::Png),
            Some("svg") => Ok(ChartFormat::Svg),
            _ => Err(ChartError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn prepare(path: &Path) -> Result<ChartFormat, ChartError> {
    let format = ChartFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ChartError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(format)
}

fn render_error<E>(err: DrawingAreaErrorKind<E>) -> ChartError
where
    E: std::error::Error + Send + Sync,
{
    ChartError::Render(err.to_string())
}

/// Draw the comparison chart to `path`
pub fn render_chart(layout: &ChartLayout, path: &Path, size: (u32, u32)) -> Result<(), ChartError> {
    match prepare(path)? {
        ChartFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_comparison(&root, layout).map_err(render_error)?;
        }
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_comparison(&root, layout).map_err(render_error)?;
        }
    }
    tracing::info!("Chart written to {}", path.display());
    Ok(())
}

fn tick_label(ticks: &[Tick], x: f64) -> String {
    if (x - x.round()).abs() > 1e-6 {
        return String::new();
    }
    ticks
        .iter()
        .find(|t| t.position as f64 == x.round())
        .map(|t| t.label.clone())
        .unwrap_or_default()
}

/// Dash segments along `y` from `x0` to `x1`
fn dashes(x0: f64, x1: f64, y: f64) -> Vec<[(f64, f64); 2]> {
    const DASH: f64 = 0.3;
    const STEP: f64 = 0.5;
    let mut segments = Vec::new();
    let mut x = x0;
    while x < x1 {
        segments.push([(x, y), ((x + DASH).min(x1), y)]);
        x += STEP;
    }
    segments
}

fn draw_comparison<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&layout.title, (FONT, 26))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..layout.x_max, 0f64..layout.y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(layout.x_max.ceil() as usize + 2)
        .x_label_formatter(&|x: &f64| tick_label(&layout.ticks, *x))
        .x_desc(layout.x_desc.as_str())
        .y_desc(layout.y_desc.as_str())
        .draw()?;

    let grey = technology_color(Technology::Baseline).to_plotters();
    let reference_style = grey.stroke_width(2);
    chart
        .draw_series(
            dashes(0.0, layout.x_max, layout.reference.seconds)
                .into_iter()
                .map(|segment| PathElement::new(segment.to_vec(), reference_style)),
        )?
        .label(layout.reference.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], reference_style));

    for series in &layout.series {
        let color = series.color.to_plotters();
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|&(w, t)| (w as f64, t))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(3)))?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 5, color.filled())),
        )?;
    }

    if let Some(bar) = &layout.accelerator {
        let color = bar.color.to_plotters();
        let x = bar.position as f64;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.4, 0.0), (x + 0.4, bar.seconds)],
                color.mix(0.85).filled(),
            )))?
            .label(bar.annotation.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
        chart.draw_series(std::iter::once(Text::new(
            bar.annotation.clone(),
            (x - 0.8, bar.seconds + layout.y_max * 0.03),
            (FONT, 15).into_font(),
        )))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font((FONT, 15))
        .draw()?;

    root.present()
}

/// Two-panel chart (time and speedup) of a single sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingChart {
    /// Chart caption
    pub title: String,
    /// X-axis description
    pub x_desc: String,
    /// Panel color
    pub color: Rgb,
    /// `(level, seconds)`
    pub times: Vec<(u32, f64)>,
    /// `(level, speedup)`; levels with undefined speedup are omitted
    pub speedups: Vec<(u32, f64)>,
}

impl ScalingChart {
    /// Lay out a sweep's successful trials against `baseline_seconds`
    pub fn from_trials(
        technology: Technology,
        label: &str,
        trials: &[Trial],
        baseline_seconds: f64,
    ) -> Self {
        let x_desc = match technology {
            Technology::Baseline => "Run",
            Technology::SharedMemory => "Threads",
            Technology::DistributedMemory => "Processes",
            Technology::Accelerator => "Target",
        };
        Self {
            title: format!("{} Performance", label),
            x_desc: x_desc.to_string(),
            color: technology_color(technology),
            times: trials.iter().map(|t| (t.level, t.elapsed_seconds)).collect(),
            speedups: trials
                .iter()
                .filter_map(|t| speedup(baseline_seconds, t.elapsed_seconds).map(|s| (t.level, s)))
                .collect(),
        }
    }
}

/// Draw a scaling chart to `path`
pub fn render_scaling_chart(
    chart: &ScalingChart,
    path: &Path,
    size: (u32, u32),
) -> Result<(), ChartError> {
    match prepare(path)? {
        ChartFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_scaling(&root, chart).map_err(render_error)?;
        }
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_scaling(&root, chart).map_err(render_error)?;
        }
    }
    tracing::info!("Scaling chart written to {}", path.display());
    Ok(())
}

fn draw_scaling<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ScalingChart,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let root = root.titled(&chart.title, (FONT, 26))?;
    let panels = root.split_evenly((1, 2));

    draw_panel(
        &panels[0],
        chart,
        "Execution Time",
        "Time (s)",
        &chart.times,
        |v| format!("{:.2}s", v),
    )?;
    draw_panel(
        &panels[1],
        chart,
        "Speedup",
        "Speedup (x)",
        &chart.speedups,
        |v| format!("{:.2}x", v),
    )?;

    root.present()
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    chart: &ScalingChart,
    caption: &str,
    y_desc: &str,
    points: &[(u32, f64)],
    annotate: fn(f64) -> String,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(1) as f64 + 1.0;
    let y_top = points.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_max = if y_top > 0.0 { y_top * 1.2 } else { 1.0 };
    let ticks: Vec<Tick> = points
        .iter()
        .map(|&(level, _)| Tick {
            position: level,
            label: level.to_string(),
        })
        .collect();

    let mut ctx = ChartBuilder::on(area)
        .caption(caption, (FONT, 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(x_max.ceil() as usize + 2)
        .x_label_formatter(&|x: &f64| tick_label(&ticks, *x))
        .x_desc(chart.x_desc.as_str())
        .y_desc(y_desc)
        .draw()?;

    let color = chart.color.to_plotters();
    let coords: Vec<(f64, f64)> = points.iter().map(|&(l, v)| (l as f64, v)).collect();
    ctx.draw_series(LineSeries::new(coords.iter().copied(), color.stroke_width(2)))?;
    ctx.draw_series(coords.iter().map(|&p| Circle::new(p, 4, color.filled())))?;
    ctx.draw_series(coords.iter().map(|&(x, y)| {
        Text::new(annotate(y), (x, y + y_max * 0.03), (FONT, 13).into_font())
    }))?;

    Ok(())
}
