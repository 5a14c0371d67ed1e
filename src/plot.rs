use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::{
    error::{Result, SurvError},
    kaplan_meier::SurvivalCurve,
    stats::{BoxStats, ViolinStats, VIOLIN_POINTS},
};

/// tab10, one color per curve
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const FONT: &str = "sans-serif";
const MEDIAN_COLOR: RGBColor = RGBColor(255, 127, 14);
const HALF_WIDTH: f64 = 0.25; // half a box/violin, in category units
const CAP_WIDTH: f64 = 0.1;

/// what goes on a survival chart besides the curves
#[derive(Debug, Clone)]
pub struct SurvivalPlotOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub show_ci: bool,       // shaded confidence band per curve
    pub show_censors: bool,  // cross at each censoring
    pub size: (u32, u32),
}

impl Default for SurvivalPlotOptions {
    fn default() -> Self {
        Self {
            title: "Kaplan-Meier estimate".to_string(),
            x_label: "timeline".to_string(),
            y_label: "survival probability".to_string(),
            show_ci: true,
            show_censors: false,
            size: (800, 600),
        }
    }
}

/// draw one or more survival curves on shared axes into an svg file
pub fn plot_survival(curves: &[SurvivalCurve], options: &SurvivalPlotOptions, path: &Path) -> Result<()> {
    if curves.is_empty() {
        return Err(SurvError::invalid_dimensions("no curves to plot"));
    }

    let root = SVGBackend::new(path, options.size).into_drawing_area();
    draw_survival(&root, curves, options)?;
    root.present().map_err(SurvError::render)?;

    log::info!("wrote {}", path.display());
    Ok(())
}

fn draw_survival<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    curves: &[SurvivalCurve],
    options: &SurvivalPlotOptions,
) -> Result<()> {
    area.fill(&WHITE).map_err(SurvError::render)?;

    let max_time = curves.iter().map(SurvivalCurve::max_time).fold(0.0, f64::max);
    let x_max = if max_time > 0.0 { max_time * 1.05 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(&options.title, (FONT, 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..x_max, 0f64..1.05f64)
        .map_err(SurvError::render)?;

    chart
        .configure_mesh()
        .x_desc(options.x_label.as_str())
        .y_desc(options.y_label.as_str())
        .draw()
        .map_err(SurvError::render)?;

    for (i, curve) in curves.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];

        if options.show_ci {
            chart
                .draw_series(std::iter::once(Polygon::new(
                    curve.band_points(),
                    color.mix(0.2).filled(),
                )))
                .map_err(SurvError::render)?;
        }

        chart
            .draw_series(LineSeries::new(curve.step_points(), color.stroke_width(2)))
            .map_err(SurvError::render)?
            .label(curve.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        if options.show_censors {
            chart
                .draw_series(
                    curve
                        .censor_points()
                        .into_iter()
                        .map(|p| Cross::new(p, 4, color.stroke_width(1))),
                )
                .map_err(SurvError::render)?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(SurvError::render)?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Box,
    Violin,
}

/// which axis carries the categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,    // categories along x
    Horizontal,  // categories along y
}

/// one subplot: a box or violin per named series
#[derive(Debug, Clone)]
pub struct DistributionPanel {
    pub title: String,
    pub kind: PanelKind,
    pub orientation: Orientation,
    pub series: Vec<(String, Vec<f64>)>,
    pub category_label: String,
    pub value_label: String,
}

impl DistributionPanel {
    pub fn new(title: impl Into<String>, kind: PanelKind, orientation: Orientation) -> Self {
        Self {
            title: title.into(),
            kind,
            orientation,
            series: Vec::new(),
            category_label: String::new(),
            value_label: String::new(),
        }
    }

    pub fn with_series(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.series.push((name.into(), values));
        self
    }

    pub fn with_axis_labels(mut self, category: impl Into<String>, value: impl Into<String>) -> Self {
        self.category_label = category.into();
        self.value_label = value.into();
        self
    }
}

/// summary behind one box or violin
enum Shape {
    Box(BoxStats),
    Violin(ViolinStats),
}

impl Shape {
    fn compute(kind: PanelKind, values: &[f64]) -> Result<Self> {
        Ok(match kind {
            PanelKind::Box => Shape::Box(BoxStats::from_data(values)?),
            PanelKind::Violin => Shape::Violin(ViolinStats::from_data(values, VIOLIN_POINTS)?),
        })
    }

    /// (lowest, highest) value the shape reaches
    fn extent(&self) -> (f64, f64) {
        match self {
            Shape::Box(s) => s.outliers.iter().fold((s.whisker_low, s.whisker_high), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            }),
            Shape::Violin(v) => (v.min, v.max),
        }
    }
}

/// lay panels out two per row under a shared title, write svg
pub fn plot_distributions(
    panels: &[DistributionPanel],
    title: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    if panels.is_empty() {
        return Err(SurvError::invalid_dimensions("no panels to plot"));
    }

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(SurvError::render)?;
    let body = root.titled(title, (FONT, 26)).map_err(SurvError::render)?;

    let cols = panels.len().min(2);
    let rows = (panels.len() + cols - 1) / cols;
    let cells = body.split_evenly((rows, cols));

    for (panel, cell) in panels.iter().zip(cells.iter()) {
        draw_panel(cell, panel)?;
    }

    root.present().map_err(SurvError::render)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &DistributionPanel) -> Result<()> {
    let n = panel.series.len();
    if n == 0 {
        return Err(SurvError::invalid_dimensions(format!("panel '{}' has no series", panel.title)));
    }

    let shapes = panel
        .series
        .iter()
        .map(|(_, values)| Shape::compute(panel.kind, values))
        .collect::<Result<Vec<_>>>()?;

    let (lo, hi) = shapes
        .iter()
        .map(Shape::extent)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), (lo, hi)| (a.min(lo), b.max(hi)));
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    let values = (lo - pad)..(hi + pad);
    let categories = 0.5..(n as f64 + 0.5);

    let orientation = panel.orientation;
    let (x_range, y_range) = match orientation {
        Orientation::Vertical => (categories, values),
        Orientation::Horizontal => (values, categories),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, y_range)
        .map_err(SurvError::render)?;

    let names: Vec<&str> = panel.series.iter().map(|(name, _)| name.as_str()).collect();
    let category_fmt = |v: &f64| category_name(&names, *v);

    let mut mesh = chart.configure_mesh();
    match orientation {
        Orientation::Vertical => {
            mesh.x_desc(panel.category_label.as_str())
                .y_desc(panel.value_label.as_str())
                .x_labels(2 * n + 1)
                .x_label_formatter(&category_fmt)
                .disable_x_mesh();
        }
        Orientation::Horizontal => {
            mesh.x_desc(panel.value_label.as_str())
                .y_desc(panel.category_label.as_str())
                .y_labels(2 * n + 1)
                .y_label_formatter(&category_fmt)
                .disable_y_mesh();
        }
    }
    mesh.draw().map_err(SurvError::render)?;

    // (category position, value) -> chart coordinate
    let at = move |pos: f64, value: f64| match orientation {
        Orientation::Vertical => (pos, value),
        Orientation::Horizontal => (value, pos),
    };

    for (i, shape) in shapes.iter().enumerate() {
        let pos = (i + 1) as f64;
        match shape {
            Shape::Box(s) => {
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        rect_corners(at(pos - HALF_WIDTH, s.q1), at(pos + HALF_WIDTH, s.q3)),
                        BLACK.stroke_width(1),
                    )))
                    .map_err(SurvError::render)?;

                let lines = vec![
                    vec![at(pos, s.q1), at(pos, s.whisker_low)],
                    vec![at(pos, s.q3), at(pos, s.whisker_high)],
                    vec![at(pos - CAP_WIDTH, s.whisker_low), at(pos + CAP_WIDTH, s.whisker_low)],
                    vec![at(pos - CAP_WIDTH, s.whisker_high), at(pos + CAP_WIDTH, s.whisker_high)],
                ];
                chart
                    .draw_series(lines.into_iter().map(|line| PathElement::new(line, BLACK.stroke_width(1))))
                    .map_err(SurvError::render)?;

                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![at(pos - HALF_WIDTH, s.median), at(pos + HALF_WIDTH, s.median)],
                        MEDIAN_COLOR.stroke_width(2),
                    )))
                    .map_err(SurvError::render)?;

                chart
                    .draw_series(s.outliers.iter().map(|&v| Circle::new(at(pos, v), 3, BLACK.stroke_width(1))))
                    .map_err(SurvError::render)?;
            }
            Shape::Violin(v) => {
                let color = PALETTE[0];
                let peak = v.max_density();
                let scale = if peak > 0.0 { HALF_WIDTH / peak } else { 0.0 };

                let mut outline: Vec<(f64, f64)> = v
                    .coords
                    .iter()
                    .zip(v.density.iter())
                    .map(|(&c, &d)| at(pos + d * scale, c))
                    .collect();
                outline.extend(
                    v.coords
                        .iter()
                        .zip(v.density.iter())
                        .rev()
                        .map(|(&c, &d)| at(pos - d * scale, c)),
                );

                chart
                    .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.3).filled())))
                    .map_err(SurvError::render)?;

                // extrema bars + the line joining them
                let lines = vec![
                    vec![at(pos, v.min), at(pos, v.max)],
                    vec![at(pos - CAP_WIDTH, v.min), at(pos + CAP_WIDTH, v.min)],
                    vec![at(pos - CAP_WIDTH, v.max), at(pos + CAP_WIDTH, v.max)],
                ];
                chart
                    .draw_series(lines.into_iter().map(|line| PathElement::new(line, color.stroke_width(1))))
                    .map_err(SurvError::render)?;
            }
        }
    }

    Ok(())
}

/// tick label for a category axis - the series name at integer positions
fn category_name(names: &[&str], v: f64) -> String {
    let rounded = v.round();
    if (v - rounded).abs() > 1e-6 || rounded < 1.0 {
        return String::new();
    }
    names
        .get(rounded as usize - 1)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// normalise two opposite corners to (left, top), (right, bottom)
fn rect_corners(a: (f64, f64), b: (f64, f64)) -> [(f64, f64); 2] {
    [(a.0.min(b.0), a.1.max(b.1)), (a.0.max(b.0), a.1.min(b.1))]
}
