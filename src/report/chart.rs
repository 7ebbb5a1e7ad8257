use crate::core::{MonitorError, Result};
use chrono::{DateTime, Local};
use plotters::coord::Shift;
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

pub type TimePoint = (DateTime<Local>, f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Svg,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(MonitorError::UnsupportedOutput(path.display().to_string())),
        }
    }
}

/// Fails before any sampling starts if `path` cannot be rendered: unknown
/// extension, or no usable font for axis labels.
pub fn ensure_available(path: &Path) -> Result<ChartFormat> {
    let format = ChartFormat::from_path(path)?;
    let style = ("sans-serif", 12).into_font().color(&BLACK);
    let drawn_text = match format {
        ChartFormat::Png => {
            let mut buf = vec![0u8; 64 * 32 * 3];
            let root = BitMapBackend::with_buffer(&mut buf, (64, 32)).into_drawing_area();
            let drawn = root.draw_text("42%", &style, (2, 2));
            drawn.map_err(|e| e.to_string())
        }
        ChartFormat::Svg => {
            let mut out = String::new();
            let root = SVGBackend::with_string(&mut out, (64, 32)).into_drawing_area();
            let drawn = root.draw_text("42%", &style, (2, 2));
            drawn.map_err(|e| e.to_string())
        }
    };
    drawn_text.map_err(MonitorError::ChartUnavailable)?;
    Ok(format)
}

/// What to draw. An empty `threads` list gives a single-pane chart.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: String,
    pub total_label: String,
    pub total: Vec<TimePoint>,
    pub spikes: Vec<DateTime<Local>>,
    pub threads_title: String,
    pub threads: Vec<(String, Vec<TimePoint>)>,
}

impl ChartSpec {
    fn is_two_pane(&self) -> bool {
        !self.threads.is_empty()
    }
}

pub fn render(path: &Path, spec: &ChartSpec) -> Result<()> {
    if spec.total.is_empty() {
        return Err(MonitorError::Chart("no points to draw".to_string()));
    }
    let size = if spec.is_two_pane() { (1400, 1000) } else { (1200, 600) };
    match ChartFormat::from_path(path)? {
        ChartFormat::Png => draw(&BitMapBackend::new(path, size).into_drawing_area(), spec),
        ChartFormat::Svg => draw(&SVGBackend::new(path, size).into_drawing_area(), spec),
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> MonitorError {
    MonitorError::Chart(e.to_string())
}

fn time_range(points: &[TimePoint]) -> Range<DateTime<Local>> {
    let start = points.iter().map(|p| p.0).min().unwrap_or_else(Local::now);
    let mut end = points.iter().map(|p| p.0).max().unwrap_or(start);
    if end <= start {
        end = start + chrono::Duration::seconds(1);
    }
    start..end
}

fn y_ceiling<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    let max = values.copied().fold(0.0f64, f64::max);
    (max * 1.1).max(1.0)
}

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()> {
    root.fill(&WHITE).map_err(chart_err)?;
    let mut all_points: Vec<TimePoint> = spec.total.clone();
    for (_, points) in &spec.threads {
        all_points.extend_from_slice(points);
    }
    let range = time_range(&all_points);

    if spec.is_two_pane() {
        let panes = root.split_evenly((2, 1));
        draw_total(&panes[0], spec, range.clone())?;
        draw_threads(&panes[1], spec, range)?;
    } else {
        draw_total(root, spec, range)?;
    }
    root.present().map_err(chart_err)?;
    Ok(())
}

fn draw_total<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    range: Range<DateTime<Local>>,
) -> Result<()> {
    let y_max = y_ceiling(spec.total.iter().map(|p| &p.1));
    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(range, 0f64..y_max)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x| x.format("%H:%M:%S").to_string())
        .x_desc("Time")
        .y_desc("CPU Usage (%)")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(spec.spikes.iter().map(|t| {
            DashedPathElement::new(vec![(*t, 0.0), (*t, y_max)], 6, 4, RED.mix(0.6).stroke_width(1))
        }))
        .map_err(chart_err)?;
    chart
        .draw_series(
            AreaSeries::new(spec.total.iter().copied(), 0.0, BLUE.mix(0.3))
                .border_style(BLUE.stroke_width(2)),
        )
        .map_err(chart_err)?
        .label(spec.total_label.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(chart_err)?;
    Ok(())
}

fn draw_threads<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    range: Range<DateTime<Local>>,
) -> Result<()> {
    let y_max = y_ceiling(spec.threads.iter().flat_map(|(_, pts)| pts.iter().map(|p| &p.1)));
    let mut chart = ChartBuilder::on(area)
        .caption(&spec.threads_title, ("sans-serif", 18).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(range, 0f64..y_max)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x| x.format("%H:%M:%S").to_string())
        .x_desc("Time")
        .y_desc("CPU Usage (%)")
        .draw()
        .map_err(chart_err)?;

    for (i, (name, points)) in spec.threads.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(chart_err)?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 12))
        .draw()
        .map_err(chart_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ChartFormat::from_path(Path::new("a/cpu.PNG")).unwrap(), ChartFormat::Png);
        assert_eq!(ChartFormat::from_path(Path::new("cpu.svg")).unwrap(), ChartFormat::Svg);
        assert!(matches!(
            ChartFormat::from_path(Path::new("cpu.jpg")),
            Err(MonitorError::UnsupportedOutput(_))
        ));
        assert!(ChartFormat::from_path(Path::new("cpu")).is_err());
    }

    #[test]
    fn unsupported_output_fails_the_startup_check() {
        assert!(ensure_available(Path::new("out.bmpx")).is_err());
    }

    #[test]
    fn single_point_range_is_widened() {
        let t = Local::now();
        let r = time_range(&[(t, 3.0)]);
        assert!(r.end > r.start);
    }

    #[test]
    fn ceiling_has_headroom_and_floor() {
        assert!((y_ceiling([10.0, 50.0].iter()) - 55.0).abs() < 1e-9);
        assert_eq!(y_ceiling([0.0].iter()), 1.0);
    }
}
