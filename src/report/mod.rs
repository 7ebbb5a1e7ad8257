//! Charts, CSV and the console summary for a finished run.

pub mod chart;
pub mod export;
pub mod spike;
pub mod stats;

pub use chart::{ensure_available, ChartFormat, ChartSpec};
pub use spike::SpikePolicy;
pub use stats::{rank_top, summarize, RankedEntity, Summary};

use crate::monitor::{Point, Recording};
use crate::ui::ConsoleUi;
use anyhow::Context;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub output: PathBuf,
    pub top_k: usize,
    pub spike: SpikePolicy,
    pub app_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub chart: PathBuf,
    pub csv: PathBuf,
}

fn time_points(points: &[Point]) -> Vec<(DateTime<Local>, f64)> {
    points.iter().map(|p| (p.at, p.value)).collect()
}

fn spike_times(points: &[Point], policy: &SpikePolicy) -> Vec<DateTime<Local>> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    policy.spikes(&values).into_iter().map(|i| points[i].at).collect()
}

/// Two-pane chart plus `<stem>_data.csv` for a host-side run.
///
/// Returns `Ok(None)` without touching the filesystem when nothing was recorded.
pub fn report_live(recording: &Recording, settings: &ReportSettings) -> anyhow::Result<Option<ReportFiles>> {
    if recording.is_empty() {
        ConsoleUi::warn("No data collected!");
        return Ok(None);
    }
    ConsoleUi::info(&format!("Collected {} samples", recording.len()));

    let top = rank_top(recording.threads(), settings.top_k);
    let spec = ChartSpec {
        title: format!("{} CPU Usage Over Time", settings.app_label),
        total_label: "Total CPU".to_string(),
        total: time_points(recording.process()),
        spikes: spike_times(recording.process(), &settings.spike),
        threads_title: "Top Threads by CPU Usage".to_string(),
        threads: top
            .iter()
            .filter_map(|t| recording.thread(&t.name))
            .map(|s| (s.name().to_string(), time_points(s.points())))
            .collect(),
    };
    chart::render(&settings.output, &spec)
        .with_context(|| format!("Failed to render {}", settings.output.display()))?;
    ConsoleUi::success(&format!("Graph saved to: {}", settings.output.display()));

    let csv = export::data_csv_path(&settings.output);
    export::write_series_csv_file(&csv, recording, &top)
        .with_context(|| format!("Failed to write {}", csv.display()))?;
    ConsoleUi::success(&format!("Data saved to: {}", csv.display()));

    print_summary(&recording.process_values(), &settings.spike, &top);
    Ok(Some(ReportFiles {
        chart: settings.output.clone(),
        csv,
    }))
}

/// Single-pane chart for an on-device run; the raw device CSV is kept next to it
/// as `cpu_data.csv`.
pub fn report_ondevice(
    recording: &Recording,
    raw_csv: &Path,
    settings: &ReportSettings,
) -> anyhow::Result<Option<ReportFiles>> {
    if recording.is_empty() {
        ConsoleUi::warn("No data collected!");
        return Ok(None);
    }
    ConsoleUi::info(&format!("Collected {} samples", recording.len()));

    let spec = ChartSpec {
        title: format!("{} CPU Usage (On-Device - Minimal Overhead)", settings.app_label),
        total_label: "App CPU %".to_string(),
        total: time_points(recording.process()),
        spikes: spike_times(recording.process(), &settings.spike),
        threads_title: String::new(),
        threads: Vec::new(),
    };
    chart::render(&settings.output, &spec)
        .with_context(|| format!("Failed to render {}", settings.output.display()))?;
    ConsoleUi::success(&format!("Graph saved to: {}", settings.output.display()));

    let csv = settings.output.with_file_name("cpu_data.csv");
    std::fs::copy(raw_csv, &csv).with_context(|| format!("Failed to write {}", csv.display()))?;
    ConsoleUi::success(&format!("Data saved to: {}", csv.display()));

    print_summary(&recording.process_values(), &settings.spike, &[]);
    Ok(Some(ReportFiles {
        chart: settings.output.clone(),
        csv,
    }))
}

fn print_summary(values: &[f64], policy: &SpikePolicy, top: &[RankedEntity]) {
    let Some(summary) = summarize(values) else {
        return;
    };
    let threshold = policy.threshold(values);
    ConsoleUi::section("CPU Statistics");
    println!(
        "Total CPU - Avg: {:.1}%, Max: {:.1}%, Min: {:.1}%",
        summary.mean, summary.max, summary.min
    );
    println!("Spikes (>{:.0}%): {}", threshold, policy.spikes(values).len());
    if !top.is_empty() {
        println!("\nTop threads by average CPU:");
        for entity in top {
            ConsoleUi::stat_row(&entity.name, entity.mean, entity.max);
        }
    }
}
