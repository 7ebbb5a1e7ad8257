use crate::monitor::Recording;
use crate::report::stats::RankedEntity;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn data_csv_path(chart: &Path) -> PathBuf {
    let stem = chart
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cpu_usage".to_string());
    chart.with_file_name(format!("{stem}_data.csv"))
}

fn field(name: &str) -> String {
    if name.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

/// One row per tick: timestamp, process total, then one column per ranked thread.
/// A thread with no point on a tick is written as `0`.
pub fn write_series_csv(
    out: &mut impl Write,
    recording: &Recording,
    top: &[RankedEntity],
) -> std::io::Result<()> {
    let mut header = vec!["timestamp".to_string(), "total_cpu".to_string()];
    header.extend(top.iter().map(|t| field(&t.name)));
    writeln!(out, "{}", header.join(","))?;

    let columns: Vec<_> = top.iter().map(|t| recording.thread(&t.name)).collect();
    for point in recording.process() {
        let mut row = vec![point.at.format(TIMESTAMP_FORMAT).to_string(), point.value.to_string()];
        for series in &columns {
            let value = series.and_then(|s| s.value_at_tick(point.tick)).unwrap_or(0.0);
            row.push(value.to_string());
        }
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

pub fn write_series_csv_file(path: &Path, recording: &Recording, top: &[RankedEntity]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_series_csv(&mut writer, recording, top)?;
    writer.flush()
}
