use crate::monitor::Recording;
use crate::sampler::{cpu_percent, Jiffies};
use chrono::{Local, NaiveDate, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRow {
    pub time: NaiveTime,
    pub utime: u64,
    pub stime: u64,
    pub sys_total: u64,
    pub sys_idle: u64,
}

pub fn parse_row(line: &str) -> Option<DeviceRow> {
    let parts: Vec<&str> = line.trim().split(',').collect();
    if parts.len() < 5 {
        return None;
    }
    Some(DeviceRow {
        time: NaiveTime::parse_from_str(parts[0].trim(), "%H:%M:%S").ok()?,
        utime: parts[1].trim().parse().ok()?,
        stime: parts[2].trim().parse().ok()?,
        sys_total: parts[3].trim().parse().ok()?,
        sys_idle: parts[4].trim().parse().ok()?,
    })
}

/// Rebuilds process percentages from the CSV written on the device.
///
/// The first line is the header. Malformed rows are skipped without breaking
/// the chain of deltas; rows whose system counter did not advance produce no
/// point. Times are placed on `day`.
pub fn parse_device_csv(text: &str, cores: u32, day: NaiveDate) -> Recording {
    let mut recording = Recording::new();
    let mut previous: Option<Jiffies> = None;
    for line in text.lines().skip(1) {
        let Some(row) = parse_row(line) else {
            if !line.trim().is_empty() {
                tracing::debug!(line, "skipping malformed device row");
            }
            continue;
        };
        let current = Jiffies {
            entity: row.utime.saturating_add(row.stime),
            system: row.sys_total,
        };
        if let Some(pct) = previous.and_then(|prev| cpu_percent(prev, current, cores)) {
            if let Some(at) = day.and_time(row.time).and_local_timezone(Local).earliest() {
                recording.record(at, pct, &[]);
            }
        }
        previous = Some(current);
    }
    recording
}
