//! Parsers for the kernel counter files read over the bridge.
//!
//! All counters are in clock ticks (jiffies). Malformed lines yield `None` and are
//! skipped by callers.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCounter {
    pub id: u32,
    pub name: String,
    pub ticks: u64,
}

/// Sum of user, nice, system, idle, iowait, irq and softirq from the aggregate
/// `cpu ` line of `/proc/stat`.
pub fn parse_system_total(output: &str) -> Option<u64> {
    let line = output.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(7)
        .map(|v| v.parse().ok())
        .collect::<Option<_>>()?;
    if fields.len() < 7 {
        return None;
    }
    fields.iter().try_fold(0u64, |acc, v| acc.checked_add(*v))
}

/// Parses one `/proc/<pid>/stat` or `/proc/<pid>/task/<tid>/stat` line.
///
/// The comm field sits between the first `(` and the last `)` and may itself
/// contain spaces and parentheses.
pub fn parse_task_stat(line: &str) -> Option<TaskCounter> {
    let l = line.find('(')?;
    let r = line.rfind(')')?;
    if r <= l {
        return None;
    }
    let id: u32 = line[..l].trim().parse().ok()?;
    let name = line[l + 1..r].to_string();
    let mut it = line[r + 1..].split_whitespace();
    let _state = it.next()?;
    let rest: Vec<&str> = it.collect();
    if rest.len() < 12 {
        return None;
    }
    // utime is field 14, stime field 15
    let utime: u64 = rest[10].parse().ok()?;
    let stime: u64 = rest[11].parse().ok()?;
    Some(TaskCounter {
        id,
        name,
        ticks: utime.checked_add(stime)?,
    })
}

pub fn parse_task_stats(output: &str) -> Vec<TaskCounter> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_task_stat(line);
            if parsed.is_none() {
                tracing::debug!(line, "skipping malformed task stat line");
            }
            parsed
        })
        .collect()
}
