#[derive(Debug, Clone, PartialEq)]
pub struct TopThread {
    pub tid: u32,
    pub name: String,
    pub cpu_percent: f64,
}

/// Parses thread rows laid out as
/// `TID USER PR NI VIRT RES SHR S %CPU %MEM TIME+ THREAD`.
/// Header, summary and malformed rows are skipped.
pub fn parse_top_threads(output: &str) -> Vec<TopThread> {
    output.lines().filter_map(parse_top_row).collect()
}

fn parse_top_row(line: &str) -> Option<TopThread> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 12 {
        return None;
    }
    let tid: u32 = parts[0].parse().ok()?;
    if parts[7].chars().count() != 1 {
        return None;
    }
    let cpu_percent: f64 = parts[8].parse().ok()?;
    parts[9].parse::<f64>().ok()?;
    Some(TopThread {
        tid,
        name: parts[11].to_string(),
        cpu_percent,
    })
}
