use crate::monitor::Series;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

pub fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    Some(Summary { mean, max, min })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntity {
    pub name: String,
    pub mean: f64,
    pub max: f64,
}

/// The `k` series with the highest mean, highest first. Ties keep first-seen order.
pub fn rank_top(series: &[Series], k: usize) -> Vec<RankedEntity> {
    let mut ranked: Vec<RankedEntity> = series
        .iter()
        .filter_map(|s| {
            summarize(&s.values()).map(|summary| RankedEntity {
                name: s.name().to_string(),
                mean: summary.mean,
                max: summary.max,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    ranked.truncate(k);
    ranked
}
