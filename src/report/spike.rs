use std::fmt;
use std::str::FromStr;

/// Where a point counts as a spike. A point is a spike when strictly above the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpikePolicy {
    Fixed(f64),
    RelativeToMean(f64),
}

impl SpikePolicy {
    pub const LIVE_DEFAULT: SpikePolicy = SpikePolicy::Fixed(50.0);
    pub const ONDEVICE_DEFAULT: SpikePolicy = SpikePolicy::RelativeToMean(1.5);

    pub fn threshold(&self, values: &[f64]) -> f64 {
        match *self {
            SpikePolicy::Fixed(limit) => limit,
            SpikePolicy::RelativeToMean(factor) => {
                if values.is_empty() {
                    return f64::INFINITY;
                }
                factor * values.iter().sum::<f64>() / values.len() as f64
            }
        }
    }

    pub fn spikes(&self, values: &[f64]) -> Vec<usize> {
        let threshold = self.threshold(values);
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

impl FromStr for SpikePolicy {
    type Err = String;

    /// Accepts `fixed:<percent>`, `relative:<factor>` or a bare percentage.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, value) = s.split_once(':').unwrap_or(("fixed", s));
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid spike threshold '{s}'"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("spike threshold must be a non-negative number, got '{s}'"));
        }
        match kind.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(SpikePolicy::Fixed(value)),
            "relative" => Ok(SpikePolicy::RelativeToMean(value)),
            other => Err(format!("unknown spike policy '{other}', expected fixed or relative")),
        }
    }
}

impl fmt::Display for SpikePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpikePolicy::Fixed(v) => write!(f, "fixed:{v}"),
            SpikePolicy::RelativeToMean(v) => write!(f, "relative:{v}"),
        }
    }
}
