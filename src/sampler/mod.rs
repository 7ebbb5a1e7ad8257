//! Turns raw kernel counters read over the bridge into CPU percentages.
//!
//! A percentage always comes from two consecutive reads of the same entity:
//! `(Δentity / Δsystem) * 100 * cores`. The previous read lives in a
//! [`CounterCache`] owned by whoever drives the sampler.

pub mod procfs;
pub mod top;

use crate::adb::DeviceBridge;
use crate::core::Result;
use procfs::{parse_system_total, parse_task_stat, parse_task_stats};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jiffies {
    pub entity: u64,
    pub system: u64,
}

/// CPU percentage between two reads, or `None` when the system counter did not
/// advance or the entity counter went backwards.
pub fn cpu_percent(previous: Jiffies, current: Jiffies, cores: u32) -> Option<f64> {
    let system_delta = current.system.checked_sub(previous.system)?;
    if system_delta == 0 {
        return None;
    }
    let entity_delta = current.entity.checked_sub(previous.entity)?;
    Some(entity_delta as f64 * 100.0 * f64::from(cores) / system_delta as f64)
}

/// Last good read of every entity, each paired with the system counter of its tick.
///
/// An entity whose line fails to parse keeps its older entry, so the next good
/// read is measured against it.
#[derive(Debug, Clone, Default)]
pub struct CounterCache {
    system: Option<u64>,
    process: Option<Jiffies>,
    threads: HashMap<u32, Jiffies>,
}
impl CounterCache {
    pub fn reset(&mut self) {
        self.system = None;
        self.process = None;
        self.threads.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    /// Whole-process figure, absent when its stat line was malformed.
    pub process: Option<f64>,
    /// Per thread name in first-seen order. Threads sharing a name are summed.
    pub threads: Vec<(String, f64)>,
}
impl Reading {
    pub fn busiest_thread(&self) -> Option<&(String, f64)> {
        self.threads.iter().max_by(|a, b| a.1.total_cmp(&b.1))
    }
    fn add_thread(&mut self, name: &str, percent: f64) {
        match self.threads.iter_mut().find(|(n, _)| n == name) {
            Some((_, total)) => *total += percent,
            None => self.threads.push((name.to_string(), percent)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    /// No previous counters yet; this read only filled the cache.
    Primed,
    /// Nothing measurable this tick (system counter unreadable or not advancing).
    Skipped,
    Stopped,
    Measured(Reading),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleSource {
    #[default]
    Proc,
    /// `top -H` snapshots. Heavier on the device but needs no priming.
    Top,
}
impl FromStr for SampleSource {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proc" => Ok(Self::Proc),
            "top" => Ok(Self::Top),
            other => Err(format!("unknown sample source '{other}', expected proc or top")),
        }
    }
}
impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proc => write!(f, "lightweight (/proc)"),
            Self::Top => write!(f, "top -H"),
        }
    }
}

pub struct Sampler {
    source: SampleSource,
    cores: u32,
    cache: CounterCache,
}
impl Sampler {
    pub fn new(source: SampleSource, cores: u32) -> Self {
        Self {
            source,
            cores,
            cache: CounterCache::default(),
        }
    }
    pub fn reset(&mut self) {
        tracing::debug!("counter cache reset");
        self.cache.reset();
    }
    pub async fn sample<B: DeviceBridge>(&mut self, bridge: &B, pid: u32) -> Result<SampleOutcome> {
        match self.source {
            SampleSource::Proc => self.sample_proc(bridge, pid).await,
            SampleSource::Top => Self::sample_top(bridge, pid).await,
        }
    }
    async fn sample_proc<B: DeviceBridge>(&mut self, bridge: &B, pid: u32) -> Result<SampleOutcome> {
        let system_out = bridge.shell("cat /proc/stat | head -1").await?;
        let process_out = bridge
            .shell(&format!("cat /proc/{pid}/stat 2>/dev/null"))
            .await?;
        if process_out.trim().is_empty() {
            return Ok(SampleOutcome::Stopped);
        }
        let threads_out = bridge
            .shell(&format!("cat /proc/{pid}/task/*/stat 2>/dev/null"))
            .await?;
        Ok(self.ingest(&system_out, &process_out, &threads_out))
    }
    pub fn ingest(&mut self, system_out: &str, process_out: &str, threads_out: &str) -> SampleOutcome {
        let Some(system) = parse_system_total(system_out) else {
            tracing::debug!(output = system_out.trim(), "malformed /proc/stat line");
            return SampleOutcome::Skipped;
        };
        let process = process_out.lines().next().and_then(parse_task_stat);
        let threads = parse_task_stats(threads_out);
        let garbled_threads = threads_out.lines().filter(|l| !l.trim().is_empty()).count() > threads.len();
        let previous_system = self.cache.system.replace(system);

        let mut reading = Reading::default();
        if let Some(process) = process {
            let current = Jiffies { entity: process.ticks, system };
            reading.process = self
                .cache
                .process
                .and_then(|previous| cpu_percent(previous, current, self.cores));
            self.cache.process = Some(current);
        }

        let mut previous_threads = std::mem::take(&mut self.cache.threads);
        for thread in &threads {
            let current = Jiffies { entity: thread.ticks, system };
            if let Some(value) = previous_threads
                .remove(&thread.id)
                .and_then(|previous| cpu_percent(previous, current, self.cores))
            {
                reading.add_thread(&thread.name, value);
            }
            self.cache.threads.insert(thread.id, current);
        }
        // a garbled line hides its tid, so unmatched entries may still be alive
        if garbled_threads {
            for (id, previous) in previous_threads {
                self.cache.threads.entry(id).or_insert(previous);
            }
        }

        match previous_system {
            None => SampleOutcome::Primed,
            Some(previous) if system <= previous => SampleOutcome::Skipped,
            Some(_) => SampleOutcome::Measured(reading),
        }
    }
    async fn sample_top<B: DeviceBridge>(bridge: &B, pid: u32) -> Result<SampleOutcome> {
        let out = bridge.shell(&format!("top -H -p {pid} -n 1 -b")).await?;
        let rows = top::parse_top_threads(&out);
        if rows.is_empty() {
            return Ok(SampleOutcome::Skipped);
        }
        let mut reading = Reading::default();
        for row in &rows {
            reading.add_thread(&row.name, row.cpu_percent);
        }
        reading.process = Some(rows.iter().map(|r| r.cpu_percent).sum());
        Ok(SampleOutcome::Measured(reading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_line(total: u64) -> String {
        format!("cpu  {total} 0 0 0 0 0 0 0 0 0\n")
    }

    fn stat_line(id: u32, name: &str, utime: u64, stime: u64) -> String {
        format!("{id} ({name}) S 1 1 1 0 -1 0 0 0 0 0 {utime} {stime} 0 0 20 0 1 0\n")
    }

    #[test]
    fn percent_matches_formula() {
        let p = cpu_percent(
            Jiffies { entity: 10, system: 100 },
            Jiffies { entity: 25, system: 200 },
            1,
        );
        assert_eq!(p, Some(15.0));
        let p = cpu_percent(
            Jiffies { entity: 0, system: 0 },
            Jiffies { entity: 40, system: 800 },
            8,
        );
        assert_eq!(p, Some(40.0));
    }

    #[test]
    fn no_percent_without_system_progress() {
        let a = Jiffies { entity: 0, system: 100 };
        assert_eq!(cpu_percent(a, Jiffies { entity: 5, system: 100 }, 1), None);
        assert_eq!(cpu_percent(a, Jiffies { entity: 5, system: 90 }, 1), None);
    }

    #[test]
    fn backwards_entity_counter_is_skipped() {
        let a = Jiffies { entity: 50, system: 100 };
        assert_eq!(cpu_percent(a, Jiffies { entity: 10, system: 200 }, 1), None);
    }

    #[test]
    fn first_ingest_only_primes() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        let outcome = sampler.ingest(&system_line(0), &stat_line(5, "app", 0, 0), "");
        assert_eq!(outcome, SampleOutcome::Primed);
        assert!(sampler.cache.system.is_some());
    }

    #[test]
    fn synthetic_trace_yields_expected_percentages() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        let trace = [(0, 0), (10, 100), (25, 200), (50, 300)];
        let mut got = Vec::new();
        for (process, system) in trace {
            let outcome = sampler.ingest(&system_line(system), &stat_line(5, "app", process, 0), "");
            got.push(match outcome {
                SampleOutcome::Measured(r) => r.process,
                _ => None,
            });
        }
        assert_eq!(got, vec![None, Some(10.0), Some(15.0), Some(25.0)]);
    }

    #[test]
    fn stalled_system_counter_emits_nothing() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        sampler.ingest(&system_line(100), &stat_line(5, "app", 1, 0), "");
        let outcome = sampler.ingest(&system_line(100), &stat_line(5, "app", 9, 0), "");
        assert_eq!(outcome, SampleOutcome::Skipped);
    }

    #[test]
    fn malformed_system_line_leaves_cache_alone() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        sampler.ingest(&system_line(100), &stat_line(5, "app", 0, 0), "");
        assert_eq!(sampler.ingest("cpu garbage", "", ""), SampleOutcome::Skipped);
        let outcome = sampler.ingest(&system_line(200), &stat_line(5, "app", 20, 0), "");
        assert_eq!(
            outcome,
            SampleOutcome::Measured(Reading { process: Some(20.0), threads: vec![] })
        );
    }

    #[test]
    fn threads_need_a_previous_read_and_same_names_sum() {
        let mut sampler = Sampler::new(SampleSource::Proc, 2);
        let first = stat_line(6, "Binder", 0, 0) + &stat_line(7, "Binder", 0, 0);
        sampler.ingest(&system_line(0), &stat_line(5, "app", 0, 0), &first);
        let second = stat_line(6, "Binder", 10, 0)
            + &stat_line(7, "Binder", 5, 5)
            + &stat_line(8, "NewThread", 30, 0);
        let outcome = sampler.ingest(&system_line(100), &stat_line(5, "app", 40, 0), &second);
        let SampleOutcome::Measured(reading) = outcome else {
            panic!("expected a measurement, got {outcome:?}");
        };
        assert_eq!(reading.process, Some(80.0));
        assert_eq!(reading.threads, vec![("Binder".to_string(), 40.0)]);
    }

    #[test]
    fn exited_thread_is_omitted() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        let both = stat_line(6, "a", 0, 0) + &stat_line(7, "b", 0, 0);
        sampler.ingest(&system_line(0), &stat_line(5, "app", 0, 0), &both);
        let outcome = sampler.ingest(&system_line(100), &stat_line(5, "app", 3, 0), &stat_line(6, "a", 3, 0));
        let SampleOutcome::Measured(reading) = outcome else {
            panic!("expected a measurement");
        };
        assert_eq!(reading.threads, vec![("a".to_string(), 3.0)]);
    }

    #[test]
    fn garbled_process_line_costs_only_its_own_tick() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        sampler.ingest(&system_line(0), &stat_line(5, "app", 0, 0), "");
        let garbled = sampler.ingest(&system_line(100), "5 (app) S garbage\n", "");
        assert_eq!(
            garbled,
            SampleOutcome::Measured(Reading { process: None, threads: vec![] })
        );
        let outcome = sampler.ingest(&system_line(200), &stat_line(5, "app", 30, 0), "");
        assert_eq!(
            outcome,
            SampleOutcome::Measured(Reading { process: Some(15.0), threads: vec![] })
        );
    }

    #[test]
    fn garbled_thread_line_keeps_its_baseline() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        let app = |ticks| stat_line(5, "app", ticks, 0);
        let first = stat_line(6, "a", 0, 0) + &stat_line(7, "b", 0, 0);
        sampler.ingest(&system_line(0), &app(0), &first);
        let second = stat_line(6, "a", 10, 0) + "7 (b) S 1 2\n";
        let SampleOutcome::Measured(reading) = sampler.ingest(&system_line(100), &app(10), &second) else {
            panic!("expected a measurement");
        };
        assert_eq!(reading.threads, vec![("a".to_string(), 10.0)]);
        let third = stat_line(6, "a", 20, 0) + &stat_line(7, "b", 40, 0);
        let SampleOutcome::Measured(reading) = sampler.ingest(&system_line(200), &app(60), &third) else {
            panic!("expected a measurement");
        };
        assert_eq!(
            reading.threads,
            vec![("a".to_string(), 10.0), ("b".to_string(), 20.0)]
        );
    }

    #[test]
    fn reset_requires_priming_again() {
        let mut sampler = Sampler::new(SampleSource::Proc, 1);
        sampler.ingest(&system_line(0), &stat_line(5, "app", 0, 0), "");
        sampler.reset();
        let outcome = sampler.ingest(&system_line(100), &stat_line(9, "app", 90, 0), "");
        assert_eq!(outcome, SampleOutcome::Primed);
    }

    #[test]
    fn source_parses_from_cli_text() {
        assert_eq!("top".parse::<SampleSource>(), Ok(SampleSource::Top));
        assert_eq!("PROC".parse::<SampleSource>(), Ok(SampleSource::Proc));
        assert!("perf".parse::<SampleSource>().is_err());
    }
}
