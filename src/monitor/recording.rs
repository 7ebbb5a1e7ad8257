use crate::sampler::Reading;
use chrono::{DateTime, Local};
use std::collections::HashMap;

pub const PROCESS_SERIES: &str = "process";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Index of the recorded tick this point belongs to.
    pub tick: usize,
    pub at: DateTime<Local>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    points: Vec<Point>,
}
impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn value_at_tick(&self, tick: usize) -> Option<f64> {
        self.points
            .binary_search_by_key(&tick, |p| p.tick)
            .ok()
            .map(|i| self.points[i].value)
    }
    fn push(&mut self, point: Point) {
        self.points.push(point);
    }
}

/// Everything measured during one run. Append-only; threads keep first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    ticks: Vec<DateTime<Local>>,
    process: Option<Series>,
    threads: Vec<Series>,
    index: HashMap<String, usize>,
}
impl Recording {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.ticks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
    pub fn timestamps(&self) -> &[DateTime<Local>] {
        &self.ticks
    }
    pub fn process(&self) -> &[Point] {
        self.process.as_ref().map(Series::points).unwrap_or(&[])
    }
    pub fn process_values(&self) -> Vec<f64> {
        self.process().iter().map(|p| p.value).collect()
    }
    pub fn threads(&self) -> &[Series] {
        &self.threads
    }
    pub fn thread(&self, name: &str) -> Option<&Series> {
        self.index.get(name).map(|&i| &self.threads[i])
    }
    /// Returns `false` when the reading held nothing to record. A missing process
    /// figure falls back to the sum of its threads.
    pub fn record_reading(&mut self, at: DateTime<Local>, reading: &Reading) -> bool {
        let total = match reading.process {
            Some(value) => value,
            None if reading.threads.is_empty() => return false,
            None => reading.threads.iter().map(|(_, v)| v).sum(),
        };
        self.record(at, total, &reading.threads);
        true
    }
    pub fn record(&mut self, at: DateTime<Local>, total: f64, threads: &[(String, f64)]) {
        let tick = self.ticks.len();
        self.ticks.push(at);
        self.process
            .get_or_insert_with(|| Series::new(PROCESS_SERIES))
            .push(Point { tick, at, value: total });
        for (name, value) in threads {
            let idx = match self.index.get(name) {
                Some(&idx) => idx,
                None => {
                    self.threads.push(Series::new(name.clone()));
                    self.index.insert(name.clone(), self.threads.len() - 1);
                    self.threads.len() - 1
                }
            };
            self.threads[idx].push(Point { tick, at, value: *value });
        }
    }
}
