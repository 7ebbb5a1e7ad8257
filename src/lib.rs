//! Samples per-thread CPU usage of an Android app over adb, then charts it.
//!
//! Two collection modes share one reporting path:
//! * [`monitor`] polls `/proc` counters from the host and turns them into
//!   percentages with [`sampler`];
//! * [`ondevice`] runs a collector script on the device and computes the same
//!   percentages from the CSV it leaves behind.
//!
//! [`report`] renders the chart, writes the CSV and prints the summary.

pub mod adb;
pub mod core;
pub mod monitor;
pub mod ondevice;
pub mod report;
pub mod sampler;
pub mod ui;
