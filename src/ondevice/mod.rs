//! Collection that runs entirely on the device.
//!
//! A small shell script is pushed and run over one `adb shell` session; the host
//! only streams its output and pulls the CSV afterwards, so no adb round-trips
//! happen while the app is being measured.

pub mod parse;
pub mod script;

pub use parse::{parse_device_csv, parse_row, DeviceRow};
pub use script::device_script;

use crate::adb::{DeviceBridge, StreamEnd};
use crate::core::{Config, Result};
use crate::monitor::{resolve_pid, Recording, Shutdown};
use crate::ui::ConsoleUi;
use chrono::Local;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct OnDeviceSettings {
    pub duration_secs: u64,
    pub interval_secs: u64,
}

#[derive(Debug)]
pub struct DeviceCapture {
    pub recording: Recording,
    /// The pulled device CSV, inside the caller's work directory.
    pub raw_csv: PathBuf,
}

/// Pushes and runs the collector, then pulls and parses its CSV.
///
/// `workdir` holds the local copy of the script and the pulled CSV. Returns
/// `Ok(None)` when the app is not running or the device produced no file.
pub async fn collect<B: DeviceBridge>(
    bridge: &B,
    config: &Config,
    settings: &OnDeviceSettings,
    workdir: &Path,
    shutdown: &Shutdown,
) -> Result<Option<DeviceCapture>> {
    let Some(pid) = resolve_pid(bridge, &config.package).await? else {
        ConsoleUi::error(&format!("{} is not running", config.package));
        return Ok(None);
    };
    ConsoleUi::info(&format!("Found app PID: {pid}"));

    let script = device_script(
        &config.package,
        settings.duration_secs,
        settings.interval_secs,
        &config.device_output,
    );
    let local_script = workdir.join(config.device_script_name());
    std::fs::write(&local_script, script)?;
    bridge.push(&local_script, &config.device_script).await?;
    bridge
        .shell(&format!("chmod +x {}", config.device_script))
        .await?;

    ConsoleUi::info(&format!(
        "Running monitor on device for {} seconds...",
        settings.duration_secs
    ));
    ConsoleUi::info("(You can use the tablet normally - no ADB overhead during collection)");
    let end = bridge
        .run_streaming(&config.device_script, shutdown, &mut |line: &str| {
            ConsoleUi::device_line(line)
        })
        .await?;
    if end == StreamEnd::Interrupted {
        ConsoleUi::warn("Stopping...");
        if let Err(e) = bridge
            .shell(&format!("pkill -f {}", config.device_script_name()))
            .await
        {
            tracing::warn!(error = %e, "could not stop the device script");
        }
    }

    ConsoleUi::info("Pulling data from device...");
    let raw_csv = workdir.join("cpu_data.csv");
    if let Err(e) = bridge.pull(&config.device_output, &raw_csv).await {
        tracing::warn!(error = %e, "pull failed");
        ConsoleUi::warn(&format!("No data file found: {}", config.device_output));
        return Ok(None);
    }
    let text = std::fs::read_to_string(&raw_csv)?;
    let recording = parse_device_csv(&text, config.cores, Local::now().date_naive());
    Ok(Some(DeviceCapture { recording, raw_csv }))
}
