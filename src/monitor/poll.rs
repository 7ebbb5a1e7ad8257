use crate::adb::DeviceBridge;
use crate::core::Result;
use crate::monitor::recording::Recording;
use crate::monitor::Shutdown;
use crate::sampler::{SampleOutcome, Sampler};
use crate::ui::ConsoleUi;
use chrono::Local;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub package: String,
    pub duration: Duration,
    pub interval: Duration,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    WaitingForProcess,
    Sampling { pid: u32 },
}

#[derive(Debug)]
pub struct RunOutcome {
    pub recording: Recording,
    pub restarts: u32,
    pub interrupted: bool,
}

pub async fn resolve_pid<B: DeviceBridge>(bridge: &B, package: &str) -> Result<Option<u32>> {
    let output = bridge.shell(&format!("pidof {package}")).await?;
    Ok(output
        .split_whitespace()
        .next()
        .and_then(|pid| pid.parse().ok()))
}

pub struct PollLoop<'a, B> {
    bridge: &'a B,
    settings: PollSettings,
    sampler: Sampler,
    shutdown: Shutdown,
    state: PollState,
}

impl<'a, B: DeviceBridge> PollLoop<'a, B> {
    pub fn new(bridge: &'a B, settings: PollSettings, sampler: Sampler, shutdown: Shutdown) -> Self {
        Self {
            bridge,
            settings,
            sampler,
            shutdown,
            state: PollState::WaitingForProcess,
        }
    }

    /// Runs until the duration elapses or the shutdown flag fires. Device errors
    /// are logged and retried, never fatal.
    pub async fn run(mut self) -> RunOutcome {
        let mut recording = Recording::new();
        let mut restarts = 0u32;

        let Some(mut pid) = self.wait_for_first_pid().await else {
            return RunOutcome {
                recording,
                restarts,
                interrupted: true,
            };
        };
        ConsoleUi::success(&format!("Found PID: {pid}"));
        self.state = PollState::Sampling { pid };

        let started = Instant::now();
        let mut interrupted = false;
        while started.elapsed() < self.settings.duration {
            if self.shutdown.is_triggered() {
                interrupted = true;
                break;
            }
            match self.lookup_pid().await {
                None => {
                    self.enter_waiting();
                    if self.shutdown.sleep(self.settings.retry_delay).await {
                        interrupted = true;
                        break;
                    }
                    continue;
                }
                Some(current) if current != pid => {
                    restarts += 1;
                    ConsoleUi::warn(&format!("App restarted with new PID: {current}"));
                    tracing::info!(old = pid, new = current, "target restarted");
                    self.sampler.reset();
                    pid = current;
                }
                Some(_) => {}
            }
            self.state = PollState::Sampling { pid };

            match self.sampler.sample(self.bridge, pid).await {
                Ok(SampleOutcome::Measured(reading)) => {
                    if recording.record_reading(Local::now(), &reading) {
                        let total = recording.process().last().map_or(0.0, |p| p.value);
                        ConsoleUi::sample_line(
                            started.elapsed(),
                            total,
                            reading.busiest_thread().map(|(n, v)| (n.as_str(), *v)),
                        );
                    }
                }
                Ok(SampleOutcome::Stopped) => {
                    self.enter_waiting();
                    if self.shutdown.sleep(self.settings.retry_delay).await {
                        interrupted = true;
                        break;
                    }
                    continue;
                }
                Ok(SampleOutcome::Primed) | Ok(SampleOutcome::Skipped) => {}
                Err(e) => {
                    ConsoleUi::warn(&format!("Sampling failed: {e}"));
                    tracing::warn!(error = %e, pid, "sample failed");
                }
            }

            if self.shutdown.sleep(self.settings.interval).await {
                interrupted = true;
                break;
            }
        }
        if interrupted {
            ConsoleUi::info("Stopped by user");
        }
        RunOutcome {
            recording,
            restarts,
            interrupted,
        }
    }

    async fn wait_for_first_pid(&mut self) -> Option<u32> {
        loop {
            if self.shutdown.is_triggered() {
                return None;
            }
            if let Some(pid) = self.lookup_pid().await {
                return Some(pid);
            }
            ConsoleUi::info("Waiting for app to start...");
            if self.shutdown.sleep(self.settings.retry_delay).await {
                return None;
            }
        }
    }

    async fn lookup_pid(&self) -> Option<u32> {
        match resolve_pid(self.bridge, &self.settings.package).await {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!(error = %e, "pid lookup failed");
                None
            }
        }
    }

    fn enter_waiting(&mut self) {
        if let PollState::Sampling { pid } = self.state {
            ConsoleUi::warn("App stopped. Waiting...");
            tracing::info!(pid, "target stopped");
        }
        self.state = PollState::WaitingForProcess;
    }
}
