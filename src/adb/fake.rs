use crate::adb::bridge::{DeviceBridge, StreamEnd};
use crate::core::{MonitorError, Result};
use crate::monitor::Shutdown;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Scripted bridge used in tests in place of a device.
///
/// Shell commands are answered from queues keyed by a substring of the command;
/// the first registered key contained in the command wins. An exhausted queue
/// answers with empty output. When a `stop_when_exhausted` key runs dry the
/// attached [`Shutdown`] fires, which is how tests end a poll loop.
#[derive(Default)]
pub struct FakeBridge {
    responses: Mutex<Vec<(String, VecDeque<String>)>>,
    failures: Vec<(String, String)>,
    stop: Option<(String, Shutdown)>,
    stream: Vec<String>,
    interrupt_stream_after: Option<(usize, Shutdown)>,
    files: HashMap<String, String>,
    log: Mutex<Vec<String>>,
    pushed: Mutex<Vec<(String, String)>>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond<I, S>(self, key: &str, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.responses).push((key.to_string(), outputs.into_iter().map(Into::into).collect()));
        self
    }

    /// Shell commands containing `key` fail with `message`.
    pub fn fail(mut self, key: &str, message: &str) -> Self {
        self.failures.push((key.to_string(), message.to_string()));
        self
    }

    pub fn stop_when_exhausted(mut self, key: &str, shutdown: Shutdown) -> Self {
        self.stop = Some((key.to_string(), shutdown));
        self
    }

    pub fn stream<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stream = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Fires `shutdown` after `lines` streamed lines, as a user pressing Ctrl-C would.
    pub fn interrupt_stream_after(mut self, lines: usize, shutdown: Shutdown) -> Self {
        self.interrupt_stream_after = Some((lines, shutdown));
        self
    }

    /// Content served by `pull` for `remote`. Pulling an unknown path fails.
    pub fn device_file(mut self, remote: &str, content: &str) -> Self {
        self.files.insert(remote.to_string(), content.to_string());
        self
    }

    /// Every command seen so far, shell and transfer alike.
    pub fn commands(&self) -> Vec<String> {
        lock(&self.log).clone()
    }

    /// `(remote path, file content)` for each push.
    pub fn pushed(&self) -> Vec<(String, String)> {
        lock(&self.pushed).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl DeviceBridge for FakeBridge {
    async fn shell(&self, command: &str) -> Result<String> {
        lock(&self.log).push(command.to_string());
        if let Some((_, message)) = self.failures.iter().find(|(key, _)| command.contains(key.as_str())) {
            return Err(MonitorError::CommandFailed(message.clone()));
        }
        let mut responses = lock(&self.responses);
        let Some((key, queue)) = responses.iter_mut().find(|(key, _)| command.contains(key.as_str()))
        else {
            return Ok(String::new());
        };
        let answer = queue.pop_front();
        if queue.is_empty() {
            if let Some((stop_key, shutdown)) = &self.stop {
                if stop_key.as_str() == key.as_str() {
                    shutdown.trigger();
                }
            }
        }
        Ok(answer.unwrap_or_default())
    }

    async fn push(&self, local: &Path, remote: &str) -> Result<()> {
        lock(&self.log).push(format!("push {} {remote}", local.display()));
        let content = std::fs::read_to_string(local)?;
        lock(&self.pushed).push((remote.to_string(), content));
        Ok(())
    }

    async fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        lock(&self.log).push(format!("pull {remote} {}", local.display()));
        let content = self
            .files
            .get(remote)
            .ok_or_else(|| MonitorError::CommandFailed(format!("remote object '{remote}' does not exist")))?;
        std::fs::write(local, content)?;
        Ok(())
    }

    async fn run_streaming(
        &self,
        command: &str,
        shutdown: &Shutdown,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<StreamEnd> {
        lock(&self.log).push(command.to_string());
        for (i, line) in self.stream.iter().enumerate() {
            if shutdown.is_triggered() {
                return Ok(StreamEnd::Interrupted);
            }
            on_line(line);
            if let Some((after, trigger)) = &self.interrupt_stream_after {
                if i + 1 >= *after {
                    trigger.trigger();
                }
            }
        }
        if shutdown.is_triggered() {
            return Ok(StreamEnd::Interrupted);
        }
        Ok(StreamEnd::Completed)
    }
}
