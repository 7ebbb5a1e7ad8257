use crate::core::Result;
use crate::monitor::Shutdown;
use std::future::Future;
use std::path::Path;

/// How a streamed device command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    Interrupted,
}

/// The device-side operations the collectors need.
///
/// `AdbClient` is the real implementation; tests script a fake one.
pub trait DeviceBridge {
    /// Runs `command` in the device shell and returns its stdout.
    ///
    /// A non-zero exit status is not an error: `pidof` exits 1 when nothing
    /// matches and `cat` fails once a pid is gone, and callers read that from
    /// the (empty) output.
    fn shell(&self, command: &str) -> impl Future<Output = Result<String>>;

    fn push(&self, local: &Path, remote: &str) -> impl Future<Output = Result<()>>;

    fn pull(&self, remote: &str, local: &Path) -> impl Future<Output = Result<()>>;

    /// Runs `command` to completion, handing each stdout line to `on_line`.
    /// Returns early with [`StreamEnd::Interrupted`] once `shutdown` fires.
    fn run_streaming(
        &self,
        command: &str,
        shutdown: &Shutdown,
        on_line: &mut dyn FnMut(&str),
    ) -> impl Future<Output = Result<StreamEnd>>;
}
