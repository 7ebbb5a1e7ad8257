use crate::adb::bridge::{DeviceBridge, StreamEnd};
use crate::core::{Config, MonitorError, Result};
use crate::monitor::Shutdown;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

const ADB_BINARY: &str = if cfg!(windows) { "adb.exe" } else { "adb" };

#[derive(Debug, Clone)]
pub struct AdbClient {
    adb_path: PathBuf,
    serial: Option<String>,
}
impl AdbClient {
    pub fn new(config: &Config) -> Result<Self> {
        let adb_path = Self::resolve_adb(config.adb_path.as_deref())?;
        Ok(Self {
            adb_path,
            serial: config.serial.clone(),
        })
    }
    pub fn adb_path(&self) -> &Path {
        &self.adb_path
    }
    fn resolve_adb(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(MonitorError::AdbNotFound);
        }
        if let Ok(current_exe) = std::env::current_exe() {
            if let Some(parent) = current_exe.parent() {
                let bundled = parent.join("platform-tools").join(ADB_BINARY);
                if bundled.exists() {
                    return Ok(bundled);
                }
            }
        }
        let locator = if cfg!(windows) { "where" } else { "which" };
        if let Ok(output) = std::process::Command::new(locator).arg("adb").output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout);
                if let Some(line) = path_str.lines().next() {
                    if !line.trim().is_empty() {
                        return Ok(PathBuf::from(line.trim()));
                    }
                }
            }
        }
        Err(MonitorError::AdbNotFound)
    }
    pub async fn ensure_present(&self) -> Result<()> {
        let output = timeout(
            Duration::from_secs(10),
            Command::new(&self.adb_path).arg("version").output(),
        )
        .await
        .map_err(|_| MonitorError::Timeout(10))??;
        if output.status.success() {
            Ok(())
        } else {
            Err(MonitorError::CommandFailed("adb version failed".to_string()))
        }
    }
    fn device_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s");
            full.push(serial.as_str());
        }
        full.extend_from_slice(args);
        full
    }
    pub async fn execute(&self, args: &[&str]) -> Result<(String, String)> {
        let args = self.device_args(args);
        tracing::debug!(?args, "adb");
        let output = Command::new(&self.adb_path).args(&args).output().await?;
        let stdout = String::from_utf8(output.stdout)?;
        let stderr = String::from_utf8(output.stderr)?;
        if !output.status.success() {
            return Err(MonitorError::CommandFailed(stderr.trim().to_string()));
        }
        Ok((stdout, stderr))
    }
    pub async fn try_execute(&self, args: &[&str]) -> Result<(bool, String, String)> {
        let args = self.device_args(args);
        tracing::debug!(?args, "adb");
        let output = Command::new(&self.adb_path).args(&args).output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Ok((output.status.success(), stdout, stderr))
    }
}
impl DeviceBridge for AdbClient {
    async fn shell(&self, command: &str) -> Result<String> {
        let (_, stdout, stderr) = self.try_execute(&["shell", command]).await?;
        if stderr.to_lowercase().contains("error: no devices") {
            return Err(MonitorError::CommandFailed(stderr.trim().to_string()));
        }
        Ok(stdout)
    }
    async fn push(&self, local: &Path, remote: &str) -> Result<()> {
        let local = local.to_string_lossy().into_owned();
        self.execute(&["push", local.as_str(), remote]).await?;
        Ok(())
    }
    async fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        let local = local.to_string_lossy().into_owned();
        self.execute(&["pull", remote, local.as_str()]).await?;
        Ok(())
    }
    async fn run_streaming(
        &self,
        command: &str,
        shutdown: &Shutdown,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<StreamEnd> {
        let args = self.device_args(&["shell", command]);
        let mut child = Command::new(&self.adb_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MonitorError::CommandFailed("adb shell has no stdout".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => on_line(line.trim_end()),
                    None => break,
                },
                _ = shutdown.wait() => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Ok(StreamEnd::Interrupted);
                }
            }
        }
        child.wait().await?;
        Ok(StreamEnd::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(serial: Option<&str>) -> AdbClient {
        AdbClient {
            adb_path: PathBuf::from("adb"),
            serial: serial.map(str::to_string),
        }
    }

    #[test]
    fn serial_is_prepended_when_configured() {
        let c = client(Some("R52N"));
        assert_eq!(c.device_args(&["shell", "pidof x"]), vec!["-s", "R52N", "shell", "pidof x"]);
    }

    #[test]
    fn no_serial_leaves_args_alone() {
        let c = client(None);
        assert_eq!(c.device_args(&["pull", "/a", "b"]), vec!["pull", "/a", "b"]);
    }

    #[test]
    fn explicit_missing_adb_is_not_found() {
        let err = AdbClient::resolve_adb(Some(Path::new("/nonexistent/adb"))).unwrap_err();
        assert!(matches!(err, MonitorError::AdbNotFound));
    }
}
