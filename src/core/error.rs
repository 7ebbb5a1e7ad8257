use thiserror::Error;
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("ADB not found in PATH or next to the executable")]
    AdbNotFound,
    #[error("ADB command failed: {0}")]
    CommandFailed(String),
    #[error("ADB timeout after {0}s")]
    Timeout(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported chart format '{0}', use .png or .svg")]
    UnsupportedOutput(String),
    #[error("Charting unavailable: {0}")]
    ChartUnavailable(String),
    #[error("Chart rendering failed: {0}")]
    Chart(String),
}
pub type Result<T> = std::result::Result<T, MonitorError>;
