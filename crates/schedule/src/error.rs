/// Errors returned by schedule control operations.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid refresh interval: {0}s (must be positive)")]
    InvalidInterval(u64),
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}
