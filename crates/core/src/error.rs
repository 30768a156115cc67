use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Failure of a subscriber comparison pass.
///
/// Recovered at the job boundary: the run still completes with an empty
/// change set and the schedule keeps running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("Comparison failed: {0}")]
    Failed(String),

    #[error("Comparison target unavailable: {0}")]
    Unavailable(String),
}
