use thiserror::Error;

/// Terminal outcome of a redundant query that produced no data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A host answered authoritatively that the data does not exist
    #[error("host {host} reported data as not found: {reason}")]
    NotFound { host: String, reason: String },

    /// Every host and every attempt failed softly
    #[error("all hosts exhausted after {attempts} attempts")]
    Exhausted { attempts: usize },
}

impl QueryError {
    /// Whether retrying later could produce a different answer
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Exhausted { .. })
    }
}

/// Reasons an icon set payload is rejected before ingestion
#[derive(Debug, Error)]
pub enum IconSetError {
    #[error("icon set payload is not an object")]
    NotAnObject,

    #[error("icon set field '{0}' is missing or has the wrong type")]
    InvalidField(&'static str),

    #[error("icon '{name}' is invalid: {reason}")]
    InvalidIcon { name: String, reason: String },

    #[error("alias '{name}' is invalid: {reason}")]
    InvalidAlias { name: String, reason: String },

    #[error("failed to decode icon set: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure to resolve a single icon through the loader
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("invalid icon name '{0}'")]
    InvalidName(String),

    /// Definitely absent, do not retry
    #[error("icon '{0}' does not exist")]
    NotFound(String),

    /// Could not be determined right now, retry later
    #[error("icon '{0}' is currently unavailable")]
    Unavailable(String),
}
