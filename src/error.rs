use thiserror::Error;
use venue::VenueError;

/// Invalid market maker configuration. Fatal at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MmError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("venue error: {0}")]
    Venue(#[from] VenueError),

    #[error("ladder rejected: none of {submitted} orders were accepted")]
    EmptyLadder { submitted: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
