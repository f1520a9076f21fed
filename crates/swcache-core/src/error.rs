//! Error types for the caching worker.

/// Worker errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The network layer failed to produce a response (transport failure).
    #[error("network error: {message}")]
    Network { message: String },

    /// A partition read, write, listing or delete failed.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// The request could not be interpreted (bad URL, unsupported method).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Lifecycle event delivered in a state that cannot accept it.
    #[error("lifecycle error: cannot {event} while {state}")]
    Lifecycle { event: String, state: String },

    /// The hosting runtime rejected a side effect (notification, clients).
    #[error("host error: {message}")]
    Host { message: String },
}

impl CacheError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 1,
            Self::InvalidRequest { .. } => 1,

            // Network/transient
            Self::Network { .. } => 5,

            // Other
            Self::Cache { .. } => 6,
            Self::Lifecycle { .. } => 7,
            Self::Host { .. } => 7,
        }
    }

    /// Whether the error came from the network layer.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub(crate) fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for CacheError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidRequest {
            message: format!("invalid URL: {}", err),
        }
    }
}

/// Result type for worker operations.
pub type CacheResult<T> = Result<T, CacheError>;
