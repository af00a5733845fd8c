// ABOUTME: Error types for the staging repository client.
// ABOUTME: Classifies transport, server (retryable) and API (4xx) failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 5xx from the provider. Retried at the HTTP layer.
    #[error("server error {status} from {url}: {reason}")]
    Server {
        url: String,
        status: u16,
        reason: String,
    },

    /// 4xx from the provider.
    #[error("request to {url} rejected with {status}: {reason}")]
    Api {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("request was interrupted before it completed")]
    Interrupted,
}

impl StagingError {
    /// HTTP status returned by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            StagingError::Server { status, .. } | StagingError::Api { status, .. } => Some(*status),
            StagingError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether re-sending the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StagingError::Server { .. } => true,
            StagingError::Transport { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }

    /// Whether the request never reached the provider, so re-sending cannot
    /// duplicate its effect.
    pub fn is_unsent(&self) -> bool {
        matches!(self, StagingError::Transport { source, .. } if source.is_connect())
    }

    pub fn is_not_found(&self) -> bool {
        self.api_status() == Some(404)
    }

    pub fn is_forbidden(&self) -> bool {
        self.api_status() == Some(403)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.api_status() == Some(401)
    }

    fn api_status(&self) -> Option<u16> {
        match self {
            StagingError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
