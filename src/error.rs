//! Error taxonomy for the gallery build.
//!
//! Configuration problems surface before any network activity, fetch problems
//! abort the run before anything is written, and output failures cover the
//! final write. Malformed durations never become errors; see
//! [`crate::duration`].

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for a gallery build.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Writing the rendered page failed.
    #[error("writing {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YT_API_KEY is missing")]
    MissingApiKey,

    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The two remote endpoints the fetcher talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Videos,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Search => f.write_str("search"),
            Endpoint::Videos => f.write_str("videos"),
        }
    }
}

/// Connection-level failure reported by a [`crate::youtube::Transport`].
/// Messages must not contain the request URL, which carries the API key.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Failures talking to the video API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("YouTube {endpoint} API failed: {status}")]
    Status { endpoint: Endpoint, status: u16 },

    #[error("YouTube {endpoint} request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: TransportError,
    },

    #[error("decoding YouTube {endpoint} response: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Transient failures worth another attempt when a retry policy is set.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            FetchError::Decode { .. } => false,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            FetchError::Status { endpoint, .. }
            | FetchError::Transport { endpoint, .. }
            | FetchError::Decode { endpoint, .. } => *endpoint,
        }
    }
}
