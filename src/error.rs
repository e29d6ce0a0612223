//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Why a page request failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Transport {
        /// HTTP status code.
        status: u16,
    },

    /// The body parsed but its `response` field was not `"success"`.
    #[error("server reported {response:?} instead of success")]
    Protocol {
        /// The discriminator found, if any.
        response: Option<String>,
    },

    /// The body has no array under the configured results key.
    #[error("response has no `{key}` array")]
    MissingResults {
        /// The configured results key.
        key: String,
    },

    /// A result row did not match the row type.
    #[error("could not decode results: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// True for failures reported by the server rather than the network.
    pub fn is_server_reported(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Protocol { .. })
    }
}

/// Why an image could not be attached.
#[derive(Debug, Error)]
pub enum AttachError {
    /// Reading the file failed.
    #[error("could not read {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The extension is not one of png, jpg, jpeg or gif.
    #[error("{} is not a png, jpeg or gif image", .path.display())]
    UnsupportedType {
        /// Offending file.
        path: PathBuf,
    },
}

/// Result alias for page requests.
pub type Result<T, E = FetchError> = std::result::Result<T, E>;
