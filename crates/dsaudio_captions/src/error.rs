// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while fetching or ingesting caption documents.

/// Result alias for caption operations
pub type CaptionResult<T> = Result<T, CaptionError>;

/// Errors that can occur while obtaining a caption document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptionError {
    /// The caption document does not exist
    #[error("Caption document not found: {0}")]
    NotFound(String),
    /// The caption document could not be retrieved
    #[error("Failed to fetch caption document: {0}")]
    Fetch(String),
    /// The document does not have the expected shape
    #[error("Malformed caption document: {0}")]
    Malformed(String),
    /// A node has an empty or inverted time interval
    #[error("Invalid interval on {node}: [{start}, {end})")]
    InvalidInterval {
        /// Path of the offending node, e.g. `bubbles[0].speech[1]`
        node: String,
        /// Start time in seconds
        start: f64,
        /// End time in seconds
        end: f64,
    },
}

impl CaptionError {
    /// Whether this error means the document could not be retrieved at all,
    /// as opposed to being retrieved with a bad shape
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Fetch(_))
    }
}

impl From<serde_json::Error> for CaptionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
