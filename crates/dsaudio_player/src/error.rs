// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player error types.

use dsaudio_captions::CaptionError;

/// Errors surfaced by the player and its configuration
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Settings file could not be parsed or written
    #[error("Settings error: {0}")]
    Settings(String),
    /// Settings file was written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Caption source error
    #[error(transparent)]
    Caption(#[from] CaptionError),
}

/// Result alias for player operations
pub type PlayerResult<T> = Result<T, PlayerError>;
