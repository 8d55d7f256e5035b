// SPDX-License-Identifier: MIT OR Apache-2.0
//! Captioned audio playback control for dsaudio.
//!
//! Provides the pieces around the caption scheduler:
//! - Playback clock abstraction with a simulated implementation
//! - Gain control with volume and mute
//! - Player settings stored as RON
//! - [`CaptionedPlayer`], which wires them to a caption source

pub mod clock;
pub mod error;
pub mod gain;
pub mod player;
pub mod settings;

pub use clock::{PlaybackClock, PlaybackState, SimulatedClock};
pub use error::{PlayerError, PlayerResult};
pub use gain::{GainControl, GainNode};
pub use player::CaptionedPlayer;
pub use settings::{PlayerSettings, SETTINGS_FILE_NAME, SETTINGS_FORMAT_VERSION};
