// SPDX-License-Identifier: MIT OR Apache-2.0
//! Caption cue scheduling for dsaudio.
//!
//! This crate keeps a hierarchy of timed captions in step with a playback
//! position:
//! - Bubbles (whole utterances)
//! - Speech segments
//! - Words
//! - Syllables
//!
//! ## Architecture
//!
//! A [`CaptionDocument`] is flattened into [`Cue`]s, each registered with an
//! [`IntervalTracker`]. The [`CueScheduler`] translates the tracker's
//! enter/exit crossings into typed [`CueNotification`]s whose payload points
//! back into the loaded document. Documents are fetched through a
//! [`CueSource`] by the [`CaptionLoader`]; only the latest request is ever
//! applied.

pub mod cue;
pub mod document;
pub mod error;
pub mod notification;
pub mod scheduler;
pub mod source;
pub mod tracker;

pub use cue::{derive_cues, Cue, CueId, CueKind, CueTarget};
pub use document::{Bubble, CaptionDocument, Speech, WordBoundary};
pub use error::{CaptionError, CaptionResult};
pub use notification::{CueNotification, Listener, ListenerId, Listeners, NotificationKind};
pub use scheduler::{CueScheduler, LoadStatus, LoadTicket};
#[cfg(feature = "http")]
pub use source::HttpCueSource;
pub use source::{caption_reference_for, CaptionLoader, CueSource, FileCueSource, LoadOutcome, MemoryCueSource};
pub use tracker::{Crossing, IntervalTracker, IntervalTransition, TextTrack, WatchHandle};
