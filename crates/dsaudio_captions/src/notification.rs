// SPDX-License-Identifier: MIT OR Apache-2.0
//! Enter/exit notifications and listener registration.

use crate::cue::{CueId, CueKind, CueTarget};
use crate::document::{Bubble, CaptionDocument, Speech, WordBoundary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Kind of notification dispatched to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Playback entered a bubble
    BubbleEnter,
    /// Playback left a bubble
    BubbleExit,
    /// Playback entered a speech segment
    SpeakEnter,
    /// Playback left a speech segment
    SpeakExit,
    /// Playback entered a word
    WordEnter,
    /// Playback left a word
    WordExit,
    /// Playback entered a syllable
    SyllableEnter,
    /// Playback left a syllable
    SyllableExit,
}

impl NotificationKind {
    /// Event name as seen by caption consumers, e.g. `onBubbleEnter`
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::BubbleEnter => "onBubbleEnter",
            Self::BubbleExit => "onBubbleExit",
            Self::SpeakEnter => "onSpeakEnter",
            Self::SpeakExit => "onSpeakExit",
            Self::WordEnter => "onWordEnter",
            Self::WordExit => "onWordExit",
            Self::SyllableEnter => "onSyllableEnter",
            Self::SyllableExit => "onSyllableExit",
        }
    }

    /// Cue kind this notification belongs to
    pub fn cue_kind(&self) -> CueKind {
        match self {
            Self::BubbleEnter | Self::BubbleExit => CueKind::Bubble,
            Self::SpeakEnter | Self::SpeakExit => CueKind::Speak,
            Self::WordEnter | Self::WordExit => CueKind::Word,
            Self::SyllableEnter | Self::SyllableExit => CueKind::Syllable,
        }
    }

    /// Whether this is an enter notification
    pub fn is_enter(&self) -> bool {
        matches!(
            self,
            Self::BubbleEnter | Self::SpeakEnter | Self::WordEnter | Self::SyllableEnter
        )
    }

    /// All notification kinds
    pub fn all() -> &'static [NotificationKind] {
        &[
            Self::BubbleEnter,
            Self::BubbleExit,
            Self::SpeakEnter,
            Self::SpeakExit,
            Self::WordEnter,
            Self::WordExit,
            Self::SyllableEnter,
            Self::SyllableExit,
        ]
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

/// A notification with back-references into the loaded document
#[derive(Debug, Clone)]
pub struct CueNotification {
    /// What happened
    pub kind: NotificationKind,
    /// Cue that triggered the notification
    pub cue: CueId,
    /// Playback position that triggered the notification
    pub position: f64,
    target: CueTarget,
    document: Arc<CaptionDocument>,
}

impl CueNotification {
    pub(crate) fn new(
        kind: NotificationKind,
        cue: CueId,
        position: f64,
        target: CueTarget,
        document: Arc<CaptionDocument>,
    ) -> Self {
        Self {
            kind,
            cue,
            position,
            target,
            document,
        }
    }

    /// Event name, e.g. `onWordExit`
    pub fn event_name(&self) -> &'static str {
        self.kind.event_name()
    }

    /// Bubble the cue belongs to
    pub fn bubble(&self) -> &Bubble {
        &self.document.bubbles[self.target.bubble]
    }

    /// Speech segment, for speak, word and syllable notifications
    pub fn speak(&self) -> Option<&Speech> {
        let speech = self.target.speech?;
        self.document.speech(self.target.bubble, speech)
    }

    /// Word, for word and syllable notifications
    pub fn word(&self) -> Option<&WordBoundary> {
        let speech = self.target.speech?;
        let word = self.target.word?;
        self.document.word(self.target.bubble, speech, word)
    }

    /// Positions of the originating node(s)
    pub fn target(&self) -> CueTarget {
        self.target
    }

    /// Document the cue was derived from
    pub fn document(&self) -> &Arc<CaptionDocument> {
        &self.document
    }
}

/// Unique identifier for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    /// Create a new random listener ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked for each dispatched notification
pub type Listener = Box<dyn FnMut(&CueNotification) + Send>;

struct Registration {
    id: ListenerId,
    filter: Option<NotificationKind>,
    callback: Listener,
}

/// Listener registry keyed by notification kind
#[derive(Default)]
pub struct Listeners {
    registrations: Vec<Registration>,
}

impl Listeners {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one notification kind
    pub fn on(
        &mut self,
        kind: NotificationKind,
        callback: impl FnMut(&CueNotification) + Send + 'static,
    ) -> ListenerId {
        self.register(Some(kind), Box::new(callback))
    }

    /// Register a listener for every notification kind
    pub fn on_any(&mut self, callback: impl FnMut(&CueNotification) + Send + 'static) -> ListenerId {
        self.register(None, Box::new(callback))
    }

    fn register(&mut self, filter: Option<NotificationKind>, callback: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.registrations.push(Registration { id, filter, callback });
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Deliver a notification to matching listeners in registration order
    pub fn dispatch(&mut self, notification: &CueNotification) {
        for registration in &mut self.registrations {
            if registration.filter.map_or(true, |kind| kind == notification.kind) {
                (registration.callback)(notification);
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.registrations.len())
            .finish()
    }
}
