// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cue definitions derived from a caption document.

use crate::document::CaptionDocument;
use crate::notification::NotificationKind;
use serde::{Deserialize, Serialize};

/// Identifier of a cue within one loaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CueId(pub usize);

/// Granularity of a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CueKind {
    /// A whole bubble
    Bubble,
    /// One speech segment
    Speak,
    /// One word
    Word,
    /// Syllable granularity of one word
    Syllable,
}

impl CueKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bubble => "Bubble",
            Self::Speak => "Speak",
            Self::Word => "Word",
            Self::Syllable => "Syllable",
        }
    }

    /// Nesting depth, 0 for the outermost kind
    pub fn depth(&self) -> u8 {
        match self {
            Self::Bubble => 0,
            Self::Speak => 1,
            Self::Word => 2,
            Self::Syllable => 3,
        }
    }

    /// Notification sent when playback enters a cue of this kind
    pub fn enter(&self) -> NotificationKind {
        match self {
            Self::Bubble => NotificationKind::BubbleEnter,
            Self::Speak => NotificationKind::SpeakEnter,
            Self::Word => NotificationKind::WordEnter,
            Self::Syllable => NotificationKind::SyllableEnter,
        }
    }

    /// Notification sent when playback leaves a cue of this kind
    pub fn exit(&self) -> NotificationKind {
        match self {
            Self::Bubble => NotificationKind::BubbleExit,
            Self::Speak => NotificationKind::SpeakExit,
            Self::Word => NotificationKind::WordExit,
            Self::Syllable => NotificationKind::SyllableExit,
        }
    }

    /// All kinds, outermost first
    pub fn all() -> &'static [CueKind] {
        &[Self::Bubble, Self::Speak, Self::Word, Self::Syllable]
    }
}

/// Position of the document node(s) a cue was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CueTarget {
    /// Bubble position
    pub bubble: usize,
    /// Speech position within the bubble
    pub speech: Option<usize>,
    /// Word position within the speech segment
    pub word: Option<usize>,
}

impl CueTarget {
    fn bubble(bubble: usize) -> Self {
        Self {
            bubble,
            speech: None,
            word: None,
        }
    }

    fn speech(bubble: usize, speech: usize) -> Self {
        Self {
            bubble,
            speech: Some(speech),
            word: None,
        }
    }

    fn word(bubble: usize, speech: usize, word: usize) -> Self {
        Self {
            bubble,
            speech: Some(speech),
            word: Some(word),
        }
    }
}

/// A time interval tracked against the playback position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Cue ID, equal to its position in the derived cue list
    pub id: CueId,
    /// Start time in seconds (inclusive)
    pub start_time: f64,
    /// End time in seconds (exclusive)
    pub end_time: f64,
    /// Display text
    pub text: String,
    /// Granularity
    pub kind: CueKind,
    /// Originating node(s)
    pub target: CueTarget,
}

impl Cue {
    /// Whether `position` lies in `[start_time, end_time)`
    pub fn contains(&self, position: f64) -> bool {
        self.start_time <= position && position < self.end_time
    }

    /// Length of the interval in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Derive the cue list for a document, in document order.
///
/// Each bubble, speech segment and word gets one cue. Words in a segment
/// flagged with `syllables` get a second, syllable-kind cue with the same
/// timing and text as the word cue.
pub fn derive_cues(document: &CaptionDocument) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut push = |start_time: f64, end_time: f64, text: &str, kind: CueKind, target: CueTarget| {
        cues.push(Cue {
            id: CueId(cues.len()),
            start_time,
            end_time,
            text: text.to_string(),
            kind,
            target,
        });
    };

    for (b, bubble) in document.bubbles.iter().enumerate() {
        push(bubble.start_time, bubble.end_time, &bubble.native, CueKind::Bubble, CueTarget::bubble(b));

        for (s, speak) in bubble.speech.iter().enumerate() {
            push(speak.start_time, speak.end_time, &speak.text, CueKind::Speak, CueTarget::speech(b, s));

            for (w, word) in speak.word_boundaries.iter().enumerate() {
                let target = CueTarget::word(b, s, w);
                push(word.start_time, word.end_time, &word.text, CueKind::Word, target);
                if speak.syllables {
                    push(word.start_time, word.end_time, &word.text, CueKind::Syllable, target);
                }
            }
        }
    }

    cues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Bubble, Speech, WordBoundary};

    fn word(start: f64, end: f64, text: &str) -> WordBoundary {
        WordBoundary {
            start_time: start,
            end_time: end,
            text: text.to_string(),
            bubble_word_index: 0,
        }
    }

    fn sample(syllables: bool) -> CaptionDocument {
        CaptionDocument {
            bubbles: vec![Bubble {
                start_time: 0.0,
                end_time: 2.0,
                native: "Good day".to_string(),
                speech: vec![Speech {
                    start_time: 0.0,
                    end_time: 2.0,
                    text: "Good day".to_string(),
                    syllables,
                    word_boundaries: vec![word(0.0, 1.0, "Good"), word(1.0, 2.0, "day")],
                }],
                index: 0,
            }],
        }
    }

    fn count(cues: &[Cue], kind: CueKind) -> usize {
        cues.iter().filter(|c| c.kind == kind).count()
    }

    #[test]
    fn test_one_cue_per_node() {
        let cues = derive_cues(&sample(false));
        assert_eq!(cues.len(), 4);
        assert_eq!(count(&cues, CueKind::Bubble), 1);
        assert_eq!(count(&cues, CueKind::Speak), 1);
        assert_eq!(count(&cues, CueKind::Word), 2);
        assert_eq!(count(&cues, CueKind::Syllable), 0);
    }

    #[test]
    fn test_syllable_cues_mirror_words() {
        let cues = derive_cues(&sample(true));
        assert_eq!(cues.len(), 6);

        let words: Vec<&Cue> = cues.iter().filter(|c| c.kind == CueKind::Word).collect();
        let syllables: Vec<&Cue> = cues.iter().filter(|c| c.kind == CueKind::Syllable).collect();
        assert_eq!(words.len(), syllables.len());
        for (w, s) in words.iter().zip(&syllables) {
            assert_eq!(w.start_time, s.start_time);
            assert_eq!(w.end_time, s.end_time);
            assert_eq!(w.text, s.text);
            assert_eq!(w.target, s.target);
        }
    }

    #[test]
    fn test_ids_follow_document_order() {
        let cues = derive_cues(&sample(true));
        let kinds: Vec<CueKind> = cues.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CueKind::Bubble,
                CueKind::Speak,
                CueKind::Word,
                CueKind::Syllable,
                CueKind::Word,
                CueKind::Syllable,
            ]
        );
        for (i, cue) in cues.iter().enumerate() {
            assert_eq!(cue.id, CueId(i));
        }
        assert_eq!(cues[4].target, CueTarget::word(0, 0, 1));
        assert_eq!(cues[0].text, "Good day");
    }

    #[test]
    fn test_half_open_contains() {
        let cues = derive_cues(&sample(false));
        let first_word = &cues[2];
        assert!(first_word.contains(0.0));
        assert!(first_word.contains(0.999));
        assert!(!first_word.contains(1.0));
        assert_eq!(first_word.duration(), 1.0);
    }

    #[test]
    fn test_empty_document() {
        assert!(derive_cues(&CaptionDocument::default()).is_empty());
    }

    #[test]
    fn test_kinds_outermost_first() {
        let depths: Vec<u8> = CueKind::all().iter().map(CueKind::depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3]);

        for kind in CueKind::all() {
            assert!(kind.enter().is_enter());
            assert!(!kind.exit().is_enter());
            assert_eq!(kind.enter().cue_kind(), *kind);
            assert_eq!(kind.exit().cue_kind(), *kind);
        }
    }
}
