// SPDX-License-Identifier: MIT OR Apache-2.0
//! Caption document model.
//!
//! Mirrors the JSON produced by the caption-generation pipeline:
//!
//! ```json
//! { "bubbles": [ { "startTime": 0.0, "endTime": 2.0, "Native": "Hi",
//!     "speech": [ { "startTime": 0.0, "endTime": 2.0, "text": "Hi",
//!         "wordBoundaries": [ { "startTime": 0.0, "endTime": 1.0, "text": "Hi" } ] } ] } ] }
//! ```
//!
//! The `Native` field keeps its capitalized name on the wire.

use crate::error::{CaptionError, CaptionResult};
use serde::{Deserialize, Serialize};

/// Root of an ingested caption document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionDocument {
    /// Top-level utterances, in playback order
    pub bubbles: Vec<Bubble>,
}

/// One top-level utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    /// Display text
    #[serde(rename = "Native")]
    pub native: String,
    /// Spoken segments inside this bubble
    pub speech: Vec<Speech>,
    /// Position in the document, assigned at ingestion
    #[serde(skip)]
    pub index: usize,
}

/// One spoken segment inside a bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speech {
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    /// Segment text
    pub text: String,
    /// Whether syllable-level cues are emitted for this segment's words
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub syllables: bool,
    /// Words spoken in this segment
    pub word_boundaries: Vec<WordBoundary>,
}

/// One word inside a speech segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordBoundary {
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    /// Word text
    pub text: String,
    /// Position of this word among all words of the enclosing bubble,
    /// assigned at ingestion
    #[serde(skip)]
    pub bubble_word_index: usize,
}

impl CaptionDocument {
    /// Parse a document from JSON text
    pub fn from_json_str(json: &str) -> CaptionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a document from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> CaptionResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Convert an already decoded JSON value into a document
    pub fn from_value(value: serde_json::Value) -> CaptionResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Check that every node spans a finite, non-empty interval
    pub fn validate(&self) -> CaptionResult<()> {
        for (b, bubble) in self.bubbles.iter().enumerate() {
            check_interval(bubble.start_time, bubble.end_time, || format!("bubbles[{b}]"))?;
            for (s, speak) in bubble.speech.iter().enumerate() {
                check_interval(speak.start_time, speak.end_time, || {
                    format!("bubbles[{b}].speech[{s}]")
                })?;
                for (w, word) in speak.word_boundaries.iter().enumerate() {
                    check_interval(word.start_time, word.end_time, || {
                        format!("bubbles[{b}].speech[{s}].wordBoundaries[{w}]")
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Assign `index` to every bubble and `bubble_word_index` to every word.
    ///
    /// Word indices restart at zero for each bubble and run across all of its
    /// speech segments in document order.
    pub fn annotate(&mut self) {
        for (index, bubble) in self.bubbles.iter_mut().enumerate() {
            bubble.index = index;
            let mut bubble_word_index = 0;
            for speak in &mut bubble.speech {
                for word in &mut speak.word_boundaries {
                    word.bubble_word_index = bubble_word_index;
                    bubble_word_index += 1;
                }
            }
        }
    }

    /// Whether the document has no bubbles
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Get a bubble by position
    pub fn bubble(&self, bubble: usize) -> Option<&Bubble> {
        self.bubbles.get(bubble)
    }

    /// Get a speech segment by bubble and segment position
    pub fn speech(&self, bubble: usize, speech: usize) -> Option<&Speech> {
        self.bubble(bubble)?.speech.get(speech)
    }

    /// Get a word by bubble, segment and word position
    pub fn word(&self, bubble: usize, speech: usize, word: usize) -> Option<&WordBoundary> {
        self.speech(bubble, speech)?.word_boundaries.get(word)
    }

    /// Latest end time of any bubble, or zero for an empty document
    pub fn end_time(&self) -> f64 {
        self.bubbles.iter().map(|b| b.end_time).fold(0.0, f64::max)
    }
}

impl Bubble {
    /// Total number of words across all speech segments
    pub fn word_count(&self) -> usize {
        self.speech.iter().map(|s| s.word_boundaries.len()).sum()
    }
}

fn check_interval(start: f64, end: f64, node: impl FnOnce() -> String) -> CaptionResult<()> {
    if start.is_finite() && end.is_finite() && end > start {
        Ok(())
    } else {
        Err(CaptionError::InvalidInterval {
            node: node(),
            start,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BUBBLES: &str = r#"{
        "bubbles": [
            { "startTime": 0, "endTime": 3, "Native": "Hello there",
              "speech": [
                { "startTime": 0, "endTime": 1.5, "text": "Hello",
                  "wordBoundaries": [ { "startTime": 0, "endTime": 1.5, "text": "Hello" } ] },
                { "startTime": 1.5, "endTime": 3, "text": "there friend", "syllables": true,
                  "wordBoundaries": [
                    { "startTime": 1.5, "endTime": 2.2, "text": "there" },
                    { "startTime": 2.2, "endTime": 3, "text": "friend" } ] } ] },
            { "startTime": 3, "endTime": 4, "Native": "Bye",
              "speech": [
                { "startTime": 3, "endTime": 4, "text": "Bye",
                  "wordBoundaries": [ { "startTime": 3, "endTime": 4, "text": "Bye" } ] } ] }
        ]
    }"#;

    #[test]
    fn test_parse_native_field() {
        let doc = CaptionDocument::from_json_str(TWO_BUBBLES).unwrap();
        assert_eq!(doc.bubbles.len(), 2);
        assert_eq!(doc.bubbles[0].native, "Hello there");
        assert!(doc.bubbles[0].speech[1].syllables);
        assert!(!doc.bubbles[0].speech[0].syllables);
        assert_eq!(doc.end_time(), 4.0);
    }

    #[test]
    fn test_parse_from_bytes() {
        let from_bytes = CaptionDocument::from_slice(TWO_BUBBLES.as_bytes()).unwrap();
        assert_eq!(from_bytes, CaptionDocument::from_json_str(TWO_BUBBLES).unwrap());

        let err = CaptionDocument::from_slice(b"{ \"bubbles\": 3 }").unwrap_err();
        assert!(matches!(err, CaptionError::Malformed(_)));
    }

    #[test]
    fn test_serialize_keeps_wire_names() {
        let doc = CaptionDocument::from_json_str(TWO_BUBBLES).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        let bubble = &value["bubbles"][0];
        assert_eq!(bubble["Native"], "Hello there");
        assert!(bubble.get("index").is_none());
        assert!(bubble["speech"][0].get("wordBoundaries").is_some());
        assert_eq!(bubble["speech"][0]["startTime"], 0.0);
    }

    #[test]
    fn test_missing_bubbles_is_malformed() {
        let err = CaptionDocument::from_json_str(r#"{ "lines": [] }"#).unwrap_err();
        assert!(matches!(err, CaptionError::Malformed(_)));
        assert!(!err.is_fetch_failure());
    }

    #[test]
    fn test_annotate_indices() {
        let mut doc = CaptionDocument::from_json_str(TWO_BUBBLES).unwrap();
        doc.annotate();

        assert_eq!(doc.bubbles[0].index, 0);
        assert_eq!(doc.bubbles[1].index, 1);

        let first: Vec<usize> = doc.bubbles[0]
            .speech
            .iter()
            .flat_map(|s| s.word_boundaries.iter().map(|w| w.bubble_word_index))
            .collect();
        assert_eq!(first, vec![0, 1, 2]);

        // Restarts for the next bubble
        assert_eq!(doc.word(1, 0, 0).unwrap().bubble_word_index, 0);
        assert_eq!(doc.bubbles[0].word_count(), 3);
    }

    #[test]
    fn test_validate_rejects_zero_length() {
        let mut doc = CaptionDocument::from_json_str(TWO_BUBBLES).unwrap();
        assert!(doc.validate().is_ok());

        doc.bubbles[1].speech[0].word_boundaries[0].end_time = 3.0;
        match doc.validate() {
            Err(CaptionError::InvalidInterval { node, start, end }) => {
                assert_eq!(node, "bubbles[1].speech[0].wordBoundaries[0]");
                assert_eq!(start, 3.0);
                assert_eq!(end, 3.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut doc = CaptionDocument::from_json_str(TWO_BUBBLES).unwrap();
        doc.bubbles[0].end_time = f64::NAN;
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_lookup_out_of_range() {
        let doc = CaptionDocument::from_json_str(TWO_BUBBLES).unwrap();
        assert!(doc.bubble(2).is_none());
        assert!(doc.speech(0, 5).is_none());
        assert!(doc.word(0, 1, 2).is_none());
        assert_eq!(doc.word(0, 1, 1).unwrap().text, "friend");
    }
}
