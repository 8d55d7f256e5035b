// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interval tracking against a playback position.
//!
//! An [`IntervalTracker`] is the platform piece that watches registered
//! intervals and reports when the playback position crosses into or out of
//! them. It is driven by coarse, irregular position updates: an interval
//! shorter than the update spacing can be skipped entirely, and nothing
//! assumes the position only moves forward.

use serde::{Deserialize, Serialize};

/// Handle of a registered interval watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchHandle(pub usize);

/// Direction of a boundary crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crossing {
    /// The position moved into the interval
    Enter,
    /// The position moved out of the interval
    Exit,
}

/// One watch changing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTransition {
    /// Watch that changed
    pub handle: WatchHandle,
    /// Direction of the change
    pub crossing: Crossing,
}

/// Platform mechanism that reports interval enter/exit as the position moves
pub trait IntervalTracker {
    /// Start watching `[start, end)`
    fn register_interval_watch(&mut self, start: f64, end: f64) -> WatchHandle;

    /// Drop every watch without reporting exits
    fn clear(&mut self);

    /// Evaluate all watches at a new position and report the ones whose
    /// state changed. Order of the returned transitions is unspecified.
    fn advance(&mut self, position: f64) -> Vec<IntervalTransition>;

    /// Number of registered watches
    fn watch_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Watch {
    start: f64,
    end: f64,
    active: bool,
}

/// Default tracker: half-open intervals, state derived only from the latest
/// position.
///
/// A watch is active exactly when the last position lies in its interval, so
/// a backward seek into an interval that was already entered and left
/// reports a fresh enter.
#[derive(Debug, Clone, Default)]
pub struct TextTrack {
    watches: Vec<Watch>,
    position: Option<f64>,
}

impl TextTrack {
    /// Create an empty track
    pub fn new() -> Self {
        Self::default()
    }

    /// Last position passed to [`IntervalTracker::advance`]
    pub fn position(&self) -> Option<f64> {
        self.position
    }

    /// Handles of the currently active watches, in registration order
    pub fn active_handles(&self) -> Vec<WatchHandle> {
        self.watches
            .iter()
            .enumerate()
            .filter(|(_, w)| w.active)
            .map(|(i, _)| WatchHandle(i))
            .collect()
    }
}

impl IntervalTracker for TextTrack {
    fn register_interval_watch(&mut self, start: f64, end: f64) -> WatchHandle {
        self.watches.push(Watch {
            start,
            end,
            active: false,
        });
        WatchHandle(self.watches.len() - 1)
    }

    fn clear(&mut self) {
        self.watches.clear();
    }

    fn advance(&mut self, position: f64) -> Vec<IntervalTransition> {
        if position.is_nan() {
            tracing::debug!("Ignoring NaN playback position");
            return Vec::new();
        }
        self.position = Some(position);

        let mut transitions = Vec::new();
        for (i, watch) in self.watches.iter_mut().enumerate() {
            let inside = watch.start <= position && position < watch.end;
            if inside == watch.active {
                continue;
            }
            watch.active = inside;
            transitions.push(IntervalTransition {
                handle: WatchHandle(i),
                crossing: if inside { Crossing::Enter } else { Crossing::Exit },
            });
        }
        transitions
    }

    fn watch_count(&self) -> usize {
        self.watches.len()
    }
}
