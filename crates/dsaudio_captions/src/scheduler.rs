// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cue scheduler: turns interval tracker crossings into caption notifications.

use crate::cue::{derive_cues, Cue, CueId};
use crate::document::CaptionDocument;
use crate::error::{CaptionError, CaptionResult};
use crate::notification::{CueNotification, ListenerId, Listeners, NotificationKind};
use crate::tracker::{Crossing, IntervalTracker, TextTrack, WatchHandle};
use std::collections::HashMap;
use std::sync::Arc;

/// Token identifying one asynchronous load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Sequence number of the request
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Outcome of completing a load request
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// The document replaced the previous cue set
    Applied {
        /// Number of cues now registered
        cues: usize,
    },
    /// The document was missing or unusable; no cues are registered
    Failed(CaptionError),
    /// A newer request superseded this one; nothing changed
    Stale,
}

/// Schedules caption cues against a playback position.
///
/// Cues are derived from a [`CaptionDocument`], registered with an
/// [`IntervalTracker`], and each crossing reported by the tracker is turned
/// into a [`CueNotification`] delivered to listeners. Within one position
/// update, exits are delivered before enters; enters go outermost kind first
/// and exits go innermost kind first.
pub struct CueScheduler<T: IntervalTracker = TextTrack> {
    tracker: T,
    document: Option<Arc<CaptionDocument>>,
    cues: Vec<Cue>,
    watches: HashMap<WatchHandle, CueId>,
    active: Vec<bool>,
    listeners: Listeners,
    generation: u64,
    pending: Option<LoadTicket>,
}

impl CueScheduler<TextTrack> {
    /// Create a scheduler backed by the default [`TextTrack`]
    pub fn new() -> Self {
        Self::with_tracker(TextTrack::new())
    }
}

impl Default for CueScheduler<TextTrack> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IntervalTracker> CueScheduler<T> {
    /// Create a scheduler backed by the given tracker
    pub fn with_tracker(tracker: T) -> Self {
        Self {
            tracker,
            document: None,
            cues: Vec::new(),
            watches: HashMap::new(),
            active: Vec::new(),
            listeners: Listeners::new(),
            generation: 0,
            pending: None,
        }
    }

    /// Replace the current cue set with one derived from `document`.
    ///
    /// Supersedes any outstanding load request. A document with an empty or
    /// inverted interval is rejected with a warning and leaves zero cues.
    ///
    /// Cues active at the time of the swap are dropped without exit
    /// notifications. The new cues start inactive; the next position update
    /// fires enters for those containing it.
    pub fn load(&mut self, document: CaptionDocument) {
        self.generation += 1;
        self.pending = None;
        if let Err(err) = self.install(document) {
            tracing::warn!("Caption document rejected, continuing uncaptioned: {}", err);
        }
    }

    /// Start an asynchronous load. The current cues stay live until the
    /// returned ticket is passed to [`Self::finish_load`].
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket(self.generation);
        self.pending = Some(ticket);
        tracing::debug!("Caption load {} started", ticket.0);
        ticket
    }

    /// Complete a load started with [`Self::begin_load`].
    ///
    /// Only the most recent request is applied; results for superseded
    /// requests are discarded. A fetch failure or malformed document clears
    /// the cue set.
    ///
    /// Applying or failing a load drops the previous cues without exit
    /// notifications, as [`Self::load`] does.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: CaptionResult<CaptionDocument>,
    ) -> LoadStatus {
        if self.pending != Some(ticket) {
            tracing::debug!("Discarding stale caption load {}", ticket.0);
            return LoadStatus::Stale;
        }
        self.pending = None;

        let outcome = result.and_then(|document| self.install(document));
        match outcome {
            Ok(cues) => LoadStatus::Applied { cues },
            Err(err) => {
                tracing::warn!("Captions unavailable, continuing uncaptioned: {}", err);
                self.reset();
                LoadStatus::Failed(err)
            }
        }
    }

    /// Whether a load request is outstanding
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Discard all cues and supersede any outstanding load.
    ///
    /// Active cues are dropped silently; no exit notifications are sent.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.tracker.clear();
        self.document = None;
        self.cues.clear();
        self.watches.clear();
        self.active.clear();
    }

    fn install(&mut self, mut document: CaptionDocument) -> CaptionResult<usize> {
        if let Err(err) = document.validate() {
            self.reset();
            return Err(err);
        }
        document.annotate();
        let cues = derive_cues(&document);

        // Swap in one step so old and new cues are never live together
        self.tracker.clear();
        let mut watches = HashMap::with_capacity(cues.len());
        for cue in &cues {
            let handle = self
                .tracker
                .register_interval_watch(cue.start_time, cue.end_time);
            watches.insert(handle, cue.id);
        }

        tracing::info!(
            "Loaded caption document: {} bubbles, {} cues",
            document.bubbles.len(),
            cues.len()
        );

        let count = cues.len();
        self.active = vec![false; count];
        self.cues = cues;
        self.watches = watches;
        self.document = Some(Arc::new(document));
        Ok(count)
    }

    /// Feed a new playback position and dispatch the resulting notifications.
    ///
    /// Positions may arrive at any spacing and in any order. The dispatched
    /// notifications are also returned, in delivery order.
    pub fn on_time_update(&mut self, position: f64) -> Vec<CueNotification> {
        let transitions = self.tracker.advance(position);
        let Some(document) = self.document.clone() else {
            return Vec::new();
        };

        let mut crossed: Vec<(Crossing, &Cue)> = transitions
            .iter()
            .filter_map(|t| {
                let id = self.watches.get(&t.handle)?;
                Some((t.crossing, self.cues.get(id.0)?))
            })
            .collect();
        crossed.sort_by_key(|(crossing, cue)| dispatch_order(*crossing, cue));

        let notifications: Vec<CueNotification> = crossed
            .into_iter()
            .map(|(crossing, cue)| {
                let kind = match crossing {
                    Crossing::Enter => cue.kind.enter(),
                    Crossing::Exit => cue.kind.exit(),
                };
                CueNotification::new(kind, cue.id, position, cue.target, document.clone())
            })
            .collect();

        for notification in &notifications {
            if let Some(flag) = self.active.get_mut(notification.cue.0) {
                *flag = notification.kind.is_enter();
            }
            tracing::trace!(
                "{} at {:.3}s ({:?})",
                notification.event_name(),
                position,
                notification.cue
            );
            self.listeners.dispatch(notification);
        }

        notifications
    }

    /// Register a listener for one notification kind
    pub fn on(
        &mut self,
        kind: NotificationKind,
        callback: impl FnMut(&CueNotification) + Send + 'static,
    ) -> ListenerId {
        self.listeners.on(kind, callback)
    }

    /// Register a listener for every notification kind
    pub fn on_any(&mut self, callback: impl FnMut(&CueNotification) + Send + 'static) -> ListenerId {
        self.listeners.on_any(callback)
    }

    /// Remove a listener
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    /// Registered cues, in document order
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Get a cue by ID
    pub fn cue(&self, id: CueId) -> Option<&Cue> {
        self.cues.get(id.0)
    }

    /// Number of registered cues
    pub fn cue_count(&self) -> usize {
        self.cues.len()
    }

    /// Cues the playback position is currently inside
    pub fn active_cues(&self) -> impl Iterator<Item = &Cue> {
        self.cues
            .iter()
            .zip(&self.active)
            .filter(|(_, active)| **active)
            .map(|(cue, _)| cue)
    }

    /// Currently loaded document, with indices assigned
    pub fn document(&self) -> Option<&Arc<CaptionDocument>> {
        self.document.as_ref()
    }

    /// Underlying interval tracker
    pub fn tracker(&self) -> &T {
        &self.tracker
    }
}

impl<T: IntervalTracker> std::fmt::Debug for CueScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueScheduler")
            .field("cues", &self.cues.len())
            .field("listeners", &self.listeners)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Sort key: exits before enters, enters outermost first, exits innermost
/// first, then document order.
fn dispatch_order(crossing: Crossing, cue: &Cue) -> (u8, u8, CueId) {
    let depth = cue.kind.depth();
    match crossing {
        Crossing::Exit => (0, u8::MAX - depth, cue.id),
        Crossing::Enter => (1, depth, cue.id),
    }
}
