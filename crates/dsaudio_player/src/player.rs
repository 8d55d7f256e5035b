// SPDX-License-Identifier: MIT OR Apache-2.0
//! Captioned audio player.
//!
//! Ties a playback clock, a gain stage and a caption source to a
//! [`CueScheduler`]. Each [`CaptionedPlayer::time_update`] call is one
//! position-changed tick: finished caption loads are applied first, then the
//! clock position is fed to the scheduler.

use crate::clock::PlaybackClock;
use crate::gain::GainControl;
use crate::settings::PlayerSettings;
use dsaudio_captions::{
    caption_reference_for, CaptionLoader, CueNotification, CueScheduler, CueSource, ListenerId,
    LoadOutcome, LoadStatus, LoadTicket, NotificationKind,
};
use std::sync::Arc;

/// Audio player that emits caption notifications as playback moves
pub struct CaptionedPlayer<C, G, S>
where
    C: PlaybackClock,
    G: GainControl,
    S: CueSource + ?Sized + 'static,
{
    clock: C,
    gain: G,
    scheduler: CueScheduler,
    loader: CaptionLoader<S>,
    settings: PlayerSettings,
    src: Option<String>,
    caption_reference: Option<String>,
    muted: bool,
}

impl<C, G, S> CaptionedPlayer<C, G, S>
where
    C: PlaybackClock,
    G: GainControl,
    S: CueSource + ?Sized + 'static,
{
    /// Create a player around injected clock, gain and caption source
    pub fn new(clock: C, mut gain: G, source: Arc<S>, settings: PlayerSettings) -> Self {
        gain.set_gain(settings.clamped_default_volume());
        Self {
            clock,
            gain,
            scheduler: CueScheduler::new(),
            loader: CaptionLoader::new(source),
            settings,
            src: None,
            caption_reference: None,
            muted: false,
        }
    }

    /// Switch to a new media source and start loading its captions.
    ///
    /// The previous captions stay live until the new document arrives. The
    /// fetch runs on the loader's own worker, so no runtime is needed here.
    pub fn set_src(&mut self, src: impl Into<String>) -> LoadTicket {
        let src = src.into();
        let reference = caption_reference_for(&src, &self.settings.caption_extension);
        tracing::info!("Media source set to {}, captions from {}", src, reference);

        self.clock.seek(0.0);
        if self.settings.autoplay {
            self.clock.play();
        }

        let ticket = self.scheduler.begin_load();
        self.loader.request(ticket, reference.clone());
        self.src = Some(src);
        self.caption_reference = Some(reference);
        ticket
    }

    /// Drop the media source and its captions
    pub fn clear_src(&mut self) {
        self.clock.pause();
        self.scheduler.clear();
        self.src = None;
        self.caption_reference = None;
    }

    /// Apply every caption load that has finished, without waiting
    pub fn poll_loads(&mut self) -> Vec<LoadStatus> {
        let mut statuses = Vec::new();
        while let Some(outcome) = self.loader.try_next() {
            statuses.push(self.apply(outcome));
        }
        statuses
    }

    /// Wait for outstanding caption loads until one is applied or fails.
    ///
    /// Returns `None` when no load is outstanding.
    pub async fn wait_for_captions(&mut self) -> Option<LoadStatus> {
        while let Some(outcome) = self.loader.next().await {
            match self.apply(outcome) {
                LoadStatus::Stale => continue,
                status => return Some(status),
            }
        }
        None
    }

    fn apply(&mut self, outcome: LoadOutcome) -> LoadStatus {
        let status = self.scheduler.finish_load(outcome.ticket, outcome.result);
        match &status {
            LoadStatus::Applied { cues } => {
                tracing::info!("Captions ready from {}: {} cues", outcome.reference, cues);
            }
            LoadStatus::Failed(err) if err.is_fetch_failure() => {
                tracing::warn!("File not found {}", outcome.reference);
            }
            LoadStatus::Failed(_) | LoadStatus::Stale => {}
        }
        status
    }

    /// One position-changed tick: apply finished loads, then dispatch
    /// notifications for the current clock position
    pub fn time_update(&mut self) -> Vec<CueNotification> {
        self.poll_loads();
        let position = self.clock.current_position();
        self.scheduler.on_time_update(position)
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        self.clock.play();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Toggle between playing and paused
    pub fn toggle_play(&mut self) {
        if self.clock.is_paused() {
            self.clock.play();
        } else {
            self.clock.pause();
        }
    }

    /// Move playback to `position` seconds
    pub fn seek_to(&mut self, position: f64) {
        self.clock.seek(position);
    }

    /// Current position in seconds
    pub fn current_time(&self) -> f64 {
        self.clock.current_position()
    }

    /// Media length in seconds
    pub fn duration(&self) -> f64 {
        self.clock.duration()
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Whether playback is advancing
    pub fn is_playing(&self) -> bool {
        !self.is_paused()
    }

    /// Current output gain
    pub fn volume(&self) -> f32 {
        self.gain.gain()
    }

    /// Set the output gain, limited to `[0, max_volume]`
    pub fn set_volume(&mut self, volume: f32) {
        self.gain
            .set_gain(volume.clamp(0.0, self.settings.max_volume.max(0.0)));
        self.muted = self.gain.gain() == 0.0;
    }

    /// Mute (`Some(true)`), unmute (`Some(false)`) or flip (`None`).
    ///
    /// Muting sets the gain to zero; unmuting restores the default volume.
    /// Returns whether the player is muted afterwards.
    pub fn toggle_mute(&mut self, muted: Option<bool>) -> bool {
        let muted = muted.unwrap_or(!self.muted);
        let gain = if muted {
            0.0
        } else {
            self.settings.clamped_default_volume()
        };
        self.gain.set_gain(gain);
        self.muted = muted;
        muted
    }

    /// Whether output is muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Register a listener for one notification kind
    pub fn on(
        &mut self,
        kind: NotificationKind,
        callback: impl FnMut(&CueNotification) + Send + 'static,
    ) -> ListenerId {
        self.scheduler.on(kind, callback)
    }

    /// Register a listener for every notification kind
    pub fn on_any(&mut self, callback: impl FnMut(&CueNotification) + Send + 'static) -> ListenerId {
        self.scheduler.on_any(callback)
    }

    /// Remove a listener
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.scheduler.off(id)
    }

    /// Current media source
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Caption document reference derived from the media source
    pub fn caption_reference(&self) -> Option<&str> {
        self.caption_reference.as_deref()
    }

    /// Caption scheduler
    pub fn scheduler(&self) -> &CueScheduler {
        &self.scheduler
    }

    /// Playback clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable playback clock
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Player settings
    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;
    use crate::gain::GainNode;
    use dsaudio_captions::{CaptionError, MemoryCueSource};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    type TestPlayer = CaptionedPlayer<SimulatedClock, GainNode, MemoryCueSource>;

    fn greeting() -> serde_json::Value {
        json!({ "bubbles": [ { "startTime": 0, "endTime": 2, "Native": "Hi", "speech": [
            { "startTime": 0, "endTime": 2, "text": "Hi", "wordBoundaries": [
                { "startTime": 0, "endTime": 1, "text": "Hi" } ] } ] } ] })
    }

    fn farewell() -> serde_json::Value {
        json!({ "bubbles": [ { "startTime": 0, "endTime": 3, "Native": "Bye", "speech": [] } ] })
    }

    fn player(source: MemoryCueSource) -> TestPlayer {
        let settings = PlayerSettings {
            autoplay: false,
            ..Default::default()
        };
        CaptionedPlayer::new(SimulatedClock::new(4.0), GainNode::default(), Arc::new(source), settings)
    }

    #[test]
    fn test_default_volume_applied() {
        let player = player(MemoryCueSource::new());
        assert_eq!(player.volume(), 0.4);
        assert!(!player.is_muted());
    }

    #[test]
    fn test_mute_toggle() {
        let mut player = player(MemoryCueSource::new());
        player.set_volume(1.2);

        assert!(player.toggle_mute(None));
        assert_eq!(player.volume(), 0.0);
        assert!(!player.toggle_mute(None));
        assert_eq!(player.volume(), 0.4);
        assert!(!player.toggle_mute(Some(false)));
        assert!(player.toggle_mute(Some(true)));

        player.set_volume(5.0);
        assert_eq!(player.volume(), 2.0);
        assert!(!player.is_muted());
    }

    #[test]
    fn test_play_pause_seek() {
        let mut player = player(MemoryCueSource::new());
        assert!(player.is_paused());
        player.toggle_play();
        assert!(player.is_playing());
        player.clock_mut().update(1.0);
        assert_eq!(player.current_time(), 1.0);
        player.toggle_play();
        assert!(player.is_paused());

        player.seek_to(3.5);
        assert_eq!(player.current_time(), 3.5);
        assert_eq!(player.duration(), 4.0);
    }

    #[tokio::test]
    async fn test_set_src_loads_companion_captions() {
        let source = MemoryCueSource::new();
        source.insert("audio/greeting.json", greeting());
        let mut player = player(source);

        let events = Arc::new(Mutex::new(Vec::new()));
        let log = events.clone();
        player.on_any(move |n| log.lock().push(n.event_name()));

        player.set_src("audio/greeting.mp3");
        assert_eq!(player.caption_reference(), Some("audio/greeting.json"));
        assert_eq!(
            player.wait_for_captions().await,
            Some(LoadStatus::Applied { cues: 3 })
        );

        player.play();
        for _ in 0..8 {
            player.time_update();
            player.clock_mut().update(0.25);
        }
        player.time_update();

        assert_eq!(
            *events.lock(),
            vec![
                "onBubbleEnter",
                "onSpeakEnter",
                "onWordEnter",
                "onWordExit",
                "onSpeakExit",
                "onBubbleExit",
            ]
        );
    }

    #[test]
    fn test_set_src_without_runtime() {
        let source = MemoryCueSource::new();
        source.insert("audio/greeting.json", greeting());
        let mut player = player(source);

        player.set_src("audio/greeting.mp3");

        let mut statuses = Vec::new();
        for _ in 0..400 {
            statuses = player.poll_loads();
            if !statuses.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(statuses, vec![LoadStatus::Applied { cues: 3 }]);

        player.play();
        assert_eq!(player.time_update().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_captions_do_not_block_playback() {
        let mut player = player(MemoryCueSource::new());
        player.set_src("audio/silent.mp3");

        let status = player.wait_for_captions().await;
        assert!(matches!(
            status,
            Some(LoadStatus::Failed(CaptionError::NotFound(_)))
        ));

        player.play();
        player.clock_mut().update(1.0);
        assert!(player.time_update().is_empty());
        assert_eq!(player.current_time(), 1.0);
    }

    #[tokio::test]
    async fn test_rapid_src_change_keeps_latest() {
        let source = MemoryCueSource::new();
        source.insert_delayed("a.json", farewell(), Duration::from_millis(40));
        source.insert("b.json", greeting());
        let mut player = player(source);

        player.set_src("a.mp3");
        player.set_src("b.mp3");
        assert_eq!(player.src(), Some("b.mp3"));

        assert_eq!(
            player.wait_for_captions().await,
            Some(LoadStatus::Applied { cues: 3 })
        );
        // The superseded fetch is drained and discarded
        assert_eq!(player.wait_for_captions().await, None);
        assert_eq!(
            player.scheduler().document().unwrap().bubbles[0].native,
            "Hi"
        );
    }

    #[tokio::test]
    async fn test_old_captions_live_until_new_arrive() {
        let source = MemoryCueSource::new();
        source.insert("a.json", greeting());
        source.insert_delayed("b.json", farewell(), Duration::from_millis(40));
        let mut player = player(source);

        player.set_src("a.mp3");
        player.wait_for_captions().await;
        player.set_src("b.mp3");

        // Still captioned by the first document while the second is in flight
        let notifications = player.time_update();
        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].bubble().native, "Hi");

        assert_eq!(
            player.wait_for_captions().await,
            Some(LoadStatus::Applied { cues: 1 })
        );
        let notifications = player.time_update();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].bubble().native, "Bye");
    }

    #[tokio::test]
    async fn test_clear_src_drops_captions() {
        let source = MemoryCueSource::new();
        source.insert("a.json", greeting());
        let mut player = player(source);

        player.set_src("a.mp3");
        player.wait_for_captions().await;
        player.clear_src();

        assert_eq!(player.scheduler().cue_count(), 0);
        assert!(player.src().is_none());
        assert!(player.time_update().is_empty());
    }
}
