// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback clock sources.

/// Source of the playback position.
///
/// Stands in for the media element: it knows where playback is, how long the
/// media runs, and can be started, paused and repositioned.
pub trait PlaybackClock {
    /// Current position in seconds
    fn current_position(&self) -> f64;
    /// Media length in seconds
    fn duration(&self) -> f64;
    /// Start or resume playback
    fn play(&mut self);
    /// Pause playback, keeping the position
    fn pause(&mut self);
    /// Move to `position` seconds
    fn seek(&mut self, position: f64);
    /// Whether playback is not advancing
    fn is_paused(&self) -> bool;
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped, either never started or ran to the end
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Clock advanced by explicit time steps
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    /// Current playback time
    time: f64,
    /// Media length
    duration: f64,
    /// Playback state
    pub state: PlaybackState,
    /// Playback speed multiplier
    pub speed: f64,
    /// Whether playback wraps around at the end
    pub looping: bool,
}

impl SimulatedClock {
    /// Create a stopped clock for media of the given length
    pub fn new(duration: f64) -> Self {
        Self {
            time: 0.0,
            duration: duration.max(0.0),
            state: PlaybackState::Stopped,
            speed: 1.0,
            looping: false,
        }
    }

    /// Set the playback speed
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Change the media length, clamping the position into it
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.time = self.time.min(self.duration);
    }

    /// Advance by `delta_time` seconds of wall-clock time
    pub fn update(&mut self, delta_time: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.time += delta_time * self.speed;

        if self.time >= self.duration {
            if self.looping && self.duration > 0.0 {
                self.time %= self.duration;
            } else {
                self.time = self.duration;
                self.state = PlaybackState::Stopped;
            }
        }
    }

    /// Stop and reset to the beginning
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
    }

    /// Whether the clock has run to the end of the media
    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Stopped && self.time >= self.duration
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl PlaybackClock for SimulatedClock {
    fn current_position(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn play(&mut self) {
        if self.time >= self.duration {
            self.time = 0.0;
        }
        self.state = PlaybackState::Playing;
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    fn seek(&mut self, position: f64) {
        self.time = position.clamp(0.0, self.duration);
    }

    fn is_paused(&self) -> bool {
        self.state != PlaybackState::Playing
    }
}
