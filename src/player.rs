//! Playback seam between the views and whatever actually plays the media.
//!
//! The views only talk to [MediaPlayer] and [PlaybackController]. The
//! controller samples the player on a coarse clock and is the only place
//! that writes the sampled position, watches for a playing segment's end,
//! and picks the transcript scroll target.

use std::time::Instant;

use crate::transcript;
use crate::types::{Msecs, Segment, TimeMarker};

const POLL_INTERVAL_MS: u128 = 100;
const REWIND_STEP_MS: Msecs = 3000;

pub trait MediaPlayer {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn position_ms(&self) -> Msecs;
    fn duration_ms(&self) -> Msecs;
    /// Jump to a fraction of the duration, in `0.0..=1.0`.
    fn seek_fraction(&mut self, fraction: f32);
}

/// Wall-clock stand-in for a real media backend. Advances its position in
/// real time while "playing" and stops advancing at the duration.
#[derive(Debug)]
pub struct SimulatedPlayer {
    duration_ms: Msecs,
    base_ms: Msecs,
    playing: bool,
    resumed_at: Option<Instant>,
}

impl SimulatedPlayer {
    pub fn new(duration_ms: Msecs) -> Self {
        SimulatedPlayer {
            duration_ms: duration_ms.max(0),
            base_ms: 0,
            playing: false,
            resumed_at: None,
        }
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.resumed_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base_ms = self.position_ms();
        self.playing = false;
        self.resumed_at = None;
    }

    fn stop(&mut self) {
        self.base_ms = 0;
        self.playing = false;
        self.resumed_at = None;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position_ms(&self) -> Msecs {
        let elapsed = self
            .resumed_at
            .map(|at| at.elapsed().as_millis() as Msecs)
            .unwrap_or(0);
        (self.base_ms + elapsed).min(self.duration_ms)
    }

    fn duration_ms(&self) -> Msecs {
        self.duration_ms
    }

    fn seek_fraction(&mut self, fraction: f32) {
        let target = (fraction as f64 * self.duration_ms as f64) as Msecs;
        self.base_ms = target.clamp(0, self.duration_ms);
        if self.playing {
            self.resumed_at = Some(Instant::now());
        }
    }
}

/// What one controller poll produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub position_ms: Msecs,
    /// Transcript char offset to scroll to, when a timestamp pair brackets
    /// the position.
    pub scroll_to: Option<usize>,
    /// True when a watched segment end was passed and playback was paused.
    pub segment_ended: bool,
}

#[derive(Debug, Default)]
pub struct PlaybackController {
    last_poll: Option<Instant>,
    sampled_position_ms: Msecs,
    watch_end_ms: Option<Msecs>,
}

impl PlaybackController {
    /// Sample the player at most every 100ms. Returns `None` between
    /// samples.
    pub fn poll(
        &mut self,
        player: &mut dyn MediaPlayer,
        markers: &[TimeMarker],
    ) -> Option<PollOutcome> {
        if let Some(last) = self.last_poll {
            if last.elapsed().as_millis() < POLL_INTERVAL_MS {
                return None;
            }
        }
        self.last_poll = Some(Instant::now());
        self.sampled_position_ms = player.position_ms();

        let mut segment_ended = false;
        if let Some(end) = self.watch_end_ms {
            if self.sampled_position_ms > end {
                player.pause();
                self.watch_end_ms = None;
                segment_ended = true;
            }
        }

        let scroll_to = if player.is_playing() {
            transcript::scroll_target_for_time(markers, self.sampled_position_ms)
        } else {
            None
        };

        Some(PollOutcome {
            position_ms: self.sampled_position_ms,
            scroll_to,
            segment_ended,
        })
    }

    /// Last sampled position; the views never read the player directly.
    pub fn position_ms(&self) -> Msecs {
        self.sampled_position_ms
    }

    /// Jump to a segment's start and watch for its end.
    pub fn play_segment(&mut self, player: &mut dyn MediaPlayer, segment: &Segment) {
        let duration = player.duration_ms();
        if duration <= 0 {
            return;
        }
        let fraction = segment.start_ms as f32 / duration as f32;
        player.play();
        player.seek_fraction(fraction);
        self.watch_end_ms = Some(segment.end_ms);
    }

    /// Toggle playback. Pressing the button abandons any watched segment
    /// end.
    pub fn play_pause(&mut self, player: &mut dyn MediaPlayer) {
        self.watch_end_ms = None;
        if player.is_playing() {
            player.pause();
        } else {
            player.play();
        }
    }

    pub fn stop(&mut self, player: &mut dyn MediaPlayer) {
        player.stop();
        self.watch_end_ms = None;
        self.sampled_position_ms = 0;
    }

    /// Skip back three seconds, clamped to the start.
    pub fn rewind(&mut self, player: &mut dyn MediaPlayer) {
        let duration = player.duration_ms();
        if duration <= 0 {
            return;
        }
        let target = (player.position_ms() - REWIND_STEP_MS).max(0);
        player.seek_fraction(target as f32 / duration as f32);
    }
}
