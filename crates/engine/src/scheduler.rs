//! Playback clock and state machine.
//!
//! - `Idle -> Playing` on play, once a session is selected.
//! - `Playing <-> Buffering` as ticks find the buffer short or refilled.
//! - `Playing/Buffering <-> Paused` on pause and play.
//! - `Playing -> Ended` when a complete stream runs out; play replays it.
//! - anything `-> Idle` on reset (session switch).
//!
//! Each tick presents exactly one frame or changes state; frames are never
//! skipped or batched. The tick period is `1 / (frame_rate * speed)`.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tv_common::{Frame, FrameRate, PlaybackError, Speed};

use crate::buffer::FrameBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Nothing requested for the current session yet.
    Idle,
    Playing,
    Paused,
    /// Playing, but holding the last frame until the buffer refills.
    Buffering,
    /// Every frame of a complete stream has been presented.
    Ended,
}

impl PlaybackStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Buffering => "Loading...",
            Self::Ended => "Ended",
        }
    }

    /// Whether the tick clock should be running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }
}

/// What a play request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// First play of the session; the producer has to be started.
    Started,
    Resumed,
    /// Restarted an ended stream from frame 0 using the buffered frames.
    Replayed,
    AlreadyPlaying,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame at this index is now current.
    Presented(usize),
    Buffering,
    Ended,
    /// Not playing; the tick was ignored.
    Inactive,
}

/// Read-only view of the playback state for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub is_playing: bool,
    pub ended: bool,
    pub buffering: bool,
    pub speed: Speed,
    pub frame_rate: FrameRate,
    pub tick_period: Duration,
}

#[derive(Debug)]
pub struct PlaybackScheduler {
    status: PlaybackStatus,
    speed: Speed,
    frame_rate: FrameRate,
    current: Option<(usize, Arc<Frame>)>,
}

impl PlaybackScheduler {
    pub fn new(speed: Speed) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            speed,
            frame_rate: FrameRate::DEFAULT,
            current: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// The frame on screen and its index, frozen while buffering, paused or
    /// ended.
    pub fn current(&self) -> Option<&(usize, Arc<Frame>)> {
        self.current.as_ref()
    }

    pub fn tick_period(&self) -> Duration {
        tick_period(self.frame_rate, self.speed)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            is_playing: self.status.is_active(),
            ended: self.status == PlaybackStatus::Ended,
            buffering: self.status == PlaybackStatus::Buffering,
            speed: self.speed,
            frame_rate: self.frame_rate,
            tick_period: self.tick_period(),
        }
    }

    pub fn play(&mut self, has_session: bool, buffer: &mut FrameBuffer) -> Result<PlayOutcome, PlaybackError> {
        let outcome = match self.status {
            PlaybackStatus::Idle => {
                if !has_session {
                    return Err(PlaybackError::NoSession);
                }
                PlayOutcome::Started
            }
            PlaybackStatus::Paused => PlayOutcome::Resumed,
            PlaybackStatus::Ended => {
                buffer.rewind();
                PlayOutcome::Replayed
            }
            PlaybackStatus::Playing | PlaybackStatus::Buffering => return Ok(PlayOutcome::AlreadyPlaying),
        };

        self.status = PlaybackStatus::Playing;
        debug!("Scheduler: play ({:?}) from frame {}", outcome, buffer.cursor());
        Ok(outcome)
    }

    /// Returns whether playback was actually paused.
    pub fn pause(&mut self) -> bool {
        if self.status.is_active() {
            self.status = PlaybackStatus::Paused;
            debug!("Scheduler: pause");
            true
        } else {
            false
        }
    }

    /// Advance by one frame, or change state.
    ///
    /// While the stream is incomplete a frame is only presented if at least
    /// `margin` unpresented frames remain behind it; otherwise playback
    /// freezes in `Buffering`.
    pub fn tick(&mut self, buffer: &mut FrameBuffer, margin: usize) -> TickOutcome {
        if !self.status.is_active() {
            return TickOutcome::Inactive;
        }

        if buffer.is_complete() && buffer.cursor() >= buffer.len() {
            self.status = PlaybackStatus::Ended;
            debug!("Scheduler: ended after {} frames", buffer.len());
            return TickOutcome::Ended;
        }

        let ready = buffer.is_complete() || buffer.remaining() > margin;
        if !ready {
            if self.status != PlaybackStatus::Buffering {
                debug!(
                    "Scheduler: buffering at frame {} ({} ahead, need {})",
                    buffer.cursor(),
                    buffer.remaining(),
                    margin
                );
            }
            self.status = PlaybackStatus::Buffering;
            return TickOutcome::Buffering;
        }

        match buffer.advance() {
            Some((index, frame)) => {
                self.status = PlaybackStatus::Playing;
                self.current = Some((index, frame));
                TickOutcome::Presented(index)
            }
            None => {
                self.status = PlaybackStatus::Buffering;
                TickOutcome::Buffering
            }
        }
    }

    /// Returns the new tick period when it changed.
    pub fn set_speed(&mut self, speed: Speed) -> Option<Duration> {
        if speed == self.speed {
            return None;
        }
        self.speed = speed;
        Some(self.tick_period())
    }

    /// Returns the new tick period when it changed.
    pub fn set_frame_rate(&mut self, rate: FrameRate) -> Option<Duration> {
        if rate == self.frame_rate {
            return None;
        }
        self.frame_rate = rate;
        Some(self.tick_period())
    }

    /// Back to `Idle` for a new session. Speed is a viewer preference and
    /// survives; the frame rate falls back to the default until the new
    /// summary arrives.
    pub fn reset(&mut self) {
        self.status = PlaybackStatus::Idle;
        self.frame_rate = FrameRate::DEFAULT;
        self.current = None;
    }

    /// Label for the play button.
    pub fn control_label(&self) -> &'static str {
        match self.status {
            PlaybackStatus::Ended => "REPLAY",
            PlaybackStatus::Playing | PlaybackStatus::Buffering => "STOP",
            PlaybackStatus::Idle | PlaybackStatus::Paused => "PLAY",
        }
    }
}

/// `(1000 / fps) ms / speed`, computed in integer nanoseconds. Never zero.
pub fn tick_period(rate: FrameRate, speed: Speed) -> Duration {
    let nanos = 1_000_000_000u128 * speed.denominator() as u128
        / (rate.fps() as u128 * speed.numerator() as u128);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX).max(1))
}
