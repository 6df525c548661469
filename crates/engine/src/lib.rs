//! Buffering and playback engine.
//!
//! - [`FrameBuffer`]: append-only frames of one session plus the read cursor.
//! - [`FlowController`]: paces frame requests toward the producer.
//! - [`PlaybackScheduler`]: per-tick state machine over the buffer.
//! - [`Player`]: owns all three for the selected session and applies events
//!   to them one at a time.

pub mod buffer;
pub mod flow;
pub mod player;
pub mod scheduler;

pub use buffer::FrameBuffer;
pub use flow::FlowController;
pub use player::{Command, Effects, Player, PlayerEvent, PlayerSettings, PlayerSnapshot, TimerChange};
pub use scheduler::{tick_period, PlayOutcome, PlaybackScheduler, PlaybackSnapshot, PlaybackStatus, TickOutcome};
