//! Errors reported back to whoever drives the player.
//!
//! Stale data and starvation are not errors; they only show up in playback
//! state.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("invalid playback speed: {0}")]
    InvalidSpeed(String),

    #[error("frame rate must be positive")]
    ZeroFrameRate,

    #[error("frame rate {0} fps is above the supported maximum")]
    FrameRateTooHigh(u32),

    #[error("no stream selected")]
    NoSession,

    #[error("unknown video: {0}")]
    UnknownVideo(String),

    #[error("invalid flow configuration: {0}")]
    InvalidFlowConfig(&'static str),
}
