//! Flow-control tuning.

use crate::error::PlaybackError;
use crate::rate::FrameRate;

/// How aggressively the player asks the producer for frames.
///
/// The margin is the headroom playback needs to keep running; requests keep
/// flowing until the buffer is `margin + slack` seconds ahead of the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowConfig {
    /// Frames asked for per request.
    pub chunk_size: usize,
    /// Seconds of unpresented frames required to keep playing.
    pub margin_seconds: u32,
    /// Extra seconds buffered beyond the margin before requests pause.
    pub slack_seconds: u32,
}

impl FlowConfig {
    pub const DEFAULT_CHUNK_SIZE: usize = 10;
    pub const DEFAULT_MARGIN_SECONDS: u32 = 2;
    pub const DEFAULT_SLACK_SECONDS: u32 = 1;

    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.chunk_size == 0 {
            return Err(PlaybackError::InvalidFlowConfig("chunk size must be positive"));
        }
        if self.margin_seconds == 0 {
            return Err(PlaybackError::InvalidFlowConfig("margin must be at least one second"));
        }
        Ok(())
    }

    pub fn margin_frames(&self, rate: FrameRate) -> usize {
        rate.frames_in(self.margin_seconds)
    }

    pub fn high_water_frames(&self, rate: FrameRate) -> usize {
        rate.frames_in(self.margin_seconds + self.slack_seconds)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            margin_seconds: Self::DEFAULT_MARGIN_SECONDS,
            slack_seconds: Self::DEFAULT_SLACK_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_margin_is_two_seconds() {
        let config = FlowConfig::default();
        assert_eq!(config.margin_frames(FrameRate::DEFAULT), 60);
        assert_eq!(config.high_water_frames(FrameRate::DEFAULT), 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_chunks() {
        let config = FlowConfig {
            chunk_size: 0,
            ..FlowConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::InvalidFlowConfig(_))));
    }
}
