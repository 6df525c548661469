//! Validated runtime configuration.

use std::time::Duration;

use tv_common::{FlowConfig, PlaybackError, Speed};
use tv_engine::PlayerSettings;
use tv_overlay::LabelOptions;

use crate::transport::TransportConfig;

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub url: String,
    pub reconnect_delay: Duration,
    pub flow: FlowConfig,
    pub speed: Speed,
    pub tracker: String,
    pub labels: LabelOptions,
    /// Start playing as soon as the first stream is selected.
    pub autoplay: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8765".to_string(),
            reconnect_delay: Duration::from_secs(2),
            flow: FlowConfig::default(),
            speed: Speed::NORMAL,
            tracker: "bytetrack".to_string(),
            labels: LabelOptions::default(),
            autoplay: false,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), PlaybackError> {
        self.flow.validate()?;
        if self.tracker.trim().is_empty() {
            return Err(PlaybackError::InvalidFlowConfig("tracker mode must not be empty"));
        }
        if self.reconnect_delay.is_zero() {
            return Err(PlaybackError::InvalidFlowConfig("reconnect delay must be positive"));
        }
        Ok(())
    }

    pub fn settings(&self) -> PlayerSettings {
        PlayerSettings {
            flow: self.flow,
            speed: self.speed,
            default_tracker: self.tracker.clone(),
            labels: self.labels,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            url: self.url.clone(),
            reconnect_delay: self.reconnect_delay,
        }
    }
}
