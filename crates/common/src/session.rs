//! Stream sessions and the tokens that tie traffic to them.

use std::fmt;

/// Identifies one video + tracker selection.
///
/// Every switch produces a new token; inbound data carrying an older token is
/// stale and gets dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(pub u64);

impl SessionToken {
    /// Token used before any stream has been selected.
    pub const NONE: SessionToken = SessionToken(0);

    pub fn next(self) -> Self {
        SessionToken(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The currently selected video and analysis mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StreamSession {
    pub video: String,
    pub tracker: String,
}

impl StreamSession {
    pub fn new(video: impl Into<String>, tracker: impl Into<String>) -> Self {
        Self {
            video: video.into(),
            tracker: tracker.into(),
        }
    }

    pub fn with_video(&self, video: impl Into<String>) -> Self {
        Self::new(video, self.tracker.clone())
    }

    pub fn with_tracker(&self, tracker: impl Into<String>) -> Self {
        Self::new(self.video.clone(), tracker)
    }
}

impl fmt::Display for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.video, self.tracker)
    }
}
