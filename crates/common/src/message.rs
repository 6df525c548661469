//! Transport-facing intents.
//!
//! These carry the information of the wire messages without committing to a
//! wire format; the player binary maps them to and from JSON.

use crate::frame::{Frame, TrackedObject};
use crate::rate::FrameRate;
use crate::session::{SessionToken, StreamSession};

/// Decoded, structurally valid messages from the producer.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// One frame, tagged with the session it belongs to.
    Frame { token: SessionToken, frame: Frame },
    /// Videos (and tracker modes, if advertised) the producer can stream.
    StreamList {
        videos: Vec<String>,
        trackers: Vec<String>,
    },
    /// Metadata of the selected stream.
    Summary {
        frame_rate: FrameRate,
        known_objects: Vec<TrackedObject>,
    },
    /// The producer has sent the last frame of the session.
    StreamEnd { token: SessionToken },
    /// Acknowledges a `Control::StopBuffering`.
    BufferStopped,
}

/// Control messages sent to the producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Control {
    RequestFrames { count: usize },
    RequestSummary { session: StreamSession },
    StopBuffering,
    Play {
        session: StreamSession,
        token: SessionToken,
    },
}
