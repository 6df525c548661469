//! Shared types for the trackview workspace.
//!
//! Everything the buffering engine, the overlay projection and the player
//! binary agree on lives here: the frame/annotation data model, stream
//! sessions and their tokens, rate types, the transport-facing intents and
//! flow-control configuration.

pub mod config;
pub mod error;
pub mod frame;
pub mod message;
pub mod rate;
pub mod session;

pub use config::FlowConfig;
pub use error::PlaybackError;
pub use frame::{Annotation, BoundingBox, Frame, Point, TrackedObject};
pub use message::{Control, Inbound};
pub use rate::{FrameRate, Speed};
pub use session::{SessionToken, StreamSession};
