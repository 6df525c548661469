//! Overlay projection for annotated frames.
//!
//! Turns a frame's annotations into drawable overlay items: which
//! annotations survive the class/id filter, what colour each object gets,
//! where its label goes. Pixel drawing is left to whatever surface the
//! items are handed to.

pub mod filter;
pub mod fps;
pub mod overlay;
pub mod palette;

pub use filter::{AnnotationFilter, LabelOptions};
pub use fps::{fps_label, FpsMeter};
pub use overlay::{build_overlay, OverlayItem, Shape};
pub use palette::{color_for, ObjectColor};
