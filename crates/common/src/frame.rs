//! Frame and annotation data model.

/// A single polygon vertex in image coordinates.
pub type Point = (f32, f32);

/// Axis-aligned rectangle in image coordinates (top-left origin).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// One detected object in one frame.
///
/// `object_id` is stable across frames for the same tracked object. When a
/// `mask` is present it supersedes the rectangle for drawing, but both are
/// kept.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub object_id: u32,
    pub class_name: String,
    pub bbox: BoundingBox,
    pub mask: Option<Vec<Point>>,
}

impl Annotation {
    pub fn new(object_id: u32, class_name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            object_id,
            class_name: class_name.into(),
            bbox,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: Vec<Point>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Whether this annotation should be drawn as a polygon.
    pub fn has_mask(&self) -> bool {
        self.mask.as_ref().is_some_and(|m| !m.is_empty())
    }
}

/// A decoded frame message: the still-encoded image plus its annotations.
///
/// Frames are immutable once appended to a buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Encoded image bytes (PNG/JPEG), opaque to the engine.
    pub image: Vec<u8>,
    pub annotations: Vec<Annotation>,
}

impl Frame {
    pub fn new(image: Vec<u8>, annotations: Vec<Annotation>) -> Self {
        Self { image, annotations }
    }
}

/// An entry of the stream's known-object roster, as reported by the
/// stream summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedObject {
    pub object_id: u32,
    pub class_name: String,
}
