//! Where presented frames go.
//!
//! The binary has no window; [`LogSink`] reports what would be drawn.

use std::io::Cursor;

use image::ImageReader;
use tracing::{debug, info, warn};
use tv_common::{Frame, StreamSession};
use tv_overlay::{OverlayItem, Shape};

/// One presented frame with everything needed to draw it.
pub struct Presentation<'a> {
    pub session: &'a StreamSession,
    pub index: usize,
    pub frame: &'a Frame,
    pub overlay: &'a [OverlayItem],
    pub fps_label: &'a str,
}

pub trait FrameSink {
    fn present(&mut self, presentation: Presentation<'_>);
}

/// Logs each presented frame and its overlay.
#[derive(Debug, Default)]
pub struct LogSink {
    /// Session whose image size has been probed already.
    probed: Option<StreamSession>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for LogSink {
    fn present(&mut self, p: Presentation<'_>) {
        if self.probed.as_ref() != Some(p.session) {
            match probe_dimensions(&p.frame.image) {
                Some((width, height)) => info!("Sink: {} frames are {}x{}", p.session, width, height),
                None => warn!("Sink: cannot read image size of {} frame {}", p.session, p.index),
            }
            self.probed = Some(p.session.clone());
        }

        debug!(
            "Sink: frame {} [{}] {} objects: {}",
            p.index,
            p.fps_label,
            p.overlay.len(),
            describe(p.overlay)
        );
    }
}

/// Width and height of an encoded image, without decoding the pixels.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn describe(overlay: &[OverlayItem]) -> String {
    overlay
        .iter()
        .map(|item| match &item.shape {
            Shape::Rect(b) => format!("[{}] rect {}x{} at ({}, {})", item.label, b.width, b.height, b.x, b.y),
            Shape::Polygon(points) => format!("[{}] polygon of {} points", item.label, points.len()),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use tv_common::{Annotation, BoundingBox};
    use tv_overlay::{build_overlay, AnnotationFilter, LabelOptions};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        RgbImage::new(width, height)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn probes_png_dimensions() {
        assert_eq!(probe_dimensions(&png(64, 48)), Some((64, 48)));
        assert_eq!(probe_dimensions(b"definitely not an image"), None);
    }

    #[test]
    fn probes_once_per_session() {
        let session = StreamSession::new("a.mp4", "bytetrack");
        let frame = Frame::new(png(4, 2), vec![]);
        let mut sink = LogSink::new();

        for index in 0..3 {
            sink.present(Presentation {
                session: &session,
                index,
                frame: &frame,
                overlay: &[],
                fps_label: "FPS: 0",
            });
        }
        assert_eq!(sink.probed.as_ref(), Some(&session));
    }

    #[test]
    fn describes_rects_and_polygons() {
        let frame = Frame::new(
            vec![],
            vec![
                Annotation::new(1, "car", BoundingBox::new(10.0, 20.0, 30.0, 40.0)),
                Annotation::new(2, "person", BoundingBox::new(0.0, 0.0, 1.0, 1.0))
                    .with_mask(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]),
            ],
        );
        let overlay = build_overlay(&frame, &AnnotationFilter::default(), &LabelOptions::default());
        assert_eq!(
            describe(&overlay),
            "[1, car] rect 30x40 at (10, 20); [2, person] polygon of 3 points"
        );
    }
}
