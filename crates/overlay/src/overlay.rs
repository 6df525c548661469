//! Drawable overlay items for a frame.

use tv_common::{BoundingBox, Frame, Point};

use crate::filter::{AnnotationFilter, LabelOptions};
use crate::palette::{color_for, ObjectColor};

pub const RECT_LINE_WIDTH: f32 = 3.0;
pub const MASK_LINE_WIDTH: f32 = 2.0;

/// Vertical gap between a rectangle's top edge and its label.
pub const RECT_LABEL_GAP: f32 = 3.0;
/// Vertical gap between a polygon's top-left extent and its label.
pub const MASK_LABEL_GAP: f32 = 5.0;

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(BoundingBox),
    /// Closed polyline.
    Polygon(Vec<Point>),
}

/// One stroked/filled shape with its label.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayItem {
    pub object_id: u32,
    pub shape: Shape,
    pub color: ObjectColor,
    pub line_width: f32,
    pub label: String,
    pub label_anchor: Point,
}

/// Project the frame's annotations into overlay items.
///
/// Masked annotations become polygons labelled above their top-left-most
/// extent; the rest become rectangles labelled above their top edge.
pub fn build_overlay(frame: &Frame, filter: &AnnotationFilter, labels: &LabelOptions) -> Vec<OverlayItem> {
    filter
        .apply(&frame.annotations)
        .map(|annotation| {
            let color = color_for(annotation.object_id);
            let label = labels.label_for(annotation);

            match annotation.mask.as_ref().filter(|m| !m.is_empty()) {
                Some(mask) => {
                    let (min_x, min_y) = mask
                        .iter()
                        .fold((f32::MAX, f32::MAX), |(mx, my), &(x, y)| (mx.min(x), my.min(y)));
                    OverlayItem {
                        object_id: annotation.object_id,
                        shape: Shape::Polygon(mask.clone()),
                        color,
                        line_width: MASK_LINE_WIDTH,
                        label,
                        label_anchor: (min_x, min_y - MASK_LABEL_GAP),
                    }
                }
                None => {
                    let bbox = annotation.bbox;
                    OverlayItem {
                        object_id: annotation.object_id,
                        shape: Shape::Rect(bbox),
                        color,
                        line_width: RECT_LINE_WIDTH,
                        label,
                        label_anchor: (bbox.x, bbox.y - RECT_LABEL_GAP),
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tv_common::Annotation;

    fn street_frame() -> Frame {
        Frame::new(
            vec![],
            vec![
                Annotation::new(4, "car", BoundingBox::new(10.0, 20.0, 30.0, 40.0)),
                Annotation::new(5, "person", BoundingBox::new(50.0, 60.0, 5.0, 15.0)),
            ],
        )
    }

    #[test]
    fn class_filter_keeps_only_cars() {
        let items = build_overlay(&street_frame(), &AnnotationFilter::by_class("car"), &LabelOptions::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].object_id, 4);
        assert_eq!(items[0].label, "4, car");
    }

    #[test]
    fn rectangle_label_sits_above_the_box() {
        let items = build_overlay(&street_frame(), &AnnotationFilter::by_object(4), &LabelOptions::default());
        let item = &items[0];
        assert_eq!(item.shape, Shape::Rect(BoundingBox::new(10.0, 20.0, 30.0, 40.0)));
        assert_eq!(item.label_anchor, (10.0, 17.0));
        assert_eq!(item.line_width, RECT_LINE_WIDTH);
        assert_eq!(item.color, color_for(4));
    }

    #[test]
    fn mask_supersedes_rectangle() {
        let masked = Annotation::new(12, "dog", BoundingBox::new(0.0, 0.0, 100.0, 100.0))
            .with_mask(vec![(40.0, 30.0), (20.0, 50.0), (60.0, 45.0)]);
        let frame = Frame::new(vec![], vec![masked]);

        let items = build_overlay(&frame, &AnnotationFilter::default(), &LabelOptions::default());
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0].shape, Shape::Polygon(ref points) if points.len() == 3));
        assert_eq!(items[0].label_anchor, (20.0, 25.0));
        assert_eq!(items[0].line_width, MASK_LINE_WIDTH);
        assert_eq!(items[0].color, color_for(2));
    }

    #[test]
    fn empty_mask_falls_back_to_rectangle() {
        let annotation = Annotation::new(1, "cat", BoundingBox::new(1.0, 8.0, 2.0, 2.0)).with_mask(vec![]);
        let frame = Frame::new(vec![], vec![annotation]);
        let items = build_overlay(&frame, &AnnotationFilter::default(), &LabelOptions::default());
        assert!(matches!(items[0].shape, Shape::Rect(_)));
    }
}
