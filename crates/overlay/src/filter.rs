//! Annotation filtering and label text.

use tv_common::Annotation;

/// Restricts which annotations of a frame get drawn.
///
/// Both criteria are optional; an annotation must satisfy every criterion
/// that is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationFilter {
    pub class_name: Option<String>,
    pub object_id: Option<u32>,
}

impl AnnotationFilter {
    pub fn by_class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            object_id: None,
        }
    }

    pub fn by_object(object_id: u32) -> Self {
        Self {
            class_name: None,
            object_id: Some(object_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.class_name.is_none() && self.object_id.is_none()
    }

    pub fn clear(&mut self) {
        self.class_name = None;
        self.object_id = None;
    }

    pub fn matches(&self, annotation: &Annotation) -> bool {
        let class_ok = self
            .class_name
            .as_deref()
            .map_or(true, |class| annotation.class_name == class);
        let id_ok = self.object_id.map_or(true, |id| annotation.object_id == id);
        class_ok && id_ok
    }

    pub fn apply<'a>(&'a self, annotations: &'a [Annotation]) -> impl Iterator<Item = &'a Annotation> + 'a {
        annotations.iter().filter(move |a| self.matches(a))
    }
}

/// Which parts of an object's identity appear in its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelOptions {
    pub show_id: bool,
    pub show_class: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            show_id: true,
            show_class: true,
        }
    }
}

impl LabelOptions {
    /// Label text: enabled parts joined with `", "`, id first.
    pub fn label_for(&self, annotation: &Annotation) -> String {
        let mut parts = Vec::with_capacity(2);
        if self.show_id {
            parts.push(annotation.object_id.to_string());
        }
        if self.show_class {
            parts.push(annotation.class_name.clone());
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tv_common::BoundingBox;

    fn annotation(id: u32, class: &str) -> Annotation {
        Annotation::new(id, class, BoundingBox::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = AnnotationFilter::default();
        let annotations = vec![annotation(1, "car"), annotation(2, "person")];
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&annotations).count(), 2);
    }

    #[test]
    fn class_and_id_filters_combine() {
        let annotations = vec![annotation(1, "car"), annotation(2, "car"), annotation(2, "person")];

        let by_class = AnnotationFilter::by_class("car");
        let ids: Vec<u32> = by_class.apply(&annotations).map(|a| a.object_id).collect();
        assert_eq!(ids, vec![1, 2]);

        let both = AnnotationFilter {
            class_name: Some("car".into()),
            object_id: Some(2),
        };
        let kept: Vec<_> = both.apply(&annotations).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].class_name, "car");
        assert_eq!(kept[0].object_id, 2);
    }

    #[test]
    fn clear_drops_every_criterion() {
        let mut filter = AnnotationFilter {
            class_name: Some("car".into()),
            object_id: Some(2),
        };
        filter.clear();
        assert!(filter.is_empty());
        assert_eq!(filter, AnnotationFilter::default());
    }

    #[test]
    fn labels_follow_options() {
        let a = annotation(7, "truck");
        assert_eq!(LabelOptions::default().label_for(&a), "7, truck");
        let id_only = LabelOptions {
            show_id: true,
            show_class: false,
        };
        assert_eq!(id_only.label_for(&a), "7");
        let none = LabelOptions {
            show_id: false,
            show_class: false,
        };
        assert_eq!(none.label_for(&a), "");
    }
}
