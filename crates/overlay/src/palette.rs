//! Fixed per-object colour palette.
//!
//! Colour is a function of `object_id % 10`, so a tracked object keeps its
//! colour from frame to frame.

/// Stroke colours, indexed by `object_id % 10`.
pub const STROKE_PALETTE: [[u8; 3]; 10] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [0, 255, 255],
    [255, 0, 255],
    [255, 255, 255],
    [122, 7, 42],
    [223, 154, 237],
    [135, 72, 0],
];

/// Fill alpha (0.2 of full opacity).
pub const FILL_ALPHA: u8 = 51;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectColor {
    pub stroke: [u8; 3],
    pub fill: [u8; 4],
}

impl ObjectColor {
    /// CSS form of the stroke colour, e.g. `rgb(255, 0, 0)`.
    pub fn stroke_css(&self) -> String {
        let [r, g, b] = self.stroke;
        format!("rgb({r}, {g}, {b})")
    }

    /// CSS form of the fill colour, e.g. `rgba(255, 0, 0, 0.2)`.
    pub fn fill_css(&self) -> String {
        let [r, g, b, a] = self.fill;
        let alpha = (a as f32 / 255.0 * 100.0).round() / 100.0;
        format!("rgba({r}, {g}, {b}, {alpha})")
    }
}

pub fn color_for(object_id: u32) -> ObjectColor {
    let [r, g, b] = STROKE_PALETTE[(object_id % 10) as usize];
    ObjectColor {
        stroke: [r, g, b],
        fill: [r, g, b, FILL_ALPHA],
    }
}
