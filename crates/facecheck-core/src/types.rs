use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates.
///
/// `width` and `height` are the spans between the extreme skin pixels
/// (`max - min`), so a single-pixel region has zero width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outcome of scanning one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub present: bool,
    pub bounding_box: Option<BoundingBox>,
    /// Number of pixels classified as skin.
    pub skin_pixels: u64,
    /// `width * height` of the scanned frame.
    pub total_pixels: u64,
    /// `skin_pixels / total_pixels`, or 0.0 for an empty frame.
    pub coverage: f64,
}

impl DetectionResult {
    pub fn absent() -> Self {
        Self {
            present: false,
            bounding_box: None,
            skin_pixels: 0,
            total_pixels: 0,
            coverage: 0.0,
        }
    }
}
