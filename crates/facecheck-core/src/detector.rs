//! Skin-tone presence detector.
//!
//! Scans every RGBA pixel with a fixed RGB-inequality rule and reports a
//! face-like region when more than 5% of the frame is skin-coloured. The
//! rule is lighting-sensitive and carries no temporal memory; the
//! constants below are contractual and must not be tuned.

use crate::types::{BoundingBox, DetectionResult};

const RGBA_CHANNELS: usize = 4;

const SKIN_MIN_RED: u8 = 100;
const SKIN_MIN_GREEN: u8 = 50;
const SKIN_MIN_BLUE: u8 = 50;
const SKIN_MIN_RED_GREEN_SPREAD: i16 = 20;

/// Fraction of the frame that must be skin for a face to count as present.
/// The comparison is strict: exactly 5% is not enough.
pub const SKIN_COVERAGE_THRESHOLD: f64 = 0.05;

/// Strategy for deciding whether a face-like region is in a frame.
pub trait PresenceDetector {
    fn detect(&self, rgba: &[u8], width: u32, height: u32) -> DetectionResult;
}

/// The fixed skin-tone heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinToneDetector;

impl PresenceDetector for SkinToneDetector {
    fn detect(&self, rgba: &[u8], width: u32, height: u32) -> DetectionResult {
        detect_presence(rgba, width, height)
    }
}

/// Classify one pixel.
#[inline]
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    r > SKIN_MIN_RED
        && g > SKIN_MIN_GREEN
        && b > SKIN_MIN_BLUE
        && r > g
        && r > b
        && (r as i16 - g as i16) > SKIN_MIN_RED_GREEN_SPREAD
}

/// Scan a row-major RGBA buffer and report skin coverage and extent.
///
/// The denominator is always `width * height`. A buffer shorter than that
/// is scanned as far as it holds whole pixels; the remainder counts as
/// non-skin. Zero-sized frames are never present.
pub fn detect_presence(rgba: &[u8], width: u32, height: u32) -> DetectionResult {
    let total = width as u64 * height as u64;
    if total == 0 {
        return DetectionResult::absent();
    }

    let w = width as usize;
    let mut skin = 0u64;
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    for (i, px) in rgba
        .chunks_exact(RGBA_CHANNELS)
        .take(total as usize)
        .enumerate()
    {
        if !is_skin_tone(px[0], px[1], px[2]) {
            continue;
        }
        let x = (i % w) as u32;
        let y = (i / w) as u32;
        skin += 1;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let coverage = skin as f64 / total as f64;
    let present = coverage > SKIN_COVERAGE_THRESHOLD;

    let bounding_box = present.then(|| BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    });

    tracing::trace!(skin, total, coverage, present, "skin scan");

    DetectionResult {
        present,
        bounding_box,
        skin_pixels: skin,
        total_pixels: total,
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIN: [u8; 4] = [200, 150, 120, 255];
    const GREY: [u8; 4] = [90, 90, 90, 255];

    fn frame(width: u32, height: u32, is_skin: impl Fn(u32, u32) -> bool) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(if is_skin(x, y) { &SKIN } else { &GREY });
            }
        }
        data
    }

    #[test]
    fn test_no_skin_pixels() {
        let data = frame(10, 10, |_, _| false);
        let result = detect_presence(&data, 10, 10);
        assert!(!result.present);
        assert!(result.bounding_box.is_none());
        assert_eq!(result.skin_pixels, 0);
        assert_eq!(result.total_pixels, 100);
    }

    #[test]
    fn test_six_percent_rectangle_box_is_tight() {
        // 3x2 rectangle at (4, 5) in a 10x10 frame = 6%
        let data = frame(10, 10, |x, y| (4..7).contains(&x) && (5..7).contains(&y));
        let result = detect_presence(&data, 10, 10);
        assert!(result.present);
        assert_eq!(result.skin_pixels, 6);
        assert_eq!(
            result.bounding_box,
            Some(BoundingBox {
                x: 4,
                y: 5,
                width: 2,
                height: 1
            })
        );
    }

    #[test]
    fn test_exactly_five_percent_is_not_present() {
        // 5 of 100 pixels: coverage == 0.05, threshold is strict
        let data = frame(10, 10, |x, y| y == 0 && x < 5);
        let result = detect_presence(&data, 10, 10);
        assert_eq!(result.skin_pixels, 5);
        assert_eq!(result.coverage, 0.05);
        assert!(!result.present);
        assert!(result.bounding_box.is_none());
    }

    #[test]
    fn test_scattered_pixels_box_spans_extremes() {
        // Corners only, plus enough filler to pass the threshold
        let data = frame(20, 10, |x, y| {
            (x == 0 && y == 9) || (x == 19 && y == 0) || (y == 5 && (5..15).contains(&x))
        });
        let result = detect_presence(&data, 20, 10);
        assert!(result.present);
        assert_eq!(
            result.bounding_box,
            Some(BoundingBox {
                x: 0,
                y: 0,
                width: 19,
                height: 9
            })
        );
    }

    #[test]
    fn test_zero_dimensions() {
        assert_eq!(detect_presence(&[], 0, 0), DetectionResult::absent());
        assert!(!detect_presence(&SKIN, 0, 1).present);
        assert!(!detect_presence(&SKIN, 1, 0).present);
    }

    #[test]
    fn test_short_buffer_counts_missing_as_background() {
        // Claims 10x10 but only holds the first row, all skin: 10%
        let data: Vec<u8> = SKIN.iter().copied().cycle().take(10 * 4).collect();
        let result = detect_presence(&data, 10, 10);
        assert_eq!(result.total_pixels, 100);
        assert_eq!(result.skin_pixels, 10);
        assert!(result.present);
    }

    #[test]
    fn test_predicate_boundaries() {
        assert!(is_skin_tone(200, 150, 120));
        // Every bound is strict
        assert!(!is_skin_tone(100, 60, 60));
        assert!(!is_skin_tone(150, 50, 60));
        assert!(!is_skin_tone(150, 60, 50));
        // R - G must exceed 20
        assert!(!is_skin_tone(150, 130, 60));
        assert!(is_skin_tone(150, 129, 60));
        // R must dominate B
        assert!(!is_skin_tone(150, 60, 150));
        assert!(!is_skin_tone(255, 255, 255));
    }

    #[test]
    fn test_alpha_is_ignored() {
        let data: Vec<u8> = [200, 150, 120, 0].repeat(4);
        assert!(detect_presence(&data, 2, 2).present);
    }

    #[test]
    fn test_trait_delegates() {
        let data = frame(4, 4, |_, _| true);
        let result = SkinToneDetector.detect(&data, 4, 4);
        assert!(result.present);
        assert_eq!(
            result.bounding_box,
            Some(BoundingBox {
                x: 0,
                y: 0,
                width: 3,
                height: 3
            })
        );
    }

    #[test]
    fn test_result_serializes_with_stable_field_names() {
        let data = frame(4, 4, |_, _| true);
        let json = serde_json::to_value(detect_presence(&data, 4, 4)).unwrap();
        assert_eq!(json["present"], true);
        assert_eq!(json["bounding_box"]["width"], 3);
        assert_eq!(json["total_pixels"], 16);
    }
}
