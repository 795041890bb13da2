//! facecheck-core — Presence detection and verification progress.
//!
//! The detector is a fixed RGB-inequality skin-tone heuristic, not a
//! trained model. The progress tracker turns a stream of per-frame
//! detections into a single completion event.

pub mod detector;
pub mod progress;
pub mod types;

pub use detector::{detect_presence, PresenceDetector, SkinToneDetector};
pub use progress::{
    FixedIncrement, IncrementSource, ProgressTracker, RandomIncrement, TickOutcome,
};
pub use types::{BoundingBox, DetectionResult};
