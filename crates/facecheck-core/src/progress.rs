//! Verification progress accumulation.
//!
//! Progress only moves while a face is present. Losing the face holds the
//! current value (it never decays or resets mid-attempt). The first
//! observation that lands on 100 reports [`TickOutcome::Reached`]; every
//! observation after that is ignored.

use crate::types::{BoundingBox, DetectionResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Terminal progress value.
pub const PROGRESS_CEILING: f64 = 100.0;

/// Upper bound of the per-tick increment drawn while a face is present.
pub const MAX_INCREMENT: f64 = 5.0;

/// Source of per-tick progress increments.
pub trait IncrementSource {
    /// Next increment, expected in `[0, MAX_INCREMENT]`.
    fn next_increment(&mut self) -> f64;
}

/// Uniform draws from `[0, MAX_INCREMENT]`.
pub struct RandomIncrement<R: Rng = StdRng> {
    rng: R,
}

impl RandomIncrement<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for demos and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomIncrement<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> IncrementSource for RandomIncrement<R> {
    fn next_increment(&mut self) -> f64 {
        self.rng.gen_range(0.0..=MAX_INCREMENT)
    }
}

/// Constant increment, for deterministic runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedIncrement(pub f64);

impl IncrementSource for FixedIncrement {
    fn next_increment(&mut self) -> f64 {
        self.0
    }
}

/// What one observation did to the progress value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Face present; progress moved to the contained value.
    Advanced(f64),
    /// No face; progress held at the contained value.
    Held(f64),
    /// Progress hit 100 for the first time.
    Reached,
    /// Already complete; the observation was ignored.
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    progress: f64,
    region: Option<BoundingBox>,
    complete: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one detection into the running progress.
    pub fn observe(
        &mut self,
        detection: &DetectionResult,
        increments: &mut dyn IncrementSource,
    ) -> TickOutcome {
        if self.complete {
            return TickOutcome::Finished;
        }

        if !detection.present {
            self.region = None;
            return TickOutcome::Held(self.progress);
        }

        self.region = detection.bounding_box;

        // f64::max maps NaN to 0.0 as well as clamping negatives.
        let step = increments.next_increment().max(0.0);
        self.progress = (self.progress + step).min(PROGRESS_CEILING);

        if self.progress >= PROGRESS_CEILING {
            self.complete = true;
            TickOutcome::Reached
        } else {
            TickOutcome::Advanced(self.progress)
        }
    }

    /// Current progress in `[0, 100]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Progress rounded to a whole percent for display.
    pub fn percent(&self) -> u8 {
        self.progress.round() as u8
    }

    /// Region from the most recent frame with a face in it, cleared when
    /// the face is lost.
    pub fn region(&self) -> Option<BoundingBox> {
        self.region
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
