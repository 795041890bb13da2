use crate::config::VerifyConfig;
use crate::notify::{Notice, Notifier, TracingNotifier};
use facecheck_core::{
    BoundingBox, DetectionResult, IncrementSource, PresenceDetector, ProgressTracker,
    RandomIncrement, SkinToneDetector, TickOutcome,
};
use facecheck_hw::{CameraDevice, CameraError, FrameSampler};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Idle,
    Scanning,
    Complete,
}

/// How a call to [`FacialVerification::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Progress reached 100% and the completion callback was invoked.
    Verified,
    /// Cancelled before completion; the camera was released and the
    /// callback was not invoked.
    Cancelled,
}

/// Display snapshot of the component.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationView {
    pub state: VerificationState,
    pub progress: f64,
    pub status: String,
    pub heading: &'static str,
    pub message: &'static str,
    /// Region found in the most recent frame, if a face was present.
    pub region: Option<BoundingBox>,
}

/// Facial presence check: samples the camera, scans each frame for skin,
/// and invokes `on_complete` once progress reaches 100%.
///
/// The camera is held only while scanning. Completion, [`cancel`],
/// [`reset`] and dropping the component all release it synchronously.
///
/// [`cancel`]: FacialVerification::cancel
/// [`reset`]: FacialVerification::reset
pub struct FacialVerification<C: CameraDevice> {
    sampler: FrameSampler<C>,
    detector: Box<dyn PresenceDetector>,
    increments: Box<dyn IncrementSource>,
    notifier: Box<dyn Notifier>,
    tracker: ProgressTracker,
    state: VerificationState,
    on_complete: Box<dyn FnMut()>,
    completion_delivered: bool,
    config: VerifyConfig,
}

impl<C: CameraDevice> FacialVerification<C> {
    pub fn new(camera: C, config: VerifyConfig, on_complete: impl FnMut() + 'static) -> Self {
        Self {
            sampler: FrameSampler::new(camera, config.stream),
            detector: Box::new(SkinToneDetector),
            increments: Box::new(RandomIncrement::from_entropy()),
            notifier: Box::new(TracingNotifier),
            tracker: ProgressTracker::new(),
            state: VerificationState::Idle,
            on_complete: Box::new(on_complete),
            completion_delivered: false,
            config,
        }
    }

    pub fn with_detector(mut self, detector: impl PresenceDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn with_increments(mut self, increments: impl IncrementSource + 'static) -> Self {
        self.increments = Box::new(increments);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.tracker.progress()
    }

    pub fn camera_active(&self) -> bool {
        self.sampler.is_active()
    }

    /// Acquire the camera and enter `Scanning`.
    ///
    /// Only valid from `Idle`; otherwise a no-op. On failure the component
    /// stays `Idle`, an error notice is posted and the error is returned.
    /// There is no automatic retry.
    pub fn start_scan(&mut self) -> Result<(), CameraError> {
        if self.state != VerificationState::Idle {
            tracing::debug!(state = ?self.state, "start_scan ignored");
            return Ok(());
        }

        if let Err(e) = self.sampler.start() {
            tracing::warn!(error = %e, "camera start failed");
            self.notifier.notify(error_notice(&e));
            return Err(e);
        }

        self.state = VerificationState::Scanning;
        tracing::info!("facial scan started");
        self.notifier.notify(Notice::info(
            "Facial Recognition",
            "Please position your face within the frame...",
        ));
        Ok(())
    }

    /// One synchronous detection step: render, capture, detect, update.
    ///
    /// Returns `None` unless scanning. The tick that reaches 100% stops the
    /// camera and moves to `Complete` before returning.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.state != VerificationState::Scanning {
            return None;
        }

        self.sampler.refresh();
        let detection = match self.sampler.capture_frame() {
            Some(frame) => self.detector.detect(&frame.data, frame.width, frame.height),
            None => DetectionResult::absent(),
        };

        let outcome = self.tracker.observe(&detection, self.increments.as_mut());
        match outcome {
            TickOutcome::Advanced(progress) => {
                tracing::debug!(progress, region = ?detection.bounding_box, "face present")
            }
            TickOutcome::Held(progress) => {
                tracing::debug!(progress, coverage = detection.coverage, "no face")
            }
            TickOutcome::Reached => self.finish(),
            TickOutcome::Finished => {}
        }
        Some(outcome)
    }

    fn finish(&mut self) {
        self.state = VerificationState::Complete;
        self.sampler.stop();
        tracing::info!("facial verification complete");
        self.notifier.notify(Notice::success(
            "Facial Recognition Complete",
            "Your facial features have been securely verified.",
        ));
    }

    /// Invoke the completion callback if this attempt completed and it has
    /// not been invoked yet. Returns whether it was invoked.
    pub fn deliver_completion(&mut self) -> bool {
        if self.state != VerificationState::Complete || self.completion_delivered {
            return false;
        }
        debug_assert!(!self.sampler.is_active(), "camera must be released first");
        self.completion_delivered = true;
        (self.on_complete)();
        true
    }

    /// Abandon the current attempt: release the camera and return to
    /// `Idle` with progress cleared. An attempt that already reached 100%
    /// still gets its completion callback.
    pub fn cancel(&mut self) {
        if self.state == VerificationState::Scanning {
            tracing::info!(progress = self.tracker.progress(), "facial scan cancelled");
        }
        self.reset();
    }

    /// Return to `Idle` for a fresh attempt. Releases the camera if held.
    ///
    /// A completed attempt whose callback has not run yet gets it now.
    pub fn reset(&mut self) {
        self.sampler.stop();
        if self.deliver_completion() {
            tracing::debug!("completion delivered before reset");
        }
        self.tracker = ProgressTracker::new();
        self.state = VerificationState::Idle;
        self.completion_delivered = false;
    }

    /// Drive a whole attempt: start the camera, tick every
    /// `poll_interval`, then wait out `grace_period` and invoke the
    /// completion callback.
    ///
    /// `cancel` resolving before completion releases the camera and
    /// returns [`RunOutcome::Cancelled`]. Resolving during the grace period
    /// only cuts the wait short: the attempt already succeeded, so the
    /// callback still runs.
    ///
    /// Dropping the returned future (a timeout, an outer `select!`, task
    /// abort) behaves like `cancel`: a scan in progress is abandoned and the
    /// camera released, and a completion still in its grace period is
    /// delivered.
    pub async fn run<F>(&mut self, cancel: F) -> Result<RunOutcome, CameraError>
    where
        F: Future<Output = ()>,
    {
        self.start_scan()?;
        let attempt = Attempt(self);
        tokio::pin!(cancel);

        let period = attempt.0.config.poll_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while attempt.0.state == VerificationState::Scanning {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    attempt.0.cancel();
                    return Ok(RunOutcome::Cancelled);
                }
                _ = ticker.tick() => {
                    attempt.0.tick();
                }
            }
        }
        drop(ticker);

        tokio::select! {
            biased;
            _ = &mut cancel => {
                tracing::debug!("cancelled during grace period; delivering completion now");
            }
            _ = tokio::time::sleep(attempt.0.config.grace_period) => {}
        }

        attempt.0.deliver_completion();
        Ok(RunOutcome::Verified)
    }

    pub fn view(&self) -> VerificationView {
        let (status, heading, message) = match self.state {
            VerificationState::Idle => (
                "Waiting to scan...".to_string(),
                "Facial Recognition",
                "Click to start facial recognition.",
            ),
            VerificationState::Scanning => (
                format!("{}% Complete", self.tracker.percent()),
                "Scanning...",
                "Please keep your face within the frame.",
            ),
            VerificationState::Complete => (
                "100% Complete".to_string(),
                "Facial Recognition Complete",
                "Your facial features have been securely verified.",
            ),
        };

        VerificationView {
            state: self.state,
            progress: self.tracker.progress(),
            status,
            heading,
            message,
            region: self.tracker.region(),
        }
    }
}

/// Ties an attempt driven by `run` to the lifetime of its future.
struct Attempt<'a, C: CameraDevice>(&'a mut FacialVerification<C>);

impl<C: CameraDevice> Drop for Attempt<'_, C> {
    fn drop(&mut self) {
        match self.0.state {
            VerificationState::Scanning => {
                tracing::info!("scan abandoned; releasing camera");
                self.0.cancel();
            }
            VerificationState::Complete => {
                self.0.deliver_completion();
            }
            VerificationState::Idle => {}
        }
    }
}

fn error_notice(e: &CameraError) -> Notice {
    match e {
        CameraError::PermissionDenied(_) => Notice::error(
            "Camera Access Denied",
            "Allow camera access to continue with facial recognition.",
        ),
        CameraError::DeviceUnavailable(_) => Notice::error(
            "Camera Unavailable",
            "No usable camera was found. Connect a camera and try again.",
        ),
        CameraError::PlaybackFailed(_) => Notice::error(
            "Camera Error",
            "The camera stream could not be started. Please try again.",
        ),
    }
}
