//! facecheck-verify — The facial verification component.
//!
//! Wires the frame sampler, the skin-tone detector and the progress tracker
//! into a small `Idle → Scanning → Complete` state machine driven by a
//! fixed-cadence timer.

pub mod config;
pub mod notify;
pub mod verifier;

pub use config::VerifyConfig;
pub use notify::{Notice, NoticeKind, Notifier, TracingNotifier};
pub use verifier::{FacialVerification, RunOutcome, VerificationState, VerificationView};
