use facecheck_hw::StreamRequest;
use std::time::Duration;

/// Timing and capture settings for one verification component.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Requested camera stream.
    pub stream: StreamRequest,
    /// Delay between detection ticks.
    pub poll_interval: Duration,
    /// Pause between reaching 100% and invoking the completion callback.
    pub grace_period: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            stream: StreamRequest::default(),
            poll_interval: Duration::from_millis(100),
            grace_period: Duration::from_millis(1000),
        }
    }
}
