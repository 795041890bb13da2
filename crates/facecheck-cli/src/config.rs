use facecheck_hw::StreamRequest;
use facecheck_verify::VerifyConfig;
use std::time::Duration;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Requested capture width in pixels.
    pub frame_width: u32,
    /// Requested capture height in pixels.
    pub frame_height: u32,
    /// Milliseconds between detection ticks.
    pub poll_interval_ms: u64,
    /// Milliseconds between reaching 100% and reporting success.
    pub grace_period_ms: u64,
    /// Seed for the progress increments; entropy when unset.
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Load configuration from `FACECHECK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            camera_device: std::env::var("FACECHECK_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            frame_width: env_u32("FACECHECK_FRAME_WIDTH", 640),
            frame_height: env_u32("FACECHECK_FRAME_HEIGHT", 480),
            poll_interval_ms: env_u64("FACECHECK_POLL_INTERVAL_MS", 100),
            grace_period_ms: env_u64("FACECHECK_GRACE_PERIOD_MS", 1000),
            rng_seed: std::env::var("FACECHECK_RNG_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn stream_request(&self) -> StreamRequest {
        StreamRequest {
            width: self.frame_width,
            height: self.frame_height,
            ..StreamRequest::default()
        }
    }

    pub fn verify_config(&self) -> VerifyConfig {
        VerifyConfig {
            stream: self.stream_request(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            grace_period: Duration::from_millis(self.grace_period_ms),
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_config_mapping() {
        let config = Config {
            camera_device: "/dev/video3".into(),
            frame_width: 320,
            frame_height: 240,
            poll_interval_ms: 50,
            grace_period_ms: 0,
            rng_seed: Some(1),
        };
        let vc = config.verify_config();
        assert_eq!((vc.stream.width, vc.stream.height), (320, 240));
        assert_eq!(vc.poll_interval, Duration::from_millis(50));
        assert_eq!(vc.grace_period, Duration::ZERO);
    }

    #[test]
    fn test_env_default_when_unset() {
        assert_eq!(env_u64("FACECHECK_TEST_UNSET_VARIABLE", 7), 7);
        assert_eq!(env_u32("FACECHECK_TEST_UNSET_VARIABLE", 9), 9);
    }
}
