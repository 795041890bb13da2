//! Camera capability and the V4L2 backend (via the `v4l` crate).
//!
//! The sampler never touches hardware directly: it is handed a
//! [`CameraDevice`] and asks it for a [`VideoStream`]. Tests and demos pass
//! a [`SyntheticCamera`](crate::SyntheticCamera) instead.

use crate::frame::{self, Frame};
use std::io;
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("video playback failed: {0}")]
    PlaybackFailed(String),
}

/// Which physical camera to prefer when a platform offers several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    User,
    Environment,
}

/// Requested stream parameters. Backends treat these as preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: Facing::User,
        }
    }
}

/// Camera-access capability: hands out live video streams.
pub trait CameraDevice {
    type Stream: VideoStream;

    fn acquire(&mut self, request: &StreamRequest) -> Result<Self::Stream, CameraError>;
}

/// A live video stream owning one or more hardware tracks.
pub trait VideoStream {
    /// Render the current picture into an RGBA frame.
    fn next_frame(&mut self) -> Result<Frame, CameraError>;

    /// Halt every underlying track. Calling this twice is a no-op.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel).
    Yuyv,
    /// Packed 24-bit RGB (3 bytes/pixel).
    Rgb3,
}

/// V4L2 camera addressed by device path (e.g., "/dev/video0").
///
/// V4L2 has no notion of facing; the device path picks the camera.
pub struct V4lCamera {
    device_path: String,
}

impl V4lCamera {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        for i in 0..16 {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                continue;
            }
            devices.push(DeviceInfo {
                path,
                name: caps.card.clone(),
                driver: caps.driver.clone(),
                bus: caps.bus.clone(),
            });
        }

        devices
    }
}

impl CameraDevice for V4lCamera {
    type Stream = V4lStream;

    fn acquire(&mut self, request: &StreamRequest) -> Result<V4lStream, CameraError> {
        let device_path = self.device_path.as_str();
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceUnavailable(format!(
                "{device_path}: no such device"
            )));
        }

        let device =
            Device::with_path(device_path).map_err(|e| classify_open_error(device_path, e))?;

        let caps = device.query_caps().map_err(|e| {
            CameraError::DeviceUnavailable(format!("failed to query capabilities: {e}"))
        })?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::DeviceUnavailable(format!(
                "{device_path} ({}) cannot capture video",
                caps.card
            )));
        }

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened camera"
        );

        let mut fmt = device
            .format()
            .map_err(|e| CameraError::PlaybackFailed(format!("failed to get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = request.width;
        fmt.height = request.height;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| CameraError::PlaybackFailed(format!("failed to set format: {e}")))?;

        let fourcc = negotiated.fourcc;
        let pixel_format = if fourcc == FourCC::new(b"YUYV") {
            PixelFormat::Yuyv
        } else if fourcc == FourCC::new(b"RGB3") {
            PixelFormat::Rgb3
        } else {
            return Err(CameraError::PlaybackFailed(format!(
                "unsupported pixel format: {fourcc:?} (need YUYV or RGB3)"
            )));
        };

        tracing::info!(
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?fourcc,
            "negotiated format"
        );

        let stream = MmapStream::with_buffers(&device, BufType::VideoCapture, 4).map_err(|e| {
            CameraError::PlaybackFailed(format!("failed to create mmap stream: {e}"))
        })?;

        Ok(V4lStream {
            stream: Some(stream),
            width: negotiated.width,
            height: negotiated.height,
            pixel_format,
            device_path: device_path.to_string(),
        })
    }
}

/// Map an open(2) failure onto the camera error taxonomy.
fn classify_open_error(device_path: &str, e: io::Error) -> CameraError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied(format!("{device_path}: {e}"))
        }
        _ if e.to_string().contains("busy") || e.to_string().contains("EBUSY") => {
            CameraError::DeviceUnavailable(format!("{device_path}: device busy"))
        }
        _ => CameraError::DeviceUnavailable(format!("{device_path}: {e}")),
    }
}

/// A streaming V4L2 capture session. The mmap stream holds its own
/// handle to the device, so dropping it closes the camera.
pub struct V4lStream {
    stream: Option<MmapStream<'static>>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    device_path: String,
}

impl V4lStream {
    fn buf_to_rgba(&self, buf: &[u8]) -> Result<Vec<u8>, CameraError> {
        let converted = match self.pixel_format {
            PixelFormat::Yuyv => frame::yuyv_to_rgba(buf, self.width, self.height),
            PixelFormat::Rgb3 => frame::rgb_to_rgba(buf, self.width, self.height),
        };
        converted.map_err(|e| CameraError::PlaybackFailed(e.to_string()))
    }
}

impl VideoStream for V4lStream {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CameraError::PlaybackFailed("stream stopped".into()))?;

        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::PlaybackFailed(format!("failed to dequeue buffer: {e}")))?;
        let sequence = meta.sequence;
        let buf = buf.to_vec();

        let rgba = self.buf_to_rgba(&buf)?;
        Ok(Frame::new(rgba, self.width, self.height, sequence))
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!(device = %self.device_path, "camera released");
        }
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for V4lStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_is_vga_user_facing() {
        let req = StreamRequest::default();
        assert_eq!((req.width, req.height), (640, 480));
        assert_eq!(req.facing, Facing::User);
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let mut camera = V4lCamera::new("/dev/facecheck-does-not-exist");
        let err = camera.acquire(&StreamRequest::default()).err();
        assert!(matches!(err, Some(CameraError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_classify_permission_denied() {
        let err = classify_open_error(
            "/dev/video0",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, CameraError::PermissionDenied(_)));
    }

    #[test]
    fn test_classify_other_errors_unavailable() {
        let err = classify_open_error("/dev/video0", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, CameraError::DeviceUnavailable(_)));
    }
}
