//! Frame sampler: owns the camera session and exposes a pollable frame.
//!
//! At most one [`CameraSession`] exists per sampler. Every exit path
//! (explicit [`FrameSampler::stop`], an error during start, or dropping the
//! sampler) ends with the session dropped, and dropping a session stops
//! every hardware track it holds.

use crate::camera::{CameraDevice, CameraError, StreamRequest, VideoStream};
use crate::frame::Frame;

/// One live stream plus the surface it renders into.
pub struct CameraSession<S: VideoStream> {
    stream: S,
    surface: Frame,
}

impl<S: VideoStream> Drop for CameraSession<S> {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

pub struct FrameSampler<C: CameraDevice> {
    camera: C,
    request: StreamRequest,
    session: Option<CameraSession<C::Stream>>,
}

impl<C: CameraDevice> FrameSampler<C> {
    pub fn new(camera: C, request: StreamRequest) -> Self {
        Self {
            camera,
            request,
            session: None,
        }
    }

    /// Acquire the camera and render the first frame.
    ///
    /// A no-op when a session is already active, so two acquisitions can
    /// never overlap. If the first frame cannot be rendered the freshly
    /// acquired stream is stopped before the error is returned.
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.session.is_some() {
            tracing::debug!("camera session already active");
            return Ok(());
        }

        let mut stream = self.camera.acquire(&self.request)?;
        let surface = match stream.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                stream.stop();
                return Err(match e {
                    CameraError::PlaybackFailed(_) => e,
                    other => CameraError::PlaybackFailed(other.to_string()),
                });
            }
        };

        tracing::info!(
            width = surface.width,
            height = surface.height,
            "camera session started"
        );
        self.session = Some(CameraSession { stream, surface });
        Ok(())
    }

    /// Render the live stream into the surface.
    ///
    /// A failed read leaves the previous picture in place.
    pub fn refresh(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.stream.next_frame() {
            Ok(frame) => session.surface = frame,
            Err(e) => tracing::warn!(error = %e, "frame read failed; keeping previous surface"),
        }
    }

    /// Copy of the current surface, or `None` when no session is active.
    pub fn capture_frame(&self) -> Option<Frame> {
        self.session.as_ref().map(|s| s.surface.clone())
    }

    /// Release the camera. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("camera session stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.stream.is_active())
    }
}

impl<C: CameraDevice> Drop for FrameSampler<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
