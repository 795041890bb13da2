//! Synthetic camera for tests, demos, and machines without a webcam.
//!
//! Renders a flat background with an optional skin-toned rectangle. The
//! acquisition outcome can be scripted, and shared counters report how many
//! streams were acquired and how many tracks are still live.

use crate::camera::{CameraDevice, CameraError, StreamRequest, VideoStream};
use crate::frame::{Frame, RGBA_CHANNELS};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Background colour: neutral grey, never classified as skin.
pub const BACKGROUND_RGBA: [u8; 4] = [90, 90, 90, 255];
/// Foreground colour: a warm tone that passes the skin heuristic.
pub const SKIN_RGBA: [u8; 4] = [200, 150, 120, 255];

/// Axis-aligned rectangle painted with [`SKIN_RGBA`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Fixed(Patch),
    /// Half the frame in each dimension, centred.
    Centered,
}

impl Placement {
    fn resolve(self, width: u32, height: u32) -> Patch {
        match self {
            Placement::Fixed(p) => p,
            Placement::Centered => Patch {
                x: width / 4,
                y: height / 4,
                width: width / 2,
                height: height / 2,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Grant,
    Deny,
    NoDevice,
    PlaybackFails,
}

/// Scriptable in-memory camera.
#[derive(Clone)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    face: Option<Placement>,
    outcome: Outcome,
    acquisitions: Arc<AtomicUsize>,
    live_tracks: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    /// A camera that renders at the requested size with no face in view.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            face: None,
            outcome: Outcome::Grant,
            acquisitions: Arc::new(AtomicUsize::new(0)),
            live_tracks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Force a fixed output size instead of honouring the request.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Paint a skin-toned patch into every frame.
    pub fn with_face(mut self, patch: Patch) -> Self {
        self.face = Some(Placement::Fixed(patch));
        self
    }

    /// Paint a centred patch covering a quarter of the frame area.
    pub fn with_centered_face(mut self) -> Self {
        self.face = Some(Placement::Centered);
        self
    }

    pub fn deny_permission(mut self) -> Self {
        self.outcome = Outcome::Deny;
        self
    }

    pub fn without_device(mut self) -> Self {
        self.outcome = Outcome::NoDevice;
        self
    }

    pub fn failing_playback(mut self) -> Self {
        self.outcome = Outcome::PlaybackFails;
        self
    }

    /// Number of streams handed out so far.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of tracks not yet stopped.
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDevice for SyntheticCamera {
    type Stream = SyntheticStream;

    fn acquire(&mut self, request: &StreamRequest) -> Result<SyntheticStream, CameraError> {
        match self.outcome {
            Outcome::Deny => {
                return Err(CameraError::PermissionDenied(
                    "synthetic camera: access denied".into(),
                ))
            }
            Outcome::NoDevice => {
                return Err(CameraError::DeviceUnavailable(
                    "synthetic camera: no device".into(),
                ))
            }
            Outcome::Grant | Outcome::PlaybackFails => {}
        }

        let (width, height) = if self.width == 0 || self.height == 0 {
            (request.width, request.height)
        } else {
            (self.width, self.height)
        };

        let patch = self.face.map(|f| f.resolve(width, height));

        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.live_tracks.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(width, height, "synthetic camera acquired");

        Ok(SyntheticStream {
            pixels: render(width, height, patch),
            width,
            height,
            sequence: 0,
            active: true,
            playback_fails: self.outcome == Outcome::PlaybackFails,
            live_tracks: Arc::clone(&self.live_tracks),
        })
    }
}

fn render(width: u32, height: u32, patch: Option<Patch>) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut data = Vec::with_capacity(w * h * RGBA_CHANNELS);
    for y in 0..height {
        for x in 0..width {
            let inside = patch.is_some_and(|p| {
                x >= p.x
                    && x < p.x.saturating_add(p.width)
                    && y >= p.y
                    && y < p.y.saturating_add(p.height)
            });
            data.extend_from_slice(if inside { &SKIN_RGBA } else { &BACKGROUND_RGBA });
        }
    }
    data
}

/// Stream produced by [`SyntheticCamera`].
pub struct SyntheticStream {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u32,
    active: bool,
    playback_fails: bool,
    live_tracks: Arc<AtomicUsize>,
}

impl VideoStream for SyntheticStream {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.active {
            return Err(CameraError::PlaybackFailed("stream stopped".into()));
        }
        if self.playback_fails {
            return Err(CameraError::PlaybackFailed(
                "synthetic camera: playback refused".into(),
            ));
        }
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Frame::new(
            self.pixels.clone(),
            self.width,
            self.height,
            self.sequence,
        ))
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.live_tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_requested_size() {
        let mut camera = SyntheticCamera::new();
        let mut stream = camera.acquire(&StreamRequest::default()).unwrap();
        let frame = stream.next_frame().unwrap();
        assert_eq!((frame.width, frame.height), (640, 480));
        assert_eq!(frame.data.len(), 640 * 480 * 4);
        assert!(frame.data.chunks_exact(4).all(|px| px == BACKGROUND_RGBA));
    }

    #[test]
    fn test_patch_painted() {
        let mut camera = SyntheticCamera::new().with_size(4, 4).with_face(Patch {
            x: 1,
            y: 2,
            width: 2,
            height: 1,
        });
        let mut stream = camera.acquire(&StreamRequest::default()).unwrap();
        let frame = stream.next_frame().unwrap();
        let skin: Vec<usize> = frame
            .data
            .chunks_exact(4)
            .enumerate()
            .filter(|(_, px)| *px == SKIN_RGBA)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(skin, vec![9, 10]);
    }

    #[test]
    fn test_centered_face_quarter() {
        let mut camera = SyntheticCamera::new().with_size(8, 8).with_centered_face();
        let mut stream = camera.acquire(&StreamRequest::default()).unwrap();
        let frame = stream.next_frame().unwrap();
        let skin = frame.data.chunks_exact(4).filter(|px| *px == SKIN_RGBA).count();
        assert_eq!(skin, 16);
    }

    #[test]
    fn test_track_counting() {
        let mut camera = SyntheticCamera::new().with_size(2, 2);
        let mut stream = camera.acquire(&StreamRequest::default()).unwrap();
        assert_eq!(camera.acquisitions(), 1);
        assert_eq!(camera.live_tracks(), 1);

        stream.stop();
        stream.stop();
        assert!(!stream.is_active());
        assert_eq!(camera.live_tracks(), 0);
        assert!(stream.next_frame().is_err());
    }

    #[test]
    fn test_drop_releases_track() {
        let mut camera = SyntheticCamera::new().with_size(2, 2);
        {
            let _stream = camera.acquire(&StreamRequest::default()).unwrap();
            assert_eq!(camera.live_tracks(), 1);
        }
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_scripted_failures() {
        let req = StreamRequest::default();
        let denied = SyntheticCamera::new().deny_permission().acquire(&req).err();
        assert!(matches!(denied, Some(CameraError::PermissionDenied(_))));

        let missing = SyntheticCamera::new().without_device().acquire(&req).err();
        assert!(matches!(missing, Some(CameraError::DeviceUnavailable(_))));

        let mut camera = SyntheticCamera::new().with_size(2, 2).failing_playback();
        let mut stream = camera.acquire(&req).unwrap();
        assert!(matches!(
            stream.next_frame(),
            Err(CameraError::PlaybackFailed(_))
        ));
    }
}
