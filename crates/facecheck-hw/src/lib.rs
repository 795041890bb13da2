//! facecheck-hw — Hardware abstraction for camera capture and frame sampling.
//!
//! Provides the camera capability traits, a V4L2 backend, a synthetic
//! backend for tests and demos, and the frame sampler that owns the live
//! camera session.

pub mod camera;
pub mod frame;
pub mod sampler;
pub mod synthetic;

pub use camera::{
    CameraDevice, CameraError, DeviceInfo, Facing, PixelFormat, StreamRequest, V4lCamera,
    VideoStream,
};
pub use frame::Frame;
pub use sampler::FrameSampler;
pub use synthetic::{Patch, SyntheticCamera};
