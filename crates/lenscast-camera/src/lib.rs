//! LensCast Camera - V4L2 frame source and camera lifecycle
//!
//! This crate provides:
//! - the `FrameSource` boundary trait between the streaming server and camera hardware
//! - `SharedCamera`, the single process-wide handle with serialized capture access
//! - the V4L2 capture implementation and the probe/configure/start/stop lifecycle

pub mod lifecycle;
pub mod source;
pub mod v4l2;

pub use lifecycle::CameraState;
pub use source::{FrameSource, SharedCamera};
pub use v4l2::V4l2Source;
