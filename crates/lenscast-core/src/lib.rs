//! LensCast Core - Shared types for the camera streaming pipeline
//!
//! This crate provides the foundational types used across all LensCast components.

pub mod config;
pub mod error;
pub mod frame;

pub use config::Config;
pub use error::{Error, Result};
pub use frame::{Frame, PixelFormat};
