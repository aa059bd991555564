//! Configuration types for LensCast

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for LensCast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Capture width in pixels
    pub width: u32,
    /// Capture height in pixels
    pub height: u32,
    /// Target frame rate
    pub fps: u32,
    /// Server port
    pub port: u16,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// V4L2 device index (/dev/video<N>)
    pub device_index: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            port: 8000,
            jpeg_quality: 75,
            device_index: 0,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set capture width
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Builder pattern: set capture height
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Builder pattern: set frame rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder pattern: set JPEG quality
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Builder pattern: set V4L2 device index
    pub fn with_device_index(mut self, index: usize) -> Self {
        self.device_index = index;
        self
    }

    /// Fixed delay between stream iterations. Not latency-compensated: under
    /// sustained capture or encode slowness the effective rate falls below
    /// the target rather than bursting to catch up.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.fps.max(1) as u64)
    }

    /// Calculate bytes per frame for 3-channel formats
    pub fn frame_size_bytes(&self) -> usize {
        (self.width * self.height * 3) as usize
    }
}
