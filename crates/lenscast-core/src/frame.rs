//! Frame representation for captured camera data
//!
//! This module provides the common Frame type used by both the camera and encoder crates.

use bytes::Bytes;

/// Pixel layout of a captured frame. All variants are 3 bytes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Red, green, blue channel order (what the JPEG encoder expects)
    Rgb24,
    /// Blue, green, red channel order (some V4L2 drivers only offer this)
    Bgr24,
}

/// A single captured camera frame
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data, 3 bytes per pixel
    data: Bytes,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Channel ordering of `data`
    pub format: PixelFormat,
    /// Capture sequence number, monotonic per source
    pub sequence: u64,
}

impl Frame {
    pub fn new(data: Bytes, width: u32, height: u32, format: PixelFormat, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            format,
            sequence,
        }
    }

    /// Get the raw pixel data as a slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the number of bytes per row (stride)
    pub fn stride(&self) -> usize {
        (self.width * 3) as usize
    }

    /// Check if the buffer length matches the frame dimensions
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * 3) as usize;
        self.data.len() >= expected_size && self.width > 0 && self.height > 0
    }

    /// Normalize channel ordering to RGB, copying only when the source is BGR.
    pub fn into_rgb(self) -> Frame {
        match self.format {
            PixelFormat::Rgb24 => self,
            PixelFormat::Bgr24 => {
                let mut data = self.data.to_vec();
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                Frame {
                    data: Bytes::from(data),
                    format: PixelFormat::Rgb24,
                    ..self
                }
            }
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("size", &self.data.len())
            .finish()
    }
}
