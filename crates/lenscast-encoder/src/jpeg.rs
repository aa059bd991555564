//! JPEG encoding of raw RGB frames
//!
//! A bad frame produces an error, never a panic; the streaming loop drops the
//! frame and carries on.

use bytes::Bytes;
use lenscast_core::{Error, Frame, PixelFormat, Result};

/// Encodes RGB24 frames to JPEG at a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// Create an encoder with the given quality (1-100, clamped).
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Encode one frame to a JPEG byte buffer.
    ///
    /// The frame must already be RGB24 (`Frame::into_rgb`) and sized
    /// consistently with its dimensions.
    pub fn encode(&self, frame: &Frame) -> Result<Bytes> {
        if frame.format != PixelFormat::Rgb24 {
            return Err(Error::Encode(format!(
                "expected RGB24 input, got {:?}",
                frame.format
            )));
        }
        if !frame.is_valid() {
            return Err(Error::Encode(format!(
                "buffer of {} bytes does not match {}x{} frame",
                frame.data().len(),
                frame.width,
                frame.height
            )));
        }

        let mut buf = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.quality);
        encoder
            .encode(
                frame.data(),
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| Error::Encode(e.to_string()))?;

        Ok(Bytes::from(buf))
    }
}
