//! LensCast Encoder - JPEG encoding of captured frames

pub mod jpeg;

pub use jpeg::JpegEncoder;
