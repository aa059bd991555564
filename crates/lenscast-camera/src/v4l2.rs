//! V4L2 capture backend using memory-mapped streaming I/O

use bytes::Bytes;
use lenscast_core::{Config, Error, Frame, PixelFormat, Result};
use tracing::{info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::source::FrameSource;

/// Buffer count kept low to bound memory on small boards.
const CAPTURE_BUFFERS: u32 = 2;

/// Enumerate camera devices and open the configured one.
///
/// Zero enumerated devices is a hard failure; the caller aborts startup.
pub(crate) fn probe(config: &Config) -> Result<Device> {
    let nodes = v4l::context::enum_devices();
    info!("Found {} camera device(s)", nodes.len());

    if nodes.is_empty() {
        return Err(Error::NoCamera);
    }

    for node in &nodes {
        info!(
            "  /dev/video{}: {}",
            node.index(),
            node.name().unwrap_or_else(|| "unknown".to_string())
        );
    }

    let device = Device::new(config.device_index).map_err(|e| {
        Error::Probe(format!(
            "failed to open /dev/video{}: {e}",
            config.device_index
        ))
    })?;

    let caps = device
        .query_caps()
        .map_err(|e| Error::Probe(e.to_string()))?;
    info!("Using {} ({})", caps.card, caps.driver);

    if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
        return Err(Error::Probe(format!(
            "{} does not support video capture",
            caps.card
        )));
    }

    Ok(device)
}

/// V4L2-backed frame source.
///
/// Not safe for concurrent capture from multiple tasks; wrap it in
/// `SharedCamera`, which serializes access.
pub struct V4l2Source {
    device: Box<Device>,
    stream: Option<MmapStream<'static>>,
    width: u32,
    height: u32,
    format: PixelFormat,
    sequence: u64,
}

impl V4l2Source {
    /// Apply resolution, pixel format, and frame rate to an opened device.
    ///
    /// RGB24 is requested; a driver that answers BGR24 is accepted and the
    /// frames are tagged so sessions normalize before encoding. Any other
    /// negotiated format aborts startup.
    pub(crate) fn configure(device: Device, config: &Config) -> Result<Self> {
        let mut fmt = device
            .format()
            .map_err(|e| Error::Configure(e.to_string()))?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = FourCC::new(b"RGB3");

        let actual = device
            .set_format(&fmt)
            .map_err(|e| Error::Configure(e.to_string()))?;

        let format = match &actual.fourcc.repr {
            b"RGB3" => PixelFormat::Rgb24,
            b"BGR3" => PixelFormat::Bgr24,
            _ => {
                return Err(Error::Configure(format!(
                    "driver negotiated unsupported pixel format {}",
                    actual.fourcc
                )))
            }
        };

        if (actual.width, actual.height) != (config.width, config.height) {
            warn!(
                "Driver negotiated {}x{} instead of {}x{}",
                actual.width, actual.height, config.width, config.height
            );
        }

        device
            .set_params(&Parameters::with_fps(config.fps))
            .map_err(|e| Error::Configure(e.to_string()))?;

        info!(
            "Camera configured: {}x{} {} @ {} fps",
            actual.width, actual.height, actual.fourcc, config.fps
        );

        Ok(Self {
            device: Box::new(device),
            stream: None,
            width: actual.width,
            height: actual.height,
            format,
            sequence: 0,
        })
    }

    /// Begin streaming with memory-mapped buffers.
    pub(crate) fn start(&mut self) -> Result<()> {
        let stream = MmapStream::with_buffers(&self.device, Type::VideoCapture, CAPTURE_BUFFERS)
            .map_err(|e| Error::Start(e.to_string()))?;
        self.stream = Some(stream);
        info!("Capture stream started with {} buffers", CAPTURE_BUFFERS);
        Ok(())
    }

    /// Negotiated pixel format of captured frames.
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }
}

impl FrameSource for V4l2Source {
    fn capture(&mut self) -> Result<Frame> {
        let stream = self.stream.as_mut().ok_or(Error::CameraClosed)?;
        let (buf, _meta) = stream.next().map_err(|e| Error::Capture(e.to_string()))?;

        self.sequence = self.sequence.wrapping_add(1);

        Ok(Frame::new(
            Bytes::copy_from_slice(buf),
            self.width,
            self.height,
            self.format,
            self.sequence,
        ))
    }

    fn stop(&mut self) {
        // Dropping the mmap stream issues VIDIOC_STREAMOFF.
        self.stream.take();
    }
}
