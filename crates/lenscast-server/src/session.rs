//! Per-client stream session
//!
//! One session runs for each connected viewer, pulling frames from the shared
//! camera, encoding them, and feeding multipart parts into the response body
//! channel until the client goes away or the server shuts down.

use bytes::Bytes;
use lenscast_camera::SharedCamera;
use lenscast_core::Error;
use lenscast_encoder::JpegEncoder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Multipart boundary marker. Part of the wire contract with MJPEG clients.
pub const BOUNDARY: &str = "FRAME";

/// Log a progress line roughly every 10 seconds at the target rate.
const FRAME_LOG_INTERVAL: u64 = 300;

/// Build one multipart part around an encoded JPEG.
///
/// The layout is byte-exact for client compatibility: boundary line, part
/// headers, blank line, body, trailing CRLF.
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let header = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    );

    let mut part = Vec::with_capacity(header.len() + jpeg.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

/// The frame loop for a single viewer.
pub struct StreamSession {
    camera: Arc<SharedCamera>,
    encoder: JpegEncoder,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    frames_sent: u64,
    started: Instant,
}

impl StreamSession {
    pub fn new(
        camera: Arc<SharedCamera>,
        encoder: JpegEncoder,
        interval: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            camera,
            encoder,
            interval,
            shutdown,
            frames_sent: 0,
            started: Instant::now(),
        }
    }

    /// Run until the client disconnects, the camera closes, or shutdown is
    /// signalled. Each iteration: capture, normalize, encode, send, pace.
    ///
    /// A failed capture or encode drops that frame and keeps the session
    /// alive; a failed send means the viewer went away, which is a normal
    /// exit, not a fault.
    pub async fn run(mut self, parts: mpsc::Sender<Bytes>) {
        debug!("Stream session started");

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!(
                    "Session ending after {} frames: server shutting down",
                    self.frames_sent
                );
                break;
            }

            let frame = match self.camera.capture().await {
                Ok(frame) => frame,
                Err(Error::CameraClosed) => {
                    info!(
                        "Session ending after {} frames: camera closed",
                        self.frames_sent
                    );
                    break;
                }
                Err(e) => {
                    warn!("Frame capture failed: {e}");
                    self.pace().await;
                    continue;
                }
            };

            let frame = frame.into_rgb();
            let jpeg = match self.encoder.encode(&frame) {
                Ok(jpeg) => jpeg,
                Err(e) => {
                    warn!("Failed to encode frame {}: {e}", frame.sequence);
                    self.pace().await;
                    continue;
                }
            };

            if parts.send(multipart_part(&jpeg)).await.is_err() {
                info!(
                    "Client disconnected after {} frames ({:.1?})",
                    self.frames_sent,
                    self.started.elapsed()
                );
                break;
            }

            self.frames_sent += 1;
            if self.frames_sent % FRAME_LOG_INTERVAL == 0 {
                debug!("Streamed {} frames", self.frames_sent);
            }

            self.pace().await;
        }
    }

    /// Fixed inter-iteration delay. Capture and encode latency is not
    /// subtracted, so throughput degrades below target under load instead of
    /// bursting.
    async fn pace(&self) {
        tokio::time::sleep(self.interval).await;
    }
}
