//! Frame source boundary and the shared camera handle

use lenscast_core::{Error, Frame, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::info;

/// Produces frames on demand. Implemented by the V4L2 capture backend and by
/// test doubles.
///
/// Implementations are not required to tolerate concurrent capture calls;
/// `SharedCamera` serializes access for them.
pub trait FrameSource: Send {
    /// Capture the next frame. Blocks until the driver hands one back.
    fn capture(&mut self) -> Result<Frame>;

    /// Stop the underlying stream. Called at most once, during shutdown.
    fn stop(&mut self);
}

/// The process-wide camera handle.
///
/// Exactly one instance exists for the server's lifetime. Any number of stream
/// sessions capture through it concurrently; the mutex serializes the actual
/// capture calls. `close` takes the source out of the option, so a capture
/// issued after close gets `Error::CameraClosed` instead of reaching the
/// device.
pub struct SharedCamera {
    source: Mutex<Option<Box<dyn FrameSource>>>,
    connected: AtomicBool,
}

impl SharedCamera {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source: Mutex::new(Some(source)),
            connected: AtomicBool::new(true),
        }
    }

    /// Capture one frame, waiting for exclusive access to the source.
    pub async fn capture(&self) -> Result<Frame> {
        let mut guard = self.source.lock().await;
        match guard.as_mut() {
            Some(source) => source.capture(),
            None => Err(Error::CameraClosed),
        }
    }

    /// Whether the handle is open. Reads a flag only; never touches the
    /// capture mutex, so callers are not delayed by an in-flight capture.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Stop the camera and drop the source. Idempotent; only the first call
    /// reaches the device.
    pub async fn close(&self) {
        let mut guard = self.source.lock().await;
        if let Some(mut source) = guard.take() {
            self.connected.store(false, Ordering::Relaxed);
            source.stop();
            info!("Camera stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use lenscast_core::PixelFormat;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    type CallLog = Arc<StdMutex<Vec<&'static str>>>;

    struct ScriptedSource {
        frames: VecDeque<Result<Frame>>,
        calls: CallLog,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Result<Frame>>, calls: CallLog) -> Self {
            Self {
                frames: frames.into(),
                calls,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn capture(&mut self) -> Result<Frame> {
            self.calls.lock().unwrap().push("capture");
            self.frames
                .pop_front()
                .unwrap_or_else(|| Err(Error::Capture("script exhausted".into())))
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop");
        }
    }

    fn test_frame(sequence: u64) -> Frame {
        Frame::new(Bytes::from(vec![0u8; 12]), 2, 2, PixelFormat::Rgb24, sequence)
    }

    #[tokio::test]
    async fn capture_goes_through_to_the_source() {
        let calls = CallLog::default();
        let camera = SharedCamera::new(Box::new(ScriptedSource::new(
            vec![Ok(test_frame(1)), Ok(test_frame(2))],
            calls.clone(),
        )));

        assert_eq!(camera.capture().await.unwrap().sequence, 1);
        assert_eq!(camera.capture().await.unwrap().sequence, 2);
        assert_eq!(*calls.lock().unwrap(), vec!["capture", "capture"]);
    }

    #[tokio::test]
    async fn capture_after_close_fails_without_touching_the_source() {
        let calls = CallLog::default();
        let camera = SharedCamera::new(Box::new(ScriptedSource::new(
            vec![Ok(test_frame(1))],
            calls.clone(),
        )));

        camera.close().await;
        assert!(matches!(camera.capture().await, Err(Error::CameraClosed)));
        // stop is the last call the source ever sees
        assert_eq!(*calls.lock().unwrap(), vec!["stop"]);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let calls = CallLog::default();
        let camera = SharedCamera::new(Box::new(ScriptedSource::new(vec![], calls.clone())));

        camera.close().await;
        camera.close().await;
        assert_eq!(*calls.lock().unwrap(), vec!["stop"]);
    }

    #[tokio::test]
    async fn connected_flag_tracks_close() {
        let calls = CallLog::default();
        let camera = SharedCamera::new(Box::new(ScriptedSource::new(vec![], calls)));

        assert!(camera.is_connected());
        camera.close().await;
        assert!(!camera.is_connected());
    }

    #[tokio::test]
    async fn concurrent_captures_are_serialized() {
        let calls = CallLog::default();
        let camera = Arc::new(SharedCamera::new(Box::new(ScriptedSource::new(
            (1..=4).map(|n| Ok(test_frame(n))).collect(),
            calls.clone(),
        ))));

        let a = tokio::spawn({
            let camera = camera.clone();
            async move {
                vec![
                    camera.capture().await.unwrap().sequence,
                    camera.capture().await.unwrap().sequence,
                ]
            }
        });
        let b = tokio::spawn({
            let camera = camera.clone();
            async move {
                vec![
                    camera.capture().await.unwrap().sequence,
                    camera.capture().await.unwrap().sequence,
                ]
            }
        });

        let mut seen: Vec<u64> = a.await.unwrap();
        seen.extend(b.await.unwrap());
        seen.sort_unstable();
        // Each scripted frame was handed out exactly once
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }
}
