//! HTTP request handlers
//!
//! Routes: `/` redirects to the stream, `/stream.mjpg` serves the multipart
//! JPEG stream, `/health` reports liveness, everything else is 404.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use futures::StreamExt;
use lenscast_encoder::JpegEncoder;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::session::{StreamSession, BOUNDARY};
use crate::state::AppState;

/// Parts buffered between a session and its response body. Kept small so a
/// slow client exerts backpressure on its own session only.
const PART_QUEUE_DEPTH: usize = 2;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/stream.mjpg", get(stream_handler))
        .route("/health", get(health_handler))
        .fallback(fallback_handler)
        .with_state(state)
}

/// Redirect the root to the stream endpoint
async fn root_handler() -> impl IntoResponse {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/stream.mjpg")],
    )
}

/// Serve the MJPEG stream to one viewer.
///
/// Spawns a dedicated session task per connection; many viewers stream
/// concurrently against the one shared camera. The session ends when the body
/// is dropped (client disconnect) or shutdown is signalled.
async fn stream_handler(State(state): State<Arc<AppState>>) -> Response {
    let (tx, rx) = mpsc::channel::<Bytes>(PART_QUEUE_DEPTH);

    let session = StreamSession::new(
        state.camera.clone(),
        JpegEncoder::new(state.config.jpeg_quality),
        state.config.frame_interval(),
        state.shutdown_flag(),
    );
    tokio::spawn(session.run(tx));

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::AGE, "0")
        .header(header::CACHE_CONTROL, "no-cache, private")
        .header(header::PRAGMA, "no-cache")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={BOUNDARY}"),
        )
        .body(Body::from_stream(stream))
        .expect("static headers are valid")
}

/// Liveness payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Constant "ok" when the handler is reachable
    pub status: &'static str,
    /// "connected" while the camera handle is open
    pub camera: &'static str,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}

/// Report liveness. Inspects handle presence only; never issues a capture, so
/// it answers promptly even while captures are blocked or failing.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        camera: if state.camera.is_connected() {
            "connected"
        } else {
            "disconnected"
        },
        timestamp: unix_time(),
    })
}

async fn fallback_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn unix_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lenscast_camera::{FrameSource, SharedCamera};
    use lenscast_core::{Config, Error, Frame, PixelFormat, Result};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    type CallLog = Arc<StdMutex<Vec<&'static str>>>;

    struct ScriptedSource {
        frames: VecDeque<Result<Frame>>,
        calls: CallLog,
    }

    impl FrameSource for ScriptedSource {
        fn capture(&mut self) -> Result<Frame> {
            self.calls.lock().unwrap().push("capture");
            self.frames
                .pop_front()
                .unwrap_or(Err(Error::CameraClosed))
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop");
        }
    }

    fn state_over(frames: Vec<Result<Frame>>) -> (Arc<AppState>, CallLog) {
        let calls = CallLog::default();
        let source = ScriptedSource {
            frames: frames.into(),
            calls: calls.clone(),
        };
        let camera = Arc::new(SharedCamera::new(Box::new(source)));
        (Arc::new(AppState::new(Config::new(), camera)), calls)
    }

    fn rgb_frame(sequence: u64) -> Result<Frame> {
        Ok(Frame::new(
            Bytes::from(vec![64u8; 12]),
            2,
            2,
            PixelFormat::Rgb24,
            sequence,
        ))
    }

    #[tokio::test]
    async fn root_redirects_to_the_stream() {
        let response = root_handler().await.into_response();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/stream.mjpg"
        );
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let response = fallback_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_connected_without_capturing() {
        let (state, calls) = state_over(vec![rgb_frame(1)]);

        let Json(health) = health_handler(State(state)).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.camera, "connected");
        assert!(health.timestamp > 0.0);
        // handle presence only, no camera I/O
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_answers_even_when_capture_fails() {
        let (state, _calls) = state_over(vec![Err(Error::Capture("dead sensor".into()))]);

        let Json(health) = health_handler(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.camera, "connected");
    }

    #[tokio::test]
    async fn health_reports_disconnected_after_close() {
        let (state, _calls) = state_over(vec![]);
        state.camera.close().await;

        let Json(health) = health_handler(State(state)).await;
        assert_eq!(health.camera, "disconnected");
    }

    #[tokio::test]
    async fn stream_response_carries_multipart_headers_and_parts() {
        let (state, _calls) = state_over(vec![rgb_frame(1), rgb_frame(2)]);

        let response = stream_handler(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "multipart/x-mixed-replace; boundary=FRAME"
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-cache, private"
        );
        assert_eq!(response.headers().get(header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(response.headers().get(header::AGE).unwrap(), "0");

        // the scripted source closes after two frames, ending the body
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert_eq!(text.matches("--FRAME\r\n").count(), 2);
        assert_eq!(text.matches("Content-Type: image/jpeg\r\n").count(), 2);
    }

    #[tokio::test]
    async fn shutdown_flag_is_shared_with_sessions() {
        let (state, _calls) = state_over(vec![]);
        assert!(!state.is_shutting_down());
        state.trigger_shutdown();
        assert!(state.is_shutting_down());
        assert!(state.shutdown_flag().load(std::sync::atomic::Ordering::Relaxed));
    }
}
