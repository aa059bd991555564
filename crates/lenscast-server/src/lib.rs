//! LensCast Server - Axum-based MJPEG streaming server
//!
//! This crate provides the HTTP dispatcher, the per-client stream session,
//! and the health endpoint.

pub mod http;
pub mod session;
pub mod state;

pub use http::create_router;
pub use session::StreamSession;
pub use state::AppState;
