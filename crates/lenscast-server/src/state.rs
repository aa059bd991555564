//! Shared application state

use lenscast_camera::SharedCamera;
use lenscast_core::Config;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State shared by every handler and stream session.
///
/// The camera handle is injected here once at startup and passed by reference
/// into each session; there is no module-level singleton.
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// The single process-wide camera handle
    pub camera: Arc<SharedCamera>,
    /// Set once at shutdown; sessions check it every loop iteration
    shutdown: Arc<AtomicBool>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, camera: Arc<SharedCamera>) -> Self {
        Self {
            config,
            camera,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal every stream session to end after its current iteration.
    pub fn trigger_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Whether shutdown has been requested
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Clone of the shutdown flag, for handing into a session.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }
}
