//! Camera startup sequencing
//!
//! The camera moves through a one-directional state machine:
//! Uninitialized -> Probing -> Configured -> Started -> Stopped.
//! Transitions are not retried within a process run; a failure before
//! Started aborts server startup.

use lenscast_core::{Config, Error, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::source::FrameSource;
use crate::v4l2::{probe, V4l2Source};

/// Settle time after stream-on before the first capture is trusted.
const STABILIZATION_DELAY: Duration = Duration::from_secs(2);

/// Camera lifecycle states, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Uninitialized,
    Probing,
    Configured,
    Started,
    Stopped,
}

impl CameraState {
    /// The only state this one may advance to, if any.
    pub fn successor(self) -> Option<CameraState> {
        match self {
            CameraState::Uninitialized => Some(CameraState::Probing),
            CameraState::Probing => Some(CameraState::Configured),
            CameraState::Configured => Some(CameraState::Started),
            CameraState::Started => Some(CameraState::Stopped),
            CameraState::Stopped => None,
        }
    }
}

fn advance(state: &mut CameraState, next: CameraState) -> Result<()> {
    if state.successor() != Some(next) {
        return Err(Error::Start(format!(
            "invalid camera state transition {state:?} -> {next:?}"
        )));
    }
    debug!("Camera state: {:?} -> {:?}", state, next);
    *state = next;
    Ok(())
}

/// Probe, configure, and start the camera, returning a source that is
/// producing trustworthy frames.
///
/// Blocks for the stabilization delay and one test capture; call before the
/// listening socket is bound.
pub fn open(config: &Config) -> Result<V4l2Source> {
    let mut state = CameraState::Uninitialized;

    advance(&mut state, CameraState::Probing)?;
    let device = probe(config)?;

    advance(&mut state, CameraState::Configured)?;
    let mut source = V4l2Source::configure(device, config)?;

    advance(&mut state, CameraState::Started)?;
    source.start()?;

    info!(
        "Waiting {:?} for the sensor to stabilize...",
        STABILIZATION_DELAY
    );
    std::thread::sleep(STABILIZATION_DELAY);

    let frame = source
        .capture()
        .map_err(|e| Error::Start(format!("test capture failed: {e}")))?;
    info!(
        "Test capture: {}x{} {:?}, {} bytes",
        frame.width,
        frame.height,
        frame.format,
        frame.data().len()
    );

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_advance_in_a_single_direction() {
        let chain = [
            CameraState::Uninitialized,
            CameraState::Probing,
            CameraState::Configured,
            CameraState::Started,
            CameraState::Stopped,
        ];
        for pair in chain.windows(2) {
            assert_eq!(pair[0].successor(), Some(pair[1]));
        }
        assert_eq!(CameraState::Stopped.successor(), None);
    }

    #[test]
    fn skipping_a_state_is_rejected() {
        let mut state = CameraState::Uninitialized;
        assert!(advance(&mut state, CameraState::Started).is_err());
        assert_eq!(state, CameraState::Uninitialized);

        assert!(advance(&mut state, CameraState::Probing).is_ok());
        assert_eq!(state, CameraState::Probing);
    }

    #[test]
    fn states_never_move_backwards() {
        let mut state = CameraState::Started;
        assert!(advance(&mut state, CameraState::Configured).is_err());
        assert_eq!(state, CameraState::Started);
    }
}
