//! Audio route management
//!
//! `AudioGraph` owns the single active source-to-tap binding. Routing a
//! new playable connects it before the previous route is torn down, so the
//! tap never observes a moment with zero connected sources during a song
//! switch. A failed connect leaves the previous route exactly as it was.

use crate::error::Result;

/// A connected playback source. Disconnecting tears the source out of the
/// signal path; the value may stay alive afterwards for trailing
/// bookkeeping.
pub trait SourcePort {
    fn disconnect(&mut self);
}

/// Route states observable on the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteState {
    #[default]
    Idle,
    Routed,
}

/// Owner of the active route. There is no stop during normal playback:
/// routes are replaced, never cleared, until the whole graph shuts down.
pub struct AudioGraph<P: SourcePort> {
    current: Option<P>,
}

impl<P: SourcePort> AudioGraph<P> {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn state(&self) -> RouteState {
        if self.current.is_some() {
            RouteState::Routed
        } else {
            RouteState::Idle
        }
    }

    pub fn current(&self) -> Option<&P> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut P> {
        self.current.as_mut()
    }

    /// Swap in a new route. `connect` runs first; only once it has produced
    /// a live port is the previous route disconnected. On error the
    /// previous route keeps playing untouched.
    pub fn route<F>(&mut self, connect: F) -> Result<()>
    where
        F: FnOnce() -> Result<P>,
    {
        let port = connect()?;
        if let Some(mut old) = self.current.replace(port) {
            old.disconnect();
        }
        Ok(())
    }

    /// Tear down the active route. Shutdown path only.
    pub fn clear(&mut self) {
        if let Some(mut old) = self.current.take() {
            old.disconnect();
        }
    }
}

impl<P: SourcePort> Default for AudioGraph<P> {
    fn default() -> Self {
        Self::new()
    }
}
