use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Engine lifecycle. Transitions only move forward; `Stopped` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    Unstarted = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Unstarted,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unstarted => "unstarted",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        })
    }
}

/// Shared lifecycle cell read by both loops.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Unstarted as u8),
        }
    }

    pub(crate) fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves `from -> to`; on failure returns the state actually observed.
    pub(crate) fn transition(
        &self,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Result<(), LifecycleState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(LifecycleState::from_u8)
    }

    /// Requests shutdown. Returns true if this call left `Running`.
    pub(crate) fn request_stop(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Stopping)
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.state
            .store(LifecycleState::Stopped as u8, Ordering::Release);
    }
}

static ENGINE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Process-wide claim held while an engine is between start and stop.
#[derive(Debug)]
pub(crate) struct ActiveGuard(());

impl ActiveGuard {
    pub(crate) fn claim() -> Option<Self> {
        ENGINE_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(()))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ENGINE_ACTIVE.store(false, Ordering::Release);
    }
}
