//! Restore-in-progress tracking
//!
//! A restore replays geometry and visibility onto live windows, and the
//! toolkit may dispatch events synchronously while that happens. Code reached
//! from those events asks [`restore_in_progress`] to tell a replayed change
//! apart from a user action (e.g. a floating window hidden by the restore
//! must not delete itself).
//!
//! The state is owned by [`RestoreSession`] guards. Dropping a guard puts the
//! previous state back, so the flag is cleared on every exit path and nested
//! sessions unwind correctly. All UI work happens on one thread, so the state
//! is thread-local.

use std::cell::Cell;

/// Phases of a layout restore, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RestorePhase {
    #[default]
    Idle,
    Clearing,
    RestoringMainWindows,
    RestoringFloatingWindows,
    RestoringClosedPanels,
}

#[derive(Debug, Clone, Copy, Default)]
struct SessionState {
    active: bool,
    phase: RestorePhase,
}

thread_local! {
    static SESSION: Cell<SessionState> = const {
        Cell::new(SessionState {
            active: false,
            phase: RestorePhase::Idle,
        })
    };
}

/// True while any [`RestoreSession`] is alive on this thread
pub fn restore_in_progress() -> bool {
    SESSION.with(|s| s.get().active)
}

/// Phase of the restore currently running on this thread
pub fn current_phase() -> RestorePhase {
    SESSION.with(|s| s.get().phase)
}

/// Scoped token marking a restore in progress
#[must_use = "the restore flag is cleared as soon as the session is dropped"]
#[derive(Debug)]
pub struct RestoreSession {
    previous: SessionState,
}

impl RestoreSession {
    pub fn begin() -> Self {
        let previous = SESSION.with(|s| {
            let previous = s.get();
            s.set(SessionState {
                active: true,
                phase: previous.phase,
            });
            previous
        });
        Self { previous }
    }

    /// Advance the phase reported by [`current_phase`]
    pub fn enter(&self, phase: RestorePhase) {
        tracing::debug!(?phase, "restore phase");
        SESSION.with(|s| {
            s.set(SessionState {
                active: true,
                phase,
            })
        });
    }
}

impl Drop for RestoreSession {
    fn drop(&mut self) {
        SESSION.with(|s| s.set(self.previous));
    }
}
