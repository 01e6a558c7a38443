//! Broadcast readiness signal shared between writers and the reader.

use std::time::Instant;

use parking_lot::{Condvar, Mutex};

/// Why a [`Notify::wait`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// Something changed; the caller should re-check the buffer.
    Ready,
    /// The signal was stopped. Returned forever after [`Notify::stop`].
    Stopped,
    /// The deadline passed without a signal.
    TimedOut,
}

/// A coalescing wake-up flag that can be stopped once for good.
///
/// Any number of `signal()` calls collapse into a single pending wake-up, so a
/// waiter must always re-validate the state it cares about. `stop()` is a
/// one-way broadcast: every current and future waiter returns
/// [`Wake::Stopped`].
pub(crate) struct Notify {
    state: Mutex<NotifyState>,
    cond: Condvar,
}

struct NotifyState {
    pending: bool,
    stopped: bool,
}

impl Notify {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(NotifyState {
                pending: false,
                stopped: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Marks the signal as pending and wakes waiters. No-op once stopped.
    pub(crate) fn signal(&self) {
        let mut state = self.state.lock();
        if state.stopped {
            return;
        }
        state.pending = true;
        self.cond.notify_all();
    }

    /// Stops the signal permanently and wakes every waiter.
    pub(crate) fn stop(&self) {
        let mut state = self.state.lock();
        if state.stopped {
            return;
        }
        state.stopped = true;
        state.pending = false;
        self.cond.notify_all();
    }

    #[cfg(test)]
    pub(crate) fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Blocks until the signal fires, is stopped, or `deadline` passes.
    ///
    /// A pending signal is consumed by the waiter that observes it.
    pub(crate) fn wait(&self, deadline: Option<Instant>) -> Wake {
        let mut state = self.state.lock();
        loop {
            if state.stopped {
                return Wake::Stopped;
            }
            if state.pending {
                state.pending = false;
                return Wake::Ready;
            }
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut state, deadline).timed_out()
                        && !state.pending
                        && !state.stopped
                    {
                        return Wake::TimedOut;
                    }
                }
                None => self.cond.wait(&mut state),
            }
        }
    }
}
