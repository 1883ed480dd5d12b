//! Frame-counted deferred callbacks.
//!
//! Game logic frequently wants "do this in N frames": arm a level
//! transition, delay a pool respawn, time out a banner. The scheduler holds
//! boxed closures with a frame countdown; [`CallbackScheduler::update`] runs
//! once per frame, decrements every countdown, and fires the due closures
//! against the mutable session state. A closure fires exactly once and is
//! consumed by the call.
//!
//! Callbacks close over plain values and receive the whole
//! [`SessionState`] instead of capturing references into the world, which
//! keeps them `'static` and keeps the scheduler out of every borrow the
//! frame loop takes.

use std::fmt;

use crate::simulation::SessionState;

/// Deferred action run against the session when its countdown expires.
pub type Callback = Box<dyn FnOnce(&mut SessionState)>;

struct Scheduled {
    frames_remaining: u32,
    callback: Callback,
}

/// Orders callbacks by frame countdown and fires each exactly once.
#[derive(Default)]
pub struct CallbackScheduler {
    pending: Vec<Scheduled>,
}

impl fmt::Debug for CallbackScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackScheduler")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl CallbackScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `callback` to fire after `frames` calls to
    /// [`CallbackScheduler::update`].
    ///
    /// `frames = 3` fires on the third update from now, not before and not
    /// again. `frames = 0` fires on the next update.
    pub fn schedule(&mut self, frames: u32, callback: Callback) {
        self.pending.push(Scheduled {
            frames_remaining: frames,
            callback,
        });
    }

    /// Decrements every countdown and fires the callbacks that reach zero.
    ///
    /// Due callbacks run in the order they were scheduled. Returns the
    /// number fired this frame.
    pub fn update(&mut self, session: &mut SessionState) -> usize {
        for scheduled in &mut self.pending {
            scheduled.frames_remaining = scheduled.frames_remaining.saturating_sub(1);
        }
        if !self.pending.iter().any(|s| s.frames_remaining == 0) {
            return 0;
        }

        let (due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|s| s.frames_remaining == 0);
        self.pending = rest;

        let fired = due.len();
        for scheduled in due {
            (scheduled.callback)(session);
        }
        fired
    }

    /// Drops every pending callback without firing it.
    ///
    /// Used on level transitions so an in-flight countdown from the old
    /// level cannot fire into the new one.
    pub fn flush_all(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(dropped = self.pending.len(), "flushed pending callbacks");
        }
        self.pending.clear();
    }

    /// Number of callbacks still counting down.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
