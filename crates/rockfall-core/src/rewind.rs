//! Bounded ring of whole-world snapshots for frame-by-frame time rewind.
//!
//! Every simulated frame starts by pushing a [`Snapshot`] of the complete
//! world (entity store, bounding circles, component slab, and session
//! counters) into the ring. Holding the rewind input then pops snapshots
//! newest-first, restoring the world one frame per update. Restoration is
//! exact because the snapshot is a clone of the state, not a delta: a
//! capture followed by an immediate rewind reproduces the captured frame
//! bit-for-bit.
//!
//! The ring holds at most `capacity` frames. Capturing while full evicts
//! the oldest frame, and rewinding past the oldest retained frame is a
//! silent no-op that leaves the world at that frame.
//!
//! Pending scheduler callbacks are deliberately not captured: closures are
//! neither cloneable nor serializable, and the frame loop flushes them
//! whenever a rewind begins.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::registry::{Circle, Registry};
use crate::simulation::SessionState;
use crate::slab::ComponentSlab;

/// Complete world state as of the start of one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    entities: Vec<Entity>,
    circles: Vec<Circle>,
    slab: ComponentSlab,
    session: SessionState,
}

/// Fixed-depth history of per-frame snapshots, newest at the back.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RewindBuffer {
    capacity: usize,
    frames: VecDeque<Snapshot>,
}

impl RewindBuffer {
    /// Creates a buffer retaining at most `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Pushes a snapshot of the current world, evicting the oldest frame
    /// when the buffer is full.
    pub fn capture(&mut self, registry: &Registry, session: &SessionState) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(Snapshot {
            entities: registry.entities().to_vec(),
            circles: registry.circles().to_vec(),
            slab: registry.slab().clone(),
            session: session.clone(),
        });
    }

    /// Pops the most recent snapshot and restores the world to it.
    ///
    /// Returns `false` without touching the world when the history is
    /// empty; rewinding past the retained depth is recoverable, not an
    /// error.
    pub fn rewind_one_frame(&mut self, registry: &mut Registry, session: &mut SessionState) -> bool {
        let Some(snapshot) = self.frames.pop_back() else {
            tracing::trace!("rewind past retained history ignored");
            return false;
        };
        registry.restore(snapshot.entities, snapshot.circles, snapshot.slab);
        *session = snapshot.session;
        true
    }

    /// Drops the entire history.
    ///
    /// Called on level transitions so a rewind can never cross into the
    /// previous level.
    pub fn flush(&mut self) {
        if !self.frames.is_empty() {
            tracing::debug!(dropped = self.frames.len(), "flushed rewind history");
        }
        self.frames.clear();
    }

    /// Number of frames currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frame is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Maximum number of retained frames.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
