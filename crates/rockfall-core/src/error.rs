//! Error taxonomy for the simulation core.
//!
//! Errors here are the *unrecoverable-locally* conditions: a caller that
//! receives one must halt the frame loop rather than continue with corrupted
//! simulation state. Recoverable conditions (no free slot to spawn into,
//! rewinding with empty history) are absorbed as per-frame no-ops and never
//! surface as errors.

use thiserror::Error;

use crate::entity::{ComponentKind, EntityHandle, EntityKind};

/// Errors emitted by the simulation core.
///
/// Every variant represents a condition the frame loop cannot recover from:
/// either a programmer error (pool misconfiguration, duplicate component) or
/// a resource-exhaustion condition discovered at startup.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity handle exceeded the live entity count.
    ///
    /// Handles double as indices; an out-of-range handle is never clamped or
    /// treated as "no entity".
    #[error("entity handle {handle} out of range (live entity count: {len})")]
    HandleOutOfRange {
        /// The offending handle value.
        handle: u32,
        /// Number of live entities in the registry.
        len: usize,
    },

    /// No entity of the requested kind exists in the registry.
    #[error("no entity of kind {0} exists")]
    EntityKindNotFound(EntityKind),

    /// The component slab has no free slots left.
    ///
    /// Component storage is reserved once at startup; running out means the
    /// startup sizing was wrong and the process cannot continue.
    #[error("component slab exhausted (capacity: {capacity})")]
    SlabExhausted {
        /// Total slot capacity of the slab.
        capacity: usize,
    },

    /// A component of this kind is already attached to the entity.
    #[error("entity {handle} already has a {kind} component")]
    DuplicateComponentKind {
        /// The entity that already carries the component.
        handle: EntityHandle,
        /// The duplicated component kind.
        kind: ComponentKind,
    },

    /// A pool's index range overlaps one registered earlier.
    #[error("pool range [{start}, {end}) for {kind} overlaps an existing pool")]
    PoolRangeOverlap {
        /// Kind whose registration was rejected.
        kind: EntityKind,
        /// Start of the rejected range.
        start: u32,
        /// One past the end of the rejected range.
        end: u32,
    },

    /// A pool was registered twice for the same entity kind.
    #[error("a pool for {0} is already registered")]
    PoolAlreadyRegistered(EntityKind),

    /// No sprite metadata was supplied for a required animation.
    #[error("missing sprite metadata for {0:?}")]
    MissingSpriteMeta(crate::config::AnimationKind),

    /// Configuration values that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_out_of_range_message() {
        let err = CoreError::HandleOutOfRange { handle: 99, len: 4 };
        assert_eq!(
            err.to_string(),
            "entity handle 99 out of range (live entity count: 4)"
        );
    }

    #[test]
    fn kind_not_found_message() {
        let err = CoreError::EntityKindNotFound(EntityKind::Asteroid);
        assert_eq!(err.to_string(), "no entity of kind Asteroid exists");
    }

    #[test]
    fn slab_exhausted_message() {
        let err = CoreError::SlabExhausted { capacity: 128 };
        assert_eq!(err.to_string(), "component slab exhausted (capacity: 128)");
    }
}
