//! Entity types for the simulation core.
//!
//! This module provides:
//! - [`EntityHandle`]: stable integer reference to an entity
//! - [`EntityKind`]: classification tag (player, bullet, asteroid, cursor)
//! - [`Entity`]: position, active flag, and attached component slots
//!
//! # Handles are indices
//!
//! An `EntityHandle` doubles as an index into the registry's backing store.
//! The store is reserved to its full size before any handle is issued and
//! never reorders or erases entries afterwards; deactivation is a flag flip,
//! not a removal. A handle therefore stays valid for the process lifetime.

pub mod components;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::slab::SlotIndex;

pub use components::{
    ActiveState, AnimationState, AttributeData, AttributeState, CollisionState, Component,
    ComponentKind, MovementMode, MovementState, RepeatMode,
};

/// Stable integer reference to an entity.
///
/// Handles are indices into the registry's entity store. They are issued in
/// creation order, never change, and never become dangling because entities
/// are deactivated rather than destroyed.
///
/// # Example
///
/// ```
/// use rockfall_core::entity::EntityHandle;
///
/// let a = EntityHandle::new(1);
/// let b = EntityHandle::new(2);
/// assert!(a < b);
/// assert_eq!(a.as_index(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// Creates a handle from a raw index value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the handle as a store index.
    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({})", self.0)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityHandle {
    fn from(raw: u32) -> Self {
        Self::new(raw)
    }
}

impl From<EntityHandle> for u32 {
    fn from(handle: EntityHandle) -> Self {
        handle.0
    }
}

/// Entity classification tag.
///
/// The kind decides which pool an entity belongs to, how its components are
/// advanced each frame, and how collision events against it are resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player ship. Exactly one, at store index 0, always live.
    Player,
    /// A pooled bullet projectile.
    Bullet,
    /// A pooled asteroid.
    Asteroid,
    /// The aiming cursor. Exactly one, never pooled, never collides.
    Cursor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Bullet => write!(f, "Bullet"),
            Self::Asteroid => write!(f, "Asteroid"),
            Self::Cursor => write!(f, "Cursor"),
        }
    }
}

/// A simulated game object.
///
/// An entity owns a 2D position, an active flag, a kind tag, and an ordered
/// list of `(ComponentKind, SlotIndex)` associations. Component data itself
/// lives in the registry's [`ComponentSlab`](crate::slab::ComponentSlab);
/// the entity only holds slot references, kind-unique per entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    handle: EntityHandle,
    kind: EntityKind,
    position: Vec2,
    active: bool,
    components: Vec<(ComponentKind, SlotIndex)>,
}

impl Entity {
    /// Creates a new entity with no components attached.
    #[must_use]
    pub fn new(handle: EntityHandle, kind: EntityKind, position: Vec2, active: bool) -> Self {
        Self {
            handle,
            kind,
            position,
            active,
            components: Vec::new(),
        }
    }

    /// Returns the entity's handle.
    #[must_use]
    pub const fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Returns the entity's kind tag.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the entity's current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the entity to a new position.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Returns whether the entity is participating in the simulation.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Activates or deactivates the entity.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Attaches a component slot under the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateComponentKind`] if a component of this
    /// kind is already attached; at most one component per kind is allowed.
    pub fn attach(&mut self, kind: ComponentKind, slot: SlotIndex) -> Result<(), CoreError> {
        if self.slot(kind).is_some() {
            return Err(CoreError::DuplicateComponentKind {
                handle: self.handle,
                kind,
            });
        }
        self.components.push((kind, slot));
        Ok(())
    }

    /// Returns the slot for a component kind, or `None` if not attached.
    #[must_use]
    pub fn slot(&self, kind: ComponentKind) -> Option<SlotIndex> {
        self.components
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| *s)
    }

    /// Iterates the attached `(kind, slot)` pairs in attachment order.
    pub fn component_slots(&self) -> impl Iterator<Item = (ComponentKind, SlotIndex)> + '_ {
        self.components.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod handle_tests {
        use super::*;

        #[test]
        fn new_and_accessors() {
            let h = EntityHandle::new(7);
            assert_eq!(h.as_u32(), 7);
            assert_eq!(h.as_index(), 7);
        }

        #[test]
        fn ordering_follows_index() {
            let mut handles = vec![
                EntityHandle::new(3),
                EntityHandle::new(1),
                EntityHandle::new(2),
            ];
            handles.sort();
            assert_eq!(
                handles,
                vec![
                    EntityHandle::new(1),
                    EntityHandle::new(2),
                    EntityHandle::new(3)
                ]
            );
        }

        #[test]
        fn debug_and_display() {
            let h = EntityHandle::new(42);
            assert_eq!(format!("{h:?}"), "EntityHandle(42)");
            assert_eq!(format!("{h}"), "42");
        }

        #[test]
        fn conversions() {
            let h: EntityHandle = 5u32.into();
            let raw: u32 = h.into();
            assert_eq!(raw, 5);
        }
    }

    mod entity_tests {
        use super::*;

        fn test_entity() -> Entity {
            Entity::new(
                EntityHandle::new(0),
                EntityKind::Player,
                Vec2::new(10.0, 20.0),
                true,
            )
        }

        #[test]
        fn new_entity_has_no_components() {
            let e = test_entity();
            assert_eq!(e.component_slots().count(), 0);
            assert!(e.slot(ComponentKind::Movement).is_none());
        }

        #[test]
        fn attach_and_lookup() {
            let mut e = test_entity();
            e.attach(ComponentKind::Movement, SlotIndex::new(3)).unwrap();
            assert_eq!(e.slot(ComponentKind::Movement), Some(SlotIndex::new(3)));
        }

        #[test]
        fn attach_duplicate_kind_fails() {
            let mut e = test_entity();
            e.attach(ComponentKind::Movement, SlotIndex::new(3)).unwrap();
            let err = e.attach(ComponentKind::Movement, SlotIndex::new(4));
            assert!(matches!(
                err,
                Err(CoreError::DuplicateComponentKind { .. })
            ));
            // The original slot is untouched.
            assert_eq!(e.slot(ComponentKind::Movement), Some(SlotIndex::new(3)));
        }

        #[test]
        fn attachment_order_is_preserved() {
            let mut e = test_entity();
            e.attach(ComponentKind::Collision, SlotIndex::new(0)).unwrap();
            e.attach(ComponentKind::Movement, SlotIndex::new(1)).unwrap();
            let kinds: Vec<_> = e.component_slots().map(|(k, _)| k).collect();
            assert_eq!(kinds, vec![ComponentKind::Collision, ComponentKind::Movement]);
        }

        #[test]
        fn active_flag_toggles() {
            let mut e = test_entity();
            assert!(e.is_active());
            e.set_active(false);
            assert!(!e.is_active());
        }

        #[test]
        fn serde_roundtrip() {
            let mut e = test_entity();
            e.attach(ComponentKind::Movement, SlotIndex::new(1)).unwrap();
            let json = serde_json::to_string(&e).unwrap();
            let back: Entity = serde_json::from_str(&json).unwrap();
            assert_eq!(e, back);
        }
    }
}
