//! Fixed-capacity typed pool backing all component storage.
//!
//! Component counts are static and known at startup (the player, the cursor,
//! and fixed pools of bullets and asteroids), so a general-purpose allocator
//! is unnecessary: the slab reserves its full capacity once, hands out slots
//! bump-style in O(1), and never frees. "Destroying" a component is a logical
//! reset of its fields; the slot stays allocated for the process lifetime.
//! Exhausting the slab is fatal: it means the startup sizing was wrong.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::Component;
use crate::error::CoreError;

/// Stable reference to a slot in the [`ComponentSlab`].
///
/// Slots are never freed, so a `SlotIndex` stays valid for the process
/// lifetime once issued.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Creates a slot index from a raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index value.
    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotIndex({})", self.0)
    }
}

/// Bump-style typed pool of components.
///
/// Allocation appends into pre-reserved storage and returns a [`SlotIndex`];
/// there is no per-slot deallocation. Existing slots never move, so indices
/// held by entities remain valid across the whole simulation.
///
/// # Example
///
/// ```
/// use rockfall_core::slab::ComponentSlab;
/// use rockfall_core::entity::{Component, EntityHandle, MovementMode, MovementState};
///
/// let mut slab = ComponentSlab::with_capacity(4);
/// let slot = slab
///     .alloc(Component::Movement(MovementState::new(
///         EntityHandle::new(0),
///         MovementMode::Ray,
///     )))
///     .unwrap();
/// assert!(slab.get(slot).as_movement().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSlab {
    slots: Vec<Component>,
    capacity: usize,
}

impl ComponentSlab {
    /// Creates a slab with room for exactly `capacity` components.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Allocates a slot and moves `component` into it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlabExhausted`] when the reserved capacity is
    /// used up. Callers treat this as fatal.
    pub fn alloc(&mut self, component: Component) -> Result<SlotIndex, CoreError> {
        if self.slots.len() >= self.capacity {
            tracing::error!(capacity = self.capacity, "component slab exhausted");
            return Err(CoreError::SlabExhausted {
                capacity: self.capacity,
            });
        }
        let index = u32::try_from(self.slots.len())
            .map_err(|_| CoreError::SlabExhausted {
                capacity: self.capacity,
            })?;
        self.slots.push(component);
        Ok(SlotIndex::new(index))
    }

    /// Returns the component in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` was not issued by this slab. Slot indices only come
    /// from [`ComponentSlab::alloc`], so this is a programmer error.
    #[must_use]
    pub fn get(&self, slot: SlotIndex) -> &Component {
        &self.slots[slot.as_index()]
    }

    /// Returns the component in `slot`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `slot` was not issued by this slab.
    pub fn get_mut(&mut self, slot: SlotIndex) -> &mut Component {
        &mut self.slots[slot.as_index()]
    }

    /// Number of allocated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slot has been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total slot capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
