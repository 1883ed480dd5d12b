//! Entity/component registry and bounding-circle store.
//!
//! The registry owns three parallel structures:
//! - the entity store (`Vec<Entity>`), indexed by [`EntityHandle`]
//! - the bounding-circle array, index-aligned with the entity store
//! - the [`ComponentSlab`] holding every component instance
//!
//! # Storage stability
//!
//! Handles double as indices, so the entity store is reserved to its full
//! size (player + all pool slots + cursor) before any handle is issued and
//! never reorders, erases, or reallocates during simulation. `circles[i]`
//! describes `entities[i]` whenever that entity is active and is refreshed
//! from entity positions once per frame, never independently.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{Component, ComponentKind, Entity, EntityHandle, EntityKind};
use crate::error::CoreError;
use crate::slab::{ComponentSlab, SlotIndex};

/// Axis-aligned bounding circle for one entity.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center, world units.
    pub center: Vec2,
    /// Radius, world units.
    pub radius: f32,
}

impl Circle {
    /// Creates a circle.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Exact overlap test: centers closer than the radius sum.
    #[must_use]
    pub fn overlaps(&self, other: &Circle) -> bool {
        let radius_sum = self.radius + other.radius;
        self.center.distance_squared(other.center) <= radius_sum * radius_sum
    }
}

/// Entity/component registry.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use rockfall_core::entity::{
///     Component, ComponentKind, EntityKind, MovementMode, MovementState,
/// };
/// use rockfall_core::registry::Registry;
///
/// let mut registry = Registry::with_capacity(4, 8);
/// let player = registry
///     .create_entity(EntityKind::Player, Vec2::ZERO, true, 32.0)
///     .unwrap();
/// registry
///     .add_component(
///         player,
///         ComponentKind::Movement,
///         Component::Movement(MovementState::new(player, MovementMode::PlayerControlled)),
///     )
///     .unwrap();
///
/// assert!(registry.component(player, ComponentKind::Movement).is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    entities: Vec<Entity>,
    circles: Vec<Circle>,
    slab: ComponentSlab,
    entity_capacity: usize,
}

impl Registry {
    /// Creates a registry reserving `entity_capacity` entity slots and
    /// `slot_capacity` component slots up front.
    #[must_use]
    pub fn with_capacity(entity_capacity: usize, slot_capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(entity_capacity),
            circles: Vec::with_capacity(entity_capacity),
            slab: ComponentSlab::with_capacity(slot_capacity),
            entity_capacity,
        }
    }

    /// Creates an entity and its bounding circle, returning the new handle.
    ///
    /// Handles are issued in creation order and equal the entity's store
    /// index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the reserved entity capacity
    /// would be exceeded; entity creation only happens during startup, so
    /// this is a configuration error.
    pub fn create_entity(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        active: bool,
        radius: f32,
    ) -> Result<EntityHandle, CoreError> {
        if self.entities.len() >= self.entity_capacity {
            return Err(CoreError::InvalidConfig(
                "entity store capacity exceeded during initialization",
            ));
        }
        let handle = EntityHandle::new(u32::try_from(self.entities.len()).map_err(|_| {
            CoreError::InvalidConfig("entity store capacity exceeded during initialization")
        })?);
        self.entities.push(Entity::new(handle, kind, position, active));
        self.circles.push(Circle::new(position, radius));
        Ok(handle)
    }

    /// Allocates `component` from the slab and attaches it to the entity.
    ///
    /// # Errors
    ///
    /// - [`CoreError::HandleOutOfRange`] for an invalid handle
    /// - [`CoreError::DuplicateComponentKind`] if the entity already has a
    ///   component of this kind
    /// - [`CoreError::SlabExhausted`] if component storage is used up
    pub fn add_component(
        &mut self,
        handle: EntityHandle,
        kind: ComponentKind,
        component: Component,
    ) -> Result<SlotIndex, CoreError> {
        // Check for the duplicate before allocating so a rejected attach
        // does not leak a slab slot.
        let entity = self.entity_from_handle(handle)?;
        if entity.slot(kind).is_some() {
            return Err(CoreError::DuplicateComponentKind { handle, kind });
        }
        let slot = self.slab.alloc(component)?;
        self.entities[handle.as_index()].attach(kind, slot)?;
        Ok(slot)
    }

    /// Returns the entity for `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HandleOutOfRange`] when the handle exceeds the
    /// live entity count. The handle is never clamped or wrapped.
    pub fn entity_from_handle(&self, handle: EntityHandle) -> Result<&Entity, CoreError> {
        self.entities.get(handle.as_index()).ok_or_else(|| {
            tracing::error!(handle = handle.as_u32(), len = self.entities.len(),
                "entity handle out of range");
            CoreError::HandleOutOfRange {
                handle: handle.as_u32(),
                len: self.entities.len(),
            }
        })
    }

    /// Returns the entity for `handle`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HandleOutOfRange`] when the handle exceeds the
    /// live entity count.
    pub fn entity_from_handle_mut(
        &mut self,
        handle: EntityHandle,
    ) -> Result<&mut Entity, CoreError> {
        let len = self.entities.len();
        self.entities.get_mut(handle.as_index()).ok_or_else(|| {
            tracing::error!(handle = handle.as_u32(), len, "entity handle out of range");
            CoreError::HandleOutOfRange {
                handle: handle.as_u32(),
                len,
            }
        })
    }

    /// Returns the first entity of `kind` by linear scan.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityKindNotFound`] if no entity of that kind
    /// exists. Callers must not assume success.
    pub fn entity_from_kind(&self, kind: EntityKind) -> Result<&Entity, CoreError> {
        self.entities
            .iter()
            .find(|e| e.kind() == kind)
            .ok_or_else(|| {
                tracing::error!(%kind, "no entity of requested kind");
                CoreError::EntityKindNotFound(kind)
            })
    }

    /// Returns the component of `kind` on the entity, or `None` if the
    /// entity does not carry one (or the handle is invalid).
    #[must_use]
    pub fn component(&self, handle: EntityHandle, kind: ComponentKind) -> Option<&Component> {
        let slot = self.entities.get(handle.as_index())?.slot(kind)?;
        Some(self.slab.get(slot))
    }

    /// Returns the component of `kind` on the entity, mutably.
    pub fn component_mut(
        &mut self,
        handle: EntityHandle,
        kind: ComponentKind,
    ) -> Option<&mut Component> {
        let slot = self.entities.get(handle.as_index())?.slot(kind)?;
        Some(self.slab.get_mut(slot))
    }

    /// All entities, in handle order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// All bounding circles, index-aligned with [`Registry::entities`].
    #[must_use]
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True before any entity has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Copies every active entity's position into its bounding circle.
    ///
    /// Called once per frame after the per-entity update pass; circles are
    /// never updated independently of their entity.
    pub fn refresh_circle_bounds(&mut self) {
        for (entity, circle) in self.entities.iter().zip(self.circles.iter_mut()) {
            if entity.is_active() {
                circle.center = entity.position();
            }
        }
    }

    /// Split borrow used by the per-entity update pass: entities and the
    /// slab are sibling fields, so both can be mutated in one loop.
    pub(crate) fn entities_and_slab_mut(&mut self) -> (&mut [Entity], &mut ComponentSlab) {
        (&mut self.entities, &mut self.slab)
    }

    /// Read access to the component slab.
    #[must_use]
    pub fn slab(&self) -> &ComponentSlab {
        &self.slab
    }

    /// Mutable access to the component slab.
    pub(crate) fn slab_mut(&mut self) -> &mut ComponentSlab {
        &mut self.slab
    }

    /// Wholesale state replacement, used by the rewind buffer when restoring
    /// a snapshot. The replacement must come from a snapshot of this same
    /// registry, so the layout (handles, slots) is unchanged.
    pub(crate) fn restore(
        &mut self,
        entities: Vec<Entity>,
        circles: Vec<Circle>,
        slab: ComponentSlab,
    ) {
        self.entities = entities;
        self.circles = circles;
        self.slab = slab;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AttributeData, AttributeState, MovementMode, MovementState};

    fn registry_with_player() -> (Registry, EntityHandle) {
        let mut registry = Registry::with_capacity(4, 8);
        let player = registry
            .create_entity(EntityKind::Player, Vec2::new(50.0, 60.0), true, 32.0)
            .unwrap();
        (registry, player)
    }

    mod circle_tests {
        use super::*;

        #[test]
        fn overlap_inside_radius_sum() {
            let a = Circle::new(Vec2::ZERO, 5.0);
            let b = Circle::new(Vec2::new(8.0, 0.0), 5.0);
            assert!(a.overlaps(&b));
        }

        #[test]
        fn no_overlap_outside_radius_sum() {
            let a = Circle::new(Vec2::ZERO, 5.0);
            let b = Circle::new(Vec2::new(20.0, 0.0), 5.0);
            assert!(!a.overlaps(&b));
        }

        #[test]
        fn touching_counts_as_overlap() {
            let a = Circle::new(Vec2::ZERO, 5.0);
            let b = Circle::new(Vec2::new(10.0, 0.0), 5.0);
            assert!(a.overlaps(&b));
        }
    }

    mod handle_tests {
        use super::*;

        #[test]
        fn handles_are_issued_in_order() {
            let mut registry = Registry::with_capacity(3, 4);
            let a = registry
                .create_entity(EntityKind::Player, Vec2::ZERO, true, 1.0)
                .unwrap();
            let b = registry
                .create_entity(EntityKind::Bullet, Vec2::ZERO, false, 1.0)
                .unwrap();
            assert_eq!(a, EntityHandle::new(0));
            assert_eq!(b, EntityHandle::new(1));
        }

        #[test]
        fn out_of_range_handle_is_an_error() {
            let (registry, _) = registry_with_player();
            let err = registry.entity_from_handle(EntityHandle::new(99)).unwrap_err();
            assert!(matches!(
                err,
                CoreError::HandleOutOfRange { handle: 99, len: 1 }
            ));
        }

        #[test]
        fn capacity_overflow_is_an_error() {
            let mut registry = Registry::with_capacity(1, 1);
            registry
                .create_entity(EntityKind::Player, Vec2::ZERO, true, 1.0)
                .unwrap();
            assert!(registry
                .create_entity(EntityKind::Cursor, Vec2::ZERO, true, 1.0)
                .is_err());
        }
    }

    mod kind_lookup_tests {
        use super::*;

        #[test]
        fn first_match_wins() {
            let mut registry = Registry::with_capacity(3, 4);
            registry
                .create_entity(EntityKind::Bullet, Vec2::ZERO, false, 1.0)
                .unwrap();
            let second = registry
                .create_entity(EntityKind::Bullet, Vec2::ZERO, false, 1.0)
                .unwrap();
            let found = registry.entity_from_kind(EntityKind::Bullet).unwrap();
            assert_ne!(found.handle(), second);
            assert_eq!(found.handle(), EntityHandle::new(0));
        }

        #[test]
        fn missing_kind_is_an_error() {
            let (registry, _) = registry_with_player();
            let err = registry.entity_from_kind(EntityKind::Asteroid).unwrap_err();
            assert!(matches!(err, CoreError::EntityKindNotFound(EntityKind::Asteroid)));
        }
    }

    mod component_tests {
        use super::*;

        #[test]
        fn add_and_get_component() {
            let (mut registry, player) = registry_with_player();
            registry
                .add_component(
                    player,
                    ComponentKind::Movement,
                    Component::Movement(MovementState::new(player, MovementMode::PlayerControlled)),
                )
                .unwrap();
            let component = registry.component(player, ComponentKind::Movement).unwrap();
            assert_eq!(component.owner(), player);
        }

        #[test]
        fn missing_component_is_none() {
            let (registry, player) = registry_with_player();
            assert!(registry.component(player, ComponentKind::Collision).is_none());
        }

        #[test]
        fn duplicate_kind_rejected_without_leaking_slots() {
            let (mut registry, player) = registry_with_player();
            registry
                .add_component(
                    player,
                    ComponentKind::Attribute,
                    Component::Attribute(AttributeState::new(
                        player,
                        AttributeData::Player { hp: 10, max_hp: 10 },
                    )),
                )
                .unwrap();
            let before = registry.slab().len();
            let err = registry.add_component(
                player,
                ComponentKind::Attribute,
                Component::Attribute(AttributeState::new(
                    player,
                    AttributeData::Player { hp: 1, max_hp: 1 },
                )),
            );
            assert!(matches!(err, Err(CoreError::DuplicateComponentKind { .. })));
            assert_eq!(registry.slab().len(), before);
        }

        #[test]
        fn component_on_bad_handle_is_none() {
            let (registry, _) = registry_with_player();
            assert!(registry
                .component(EntityHandle::new(42), ComponentKind::Movement)
                .is_none());
        }
    }

    mod circle_refresh_tests {
        use super::*;

        #[test]
        fn active_entity_circle_follows_position() {
            let (mut registry, player) = registry_with_player();
            registry
                .entity_from_handle_mut(player)
                .unwrap()
                .set_position(Vec2::new(300.0, 400.0));
            registry.refresh_circle_bounds();
            assert_eq!(registry.circles()[0].center, Vec2::new(300.0, 400.0));
        }

        #[test]
        fn inactive_entity_circle_is_left_alone() {
            let mut registry = Registry::with_capacity(1, 1);
            let bullet = registry
                .create_entity(EntityKind::Bullet, Vec2::new(1.0, 2.0), false, 8.0)
                .unwrap();
            registry
                .entity_from_handle_mut(bullet)
                .unwrap()
                .set_position(Vec2::new(9.0, 9.0));
            registry.refresh_circle_bounds();
            assert_eq!(registry.circles()[0].center, Vec2::new(1.0, 2.0));
        }
    }
}
