//! Per-kind event queues and the frame-boundary dispatcher.
//!
//! Events decouple detection from reaction: the spatial grid pushes a
//! [`GameEvent::Collision`] for each overlapping pair, and the reactions
//! (hp loss, hit counters, explosions, score) run later in the same frame
//! when [`EventQueue::dispatch`] drains the queues. No event survives a
//! frame; a paused game flushes pending events undispatched so stale
//! collisions never fire on resume.
//!
//! Delivery is FIFO within a kind; cross-kind ordering is unspecified. The
//! dispatcher itself mutates nothing beyond the participants it delivers to.

use serde::{Deserialize, Serialize};

use crate::entity::{AttributeData, ComponentKind, Entity, EntityHandle, EntityKind};
use crate::registry::Registry;
use crate::simulation::SessionState;

/// Discriminates event queues.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Two bounding circles overlapped this frame.
    Collision,
}

/// A queued notification. Carries handles to the participants, never owns
/// the entities themselves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The bounding circles of `first` and `second` overlap this frame.
    ///
    /// The pair is unordered; the grid emits it at most once per frame
    /// regardless of how many cells the two circles share.
    Collision {
        /// One participant.
        first: EntityHandle,
        /// The other participant.
        second: EntityHandle,
    },
}

impl GameEvent {
    /// The queue this event belongs to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Collision { .. } => EventKind::Collision,
        }
    }
}

/// Per-kind FIFO event queues, drained once per frame.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EventQueue {
    collisions: Vec<GameEvent>,
}

impl EventQueue {
    /// Creates empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the queue for its kind.
    pub fn push(&mut self, event: GameEvent) {
        match event.kind() {
            EventKind::Collision => self.collisions.push(event),
        }
    }

    /// Number of events pending in the queue for `kind`.
    #[must_use]
    pub fn pending(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Collision => self.collisions.len(),
        }
    }

    /// Events currently queued for `kind`, in push order. Test/diagnostic
    /// visibility; dispatch consumes them.
    #[must_use]
    pub fn queued(&self, kind: EventKind) -> &[GameEvent] {
        match kind {
            EventKind::Collision => &self.collisions,
        }
    }

    /// Drains every queue once, delivering each event to the reaction logic
    /// of both participants, then clears the queues.
    ///
    /// Reactions re-check that a participant is still active and armed: two
    /// bullets hitting the same asteroid in one frame queue two events, and
    /// the second must no-op once the first has started the explosion; a
    /// bullet spent on its first target cannot hit a second one.
    pub fn dispatch(&mut self, registry: &mut Registry, session: &mut SessionState) {
        let collisions = std::mem::take(&mut self.collisions);
        for event in collisions {
            let GameEvent::Collision { first, second } = event;
            resolve_collision(registry, session, first, second);
        }
    }

    /// Discards all pending events without dispatching them.
    ///
    /// Used while the game sits on a menu or end screen so collisions
    /// detected before the pause cannot fire after it.
    pub fn flush_all(&mut self) {
        if !self.collisions.is_empty() {
            tracing::debug!(discarded = self.collisions.len(), "flushing event queues");
        }
        self.collisions.clear();
    }
}

/// Applies the gameplay reaction for one collision pair.
///
/// Reactions by kind pair:
/// - player/asteroid: the player loses one hp and the asteroid explodes
/// - bullet/asteroid: the asteroid takes a hit, the bullet deactivates;
///   destroying the asteroid awards one point and starts the explosion
/// - anything else (own bullets grazing the player, asteroid/asteroid):
///   intentionally no reaction
fn resolve_collision(
    registry: &mut Registry,
    session: &mut SessionState,
    first: EntityHandle,
    second: EntityHandle,
) {
    let Ok(kind_a) = registry.entity_from_handle(first).map(Entity::kind) else {
        return;
    };
    let Ok(kind_b) = registry.entity_from_handle(second).map(Entity::kind) else {
        return;
    };

    match (kind_a, kind_b) {
        (EntityKind::Player, EntityKind::Asteroid) => {
            player_hits_asteroid(registry, first, second);
        }
        (EntityKind::Asteroid, EntityKind::Player) => {
            player_hits_asteroid(registry, second, first);
        }
        (EntityKind::Bullet, EntityKind::Asteroid) => {
            bullet_hits_asteroid(registry, session, first, second);
        }
        (EntityKind::Asteroid, EntityKind::Bullet) => {
            bullet_hits_asteroid(registry, session, second, first);
        }
        _ => {}
    }
}

/// An earlier event this frame may have deactivated or disarmed a
/// participant, so both are re-checked at delivery time.
fn is_armed(registry: &Registry, handle: EntityHandle) -> bool {
    if !registry
        .entity_from_handle(handle)
        .is_ok_and(Entity::is_active)
    {
        return false;
    }
    registry
        .component(handle, ComponentKind::Collision)
        .and_then(|c| c.as_collision())
        .is_some_and(|c| c.is_armed())
}

fn player_hits_asteroid(registry: &mut Registry, player: EntityHandle, asteroid: EntityHandle) {
    if !is_armed(registry, player) || !is_armed(registry, asteroid) {
        return;
    }
    if let Some(attr) = registry
        .component_mut(player, ComponentKind::Attribute)
        .and_then(|c| c.as_attribute_mut())
    {
        if let AttributeData::Player { hp, .. } = &mut attr.data {
            *hp = hp.saturating_sub(1);
            tracing::debug!(hp = *hp, "player struck by asteroid");
        }
    }
    start_explosion(registry, asteroid);
}

fn bullet_hits_asteroid(
    registry: &mut Registry,
    session: &mut SessionState,
    bullet: EntityHandle,
    asteroid: EntityHandle,
) {
    if !is_armed(registry, bullet) || !is_armed(registry, asteroid) {
        return;
    }

    // The bullet is spent regardless of whether the asteroid survives.
    if let Ok(entity) = registry.entity_from_handle_mut(bullet) {
        entity.set_active(false);
    }

    if let Some(collision) = registry
        .component_mut(asteroid, ComponentKind::Collision)
        .and_then(|c| c.as_collision_mut())
    {
        collision.bullet_hits += 1;
    }

    let destroyed = registry
        .component_mut(asteroid, ComponentKind::Attribute)
        .and_then(|c| c.as_attribute_mut())
        .is_some_and(|attr| {
            if let AttributeData::Asteroid { hits_remaining, .. } = &mut attr.data {
                *hits_remaining = hits_remaining.saturating_sub(1);
                *hits_remaining == 0
            } else {
                false
            }
        });

    if destroyed {
        session.score += 1;
        tracing::debug!(score = session.score, "asteroid destroyed by bullet");
        start_explosion(registry, asteroid);
    }
}

/// Switches an asteroid into its explosion: one-shot strip restarts, the
/// collision component disarms, movement pauses, and the main loop stops.
/// The pool spawner reclaims the slot once the strip finishes.
fn start_explosion(registry: &mut Registry, asteroid: EntityHandle) {
    if let Some(anim) = registry
        .component_mut(asteroid, ComponentKind::ExplosionAnimation)
        .and_then(|c| c.as_animation_mut())
    {
        anim.restart();
    }
    if let Some(collision) = registry
        .component_mut(asteroid, ComponentKind::Collision)
        .and_then(|c| c.as_collision_mut())
    {
        collision.disarmed = true;
    }
    if let Some(movement) = registry
        .component_mut(asteroid, ComponentKind::Movement)
        .and_then(|c| c.as_movement_mut())
    {
        movement.paused = true;
    }
    if let Some(main) = registry
        .component_mut(asteroid, ComponentKind::MainAnimation)
        .and_then(|c| c.as_animation_mut())
    {
        main.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SimConfig, SpriteLibrary};
    use crate::simulation::Simulation;
    use glam::Vec2;

    fn queue_with(events: &[GameEvent]) -> EventQueue {
        let mut queue = EventQueue::new();
        for event in events {
            queue.push(*event);
        }
        queue
    }

    fn collision(a: u32, b: u32) -> GameEvent {
        GameEvent::Collision {
            first: EntityHandle::new(a),
            second: EntityHandle::new(b),
        }
    }

    #[test]
    fn push_and_pending() {
        let queue = queue_with(&[collision(0, 1), collision(2, 3)]);
        assert_eq!(queue.pending(EventKind::Collision), 2);
    }

    #[test]
    fn queued_preserves_push_order() {
        let queue = queue_with(&[collision(0, 1), collision(2, 3)]);
        assert_eq!(
            queue.queued(EventKind::Collision),
            &[collision(0, 1), collision(2, 3)]
        );
    }

    #[test]
    fn flush_discards_without_dispatch() {
        let mut queue = queue_with(&[collision(0, 1)]);
        queue.flush_all();
        assert_eq!(queue.pending(EventKind::Collision), 0);
    }

    mod reaction_tests {
        use super::*;
        use crate::entity::EntityKind;

        /// Builds a full simulation so the reaction tests run against real
        /// pool wiring rather than hand-assembled registries.
        fn sim() -> Simulation {
            Simulation::new(SimConfig::default(), SpriteLibrary::default()).unwrap()
        }

        #[test]
        fn bullet_kill_awards_score_and_starts_explosion() {
            let mut sim = sim();
            let bullet = sim.activate_bullet_for_test(Vec2::new(0.0, 0.0));
            let asteroid = sim.activate_asteroid_for_test(Vec2::new(4.0, 0.0));
            // One hit left so a single bullet destroys it.
            sim.set_asteroid_hits_for_test(asteroid, 1);

            let (registry, session, queue) = sim.parts_for_test();
            queue.push(GameEvent::Collision {
                first: bullet,
                second: asteroid,
            });
            queue.dispatch(registry, session);

            assert_eq!(session.score, 1);
            assert!(!registry.entity_from_handle(bullet).unwrap().is_active());
            let explosion = registry
                .component(asteroid, ComponentKind::ExplosionAnimation)
                .and_then(|c| c.as_animation())
                .unwrap();
            assert!(explosion.playing);
            let collision_state = registry
                .component(asteroid, ComponentKind::Collision)
                .and_then(|c| c.as_collision())
                .unwrap();
            assert!(collision_state.disarmed);
        }

        #[test]
        fn bullet_hit_on_durable_asteroid_scores_nothing() {
            let mut sim = sim();
            let bullet = sim.activate_bullet_for_test(Vec2::ZERO);
            let asteroid = sim.activate_asteroid_for_test(Vec2::new(4.0, 0.0));
            sim.set_asteroid_hits_for_test(asteroid, 3);

            let (registry, session, queue) = sim.parts_for_test();
            queue.push(GameEvent::Collision {
                first: bullet,
                second: asteroid,
            });
            queue.dispatch(registry, session);

            assert_eq!(session.score, 0);
            // Asteroid still live, bullet spent.
            assert!(registry.entity_from_handle(asteroid).unwrap().is_active());
            assert!(!registry.entity_from_handle(bullet).unwrap().is_active());
        }

        #[test]
        fn player_collision_costs_one_hp() {
            let mut sim = sim();
            let player = sim.player_handle();
            let asteroid = sim.activate_asteroid_for_test(Vec2::ZERO);
            let hp_before = sim.player_hp().unwrap();

            let (registry, session, queue) = sim.parts_for_test();
            queue.push(GameEvent::Collision {
                first: player,
                second: asteroid,
            });
            queue.dispatch(registry, session);

            assert_eq!(sim.player_hp().unwrap(), hp_before - 1);
        }

        #[test]
        fn second_hit_on_exploding_asteroid_is_a_noop() {
            let mut sim = sim();
            let b1 = sim.activate_bullet_for_test(Vec2::ZERO);
            let b2 = sim.activate_bullet_for_test(Vec2::new(1.0, 0.0));
            let asteroid = sim.activate_asteroid_for_test(Vec2::new(4.0, 0.0));
            sim.set_asteroid_hits_for_test(asteroid, 1);

            let (registry, session, queue) = sim.parts_for_test();
            queue.push(GameEvent::Collision {
                first: b1,
                second: asteroid,
            });
            queue.push(GameEvent::Collision {
                first: b2,
                second: asteroid,
            });
            queue.dispatch(registry, session);

            // Only the first bullet scores; the second arrives disarmed.
            assert_eq!(session.score, 1);
            // The second bullet is not spent by a dead asteroid.
            assert!(registry.entity_from_handle(b2).unwrap().is_active());
        }

        #[test]
        fn spent_bullet_cannot_destroy_a_second_asteroid() {
            let mut sim = sim();
            let bullet = sim.activate_bullet_for_test(Vec2::ZERO);
            let a1 = sim.activate_asteroid_for_test(Vec2::new(4.0, 0.0));
            let a2 = sim.activate_asteroid_for_test(Vec2::new(-4.0, 0.0));
            sim.set_asteroid_hits_for_test(a1, 1);
            sim.set_asteroid_hits_for_test(a2, 1);

            let (registry, session, queue) = sim.parts_for_test();
            queue.push(GameEvent::Collision {
                first: bullet,
                second: a1,
            });
            queue.push(GameEvent::Collision {
                first: bullet,
                second: a2,
            });
            queue.dispatch(registry, session);

            // The first event spends the bullet; the second is dead on arrival.
            assert_eq!(session.score, 1);
            assert!(registry.entity_from_handle(a2).unwrap().is_active());
            let untouched = registry
                .component(a2, ComponentKind::Collision)
                .and_then(|c| c.as_collision())
                .unwrap();
            assert_eq!(untouched.bullet_hits, 0);
        }

        #[test]
        fn unknown_pairings_are_ignored() {
            let mut sim = sim();
            let player = sim.player_handle();
            let cursor = sim
                .registry()
                .entity_from_kind(EntityKind::Cursor)
                .unwrap()
                .handle();

            let (registry, session, queue) = sim.parts_for_test();
            queue.push(GameEvent::Collision {
                first: player,
                second: cursor,
            });
            queue.dispatch(registry, session);
            assert_eq!(session.score, 0);
        }
    }
}
