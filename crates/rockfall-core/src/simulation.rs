//! World assembly and the per-frame update loop.
//!
//! [`Simulation`] owns every subsystem (registry, spatial grid, event
//! queues, callback scheduler, rewind buffer, pool spawner) and threads
//! them through one explicit update per frame. Nothing here is global:
//! callers construct a `Simulation`, feed it a [`FrameInput`] each frame,
//! and read results back through accessors.
//!
//! # Frame order
//!
//! Each [`Simulation::update`] while playing runs, in order:
//!
//! 1. rewind: either restore one frame (input held) and stop, or capture
//!    the current frame into the history
//! 2. fire due scheduler callbacks
//! 3. apply player input (turn, thrust, fire, cursor)
//! 4. run the asteroid spawn clock
//! 5. integrate movement, advance animations, tick collision arming,
//!    wrap the player and cull strays, refresh bounding circles
//! 6. rebuild the spatial grid and queue collision events
//! 7. dispatch the event queues
//! 8. reclaim pooled slots whose explosions finished
//! 9. apply session rules (death, level timer)
//!
//! Outside the playing phase the world freezes: the scheduler still runs
//! (a level-advance countdown must be able to fire) and pending events are
//! flushed undispatched.
//!
//! # Entity layout
//!
//! The population is fixed at startup: the player at index 0, then the
//! bullet pool, then the asteroid pool, with the cursor last. The component
//! slab is sized to exactly this population, so a component allocation
//! after startup fails loudly instead of growing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::callbacks::CallbackScheduler;
use crate::config::{AnimationKind, LevelRules, SimConfig, SpriteLibrary};
use crate::entity::{
    ActiveState, AnimationState, AttributeData, AttributeState, CollisionState, Component,
    ComponentKind, EntityHandle, EntityKind, MovementMode, MovementState, RepeatMode,
};
use crate::error::CoreError;
use crate::events::EventQueue;
use crate::grid::SpatialGrid;
use crate::registry::Registry;
use crate::rewind::RewindBuffer;
use crate::spawner::PoolSpawner;

/// Where the session currently stands.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// The world is live and updating.
    #[default]
    Playing,
    /// The level timer expired with enough score; the advance countdown is
    /// running.
    LevelCleared,
    /// The player died or the timer expired short of the score.
    GameOver,
    /// The final level was cleared.
    Won,
}

/// Score, level, and phase bookkeeping mutated by gameplay and callbacks.
///
/// This is the only state deferred callbacks can touch, which keeps them
/// `'static` and keeps scheduling out of the world's borrows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Asteroids destroyed this level.
    pub score: u32,
    /// Current level, one-based.
    pub level: u32,
    /// Seconds of simulated time in the current level.
    pub elapsed_seconds: f32,
    /// Cleared when the player's hp reaches zero.
    pub player_alive: bool,
    /// Current phase.
    pub phase: SessionPhase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            elapsed_seconds: 0.0,
            player_alive: true,
            phase: SessionPhase::Playing,
        }
    }
}

/// One frame of player input plus the current window extent.
///
/// The window rides along because the host can resize it at any time; the
/// simulation never caches it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Window extent in world units.
    pub window: Vec2,
    /// Held to rewind one frame per update instead of simulating.
    pub rewind_held: bool,
    /// Turn rate factor in `-1.0..=1.0`, positive counter-clockwise.
    pub turn: f32,
    /// Thrust factor in `0.0..=1.0`.
    pub thrust: f32,
    /// Fire the ship's laser this frame.
    pub fire: bool,
    /// Cursor position in world units.
    pub cursor: Vec2,
}

impl FrameInput {
    /// Input frame with no controls engaged.
    #[must_use]
    pub const fn idle(window: Vec2) -> Self {
        Self {
            window,
            rewind_held: false,
            turn: 0.0,
            thrust: 0.0,
            fire: false,
            cursor: Vec2::ZERO,
        }
    }
}

/// The assembled world and its frame loop.
pub struct Simulation {
    config: SimConfig,
    registry: Registry,
    grid: SpatialGrid,
    events: EventQueue,
    scheduler: CallbackScheduler,
    rewind: RewindBuffer,
    spawner: PoolSpawner,
    session: SessionState,
    player: EntityHandle,
    cursor: EntityHandle,
    /// Level the world was last rebuilt for; a mismatch against the session
    /// means a callback advanced the level and the pools need resetting.
    level_built: u32,
    frame: u64,
}

impl Simulation {
    /// Builds the full fixed population from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] or
    /// [`CoreError::MissingSpriteMeta`] for a bad configuration, and
    /// propagates registry errors if the population cannot be assembled
    /// (which would be a sizing bug, not a runtime condition).
    pub fn new(config: SimConfig, sprites: SpriteLibrary) -> Result<Self, CoreError> {
        config.validate(&sprites)?;

        let bullets = config.bullet_pool_size as usize;
        let asteroids = config.asteroid_pool_size as usize;
        let entity_count = 2 + bullets + asteroids;
        // player 4, bullet 4, asteroid 7, cursor 2; the slab is sized to
        // exactly this so post-startup allocation fails loudly.
        let slot_count = 4 + 4 * bullets + 7 * asteroids + 2;
        let mut registry = Registry::with_capacity(entity_count, slot_count);

        let player_meta = *sprites.require(AnimationKind::PlayerShip)?;
        let bullet_meta = *sprites.require(AnimationKind::LaserBeam)?;
        let asteroid_meta = *sprites.require(AnimationKind::Asteroid)?;
        let explosion_meta = *sprites.require(AnimationKind::AsteroidExplosion)?;
        let warp_meta = *sprites.require(AnimationKind::AsteroidWarp)?;
        let cursor_meta = *sprites.require(AnimationKind::Cursor)?;

        let player = registry.create_entity(
            EntityKind::Player,
            Vec2::ZERO,
            true,
            player_meta.radius(),
        )?;
        registry.add_component(
            player,
            ComponentKind::Movement,
            Component::Movement(MovementState::new(player, MovementMode::PlayerControlled)),
        )?;
        registry.add_component(
            player,
            ComponentKind::Collision,
            Component::Collision(CollisionState::new(player, 0)),
        )?;
        registry.add_component(
            player,
            ComponentKind::MainAnimation,
            Component::Animation(AnimationState::new(
                player,
                AnimationKind::PlayerShip,
                player_meta.total_frames,
                RepeatMode::Indefinite,
                true,
            )),
        )?;
        registry.add_component(
            player,
            ComponentKind::Attribute,
            Component::Attribute(AttributeState::new(
                player,
                AttributeData::Player {
                    hp: config.player_hp,
                    max_hp: config.player_hp,
                },
            )),
        )?;

        let bullet_start = 1u32;
        let bullet_end = bullet_start + config.bullet_pool_size;
        let asteroid_end = bullet_end + config.asteroid_pool_size;
        for _ in 0..bullets {
            let bullet = registry.create_entity(
                EntityKind::Bullet,
                Vec2::ZERO,
                false,
                bullet_meta.radius(),
            )?;
            registry.add_component(
                bullet,
                ComponentKind::Movement,
                Component::Movement(MovementState::new(bullet, MovementMode::Ray)),
            )?;
            registry.add_component(
                bullet,
                ComponentKind::Collision,
                Component::Collision(CollisionState::new(bullet, 0)),
            )?;
            registry.add_component(
                bullet,
                ComponentKind::ActiveState,
                Component::ActiveState(ActiveState::new(bullet, 2.0 * bullet_meta.radius())),
            )?;
            registry.add_component(
                bullet,
                ComponentKind::MainAnimation,
                Component::Animation(AnimationState::new(
                    bullet,
                    AnimationKind::LaserBeam,
                    bullet_meta.total_frames,
                    RepeatMode::Indefinite,
                    true,
                )),
            )?;
        }

        let arm_delay = warp_meta.total_frames + config.collision_arm_grace_frames;
        for _ in 0..asteroids {
            let asteroid = registry.create_entity(
                EntityKind::Asteroid,
                Vec2::ZERO,
                false,
                asteroid_meta.radius(),
            )?;
            registry.add_component(
                asteroid,
                ComponentKind::Movement,
                Component::Movement(MovementState::new(asteroid, MovementMode::Ray)),
            )?;
            registry.add_component(
                asteroid,
                ComponentKind::Collision,
                Component::Collision(CollisionState::new(asteroid, arm_delay)),
            )?;
            registry.add_component(
                asteroid,
                ComponentKind::ActiveState,
                Component::ActiveState(ActiveState::new(
                    asteroid,
                    2.0 * asteroid_meta.radius(),
                )),
            )?;
            registry.add_component(
                asteroid,
                ComponentKind::MainAnimation,
                Component::Animation(AnimationState::new(
                    asteroid,
                    AnimationKind::Asteroid,
                    asteroid_meta.total_frames,
                    RepeatMode::Indefinite,
                    true,
                )),
            )?;
            registry.add_component(
                asteroid,
                ComponentKind::ExplosionAnimation,
                Component::Animation(AnimationState::new(
                    asteroid,
                    AnimationKind::AsteroidExplosion,
                    explosion_meta.total_frames,
                    RepeatMode::Once,
                    false,
                )),
            )?;
            registry.add_component(
                asteroid,
                ComponentKind::WarpAnimation,
                Component::Animation(AnimationState::new(
                    asteroid,
                    AnimationKind::AsteroidWarp,
                    warp_meta.total_frames,
                    RepeatMode::Once,
                    false,
                )),
            )?;
            registry.add_component(
                asteroid,
                ComponentKind::Attribute,
                Component::Attribute(AttributeState::new(
                    asteroid,
                    AttributeData::Asteroid {
                        hits_remaining: config.asteroid_durability,
                        durability: config.asteroid_durability,
                    },
                )),
            )?;
        }

        let cursor = registry.create_entity(
            EntityKind::Cursor,
            Vec2::ZERO,
            true,
            cursor_meta.radius(),
        )?;
        registry.add_component(
            cursor,
            ComponentKind::MainAnimation,
            Component::Animation(AnimationState::new(
                cursor,
                AnimationKind::Cursor,
                cursor_meta.total_frames,
                RepeatMode::Indefinite,
                true,
            )),
        )?;
        registry.add_component(
            cursor,
            ComponentKind::Attribute,
            Component::Attribute(AttributeState::new(cursor, AttributeData::Cursor)),
        )?;

        let mut spawner = PoolSpawner::new(config.seed);
        spawner.init_pool(EntityKind::Bullet, bullet_start, bullet_end)?;
        spawner.init_pool(EntityKind::Asteroid, bullet_end, asteroid_end)?;

        tracing::info!(
            entities = registry.len(),
            components = registry.slab().len(),
            levels = config.level_count(),
            "world assembled"
        );

        Ok(Self {
            grid: SpatialGrid::new(config.grid_cell_size),
            rewind: RewindBuffer::new(config.rewind_depth),
            spawner,
            registry,
            events: EventQueue::new(),
            scheduler: CallbackScheduler::new(),
            session: SessionState::default(),
            player,
            cursor,
            level_built: 1,
            config,
            frame: 0,
        })
    }

    /// Advances the world by one frame of `dt_seconds` simulated time.
    ///
    /// # Errors
    ///
    /// Propagates registry lookup failures for the player and cursor
    /// handles, which the simulation itself issued: an error here means
    /// the world was corrupted, and it is fatal.
    pub fn update(&mut self, dt_seconds: f32, input: &FrameInput) -> Result<(), CoreError> {
        self.frame += 1;

        if self.session.phase != SessionPhase::Playing {
            self.scheduler.update(&mut self.session);
            self.events.flush_all();
            if self.session.level != self.level_built {
                self.begin_level();
            }
            return Ok(());
        }

        if input.rewind_held {
            // Pending countdowns reference a future this rewind is erasing.
            self.scheduler.flush_all();
            self.events.flush_all();
            self.rewind.rewind_one_frame(&mut self.registry, &mut self.session);
            return Ok(());
        }
        self.rewind.capture(&self.registry, &self.session);

        self.scheduler.update(&mut self.session);
        self.session.elapsed_seconds += dt_seconds;
        self.spawner.tick();

        self.apply_input(dt_seconds, input)?;

        let rules = *self.config.level_rules(self.session.level);
        self.spawner.spawn_due(&mut self.registry, &rules, input.window);

        self.step_entities(dt_seconds, input.window);
        self.registry.refresh_circle_bounds();

        self.grid.rebuild(input.window, &self.registry);
        self.grid.detect_collisions(&self.registry, &mut self.events);
        self.events.dispatch(&mut self.registry, &mut self.session);

        self.spawner.update_pools(&mut self.registry);

        self.apply_session_rules(&rules);
        Ok(())
    }

    /// Restarts the current level: score, timer, hp, and pools all reset.
    pub fn restart_level(&mut self) {
        self.session.score = 0;
        self.session.elapsed_seconds = 0.0;
        self.session.player_alive = true;
        self.session.phase = SessionPhase::Playing;
        if let Some(attr) = self
            .registry
            .component_mut(self.player, ComponentKind::Attribute)
            .and_then(|c| c.as_attribute_mut())
        {
            attr.reset();
        }
        if let Some(movement) = self
            .registry
            .component_mut(self.player, ComponentKind::Movement)
            .and_then(|c| c.as_movement_mut())
        {
            movement.reset();
        }
        self.begin_level();
    }

    // ========================================================================
    // Frame steps
    // ========================================================================

    /// Tears down per-level machinery when a new level opens.
    fn begin_level(&mut self) {
        self.level_built = self.session.level;
        self.spawner.reset_pools(&mut self.registry);
        self.events.flush_all();
        self.scheduler.flush_all();
        self.rewind.flush();
        self.registry.refresh_circle_bounds();
        tracing::info!(level = self.session.level, "level started");
    }

    fn apply_input(&mut self, dt_seconds: f32, input: &FrameInput) -> Result<(), CoreError> {
        if let Some(movement) = self
            .registry
            .component_mut(self.player, ComponentKind::Movement)
            .and_then(|c| c.as_movement_mut())
        {
            movement.heading_degrees += input.turn * self.config.player_turn_rate * dt_seconds;
            let speed = input.thrust.clamp(0.0, 1.0) * self.config.player_thrust;
            movement.velocity = movement.heading_vector() * speed;
        }
        if input.fire {
            self.spawner.fire_bullet(
                &mut self.registry,
                self.player,
                self.config.bullet_speed,
                self.config.bullet_cooldown_frames,
            )?;
        }
        self.registry
            .entity_from_handle_mut(self.cursor)?
            .set_position(input.cursor);
        Ok(())
    }

    /// Movement integration, bounds policy, animation playback, and
    /// collision arming for every active entity.
    fn step_entities(&mut self, dt_seconds: f32, window: Vec2) {
        let (entities, slab) = self.registry.entities_and_slab_mut();

        for entity in entities.iter_mut() {
            if !entity.is_active() {
                continue;
            }

            if let Some(slot) = entity.slot(ComponentKind::Movement) {
                if let Some(movement) = slab.get_mut(slot).as_movement_mut() {
                    if !movement.paused {
                        let next = entity.position() + movement.velocity * dt_seconds;
                        entity.set_position(next);
                    }
                }
            }

            // The ship wraps toroidally.
            if entity.kind() == EntityKind::Player {
                let p = entity.position();
                entity.set_position(Vec2::new(
                    p.x.rem_euclid(window.x),
                    p.y.rem_euclid(window.y),
                ));
            }

            // Entities carrying a bounds policy return to their pool once
            // clearly offscreen.
            if let Some(slot) = entity.slot(ComponentKind::ActiveState) {
                if let Some(state) = slab.get(slot).as_active_state() {
                    if state.out_of_bounds(entity.position(), window) {
                        entity.set_active(false);
                    }
                }
            }
            if !entity.is_active() {
                continue;
            }

            for kind in [
                ComponentKind::MainAnimation,
                ComponentKind::WarpAnimation,
                ComponentKind::ExplosionAnimation,
            ] {
                if let Some(slot) = entity.slot(kind) {
                    if let Some(animation) = slab.get_mut(slot).as_animation_mut() {
                        animation.advance();
                    }
                }
            }

            if let Some(slot) = entity.slot(ComponentKind::Collision) {
                if let Some(collision) = slab.get_mut(slot).as_collision_mut() {
                    collision.tick();
                }
            }
        }
    }

    /// End-of-frame death and level-timer checks.
    fn apply_session_rules(&mut self, rules: &LevelRules) {
        if self.session.player_alive && self.player_hp() == Some(0) {
            self.session.player_alive = false;
            self.session.phase = SessionPhase::GameOver;
            tracing::info!(level = self.session.level, "player destroyed");
            return;
        }

        if self.session.elapsed_seconds < rules.duration_seconds {
            return;
        }
        if self.session.score >= rules.score_to_clear {
            self.session.phase = SessionPhase::LevelCleared;
            let final_level = self.session.level >= self.config.level_count();
            tracing::info!(
                level = self.session.level,
                score = self.session.score,
                final_level,
                "level cleared"
            );
            self.scheduler.schedule(
                self.config.level_advance_delay_frames,
                Box::new(move |session| {
                    if final_level {
                        session.phase = SessionPhase::Won;
                    } else {
                        session.level += 1;
                        session.score = 0;
                        session.elapsed_seconds = 0.0;
                        session.phase = SessionPhase::Playing;
                    }
                }),
            );
        } else {
            self.session.phase = SessionPhase::GameOver;
            tracing::info!(
                level = self.session.level,
                score = self.session.score,
                needed = rules.score_to_clear,
                "level timer expired short of the score"
            );
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The session counters and phase.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// The entity/component registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Handle of the player ship (index 0 by construction).
    #[must_use]
    pub const fn player_handle(&self) -> EntityHandle {
        self.player
    }

    /// Handle of the cursor entity (last index by construction).
    #[must_use]
    pub const fn cursor_handle(&self) -> EntityHandle {
        self.cursor
    }

    /// The player's current hit points, if the attribute is present.
    #[must_use]
    pub fn player_hp(&self) -> Option<u32> {
        match self
            .registry
            .component(self.player, ComponentKind::Attribute)
            .and_then(|c| c.as_attribute())
            .map(|a| a.data)
        {
            Some(AttributeData::Player { hp, .. }) => Some(hp),
            _ => None,
        }
    }

    /// Frames simulated (or rewound) since construction.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Frames currently held in the rewind history.
    #[must_use]
    pub fn rewind_frames_retained(&self) -> usize {
        self.rewind.len()
    }

    // ========================================================================
    // Test access
    // ========================================================================

    /// Split borrow of the parts event-dispatch tests need.
    #[cfg(test)]
    pub(crate) fn parts_for_test(
        &mut self,
    ) -> (&mut Registry, &mut SessionState, &mut EventQueue) {
        (&mut self.registry, &mut self.session, &mut self.events)
    }

    /// Pulls a bullet from the pool, live and armed at `position`.
    #[cfg(test)]
    pub(crate) fn activate_bullet_for_test(&mut self, position: Vec2) -> EntityHandle {
        let handle = self
            .spawner
            .acquire(&mut self.registry, EntityKind::Bullet)
            .unwrap();
        let entity = self.registry.entity_from_handle_mut(handle).unwrap();
        entity.set_position(position);
        entity.set_active(true);
        self.registry.refresh_circle_bounds();
        handle
    }

    /// Pulls an asteroid from the pool, live at `position` with its arming
    /// delay already elapsed.
    #[cfg(test)]
    pub(crate) fn activate_asteroid_for_test(&mut self, position: Vec2) -> EntityHandle {
        let handle = self
            .spawner
            .acquire(&mut self.registry, EntityKind::Asteroid)
            .unwrap();
        let entity = self.registry.entity_from_handle_mut(handle).unwrap();
        entity.set_position(position);
        entity.set_active(true);
        let collision = self
            .registry
            .component_mut(handle, ComponentKind::Collision)
            .and_then(|c| c.as_collision_mut())
            .unwrap();
        collision.frames_since_activation = collision.arm_delay_frames;
        self.registry.refresh_circle_bounds();
        handle
    }

    /// Overrides an asteroid's remaining durability.
    #[cfg(test)]
    pub(crate) fn set_asteroid_hits_for_test(&mut self, handle: EntityHandle, hits: u32) {
        let attr = self
            .registry
            .component_mut(handle, ComponentKind::Attribute)
            .and_then(|c| c.as_attribute_mut())
            .unwrap();
        attr.data = AttributeData::Asteroid {
            hits_remaining: hits,
            durability: hits,
        };
    }
}
