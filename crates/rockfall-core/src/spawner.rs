//! Pooled entity lifecycle: acquisition, timed spawning, and reclamation.
//!
//! Bullets and asteroids are never created or destroyed at runtime. The
//! whole population is built once at startup and the spawner hands out
//! inactive slots from fixed index ranges, one pool per entity kind.
//! Activating a slot resets its components to their just-constructed state,
//! so a recycled asteroid is indistinguishable from a fresh one; when every
//! slot in a pool is live, the ring wraps and the oldest slot is reclaimed
//! for the newcomer.
//!
//! Asteroid spawning is clocked in frames: every `spawn_interval_frames` a
//! biased coin decides whether an asteroid warps in at a random window edge,
//! heading roughly toward the center. The RNG is a seeded [`ChaCha8Rng`], so
//! two spawners built from the same seed produce identical spawn sequences.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::LevelRules;
use crate::entity::{ComponentKind, EntityHandle, EntityKind};
use crate::error::CoreError;
use crate::registry::Registry;

/// Fixed index range of pooled entities for one kind.
#[derive(Debug, Clone)]
struct Pool {
    kind: EntityKind,
    /// First entity index in the pool, inclusive.
    start: u32,
    /// Past-the-end entity index.
    end: u32,
    /// Ring scan position for the next acquisition.
    cursor: u32,
}

/// Hands out pooled entity slots and drives timed asteroid spawning.
#[derive(Debug)]
pub struct PoolSpawner {
    pools: Vec<Pool>,
    rng: ChaCha8Rng,
    frames_until_spawn: u32,
    bullet_cooldown_remaining: u32,
}

impl PoolSpawner {
    /// Creates a spawner with no registered pools.
    ///
    /// The seed fixes the asteroid spawn sequence; equal seeds give equal
    /// runs.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            pools: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            frames_until_spawn: 0,
            bullet_cooldown_remaining: 0,
        }
    }

    /// Registers the entity index range `[start, end)` as the pool for
    /// `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for an empty range,
    /// [`CoreError::PoolAlreadyRegistered`] when `kind` already has a pool,
    /// and [`CoreError::PoolRangeOverlap`] when the range intersects an
    /// existing pool.
    pub fn init_pool(&mut self, kind: EntityKind, start: u32, end: u32) -> Result<(), CoreError> {
        if start >= end {
            return Err(CoreError::InvalidConfig("pool range is empty"));
        }
        if self.pools.iter().any(|p| p.kind == kind) {
            return Err(CoreError::PoolAlreadyRegistered(kind));
        }
        if self.pools.iter().any(|p| start < p.end && p.start < end) {
            return Err(CoreError::PoolRangeOverlap { kind, start, end });
        }
        self.pools.push(Pool {
            kind,
            start,
            end,
            cursor: start,
        });
        Ok(())
    }

    /// The `[start, end)` index range registered for `kind`.
    #[must_use]
    pub fn pool_range(&self, kind: EntityKind) -> Option<(u32, u32)> {
        self.pools
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| (p.start, p.end))
    }

    /// Claims a slot from the pool for `kind`, resetting its components.
    ///
    /// Scans ring-style from the pool cursor so slots recycle in rotation.
    /// When every slot is live the slot at the cursor, the oldest in ring
    /// order, is reclaimed and handed out again. Returns `None` only when the
    /// kind has no registered range.
    ///
    /// The returned entity is inactive; the caller positions and activates it.
    pub fn acquire(&mut self, registry: &mut Registry, kind: EntityKind) -> Option<EntityHandle> {
        let pool = self.pools.iter_mut().find(|p| p.kind == kind)?;
        let len = pool.end - pool.start;
        for step in 0..len {
            let index = pool.start + (pool.cursor - pool.start + step) % len;
            let handle = EntityHandle::new(index);
            let Ok(entity) = registry.entity_from_handle(handle) else {
                return None;
            };
            if entity.is_active() {
                continue;
            }
            pool.cursor = pool.start + (index - pool.start + 1) % len;
            reset_components(registry, handle);
            return Some(handle);
        }

        // Every slot is live: reclaim the oldest in ring order.
        let handle = EntityHandle::new(pool.cursor);
        pool.cursor = pool.start + (pool.cursor - pool.start + 1) % len;
        tracing::debug!(kind = %kind, reused = %handle, "pool full, oldest slot reclaimed");
        registry.entity_from_handle_mut(handle).ok()?.set_active(false);
        reset_components(registry, handle);
        Some(handle)
    }

    /// Advances the per-frame timers (bullet cooldown).
    pub fn tick(&mut self) {
        self.bullet_cooldown_remaining = self.bullet_cooldown_remaining.saturating_sub(1);
    }

    /// Runs one frame of the asteroid spawn clock, warping in at most one
    /// asteroid at a window edge.
    ///
    /// Every `rules.spawn_interval_frames` frames a coin with
    /// `rules.spawn_probability` decides whether to spawn. Returns the
    /// activated asteroid, or `None` when the clock has not elapsed or the
    /// coin came up tails.
    pub fn spawn_due(
        &mut self,
        registry: &mut Registry,
        rules: &LevelRules,
        window: Vec2,
    ) -> Option<EntityHandle> {
        if self.frames_until_spawn > 0 {
            self.frames_until_spawn -= 1;
            return None;
        }
        self.frames_until_spawn = rules.spawn_interval_frames;

        if !self.rng.gen_bool(f64::from(rules.spawn_probability)) {
            return None;
        }
        let handle = self.acquire(registry, EntityKind::Asteroid)?;

        let position = self.random_edge_position(window);
        let heading = self.inward_heading_degrees(position, window);
        let (speed_min, speed_max) = rules.asteroid_speed;
        let speed = self.rng.gen_range(speed_min..=speed_max);

        if let Ok(entity) = registry.entity_from_handle_mut(handle) {
            entity.set_position(position);
            entity.set_active(true);
        }
        if let Some(movement) = registry
            .component_mut(handle, ComponentKind::Movement)
            .and_then(|c| c.as_movement_mut())
        {
            movement.heading_degrees = heading;
            movement.velocity = movement.heading_vector() * speed;
            movement.paused = false;
        }
        if let Some(warp) = registry
            .component_mut(handle, ComponentKind::WarpAnimation)
            .and_then(|c| c.as_animation_mut())
        {
            warp.restart();
        }
        if let Some(main) = registry
            .component_mut(handle, ComponentKind::MainAnimation)
            .and_then(|c| c.as_animation_mut())
        {
            main.restart();
        }
        tracing::debug!(handle = %handle, x = position.x, y = position.y, "asteroid warped in");
        Some(handle)
    }

    /// Fires a bullet from the player's position along the player's heading.
    ///
    /// A cooldown of `cooldown_frames` starts on every shot; calls during
    /// the cooldown are silent no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HandleOutOfRange`] when `player` is not a valid
    /// handle.
    pub fn fire_bullet(
        &mut self,
        registry: &mut Registry,
        player: EntityHandle,
        bullet_speed: f32,
        cooldown_frames: u32,
    ) -> Result<Option<EntityHandle>, CoreError> {
        if self.bullet_cooldown_remaining > 0 {
            return Ok(None);
        }
        let position = registry.entity_from_handle(player)?.position();
        let heading = registry
            .component(player, ComponentKind::Movement)
            .and_then(|c| c.as_movement())
            .map_or(0.0, |m| m.heading_degrees);

        let Some(handle) = self.acquire(registry, EntityKind::Bullet) else {
            return Ok(None);
        };
        self.bullet_cooldown_remaining = cooldown_frames;

        if let Ok(entity) = registry.entity_from_handle_mut(handle) {
            entity.set_position(position);
            entity.set_active(true);
        }
        if let Some(movement) = registry
            .component_mut(handle, ComponentKind::Movement)
            .and_then(|c| c.as_movement_mut())
        {
            movement.heading_degrees = heading;
            movement.velocity = movement.heading_vector() * bullet_speed;
            movement.paused = false;
        }
        if let Some(main) = registry
            .component_mut(handle, ComponentKind::MainAnimation)
            .and_then(|c| c.as_animation_mut())
        {
            main.restart();
        }
        Ok(Some(handle))
    }

    /// Deactivates pooled entities whose explosion has played through.
    ///
    /// Returns the number of slots reclaimed. Reclaimed slots keep their
    /// stale component values until [`PoolSpawner::acquire`] resets them on
    /// reuse.
    pub fn update_pools(&mut self, registry: &mut Registry) -> usize {
        let mut reclaim = Vec::new();
        for entity in registry.entities() {
            if !entity.is_active() {
                continue;
            }
            if self.pool_range(entity.kind()).is_none() {
                continue;
            }
            let exploded = registry
                .component(entity.handle(), ComponentKind::ExplosionAnimation)
                .and_then(|c| c.as_animation())
                .is_some_and(|a| a.finished());
            if exploded {
                reclaim.push(entity.handle());
            }
        }
        for handle in &reclaim {
            if let Ok(entity) = registry.entity_from_handle_mut(*handle) {
                entity.set_active(false);
            }
        }
        reclaim.len()
    }

    /// Deactivates every pooled entity and restarts the spawn clock.
    ///
    /// Level transitions call this so the next level opens with empty
    /// pools. The RNG is deliberately not reseeded.
    pub fn reset_pools(&mut self, registry: &mut Registry) {
        for pool in &mut self.pools {
            for index in pool.start..pool.end {
                let handle = EntityHandle::new(index);
                if let Ok(entity) = registry.entity_from_handle_mut(handle) {
                    entity.set_active(false);
                }
                reset_components(registry, handle);
            }
            pool.cursor = pool.start;
        }
        self.frames_until_spawn = 0;
        self.bullet_cooldown_remaining = 0;
    }

    /// Frames left on the bullet cooldown.
    #[must_use]
    pub const fn bullet_cooldown_remaining(&self) -> u32 {
        self.bullet_cooldown_remaining
    }

    fn random_edge_position(&mut self, window: Vec2) -> Vec2 {
        match self.rng.gen_range(0..4u8) {
            0 => Vec2::new(self.rng.gen_range(0.0..window.x), 0.0),
            1 => Vec2::new(self.rng.gen_range(0.0..window.x), window.y),
            2 => Vec2::new(0.0, self.rng.gen_range(0.0..window.y)),
            _ => Vec2::new(window.x, self.rng.gen_range(0.0..window.y)),
        }
    }

    /// Heading from an edge position toward the window center, jittered by
    /// up to ±45 degrees.
    fn inward_heading_degrees(&mut self, position: Vec2, window: Vec2) -> f32 {
        let toward_center = window * 0.5 - position;
        let base = toward_center.y.atan2(toward_center.x).to_degrees();
        base + self.rng.gen_range(-45.0..45.0)
    }
}

fn reset_components(registry: &mut Registry, handle: EntityHandle) {
    let Ok(entity) = registry.entity_from_handle(handle) else {
        return;
    };
    let slots: Vec<_> = entity.component_slots().collect();
    for (_, slot) in slots {
        registry.slab_mut().get_mut(slot).reset();
    }
}
