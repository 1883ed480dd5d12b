//! Simulation configuration and static sprite metadata.
//!
//! Everything here is loaded once at startup and treated as immutable for the
//! process lifetime. The presentation layer supplies a [`SpriteLibrary`] from
//! its asset pipeline; the core only reads frame counts (animation lengths)
//! and texture extents (bounding circle sizing) from it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifies an animation strip in the sprite metadata.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    /// The player ship's idle/thrust loop.
    PlayerShip,
    /// The bullet projectile loop.
    LaserBeam,
    /// The asteroid tumble loop.
    Asteroid,
    /// The one-shot asteroid explosion.
    AsteroidExplosion,
    /// The one-shot warp-in played when an asteroid spawns.
    AsteroidWarp,
    /// The aiming cursor loop.
    Cursor,
}

/// Static metadata for one animation strip.
///
/// Frame counts drive animation playback; the frame extent sizes the entity's
/// bounding circle (radius = half the frame width).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteMeta {
    /// Which animation this metadata describes.
    pub kind: AnimationKind,
    /// Number of frames in the strip.
    pub total_frames: u32,
    /// Rendered extent of a single frame, in world units.
    pub frame_extent: Vec2,
}

impl SpriteMeta {
    /// Bounding circle radius derived from the frame extent.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.frame_extent.x / 2.0
    }
}

/// Lookup table of sprite metadata, supplied once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteLibrary {
    entries: Vec<SpriteMeta>,
}

impl SpriteLibrary {
    /// Creates a library from a list of entries.
    #[must_use]
    pub fn new(entries: Vec<SpriteMeta>) -> Self {
        Self { entries }
    }

    /// Returns the metadata for `kind`, if present.
    #[must_use]
    pub fn meta(&self, kind: AnimationKind) -> Option<&SpriteMeta> {
        self.entries.iter().find(|m| m.kind == kind)
    }

    /// Returns the metadata for `kind` or fails with [`CoreError::MissingSpriteMeta`].
    ///
    /// # Errors
    ///
    /// Returns an error if no entry exists for `kind`.
    pub fn require(&self, kind: AnimationKind) -> Result<&SpriteMeta, CoreError> {
        self.meta(kind).ok_or(CoreError::MissingSpriteMeta(kind))
    }

    /// Largest bounding circle diameter across all entries.
    ///
    /// The spatial grid's cell size must be at least this value or in-cell
    /// pair testing can miss collisions.
    #[must_use]
    pub fn max_bounding_diameter(&self) -> f32 {
        self.entries
            .iter()
            .map(|m| m.radius() * 2.0)
            .fold(0.0, f32::max)
    }
}

impl Default for SpriteLibrary {
    /// Placeholder metadata with the extents the shipped sprite sheets use.
    ///
    /// The presentation layer normally replaces this with values read from
    /// the real assets at load time.
    fn default() -> Self {
        Self::new(vec![
            SpriteMeta {
                kind: AnimationKind::PlayerShip,
                total_frames: 24,
                frame_extent: Vec2::new(64.0, 64.0),
            },
            SpriteMeta {
                kind: AnimationKind::LaserBeam,
                total_frames: 8,
                frame_extent: Vec2::new(16.0, 16.0),
            },
            SpriteMeta {
                kind: AnimationKind::Asteroid,
                total_frames: 32,
                frame_extent: Vec2::new(96.0, 96.0),
            },
            SpriteMeta {
                kind: AnimationKind::AsteroidExplosion,
                total_frames: 48,
                frame_extent: Vec2::new(96.0, 96.0),
            },
            SpriteMeta {
                kind: AnimationKind::AsteroidWarp,
                total_frames: 40,
                frame_extent: Vec2::new(96.0, 96.0),
            },
            SpriteMeta {
                kind: AnimationKind::Cursor,
                total_frames: 4,
                frame_extent: Vec2::new(32.0, 32.0),
            },
        ])
    }
}

/// Per-level tuning for spawn cadence and victory conditions.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRules {
    /// Wall-clock length of the level in seconds.
    pub duration_seconds: f32,
    /// Asteroids that must be destroyed to clear the level.
    pub score_to_clear: u32,
    /// Frames between asteroid spawn attempts.
    pub spawn_interval_frames: u32,
    /// Probability that a due spawn attempt actually activates an asteroid.
    pub spawn_probability: f32,
    /// Asteroid speed range, world units per second.
    pub asteroid_speed: (f32, f32),
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of bullet slots reserved in the entity store.
    pub bullet_pool_size: u32,
    /// Number of asteroid slots reserved in the entity store.
    pub asteroid_pool_size: u32,
    /// Spatial grid cell edge length, world units.
    ///
    /// Must be at least the largest bounding circle diameter in the sprite
    /// library; validated by [`SimConfig::validate`].
    pub grid_cell_size: f32,
    /// Number of frames of rewind history retained.
    pub rewind_depth: usize,
    /// Minimum frames between player shots.
    pub bullet_cooldown_frames: u32,
    /// Bullet speed, world units per second.
    pub bullet_speed: f32,
    /// Player turn rate, degrees per second.
    pub player_turn_rate: f32,
    /// Player acceleration while thrusting, world units per second squared.
    pub player_thrust: f32,
    /// Starting (and maximum) player hit points.
    pub player_hp: u32,
    /// Bullet hits required to destroy one asteroid.
    pub asteroid_durability: u32,
    /// Frames an asteroid stays non-collidable after warping in, beyond the
    /// warp animation itself.
    pub collision_arm_grace_frames: u32,
    /// Frames between clearing a level and the next one starting.
    pub level_advance_delay_frames: u32,
    /// Master seed for the deterministic spawn RNG.
    pub seed: u64,
    /// Per-level rules, in play order.
    pub levels: Vec<LevelRules>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bullet_pool_size: 64,
            asteroid_pool_size: 128,
            grid_cell_size: 128.0,
            rewind_depth: 360,
            bullet_cooldown_frames: 12,
            bullet_speed: 640.0,
            player_turn_rate: 240.0,
            player_thrust: 320.0,
            player_hp: 10,
            asteroid_durability: 3,
            collision_arm_grace_frames: 20,
            level_advance_delay_frames: 512,
            seed: 0x524F_434B,
            levels: vec![
                LevelRules {
                    duration_seconds: 75.0,
                    score_to_clear: 30,
                    spawn_interval_frames: 45,
                    spawn_probability: 0.8,
                    asteroid_speed: (60.0, 140.0),
                },
                LevelRules {
                    duration_seconds: 120.0,
                    score_to_clear: 20,
                    spawn_interval_frames: 30,
                    spawn_probability: 0.9,
                    asteroid_speed: (90.0, 200.0),
                },
            ],
        }
    }
}

impl SimConfig {
    /// Checks the configuration against the supplied sprite metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] when a value cannot be used:
    /// empty pools, zero rewind depth, no levels, a grid cell smaller
    /// than the largest bounding circle diameter (which would let in-cell
    /// pair testing miss collisions), or level rules whose spawn
    /// probability or speed range the spawner's RNG cannot sample.
    pub fn validate(&self, sprites: &SpriteLibrary) -> Result<(), CoreError> {
        if self.bullet_pool_size == 0 || self.asteroid_pool_size == 0 {
            return Err(CoreError::InvalidConfig("pool sizes must be non-zero"));
        }
        if self.rewind_depth == 0 {
            return Err(CoreError::InvalidConfig("rewind depth must be non-zero"));
        }
        if self.levels.is_empty() {
            return Err(CoreError::InvalidConfig("at least one level is required"));
        }
        if self.grid_cell_size < sprites.max_bounding_diameter() {
            return Err(CoreError::InvalidConfig(
                "grid cell size must be at least the largest bounding diameter",
            ));
        }
        for rules in &self.levels {
            if rules.spawn_interval_frames == 0 || rules.duration_seconds <= 0.0 {
                return Err(CoreError::InvalidConfig("malformed level rules"));
            }
            if !(0.0..=1.0).contains(&rules.spawn_probability) {
                return Err(CoreError::InvalidConfig(
                    "spawn probability must be within 0.0..=1.0",
                ));
            }
            let (speed_min, speed_max) = rules.asteroid_speed;
            if speed_min < 0.0 || speed_min > speed_max {
                return Err(CoreError::InvalidConfig(
                    "asteroid speed range must be non-negative and ordered",
                ));
            }
        }
        Ok(())
    }

    /// Rules for a one-based level index, clamped to the last configured level.
    #[must_use]
    pub fn level_rules(&self, level: u32) -> &LevelRules {
        let idx = (level.saturating_sub(1) as usize).min(self.levels.len() - 1);
        &self.levels[idx]
    }

    /// Number of configured levels.
    #[must_use]
    pub fn level_count(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX)
    }
}
