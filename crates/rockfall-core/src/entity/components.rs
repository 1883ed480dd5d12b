//! Component data for the tagged-variant component model.
//!
//! Every capability is a plain data struct and [`Component`] is the tagged
//! union over them; code matches on the variant rather than downcasting
//! through a generic component pointer. Components are allocated once from the
//! [`ComponentSlab`](crate::slab::ComponentSlab) and logically reset when
//! their entity is recycled, never deallocated.
//!
//! Each component stores its owner's [`EntityHandle`] as a back-reference;
//! components never own their entity and refer to siblings through the
//! registry, not through pointers.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AnimationKind;
use crate::entity::EntityHandle;

/// Discriminates component attachments on an entity.
///
/// An entity carries at most one component per kind. Note that the three
/// animation kinds all store an [`AnimationState`]; the kind distinguishes
/// the strip being played (main loop, explosion, warp-in).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Velocity/heading integration.
    Movement,
    /// Broad-phase participation and hit bookkeeping.
    Collision,
    /// Activation/deactivation bookkeeping.
    ActiveState,
    /// The entity's looping main animation.
    MainAnimation,
    /// One-shot explosion animation (asteroids).
    ExplosionAnimation,
    /// One-shot warp-in animation (asteroids).
    WarpAnimation,
    /// Kind-specific attributes (hp, hit counters).
    Attribute,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Movement => "Movement",
            Self::Collision => "Collision",
            Self::ActiveState => "ActiveState",
            Self::MainAnimation => "MainAnimation",
            Self::ExplosionAnimation => "ExplosionAnimation",
            Self::WarpAnimation => "WarpAnimation",
            Self::Attribute => "Attribute",
        };
        write!(f, "{name}")
    }
}

/// How a movement component integrates position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementMode {
    /// Heading and thrust driven by player input each frame.
    PlayerControlled,
    /// Straight-line travel along the heading set at spawn.
    Ray,
}

/// Velocity, heading, and pause state for one entity.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    /// Owning entity.
    pub owner: EntityHandle,
    /// Integration mode.
    pub mode: MovementMode,
    /// Current velocity, world units per second.
    pub velocity: Vec2,
    /// Heading in degrees, 0 pointing along +X, counter-clockwise.
    pub heading_degrees: f32,
    /// When set, position integration is skipped.
    pub paused: bool,
}

impl MovementState {
    /// Creates a movement component at rest.
    #[must_use]
    pub fn new(owner: EntityHandle, mode: MovementMode) -> Self {
        Self {
            owner,
            mode,
            velocity: Vec2::ZERO,
            heading_degrees: 0.0,
            paused: false,
        }
    }

    /// Unit vector along the current heading.
    #[must_use]
    pub fn heading_vector(&self) -> Vec2 {
        let radians = self.heading_degrees.to_radians();
        Vec2::new(radians.cos(), radians.sin())
    }

    /// Returns the component to its just-constructed state.
    pub fn reset(&mut self) {
        self.velocity = Vec2::ZERO;
        self.heading_degrees = 0.0;
        self.paused = false;
    }
}

/// Whether an animation loops forever or plays through once.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Wraps back to frame 0 after the last frame.
    Indefinite,
    /// Stops on the last frame and reports finished.
    Once,
}

/// Playback state for one animation strip.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    /// Owning entity.
    pub owner: EntityHandle,
    /// Which strip is being played.
    pub kind: AnimationKind,
    /// Strip length in frames.
    pub total_frames: u32,
    /// Current frame index, `< total_frames`.
    pub current_frame: u32,
    /// Loop or one-shot.
    pub repeat: RepeatMode,
    /// Whether playback advances this frame.
    pub playing: bool,
}

impl AnimationState {
    /// Creates playback state at frame 0.
    #[must_use]
    pub fn new(
        owner: EntityHandle,
        kind: AnimationKind,
        total_frames: u32,
        repeat: RepeatMode,
        playing: bool,
    ) -> Self {
        Self {
            owner,
            kind,
            total_frames,
            current_frame: 0,
            repeat,
            playing,
        }
    }

    /// Advances playback by one simulation frame.
    ///
    /// Indefinite strips wrap; one-shot strips stop on the final frame and
    /// stay there until [`AnimationState::restart`] or reset.
    pub fn advance(&mut self) {
        if !self.playing || self.total_frames == 0 {
            return;
        }
        match self.repeat {
            RepeatMode::Indefinite => {
                self.current_frame = (self.current_frame + 1) % self.total_frames;
            }
            RepeatMode::Once => {
                if self.current_frame + 1 < self.total_frames {
                    self.current_frame += 1;
                }
                // Playback stops the moment the last frame is reached.
                if self.current_frame + 1 >= self.total_frames {
                    self.playing = false;
                }
            }
        }
    }

    /// True once a one-shot strip has played through.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.repeat == RepeatMode::Once
            && !self.playing
            && self.total_frames > 0
            && self.current_frame == self.total_frames - 1
    }

    /// Starts (or restarts) playback from frame 0.
    pub fn restart(&mut self) {
        self.current_frame = 0;
        self.playing = true;
    }

    /// Returns playback to frame 0, stopped for one-shot strips.
    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.playing = self.repeat == RepeatMode::Indefinite;
    }
}

/// Broad-phase participation and per-entity hit bookkeeping.
///
/// A collision component arms itself a configurable number of frames after
/// its entity activates, so freshly warped-in asteroids cannot collide while
/// the warp animation plays. Exploding entities disarm until recycled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionState {
    /// Owning entity.
    pub owner: EntityHandle,
    /// Frames after activation before collisions register.
    pub arm_delay_frames: u32,
    /// Frames elapsed since the entity last activated.
    pub frames_since_activation: u32,
    /// Set while the entity is exploding or otherwise non-collidable.
    pub disarmed: bool,
    /// Bullet hits taken since last reset.
    pub bullet_hits: u32,
}

impl CollisionState {
    /// Creates a collision component with the given arming delay.
    #[must_use]
    pub fn new(owner: EntityHandle, arm_delay_frames: u32) -> Self {
        Self {
            owner,
            arm_delay_frames,
            frames_since_activation: 0,
            disarmed: false,
            bullet_hits: 0,
        }
    }

    /// True when this entity currently participates in collision detection.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        !self.disarmed && self.frames_since_activation >= self.arm_delay_frames
    }

    /// Advances the arming counter by one frame.
    pub fn tick(&mut self) {
        self.frames_since_activation = self.frames_since_activation.saturating_add(1);
    }

    /// Returns the component to its just-activated state.
    pub fn reset(&mut self) {
        self.frames_since_activation = 0;
        self.disarmed = false;
        self.bullet_hits = 0;
    }
}

/// Bounds policy for pooled entities: how far past the window edge the
/// owner may stray before its slot goes back to the pool.
///
/// The player wraps toroidally instead and never carries this component;
/// the cursor is pinned to the window.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveState {
    /// Owning entity.
    pub owner: EntityHandle,
    /// Distance beyond the window edge before deactivation, sized from the
    /// owner's sprite so it leaves the screen fully before vanishing.
    pub despawn_margin: f32,
}

impl ActiveState {
    /// Creates the bounds policy with the given margin.
    #[must_use]
    pub const fn new(owner: EntityHandle, despawn_margin: f32) -> Self {
        Self {
            owner,
            despawn_margin,
        }
    }

    /// True once `position` has strayed beyond the window plus the margin.
    #[must_use]
    pub fn out_of_bounds(&self, position: Vec2, window: Vec2) -> bool {
        position.x < -self.despawn_margin
            || position.y < -self.despawn_margin
            || position.x > window.x + self.despawn_margin
            || position.y > window.y + self.despawn_margin
    }
}

/// Kind-specific attribute payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeData {
    /// Player hit points.
    Player {
        /// Current hit points; 0 means dead.
        hp: u32,
        /// Hit points restored on level reset.
        max_hp: u32,
    },
    /// Asteroid durability.
    Asteroid {
        /// Bullet hits left before this asteroid is destroyed.
        hits_remaining: u32,
        /// Hits restored when the slot is recycled.
        durability: u32,
    },
    /// The cursor has no gameplay attributes.
    Cursor,
}

/// Attribute component wrapping the kind-specific payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeState {
    /// Owning entity.
    pub owner: EntityHandle,
    /// Kind-specific payload.
    pub data: AttributeData,
}

impl AttributeState {
    /// Creates an attribute component.
    #[must_use]
    pub const fn new(owner: EntityHandle, data: AttributeData) -> Self {
        Self { owner, data }
    }

    /// Restores counters to their configured starting values.
    pub fn reset(&mut self) {
        match &mut self.data {
            AttributeData::Player { hp, max_hp } => *hp = *max_hp,
            AttributeData::Asteroid {
                hits_remaining,
                durability,
            } => *hits_remaining = *durability,
            AttributeData::Cursor => {}
        }
    }
}

/// Tagged union over all component capabilities.
///
/// Stored in the [`ComponentSlab`](crate::slab::ComponentSlab); entities hold
/// `(ComponentKind, SlotIndex)` references into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    /// Velocity/heading integration.
    Movement(MovementState),
    /// Broad-phase participation.
    Collision(CollisionState),
    /// Off-window bounds policy.
    ActiveState(ActiveState),
    /// Animation playback (main, explosion, or warp strip).
    Animation(AnimationState),
    /// Kind-specific attributes.
    Attribute(AttributeState),
}

impl Component {
    /// The owner back-reference carried by every variant.
    #[must_use]
    pub const fn owner(&self) -> EntityHandle {
        match self {
            Self::Movement(c) => c.owner,
            Self::Collision(c) => c.owner,
            Self::ActiveState(c) => c.owner,
            Self::Animation(c) => c.owner,
            Self::Attribute(c) => c.owner,
        }
    }

    /// Logical destruction: resets fields, keeps the slot allocated.
    pub fn reset(&mut self) {
        match self {
            Self::Movement(c) => c.reset(),
            Self::Collision(c) => c.reset(),
            // The bounds policy is constant for the slot's lifetime.
            Self::ActiveState(_) => {}
            Self::Animation(c) => c.reset(),
            Self::Attribute(c) => c.reset(),
        }
    }

    /// Returns the movement state, if this is a movement component.
    #[must_use]
    pub const fn as_movement(&self) -> Option<&MovementState> {
        match self {
            Self::Movement(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable movement state, if this is a movement component.
    pub fn as_movement_mut(&mut self) -> Option<&mut MovementState> {
        match self {
            Self::Movement(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the collision state, if this is a collision component.
    #[must_use]
    pub const fn as_collision(&self) -> Option<&CollisionState> {
        match self {
            Self::Collision(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable collision state, if this is a collision component.
    pub fn as_collision_mut(&mut self) -> Option<&mut CollisionState> {
        match self {
            Self::Collision(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the activation bookkeeping, if this is an active-state component.
    #[must_use]
    pub const fn as_active_state(&self) -> Option<&ActiveState> {
        match self {
            Self::ActiveState(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable activation bookkeeping, if this is an active-state component.
    pub fn as_active_state_mut(&mut self) -> Option<&mut ActiveState> {
        match self {
            Self::ActiveState(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the animation state, if this is an animation component.
    #[must_use]
    pub const fn as_animation(&self) -> Option<&AnimationState> {
        match self {
            Self::Animation(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable animation state, if this is an animation component.
    pub fn as_animation_mut(&mut self) -> Option<&mut AnimationState> {
        match self {
            Self::Animation(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the attribute state, if this is an attribute component.
    #[must_use]
    pub const fn as_attribute(&self) -> Option<&AttributeState> {
        match self {
            Self::Attribute(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable attribute state, if this is an attribute component.
    pub fn as_attribute_mut(&mut self) -> Option<&mut AttributeState> {
        match self {
            Self::Attribute(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: EntityHandle = EntityHandle::new(3);

    mod movement_tests {
        use super::*;

        #[test]
        fn heading_vector_points_along_heading() {
            let mut m = MovementState::new(OWNER, MovementMode::Ray);
            m.heading_degrees = 0.0;
            assert!((m.heading_vector() - Vec2::X).length() < 1e-6);
            m.heading_degrees = 90.0;
            assert!((m.heading_vector() - Vec2::Y).length() < 1e-6);
        }

        #[test]
        fn reset_clears_motion() {
            let mut m = MovementState::new(OWNER, MovementMode::Ray);
            m.velocity = Vec2::new(5.0, -3.0);
            m.heading_degrees = 42.0;
            m.paused = true;
            m.reset();
            assert_eq!(m.velocity, Vec2::ZERO);
            assert_eq!(m.heading_degrees, 0.0);
            assert!(!m.paused);
        }
    }

    mod animation_tests {
        use super::*;
        use crate::config::AnimationKind;

        #[test]
        fn indefinite_wraps() {
            let mut a = AnimationState::new(
                OWNER,
                AnimationKind::Asteroid,
                3,
                RepeatMode::Indefinite,
                true,
            );
            a.advance();
            a.advance();
            assert_eq!(a.current_frame, 2);
            a.advance();
            assert_eq!(a.current_frame, 0);
            assert!(!a.finished());
        }

        #[test]
        fn once_stops_on_last_frame() {
            let mut a = AnimationState::new(
                OWNER,
                AnimationKind::AsteroidExplosion,
                3,
                RepeatMode::Once,
                true,
            );
            a.advance();
            assert!(!a.finished());
            a.advance();
            assert!(a.finished());
            assert_eq!(a.current_frame, 2);
            // Further advances are no-ops.
            a.advance();
            assert_eq!(a.current_frame, 2);
        }

        #[test]
        fn single_frame_once_strip_finishes_on_first_advance() {
            let mut a = AnimationState::new(
                OWNER,
                AnimationKind::AsteroidExplosion,
                1,
                RepeatMode::Once,
                true,
            );
            a.advance();
            assert!(a.finished());
            assert_eq!(a.current_frame, 0);
        }

        #[test]
        fn restart_replays_once_strip() {
            let mut a = AnimationState::new(
                OWNER,
                AnimationKind::AsteroidExplosion,
                2,
                RepeatMode::Once,
                true,
            );
            a.advance();
            assert!(a.finished());
            a.restart();
            assert!(!a.finished());
            assert_eq!(a.current_frame, 0);
        }

        #[test]
        fn paused_does_not_advance() {
            let mut a = AnimationState::new(
                OWNER,
                AnimationKind::AsteroidWarp,
                4,
                RepeatMode::Once,
                false,
            );
            a.advance();
            assert_eq!(a.current_frame, 0);
        }
    }

    mod collision_tests {
        use super::*;

        #[test]
        fn arms_after_delay() {
            let mut c = CollisionState::new(OWNER, 2);
            assert!(!c.is_armed());
            c.tick();
            assert!(!c.is_armed());
            c.tick();
            assert!(c.is_armed());
        }

        #[test]
        fn disarmed_never_armed() {
            let mut c = CollisionState::new(OWNER, 0);
            assert!(c.is_armed());
            c.disarmed = true;
            assert!(!c.is_armed());
        }

        #[test]
        fn reset_rearms_from_zero() {
            let mut c = CollisionState::new(OWNER, 1);
            c.tick();
            c.bullet_hits = 2;
            c.disarmed = true;
            c.reset();
            assert_eq!(c.frames_since_activation, 0);
            assert_eq!(c.bullet_hits, 0);
            assert!(!c.disarmed);
        }
    }

    mod active_state_tests {
        use super::*;

        const WINDOW: Vec2 = Vec2::new(100.0, 80.0);

        #[test]
        fn inside_and_on_edge_stay_in_bounds() {
            let s = ActiveState::new(OWNER, 10.0);
            assert!(!s.out_of_bounds(Vec2::new(50.0, 40.0), WINDOW));
            assert!(!s.out_of_bounds(Vec2::new(0.0, 0.0), WINDOW));
            assert!(!s.out_of_bounds(Vec2::new(110.0, 40.0), WINDOW));
        }

        #[test]
        fn beyond_the_margin_is_out() {
            let s = ActiveState::new(OWNER, 10.0);
            assert!(s.out_of_bounds(Vec2::new(-10.5, 40.0), WINDOW));
            assert!(s.out_of_bounds(Vec2::new(50.0, 91.0), WINDOW));
        }
    }

    mod attribute_tests {
        use super::*;

        #[test]
        fn player_reset_restores_hp() {
            let mut a = AttributeState::new(OWNER, AttributeData::Player { hp: 2, max_hp: 10 });
            a.reset();
            assert_eq!(a.data, AttributeData::Player { hp: 10, max_hp: 10 });
        }

        #[test]
        fn asteroid_reset_restores_durability() {
            let mut a = AttributeState::new(
                OWNER,
                AttributeData::Asteroid {
                    hits_remaining: 0,
                    durability: 3,
                },
            );
            a.reset();
            assert_eq!(
                a.data,
                AttributeData::Asteroid {
                    hits_remaining: 3,
                    durability: 3,
                }
            );
        }
    }

    mod component_tests {
        use super::*;

        #[test]
        fn owner_reported_for_every_variant() {
            let c = Component::Movement(MovementState::new(OWNER, MovementMode::Ray));
            assert_eq!(c.owner(), OWNER);
            let c = Component::Collision(CollisionState::new(OWNER, 0));
            assert_eq!(c.owner(), OWNER);
        }

        #[test]
        fn accessors_match_variants() {
            let mut c = Component::Movement(MovementState::new(OWNER, MovementMode::Ray));
            assert!(c.as_movement().is_some());
            assert!(c.as_movement_mut().is_some());
            assert!(c.as_collision().is_none());
            assert!(c.as_attribute().is_none());
        }

        #[test]
        fn serde_roundtrip() {
            let c = Component::Attribute(AttributeState::new(
                OWNER,
                AttributeData::Player { hp: 5, max_hp: 10 },
            ));
            let json = serde_json::to_string(&c).unwrap();
            let back: Component = serde_json::from_str(&json).unwrap();
            assert_eq!(c, back);
        }
    }
}
