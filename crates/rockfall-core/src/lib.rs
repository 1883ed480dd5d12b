//! # Rockfall Core
//!
//! Frame-stepped simulation core for Rockfall, an arcade asteroid shooter.
//!
//! This crate is the headless game engine: the renderer and the platform
//! layer live elsewhere and drive it one frame at a time. Everything is
//! single-threaded and deterministic: the same configuration, seed, and
//! input sequence replay the same game.
//!
//! ## Architecture
//!
//! - **Registry**: index-handle entity store with a tagged-variant component
//!   slab
//! - **Spawner**: fixed entity pools recycled for the whole session
//! - **Grid**: uniform-bucket broad phase feeding the collision event queue
//! - **Events / Callbacks**: frame-boundary dispatch and frame-counted
//!   deferred actions
//! - **Rewind**: bounded ring of whole-world snapshots for time rewind
//!
//! ## Usage
//!
//! ```rust
//! use glam::Vec2;
//! use rockfall_core::config::{SimConfig, SpriteLibrary};
//! use rockfall_core::simulation::{FrameInput, Simulation};
//!
//! # fn main() -> Result<(), rockfall_core::error::CoreError> {
//! let mut sim = Simulation::new(SimConfig::default(), SpriteLibrary::default())?;
//! let input = FrameInput {
//!     thrust: 1.0,
//!     ..FrameInput::idle(Vec2::new(1024.0, 768.0))
//! };
//! sim.update(1.0 / 60.0, &input)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod callbacks;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod grid;
pub mod registry;
pub mod rewind;
pub mod simulation;
pub mod slab;
pub mod spawner;

pub use config::{SimConfig, SpriteLibrary};
pub use entity::{EntityHandle, EntityKind};
pub use error::CoreError;
pub use simulation::{FrameInput, SessionPhase, SessionState, Simulation};

#[cfg(test)]
mod tests;
