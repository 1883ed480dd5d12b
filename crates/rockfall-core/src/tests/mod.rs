//! Crate-internal integration, determinism, and property tests.
//!
//! Unit tests live beside the code they cover; this module exercises the
//! assembled world through the public frame loop:
//! - **Integration tests**: full-frame collision, scoring, and pool flows
//! - **Determinism tests**: equal seed and inputs replay the same game
//! - **Property tests**: rewind round-trips and the retained-depth bound
//! - **Helper functions**: configuration and input-script utilities

mod helpers;

pub use helpers::*;
