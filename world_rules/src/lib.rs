//! # World Rules
//!
//! The "World Bible" crate - content definitions, persistent world state, and
//! the unlock rules that drive progression between lives.
//! This crate is the single source of truth for cross-life state and does not
//! know anything about timers, input, or rendering.

pub mod content;
pub mod entities;
pub mod error;
pub mod mechanics;
pub mod persist;
pub mod progression;
pub mod world_state;

pub use content::*;
pub use entities::*;
pub use error::*;
pub use mechanics::*;
pub use persist::*;
pub use progression::*;
pub use world_state::*;
