//! # Life Core
//!
//! The ten second life loop. A [`LifeSession`] holds one life's working copy
//! of the world; the [`Resolver`] decides which interactions apply; the
//! [`LifeCycleController`] runs lives back to back and commits each finished
//! one to the [`world_rules::WorldStore`].

pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod resolver;
pub mod session;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use geometry::*;
pub use resolver::*;
pub use session::*;
