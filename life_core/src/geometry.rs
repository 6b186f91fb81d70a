//! Collision and geometry collaborator.
//!
//! The engine never measures distances or tests collisions itself. It asks a
//! [`ZoneGeometry`] implementation, supplied by the front-end.

use std::sync::Arc;

use world_rules::{ObjectId, Position, WorldBible, ZoneId};

/// Answers spatial questions about a zone.
pub trait ZoneGeometry {
    /// Whether the player may stand at `position`.
    fn is_walkable(&self, zone: &ZoneId, position: Position) -> bool;

    /// Objects the player can interact with from `position`.
    fn objects_in_range(&self, zone: &ZoneId, position: Position) -> Vec<ObjectId>;

    /// Cause of death if `position` is lethal.
    fn hazard_at(&self, zone: &ZoneId, position: Position) -> Option<String>;

    fn in_range(&self, zone: &ZoneId, position: Position, object: &ObjectId) -> bool {
        self.objects_in_range(zone, position).contains(object)
    }
}

/// Geometry with no walls, no hazards and unlimited reach.
///
/// Useful for headless runs and tests that only care about rules.
#[derive(Debug, Clone)]
pub struct OpenGround {
    bible: Arc<WorldBible>,
}

impl OpenGround {
    pub fn new(bible: Arc<WorldBible>) -> Self {
        Self { bible }
    }
}

impl ZoneGeometry for OpenGround {
    fn is_walkable(&self, _zone: &ZoneId, _position: Position) -> bool {
        true
    }

    fn objects_in_range(&self, zone: &ZoneId, _position: Position) -> Vec<ObjectId> {
        self.bible
            .zone(zone)
            .map(|zone| zone.objects.iter().map(|object| object.id.clone()).collect())
            .unwrap_or_default()
    }

    fn hazard_at(&self, _zone: &ZoneId, _position: Position) -> Option<String> {
        None
    }
}

impl<G: ZoneGeometry + ?Sized> ZoneGeometry for Box<G> {
    fn is_walkable(&self, zone: &ZoneId, position: Position) -> bool {
        (**self).is_walkable(zone, position)
    }

    fn objects_in_range(&self, zone: &ZoneId, position: Position) -> Vec<ObjectId> {
        (**self).objects_in_range(zone, position)
    }

    fn hazard_at(&self, zone: &ZoneId, position: Position) -> Option<String> {
        (**self).hazard_at(zone, position)
    }

    fn in_range(&self, zone: &ZoneId, position: Position, object: &ObjectId) -> bool {
        (**self).in_range(zone, position, object)
    }
}
