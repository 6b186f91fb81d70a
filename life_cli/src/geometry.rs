//! Reference geometry built from bible positions.

use std::sync::Arc;

use life_core::ZoneGeometry;
use world_rules::{ObjectId, Position, WorldBible, ZoneId};

/// Default interaction reach, in the same units as bible coordinates.
pub const INTERACT_RADIUS: f32 = 40.0;

/// Zone bounds from the bible, reach by distance to object positions,
/// hazards by distance to hazard points. Objects without a position are
/// reachable from anywhere.
#[derive(Debug, Clone)]
pub struct BibleGeometry {
    bible: Arc<WorldBible>,
    interact_radius: f32,
}

impl BibleGeometry {
    pub fn new(bible: Arc<WorldBible>) -> Self {
        Self {
            bible,
            interact_radius: INTERACT_RADIUS,
        }
    }
}

impl ZoneGeometry for BibleGeometry {
    fn is_walkable(&self, zone: &ZoneId, position: Position) -> bool {
        self.bible.zone(zone).is_some_and(|zone| {
            (0.0..=zone.width).contains(&position.x) && (0.0..=zone.height).contains(&position.y)
        })
    }

    fn objects_in_range(&self, zone: &ZoneId, position: Position) -> Vec<ObjectId> {
        let Some(zone) = self.bible.zone(zone) else {
            return Vec::new();
        };
        zone.objects
            .iter()
            .filter(|object| {
                object
                    .position
                    .map_or(true, |at| at.distance(position) <= self.interact_radius)
            })
            .map(|object| object.id.clone())
            .collect()
    }

    fn hazard_at(&self, zone: &ZoneId, position: Position) -> Option<String> {
        self.bible
            .zone(zone)?
            .hazards
            .iter()
            .find(|hazard| hazard.position.distance(position) <= hazard.radius)
            .map(|hazard| hazard.cause.clone())
    }
}
