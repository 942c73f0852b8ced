use glam::Vec3;
use serde::Serialize;

use crate::types::EntityId;

/// Dormant fungal propagule waiting for germination conditions.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spore {
    pub id: EntityId,
    pub position: Vec3,
    /// Germination fitness in [0, 1]; spores at 0.3 or below never germinate.
    pub viability: f32,
    /// One-way flag set by the growth engine when the spore sprouts a hypha.
    pub germinated: bool,
    /// Simulation time at which the spore entered the population.
    pub time_created: f32,
}

/// Target spore count for a given density: 12 at density 1.0, +10 per unit.
pub fn spore_target(density: f32) -> usize {
    (12.0 + (density - 1.0) * 10.0).round().max(0.0) as usize
}
