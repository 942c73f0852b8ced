use glam::Vec3;
use serde::Serialize;

use crate::types::{EntityId, IdSource};

/// Plant root available for colonization.
///
/// `position` is the crown point where the root meets the soil surface; the
/// root body extends downward from there.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    pub id: EntityId,
    pub position: Vec3,
    pub length: f32,
    pub size: f32,
    /// Vigor in [0, 1]; healthier roots attract hyphae more strongly.
    pub health: f32,
    /// One-way flag set on first hyphal contact.
    pub colonized: bool,
    pub branch_points: Vec<Vec3>,
}

impl Root {
    /// Midpoint of the root body, where nutrient transfer happens.
    pub fn exchange_point(&self) -> Vec3 {
        self.position - Vec3::new(0.0, self.length * 0.5, 0.0)
    }
}

/// The fixed trio of roots every session starts with.
pub fn initial_layout(ids: &mut IdSource) -> Vec<Root> {
    let presets = [
        (Vec3::new(-2.0, 0.0, -1.0), 3.0, 0.10, 0.9),
        (Vec3::new(1.0, 0.0, 2.0), 2.5, 0.08, 0.8),
        (Vec3::new(-1.0, 0.0, 3.0), 2.0, 0.06, 0.7),
    ];
    presets
        .iter()
        .map(|&(position, length, size, health)| Root {
            id: ids.mint(),
            position,
            length,
            size,
            health,
            colonized: false,
            branch_points: Vec::new(),
        })
        .collect()
}
