use glam::Vec3;
use serde::Serialize;

use crate::types::EntityId;

/// A single fungal filament, stored as the polyline of its growth history.
///
/// `segments` always holds at least the origin point. `connected_to_root` and
/// `connected_roots` move together: the flag is true exactly when the list is
/// non-empty, and both are maintained by the growth engine and by root
/// removal.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypha {
    pub id: EntityId,
    pub segments: Vec<Vec3>,
    pub growth_direction: Vec3,
    /// Cleared when the path-length cap is reached; dormant hyphae keep their
    /// geometry and connections but stop extending.
    pub active: bool,
    /// Age factor in [0, 1]; gates branching and nutrient exchange.
    pub maturity: f32,
    pub connected_to_root: bool,
    pub branch_points: Vec<Vec3>,
    pub parent_spore: Option<EntityId>,
    /// Ids of every root this hypha has colonized, in colonization order.
    pub connected_roots: Vec<EntityId>,
}

impl Hypha {
    pub fn sprout(
        id: EntityId,
        origin: Vec3,
        direction: Vec3,
        parent_spore: Option<EntityId>,
    ) -> Self {
        Self {
            id,
            segments: vec![origin],
            growth_direction: direction,
            active: true,
            maturity: 0.0,
            connected_to_root: false,
            branch_points: Vec::new(),
            parent_spore,
            connected_roots: Vec::new(),
        }
    }

    /// Current growing tip (last segment).
    pub fn tip(&self) -> Vec3 {
        self.segments[self.segments.len() - 1]
    }

    /// Origin point (first segment).
    pub fn base(&self) -> Vec3 {
        self.segments[0]
    }

    /// Total length of the segment polyline.
    pub fn path_length(&self) -> f32 {
        self.segments
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprout_starts_with_single_segment() {
        let h = Hypha::sprout(7, Vec3::new(1.0, -1.0, 0.0), Vec3::Y, Some(3));
        assert_eq!(h.segments.len(), 1);
        assert_eq!(h.tip(), h.base());
        assert_eq!(h.path_length(), 0.0);
        assert!(h.active);
        assert!(!h.connected_to_root);
    }

    #[test]
    fn path_length_sums_segment_distances() {
        let mut h = Hypha::sprout(0, Vec3::ZERO, Vec3::X, None);
        h.segments.push(Vec3::new(1.0, 0.0, 0.0));
        h.segments.push(Vec3::new(1.0, 2.0, 0.0));
        assert!((h.path_length() - 3.0).abs() < 1e-6);
        assert_eq!(h.tip(), Vec3::new(1.0, 2.0, 0.0));
    }
}
