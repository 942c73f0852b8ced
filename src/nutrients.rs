// Nutrient exchange engine: particle spawning, advancement, flow statistics

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

use crate::config::SimulationParameters;
use crate::hypha::Hypha;
use crate::root::Root;
use crate::types::{EntityId, IdSource};

/// What a particle carries, which also fixes its travel direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientKind {
    /// Fungus to plant, tip to exchange point.
    Phosphorus,
    /// Plant to fungus, root to tip.
    Carbohydrates,
    /// Fungus to plant, base to root body.
    Water,
}

/// A particle in transit between a hypha and a root.
///
/// `source` and `target` are fixed at spawn; `position` is derived from
/// `progress` each step, so wobble never accumulates and the particle lands
/// exactly on `target` when it completes.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrient {
    pub id: EntityId,
    pub kind: NutrientKind,
    pub position: Vec3,
    pub source: Vec3,
    pub target: Vec3,
    pub concentration: f32,
    pub flow_rate: f32,
    /// Travel fraction in [0, 1]; the particle is removed on the step after
    /// reaching 1.
    pub progress: f32,
}

/// Spawn new particles along mature colonized links and advance everything
/// in flight. A no-op when `dt <= 0`.
pub fn advance_nutrients<R: Rng>(
    hyphae: &[Hypha],
    roots: &[Root],
    nutrients: &mut Vec<Nutrient>,
    params: &SimulationParameters,
    dt: f32,
    ids: &mut IdSource,
    rng: &mut R,
) {
    if dt <= 0.0 {
        return;
    }

    nutrients.retain(|n| n.progress < 1.0);

    let chance = 0.008 * params.nutrients * params.soil_moisture;
    for hypha in hyphae {
        if !hypha.connected_to_root || hypha.maturity <= 0.5 {
            continue;
        }
        for root in roots {
            if !root.colonized {
                continue;
            }
            if rng.gen::<f32>() < chance {
                nutrients.push(spawn(hypha, root, ids, rng));
            }
        }
    }

    for nutrient in nutrients.iter_mut() {
        nutrient.progress = (nutrient.progress + nutrient.flow_rate * dt * 1.2).min(1.0);
        if nutrient.progress >= 1.0 {
            nutrient.position = nutrient.target;
            continue;
        }
        let wobble = Vec3::new(
            (rng.gen::<f32>() - 0.5) * 0.005,
            (rng.gen::<f32>() - 0.5) * 0.002,
            (rng.gen::<f32>() - 0.5) * 0.005,
        );
        nutrient.position = nutrient.source.lerp(nutrient.target, nutrient.progress) + wobble;
    }
}

fn spawn<R: Rng>(hypha: &Hypha, root: &Root, ids: &mut IdSource, rng: &mut R) -> Nutrient {
    let draw = rng.gen::<f32>();
    let (kind, source, target, concentration, flow_rate) = if draw < 0.4 {
        (
            NutrientKind::Phosphorus,
            hypha.tip(),
            root.exchange_point(),
            0.7 + 0.3 * rng.gen::<f32>(),
            0.5 + 0.5 * rng.gen::<f32>(),
        )
    } else if draw < 0.7 {
        (
            NutrientKind::Carbohydrates,
            root.position - Vec3::new(0.0, root.length * 0.3, 0.0),
            hypha.tip(),
            0.5 + 0.5 * rng.gen::<f32>(),
            0.3 + 0.4 * rng.gen::<f32>(),
        )
    } else {
        (
            NutrientKind::Water,
            hypha.base(),
            root.position + Vec3::new(0.0, root.length * 0.2, 0.0),
            0.8 + 0.2 * rng.gen::<f32>(),
            0.6 + 0.4 * rng.gen::<f32>(),
        )
    };
    Nutrient {
        id: ids.mint(),
        kind,
        position: source,
        source,
        target,
        concentration,
        flow_rate,
        progress: 0.0,
    }
}

/// Aggregate view of the particles currently in flight.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStats {
    pub phosphorus_count: usize,
    pub carbohydrate_count: usize,
    pub water_count: usize,
    pub total_flow: f32,
    pub average_concentration: f32,
}

pub fn flow_stats(nutrients: &[Nutrient]) -> FlowStats {
    let mut stats = FlowStats::default();
    for n in nutrients {
        match n.kind {
            NutrientKind::Phosphorus => stats.phosphorus_count += 1,
            NutrientKind::Carbohydrates => stats.carbohydrate_count += 1,
            NutrientKind::Water => stats.water_count += 1,
        }
        stats.total_flow += n.flow_rate;
        stats.average_concentration += n.concentration;
    }
    if !nutrients.is_empty() {
        stats.average_concentration /= nutrients.len() as f32;
    }
    stats
}
