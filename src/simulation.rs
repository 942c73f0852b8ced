// Simulation session: entity collections, playback control, tick orchestration

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

use crate::config::{ParameterUpdate, SimulationParameters};
use crate::growth::advance_growth;
use crate::hypha::Hypha;
use crate::nutrients::{advance_nutrients, flow_stats, FlowStats, Nutrient};
use crate::root::{self, Root};
use crate::spore::{spore_target, Spore};
use crate::types::{EntityId, IdSource};

/// One running simulation: all entity collections plus playback state.
///
/// All mutation goes through the session so the invariants hold: ids are
/// never reused, `time` only moves forward between resets, and the growth
/// engine always runs before the exchange engine within a step.
pub struct Simulation {
    pub playing: bool,
    pub speed: f32,
    pub time: f32,
    pub spores: Vec<Spore>,
    pub hyphae: Vec<Hypha>,
    pub roots: Vec<Root>,
    pub nutrients: Vec<Nutrient>,
    pub parameters: SimulationParameters,
    ids: IdSource,
}

impl Simulation {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self::with_parameters(SimulationParameters::default(), rng)
    }

    pub fn with_parameters<R: Rng>(parameters: SimulationParameters, rng: &mut R) -> Self {
        let mut sim = Self {
            playing: false,
            speed: 1.0,
            time: 0.0,
            spores: Vec::new(),
            hyphae: Vec::new(),
            roots: Vec::new(),
            nutrients: Vec::new(),
            parameters,
            ids: IdSource::default(),
        };
        sim.reset(rng);
        sim
    }

    pub fn toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// One frame of playback. Does nothing while paused; otherwise advances
    /// by `dt` scaled by the playback speed.
    pub fn tick<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        if !self.playing {
            return;
        }
        self.advance(dt * self.speed, rng);
    }

    /// Advance the world unconditionally. Growth runs before exchange so
    /// connections made this step can carry nutrients this step.
    pub fn advance<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        if dt <= 0.0 {
            return;
        }
        self.time += dt;
        advance_growth(
            &mut self.spores,
            &mut self.hyphae,
            &mut self.roots,
            &self.parameters,
            dt,
            &mut self.ids,
            rng,
        );
        advance_nutrients(
            &self.hyphae,
            &self.roots,
            &mut self.nutrients,
            &self.parameters,
            dt,
            &mut self.ids,
            rng,
        );
    }

    /// Merge a partial parameter update. A density change resizes the spore
    /// population synchronously: new spores are scattered across the soil
    /// volume, excess ones are dropped newest-first.
    pub fn update_parameters<R: Rng>(&mut self, update: &ParameterUpdate, rng: &mut R) {
        if !self.parameters.apply(update) {
            return;
        }
        let target = spore_target(self.parameters.spore_density);
        if self.spores.len() < target {
            let missing = target - self.spores.len();
            for _ in 0..missing {
                self.spores.push(Spore {
                    id: self.ids.mint(),
                    position: Vec3::new(
                        (rng.gen::<f32>() - 0.5) * 12.0,
                        -1.0 + rng.gen::<f32>() * 0.5,
                        (rng.gen::<f32>() - 0.5) * 12.0,
                    ),
                    viability: 0.7 + rng.gen::<f32>() * 0.3,
                    germinated: false,
                    time_created: self.time,
                });
            }
            log::info!("spore population grown to {}", target);
        } else if self.spores.len() > target {
            self.spores.truncate(target);
            log::info!("spore population trimmed to {}", target);
        }
    }

    /// Return to the initial seeded state: the fixed root trio and a fresh
    /// spore population sized by the current density. Ids keep counting up.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.playing = false;
        self.time = 0.0;
        self.hyphae.clear();
        self.nutrients.clear();
        self.roots = root::initial_layout(&mut self.ids);
        self.spores.clear();
        for _ in 0..spore_target(self.parameters.spore_density) {
            self.spores.push(Spore {
                id: self.ids.mint(),
                position: Vec3::new(
                    (rng.gen::<f32>() - 0.5) * 10.0,
                    -1.0 + rng.gen::<f32>() * 0.5,
                    (rng.gen::<f32>() - 0.5) * 10.0,
                ),
                viability: 0.8 + rng.gen::<f32>() * 0.2,
                germinated: false,
                time_created: 0.0,
            });
        }
        log::info!(
            "session reset: {} roots, {} spores",
            self.roots.len(),
            self.spores.len()
        );
    }

    /// Plant a new root at the given soil position, or a random one.
    pub fn add_plant<R: Rng>(&mut self, position: Option<(f32, f32)>, rng: &mut R) -> EntityId {
        let (x, z) = position.unwrap_or_else(|| {
            (
                (rng.gen::<f32>() - 0.5) * 8.0,
                (rng.gen::<f32>() - 0.5) * 8.0,
            )
        });
        let root = Root {
            id: self.ids.mint(),
            position: Vec3::new(x, 0.0, z),
            length: 2.0 + rng.gen::<f32>() * 2.0,
            size: 0.06 + rng.gen::<f32>() * 0.04,
            health: 0.7 + rng.gen::<f32>() * 0.3,
            colonized: false,
            branch_points: Vec::new(),
        };
        let id = root.id;
        log::info!("planted root {} at ({:.2}, {:.2})", id, x, z);
        self.roots.push(root);
        id
    }

    /// Remove a root and everything tied to it: drop its id from each
    /// hypha's connection list (clearing the flag only when the list
    /// empties), and discard particles travelling to or from it.
    pub fn remove_plant(&mut self, root_id: EntityId) -> bool {
        let Some(index) = self.roots.iter().position(|r| r.id == root_id) else {
            return false;
        };
        let root = self.roots.remove(index);
        let exchange = root.exchange_point();

        for hypha in &mut self.hyphae {
            hypha.connected_roots.retain(|&id| id != root_id);
            if hypha.connected_roots.is_empty() {
                hypha.connected_to_root = false;
            }
        }
        self.nutrients.retain(|n| {
            n.source.distance(exchange) > 0.5 && n.target.distance(exchange) > 0.5
        });
        log::info!("removed root {}", root_id);
        true
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            spore_count: self.spores.len(),
            hyphal_count: self.hyphae.len(),
            root_count: self.roots.len(),
            nutrient_count: self.nutrients.len(),
            colonized_roots: self.roots.iter().filter(|r| r.colonized).count(),
            flows: flow_stats(&self.nutrients),
        }
    }

    pub fn export_data(&self) -> ExportSnapshot {
        ExportSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            simulation_time: self.time,
            parameters: self.parameters.clone(),
            stats: self.stats(),
        }
    }
}

/// Headline counters for the control panel.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStats {
    pub spore_count: usize,
    pub hyphal_count: usize,
    pub root_count: usize,
    pub nutrient_count: usize,
    pub colonized_roots: usize,
    pub flows: FlowStats,
}

/// Point-in-time export of the session, stamped with wall-clock time.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub timestamp: String,
    pub simulation_time: f32,
    pub parameters: SimulationParameters,
    pub stats: SimulationStats,
}
