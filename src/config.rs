// Simulation parameters and config file loading (YAML or JSON)

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable inputs to the growth and nutrient-exchange engines.
///
/// Every field is populated at session start, so the engines never branch on
/// absence. The environmental factors (`soil_moisture`, `nutrients`,
/// `root_health`) live in [0, 1]; `spore_density` is an unbounded positive
/// scale where 1.0 maps to a population of 12 spores. The engines treat all
/// of these as read-only; only the session mutates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Spore population scale: target count = round(12 + (density - 1) * 10).
    pub spore_density: f32,
    /// Soil moisture; germination stops entirely below 0.2.
    pub soil_moisture: f32,
    /// Ambient nutrient availability.
    pub nutrients: f32,
    /// Global root-health knob exposed to the control panel; the engines read
    /// per-root health.
    pub root_health: f32,
    /// Base hyphal extension speed multiplier.
    pub growth_rate: f32,
    /// Scales both germination chance and branching probability.
    pub colonization_rate: f32,
    /// Branch-probability multiplier.
    pub branching_factor: f32,
    /// Path-length cap before a hypha goes dormant (nutrient-scaled).
    pub max_hyphal_length: f32,
    /// Base radius for hypha-root connection (applied with a 1.5x grace factor).
    pub connection_distance: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            spore_density: 1.2,
            soil_moisture: 0.6,
            nutrients: 0.7,
            root_health: 0.8,
            growth_rate: 1.0,
            colonization_rate: 0.5,
            branching_factor: 1.5,
            max_hyphal_length: 5.0,
            connection_distance: 0.5,
        }
    }
}

impl SimulationParameters {
    /// Load parameters from a YAML or JSON file, judged by extension.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let params = match ext.as_str() {
            "json" => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(params)
    }

    /// Search the working directory for a config file, falling back to defaults.
    pub fn from_default_paths() -> Self {
        for candidate in ["config.yaml", "config.yml", "config.json"] {
            if Path::new(candidate).exists() {
                match Self::from_file(candidate) {
                    Ok(params) => {
                        log::info!("loaded simulation parameters from {}", candidate);
                        return params;
                    }
                    Err(e) => {
                        log::warn!("ignoring {}: {}", candidate, e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Merge a partial update in place. Returns true if `spore_density` was
    /// part of the update, which obliges the session to resize its spore
    /// population synchronously.
    pub fn apply(&mut self, update: &ParameterUpdate) -> bool {
        if let Some(v) = update.soil_moisture {
            self.soil_moisture = v;
        }
        if let Some(v) = update.nutrients {
            self.nutrients = v;
        }
        if let Some(v) = update.root_health {
            self.root_health = v;
        }
        if let Some(v) = update.growth_rate {
            self.growth_rate = v;
        }
        if let Some(v) = update.colonization_rate {
            self.colonization_rate = v;
        }
        if let Some(v) = update.branching_factor {
            self.branching_factor = v;
        }
        if let Some(v) = update.max_hyphal_length {
            self.max_hyphal_length = v;
        }
        if let Some(v) = update.connection_distance {
            self.connection_distance = v;
        }
        if let Some(v) = update.spore_density {
            self.spore_density = v;
            return true;
        }
        false
    }
}

/// Partial parameter update as submitted by the control panel.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ParameterUpdate {
    pub spore_density: Option<f32>,
    pub soil_moisture: Option<f32>,
    pub nutrients: Option<f32>,
    pub root_health: Option<f32>,
    pub growth_rate: Option<f32>,
    pub colonization_rate: Option<f32>,
    pub branching_factor: Option<f32>,
    pub max_hyphal_length: Option<f32>,
    pub connection_distance: Option<f32>,
}
