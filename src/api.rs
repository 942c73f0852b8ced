// API module for headless mode - HTTP endpoints to interact with the simulation

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::config::{ParameterUpdate, SimulationParameters};
use crate::hypha::Hypha;
use crate::nutrients::Nutrient;
use crate::root::Root;
use crate::simulation::{ExportSnapshot, Simulation, SimulationStats};
use crate::spore::Spore;
use crate::types::EntityId;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Fixed step size used by both the frame loop and POST /step.
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStateResponse {
    pub playing: bool,
    pub speed: f32,
    pub time: f32,
    pub spores: Vec<Spore>,
    pub hyphae: Vec<Hypha>,
    pub roots: Vec<Root>,
    pub nutrients: Vec<Nutrient>,
    pub parameters: SimulationParameters,
    pub stats: SimulationStats,
}

#[derive(Deserialize)]
pub struct StepQuery {
    pub steps: Option<usize>,
}

#[derive(Deserialize)]
pub struct SpeedRequest {
    pub speed: f32,
}

#[derive(Deserialize)]
pub struct PlantRequest {
    pub x: f32,
    pub z: f32,
}

// Shared state for the API server
#[derive(Clone)]
pub struct ApiState {
    pub simulation: Arc<Mutex<Simulation>>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl ApiState {
    pub fn new(sim: Simulation, rng: StdRng) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(sim)),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn from_entropy(sim: Simulation) -> Self {
        Self::new(sim, StdRng::from_entropy())
    }
}

fn simulation_to_response(sim: &Simulation) -> SimulationStateResponse {
    SimulationStateResponse {
        playing: sim.playing,
        speed: sim.speed,
        time: sim.time,
        spores: sim.spores.clone(),
        hyphae: sim.hyphae.clone(),
        roots: sim.roots.clone(),
        nutrients: sim.nutrients.clone(),
        parameters: sim.parameters.clone(),
        stats: sim.stats(),
    }
}

// GET /state - Get current simulation state
async fn get_state(
    State(api_state): State<ApiState>,
) -> Result<Json<SimulationStateResponse>, StatusCode> {
    let sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(simulation_to_response(&sim)))
}

// GET /stats - Get simulation statistics
async fn get_stats(
    State(api_state): State<ApiState>,
) -> Result<Json<SimulationStats>, StatusCode> {
    let sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(sim.stats()))
}

// GET /config - Get current simulation parameters
async fn get_config(
    State(api_state): State<ApiState>,
) -> Result<Json<SimulationParameters>, StatusCode> {
    let sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(sim.parameters.clone()))
}

// GET /export - Export a timestamped snapshot
async fn get_export(
    State(api_state): State<ApiState>,
) -> Result<Json<ExportSnapshot>, StatusCode> {
    let sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(sim.export_data()))
}

// POST /step - Advance the simulation manually, even while paused
async fn step_simulation(
    Query(params): Query<StepQuery>,
    State(api_state): State<ApiState>,
) -> Result<Json<SimulationStateResponse>, StatusCode> {
    let mut sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut rng = api_state
        .rng
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let steps = params.steps.unwrap_or(1);
    for _ in 0..steps {
        sim.advance(FRAME_DT, &mut *rng);
    }

    Ok(Json(simulation_to_response(&sim)))
}

// POST /reset - Reset the simulation to its initial seeded state
async fn reset_simulation(
    State(api_state): State<ApiState>,
) -> Result<Json<SimulationStateResponse>, StatusCode> {
    let mut sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut rng = api_state
        .rng
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    sim.reset(&mut *rng);

    Ok(Json(simulation_to_response(&sim)))
}

// POST /pause - Toggle playback
async fn pause_simulation(
    State(api_state): State<ApiState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let playing = sim.toggle_play();
    Ok(Json(serde_json::json!({ "playing": playing })))
}

// POST /speed - Set the playback speed multiplier
async fn set_speed(
    State(api_state): State<ApiState>,
    Json(request): Json<SpeedRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    sim.set_speed(request.speed);
    Ok(Json(serde_json::json!({ "speed": sim.speed })))
}

// POST /params - Merge a partial parameter update
async fn update_params(
    State(api_state): State<ApiState>,
    Json(update): Json<ParameterUpdate>,
) -> Result<Json<SimulationParameters>, StatusCode> {
    let mut sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut rng = api_state
        .rng
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    sim.update_parameters(&update, &mut *rng);

    Ok(Json(sim.parameters.clone()))
}

// POST /plant - Add a root, at the given position or a random one
async fn add_plant(
    State(api_state): State<ApiState>,
    request: Option<Json<PlantRequest>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut rng = api_state
        .rng
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let position = request.map(|Json(r)| (r.x, r.z));
    let id = sim.add_plant(position, &mut *rng);

    Ok(Json(serde_json::json!({ "id": id })))
}

// DELETE /plant/:id - Remove a root and cascade its connections
async fn remove_plant(
    State(api_state): State<ApiState>,
    Path(id): Path<EntityId>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut sim = api_state
        .simulation
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if !sim.remove_plant(id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(serde_json::json!({ "removed": id })))
}

// Create the API router
pub fn create_router(api_state: ApiState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/stats", get(get_stats))
        .route("/config", get(get_config))
        .route("/export", get(get_export))
        .route("/step", post(step_simulation))
        .route("/reset", post(reset_simulation))
        .route("/pause", post(pause_simulation))
        .route("/speed", post(set_speed))
        .route("/params", post(update_params))
        .route("/plant", post(add_plant))
        .route("/plant/:id", delete(remove_plant))
        .layer(CorsLayer::permissive())
        .with_state(api_state)
}

// Run the API server with automatic simulation stepping
pub async fn run_server(api_state: ApiState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(api_state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log::info!("mycosym headless API listening on http://localhost:{}", port);
    log::info!("frame loop running at 60 FPS (honors pause and speed)");

    let simulation_task = tokio::spawn(simulation_loop(api_state.clone()));
    let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

    tokio::select! {
        result = server_handle => {
            result??;
        }
        _ = simulation_task => {
            log::error!("simulation loop ended unexpectedly");
        }
    }

    Ok(())
}

// Background task that continuously steps the simulation
async fn simulation_loop(api_state: ApiState) {
    let frame_duration = std::time::Duration::from_secs_f32(FRAME_DT);

    loop {
        let start = std::time::Instant::now();

        {
            let mut sim = match api_state.simulation.lock() {
                Ok(sim) => sim,
                Err(_) => break,
            };
            let mut rng = match api_state.rng.lock() {
                Ok(rng) => rng,
                Err(_) => break,
            };
            sim.tick(FRAME_DT, &mut *rng);
        }

        let elapsed = start.elapsed();
        if elapsed < frame_duration {
            tokio::time::sleep(frame_duration - elapsed).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_seed(seed: u64) -> ApiState {
        let mut rng = StdRng::seed_from_u64(seed);
        let sim = Simulation::new(&mut rng);
        ApiState::new(sim, rng)
    }

    #[test]
    fn state_response_mirrors_session() {
        let api_state = state_with_seed(1);
        let sim = api_state.simulation.lock().unwrap();
        let response = simulation_to_response(&sim);
        assert_eq!(response.spores.len(), sim.spores.len());
        assert_eq!(response.roots.len(), 3);
        assert!(!response.playing);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"parameters\""));
        assert!(json.contains("sporeCount"));
        assert!(json.contains("timeCreated"));
    }

    #[tokio::test]
    async fn step_advances_while_paused() {
        let api_state = state_with_seed(2);
        let Json(response) = step_simulation(
            Query(StepQuery { steps: Some(5) }),
            State(api_state.clone()),
        )
        .await
        .unwrap();
        assert!((response.time - 5.0 * FRAME_DT).abs() < 1e-6);
        assert!(!response.playing);
    }

    #[tokio::test]
    async fn pause_toggles_playback() {
        let api_state = state_with_seed(3);
        let body = pause_simulation(State(api_state.clone())).await.unwrap();
        assert_eq!(body.0["playing"], serde_json::json!(true));
        let body = pause_simulation(State(api_state)).await.unwrap();
        assert_eq!(body.0["playing"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn plant_round_trip_adds_and_removes() {
        let api_state = state_with_seed(4);
        let body = add_plant(
            State(api_state.clone()),
            Some(Json(PlantRequest { x: 1.0, z: 2.0 })),
        )
        .await
        .unwrap();
        let id = body.0["id"].as_u64().unwrap();
        assert_eq!(api_state.simulation.lock().unwrap().roots.len(), 4);

        remove_plant(State(api_state.clone()), Path(id)).await.unwrap();
        assert_eq!(api_state.simulation.lock().unwrap().roots.len(), 3);

        let missing = remove_plant(State(api_state), Path(id)).await;
        assert_eq!(missing.err(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn params_endpoint_merges_update() {
        let api_state = state_with_seed(5);
        let update = ParameterUpdate {
            spore_density: Some(2.0),
            ..Default::default()
        };
        let Json(params) = update_params(State(api_state.clone()), Json(update))
            .await
            .unwrap();
        assert_eq!(params.spore_density, 2.0);
        assert_eq!(api_state.simulation.lock().unwrap().spores.len(), 22);
    }
}
