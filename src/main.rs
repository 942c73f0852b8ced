use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use mycosym::api::{run_server, ApiState};
use mycosym::config::SimulationParameters;
use mycosym::simulation::Simulation;

#[derive(Parser, Debug)]
#[command(name = "mycosym")]
#[command(about = "Arbuscular mycorrhizal fungi simulation, served over HTTP")]
struct Args {
    /// Port for the API server
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Path to a YAML or JSON parameter file
    #[arg(short, long)]
    config: Option<String>,

    /// Seed for deterministic runs; omitted means entropy-seeded
    #[arg(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let parameters = match &args.config {
        Some(path) => SimulationParameters::from_file(path)?,
        None => SimulationParameters::from_default_paths(),
    };

    let mut rng = match args.seed {
        Some(seed) => {
            log::info!("seeding run with {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let simulation = Simulation::with_parameters(parameters, &mut rng);
    let api_state = ApiState::new(simulation, rng);

    run_server(api_state, args.port).await
}
