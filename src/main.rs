use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use scenario_spawner::route::{
    export_route, RouteRequest, DEFAULT_GOAL_ANCHOR, DEFAULT_OUTPUT, DEFAULT_START_ANCHOR,
    ROUTE_RESOLUTION,
};
use scenario_spawner::scenario::{
    CancelToken, ConnectionConfig, Orchestrator, ScenarioConfig, WalkerStrategy, DEFAULT_HOST,
    DEFAULT_PORT, DEFAULT_TM_PORT,
};
use scenario_spawner::world::{SimWorld, WorldSettings};

#[derive(Parser)]
#[command(name = "scenario_spawner")]
#[command(about = "Populate a simulated world with obstacles, traffic and pedestrians")]
struct Cli {
    #[command(subcommand)]
    command: Scenario,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Seed for every random choice, for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Start the world in synchronous mode so this process drives stepping
    #[arg(long, global = true)]
    world_sync: bool,

    /// Fixed simulation step in seconds when running synchronously
    #[arg(long, global = true, default_value = "0.05")]
    delta: f32,

    /// Wall-clock milliseconds per world step in free-running mode
    #[arg(long, global = true, default_value = "50")]
    frame_interval_ms: u64,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Simulation service host
    #[arg(long, global = true, default_value = DEFAULT_HOST)]
    host: String,

    /// Simulation service port
    #[arg(long, global = true, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Connection timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    timeout: u64,
}

#[derive(Args)]
struct RunArgs {
    /// Traffic manager port
    #[arg(long, default_value_t = DEFAULT_TM_PORT)]
    tm_port: u16,

    /// Override the number of random vehicles
    #[arg(long)]
    vehicles: Option<usize>,

    /// Override the number of walkers
    #[arg(long)]
    walkers: Option<usize>,

    /// Override how walkers are paired with controllers
    #[arg(long, value_enum)]
    walker_strategy: Option<WalkerStrategy>,

    /// Stop after this many world steps instead of waiting for Ctrl+C
    #[arg(long)]
    ticks: Option<u64>,

    /// Pause after destroying actors, in milliseconds
    #[arg(long, default_value = "500")]
    settle_ms: u64,
}

#[derive(Subcommand)]
enum Scenario {
    /// Fixed obstacles only
    Obstacles(RunArgs),
    /// Fixed obstacles plus random traffic and pedestrians
    Traffic(RunArgs),
    /// Random traffic and pedestrians only, anchor 0 kept clear
    Dense(RunArgs),
    /// Export the global route between two anchors
    Route {
        #[arg(long, default_value_t = DEFAULT_START_ANCHOR)]
        start: usize,

        #[arg(long, default_value_t = DEFAULT_GOAL_ANCHOR)]
        goal: usize,

        /// CSV file the waypoints are written to
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
}

impl RunArgs {
    fn apply(&self, mut config: ScenarioConfig) -> ScenarioConfig {
        config.traffic_manager_port = self.tm_port;
        if let Some(vehicles) = self.vehicles {
            config.random_vehicles = vehicles;
        }
        if let Some(walkers) = self.walkers {
            config.walkers = walkers;
        }
        if let Some(strategy) = self.walker_strategy {
            config.walker_strategy = strategy;
        }
        config.max_ticks = self.ticks;
        config.settle_delay = Duration::from_millis(self.settle_ms);
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let connection = ConnectionConfig {
        host: cli.connection.host.clone(),
        port: cli.connection.port,
        timeout: Duration::from_secs(cli.connection.timeout),
    };

    let mut world = SimWorld::connect(
        &connection.host,
        connection.port,
        connection.timeout,
        cli.seed,
    )
    .context("Could not connect to the simulation service")?;

    if cli.world_sync {
        world = world.with_settings(WorldSettings {
            synchronous_mode: true,
            fixed_delta_seconds: Some(cli.delta),
        });
    } else if cli.frame_interval_ms > 0 {
        world = world.with_frame_interval(Duration::from_millis(cli.frame_interval_ms));
    }

    let (preset, args) = match &cli.command {
        Scenario::Obstacles(args) => (ScenarioConfig::obstacles(), args),
        Scenario::Traffic(args) => (ScenarioConfig::mixed_traffic(), args),
        Scenario::Dense(args) => (ScenarioConfig::dense_traffic(), args),
        Scenario::Route {
            start,
            goal,
            output,
        } => {
            let request = RouteRequest {
                start: *start,
                goal: *goal,
                resolution: ROUTE_RESOLUTION,
                output: output.clone(),
            };
            let roads = world.map().road_segments();
            export_route(&mut world, &roads, &request)?;
            return Ok(());
        }
    };

    let config = ScenarioConfig {
        connection,
        ..args.apply(preset)
    };

    let cancel = CancelToken::new();
    watch_signals(cancel.clone());

    let orchestrator = match cli.seed {
        Some(seed) => Orchestrator::new_with_seed(&mut world, config, cancel, seed),
        None => Orchestrator::new(&mut world, config, cancel),
    };
    let summary = orchestrator.run()?;

    info!(
        "Ran {} ticks, destroyed {} actors{}",
        summary.ticks,
        summary.teardown.destroyed(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}

/// Flip the cancel token on Ctrl+C or a termination signal.
/// Returns once the handlers are installed, so population never races them.
fn watch_signals(cancel: CancelToken) {
    let (ready_tx, ready_rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Signal runtime unavailable: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                match shutdown_signal(ready_tx).await {
                    Ok(name) => {
                        info!("{} received, shutting down...", name);
                        cancel.cancel();
                    }
                    Err(e) => warn!("Signal handlers unavailable: {}", e),
                }
            });
        });

    match spawned {
        Ok(_) => {
            if ready_rx.recv().is_err() {
                warn!("Signal handlers not installed; only --ticks will stop the run");
            }
        }
        Err(e) => warn!("Could not start the signal watcher: {}", e),
    }
}

#[cfg(unix)]
async fn shutdown_signal(ready: mpsc::Sender<()>) -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let _ = ready.send(());

    tokio::select! {
        _ = interrupt.recv() => Ok("Ctrl+C"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal(ready: mpsc::Sender<()>) -> std::io::Result<&'static str> {
    let ctrl_c = tokio::signal::ctrl_c();
    let _ = ready.send(());
    ctrl_c.await?;
    Ok("Ctrl+C")
}
