use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use freight_sim::simulation::{DelayModel, SimConfig, SimWorld, SpeedPolicy, Topology};

/// Condition classes used by the demo network
const DEMO_CONDITIONS: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DelayModelArg {
    /// Independent draws, later arrivals never leave first
    Sampled,
    /// One shared countdown per queue
    IncrementalQueue,
}

impl From<DelayModelArg> for DelayModel {
    fn from(arg: DelayModelArg) -> Self {
        match arg {
            DelayModelArg::Sampled => DelayModel::Sampled,
            DelayModelArg::IncrementalQueue => DelayModel::IncrementalQueue,
        }
    }
}

#[derive(Parser)]
#[command(name = "freight_sim")]
#[command(about = "Freight traffic simulation with failing bridges")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "720")]
    ticks: u64,

    /// Seed for the run's random generator
    #[arg(long, default_value = "1234567")]
    seed: u64,

    /// How broken bridges hand out delays
    #[arg(long, value_enum, default_value = "sampled")]
    delay_model: DelayModelArg,

    /// Break probability applied to every bridge condition class
    #[arg(long, default_value = "0.1")]
    break_probability: f64,

    /// Ticks between two vehicles generated by a source
    #[arg(long, default_value = "5")]
    generation_interval: u64,

    /// Let vehicles slow down on crowded segments
    #[arg(long)]
    congestion_speed: bool,
}

impl Cli {
    fn config(&self) -> SimConfig {
        let mut config = SimConfig {
            generation_interval: self.generation_interval,
            delay_model: self.delay_model.into(),
            ..SimConfig::default()
        };
        if self.congestion_speed {
            config.speed_policy = SpeedPolicy::CongestionAware;
        }
        for condition in DEMO_CONDITIONS {
            config
                .break_probabilities
                .insert(condition.to_string(), self.break_probability);
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    info!("Running freight simulation in headless mode...");
    info!("Ticks: {}, seed: {}", cli.ticks, cli.seed);

    let config = cli.config();
    let ticks_per_hour = (60.0 / config.tick_minutes).ceil().max(1.0) as u64;

    let mut world = SimWorld::new(&Topology::demo(), config, cli.seed)
        .context("Invalid simulation setup")?;

    world.print_summary();

    let mut tick = 0;
    while tick < cli.ticks {
        let ticks_to_run = ticks_per_hour.min(cli.ticks - tick);
        world.run(ticks_to_run);
        tick += ticks_to_run;
        world.log_summary();
    }

    log_final_summary(&world);
    world.print_summary();
    Ok(())
}

fn log_final_summary(world: &SimWorld) {
    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks run: {}", stats.ticks);
    info!("Total vehicles generated: {}", stats.vehicles_generated);
    info!("Total vehicles completed: {}", stats.vehicles_completed);
    info!("Active vehicles: {}", stats.active_vehicles);
    info!("Skipped spawns: {}", stats.skipped_spawns);
    info!("Dropped vehicles: {}", stats.dropped_vehicles);
    info!(
        "Broken bridges: {}/{}",
        stats.broken_bridges, stats.total_bridges
    );
    if let Some(mean) = stats.mean_travel_time {
        info!("Mean travel time: {:.1} ticks", mean);
    }
    if let Some(mean) = stats.mean_waiting_time {
        info!("Mean waiting time per bridge: {:.1} ticks", mean);
    }
    info!("Completion rate: {:.1}%", stats.completion_rate());
}
