mod simulation;

#[cfg(feature = "ui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use simulation::{SimConfig, SimWorld};

#[derive(Parser)]
#[command(name = "highway_sim")]
#[command(about = "Endless highway driving simulation with optional UI")]
struct Cli {
    /// Run with the Bevy game engine UI
    #[arg(long)]
    ui: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    delta: f32,

    /// Seed for traffic placement (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Player top speed in simulation units per second
    #[arg(long)]
    max_speed: Option<f32>,

    /// Chance that a recycled segment receives an NPC
    #[arg(long)]
    npc_spawn_chance: Option<f32>,

    /// Number of road segments in the recycled pool
    #[arg(long)]
    segments: Option<usize>,
}

impl Cli {
    fn config(&self) -> SimConfig {
        let mut config = SimConfig::default();
        if let Some(max_speed) = self.max_speed {
            config.max_speed = max_speed;
            config.top_speed_threshold = config.top_speed_threshold.min(max_speed);
            config.initial_speed = config.initial_speed.min(max_speed);
        }
        if let Some(chance) = self.npc_spawn_chance {
            config.npc_spawn_chance = chance;
        }
        if let Some(segments) = self.segments {
            config.segment_count = segments;
        }
        config
    }

    fn build_world(&self) -> Result<SimWorld> {
        if !(self.delta.is_finite() && self.delta > 0.0) {
            bail!("--delta must be a positive number of seconds, got {}", self.delta);
        }
        let config = self.config();
        match self.seed {
            Some(seed) => SimWorld::new_with_seed(config, seed),
            None => SimWorld::new(config),
        }
        .context("invalid simulation configuration")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.ui {
        #[cfg(feature = "ui")]
        {
            let world = cli.build_world()?;
            run_with_ui(world);
        }
        #[cfg(not(feature = "ui"))]
        {
            bail!("UI feature is not enabled. Rebuild with --features ui");
        }
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();
        let world = cli.build_world()?;
        run_headless(world, cli.ticks, cli.delta);
    }
    Ok(())
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(mut world: SimWorld, ticks: u32, delta: f32) {
    println!("Running highway simulation in headless mode...");
    println!("Ticks: {}, Delta: {:.4}s", ticks, delta);

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = (1.0 / delta).ceil() as u32;
    println!("Running {} ticks per second (simulated time)", ticks_per_second);
    println!();

    println!("Initial state:");
    world.print_summary();
    println!();

    // No loader here: models come up as their stock variants after the first frame
    let sender = world.asset_sender();
    let mut tick = 0;
    while tick < ticks && !world.is_game_over() {
        let ticks_to_run = ticks_per_second.min(ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            let input = simulation::autopilot(&world);
            world.tick(delta, input);
            if tick == 1 {
                sender.ready_all();
            }
            if world.is_game_over() {
                break;
            }
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            tick as f32 * delta
        );
        world.print_summary();
        println!();
    }

    if world.is_game_over() {
        info!("Run ended by a crash after {} ticks", tick);
    }
    println!("=== Final State ===");
    world.print_summary();
}

#[cfg(feature = "ui")]
fn run_with_ui(world: SimWorld) {
    use bevy::log::LogPlugin;
    use bevy::prelude::*;

    println!("Starting Highway Sim UI...");
    println!();
    println!("Controls:");
    println!("  W / Up      - Accelerate");
    println!("  S / Down    - Brake");
    println!("  A / Left    - Steer left");
    println!("  D / Right   - Steer right");
    println!("  Enter/Space - Restart after a crash");
    println!("  ESC         - Exit");
    println!();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(LogPlugin {
                    filter: "warn,highway_sim=debug".to_string(),
                    level: bevy::log::Level::DEBUG,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Highway Sim".into(),
                        resolution: (1280, 720).into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_resource(ui::SimWorldResource(world))
        .add_plugins(ui::HighwaySimUIPlugin)
        .run();
}
