//! # Symbol World Demo
//!
//! Runs one headless episode with a seeded random policy and prints the
//! cropped views after every step.

use clap::{Parser, ValueEnum};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use symbolworld::games::{scrolly_maze, symbol_world};
use symbolworld::{
    Action, Engine, GenerationConfig, LevelGenerator, Observation, SymbolWorldResult, Viewports,
};

/// Which game to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GameKind {
    /// A generated level with keys, goals and patrollers
    SymbolWorld,
    /// One of the fixed coin mazes
    ScrollyMaze,
}

/// Command line arguments for the demo.
#[derive(Parser, Debug)]
#[command(name = "symbolworld")]
#[command(about = "Plays a tile-world episode with a random policy")]
#[command(version)]
struct Args {
    /// Random seed for level generation and the policy
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Game to play
    #[arg(short, long, value_enum, default_value_t = GameKind::SymbolWorld)]
    game: GameKind,

    /// Scrolly maze level
    #[arg(long, default_value_t = 0)]
    level: usize,

    /// JSON generation config; overrides the defaults (the seed flag still applies)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use single-cell shapes instead of the large ones
    #[arg(long)]
    point_shapes: bool,

    /// Maximum number of steps
    #[arg(long, default_value_t = 50)]
    steps: usize,

    /// Side of the player view in a symbol world game
    #[arg(long, default_value_t = 15)]
    view: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> SymbolWorldResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting Symbol World v{}", symbolworld::VERSION);

    let (mut engine, mut viewports) = build(&args)?;
    let start = engine.start()?;
    viewports.set_engine(&engine)?;
    print_views(&mut viewports, &start.observation)?;

    let mut policy = StdRng::seed_from_u64(args.seed);
    for _ in 0..args.steps {
        if engine.game_over() {
            break;
        }
        let action = Action::from_code(policy.gen_range(0..=4));
        let timestep = engine.step(action)?;
        println!(
            "frame {} action {:?} reward {:?}",
            engine.frame(),
            action,
            timestep.reward
        );
        for line in engine.drain_log() {
            println!("  {}", line);
        }
        print_views(&mut viewports, &timestep.observation)?;
    }

    if !engine.game_over() {
        warn!("step budget of {} ran out before the episode ended", args.steps);
    }
    info!(
        "Finished after {} frames with return {}",
        engine.frame(),
        engine.plot().episode_return()
    );
    Ok(())
}

/// Builds the engine and its croppers for the selected game.
fn build(args: &Args) -> SymbolWorldResult<(Engine, Viewports)> {
    match args.game {
        GameKind::SymbolWorld => {
            let mut config = match &args.config {
                Some(path) => GenerationConfig::from_json_file(path)?,
                None => GenerationConfig::new(args.seed),
            };
            config.seed = args.seed;
            info!("Generating level with seed {}", config.seed);

            let level = LevelGenerator::new().generate_level(&config)?;
            let shapes = if args.point_shapes {
                symbol_world::Shapes::point()
            } else {
                symbol_world::Shapes::original()
            };
            let engine = symbol_world::make_game(&level, shapes)?;
            let viewports = symbol_world::make_croppers(args.view, args.view)?;
            Ok((engine, viewports))
        }
        GameKind::ScrollyMaze => {
            info!("Loading scrolly maze level {}", args.level);
            let engine = scrolly_maze::make_game(args.level)?;
            let viewports = scrolly_maze::make_croppers(args.level)?;
            Ok((engine, viewports))
        }
    }
}

fn print_views(viewports: &mut Viewports, observation: &Observation) -> SymbolWorldResult<()> {
    for (index, view) in viewports.crop_all(observation)?.iter().enumerate() {
        println!("view {}:", index);
        for line in view.to_lines() {
            println!("|{}|", line);
        }
    }
    Ok(())
}

/// Initializes logging at the requested level.
///
/// With `dev-tools` the tracing subscriber also collects the library's `log`
/// records; otherwise `env_logger` does, and `RUST_LOG` still overrides.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
    }
}
