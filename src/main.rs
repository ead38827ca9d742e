//! Lify - Entry Point
//!
//! Loads the configuration, builds the board, and hands control to the
//! scene controller: a loading phase that populates the board on a
//! background task, then a running phase that shows the viewport.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tokio::runtime::Runtime;

use lify::board::{AssetSource, Board, BuiltinAssetSource, FsAssetSource};
use lify::core::config::AppConfig;
use lify::core::error::Result;
use lify::scene::{FramePump, Phase, SceneController, SceneSettings, QUIT_KEY};
use lify::ui::{HeadlessPresentation, TerminalPresentation};

/// Life simulation visualizer
#[derive(Parser, Debug)]
#[command(name = "lify")]
#[command(about = "Populate a world with herbs and browse it")]
struct Args {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for a reproducible population
    #[arg(long)]
    seed: Option<u64>,

    /// Number of herbs to generate
    #[arg(long)]
    count: Option<usize>,

    /// Run without a terminal UI: load, advance, report, exit
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so they do not tear the terminal UI
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lify=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.population.seed = Some(seed);
    }
    if let Some(count) = args.count {
        config.population.count = count;
    }
    config.validate()?;

    tracing::info!("Lify starting...");

    let source: Box<dyn AssetSource> = if config.assets.root.is_dir() {
        tracing::info!("Reading assets from {}", config.assets.root.display());
        Box::new(FsAssetSource::new(config.assets.root.clone()))
    } else {
        tracing::warn!(
            "Asset directory {} not found - using builtin assets",
            config.assets.root.display()
        );
        Box::new(BuiltinAssetSource)
    };
    let board = Board::from_config(&config.board, config.assets.entries.clone(), source);

    let seed = config.population.seed.unwrap_or_else(rand::random);
    tracing::info!("Population seed {}", seed);

    // Hosts the single background population task
    let rt = Runtime::new()?;
    let settings = SceneSettings::from_config(&config, seed);
    let mut controller = SceneController::new(board, settings, rt.handle().clone());

    if args.headless {
        run_headless(&mut controller, &config);
    } else {
        let mut presentation = TerminalPresentation::new(&config.ui)?;
        FramePump::from_config(&config.ui).run(&mut controller, &mut presentation);
    }

    // Quitting does not drain in-flight population work
    rt.shutdown_background();

    if let Some(failure) = controller.failure() {
        eprintln!("lify: {}", failure);
        std::process::exit(1);
    }
    Ok(())
}

/// Drive the scene without a screen: wait for loading, advance, report
fn run_headless(controller: &mut SceneController, config: &AppConfig) {
    let mut presentation = HeadlessPresentation::new(config.ui.width, config.ui.height);
    let started = Instant::now();

    FramePump::from_config(&config.ui).run_unattended(controller, &mut presentation);

    if controller.phase() == Phase::Running {
        let report = controller.report().unwrap_or_default();
        println!(
            "loaded in {:.2?}: {} herbs added, {} skipped, {} visible in viewport",
            started.elapsed(),
            report.added,
            report.skipped,
            controller.visible_count()
        );
    }
    controller.handle_key(QUIT_KEY, &mut presentation);
}
