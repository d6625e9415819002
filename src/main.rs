// Entry point for the Minesweeper TUI application
// Parses the command line, loads configuration, sets up logging and launches the main UI

use clap::Parser;
use std::error::Error;
use tracing::info;

use xtmines::xtm_config::{load_or_create_config, save_config};
use xtmines::xtm_log;
use xtmines::xtm_ui::run as run_ui;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(group = clap::ArgGroup::new("size_or_mines").args(["size", "mines"]).multiple(true))]
struct Args {
    /// Board size (the board is SIZE x SIZE); overrides the config file for this run
    #[arg(short, long)]
    size: Option<usize>,

    /// Number of mines; overrides the config file for this run
    #[arg(short, long)]
    mines: Option<usize>,

    #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
    seed: Option<u64>,

    /// Store the size and mine overrides in the config file
    #[arg(long, requires = "size_or_mines")]
    save: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let log_file = xtm_log::init();

    // Load or create user configuration, then apply one-off overrides
    let mut cfg = load_or_create_config();
    if let Some(size) = args.size {
        cfg.size = size;
    }
    if let Some(mines) = args.mines {
        cfg.mines = mines;
    }
    cfg.validate()?;
    if args.save {
        save_config(&cfg)?;
        info!("Saved board settings to the config file");
    }

    if let Some(path) = log_file {
        info!("Logging to {}", path.display());
    }
    info!("Starting {}x{} board with {} mines", cfg.size, cfg.size, cfg.mines);

    // Launch the main UI loop
    run_ui(&cfg, args.seed)
}
