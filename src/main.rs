mod app;
mod hud;
mod input;
mod platform;
mod render;

use std::path::PathBuf;

use catmode::{AssetSource, Overlay, SimConfig};
use clap::Parser;

/// Click the cat. Watch them multiply.
#[derive(Parser, Debug)]
#[command(name = "catmode", version, about)]
struct Args {
    /// Directory holding cat-dance.json, explosion.json and confetti.json.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// JSON file overriding simulation tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed RNG seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Start with cat mode off (F9 turns it on).
    #[arg(long)]
    inactive: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("catmode starting up");

    let config = match &args.config {
        Some(path) => SimConfig::load(path).unwrap_or_else(|e| {
            log::warn!("{e:#}; using default tunables");
            SimConfig::default()
        }),
        None => SimConfig::default(),
    };

    let overlay = Overlay::new(config, AssetSource::Dir(args.assets), args.seed);
    if let Err(e) = app::run(overlay, !args.inactive) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
