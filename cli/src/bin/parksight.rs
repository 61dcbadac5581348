use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cli::TileEntry;
use color_eyre::eyre::Result;
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};
use vectorize::{DetectedLot, TilePipeline, VectorizeConfig, merge_tiles};

#[derive(Parser)]
#[command(author, version, about = "Parking-lot mask vectorization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vectorize a directory of prediction masks into one GeoJSON file
    Vectorize {
        /// Directory containing <tile>_mask.png files with <tile>.json
        /// georeference sidecars and optional <tile>_prob.png rasters
        #[arg(short, long)]
        masks_dir: PathBuf,
        /// Output GeoJSON path
        #[arg(short, long)]
        output: PathBuf,
        /// TOML or JSON configuration file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file format
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Vectorize {
            masks_dir,
            output,
            config,
        } => vectorize_masks(masks_dir, output, config.as_deref())?,
        Commands::Schema => print_schema()?,
    }

    Ok(())
}

fn vectorize_masks(masks_dir: &Path, output: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => VectorizeConfig::from_file(path)?,
        None => VectorizeConfig::default(),
    };
    // Validates the configuration; invalid parameters abort before any
    // tile is read.
    let pipeline = TilePipeline::from_config(&config)?;

    let tiles = cli::discover_tiles(masks_dir)?;
    info!(tiles = tiles.len(), dir = %masks_dir.display(), "found prediction masks");

    // Tiles are independent; fan out across the CPU pool and join before
    // the global merge.
    let per_tile: Vec<Vec<DetectedLot>> = tiles
        .par_iter()
        .filter_map(|entry| match process_tile(&pipeline, entry) {
            Ok(lots) => Some(lots),
            Err(error) => {
                warn!(tile = %entry.name, %error, "skipping tile");
                None
            }
        })
        .collect();

    let collection = merge_tiles(per_tile);

    let (small, medium, large) = collection.size_distribution();
    info!(
        lots = collection.len(),
        total_spots = collection.total_spots(),
        total_area_m2 = collection.total_area_m2(),
        "merged collection"
    );
    info!(small, medium, large, "size distribution");

    collection.save_geojson(output)?;
    info!(output = %output.display(), "saved GeoJSON");
    Ok(())
}

fn process_tile(pipeline: &TilePipeline, entry: &TileEntry) -> Result<Vec<DetectedLot>> {
    let tile = entry.load()?;
    Ok(pipeline.process(&tile)?)
}

fn print_schema() -> Result<()> {
    let schema = schemars::schema_for!(VectorizeConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
