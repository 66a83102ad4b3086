//! MapRender CLI - Command-line interface
//!
//! Renders XML map stylesheets to images, SVG and feature grids.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use maprender::config::ConfigFile;
use maprender::logging::{default_level, init_logging};
use tracing::info;

use commands::describe::DescribeArgs;
use commands::grid::GridArgs;
use commands::render::RenderArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "maprender")]
#[command(version = maprender::VERSION)]
#[command(about = "Render maps from XML stylesheets", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.maprender/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a stylesheet to an image or SVG file
    Render(RenderArgs),
    /// Render one layer into a feature grid (JSON)
    Grid(GridArgs),
    /// Print layers and datasource descriptions (JSON)
    Describe(DescribeArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let _logging_guard = init_logging(
        &config.logging.directory,
        &config.logging.file,
        default_level(cli.verbose),
    )
    .map_err(|e| CliError::LoggingInit(e.to_string()))?;
    maprender::panic::init();

    info!(version = maprender::VERSION, "maprender starting");

    match cli.command {
        Commands::Render(args) => commands::render::run(args, &config).await,
        Commands::Grid(args) => commands::grid::run(args, &config).await,
        Commands::Describe(args) => commands::describe::run(args, &config),
    }
}
