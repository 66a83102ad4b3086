//! `maprender render` - render a stylesheet to a file.
//!
//! With `--bbox` the render goes through the async dispatcher; without it the
//! map zooms to its data and renders synchronously.

use std::path::PathBuf;

use clap::Args;
use maprender::config::ConfigFile;
use maprender::executor::{RasterRequest, RenderJob};
use maprender::map::{Map, SharedMap};
use maprender::render::render_to_file;
use tracing::info;

use super::common::{self, parse_extent, Extent};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// XML stylesheet describing the map
    pub stylesheet: PathBuf,

    /// Output file (format inferred from the extension)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Extent as minx,miny,maxx,maxy in map units (default: all data)
    #[arg(long, value_parser = parse_extent, allow_hyphen_values = true)]
    pub bbox: Option<Extent>,

    /// Output format: png, jpeg, jpegNN, tiff, bmp, svg
    #[arg(short, long)]
    pub format: Option<String>,

    /// Image width in pixels
    #[arg(long, default_value_t = 256)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 256)]
    pub height: u32,
}

pub async fn run(args: RenderArgs, config: &ConfigFile) -> Result<(), CliError> {
    let map = common::load_map(&args.stylesheet, args.width, args.height, config)?;
    let format = common::resolve_format(args.format.as_deref(), &args.output, config);

    match &args.bbox {
        Some(extent) => render_extent(map, extent, &format, &args, config).await,
        None => render_all(map, &format, &args),
    }
}

async fn render_extent(
    map: Map,
    extent: &Extent,
    format: &str,
    args: &RenderArgs,
    config: &ConfigFile,
) -> Result<(), CliError> {
    let dispatcher = common::dispatcher(config);
    let map = SharedMap::new(map);
    let job = RenderJob::Raster(RasterRequest::new(&extent.0, format)?);

    let handle = dispatcher.submit(&map, job)?;
    info!(job_id = %handle.id(), format, "Render submitted");
    let bytes = handle.wait().await?.into_image()?;

    common::write_output(&args.output, &bytes)
}

fn render_all(mut map: Map, format: &str, args: &RenderArgs) -> Result<(), CliError> {
    map.zoom_all()?;
    render_to_file(&map, &args.output, Some(format))?;
    info!(path = %args.output.display(), format, "Map rendered");
    Ok(())
}
