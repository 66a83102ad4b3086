//! `maprender grid` - render one layer into a feature grid and print it as JSON.

use std::path::PathBuf;

use clap::Args;
use maprender::config::ConfigFile;
use maprender::executor::{GridRequest, RenderJob};
use maprender::map::{LayerSelector, SharedMap};
use tracing::info;

use super::common::{self, parse_extent, Extent};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct GridArgs {
    /// XML stylesheet describing the map
    pub stylesheet: PathBuf,

    /// Layer name, or zero-based index
    #[arg(short, long)]
    pub layer: String,

    /// Feature field used as the key (default from config, `__id__` = feature id)
    #[arg(long)]
    pub key: Option<String>,

    /// Map pixels per grid cell (default from config)
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Fields to include in the data section
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Emit the UTFGrid form (rows of characters) instead of numeric codes
    #[arg(long)]
    pub utf: bool,

    /// Extent as minx,miny,maxx,maxy in map units (default: all data)
    #[arg(long, value_parser = parse_extent, allow_hyphen_values = true)]
    pub bbox: Option<Extent>,

    /// Map width in pixels
    #[arg(long, default_value_t = 256)]
    pub width: u32,

    /// Map height in pixels
    #[arg(long, default_value_t = 256)]
    pub height: u32,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: GridArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut map = common::load_map(&args.stylesheet, args.width, args.height, config)?;
    match &args.bbox {
        Some(extent) => map.zoom_to_box(maprender::geometry::BBox::from_slice(&extent.0)?),
        None => map.zoom_all()?,
    }

    let mut options = config.grid.to_options().with_fields(args.fields.iter().cloned());
    if let Some(key) = &args.key {
        options = options.with_key(key.clone());
    }
    if let Some(resolution) = args.resolution {
        options = options.with_resolution(resolution);
    }
    let layer: LayerSelector = args.layer.parse()?;

    let dispatcher = common::dispatcher(config);
    let map = SharedMap::new(map);
    let handle = dispatcher.submit(&map, RenderJob::Grid(GridRequest::new(layer, options)?))?;
    let job_id = handle.id().clone();
    let encoding = handle.wait().await?.into_grid()?;
    info!(
        job_id = %job_id,
        keys = encoding.keys.len(),
        "Grid rendered"
    );

    let json = if args.utf {
        serde_json::to_string(&encoding.into_utf())?
    } else {
        serde_json::to_string(&encoding)?
    };

    match &args.output {
        Some(path) => common::write_output(path, json.as_bytes()),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
