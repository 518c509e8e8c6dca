//! Entry point for the thermstack batch pipeline.
//! Parses the CLI, then runs the yearly averaging or rendering stage over the
//! requested years, isolating per-year failures so one bad year cannot stop
//! the batch.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

use thermstack::core::{
    reproject, AverageParams, ColormapRenderer, RasterStack, RenderParams, TemporalAverager,
};
use thermstack::io::{discovery, MetadataStore, RasterFile};
use thermstack::types::{LstResult, YearMetadata};

/// Yearly LST compositing and web overlay rendering
#[derive(Parser, Debug)]
#[command(
    name = "thermstack",
    version,
    about = "Averages monthly LST rasters by year and renders web map overlays"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Average all monthly rasters of each year into one composite GeoTIFF
    Average(AverageArgs),
    /// Render each year's composite as a colored PNG overlay plus metadata
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct AverageArgs {
    /// Directory holding the monthly <PRODUCT>_<YEAR>_<MONTH>_*.tif rasters
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output directory; defaults to the input directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Product prefix of the input filenames
    #[arg(short, long, default_value = "DLST")]
    product: String,

    /// Years to process
    #[arg(short, long, num_args = 1.., default_values_t = vec![2024_u16, 2025])]
    years: Vec<u16>,

    /// Nodata sentinel assumed when a raster declares none
    #[arg(long, default_value_t = -9999.0, allow_negative_numbers = true)]
    fallback_nodata: f64,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Directory holding the <PRODUCT>_<YEAR>_average.tif composites
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Directory for the PNG overlays and metadata record
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Product prefix of the composite filenames
    #[arg(short, long, default_value = "DLST")]
    product: String,

    /// Years to process
    #[arg(short, long, num_args = 1.., default_values_t = vec![2024_u16, 2025])]
    years: Vec<u16>,

    /// Nearest-neighbor upsampling factor for the PNG
    #[arg(long, default_value_t = 20)]
    scale: u32,

    /// Alpha for valid pixels (0-255)
    #[arg(long, default_value_t = 200)]
    alpha: u8,

    /// Nodata sentinel assumed when a composite declares none
    #[arg(long, default_value_t = -9999.0, allow_negative_numbers = true)]
    fallback_nodata: f64,
}

fn main() -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    builder.init();

    match Cli::parse().command {
        Command::Average(args) => run_average(&args),
        Command::Render(args) => run_render(&args),
    }
}

fn run_average(args: &AverageArgs) -> Result<()> {
    let output_dir = args.output_dir.as_deref().unwrap_or(args.input_dir.as_path());
    fs::create_dir_all(output_dir)?;

    let averager = TemporalAverager::with_params(AverageParams {
        fallback_nodata: args.fallback_nodata,
    });

    info!("Averaging {} rasters by year...", args.product);
    for &year in &args.years {
        if let Err(e) = average_year(&averager, &args.input_dir, output_dir, &args.product, year) {
            error!("Averaging failed for year {}: {}", year, e);
        }
    }
    info!("Done!");
    Ok(())
}

fn average_year(
    averager: &TemporalAverager,
    input_dir: &Path,
    output_dir: &Path,
    product: &str,
    year: u16,
) -> LstResult<()> {
    let files = discovery::monthly_rasters(input_dir, product, year)?;
    if files.is_empty() {
        info!("No files found for year {}", year);
        return Ok(());
    }

    info!("Found {} files for {}:", files.len(), year);
    for file in &files {
        info!("  - {}", file.display());
    }

    let rasters = files
        .iter()
        .map(RasterFile::read_band)
        .collect::<LstResult<Vec<_>>>()?;
    let stack = RasterStack::new(rasters)?;
    let composite = averager.average(&stack)?;

    let output_path = output_dir.join(discovery::average_raster_name(product, year));
    RasterFile::write_band(&output_path, &composite.data, &composite.profile)?;
    info!("Created: {}", output_path.display());
    Ok(())
}

fn run_render(args: &RenderArgs) -> Result<()> {
    fs::create_dir_all(&args.output_dir)?;

    let renderer = ColormapRenderer::with_params(RenderParams {
        scale: args.scale,
        alpha: args.alpha,
        ..RenderParams::default()
    });

    let mut metadata = MetadataStore::new();
    for &year in &args.years {
        info!("Processing {}...", year);
        match render_year(&renderer, args, year) {
            Ok(year_metadata) => metadata.insert(year, year_metadata),
            Err(e) => error!("Rendering failed for year {}: {}", year, e),
        }
    }

    if metadata.is_empty() {
        info!("No years rendered; metadata record not written");
        return Ok(());
    }

    let metadata_path = args
        .output_dir
        .join(discovery::metadata_file_name(&args.product));
    metadata.write(&metadata_path)?;
    info!("Done! Files ready for web deployment.");
    Ok(())
}

fn render_year(
    renderer: &ColormapRenderer,
    args: &RenderArgs,
    year: u16,
) -> LstResult<YearMetadata> {
    let input_path = args
        .input_dir
        .join(discovery::average_raster_name(&args.product, year));
    let (grid, profile) = RasterFile::read_band(&input_path)?;

    let reprojected = reproject::reproject_to_geographic(&grid, &profile)?;
    let bounds = reprojected.bounds()?;
    info!(
        "{} WGS84 bounds: [[{}, {}], [{}, {}]]",
        year, bounds.south, bounds.west, bounds.north, bounds.east
    );

    let nodata = profile.nodata.or(Some(args.fallback_nodata));
    let output_path = args
        .output_dir
        .join(discovery::overlay_image_name(&args.product, year));
    let (stats, _) = renderer.render_to_file(&output_path, &reprojected.data, nodata)?;

    Ok(YearMetadata { bounds, stats })
}
