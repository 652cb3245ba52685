use anyhow::{bail, Context, Result};
use clap::Parser;
use sightline::{
    DemElevationSource, ElevationSource, FieldOfView, FlatElevationSource, JobGranularity,
    PixelValues, ViewshedConfig, ViewshedProcessor,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Compute a terrain visibility (viewshed) raster around an observer
#[derive(Parser)]
#[command(name = "sightline")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Observer latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Observer longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Elevation raster (any GDAL-supported format); optional with --simulation
    #[arg(long)]
    dem: Option<PathBuf>,

    /// Visibility radius in meters (sets the window size and truncates
    /// the sweep at the radius circle)
    #[arg(long, conflicts_with = "size")]
    radius: Option<f64>,

    /// Output window half-size in pixels
    #[arg(long)]
    size: Option<usize>,

    /// Ground sample distance in meters per pixel (default: derived from the DEM)
    #[arg(long)]
    gsd: Option<f64>,

    /// Field of view as a clockwise azimuth arc, degrees from north
    #[arg(long, num_args = 2, value_names = ["START", "STOP"], allow_negative_numbers = true)]
    fov: Option<Vec<f64>>,

    /// Observer eye height above the terrain in meters
    #[arg(long = "hgt-of-eye", default_value_t = 1.5)]
    hgt_of_eye: f64,

    /// Reticle cross half-size in pixels (0 hides the observer marker)
    #[arg(long, default_value_t = 2)]
    reticle: usize,

    /// Worker thread count (0 = autodetect)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Schedule one job per sector instead of one per radial
    #[arg(long)]
    tbs: bool,

    /// Visible, hidden and observer classification codes
    #[arg(long, num_args = 3, value_names = ["VISIBLE", "HIDDEN", "OBSERVER"])]
    values: Option<Vec<u8>>,

    /// Substitute flat terrain for elevation coverage gaps
    #[arg(long)]
    simulation: bool,

    /// Write an azimuth/elevation-angle horizon profile to this file
    #[arg(long)]
    horizon: Option<PathBuf>,

    /// Output raster path (extension selects the format)
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let elevation: Arc<dyn ElevationSource> = match &args.dem {
        Some(path) => {
            let dem = DemElevationSource::from_file(path)
                .with_context(|| format!("Failed to load DEM {}", path.display()))?;
            if !dem.bounds().contains(args.lat, args.lon) {
                log::warn!(
                    "Observer ({}, {}) lies outside the DEM coverage",
                    args.lat,
                    args.lon
                );
            }
            Arc::new(dem)
        }
        None => {
            if !args.simulation {
                bail!("--dem is required unless --simulation is set");
            }
            Arc::new(FlatElevationSource::new(0.0))
        }
    };

    let gsd = match args.gsd {
        Some(gsd) => gsd,
        None => elevation
            .ground_sample_distance()
            .context("No DEM to derive a ground sample distance from; pass --gsd")?,
    };

    let mut config = ViewshedConfig::new(args.lat, args.lon, gsd);
    config.half_window = args.size;
    config.radius = args.radius;
    config.eye_height = args.hgt_of_eye;
    config.reticle_size = args.reticle;
    config.threads = args.threads;
    config.simulation = args.simulation;
    if args.tbs {
        config.granularity = JobGranularity::Sector;
    }
    if let Some(fov) = &args.fov {
        config.fov = FieldOfView::new(fov[0], fov[1]);
    }
    if let Some(values) = &args.values {
        config.values = PixelValues {
            visible: values[0],
            hidden: values[1],
            observer: values[2],
        };
    }

    let mut processor =
        ViewshedProcessor::new(config, elevation).context("Viewshed initialization failed")?;
    processor.execute()?;

    processor
        .write_raster(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(horizon) = &args.horizon {
        processor
            .write_horizon(horizon)
            .with_context(|| format!("Failed to write {}", horizon.display()))?;
    }

    Ok(())
}
