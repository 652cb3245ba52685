use crate::core::geometry::LocalGrid;
use crate::core::radials::{sector_azimuth, RadialTable};
use crate::core::scheduler::{run_sweep, JobGranularity};
use crate::core::sweep::SweepContext;
use crate::io::raster::allocate_buffer;
use crate::io::{horizon, ElevationSource, HorizonEntry, RasterWriter};
use crate::types::{FieldOfView, Observer, PixelValues, SightError, SightResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Run configuration for one viewshed computation
///
/// Exactly one of `half_window` and `radius` must be set; when only the
/// radius is given the half-window is derived from it and the ground
/// sample distance, and the sweep truncates radials at the radius
/// circle. Setting both is allowed (a square window with an inscribed
/// or smaller truncation circle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewshedConfig {
    /// Observer latitude in decimal degrees
    pub observer_lat: f64,
    /// Observer longitude in decimal degrees
    pub observer_lon: f64,
    /// Output window half-size in pixels
    pub half_window: Option<usize>,
    /// Visibility radius in meters
    pub radius: Option<f64>,
    /// Ground sample distance, meters per output pixel
    pub gsd: f64,
    pub fov: FieldOfView,
    /// Observer eye height above the terrain in meters
    pub eye_height: f64,
    /// Reticle cross half-size in pixels, 0 hides the marker
    pub reticle_size: usize,
    /// Worker thread count, 0 = autodetect
    pub threads: usize,
    pub granularity: JobGranularity,
    /// Substitute the observer's ground height for coverage gaps
    pub simulation: bool,
    pub values: PixelValues,
}

impl ViewshedConfig {
    pub fn new(observer_lat: f64, observer_lon: f64, gsd: f64) -> Self {
        Self {
            observer_lat,
            observer_lon,
            half_window: None,
            radius: None,
            gsd,
            fov: FieldOfView::default(),
            eye_height: 1.5,
            reticle_size: 2,
            threads: 0,
            granularity: JobGranularity::Radial,
            simulation: false,
            values: PixelValues::default(),
        }
    }

    /// Reject configurations that cannot produce a run
    fn validate(&self) -> SightResult<()> {
        if !(self.gsd > 0.0) {
            return Err(SightError::Config(format!(
                "Ground sample distance must be positive, got {}",
                self.gsd
            )));
        }
        if self.half_window.is_none() && self.radius.is_none() {
            return Err(SightError::Config(
                "Either a window size or a visibility radius is required".to_string(),
            ));
        }
        if let Some(radius) = self.radius {
            if !(radius > 0.0) {
                return Err(SightError::Config(format!(
                    "Visibility radius must be positive, got {}",
                    radius
                )));
            }
        }
        if self.half_window == Some(0) {
            return Err(SightError::Config(
                "Window half-size must be at least one pixel".to_string(),
            ));
        }
        Ok(())
    }

    /// Half-window in pixels, derived from the radius when not explicit
    fn resolved_half_window(&self) -> usize {
        match (self.half_window, self.radius) {
            (Some(size), _) => size,
            (None, Some(radius)) => (radius / self.gsd).ceil().max(1.0) as usize,
            (None, None) => unreachable!("validated configuration"),
        }
    }

    /// Truncation radius in pixels, if one is configured
    fn radius_px(&self) -> Option<f64> {
        self.radius.map(|r| r / self.gsd)
    }
}

/// Terrain visibility processor
///
/// Classifies every cell of a square raster centered on the observer as
/// visible or hidden using a radial sweep: O(R) work per radial, one
/// elevation query and one angle comparison per output cell.
pub struct ViewshedProcessor {
    config: ViewshedConfig,
    elevation: Arc<dyn ElevationSource>,
    observer: Observer,
    /// Terrain height at the observer, before the eye offset
    observer_ground: f64,
    grid: LocalGrid,
    table: RadialTable,
    buffer: Mutex<Array2<u8>>,
    abort: AtomicBool,
}

impl ViewshedProcessor {
    /// Initialize a run: resolve the observer, build the radial table
    /// and allocate the output buffer
    ///
    /// Fails before any sweep work on configuration errors, an
    /// unresolvable observer position or buffer allocation failure.
    pub fn new(config: ViewshedConfig, elevation: Arc<dyn ElevationSource>) -> SightResult<Self> {
        config.validate()?;

        let observer_ground = match elevation.elevation_at(config.observer_lat, config.observer_lon)
        {
            Some(h) if h.is_finite() => h,
            _ if config.simulation => {
                log::warn!("No elevation at the observer, simulating from sea level");
                0.0
            }
            _ => {
                return Err(SightError::Config(format!(
                    "No elevation coverage at the observer position ({}, {})",
                    config.observer_lat, config.observer_lon
                )))
            }
        };

        let observer = Observer {
            latitude: config.observer_lat,
            longitude: config.observer_lon,
            height: observer_ground + config.eye_height,
        };

        let half_window = config.resolved_half_window();
        let grid = LocalGrid::new(&observer, config.gsd, half_window)?;
        let table = RadialTable::build(half_window, &config.fov);
        let buffer = Mutex::new(allocate_buffer(half_window, config.values.visible)?);

        log::info!(
            "Viewshed run: observer ({:.6}, {:.6}) at {:.1} m, half-window {} px, GSD {:.1} m",
            observer.latitude,
            observer.longitude,
            observer.height,
            half_window,
            config.gsd
        );

        Ok(Self {
            config,
            elevation,
            observer,
            observer_ground,
            grid,
            table,
            buffer,
            abort: AtomicBool::new(false),
        })
    }

    /// Run the sweep jobs, then compose the reticle and boundary
    pub fn execute(&mut self) -> SightResult<()> {
        let ctx = SweepContext {
            grid: &self.grid,
            elevation: self.elevation.as_ref(),
            buffer: &self.buffer,
            observer_height: self.observer.height,
            observer_ground: self.observer_ground,
            radius_px: self.config.radius_px(),
            simulation: self.config.simulation,
            values: self.config.values,
        };

        run_sweep(
            &ctx,
            &mut self.table,
            self.config.granularity,
            self.config.threads,
            &self.abort,
        )?;

        if self.abort.load(Ordering::Relaxed) {
            log::warn!("Viewshed sweep aborted, output is partial");
        }

        self.composite();
        log::info!("Viewshed sweep complete");
        Ok(())
    }

    /// Overlay the observer reticle and, without a truncation circle,
    /// the square AOI outline
    fn composite(&mut self) {
        let values = self.config.values;
        let half = self.grid.half_window();
        let side = self.grid.side();
        let mut buffer = self.buffer.lock().expect("output buffer lock poisoned");

        if self.config.reticle_size > 0 {
            let arm = self.config.reticle_size.min(half) as i32;
            for k in -arm..=arm {
                let row = (half as i32 + k) as usize;
                let col = (half as i32 + k) as usize;
                buffer[[half, col]] = values.observer;
                buffer[[row, half]] = values.observer;
            }
        }

        // The radius case already painted its boundary during the sweep
        if self.config.radius_px().is_none() {
            for i in 0..side {
                buffer[[0, i]] = values.observer;
                buffer[[side - 1, i]] = values.observer;
                buffer[[i, 0]] = values.observer;
                buffer[[i, side - 1]] = values.observer;
            }
        }
    }

    /// Request cancellation; polled between work units
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn grid(&self) -> &LocalGrid {
        &self.grid
    }

    /// Snapshot of the classification raster
    pub fn classification(&self) -> Array2<u8> {
        self.buffer.lock().expect("output buffer lock poisoned").clone()
    }

    /// Horizon profile in ascending azimuth order
    ///
    /// Radials that never resolved any terrain (best angle still at its
    /// negative-infinity start) are omitted.
    pub fn horizon_profile(&self) -> Vec<HorizonEntry> {
        let mut entries = Vec::new();
        for (sector, radials) in self.table.sectors.iter().enumerate() {
            let Some(radials) = radials else { continue };
            for radial in radials {
                if !radial.best_elevation_angle.is_finite() {
                    continue;
                }
                entries.push(HorizonEntry {
                    azimuth: sector_azimuth(sector, radial.azimuth_slope),
                    angle: radial.best_elevation_angle,
                });
            }
        }
        entries
    }

    /// Write the classified raster with its geo-referencing
    pub fn write_raster<P: AsRef<Path>>(&self, path: P) -> SightResult<()> {
        let buffer = self.buffer.lock().expect("output buffer lock poisoned");
        RasterWriter::write_classification(&buffer, &self.grid.geo_transform(), path)
    }

    /// Write the horizon profile side file
    pub fn write_horizon<P: AsRef<Path>>(&self, path: P) -> SightResult<()> {
        horizon::write_profile(&self.horizon_profile(), path)
    }
}
