use crate::core::geometry::LocalGrid;
use crate::core::radials::{sector_offset, Radial};
use crate::io::ElevationSource;
use crate::types::PixelValues;
use ndarray::Array2;
use std::sync::Mutex;

/// Shared, read-only context for the sweep jobs
///
/// The output buffer is the only structure mutated by more than one job;
/// every write takes the mutex for the duration of the single pixel
/// store. Per-radial state travels with the job as `&mut Radial`.
pub struct SweepContext<'a> {
    pub grid: &'a LocalGrid,
    pub elevation: &'a dyn ElevationSource,
    pub buffer: &'a Mutex<Array2<u8>>,
    /// Observer height above the ellipsoid (terrain + eye height)
    pub observer_height: f64,
    /// Terrain height at the observer, the flat-earth fallback level
    pub observer_ground: f64,
    /// Early-truncation radius in pixels, if one is configured
    pub radius_px: Option<f64>,
    /// Substitute the observer's ground height for coverage gaps
    pub simulation: bool,
    pub values: PixelValues,
}

impl SweepContext<'_> {
    fn write(&self, dx: i32, dy: i32, value: u8) {
        if let Some((row, col)) = self.grid.buffer_index(dx, dy) {
            let mut buffer = self.buffer.lock().expect("output buffer lock poisoned");
            buffer[[row, col]] = value;
        }
    }
}

/// Walk one radial outward from the observer
///
/// Unit steps along the sector's major axis; the minor-axis offset is
/// `azimuth_slope * u` rounded to the nearest pixel. One elevation query
/// and one angle comparison per step. Cells whose elevation angle does
/// not strictly exceed the best angle seen closer in are occluded; the
/// visible background value is never written explicitly.
pub fn sweep_radial(ctx: &SweepContext<'_>, sector: usize, radial: &mut Radial) {
    let radius_sq = ctx.radius_px.map(|r| r * r);

    for u in 1..=ctx.grid.half_window() {
        let uf = u as f64;
        let v = radial.azimuth_slope * uf;
        let (dx, dy) = sector_offset(sector, u as i32, v.round() as i32);

        // Radius truncation: mark the boundary pixel and stop the radial
        if let Some(r2) = radius_sq {
            if uf * uf + v * v >= r2 {
                ctx.write(dx, dy, ctx.values.observer);
                break;
            }
        }

        let (lat, lon) = ctx.grid.offset_to_latlon(dx, dy);
        let target_height = match ctx.elevation.elevation_at(lat, lon) {
            Some(h) if h.is_finite() => h,
            // Coverage gap: flat-earth fallback in simulation mode,
            // otherwise skip the cell with no state change
            _ if ctx.simulation => ctx.observer_ground,
            _ => continue,
        };

        // Range is the major-axis step count, not the slant range
        let elevation_angle = (target_height - ctx.observer_height) / uf;

        if elevation_angle > radial.best_elevation_angle {
            radial.best_elevation_angle = elevation_angle;
        } else {
            ctx.write(dx, dy, ctx.values.hidden);
        }
    }
}

/// Run all radials of one sector sequentially
pub fn sweep_sector(ctx: &SweepContext<'_>, sector: usize, radials: &mut [Radial]) {
    log::debug!("Sweeping sector {} ({} radials)", sector, radials.len());
    for radial in radials.iter_mut() {
        sweep_radial(ctx, sector, radial);
    }
}
