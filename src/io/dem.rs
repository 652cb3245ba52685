use crate::types::{BoundingBox, GeoTransform, SightError, SightResult};
use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

/// Source of terrain heights for the visibility sweep
///
/// `elevation_at` returns `None` where the source has no coverage
/// (nodata cells, points outside the loaded extent). The sweep treats a
/// missing height as a coverage gap, never as an error.
pub trait ElevationSource: Send + Sync {
    /// Terrain height in meters at a world point, or `None` for a gap
    fn elevation_at(&self, lat: f64, lon: f64) -> Option<f64>;

    /// Native ground sample distance in meters, if the source has one
    fn ground_sample_distance(&self) -> Option<f64> {
        None
    }
}

/// Digital Elevation Model backed elevation source
///
/// Loads the full raster into memory and answers point queries with
/// bilinear interpolation between the four surrounding posts.
pub struct DemElevationSource {
    dem: Array2<f32>,
    transform: GeoTransform,
    nodata: f32,
}

impl DemElevationSource {
    /// Create a source from an in-memory elevation grid
    pub fn new(dem: Array2<f32>, transform: GeoTransform, nodata: f32) -> Self {
        Self {
            dem,
            transform,
            nodata,
        }
    }

    /// Load a DEM from any GDAL-supported raster file
    pub fn from_file<P: AsRef<Path>>(dem_path: P) -> SightResult<Self> {
        log::info!("Loading DEM: {}", dem_path.as_ref().display());

        let dataset = Dataset::open(dem_path.as_ref())?;
        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();

        log::debug!("DEM size: {}x{}", width, height);
        log::debug!("DEM geotransform: {:?}", geo_transform);

        let rasterband = dataset.rasterband(1)?;
        let nodata = rasterband.no_data_value().unwrap_or(-32768.0) as f32;
        let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let dem = Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| SightError::Processing(format!("Failed to reshape DEM data: {}", e)))?;

        let transform = GeoTransform {
            top_left_x: geo_transform[0],
            pixel_width: geo_transform[1],
            rotation_x: geo_transform[2],
            top_left_y: geo_transform[3],
            rotation_y: geo_transform[4],
            pixel_height: geo_transform[5],
        };

        Ok(Self::new(dem, transform, nodata))
    }

    /// Geographic extent covered by the loaded raster
    pub fn bounds(&self) -> BoundingBox {
        let (rows, cols) = self.dem.dim();
        let east = self.transform.top_left_x + cols as f64 * self.transform.pixel_width;
        let south = self.transform.top_left_y + rows as f64 * self.transform.pixel_height;
        BoundingBox {
            min_lon: self.transform.top_left_x.min(east),
            max_lon: self.transform.top_left_x.max(east),
            min_lat: self.transform.top_left_y.min(south),
            max_lat: self.transform.top_left_y.max(south),
        }
    }
}

impl ElevationSource for DemElevationSource {
    fn elevation_at(&self, lat: f64, lon: f64) -> Option<f64> {
        // Convert lat/lon to fractional DEM pixel coordinates
        let col = (lon - self.transform.top_left_x) / self.transform.pixel_width;
        let row = (lat - self.transform.top_left_y) / self.transform.pixel_height;

        if col < 0.0
            || row < 0.0
            || col >= (self.dem.dim().1 - 1) as f64
            || row >= (self.dem.dim().0 - 1) as f64
        {
            return None;
        }

        // Bilinear interpolation
        let x1 = col.floor() as usize;
        let y1 = row.floor() as usize;
        let x2 = (x1 + 1).min(self.dem.dim().1 - 1);
        let y2 = (y1 + 1).min(self.dem.dim().0 - 1);

        let dx = col - x1 as f64;
        let dy = row - y1 as f64;

        let v11 = self.dem[[y1, x1]] as f64;
        let v12 = self.dem[[y2, x1]] as f64;
        let v21 = self.dem[[y1, x2]] as f64;
        let v22 = self.dem[[y2, x2]] as f64;

        let nodata = self.nodata as f64;
        if v11 == nodata || v12 == nodata || v21 == nodata || v22 == nodata {
            return None;
        }

        let interpolated = v11 * (1.0 - dx) * (1.0 - dy)
            + v21 * dx * (1.0 - dy)
            + v12 * (1.0 - dx) * dy
            + v22 * dx * dy;

        if interpolated.is_finite() {
            Some(interpolated)
        } else {
            None
        }
    }

    fn ground_sample_distance(&self) -> Option<f64> {
        // Pixel width is in degrees of longitude; convert at the raster
        // center latitude
        let (rows, _) = self.dem.dim();
        let center_lat =
            self.transform.top_left_y + 0.5 * rows as f64 * self.transform.pixel_height;
        let meters_per_degree = 111_320.0 * center_lat.to_radians().cos();
        let gsd = self.transform.pixel_width.abs() * meters_per_degree;
        if gsd > 0.0 {
            Some(gsd)
        } else {
            None
        }
    }
}

/// Constant-height elevation source for simulation runs
///
/// Used when no DEM is supplied: the whole world is a flat plane at the
/// given height.
#[derive(Debug, Clone, Copy)]
pub struct FlatElevationSource {
    height: f64,
}

impl FlatElevationSource {
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl ElevationSource for FlatElevationSource {
    fn elevation_at(&self, _lat: f64, _lon: f64) -> Option<f64> {
        Some(self.height)
    }
}
