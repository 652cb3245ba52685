use crate::types::{GeoTransform, Observer, SightError, SightResult};

/// Meters per degree of latitude on the WGS84 ellipsoid (mean value)
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Local pixel grid centered on the observer
///
/// Maps signed pixel offsets (x east, y south, origin at the observer)
/// to world coordinates and back, and synthesizes the north-up
/// geotransform carried by the output raster. Longitude spacing shrinks
/// with the cosine of the observer latitude so that pixels are square in
/// ground meters.
#[derive(Debug, Clone)]
pub struct LocalGrid {
    origin_lat: f64,
    origin_lon: f64,
    /// Ground sample distance, meters per pixel
    gsd: f64,
    half_window: usize,
    meters_per_degree_lon: f64,
}

impl LocalGrid {
    pub fn new(observer: &Observer, gsd: f64, half_window: usize) -> SightResult<Self> {
        if !(gsd > 0.0) {
            return Err(SightError::Config(format!(
                "Ground sample distance must be positive, got {}",
                gsd
            )));
        }
        if !(-90.0..=90.0).contains(&observer.latitude)
            || !(-180.0..=180.0).contains(&observer.longitude)
        {
            return Err(SightError::Config(format!(
                "Observer position out of range: ({}, {})",
                observer.latitude, observer.longitude
            )));
        }

        let meters_per_degree_lon = METERS_PER_DEGREE * observer.latitude.to_radians().cos();
        if meters_per_degree_lon <= 0.0 {
            return Err(SightError::Config(
                "Observer latitude too close to a pole for a local grid".to_string(),
            ));
        }

        Ok(Self {
            origin_lat: observer.latitude,
            origin_lon: observer.longitude,
            gsd,
            half_window,
            meters_per_degree_lon,
        })
    }

    pub fn gsd(&self) -> f64 {
        self.gsd
    }

    pub fn half_window(&self) -> usize {
        self.half_window
    }

    /// Side length of the output raster in pixels
    pub fn side(&self) -> usize {
        2 * self.half_window + 1
    }

    /// World coordinate of a signed pixel offset from the observer
    pub fn offset_to_latlon(&self, dx: i32, dy: i32) -> (f64, f64) {
        let lat = self.origin_lat - dy as f64 * self.gsd / METERS_PER_DEGREE;
        let lon = self.origin_lon + dx as f64 * self.gsd / self.meters_per_degree_lon;
        (lat, lon)
    }

    /// Buffer row/column of a signed pixel offset, if inside the window
    pub fn buffer_index(&self, dx: i32, dy: i32) -> Option<(usize, usize)> {
        let half = self.half_window as i32;
        if dx.abs() > half || dy.abs() > half {
            return None;
        }
        Some(((dy + half) as usize, (dx + half) as usize))
    }

    /// North-up geotransform of the output raster
    ///
    /// Anchored at the outer corner of the top-left pixel, per the GDAL
    /// convention.
    pub fn geo_transform(&self) -> GeoTransform {
        let pixel_width = self.gsd / self.meters_per_degree_lon;
        let pixel_height = self.gsd / METERS_PER_DEGREE;
        let half = self.half_window as f64 + 0.5;
        GeoTransform {
            top_left_x: self.origin_lon - half * pixel_width,
            pixel_width,
            rotation_x: 0.0,
            top_left_y: self.origin_lat + half * pixel_height,
            rotation_y: 0.0,
            pixel_height: -pixel_height,
        }
    }
}
