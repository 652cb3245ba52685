use serde::{Deserialize, Serialize};

/// Geospatial bounding box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Check whether a point lies inside the box (edges inclusive)
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Geospatial transformation parameters (GDAL-style affine, north-up)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

/// Observer world position for one viewshed run
///
/// `height` is the terrain height at the observer plus the eye-height
/// offset; it is resolved once during initialization and immutable for
/// the duration of the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Observer {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Height above the ellipsoid in meters (terrain + eye height)
    pub height: f64,
}

/// Output raster classification codes (visible / hidden / observer marker)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelValues {
    pub visible: u8,
    pub hidden: u8,
    pub observer: u8,
}

impl Default for PixelValues {
    fn default() -> Self {
        Self {
            visible: 0,
            hidden: 128,
            observer: 255,
        }
    }
}

/// Field of view as a clockwise azimuth arc, degrees from north
///
/// The arc is walked clockwise from `start` to `stop`, wrapping at 360.
/// A raw sweep of 360 degrees or more means the full circle; a zero-width
/// arc (`start == stop`, non-wrapping) contains nothing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldOfView {
    pub start: f64,
    pub stop: f64,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self {
            start: 0.0,
            stop: 360.0,
        }
    }
}

impl FieldOfView {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    /// Clockwise extent of the arc in degrees, in [0, 360]
    pub fn span(&self) -> f64 {
        if (self.stop - self.start).abs() >= 360.0 {
            return 360.0;
        }
        (self.stop - self.start).rem_euclid(360.0)
    }

    /// True if the arc contains the given azimuth (endpoints inclusive)
    pub fn contains(&self, azimuth: f64) -> bool {
        let span = self.span();
        if span <= 0.0 {
            return false;
        }
        if span >= 360.0 {
            return true;
        }
        (azimuth - self.start).rem_euclid(360.0) <= span
    }
}

impl std::fmt::Display for FieldOfView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}\u{00b0} -> {:.1}\u{00b0}", self.start, self.stop)
    }
}

/// Error types for viewshed processing
#[derive(Debug, thiserror::Error)]
pub enum SightError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for viewshed operations
pub type SightResult<T> = Result<T, SightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_circle_fov() {
        let fov = FieldOfView::default();
        assert_eq!(fov.span(), 360.0);
        assert!(fov.contains(0.0));
        assert!(fov.contains(359.9));
    }

    #[test]
    fn test_zero_width_fov() {
        let fov = FieldOfView::new(90.0, 90.0);
        assert_eq!(fov.span(), 0.0);
        assert!(!fov.contains(90.0));
    }

    #[test]
    fn test_wrapping_fov() {
        let fov = FieldOfView::new(315.0, 45.0);
        assert_eq!(fov.span(), 90.0);
        assert!(fov.contains(0.0));
        assert!(fov.contains(350.0));
        assert!(!fov.contains(180.0));
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox {
            min_lon: 10.0,
            max_lon: 11.0,
            min_lat: 45.0,
            max_lat: 46.0,
        };
        assert!(bbox.contains(45.5, 10.5));
        assert!(bbox.contains(45.0, 10.0));
        assert!(!bbox.contains(44.9, 10.5));
        assert!(!bbox.contains(45.5, 11.1));
    }
}
