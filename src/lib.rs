//! Sightline: A Fast, Parallel Terrain Visibility (Viewshed) Processor
//!
//! This library computes, for every cell of a square raster centered on an
//! observer, whether that cell is optically visible from the observer, and
//! paints a classified raster (visible / hidden / observer marker). The
//! full circle is decomposed into 8 octant sectors walked by discretized
//! radials, giving one elevation query and one angle comparison per output
//! cell instead of a per-pixel ray march.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, FieldOfView, GeoTransform, Observer, PixelValues, SightError, SightResult,
};

pub use io::{DemElevationSource, ElevationSource, FlatElevationSource, HorizonEntry, RasterWriter};

pub use crate::core::{JobGranularity, LocalGrid, ViewshedConfig, ViewshedProcessor};
