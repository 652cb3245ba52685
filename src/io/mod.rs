//! Elevation access and raster output

pub mod dem;
pub mod horizon;
pub mod raster;

// Re-export main types
pub use dem::{DemElevationSource, ElevationSource, FlatElevationSource};
pub use horizon::HorizonEntry;
pub use raster::RasterWriter;
