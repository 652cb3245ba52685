//! Core viewshed engine modules

pub mod geometry;
pub mod radials;
pub mod scheduler;
pub mod sweep;
pub mod viewshed;

// Re-export main types
pub use geometry::LocalGrid;
pub use radials::{sector_azimuth, sector_offset, Radial, RadialTable, NUM_SECTORS};
pub use scheduler::JobGranularity;
pub use sweep::SweepContext;
pub use viewshed::{ViewshedConfig, ViewshedProcessor};
