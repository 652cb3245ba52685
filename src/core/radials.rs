use crate::types::FieldOfView;

/// Number of 45-degree octant sectors partitioning the full circle
pub const NUM_SECTORS: usize = 8;

/// Angular span of one sector in degrees
pub const SECTOR_SPAN: f64 = 45.0;

/// One discretized ray from the observer outward within a sector
///
/// `azimuth_slope` is fixed at construction and encodes the radial's
/// direction as the minor-over-major axis ratio, so the walk position is
/// `minor = azimuth_slope * major`. `best_elevation_angle` is the only
/// mutable sweep state: it rises monotonically as the walk moves outward
/// and a cell is visible iff its elevation angle strictly exceeds it.
#[derive(Debug, Clone)]
pub struct Radial {
    pub azimuth_slope: f64,
    pub best_elevation_angle: f64,
}

impl Radial {
    fn new(azimuth_slope: f64) -> Self {
        Self {
            azimuth_slope,
            // Guarantees the first sample on every radial is visible
            best_elevation_angle: f64::NEG_INFINITY,
        }
    }
}

/// The per-sector radial arrays for one viewshed run
///
/// A sector excluded by the field of view is `None`. Within every
/// included sector the radials are ordered by ascending azimuth: even
/// sectors carry slopes `i / half_window`, odd sectors are mirrored to
/// `(half_window - i) / half_window` so azimuth stays monotonic across
/// sector boundaries.
#[derive(Debug)]
pub struct RadialTable {
    pub sectors: [Option<Vec<Radial>>; NUM_SECTORS],
}

impl RadialTable {
    /// Build the table for a half-window size and field of view
    pub fn build(half_window: usize, fov: &FieldOfView) -> Self {
        let mut sectors: [Option<Vec<Radial>>; NUM_SECTORS] = Default::default();
        let n = half_window.max(1) as f64;

        for (sector, slot) in sectors.iter_mut().enumerate() {
            if !sector_in_fov(sector, fov) {
                continue;
            }
            let radials = (0..=half_window)
                .map(|i| {
                    let slope = if sector % 2 == 0 {
                        i as f64 / n
                    } else {
                        (half_window - i) as f64 / n
                    };
                    Radial::new(slope)
                })
                .collect();
            *slot = Some(radials);
        }

        log::debug!(
            "Radial table: {} of {} sectors included for FOV {}",
            sectors.iter().filter(|s| s.is_some()).count(),
            NUM_SECTORS,
            fov
        );

        RadialTable { sectors }
    }

    /// Number of radials across all included sectors
    pub fn radial_count(&self) -> usize {
        self.sectors
            .iter()
            .flatten()
            .map(|radials| radials.len())
            .sum()
    }
}

/// Whether any part of the requested azimuth arc falls inside a sector
fn sector_in_fov(sector: usize, fov: &FieldOfView) -> bool {
    let span = fov.span();
    if span <= 0.0 {
        return false;
    }
    if span >= 360.0 {
        return true;
    }
    let s0 = sector as f64 * SECTOR_SPAN;
    let s1 = s0 + SECTOR_SPAN;
    let start = fov.start.rem_euclid(360.0);
    fov.contains(s0) || fov.contains(s1) || (start >= s0 && start < s1)
}

/// Map a sector-local walk position to a signed pixel offset
///
/// `u` runs along the sector's major axis, `v` along the minor axis;
/// x grows east, y grows south. The eight permutations tile the full
/// disk: even sectors own minor offsets `0 <= v < u`, odd sectors own
/// `0 < v <= u`, so every offset inside the half-window maps back to
/// exactly one `(sector, u, v)` triple.
pub fn sector_offset(sector: usize, u: i32, v: i32) -> (i32, i32) {
    match sector {
        0 => (v, -u),
        1 => (u, -v),
        2 => (u, v),
        3 => (v, u),
        4 => (-v, u),
        5 => (-u, v),
        6 => (-u, -v),
        7 => (-v, -u),
        _ => unreachable!("sector index out of range: {}", sector),
    }
}

/// True azimuth in degrees of a radial given its sector and stored slope
///
/// Inverse of the walk mapping, one trigonometric case per sector. With
/// the odd-sector slope mirroring this is ascending in the radial index
/// for every sector.
pub fn sector_azimuth(sector: usize, slope: f64) -> f64 {
    let theta = slope.atan().to_degrees();
    match sector {
        0 => theta,
        1 => 90.0 - theta,
        2 => 90.0 + theta,
        3 => 180.0 - theta,
        4 => 180.0 + theta,
        5 => 270.0 - theta,
        6 => 270.0 + theta,
        7 => 360.0 - theta,
        _ => unreachable!("sector index out of range: {}", sector),
    }
}
