use ndarray::Array2;
use sightline::{
    ElevationSource, FieldOfView, FlatElevationSource, JobGranularity, PixelValues,
    ViewshedConfig, ViewshedProcessor,
};
use std::sync::Arc;

/// One millidegree of latitude per output pixel
const GSD: f64 = 111.32;

/// Synthetic terrain aligned with the output window: cell (dx, dy) of
/// the height grid is what the sweep resolves at that pixel offset
struct GridTerrain {
    heights: Array2<f64>,
    half_window: i32,
}

impl GridTerrain {
    fn flat(half_window: i32, height: f64) -> Self {
        let side = (2 * half_window + 1) as usize;
        Self {
            heights: Array2::from_elem((side, side), height),
            half_window,
        }
    }

    fn with_heights(half_window: i32, f: impl Fn(i32, i32) -> f64) -> Self {
        let mut terrain = Self::flat(half_window, 0.0);
        for dy in -half_window..=half_window {
            for dx in -half_window..=half_window {
                terrain.set(dx, dy, f(dx, dy));
            }
        }
        terrain
    }

    fn set(&mut self, dx: i32, dy: i32, height: f64) {
        let half = self.half_window;
        self.heights[[(dy + half) as usize, (dx + half) as usize]] = height;
    }
}

impl ElevationSource for GridTerrain {
    fn elevation_at(&self, lat: f64, lon: f64) -> Option<f64> {
        let dy = (-lat * 111_320.0 / GSD).round() as i32;
        let dx = (lon * 111_320.0 / GSD).round() as i32;
        if dx.abs() > self.half_window || dy.abs() > self.half_window {
            return None;
        }
        let half = self.half_window;
        Some(self.heights[[(dy + half) as usize, (dx + half) as usize]])
    }
}

fn base_config(half_window: usize) -> ViewshedConfig {
    let mut config = ViewshedConfig::new(0.0, 0.0, GSD);
    config.half_window = Some(half_window);
    config.threads = 1;
    config.reticle_size = 0;
    config
}

fn cell(raster: &Array2<u8>, half: i32, dx: i32, dy: i32) -> u8 {
    raster[[(dy + half) as usize, (dx + half) as usize]]
}

#[test]
fn flat_world_is_visible_only_on_the_innermost_ring() {
    let mut config = base_config(6);
    config.eye_height = 0.0;

    let mut processor =
        ViewshedProcessor::new(config, Arc::new(FlatElevationSource::new(0.0))).unwrap();
    processor.execute().unwrap();
    let raster = processor.classification();
    let values = PixelValues::default();

    // Every cell's elevation angle is exactly zero, so only the first
    // ring beats the initial threshold; the outermost ring is the AOI
    // outline
    for dx in -5i32..=5 {
        for dy in -5i32..=5 {
            let ring = dx.abs().max(dy.abs());
            if ring == 0 {
                continue;
            }
            let expected = if ring == 1 { values.visible } else { values.hidden };
            assert_eq!(cell(&raster, 6, dx, dy), expected, "at ({}, {})", dx, dy);
        }
    }
    assert_eq!(cell(&raster, 6, 6, 6), values.observer);
}

#[test]
fn single_obstruction_shadows_only_its_radial() {
    let mut terrain = GridTerrain::flat(8, 0.0);
    terrain.set(4, 0, 500.0);

    let mut config = base_config(8);
    config.eye_height = 2.0;

    let mut processor = ViewshedProcessor::new(config, Arc::new(terrain)).unwrap();
    processor.execute().unwrap();
    let raster = processor.classification();
    let values = PixelValues::default();

    // Behind the peak, same radial: hidden
    for dx in 5..=7 {
        assert_eq!(cell(&raster, 8, dx, 0), values.hidden, "at ({}, 0)", dx);
    }
    // The peak itself and the approach: visible
    for dx in 1..=4 {
        assert_eq!(cell(&raster, 8, dx, 0), values.visible, "at ({}, 0)", dx);
    }
    // Every other axis and the diagonals: unaffected
    for d in 1..=7 {
        assert_eq!(cell(&raster, 8, -d, 0), values.visible);
        assert_eq!(cell(&raster, 8, 0, -d), values.visible);
        assert_eq!(cell(&raster, 8, 0, d), values.visible);
        assert_eq!(cell(&raster, 8, d, -d), values.visible);
    }
}

#[test]
fn radius_truncation_leaves_a_marker_ring() {
    let mut config = ViewshedConfig::new(0.0, 0.0, GSD);
    config.half_window = Some(10);
    config.radius = Some(5.0 * GSD); // 5 pixels
    config.threads = 1;
    config.reticle_size = 0;
    config.eye_height = 1.5;

    let mut processor =
        ViewshedProcessor::new(config, Arc::new(FlatElevationSource::new(0.0))).unwrap();
    processor.execute().unwrap();
    let raster = processor.classification();
    let values = PixelValues::default();

    // Marker pixels sit at Euclidean distance ~5 on every axis and
    // diagonal; the walk never resumes beyond them
    assert_eq!(cell(&raster, 10, 5, 0), values.observer);
    assert_eq!(cell(&raster, 10, -5, 0), values.observer);
    assert_eq!(cell(&raster, 10, 0, 5), values.observer);
    assert_eq!(cell(&raster, 10, 0, -5), values.observer);
    assert_eq!(cell(&raster, 10, 4, 4), values.observer);
    assert_eq!(cell(&raster, 10, -4, -4), values.observer);
    for d in 7..=10 {
        assert_eq!(cell(&raster, 10, d, 0), values.visible);
        assert_eq!(cell(&raster, 10, 0, -d), values.visible);
    }
    // The raised eye sees the whole flat interior
    assert_eq!(cell(&raster, 10, 3, 0), values.visible);
    assert_eq!(cell(&raster, 10, -2, 2), values.visible);
    // No square outline in the radius case
    assert_eq!(cell(&raster, 10, -10, -10), values.visible);
}

#[test]
fn output_is_identical_across_threads_and_granularities() {
    let run = |threads: usize, granularity: JobGranularity| -> Array2<u8> {
        let terrain = GridTerrain::with_heights(9, |dx, dy| {
            ((dx * 31 + dy * 17).rem_euclid(7)) as f64 * 3.0
        });
        let mut config = base_config(9);
        config.threads = threads;
        config.granularity = granularity;
        config.reticle_size = 2;

        let mut processor = ViewshedProcessor::new(config, Arc::new(terrain)).unwrap();
        processor.execute().unwrap();
        processor.classification()
    };

    let reference = run(1, JobGranularity::Radial);
    assert_eq!(run(1, JobGranularity::Sector), reference);
    assert_eq!(run(4, JobGranularity::Radial), reference);
    assert_eq!(run(4, JobGranularity::Sector), reference);
    assert_eq!(run(0, JobGranularity::Radial), reference);
}

#[test]
fn zero_width_fov_paints_nothing_but_the_overlay() {
    let mut config = base_config(5);
    config.fov = FieldOfView::new(45.0, 45.0);
    config.reticle_size = 1;
    config.eye_height = 0.0;

    let mut processor =
        ViewshedProcessor::new(config, Arc::new(FlatElevationSource::new(0.0))).unwrap();
    processor.execute().unwrap();
    let raster = processor.classification();
    let values = PixelValues::default();

    // No sector is swept: the interior keeps the background value
    assert_eq!(cell(&raster, 5, 2, 0), values.visible);
    assert_eq!(cell(&raster, 5, 1, 1), values.visible);
    assert_eq!(cell(&raster, 5, -3, 2), values.visible);
    // The reticle and outline still land
    assert_eq!(cell(&raster, 5, 0, 0), values.observer);
    assert_eq!(cell(&raster, 5, 0, 1), values.observer);
    assert_eq!(cell(&raster, 5, 5, 5), values.observer);

    // And the horizon profile is empty
    assert!(processor.horizon_profile().is_empty());
}

#[test]
fn custom_classification_codes_are_respected() {
    let mut config = base_config(4);
    config.eye_height = 0.0;
    config.values = PixelValues {
        visible: 10,
        hidden: 20,
        observer: 30,
    };
    config.reticle_size = 1;

    let mut processor =
        ViewshedProcessor::new(config, Arc::new(FlatElevationSource::new(0.0))).unwrap();
    processor.execute().unwrap();
    let raster = processor.classification();

    assert_eq!(cell(&raster, 4, 1, 0), 10);
    assert_eq!(cell(&raster, 4, 2, 0), 20);
    assert_eq!(cell(&raster, 4, 0, 0), 30);
    assert_eq!(cell(&raster, 4, 4, -4), 30);
}

#[test]
fn horizon_profile_reports_the_peak() {
    let mut terrain = GridTerrain::flat(8, 0.0);
    terrain.set(4, 0, 100.0); // due east
    let mut config = base_config(8);
    config.eye_height = 0.0;

    let mut processor = ViewshedProcessor::new(config, Arc::new(terrain)).unwrap();
    processor.execute().unwrap();

    let profile = processor.horizon_profile();
    assert!(!profile.is_empty());
    assert!(profile
        .windows(2)
        .all(|w| w[0].azimuth <= w[1].azimuth + 1e-9));

    // The maximum horizon angle sits on the due-east radial
    let best = profile
        .iter()
        .max_by(|a, b| a.angle.partial_cmp(&b.angle).unwrap())
        .unwrap();
    assert_eq!(best.azimuth, 90.0);
    assert_eq!(best.angle, 100.0 / 4.0);

    // Writing the side file round-trips the entries in order
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("horizon.txt");
    processor.write_horizon(&path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), profile.len());
    let first = contents.lines().next().unwrap();
    assert_eq!(first, format!("{}, {}", profile[0].angle, profile[0].azimuth));
}
