use crate::types::{GeoTransform, SightError, SightResult};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::Path;

/// Writer for classified single-band 8-bit rasters
///
/// The output driver is selected from the file extension. GeoTIFF is
/// created directly; formats whose drivers cannot create datasets from
/// scratch (PNG among them) are staged in an in-memory dataset and
/// copied out.
pub struct RasterWriter;

impl RasterWriter {
    /// Write a classification raster with its geo-referencing
    pub fn write_classification<P: AsRef<Path>>(
        data: &Array2<u8>,
        transform: &GeoTransform,
        path: P,
    ) -> SightResult<()> {
        let path = path.as_ref();
        log::info!("Writing classification raster: {}", path.display());

        let (height, width) = data.dim();
        let driver_name = Self::driver_for_extension(path);
        log::debug!("Output driver: {} ({}x{} pixels)", driver_name, width, height);

        if driver_name == "GTiff" {
            let driver = DriverManager::get_driver_by_name("GTiff")?;
            let mut dataset =
                driver.create_with_band_type::<u8, _>(path, width as isize, height as isize, 1)?;
            Self::fill_dataset(&mut dataset, data, transform)?;
        } else {
            // Stage in a MEM dataset, then let the target driver copy it
            let mem_driver = DriverManager::get_driver_by_name("MEM")?;
            let mut staged =
                mem_driver.create_with_band_type::<u8, _>("", width as isize, height as isize, 1)?;
            Self::fill_dataset(&mut staged, data, transform)?;

            let driver = DriverManager::get_driver_by_name(driver_name)?;
            staged.create_copy(&driver, path, &[])?;
        }

        log::info!("Classification raster written successfully");
        Ok(())
    }

    fn fill_dataset(
        dataset: &mut Dataset,
        data: &Array2<u8>,
        transform: &GeoTransform,
    ) -> SightResult<()> {
        let (height, width) = data.dim();

        dataset.set_geo_transform(&[
            transform.top_left_x,
            transform.pixel_width,
            transform.rotation_x,
            transform.top_left_y,
            transform.rotation_y,
            transform.pixel_height,
        ])?;
        dataset.set_spatial_ref(&gdal::spatial_ref::SpatialRef::from_epsg(4326)?)?;

        let mut rasterband = dataset.rasterband(1)?;
        let flat_data: Vec<u8> = data.iter().cloned().collect();
        let buffer = Buffer::new((width, height), flat_data);
        rasterband.write((0, 0), (width, height), &buffer)?;

        Ok(())
    }

    /// Map a file extension to a GDAL driver name (GeoTIFF by default)
    fn driver_for_extension(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "PNG",
            Some("bmp") => "BMP",
            Some("tif") | Some("tiff") => "GTiff",
            Some(other) => {
                log::warn!("Unrecognized output extension '{}', writing GeoTIFF", other);
                "GTiff"
            }
            None => "GTiff",
        }
    }
}

/// Validate that a classification raster can be allocated
///
/// The output buffer for a half-window of `half_window` pixels is a
/// square of side `2 * half_window + 1`; allocation failure here is
/// fatal and reported before any sweep work starts.
pub fn allocate_buffer(half_window: usize, fill: u8) -> SightResult<Array2<u8>> {
    let side = 2 * half_window + 1;
    let cells = side.checked_mul(side).ok_or_else(|| {
        SightError::Config(format!("Output window of {} pixels is too large", side))
    })?;
    log::debug!("Allocating {}x{} output buffer ({} cells)", side, side, cells);
    Ok(Array2::from_elem((side, side), fill))
}
