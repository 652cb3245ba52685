use crate::types::SightResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One entry of the horizon profile: azimuth and the maximum elevation
/// angle observed along that radial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonEntry {
    /// Azimuth in degrees clockwise from north
    pub azimuth: f64,
    /// Maximum elevation angle along the radial (height delta over
    /// major-axis distance, the sweep's native ratio)
    pub angle: f64,
}

/// Write a horizon profile as a text side file, one `angle, azimuth`
/// pair per line, azimuth ascending
pub fn write_profile<P: AsRef<Path>>(entries: &[HorizonEntry], path: P) -> SightResult<()> {
    let path = path.as_ref();
    log::info!(
        "Writing horizon profile ({} radials): {}",
        entries.len(),
        path.display()
    );

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}, {}", entry.angle, entry.azimuth)?;
    }
    writer.flush()?;

    Ok(())
}
