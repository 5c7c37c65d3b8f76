//! Boot image loading.
//!
//! The SROM console image's on-disk format is handled outside this crate;
//! what arrives here is a flat array of bytes that must be a whole number
//! of 32-bit Alpha instruction words. The loader splits it into words and
//! hands it to the CPU's boot path, which installs the Icache blocks and
//! points the reset PC at the image in PAL mode.

use std::fs;
use std::path::Path;

use crate::common::error::InitError;
use crate::sim::simulator::Simulator;

/// Reads a raw boot image from disk.
pub fn load_binary(path: &Path) -> Result<Vec<u8>, InitError> {
    fs::read(path).map_err(|e| InitError::InvalidImage(format!("{}: {e}", path.display())))
}

/// Converts a raw byte image into little-endian instruction words. The
/// image must be a whole number of 32-bit words.
pub fn image_words(bytes: &[u8]) -> Result<Vec<u32>, InitError> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(InitError::InvalidImage(format!(
            "image length {} is not a whole number of instruction words",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Loads a boot image file and brings the simulator to `Run` with the PC
/// at the image base.
pub fn boot_from_file(sim: &mut Simulator, path: &Path, base_pa: u64) -> Result<(), InitError> {
    let bytes = load_binary(path)?;
    let words = image_words(&bytes)?;
    sim.boot(base_pa, &words)
}
