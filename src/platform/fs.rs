// PropVal - platform/fs.rs
//
// Filesystem helpers: dataset path resolution, raw reads and export files.

use crate::core::export::{self, ExportFormat};
use crate::core::model::Comparable;
use crate::util::constants;
use crate::util::error::{ExportError, Result};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// Read the full content of a file as bytes. Decoding is the parser's job.
pub fn read_bytes(path: &Path) -> io::Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "File read");
    Ok(bytes)
}

/// Pick the dataset file to load.
///
/// Priority: explicit CLI path > config.toml path > default file name in the
/// platform data directory (if it exists) > default file name in the
/// current directory.
pub fn resolve_dataset_path(
    cli_path: Option<&Path>,
    config_path: Option<&Path>,
    data_dir: &Path,
) -> PathBuf {
    if let Some(p) = cli_path.or(config_path) {
        return p.to_path_buf();
    }
    let in_data_dir = data_dir.join(constants::DEFAULT_DATASET_FILE);
    if in_data_dir.is_file() {
        return in_data_dir;
    }
    PathBuf::from(constants::DEFAULT_DATASET_FILE)
}

/// Write comparables to `dest` in the format implied by its extension.
///
/// Returns the number of comparables written.
pub fn write_export(comparables: &[Comparable<'_>], dest: &Path) -> Result<usize> {
    let file = std::fs::File::create(dest).map_err(|source| ExportError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);
    let count = match ExportFormat::from_path(dest) {
        ExportFormat::Csv => export::export_csv(comparables, writer, dest)?,
        ExportFormat::Json => export::export_json(comparables, writer, dest)?,
    };
    tracing::info!(path = %dest.display(), count, "Comparables exported");
    Ok(count)
}
