/// Catalog assembly and document output
///
/// This module handles:
/// - Building one section per core box (texts, scales, photos)
/// - Progress reporting while boxes are processed
/// - Writing the finished catalog as a PDF with the label font embedded,
///   atomically

pub mod assembler;
pub mod document;
pub mod font;
pub mod pdf;
pub mod progress;

pub use assembler::CatalogAssembler;
pub use document::{BoxSection, Catalog, Figure, SampleBlock};
pub use pdf::{DocumentWriter, PdfWriter};
pub use progress::{NoProgress, ProgressSink};

use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult};

/// Write `catalog` to `path` through a temporary file in the same directory.
/// The destination only appears once the writer has finished; on failure
/// the temporary file is removed and nothing is left behind. A catalog
/// without sections is refused before anything is created.
pub fn write_catalog(catalog: &Catalog, writer: &dyn DocumentWriter, path: &Path) -> CatalogResult<()> {
    if catalog.is_empty() {
        return Err(CatalogError::NoData);
    }
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| CatalogError::file_io(dir, e))?;

    let result = {
        let mut out = BufWriter::new(temp.as_file_mut());
        writer
            .write(catalog, &mut out)
            .and_then(|()| out.flush().map_err(|e| CatalogError::file_io(path, e)))
    };

    if let Err(e) = result {
        let temp_path = temp.path().to_path_buf();
        if let Err(cleanup) = temp.close() {
            warn!("⚠️  Could not remove temporary file {}: {}", temp_path.display(), cleanup);
        }
        return Err(e);
    }

    temp.persist(path)
        .map_err(|e| CatalogError::file_io(path, e.error))?;
    info!("💾 Catalog saved to {}", path.display());
    Ok(())
}
