use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for catalog processing
///
/// Only fatal conditions live here. Per-record defects (bad numbers,
/// missing photos, absent samples) are recovered in place and never
/// surface as errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Required column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    #[error("Samples sheet must have at least {required} columns, found {found}")]
    SamplesShape { required: usize, found: usize },

    #[error("Required asset not found: {}", path.display())]
    MissingAsset { path: PathBuf },

    #[error("Font asset is not a valid font: {}", path.display())]
    InvalidFont { path: PathBuf },

    #[error("No records to build a catalog from")]
    NoData,

    #[error("Unsupported table format: {}", path.display())]
    UnsupportedTable { path: PathBuf },

    #[error("Spreadsheet error in {}: {message}", path.display())]
    Spreadsheet { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("File I/O error: {}", path.display())]
    FileIO {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing failed")]
    Image(#[from] image::ImageError),

    #[error("Failed to write document")]
    DocumentWrite(#[source] std::io::Error),

    #[error("PDF generation failed")]
    Pdf(#[from] lopdf::Error),

    #[error("CSV error")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration JSON")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// Create a file I/O error bound to the path that failed
    pub fn file_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::FileIO {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn missing_column(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            table: table.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for errors caused by setup (columns, assets, config), not by I/O or data
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. }
                | Self::SamplesShape { .. }
                | Self::MissingAsset { .. }
                | Self::InvalidFont { .. }
                | Self::NoData
                | Self::Configuration { .. }
        )
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message() {
        let err = CatalogError::missing_column("BOX", "core log");
        assert_eq!(err.to_string(), "Required column 'BOX' not found in core log");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_io_error_is_not_configuration() {
        let err = CatalogError::file_io(
            "/tmp/x.xlsx",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("x.xlsx"));
    }
}
