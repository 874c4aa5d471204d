/// Core photo catalog builder
///
/// Turns a core-logging spreadsheet and a folder of box photographs into a
/// paginated photo catalog:
/// - `state`: configuration, table loading and the per-run dataset
/// - `depth`: merged drilling intervals and core recovery
/// - `photo`: photo matching and sample markers
/// - `samples`: laboratory sample sheet
/// - `render`: depth scales, encoding and fixed assets
/// - `catalog`: section assembly and PDF output
/// - `pipeline` / `export`: processing runs and CSV export

pub mod catalog;
pub mod color;
pub mod depth;
pub mod error;
pub mod export;
pub mod logging;
pub mod photo;
pub mod pipeline;
pub mod render;
pub mod samples;
pub mod state;

pub use error::{CatalogError, CatalogResult};
pub use pipeline::{process, process_table, ProcessedData};
pub use state::config::CatalogConfig;
