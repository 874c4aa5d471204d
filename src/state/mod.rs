/// State management module
///
/// This module handles the per-run dataset, including:
/// - Tabular input loading (table.rs)
/// - Schema mapping and the record set (dataset.rs)
/// - Shared data structures (data.rs)
/// - Catalog configuration (config.rs)

pub mod config;
pub mod data;
pub mod dataset;
pub mod table;
