//! Input/output helpers.
//!
//! - CSV tables with null-aware cells (`table`)
//! - header normalization and aliases (`columns`)
//! - source discovery + typed ingestion (`ingest`)
//! - cleaning artifacts and prediction exports (`export`)

pub mod columns;
pub mod export;
pub mod ingest;
pub mod table;

pub use export::*;
pub use ingest::*;
pub use table::Table;
