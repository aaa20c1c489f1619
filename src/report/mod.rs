//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline and model code return
//! plain data and output changes stay localized.

pub mod format;

pub use format::*;
