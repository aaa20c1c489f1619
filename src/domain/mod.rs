//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fixed column sets and file names of the cleaning run
//! - typed meter / weather / building tables and merged records
//! - configuration for cleaning, dataset building, splitting and training

pub mod types;

pub use types::*;
