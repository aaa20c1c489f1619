//! Cleaning stages between ingestion and the merged artifact.
//!
//! - `outlier`: per-utility percentile filter on meter readings
//! - `daily`: hourly weather → one row per calendar date
//! - `merge`: meter ⟕ buildings ⟕ daily weather

pub mod daily;
pub mod merge;
pub mod outlier;

pub use daily::aggregate_daily;
pub use merge::merge;
pub use outlier::{drop_outliers, OutlierReport};
