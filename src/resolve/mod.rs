//! Entity resolution: building names and codes.
//!
//! - `codes`: the one canonical building-code normalization
//! - `resolver`: alias table + fuzzy name lookup over known buildings

pub mod codes;
pub mod resolver;

pub use codes::{looks_like_code, normalize_building_code};
pub use resolver::{BuildingDirectory, BUILDING_NAME_ALIASES};
