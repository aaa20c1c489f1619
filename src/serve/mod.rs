//! Prediction service.
//!
//! - `cache`: per-building model cache with single-flight training
//! - `service`: JSON request/response contract (`/health`, `/buildings`, `/predict`)
//! - `http`: axum router + CORS around the service

pub mod cache;
pub mod http;
pub mod service;

pub use cache::ModelCache;
pub use service::{PredictionService, TargetBuilding};
