//! `building-energy` library crate.
//!
//! The binary (`be`) is a thin wrapper around this library so that:
//!
//! - the cleaning pipeline, trainer and service are testable without spawning processes
//! - the HTTP layer stays a thin adapter over `serve::service`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod clean;
pub mod cli;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod resolve;
pub mod serve;
