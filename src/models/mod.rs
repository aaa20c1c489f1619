//! Regression model and its training loop.
//!
//! - `model`: standardize + one-hot + ridge, with prediction helpers
//! - `train`: dataset → temporal split → fit → MAE/RMSE on held-out dates

pub mod model;
pub mod train;

pub use model::RegressionModel;
pub use train::{error_metrics, train_and_evaluate, train_on_dataset, TrainedModel};
