//! Training data: the daily dataset and its train/test split.

pub mod builder;
pub mod split;

pub use builder::{build_dataset, dataset_from_table, Dataset, DatasetRow};
pub use split::{select_test_dates, split_dataset, TrainTestSplit};
