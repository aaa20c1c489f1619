//! Numerical building blocks: standardization and ridge least squares.

pub mod ols;
pub mod scale;

pub use ols::*;
pub use scale::StandardScaler;
