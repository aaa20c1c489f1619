//! Standardize → one-hot building code → ridge regression.
//!
//! The numeric features are standardized with statistics learned on the training
//! rows. When the dataset is grouped by building, one indicator column per
//! training building code is appended (unscaled); codes unseen during training
//! encode as all zeros, i.e. the "average building".

use nalgebra::{DMatrix, DVector};

use crate::dataset::Dataset;
use crate::domain::ModelConfig;
use crate::error::AppError;
use crate::io::ingest::parse_number;
use crate::io::table::Table;
use crate::math::{ridge, StandardScaler};

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionModel {
    pub feature_names: Vec<String>,
    pub target_name: String,
    /// One-hot categories, sorted; empty when not grouped by building.
    pub building_codes: Vec<String>,
    pub scaler: StandardScaler,
    /// Numeric feature weights (standardized space) followed by one weight per building code.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RegressionModel {
    /// Fit on the given dataset rows.
    pub fn fit(dataset: &Dataset, rows: &[usize], config: &ModelConfig) -> Result<Self, AppError> {
        if rows.is_empty() {
            return Err(AppError::validation(
                "Not enough data to train: the training split is empty",
            ));
        }

        let p = dataset.feature_names.len();
        let raw = DMatrix::from_fn(rows.len(), p, |i, j| dataset.rows[rows[i]].features[j]);
        let scaler = StandardScaler::fit(&raw);

        let mut building_codes: Vec<String> = if dataset.grouped_by_building {
            rows.iter()
                .filter_map(|&i| dataset.rows[i].building_code.clone())
                .collect()
        } else {
            Vec::new()
        };
        building_codes.sort();
        building_codes.dedup();

        let mut model = Self {
            feature_names: dataset.feature_names.clone(),
            target_name: dataset.target_name.clone(),
            building_codes,
            scaler,
            coefficients: Vec::new(),
            intercept: 0.0,
        };

        let x = model.design(&raw, rows.iter().map(|&i| dataset.rows[i].building_code.as_deref()));
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|&i| dataset.rows[i].target));

        let fit = ridge(&x, &y, config.alpha).ok_or_else(|| {
            AppError::internal(format!(
                "Ridge regression failed on {} rows x {} columns (alpha = {})",
                x.nrows(),
                x.ncols(),
                config.alpha
            ))
        })?;
        model.coefficients = fit.coefficients.iter().copied().collect();
        model.intercept = fit.intercept;
        Ok(model)
    }

    /// Scaled features plus building indicators.
    fn design<'a>(
        &self,
        raw: &DMatrix<f64>,
        codes: impl Iterator<Item = Option<&'a str>>,
    ) -> DMatrix<f64> {
        let scaled = self.scaler.transform(raw);
        let p = scaled.ncols();
        let mut x = DMatrix::zeros(raw.nrows(), p + self.building_codes.len());
        x.columns_mut(0, p).copy_from(&scaled);
        for (i, code) in codes.enumerate() {
            if let Some(k) = code.and_then(|c| self.building_codes.iter().position(|b| b == c)) {
                x[(i, p + k)] = 1.0;
            }
        }
        x
    }

    /// Predict one row of raw feature values (in `feature_names` order).
    pub fn predict_one(&self, features: &[f64], building_code: Option<&str>) -> Result<f64, AppError> {
        if features.len() != self.feature_names.len() {
            return Err(AppError::validation(format!(
                "Expected {} features ({}), got {}",
                self.feature_names.len(),
                self.feature_names.join(", "),
                features.len()
            )));
        }
        let raw = DMatrix::from_row_slice(1, features.len(), features);
        Ok(self.predict_matrix(&raw, std::iter::once(building_code))[0])
    }

    /// Predict the given dataset rows.
    pub fn predict_rows(&self, dataset: &Dataset, rows: &[usize]) -> Vec<f64> {
        let p = self.feature_names.len();
        let raw = DMatrix::from_fn(rows.len(), p, |i, j| dataset.rows[rows[i]].features[j]);
        self.predict_matrix(&raw, rows.iter().map(|&i| dataset.rows[i].building_code.as_deref()))
            .iter()
            .copied()
            .collect()
    }

    /// Predict every row of a feature table (e.g. a daily weather forecast).
    ///
    /// All feature columns must exist; every cell must be a finite number.
    pub fn predict_table(&self, table: &Table) -> Result<Vec<f64>, AppError> {
        let missing: Vec<&str> = self
            .feature_names
            .iter()
            .map(String::as_str)
            .filter(|c| !table.has_column(c))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::schema(format!(
                "Missing required weather columns: {}",
                missing.join(", ")
            )));
        }

        let idx: Vec<usize> = self
            .feature_names
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        let code_idx = table.column_index("simscode");

        let mut values = Vec::with_capacity(table.len() * idx.len());
        for row in 0..table.len() {
            for (&col, name) in idx.iter().zip(&self.feature_names) {
                let v = table.value(row, col).and_then(parse_number).ok_or_else(|| {
                    AppError::validation(format!("Row {}: `{name}` is not a finite number", row + 1))
                })?;
                values.push(v);
            }
        }
        let raw = DMatrix::from_row_slice(table.len(), idx.len(), &values);
        let codes: Vec<Option<String>> = (0..table.len())
            .map(|row| {
                code_idx
                    .and_then(|c| table.value(row, c))
                    .map(crate::resolve::normalize_building_code)
            })
            .collect();
        Ok(self
            .predict_matrix(&raw, codes.iter().map(|c| c.as_deref()))
            .iter()
            .copied()
            .collect())
    }

    fn predict_matrix<'a>(
        &self,
        raw: &DMatrix<f64>,
        codes: impl Iterator<Item = Option<&'a str>>,
    ) -> DVector<f64> {
        let x = self.design(raw, codes);
        let beta = DVector::from_column_slice(&self.coefficients);
        (x * beta).add_scalar(self.intercept)
    }
}
