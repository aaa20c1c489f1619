//! Per-column standardization.

use nalgebra::DMatrix;

/// Column means and population standard deviations learned from training data.
///
/// Columns with zero variance get a scale of 1 so they map to all zeros instead
/// of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &DMatrix<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());
        for col in x.column_iter() {
            let m = col.sum() / n;
            let var = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            let sd = var.sqrt();
            mean.push(m);
            scale.push(if sd > 0.0 && sd.is_finite() { sd } else { 1.0 });
        }
        Self { mean, scale }
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = x.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            let (m, s) = (self.mean[j], self.scale[j]);
            col.apply(|v| *v = (*v - m) / s);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std_and_constant_column() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0, 4.0, 5.0]);
        let scaler = StandardScaler::fit(&x);
        assert_eq!(scaler.mean, vec![2.5, 5.0]);
        assert!((scaler.scale[0] - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(scaler.scale[1], 1.0);

        let z = scaler.transform(&x);
        assert!(z.column(0).sum().abs() < 1e-12);
        assert!(z.column(1).iter().all(|v| *v == 0.0));
    }
}
