//! Train + evaluate: dataset → split → model → held-out metrics.

use crate::dataset::{build_dataset, split_dataset, Dataset};
use crate::domain::{Evaluation, ModelConfig, SplitConfig, TrainConfig};
use crate::error::AppError;
use crate::models::model::RegressionModel;

/// A fitted model plus how it did on the held-out dates.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: RegressionModel,
    pub evaluation: Evaluation,
    pub dataset_rows: usize,
}

/// Load the merged artifact, build the dataset and train on it.
pub fn train_and_evaluate(config: &TrainConfig) -> Result<TrainedModel, AppError> {
    let dataset = build_dataset(&config.dataset)?;
    train_on_dataset(&dataset, &config.split, &config.model)
}

pub fn train_on_dataset(
    dataset: &Dataset,
    split: &SplitConfig,
    model: &ModelConfig,
) -> Result<TrainedModel, AppError> {
    if dataset.is_empty() {
        return Err(AppError::validation("No rows to train on after filtering"));
    }

    let split = split_dataset(dataset, split);
    let fitted = RegressionModel::fit(dataset, &split.train, model)?;

    let predicted = fitted.predict_rows(dataset, &split.test);
    let actual: Vec<f64> = split.test.iter().map(|&i| dataset.rows[i].target).collect();
    let (mae, rmse, mae_pct) = error_metrics(&actual, &predicted);

    log::info!(
        "Trained on {} rows, tested on {} rows: MAE={mae:.3} RMSE={rmse:.3}",
        split.train.len(),
        split.test.len()
    );

    Ok(TrainedModel {
        model: fitted,
        evaluation: Evaluation {
            mae,
            rmse,
            mae_pct,
            n_train: split.train.len(),
            n_test: split.test.len(),
            test_dates: split.test_dates,
        },
        dataset_rows: dataset.len(),
    })
}

/// MAE, RMSE and MAE as a percentage of the mean actual value.
///
/// The percentage is `None` when the mean actual value is zero.
pub fn error_metrics(actual: &[f64], predicted: &[f64]) -> (f64, f64, Option<f64>) {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return (0.0, 0.0, None);
    }
    let nf = n as f64;
    let (abs_sum, sq_sum) = actual
        .iter()
        .zip(predicted)
        .fold((0.0, 0.0), |(a, s), (y, p)| (a + (y - p).abs(), s + (y - p).powi(2)));
    let mae = abs_sum / nf;
    let rmse = (sq_sum / nf).sqrt();
    let mean = actual.iter().take(n).sum::<f64>() / nf;
    let mae_pct = (mean != 0.0).then(|| mae / mean * 100.0);
    (mae, rmse, mae_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildingFilter, DatasetConfig, SERVICE_FEATURE_COLS};
    use crate::io::table::Table;
    use chrono::NaiveDate;

    #[test]
    fn metrics() {
        let (mae, rmse, pct) = error_metrics(&[10.0, 20.0], &[12.0, 16.0]);
        assert_eq!(mae, 3.0);
        assert!((rmse - 10.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(pct, Some(20.0));

        let (_, _, pct) = error_metrics(&[1.0, -1.0], &[0.0, 0.0]);
        assert_eq!(pct, None);
    }

    /// Ten days, one building, target exactly linear in the weather.
    fn write_merged(path: &std::path::Path) {
        let mut t = Table::new(
            [
                "simscode",
                "utility",
                "readingtime",
                "readingwindowsum",
                "buildingnumber",
                "buildingname",
                "date",
                "precipitation",
                "temperature_2m",
                "wind_speed_10m",
            ]
            .map(String::from)
            .to_vec(),
        );
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        for (i, date) in start.iter_days().take(10).enumerate() {
            let d = i as f64;
            let (precip, temp, wind) = (d * d * 0.1, d - 3.0, ((i * 7) % 5) as f64);
            let y = 500.0 - 4.0 * precip + 12.0 * temp + 2.5 * wind;
            // Two readings per day; the daily mean target equals `y`.
            for (hour, value) in [(1, y - 10.0), (13, y + 10.0)] {
                t.rows.push(vec![
                    "044".into(),
                    "ELECTRICITY".into(),
                    format!("{date} {hour:02}:00:00"),
                    format!("{value}"),
                    "044".into(),
                    "Dreese Laboratories".into(),
                    date.to_string(),
                    format!("{precip}"),
                    format!("{temp}"),
                    format!("{wind}"),
                ]);
            }
        }
        t.write_csv(path).unwrap();
    }

    #[test]
    fn end_to_end_linear_building_is_learned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        write_merged(&path);

        let mut dataset = DatasetConfig::new(path);
        dataset.filter = BuildingFilter::Include(vec!["44".to_string()]);
        dataset.features = SERVICE_FEATURE_COLS.iter().map(|c| c.to_string()).collect();
        let config = TrainConfig {
            dataset,
            split: SplitConfig {
                window: 3,
                ..SplitConfig::default()
            },
            model: ModelConfig { alpha: 1e-8 },
        };

        let trained = train_and_evaluate(&config).unwrap();
        assert_eq!(trained.dataset_rows, 10);
        assert_eq!(trained.evaluation.n_train, 7);
        assert_eq!(trained.evaluation.n_test, 3);
        assert_eq!(
            trained.evaluation.test_dates.first().copied(),
            NaiveDate::from_ymd_opt(2025, 1, 13)
        );
        assert!(trained.evaluation.mae < 1e-3, "mae = {}", trained.evaluation.mae);

        let precip_temp_wind = [0.4, 5.0, 1.0];
        let y = trained.model.predict_one(&precip_temp_wind, None).unwrap();
        let expected = 500.0 - 4.0 * 0.4 + 12.0 * 5.0 + 2.5;
        assert!((y - expected).abs() < 1e-3, "got {y}, expected {expected}");
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let ds = Dataset {
            feature_names: vec!["temperature_2m".into()],
            target_name: "readingwindowsum".into(),
            grouped_by_building: false,
            rows: Vec::new(),
        };
        let err = train_on_dataset(&ds, &SplitConfig::default(), &ModelConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
