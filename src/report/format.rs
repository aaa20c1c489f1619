//! Terminal output for the `clean`, `train` and `resolve` commands.

use crate::app::pipeline::CleanSummary;
use crate::domain::TrainConfig;
use crate::models::TrainedModel;

/// Summary of a cleaning run: row counts per stage and the files written.
pub fn format_clean_summary(summary: &CleanSummary) -> String {
    let mut out = String::new();

    out.push_str("=== be - cleaning run ===\n");
    out.push_str(&format!(
        "Meter readings: {} loaded, {} outliers removed\n",
        summary.meter_rows, summary.outliers_removed
    ));
    out.push_str(&format!("Weather days: {}\n", summary.weather_days));
    out.push_str(&format!("Buildings: {}\n", summary.buildings));
    out.push_str(&format!("Merged rows: {}\n", summary.merged_rows));

    out.push_str("\nArtifacts:\n");
    for path in &summary.artifacts {
        out.push_str(&format!("- {}\n", path.display()));
    }

    out
}

/// Dataset shape, split, coefficients and held-out metrics of a training run.
pub fn format_train_summary(trained: &TrainedModel, config: &TrainConfig) -> String {
    let model = &trained.model;
    let eval = &trained.evaluation;
    let mut out = String::new();

    out.push_str("=== be - daily usage model ===\n");
    out.push_str(&format!(
        "Data: {} | utility={} | target={}{}\n",
        config.dataset.merged_path.display(),
        config.dataset.utility,
        model.target_name,
        if config.dataset.target_as_mean { " (daily mean per reading)" } else { " (daily sum)" },
    ));
    out.push_str(&format!(
        "Rows: n={} | train={} | test={}\n",
        trained.dataset_rows, eval.n_train, eval.n_test
    ));
    if let (Some(first), Some(last)) = (eval.test_dates.first(), eval.test_dates.last()) {
        out.push_str(&format!(
            "Test dates: {first} .. {last} ({} days)\n",
            eval.test_dates.len()
        ));
    }

    out.push_str(&format!("\nRidge (alpha={}):\n", config.model.alpha));
    out.push_str(
        format!("{:<24} {:>12} {:>12} {:>12}\n", "feature", "coef", "mean", "std").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<12} {:-<12} {:-<12}\n", "", "", "", "").trim_end());
    out.push('\n');
    for (j, name) in model.feature_names.iter().enumerate() {
        out.push_str(&format!(
            "{:<24} {:>12.4} {:>12.4} {:>12.4}\n",
            truncate(name, 24),
            model.coefficients[j],
            model.scaler.mean[j],
            model.scaler.scale[j],
        ));
    }
    let p = model.feature_names.len();
    for (k, code) in model.building_codes.iter().enumerate() {
        out.push_str(&format!(
            "{:<24} {:>12.4}\n",
            truncate(&format!("building={code}"), 24),
            model.coefficients[p + k]
        ));
    }
    out.push_str(&format!("{:<24} {:>12.4}\n", "(intercept)", model.intercept));

    out.push_str("\nTest metrics:\n");
    out.push_str(&format!("- MAE : {:.3}\n", eval.mae));
    out.push_str(&format!("- RMSE: {:.3}\n", eval.rmse));
    match eval.mae_pct {
        Some(pct) => out.push_str(&format!("- MAE % of mean target: {pct:.3} %\n")),
        None => out.push_str("- MAE % of mean target: n/a (mean target is 0)\n"),
    }

    out
}

pub fn format_resolution(query: &str, codes: &[String]) -> String {
    format!("{query} -> {}", codes.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetConfig, Evaluation, ModelConfig, SplitConfig};
    use crate::math::StandardScaler;
    use crate::models::RegressionModel;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn trained(mae_pct: Option<f64>) -> TrainedModel {
        TrainedModel {
            model: RegressionModel {
                feature_names: vec!["temperature_2m".into()],
                target_name: "readingwindowsum".into(),
                building_codes: vec!["44".into()],
                scaler: StandardScaler {
                    mean: vec![3.0],
                    scale: vec![2.0],
                },
                coefficients: vec![1.5, -0.25],
                intercept: 12.0,
            },
            evaluation: Evaluation {
                mae: 1.0,
                rmse: 1.25,
                mae_pct,
                n_train: 20,
                n_test: 7,
                test_dates: vec![
                    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
                ],
            },
            dataset_rows: 27,
        }
    }

    fn config() -> TrainConfig {
        TrainConfig {
            dataset: DatasetConfig::new(PathBuf::from("cleaned_data/merged.csv")),
            split: SplitConfig::default(),
            model: ModelConfig::default(),
        }
    }

    #[test]
    fn train_summary_lists_coefficients_and_metrics() {
        let text = format_train_summary(&trained(Some(4.5)), &config());
        assert!(text.contains("train=20 | test=7"));
        assert!(text.contains("2025-03-01 .. 2025-03-07"));
        assert!(text.contains("building=44"));
        assert!(text.contains("(intercept)"));
        assert!(text.contains("MAE % of mean target: 4.500 %"));
    }

    #[test]
    fn zero_mean_target_has_no_percentage() {
        let text = format_train_summary(&trained(None), &config());
        assert!(text.contains("n/a"));
    }

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
