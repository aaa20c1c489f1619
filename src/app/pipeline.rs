//! Shared pipeline logic behind the `clean` and `train` commands.
//!
//! Keeping this in one place keeps the core workflow out of the front-end:
//! load sources -> outlier filter -> merge -> write artifacts
//!
//! The CLI (and the service, for training) only decide what to print.

use std::fs;
use std::path::PathBuf;

use crate::clean::{drop_outliers, merge};
use crate::domain::{
    CleanConfig, TrainConfig, BUILDING_ARTIFACT, MERGED_ARTIFACT, PREMERGE_ARTIFACT,
    WEATHER_ARTIFACT,
};
use crate::error::AppError;
use crate::io::export::{buildings_table, merged_table, meter_table, weather_table, write_predictions_csv};
use crate::io::ingest::{load_buildings, load_meter, load_weather};
use crate::io::table::Table;
use crate::models::{train_and_evaluate, TrainedModel};

/// Row counts of a cleaning run, plus the artifacts written (in write order).
#[derive(Debug, Clone, PartialEq)]
pub struct CleanSummary {
    pub meter_rows: usize,
    pub outliers_removed: usize,
    pub weather_days: usize,
    pub buildings: usize,
    pub merged_rows: usize,
    pub artifacts: Vec<PathBuf>,
}

/// Run ingestion and merging, writing the four artifacts to `config.out_dir`.
///
/// An error aborts the run; artifacts already written stay in place.
pub fn run_clean(config: &CleanConfig) -> Result<CleanSummary, AppError> {
    fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::io(format!(
            "Failed to create output directory '{}': {e}",
            config.out_dir.display()
        ))
    })?;

    let mut meter = load_meter(config)?;
    let meter_rows = meter.readings.len();
    let outliers = drop_outliers(&mut meter, config.outlier_percentile);

    let mut artifacts = Vec::with_capacity(4);
    let mut write = |name: &str, table: Table| -> Result<(), AppError> {
        let path = config.out_dir.join(name);
        table.write_csv(&path)?;
        log::info!("Wrote {} rows to {}", table.len(), path.display());
        artifacts.push(path);
        Ok(())
    };

    let weather = load_weather(config)?;
    write(WEATHER_ARTIFACT, weather_table(&weather))?;

    let buildings = load_buildings(config)?;
    write(BUILDING_ARTIFACT, buildings_table(&buildings))?;

    write(PREMERGE_ARTIFACT, meter_table(&meter))?;

    let merged = merge(&meter, &buildings, &weather);
    write(MERGED_ARTIFACT, merged_table(&merged))?;

    Ok(CleanSummary {
        meter_rows,
        outliers_removed: outliers.removed,
        weather_days: weather.days.len(),
        buildings: buildings.buildings.len(),
        merged_rows: merged.records.len(),
        artifacts,
    })
}

/// Train/evaluate, then optionally predict a weather CSV into `out`.
pub fn run_train(
    config: &TrainConfig,
    predict: Option<(&PathBuf, &PathBuf)>,
) -> Result<TrainedModel, AppError> {
    let trained = train_and_evaluate(config)?;

    if let Some((input, out)) = predict {
        if !input.is_file() {
            return Err(AppError::missing_file(format!("Missing {}", input.display())));
        }
        let table = Table::read_csv(input)?;
        let predictions = trained.model.predict_table(&table)?;
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::io(format!("Failed to create '{}': {e}", parent.display()))
            })?;
        }
        write_predictions_csv(out, &table, &predictions, &trained.model.target_name)?;
        log::info!("Wrote {} predictions to {}", predictions.len(), out.display());
    }

    Ok(trained)
}
