//! Artifact writers.
//!
//! Each cleaning artifact is built as a `Table` first so the column layout is
//! testable without touching the filesystem, then written with
//! `Table::write_csv`.

use std::path::Path;

use crate::domain::{
    BuildingTable, MergedTable, MeterReading, MeterTable, WeatherTable, DATE_COL,
};
use crate::error::AppError;
use crate::io::table::Table;

/// `%.f` prints nothing for whole seconds.
const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FMT: &str = "%Y-%m-%d";

fn number(v: Option<f64>) -> String {
    v.map(|v| format!("{v}")).unwrap_or_default()
}

fn meter_cell(reading: &MeterReading, column: &str) -> String {
    match column {
        "simscode" => reading.simscode.clone(),
        "utility" => reading.utility.clone().unwrap_or_default(),
        "readingtime" => reading.reading_time.format(TIME_FMT).to_string(),
        "readingunits" => reading.reading_units.clone().unwrap_or_default(),
        "readingunitsdisplay" => reading.reading_units_display.clone().unwrap_or_default(),
        "readingwindowsum" => number(Some(reading.reading_value)),
        _ => String::new(),
    }
}

/// `date` followed by the aggregated weather metrics.
pub fn weather_table(weather: &WeatherTable) -> Table {
    let mut columns = vec![DATE_COL.to_string()];
    columns.extend(weather.columns.iter().cloned());
    let mut table = Table::new(columns);
    table.rows = weather
        .days
        .iter()
        .map(|day| {
            let mut row = vec![day.date.format(DATE_FMT).to_string()];
            row.extend(day.values.iter().map(|v| number(*v)));
            row
        })
        .collect();
    table
}

pub fn buildings_table(buildings: &BuildingTable) -> Table {
    let mut table = Table::new(buildings.columns.clone());
    table.rows = buildings
        .buildings
        .iter()
        .map(|b| {
            buildings
                .columns
                .iter()
                .map(|c| b.field(c).unwrap_or_default().to_string())
                .collect()
        })
        .collect();
    table
}

/// Meter readings projected to their keep-columns (the pre-merge artifact).
pub fn meter_table(meter: &MeterTable) -> Table {
    let mut table = Table::new(meter.columns.clone());
    table.rows = meter
        .readings
        .iter()
        .map(|r| meter.columns.iter().map(|c| meter_cell(r, c)).collect())
        .collect();
    table
}

/// Meter columns, building columns, `date`, then weather columns.
pub fn merged_table(merged: &MergedTable) -> Table {
    let mut columns = merged.meter_columns.clone();
    columns.extend(merged.building_columns.iter().cloned());
    columns.push(DATE_COL.to_string());
    columns.extend(merged.weather_columns.iter().cloned());

    let mut table = Table::new(columns);
    table.rows = merged
        .records
        .iter()
        .map(|rec| {
            let mut row: Vec<String> = merged
                .meter_columns
                .iter()
                .map(|c| meter_cell(&rec.reading, c))
                .collect();
            row.extend(merged.building_columns.iter().map(|c| {
                rec.building
                    .as_ref()
                    .and_then(|b| b.field(c))
                    .unwrap_or_default()
                    .to_string()
            }));
            row.push(rec.reading.reading_time.date().format(DATE_FMT).to_string());
            match &rec.weather {
                Some(w) => row.extend(w.values.iter().map(|v| number(*v))),
                None => row.extend(merged.weather_columns.iter().map(|_| String::new())),
            }
            row
        })
        .collect();
    table
}

/// Write model predictions for a feature table.
///
/// The input's `date` column is carried over when present so rows can be
/// matched back to the input file.
pub fn write_predictions_csv(
    path: &Path,
    input: &Table,
    predictions: &[f64],
    target: &str,
) -> Result<(), AppError> {
    if predictions.len() != input.len() {
        return Err(AppError::internal(format!(
            "Prediction count {} does not match input rows {}",
            predictions.len(),
            input.len()
        )));
    }

    let date_idx = input.column_index(DATE_COL);
    let mut columns = Vec::new();
    if date_idx.is_some() {
        columns.push(DATE_COL.to_string());
    }
    columns.push(target.to_string());

    let mut out = Table::new(columns);
    out.rows = predictions
        .iter()
        .enumerate()
        .map(|(row, p)| {
            let mut cells = Vec::with_capacity(2);
            if let Some(idx) = date_idx {
                cells.push(input.value(row, idx).unwrap_or_default().to_string());
            }
            cells.push(number(Some(*p)));
            cells
        })
        .collect();
    out.write_csv(path)
}
