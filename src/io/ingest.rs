//! Source discovery and ingestion.
//!
//! This module turns the raw facilities exports into typed tables:
//!
//! - meter readings (many monthly files, concatenated)
//! - hourly weather (one file, aggregated to days)
//! - building metadata (one file)
//!
//! Bad rows are dropped and counted, never fatal. Missing files and missing
//! required columns are fatal.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;

use crate::clean::daily::aggregate_daily;
use crate::domain::{
    BuildingMetadata, BuildingTable, CleanConfig, MeterReading, MeterTable, WeatherTable,
    BUILDING_KEEP_COLS, DATE_COL, METER_KEEP_COLS, WEATHER_FEATURE_COLS,
};
use crate::error::AppError;
use crate::io::columns::{apply_aliases, normalize_columns, BUILDING_ALIASES, METER_ALIASES};
use crate::io::table::Table;

/// First directory (in configured order) that contains `filename`.
pub fn find_file(dirs: &[PathBuf], filename: &str) -> Option<PathBuf> {
    dirs.iter().map(|d| d.join(filename)).find(|p| p.is_file())
}

/// All files matching `pattern` directly inside any of `dirs`, sorted by path.
pub fn find_matching_files(dirs: &[PathBuf], pattern: &str) -> Result<Vec<PathBuf>, AppError> {
    let mut paths = Vec::new();
    for dir in dirs {
        let full = format!(
            "{}/{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            pattern
        );
        let entries = glob::glob(&full)
            .map_err(|e| AppError::configuration(format!("Invalid file pattern '{pattern}': {e}")))?;
        paths.extend(entries.filter_map(Result::ok).filter(|p| p.is_file()));
    }
    paths.sort();
    Ok(paths)
}

/// Load, concatenate and validate every meter-readings export.
pub fn load_meter(config: &CleanConfig) -> Result<MeterTable, AppError> {
    let paths = find_matching_files(&config.data_dirs, &config.meter_pattern)?;
    if paths.is_empty() {
        return Err(AppError::configuration(format!(
            "No meter files found with pattern {} in {}",
            config.meter_pattern,
            display_dirs(&config.data_dirs)
        )));
    }

    let tables = paths
        .par_iter()
        .map(|path| {
            let mut table = Table::read_csv(path)?;
            normalize_columns(&mut table);
            // Per file: exports with different spellings still line up after concat.
            apply_aliases(&mut table, &METER_ALIASES);
            log::debug!("Read {} meter rows from {}", table.len(), path.display());
            Ok(table)
        })
        .collect::<Result<Vec<Table>, AppError>>()?;

    let table = Table::concat(tables);

    let meter = meter_from_table(&table)?;
    log::info!(
        "Loaded {} meter readings from {} file(s)",
        meter.readings.len(),
        paths.len()
    );
    Ok(meter)
}

/// Typed meter readings from an already normalized/aliased table.
pub fn meter_from_table(table: &Table) -> Result<MeterTable, AppError> {
    let time_idx = require_column(table, "readingtime")?;
    let code_idx = require_column(table, "simscode")?;
    let value_idx = require_column(table, "readingwindowsum")?;
    let utility_idx = table.column_index("utility");
    let units_idx = table.column_index("readingunits");
    let units_display_idx = table.column_index("readingunitsdisplay");

    let columns = METER_KEEP_COLS
        .iter()
        .filter(|c| table.has_column(c))
        .map(|c| c.to_string())
        .collect();

    let mut readings = Vec::with_capacity(table.len());
    let mut bad_time = 0usize;
    let mut bad_value = 0usize;

    for row in 0..table.len() {
        let Some(reading_time) = table.value(row, time_idx).and_then(parse_timestamp) else {
            bad_time += 1;
            continue;
        };
        let Some(reading_value) = table.value(row, value_idx).and_then(parse_number) else {
            bad_value += 1;
            continue;
        };

        readings.push(MeterReading {
            simscode: table.value(row, code_idx).unwrap_or_default().to_string(),
            utility: optional_text(table, row, utility_idx),
            reading_time,
            reading_value,
            date: reading_time.date(),
            reading_units: optional_text(table, row, units_idx),
            reading_units_display: optional_text(table, row, units_display_idx),
        });
    }

    if bad_time > 0 || bad_value > 0 {
        log::info!(
            "Dropped meter rows: {bad_time} with unparseable readingtime, {bad_value} with non-numeric readingwindowsum"
        );
    }

    Ok(MeterTable { columns, readings })
}

/// Load hourly weather and aggregate it to one row per calendar date.
pub fn load_weather(config: &CleanConfig) -> Result<WeatherTable, AppError> {
    let path = require_file(&config.data_dirs, &config.weather_file)?;
    let mut table = Table::read_csv(&path)?;
    normalize_columns(&mut table);
    weather_from_table(&table)
}

pub fn weather_from_table(table: &Table) -> Result<WeatherTable, AppError> {
    let date_idx = require_column(table, DATE_COL)?;

    // Only numeric allowlisted metrics are aggregated.
    let mut columns = Vec::new();
    let mut indices = Vec::new();
    for name in WEATHER_FEATURE_COLS {
        let Some(idx) = table.column_index(name) else {
            continue;
        };
        if is_numeric_column(table, idx) {
            columns.push(name.to_string());
            indices.push(idx);
        } else {
            log::warn!("Weather column `{name}` is not numeric; skipping it");
        }
    }

    let mut hourly: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::with_capacity(table.len());
    let mut bad_date = 0usize;
    for row in 0..table.len() {
        let Some(ts) = table.value(row, date_idx).and_then(parse_timestamp) else {
            bad_date += 1;
            continue;
        };
        let values = indices
            .iter()
            .map(|&idx| table.value(row, idx).and_then(parse_number))
            .collect();
        hourly.push((ts.date(), values));
    }

    if bad_date > 0 {
        log::info!("Dropped {bad_date} weather rows with unparseable date");
    }

    let weather = aggregate_daily(columns, &hourly);
    log::info!(
        "Aggregated {} hourly weather rows into {} days",
        hourly.len(),
        weather.days.len()
    );
    Ok(weather)
}

/// Load building metadata projected to the known building columns.
pub fn load_buildings(config: &CleanConfig) -> Result<BuildingTable, AppError> {
    let path = require_file(&config.data_dirs, &config.building_file)?;
    let mut table = Table::read_csv(&path)?;
    normalize_columns(&mut table);
    apply_aliases(&mut table, &BUILDING_ALIASES);
    buildings_from_table(&table)
}

pub fn buildings_from_table(table: &Table) -> Result<BuildingTable, AppError> {
    let number_idx = require_column(table, "buildingnumber")?;
    let idx = |name: &str| table.column_index(name);
    let (name_idx, campus_idx, city_idx, lat_idx, long_idx) = (
        idx("buildingname"),
        idx("campusname"),
        idx("city"),
        idx("latitude"),
        idx("longitude"),
    );

    let columns = BUILDING_KEEP_COLS
        .iter()
        .filter(|c| table.has_column(c))
        .map(|c| c.to_string())
        .collect();

    let buildings = (0..table.len())
        .map(|row| BuildingMetadata {
            building_number: table.value(row, number_idx).unwrap_or_default().to_string(),
            building_name: optional_text(table, row, name_idx),
            campus_name: optional_text(table, row, campus_idx),
            city: optional_text(table, row, city_idx),
            latitude: optional_text(table, row, lat_idx),
            longitude: optional_text(table, row, long_idx),
        })
        .collect();

    Ok(BuildingTable { columns, buildings })
}

/// Parse a timestamp in any of the export formats seen so far.
///
/// Offset-bearing timestamps keep their local wall-clock time, so the derived
/// calendar date is the date at the measurement site.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const OFFSET_FMTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%z",
    ];
    const NAIVE_FMTS: [&str; 9] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FMTS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Cell values that mean "no value" in exported CSVs (the pandas defaults).
pub const NA_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_marker(s: &str) -> bool {
    NA_MARKERS.contains(&s.trim())
}

/// Parse a finite number; anything else counts as missing.
pub fn parse_number(s: &str) -> Option<f64> {
    if is_na_marker(s) {
        return None;
    }
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Every non-missing cell parses as a number.
fn is_numeric_column(table: &Table, idx: usize) -> bool {
    (0..table.len())
        .filter_map(|row| table.value(row, idx))
        .filter(|v| !is_na_marker(v))
        .all(|v| v.parse::<f64>().is_ok())
}

fn optional_text(table: &Table, row: usize, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| table.value(row, i)).map(str::to_string)
}

fn require_column(table: &Table, name: &str) -> Result<usize, AppError> {
    table
        .column_index(name)
        .ok_or_else(|| AppError::schema(format!("Missing required column: `{name}`")))
}

fn require_file(dirs: &[PathBuf], filename: &str) -> Result<PathBuf, AppError> {
    find_file(dirs, filename).ok_or_else(|| {
        AppError::missing_file(format!("Missing {filename} in {}", display_dirs(dirs)))
    })
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    let parts: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
    format!("[{}]", parts.join(", "))
}
