//! Shared domain types.
//!
//! These types are the typed form of the tables that flow through the pipeline:
//!
//! - ingested meter readings, daily weather, building metadata
//! - merged per-reading records (the cleaned artifact)
//! - configuration for the cleaning run, the dataset builder and the trainer

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

/// Glob pattern for meter-reading exports inside each source directory.
pub const METER_PATTERN: &str = "meter-readings-*.csv";
pub const WEATHER_FILE: &str = "weather_data_hourly_2025.csv";
pub const BUILDING_FILE: &str = "building_metadata.csv";

pub const WEATHER_ARTIFACT: &str = "weather_daily_selected.csv";
pub const BUILDING_ARTIFACT: &str = "building_metadata_selected.csv";
pub const PREMERGE_ARTIFACT: &str = "meter_premerge_selected.csv";
pub const MERGED_ARTIFACT: &str = "meter_building_weather_merged.csv";

pub const OUTLIER_PERCENTILE: f64 = 0.999;

/// Hourly weather metrics kept after daily aggregation.
pub const WEATHER_FEATURE_COLS: [&str; 6] = [
    "temperature_2m",
    "shortwave_radiation",
    "relative_humidity_2m",
    "precipitation",
    "wind_speed_10m",
    "cloud_cover",
];

/// Metrics aggregated with a daily SUM; every other metric uses the daily MEAN.
pub const SUMMED_WEATHER_COLS: [&str; 2] = ["precipitation", "shortwave_radiation"];

pub const BUILDING_KEEP_COLS: [&str; 6] = [
    "buildingnumber",
    "buildingname",
    "campusname",
    "city",
    "latitude",
    "longitude",
];

pub const METER_KEEP_COLS: [&str; 6] = [
    "simscode",
    "utility",
    "readingtime",
    "readingunits",
    "readingunitsdisplay",
    "readingwindowsum",
];

pub const TARGET_COL: &str = "readingwindowsum";
pub const DATE_COL: &str = "date";

/// Features accepted by the prediction service.
pub const SERVICE_FEATURE_COLS: [&str; 3] = ["precipitation", "temperature_2m", "wind_speed_10m"];

pub const DEFAULT_UTILITY: &str = "ELECTRICITY";
/// OSU Electric Substation (buildingnumber 079) meters the whole campus.
pub const DEFAULT_EXCLUDED_CODES: [&str; 1] = ["79"];
pub const DEFAULT_TEST_WINDOW: usize = 7;
/// Jan–Apr and Sep–Nov: regular semester occupancy.
pub const DEFAULT_SEMESTER_MONTHS: [u32; 7] = [1, 2, 3, 4, 9, 10, 11];
pub const DEFAULT_RIDGE_ALPHA: f64 = 1.0;

/// Building names served by default; resolved against the merged artifact at startup.
pub const DEFAULT_TARGET_BUILDINGS: [&str; 4] = [
    "RPAC",
    "Thompson Library",
    "Ohio Union",
    "Dreese Laboratories",
];

/// One validated meter reading.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterReading {
    /// Building code as exported (trimmed, not digit-normalized).
    pub simscode: String,
    pub utility: Option<String>,
    pub reading_time: NaiveDateTime,
    /// `readingwindowsum`: quantity accumulated over the reading window.
    pub reading_value: f64,
    pub date: NaiveDate,
    pub reading_units: Option<String>,
    pub reading_units_display: Option<String>,
}

/// Meter readings plus the keep-columns that were present in the sources.
#[derive(Debug, Clone, Default)]
pub struct MeterTable {
    pub columns: Vec<String>,
    pub readings: Vec<MeterReading>,
}

impl MeterTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// One calendar day of aggregated weather, aligned with `WeatherTable::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct WeatherTable {
    /// Metric columns (allowlisted, in allowlist order).
    pub columns: Vec<String>,
    /// Sorted by date, one row per date.
    pub days: Vec<DailyWeather>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingMetadata {
    pub building_number: String,
    pub building_name: Option<String>,
    pub campus_name: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl BuildingMetadata {
    /// Value for one of `BUILDING_KEEP_COLS`.
    pub fn field(&self, column: &str) -> Option<&str> {
        match column {
            "buildingnumber" => Some(self.building_number.as_str()),
            "buildingname" => self.building_name.as_deref(),
            "campusname" => self.campus_name.as_deref(),
            "city" => self.city.as_deref(),
            "latitude" => self.latitude.as_deref(),
            "longitude" => self.longitude.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildingTable {
    pub columns: Vec<String>,
    pub buildings: Vec<BuildingMetadata>,
}

/// One meter reading left-joined to its building and its day's weather.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    pub reading: MeterReading,
    pub building: Option<BuildingMetadata>,
    pub weather: Option<DailyWeather>,
}

#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    pub meter_columns: Vec<String>,
    pub building_columns: Vec<String>,
    pub weather_columns: Vec<String>,
    pub records: Vec<MergedRecord>,
}

/// Inputs and outputs of a cleaning run.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Searched in order; the first directory containing a single file wins.
    pub data_dirs: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub meter_pattern: String,
    pub weather_file: String,
    pub building_file: String,
    pub outlier_percentile: f64,
}

impl CleanConfig {
    pub fn new(data_dirs: Vec<PathBuf>, out_dir: PathBuf) -> Self {
        Self {
            data_dirs,
            out_dir,
            meter_pattern: METER_PATTERN.to_string(),
            weather_file: WEATHER_FILE.to_string(),
            building_file: BUILDING_FILE.to_string(),
            outlier_percentile: OUTLIER_PERCENTILE,
        }
    }
}

/// Which buildings take part in a dataset.
///
/// Entries are building codes (digits) or building names; names go through
/// the entity resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingFilter {
    All,
    Exclude(Vec<String>),
    Include(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub merged_path: PathBuf,
    /// Case-insensitive exact match on `utility`.
    pub utility: String,
    pub filter: BuildingFilter,
    pub group_by_building: bool,
    /// Divide each group's summed target by its pre-aggregation row count.
    pub target_as_mean: bool,
    pub features: Vec<String>,
    pub target: String,
}

impl DatasetConfig {
    pub fn new(merged_path: PathBuf) -> Self {
        Self {
            merged_path,
            utility: DEFAULT_UTILITY.to_string(),
            filter: BuildingFilter::Exclude(
                DEFAULT_EXCLUDED_CODES.iter().map(|c| c.to_string()).collect(),
            ),
            group_by_building: false,
            target_as_mean: true,
            features: WEATHER_FEATURE_COLS.iter().map(|c| c.to_string()).collect(),
            target: TARGET_COL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub window: usize,
    pub preferred_months: BTreeSet<u32>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_TEST_WINDOW,
            preferred_months: DEFAULT_SEMESTER_MONTHS.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// L2 penalty on the standardized coefficients (intercept unpenalized).
    pub alpha: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_RIDGE_ALPHA,
        }
    }
}

/// Everything needed to train and evaluate one model.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub dataset: DatasetConfig,
    pub split: SplitConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Building names (or aliases) exposed by the service, in display order.
    pub targets: Vec<String>,
    /// Template for per-building training; the building filter is replaced per key.
    pub train: TrainConfig,
}

/// Held-out accuracy of a trained model.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub mae: f64,
    pub rmse: f64,
    /// `None` when the mean test target is zero.
    pub mae_pct: Option<f64>,
    pub n_train: usize,
    pub n_test: usize,
    pub test_dates: Vec<NaiveDate>,
}
