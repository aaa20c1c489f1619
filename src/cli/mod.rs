//! Command-line parsing for the building energy pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline/model code: every subcommand's arguments convert into the plain
//! config structs in `crate::domain`. Paths and the listen address fall back to
//! `BE_*` environment variables (a `.env` file is loaded first).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    BuildingFilter, CleanConfig, DatasetConfig, ModelConfig, ServiceConfig, SplitConfig,
    TrainConfig, BUILDING_FILE, DEFAULT_EXCLUDED_CODES, DEFAULT_RIDGE_ALPHA,
    DEFAULT_TARGET_BUILDINGS, DEFAULT_TEST_WINDOW, DEFAULT_UTILITY, MERGED_ARTIFACT,
    METER_PATTERN, OUTLIER_PERCENTILE, SERVICE_FEATURE_COLS, WEATHER_FILE,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "be", version, about = "Campus building energy: clean, train, serve")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest raw exports and write the cleaned/merged artifacts.
    Clean(CleanArgs),
    /// Train and evaluate the daily usage model; optionally predict from a weather CSV.
    Train(TrainArgs),
    /// Resolve a building name to its building code(s).
    Resolve(ResolveArgs),
    /// Run the prediction HTTP API.
    Serve(ServeArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CleanArgs {
    /// Source directories, searched in order (comma-separated in the env var).
    #[arg(
        long = "data-dir",
        env = "BE_DATA_DIRS",
        value_delimiter = ',',
        default_values_t = [String::from("advanced_core"), String::from("advanced_bonus")]
    )]
    pub data_dirs: Vec<String>,

    /// Output directory for the cleaned artifacts (created if absent).
    #[arg(long, env = "BE_OUT_DIR", default_value = "cleaned_data")]
    pub out_dir: PathBuf,

    /// Glob pattern for meter-reading exports.
    #[arg(long, default_value = METER_PATTERN)]
    pub meter_pattern: String,

    /// Hourly weather file name.
    #[arg(long, default_value = WEATHER_FILE)]
    pub weather_file: String,

    /// Building metadata file name.
    #[arg(long, default_value = BUILDING_FILE)]
    pub building_file: String,

    /// Per-utility percentile above which readings are dropped.
    #[arg(long, default_value_t = OUTLIER_PERCENTILE)]
    pub outlier_percentile: f64,
}

/// Where the merged artifact lives.
#[derive(Debug, Args, Clone)]
pub struct MergedArgs {
    /// Merged artifact written by `be clean`.
    #[arg(long, env = "BE_MERGED")]
    pub merged: Option<PathBuf>,

    /// Output directory of `be clean` (used when `--merged` is not given).
    #[arg(long, env = "BE_OUT_DIR", default_value = "cleaned_data")]
    pub out_dir: PathBuf,
}

impl MergedArgs {
    pub fn path(&self) -> PathBuf {
        self.merged
            .clone()
            .unwrap_or_else(|| self.out_dir.join(MERGED_ARTIFACT))
    }
}

/// Ridge and split options shared by `train` and `serve`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// L2 penalty.
    #[arg(long, default_value_t = DEFAULT_RIDGE_ALPHA)]
    pub alpha: f64,

    /// Number of trailing dates held out for evaluation.
    #[arg(long, default_value_t = DEFAULT_TEST_WINDOW)]
    pub window: usize,

    /// Use the daily summed target instead of the per-reading daily mean.
    #[arg(long)]
    pub target_sum: bool,

    /// Utility to model (case-insensitive).
    #[arg(long, default_value = DEFAULT_UTILITY)]
    pub utility: String,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub merged: MergedArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Buildings (codes or names) to leave out. Defaults to the electric substation.
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["include", "all_buildings"])]
    pub exclude: Vec<String>,

    /// Only these buildings (codes or names).
    #[arg(long, value_delimiter = ',', conflicts_with = "all_buildings")]
    pub include: Vec<String>,

    /// Keep every building, including the substation.
    #[arg(long)]
    pub all_buildings: bool,

    /// One row per (date, building) with a one-hot building code.
    #[arg(long)]
    pub by_building: bool,

    /// Train on the three service features only.
    #[arg(long)]
    pub service_features: bool,

    /// Daily weather CSV to predict from.
    #[arg(long, value_name = "CSV")]
    pub predict: Option<PathBuf>,

    /// Output CSV for predictions.
    #[arg(long, value_name = "CSV", default_value = "data/predictions.csv")]
    pub out: PathBuf,

    /// Skip the evaluation printout.
    #[arg(long)]
    pub no_eval: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ResolveArgs {
    /// Building name or alias.
    pub name: String,

    #[command(flatten)]
    pub merged: MergedArgs,

    /// Return every matching code instead of failing on ambiguity.
    #[arg(long)]
    pub allow_multiple: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub merged: MergedArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, env = "BE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "BE_PORT", default_value_t = 8001)]
    pub port: u16,

    /// Building names to serve (comma-separated). Defaults to the campus shortlist.
    #[arg(long = "target", env = "BE_TARGETS", value_delimiter = ',')]
    pub targets: Vec<String>,
}

impl From<&CleanArgs> for CleanConfig {
    fn from(args: &CleanArgs) -> Self {
        let mut config = CleanConfig::new(
            args.data_dirs.iter().map(PathBuf::from).collect(),
            args.out_dir.clone(),
        );
        config.meter_pattern = args.meter_pattern.clone();
        config.weather_file = args.weather_file.clone();
        config.building_file = args.building_file.clone();
        config.outlier_percentile = args.outlier_percentile;
        config
    }
}

fn train_config(merged: &MergedArgs, model: &ModelArgs) -> TrainConfig {
    let mut dataset = DatasetConfig::new(merged.path());
    dataset.utility = model.utility.clone();
    dataset.target_as_mean = !model.target_sum;
    TrainConfig {
        dataset,
        split: SplitConfig {
            window: model.window,
            ..SplitConfig::default()
        },
        model: ModelConfig { alpha: model.alpha },
    }
}

impl From<&TrainArgs> for TrainConfig {
    fn from(args: &TrainArgs) -> Self {
        let mut config = train_config(&args.merged, &args.model);
        config.dataset.filter = if args.all_buildings {
            BuildingFilter::All
        } else if !args.include.is_empty() {
            BuildingFilter::Include(args.include.clone())
        } else if !args.exclude.is_empty() {
            BuildingFilter::Exclude(args.exclude.clone())
        } else {
            BuildingFilter::Exclude(DEFAULT_EXCLUDED_CODES.iter().map(|c| c.to_string()).collect())
        };
        config.dataset.group_by_building = args.by_building;
        if args.service_features {
            config.dataset.features = SERVICE_FEATURE_COLS.iter().map(|c| c.to_string()).collect();
        }
        config
    }
}

impl From<&ServeArgs> for ServiceConfig {
    fn from(args: &ServeArgs) -> Self {
        let mut train = train_config(&args.merged, &args.model);
        train.dataset.features = SERVICE_FEATURE_COLS.iter().map(|c| c.to_string()).collect();
        let targets = if args.targets.is_empty() {
            DEFAULT_TARGET_BUILDINGS.iter().map(|t| t.to_string()).collect()
        } else {
            args.targets.clone()
        };
        ServiceConfig {
            host: args.host.clone(),
            port: args.port,
            targets,
            train,
        }
    }
}
