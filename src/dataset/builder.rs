//! Merged artifact → daily feature matrix + target vector.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{BuildingFilter, DatasetConfig, DATE_COL};
use crate::error::AppError;
use crate::io::ingest::{parse_number, parse_timestamp};
use crate::io::table::Table;
use crate::resolve::{looks_like_code, normalize_building_code, BuildingDirectory};

/// One aggregated group: a date, or a (date, building) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub date: NaiveDate,
    /// Set only when grouping by building.
    pub building_code: Option<String>,
    /// Aligned with `Dataset::feature_names`.
    pub features: Vec<f64>,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub grouped_by_building: bool,
    /// Sorted by date, then building code.
    pub rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

/// Load the merged artifact and build the dataset.
pub fn build_dataset(config: &DatasetConfig) -> Result<Dataset, AppError> {
    if !config.merged_path.is_file() {
        return Err(AppError::missing_file(format!(
            "Missing {}. Build it with: be clean",
            config.merged_path.display()
        )));
    }
    let table = Table::read_csv(&config.merged_path)?;
    dataset_from_table(&table, config)
}

pub fn dataset_from_table(table: &Table, config: &DatasetConfig) -> Result<Dataset, AppError> {
    let missing: Vec<&str> = config
        .features
        .iter()
        .chain(std::iter::once(&config.target))
        .map(String::as_str)
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::schema(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    // Older artifacts lack `date`; derive it from `readingtime`.
    let date_idx = table
        .column_index(DATE_COL)
        .or_else(|| table.column_index("readingtime"))
        .ok_or_else(|| AppError::schema("Missing required columns: date"))?;
    let code_idx = table.column_index("simscode");
    let utility_idx = table.column_index("utility");
    let target_idx = table.column_index(&config.target).unwrap_or_default();
    let feature_idx: Vec<usize> = config
        .features
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    if config.group_by_building && code_idx.is_none() {
        return Err(AppError::schema(
            "Grouping by building requires a `simscode` column",
        ));
    }
    let filter = BuildingSelection::new(&config.filter, table, code_idx.is_some())?;

    let mut groups: BTreeMap<(NaiveDate, Option<String>), GroupAcc> = BTreeMap::new();
    let mut filtered = 0usize;
    let mut incomplete = 0usize;

    for row in 0..table.len() {
        if let Some(idx) = utility_idx {
            let utility = table.value(row, idx).unwrap_or_default();
            if !utility.eq_ignore_ascii_case(&config.utility) {
                filtered += 1;
                continue;
            }
        }

        let code = code_idx
            .map(|idx| normalize_building_code(table.value(row, idx).unwrap_or_default()));
        if !filter.keeps(code.as_deref()) {
            filtered += 1;
            continue;
        }

        let date = table.value(row, date_idx).and_then(parse_timestamp).map(|t| t.date());
        let target = table.value(row, target_idx).and_then(parse_number);
        let features: Option<Vec<f64>> = feature_idx
            .iter()
            .map(|&idx| table.value(row, idx).and_then(parse_number))
            .collect();
        let (Some(date), Some(target), Some(features)) = (date, target, features) else {
            incomplete += 1;
            continue;
        };

        let key = (date, if config.group_by_building { code } else { None });
        groups
            .entry(key)
            .or_insert_with(|| GroupAcc::new(features.len()))
            .add(&features, target);
    }

    log::info!(
        "Dataset: {} rows filtered out, {incomplete} dropped for missing values, {} groups",
        filtered,
        groups.len()
    );
    if groups.is_empty() {
        log::warn!(
            "No {} rows left after filtering {}",
            config.utility,
            config.merged_path.display()
        );
    }

    let rows = groups
        .into_iter()
        .map(|((date, building_code), acc)| acc.finish(date, building_code, config.target_as_mean))
        .collect();

    Ok(Dataset {
        feature_names: config.features.clone(),
        target_name: config.target.clone(),
        grouped_by_building: config.group_by_building,
        rows,
    })
}

/// Build filter with every name resolved to codes.
enum BuildingSelection {
    All,
    Exclude(BTreeSet<String>),
    Include(BTreeSet<String>),
}

impl BuildingSelection {
    fn new(filter: &BuildingFilter, table: &Table, has_codes: bool) -> Result<Self, AppError> {
        match filter {
            BuildingFilter::All => Ok(Self::All),
            BuildingFilter::Exclude(_) if !has_codes => {
                log::warn!("No `simscode` column; building exclusions are ignored");
                Ok(Self::All)
            }
            BuildingFilter::Include(_) if !has_codes => Err(AppError::schema(
                "Selecting buildings requires a `simscode` column",
            )),
            BuildingFilter::Exclude(entries) => Ok(Self::Exclude(resolve_entries(entries, table)?)),
            BuildingFilter::Include(entries) => Ok(Self::Include(resolve_entries(entries, table)?)),
        }
    }

    fn keeps(&self, code: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Exclude(codes) => code.is_none_or(|c| !codes.contains(c)),
            Self::Include(codes) => code.is_some_and(|c| codes.contains(c)),
        }
    }
}

/// Codes pass through normalization; names go through the resolver.
fn resolve_entries(entries: &[String], table: &Table) -> Result<BTreeSet<String>, AppError> {
    let mut directory: Option<BuildingDirectory> = None;
    let mut codes = BTreeSet::new();
    for entry in entries {
        if looks_like_code(entry) {
            codes.insert(normalize_building_code(entry));
            continue;
        }
        let dir = match &mut directory {
            Some(dir) => dir,
            slot => slot.insert(BuildingDirectory::from_merged(table)?),
        };
        codes.extend(dir.resolve(entry, true)?);
    }
    Ok(codes)
}

struct GroupAcc {
    feature_sums: Vec<f64>,
    target_sum: f64,
    n: usize,
}

impl GroupAcc {
    fn new(width: usize) -> Self {
        Self {
            feature_sums: vec![0.0; width],
            target_sum: 0.0,
            n: 0,
        }
    }

    fn add(&mut self, features: &[f64], target: f64) {
        for (sum, v) in self.feature_sums.iter_mut().zip(features) {
            *sum += v;
        }
        self.target_sum += target;
        self.n += 1;
    }

    fn finish(self, date: NaiveDate, building_code: Option<String>, target_as_mean: bool) -> DatasetRow {
        let n = self.n as f64;
        DatasetRow {
            date,
            building_code,
            features: self.feature_sums.iter().map(|s| s / n).collect(),
            target: if target_as_mean {
                self.target_sum / n
            } else {
                self.target_sum
            },
        }
    }
}
