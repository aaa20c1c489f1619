//! Column-name normalization.
//!
//! Source exports drift in how they spell column names (`Reading Time`,
//! `reading-time`, `readingtime`). Every table is normalized once after it is
//! loaded; after that, all lookups use canonical names.

use super::table::Table;

/// Legacy meter spellings, applied only when the canonical column is absent.
pub const METER_ALIASES: [(&str, &str); 5] = [
    ("reading_time", "readingtime"),
    ("reading_window_sum", "readingwindowsum"),
    ("sims_code", "simscode"),
    ("reading_units", "readingunits"),
    ("reading_units_display", "readingunitsdisplay"),
];

pub const BUILDING_ALIASES: [(&str, &str); 3] = [
    ("building_number", "buildingnumber"),
    ("building_name", "buildingname"),
    ("campus_name", "campusname"),
];

/// Lower-case, trim, and turn spaces/hyphens into underscores.
pub fn normalize_column_name(name: &str) -> String {
    // Excel exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim_start_matches('\u{feff}').trim();
    name.to_lowercase().replace([' ', '-'], "_")
}

pub fn normalize_columns(table: &mut Table) {
    for col in table.columns.iter_mut() {
        *col = normalize_column_name(col);
    }
}

/// Rename each alias to its canonical name unless the canonical name already exists.
pub fn apply_aliases(table: &mut Table, aliases: &[(&str, &str)]) {
    for &(alias, canonical) in aliases {
        if table.has_column(canonical) {
            continue;
        }
        if let Some(idx) = table.column_index(alias) {
            table.columns[idx] = canonical.to_string();
        }
    }
}
