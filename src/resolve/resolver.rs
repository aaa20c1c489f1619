//! Building name → building code(s).

use std::collections::BTreeSet;

use crate::error::AppError;
use crate::io::table::Table;
use crate::resolve::codes::normalize_building_code;

/// Informal names mapped to the metadata's canonical building name.
pub const BUILDING_NAME_ALIASES: [(&str, &str); 2] = [
    ("RPAC", "Recreation and Physical Activity Center"),
    ("Dreese Labs", "Dreese Laboratories"),
];

/// Known (building name, canonical code) pairs.
#[derive(Debug, Clone, Default)]
pub struct BuildingDirectory {
    entries: Vec<(String, String)>,
}

impl BuildingDirectory {
    /// Pairs are deduplicated; codes are normalized on the way in.
    pub fn new<I, N, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: AsRef<str>,
    {
        let set: BTreeSet<(String, String)> = pairs
            .into_iter()
            .map(|(name, code)| (name.into(), normalize_building_code(code.as_ref())))
            .collect();
        Self {
            entries: set.into_iter().collect(),
        }
    }

    /// Distinct `(buildingname, simscode)` pairs of a merged table.
    ///
    /// Falls back to `buildingnumber` when `simscode` is absent.
    pub fn from_merged(table: &Table) -> Result<Self, AppError> {
        let name_idx = table
            .column_index("buildingname")
            .ok_or_else(|| AppError::schema("Merged data has no `buildingname` column"))?;
        let code_idx = table
            .column_index("simscode")
            .or_else(|| table.column_index("buildingnumber"))
            .ok_or_else(|| {
                AppError::schema("Merged data has neither `simscode` nor `buildingnumber`")
            })?;

        let pairs = (0..table.len()).filter_map(|row| {
            Some((
                table.value(row, name_idx)?.to_string(),
                table.value(row, code_idx)?.to_string(),
            ))
        });
        Ok(Self::new(pairs))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a free-text building name.
    ///
    /// Alias first, then case-insensitive substring match; several matching
    /// names are narrowed to those that start with the query when any do.
    /// Returns the distinct codes sorted ascending. With `allow_multiple =
    /// false`, more than one remaining code is a validation error.
    pub fn resolve(&self, query: &str, allow_multiple: bool) -> Result<Vec<String>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("Building name is empty"));
        }

        let canonical = BUILDING_NAME_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(query))
            .map(|(_, name)| *name)
            .unwrap_or(query);
        let needle = canonical.to_lowercase();

        let mut matches: Vec<&(String, String)> = self
            .entries
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .collect();
        if matches.is_empty() {
            return Err(AppError::not_found(format!("No building matches '{query}'")));
        }

        let names: BTreeSet<&str> = matches.iter().map(|(name, _)| name.as_str()).collect();
        if names.len() > 1 {
            let prefixed: Vec<&(String, String)> = matches
                .iter()
                .copied()
                .filter(|(name, _)| name.to_lowercase().starts_with(&needle))
                .collect();
            if !prefixed.is_empty() {
                matches = prefixed;
            }
        }

        let codes: Vec<String> = matches
            .iter()
            .map(|(_, code)| code.clone())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();

        match codes.len() {
            0 => Err(AppError::not_found(format!(
                "Building '{query}' has no usable building code"
            ))),
            1 => Ok(codes),
            _ if allow_multiple => {
                log::info!(
                    "'{query}' matches {} buildings; using codes {}",
                    codes.len(),
                    codes.join(", ")
                );
                Ok(codes)
            }
            _ => {
                let candidates: Vec<String> = matches
                    .iter()
                    .map(|(name, code)| format!("{name} ({code})"))
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                Err(AppError::validation(format!(
                    "'{query}' is ambiguous: {}",
                    candidates.join(", ")
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn directory() -> BuildingDirectory {
        BuildingDirectory::new([
            ("Recreation and Physical Activity Center", "079.0"),
            ("Ohio Union", "0123"),
            ("Ohio Union South Garage", "124"),
            ("Dreese Laboratories", "44"),
            ("Thompson Library", "15"),
            ("Thompson Library", "015"),
            ("Physics Research Building", "300"),
            ("Biomedical Research Tower", "301"),
        ])
    }

    #[test]
    fn alias_and_canonical_name_agree() {
        let dir = directory();
        let via_alias = dir.resolve("rpac", false).unwrap();
        let via_name = dir
            .resolve("Recreation and Physical Activity Center", false)
            .unwrap();
        assert_eq!(via_alias, via_name);
        assert_eq!(via_alias, vec!["79"]);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let err = directory().resolve("Hogwarts", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn duplicate_codes_collapse() {
        assert_eq!(directory().resolve("thompson", false).unwrap(), vec!["15"]);
    }

    #[test]
    fn prefix_matches_narrow_the_set() {
        // Both names contain "ohio union"; both also start with it.
        let codes = directory().resolve("Ohio Union", true).unwrap();
        assert_eq!(codes, vec!["123", "124"]);

        // "research" is contained in two names, neither starts with it.
        let codes = directory().resolve("research", true).unwrap();
        assert_eq!(codes, vec!["300", "301"]);

        assert_eq!(directory().resolve("physics", false).unwrap(), vec!["300"]);
    }

    #[test]
    fn ambiguity_without_allow_multiple() {
        let err = directory().resolve("research", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("Physics Research Building (300)"));
    }

    #[test]
    fn prefix_narrowing_picks_single_building() {
        let dir = BuildingDirectory::new([("Union Hall", "1"), ("Ohio Union", "2")]);
        assert_eq!(dir.resolve("union", false).unwrap(), vec!["1"]);
    }

    #[test]
    fn directory_from_merged_table() {
        let mut table = Table::new(vec!["simscode".into(), "buildingname".into()]);
        table.rows = vec![
            vec!["44".into(), "Dreese Laboratories".into()],
            vec!["044".into(), "Dreese Laboratories".into()],
            vec!["".into(), "Nowhere".into()],
        ];
        let dir = BuildingDirectory::from_merged(&table).unwrap();
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.resolve("Dreese Labs", false).unwrap(), vec!["44"]);
    }
}
