//! Canonical building codes.
//!
//! Meter exports carry `simscode` and the metadata carries `buildingnumber`,
//! and both show up as `79`, `079`, `79.0` or `" 79 "` depending on the export.
//! Every comparison between codes goes through `normalize_building_code`.

/// Canonical digit string for a building code.
///
/// Order of attempts:
/// 1. trim; empty stays empty
/// 2. a number with an integral value becomes that integer (`"79.0"` → `"79"`)
/// 3. otherwise keep the digits and drop leading zeros (`"079"` → `"79"`,
///    `"000"` → `"0"`, no digits at all → `""`)
pub fn normalize_building_code(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }

    if let Ok(v) = s.parse::<f64>() {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
            return format!("{}", v as i64);
        }
    }

    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Is this filter entry a code (digits) rather than a building name?
pub fn looks_like_code(entry: &str) -> bool {
    let s = entry.trim();
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zeros_and_floats_collapse() {
        assert_eq!(normalize_building_code("079"), "79");
        assert_eq!(normalize_building_code("79"), "79");
        assert_eq!(normalize_building_code(" 79.0 "), "79");
        assert_eq!(normalize_building_code("0079"), normalize_building_code("79"));
    }

    #[test]
    fn fallbacks() {
        assert_eq!(normalize_building_code(""), "");
        assert_eq!(normalize_building_code("   "), "");
        assert_eq!(normalize_building_code("000"), "0");
        assert_eq!(normalize_building_code("B-044"), "44");
        assert_eq!(normalize_building_code("n/a"), "");
        // Non-integral numbers fall through to digit stripping.
        assert_eq!(normalize_building_code("12.5"), "125");
    }

    #[test]
    fn code_detection() {
        assert!(looks_like_code("079"));
        assert!(!looks_like_code("Ohio Union"));
        assert!(!looks_like_code(""));
    }
}
