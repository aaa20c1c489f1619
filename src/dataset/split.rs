//! Semester-aware trailing test window.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::dataset::builder::Dataset;
use crate::domain::SplitConfig;

/// Row indices on each side of the split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    pub test_dates: Vec<NaiveDate>,
}

/// Pick the dates held out for evaluation.
///
/// Prefers the last `window` dates that fall in the preferred months. Falls back
/// to the last `window` dates overall, then to the single latest date.
pub fn select_test_dates(dates: &BTreeSet<NaiveDate>, config: &SplitConfig) -> BTreeSet<NaiveDate> {
    let preferred: Vec<NaiveDate> = dates
        .iter()
        .copied()
        .filter(|d| config.preferred_months.contains(&d.month()))
        .collect();

    if config.window > 0 && preferred.len() >= config.window {
        return preferred[preferred.len() - config.window..].iter().copied().collect();
    }
    if config.window > 0 && dates.len() >= config.window {
        return dates.iter().rev().take(config.window).copied().collect();
    }
    dates.iter().next_back().copied().into_iter().collect()
}

/// Split a dataset by date: every row on a test date is held out.
pub fn split_dataset(dataset: &Dataset, config: &SplitConfig) -> TrainTestSplit {
    let test_dates = select_test_dates(&dataset.dates(), config);
    let (test, train): (Vec<usize>, Vec<usize>) =
        (0..dataset.len()).partition(|&i| test_dates.contains(&dataset.rows[i].date));

    log::debug!(
        "Split: {} train rows, {} test rows over {} test dates",
        train.len(),
        test.len(),
        test_dates.len()
    );

    TrainTestSplit {
        train,
        test,
        test_dates: test_dates.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(start: NaiveDate, n: usize) -> BTreeSet<NaiveDate> {
        start.iter_days().take(n).collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn last_window_of_preferred_months() {
        let dates = days(ymd(2025, 3, 1), 30);
        let test = select_test_dates(&dates, &SplitConfig::default());
        let expected: BTreeSet<NaiveDate> = dates.iter().rev().take(7).copied().collect();
        assert_eq!(test, expected);
        assert_eq!(test.iter().next().copied(), Some(ymd(2025, 3, 24)));
    }

    #[test]
    fn summer_tail_is_skipped_in_favour_of_semester_days() {
        // April 20 .. June 8: the trailing days are in May/June.
        let dates = days(ymd(2025, 4, 20), 50);
        let test = select_test_dates(&dates, &SplitConfig::default());
        assert_eq!(test, days(ymd(2025, 4, 24), 7));
    }

    #[test]
    fn falls_back_to_all_dates_outside_semester() {
        let dates = days(ymd(2025, 6, 1), 20);
        let test = select_test_dates(&dates, &SplitConfig::default());
        assert_eq!(test, days(ymd(2025, 6, 14), 7));
    }

    #[test]
    fn short_range_uses_latest_date() {
        let dates = days(ymd(2025, 1, 1), 3);
        let test = select_test_dates(&dates, &SplitConfig::default());
        assert_eq!(test, BTreeSet::from([ymd(2025, 1, 3)]));
    }

    #[test]
    fn empty_input() {
        assert!(select_test_dates(&BTreeSet::new(), &SplitConfig::default()).is_empty());
    }
}
