//! Hourly → daily weather aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DailyWeather, WeatherTable, SUMMED_WEATHER_COLS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DailyAgg {
    Sum,
    Mean,
}

impl DailyAgg {
    fn for_metric(name: &str) -> Self {
        if SUMMED_WEATHER_COLS.contains(&name) {
            DailyAgg::Sum
        } else {
            DailyAgg::Mean
        }
    }
}

/// Collapse observations to one row per calendar date.
///
/// `hourly` values are aligned with `columns`. Missing values are skipped; a day
/// with no values for a metric gets a sum of `0.0` or a missing mean.
pub fn aggregate_daily(columns: Vec<String>, hourly: &[(NaiveDate, Vec<Option<f64>>)]) -> WeatherTable {
    let aggs: Vec<DailyAgg> = columns.iter().map(|c| DailyAgg::for_metric(c)).collect();

    // Per date, per column: (sum, count).
    let mut acc: BTreeMap<NaiveDate, Vec<(f64, usize)>> = BTreeMap::new();
    for (date, values) in hourly {
        let slot = acc
            .entry(*date)
            .or_insert_with(|| vec![(0.0, 0); columns.len()]);
        for (cell, value) in slot.iter_mut().zip(values) {
            if let Some(v) = value {
                cell.0 += v;
                cell.1 += 1;
            }
        }
    }

    let days = acc
        .into_iter()
        .map(|(date, cells)| DailyWeather {
            date,
            values: cells
                .iter()
                .zip(&aggs)
                .map(|(&(sum, n), agg)| match agg {
                    DailyAgg::Sum => Some(sum),
                    DailyAgg::Mean if n > 0 => Some(sum / n as f64),
                    DailyAgg::Mean => None,
                })
                .collect(),
        })
        .collect();

    WeatherTable { columns, days }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn one_row_per_date_sorted() {
        let cols = vec!["cloud_cover".to_string(), "shortwave_radiation".to_string()];
        let hourly = vec![
            (d(2), vec![Some(10.0), Some(100.0)]),
            (d(1), vec![Some(20.0), Some(50.0)]),
            (d(2), vec![Some(30.0), Some(200.0)]),
            (d(1), vec![None, Some(25.0)]),
        ];
        let w = aggregate_daily(cols, &hourly);

        assert_eq!(w.days.len(), 2);
        assert_eq!(w.days[0].date, d(1));
        assert_eq!(w.days[0].values, vec![Some(20.0), Some(75.0)]);
        assert_eq!(w.days[1].values, vec![Some(20.0), Some(300.0)]);
    }

    #[test]
    fn empty_metric_day() {
        let cols = vec!["temperature_2m".to_string(), "precipitation".to_string()];
        let w = aggregate_daily(cols, &[(d(5), vec![None, None])]);
        assert_eq!(w.days[0].values, vec![None, Some(0.0)]);
    }
}
