//! Left joins: meter readings → building metadata → daily weather.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{
    BuildingMetadata, BuildingTable, DailyWeather, MergedRecord, MergedTable, MeterTable,
    WeatherTable,
};
use crate::resolve::normalize_building_code;

/// Join every reading to its building (`simscode = buildingnumber`, compared as
/// canonical building codes) and its day's weather (`date`).
///
/// Both right-hand sides are keyed to at most one row per key (duplicate
/// building numbers resolve last-wins), so the output has exactly one record per
/// reading. Unmatched keys leave the right-hand side empty.
pub fn merge(meter: &MeterTable, buildings: &BuildingTable, weather: &WeatherTable) -> MergedTable {
    let by_number: HashMap<String, &BuildingMetadata> = buildings
        .buildings
        .iter()
        .map(|b| (normalize_building_code(&b.building_number), b))
        .filter(|(code, _)| !code.is_empty())
        .collect();
    let by_date: HashMap<NaiveDate, &DailyWeather> =
        weather.days.iter().map(|d| (d.date, d)).collect();

    let mut unmatched_buildings = 0usize;
    let mut unmatched_days = 0usize;

    let records: Vec<MergedRecord> = meter
        .readings
        .iter()
        .map(|reading| {
            let building = by_number
                .get(&normalize_building_code(&reading.simscode))
                .map(|b| (*b).clone());
            // The pre-merge projection does not carry `date`; derive it again.
            let date = reading.reading_time.date();
            let weather = by_date.get(&date).map(|w| (*w).clone());
            unmatched_buildings += usize::from(building.is_none());
            unmatched_days += usize::from(weather.is_none());
            MergedRecord {
                reading: reading.clone(),
                building,
                weather,
            }
        })
        .collect();

    log::info!(
        "Merged {} readings ({unmatched_buildings} without building metadata, {unmatched_days} without weather)",
        records.len()
    );

    MergedTable {
        meter_columns: meter.columns.clone(),
        building_columns: buildings.columns.clone(),
        weather_columns: weather.columns.clone(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeterReading;

    fn reading(code: &str, day: u32) -> MeterReading {
        let t = NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        MeterReading {
            simscode: code.to_string(),
            utility: Some("ELECTRICITY".to_string()),
            reading_time: t,
            reading_value: 1.0,
            date: t.date(),
            reading_units: None,
            reading_units_display: None,
        }
    }

    fn building(number: &str, name: &str) -> BuildingMetadata {
        BuildingMetadata {
            building_number: number.to_string(),
            building_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn fixture() -> (MeterTable, BuildingTable, WeatherTable) {
        let meter = MeterTable {
            columns: vec!["simscode".into(), "readingtime".into(), "readingwindowsum".into()],
            readings: vec![reading("1", 1), reading("002", 1), reading("404", 2), reading("1", 3)],
        };
        let buildings = BuildingTable {
            columns: vec!["buildingnumber".into(), "buildingname".into()],
            buildings: vec![building("1", "Old"), building("2", "Hall"), building("001", "New")],
        };
        let weather = WeatherTable {
            columns: vec!["temperature_2m".into()],
            days: vec![
                DailyWeather {
                    date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    values: vec![Some(1.0)],
                },
                DailyWeather {
                    date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                    values: vec![Some(2.0)],
                },
            ],
        };
        (meter, buildings, weather)
    }

    #[test]
    fn row_count_is_preserved() {
        let (meter, buildings, weather) = fixture();
        let merged = merge(&meter, &buildings, &weather);
        assert_eq!(merged.records.len(), meter.readings.len());
    }

    #[test]
    fn unmatched_keys_yield_empty_sides() {
        let (meter, buildings, weather) = fixture();
        let merged = merge(&meter, &buildings, &weather);

        let orphan = &merged.records[2];
        assert_eq!(orphan.reading.simscode, "404");
        assert!(orphan.building.is_none());
        assert!(orphan.weather.is_some());

        assert!(merged.records[3].weather.is_none());
    }

    #[test]
    fn codes_match_after_normalization() {
        let (meter, buildings, weather) = fixture();
        let merged = merge(&meter, &buildings, &weather);
        let name = merged.records[1]
            .building
            .as_ref()
            .and_then(|b| b.building_name.as_deref());
        assert_eq!(name, Some("Hall"));
    }

    #[test]
    fn duplicate_building_numbers_resolve_last_wins() {
        let (meter, buildings, weather) = fixture();
        let merged = merge(&meter, &buildings, &weather);
        let name = merged.records[0]
            .building
            .as_ref()
            .and_then(|b| b.building_name.as_deref());
        assert_eq!(name, Some("New"));
    }
}
