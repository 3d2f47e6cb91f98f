use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{HourlyRecord, SunTable, SunTimes, Timestamp};
use crate::readers::normalizer::HourlyNormalizer;

/// Normalized content of one city's weather (+ optional air-quality) payloads.
#[derive(Debug, Clone, Default)]
pub struct CityObservations {
    /// IANA zone reported by the upstream payload, if any.
    pub timezone: Option<String>,
    pub records: Vec<HourlyRecord>,
    pub sun_table: SunTable,
    pub skipped: usize,
}

/// Reads Open-Meteo forecast and air-quality responses.
///
/// Both APIs return columnar blocks (`"hourly": {"time": [...], "pm2_5": [...]}`);
/// the reader pivots them into per-hour entries, outer-joins weather and air on
/// `time`, and hands the entries to the [`HourlyNormalizer`].
pub struct OpenMeteoReader {
    normalizer: HourlyNormalizer,
}

impl OpenMeteoReader {
    pub fn new() -> Self {
        Self {
            normalizer: HourlyNormalizer::new(),
        }
    }

    pub fn read_files(&self, weather_path: &Path, air_path: Option<&Path>) -> Result<CityObservations> {
        let weather = Self::load_json(weather_path)?;
        let air = air_path.map(Self::load_json).transpose()?;

        let observations = self.read(&weather, air.as_ref());
        info!(
            weather = %weather_path.display(),
            records = observations.records.len(),
            skipped = observations.skipped,
            "Loaded hourly observations"
        );
        Ok(observations)
    }

    fn load_json(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn read(&self, weather: &Value, air: Option<&Value>) -> CityObservations {
        let mut rows = self.hourly_rows(weather);
        if let Some(air) = air {
            rows = Self::merge_rows(rows, self.hourly_rows(air));
        }

        let batch = self.normalizer.normalize_batch(&rows);

        CityObservations {
            timezone: weather
                .get("timezone")
                .and_then(Value::as_str)
                .map(str::to_string),
            records: batch.records,
            sun_table: self.sun_table(weather),
            skipped: batch.skipped,
        }
    }

    /// Pivot the `hourly` block into one JSON object per timestamp.
    ///
    /// Columns whose length differs from `time` are dropped entirely rather
    /// than misaligned.
    pub fn hourly_rows(&self, payload: &Value) -> Vec<Value> {
        let hourly = match payload.get("hourly").and_then(Value::as_object) {
            Some(h) => h,
            None => return Vec::new(),
        };

        let times = match hourly.get("time").and_then(Value::as_array) {
            Some(t) => t,
            None => return Vec::new(),
        };
        let n = times.len();

        let columns: Vec<(&String, &Vec<Value>)> = hourly
            .iter()
            .filter(|(name, _)| name.as_str() != "time")
            .filter_map(|(name, values)| match values.as_array() {
                Some(values) if values.len() == n => Some((name, values)),
                _ => {
                    warn!(column = %name, expected = n, "Ignoring hourly column with mismatched length");
                    None
                }
            })
            .collect();

        (0..n)
            .map(|i| {
                let mut row = Map::new();
                row.insert("time".to_string(), times[i].clone());
                for (name, values) in &columns {
                    row.insert(name.to_string(), values[i].clone());
                }
                Value::Object(row)
            })
            .collect()
    }

    /// Outer join on the `time` key, ordered by time.
    pub fn merge_rows(left: Vec<Value>, right: Vec<Value>) -> Vec<Value> {
        let mut joined: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

        for row in left.into_iter().chain(right) {
            if let Value::Object(map) = row {
                let key = match map.get("time") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => continue,
                };
                let entry = joined.entry(key).or_default();
                for (name, value) in map {
                    // Nulls never clobber a value already joined from the other side
                    if value.is_null() && entry.contains_key(&name) {
                        continue;
                    }
                    entry.insert(name, value);
                }
            }
        }

        debug!(rows = joined.len(), "Joined weather and air-quality rows");
        joined.into_values().map(Value::Object).collect()
    }

    /// Per-date sunrise/sunset from the `daily` block.
    pub fn sun_table(&self, payload: &Value) -> SunTable {
        let mut table = SunTable::new();

        let daily = match payload.get("daily").and_then(Value::as_object) {
            Some(d) => d,
            None => return table,
        };

        let times = daily
            .get("time")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let n = times.len();

        let column = |name: &str| -> Vec<Option<NaiveDateTime>> {
            match daily.get(name).and_then(Value::as_array) {
                Some(values) if values.len() == n => values.iter().map(parse_local_datetime).collect(),
                _ => vec![None; n],
            }
        };
        let sunrises = column("sunrise");
        let sunsets = column("sunset");

        for (i, time) in times.iter().enumerate() {
            let date = match time
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            {
                Some(d) => d,
                None => continue,
            };

            let sun = SunTimes {
                sunrise: sunrises[i],
                sunset: sunsets[i],
            };
            if !sun.is_empty() {
                table.insert(date, sun);
            }
        }

        table
    }
}

impl Default for OpenMeteoReader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_local_datetime(value: &Value) -> Option<NaiveDateTime> {
    match Timestamp::parse(value.as_str()?)? {
        Timestamp::Local(naive) => Some(naive),
        Timestamp::Fixed(dt) => Some(dt.naive_local()),
    }
}
