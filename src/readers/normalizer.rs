use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use tracing::{debug, warn};

use crate::models::{HourlyRecord, Timestamp};

/// Canonical hourly concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Temperature,
    ApparentTemperature,
    RelativeHumidity,
    Precipitation,
    WindSpeed,
    WindDirection,
    WeatherCode,
    Pm25,
    Pm10,
    DewPoint,
}

/// Candidate source names per concept, primary name first.
pub const FIELD_ALIASES: [(Field, &[&str]); 11] = [
    (Field::Timestamp, &["time", "timestamp", "datetime", "date_time"]),
    (Field::Temperature, &["temperature", "temperature_2m", "temp", "feels_like"]),
    (Field::ApparentTemperature, &["apparent_temperature", "feels_like"]),
    (
        Field::RelativeHumidity,
        &["relative_humidity", "relative_humidity_2m", "rh", "humidity"],
    ),
    (Field::Precipitation, &["precipitation", "precip", "rain"]),
    (Field::WindSpeed, &["wind_speed", "wind_speed_10m", "wind"]),
    (
        Field::WindDirection,
        &["wind_direction", "wind_direction_10m", "wind_dir", "wind_deg"],
    ),
    (Field::WeatherCode, &["weather_code", "weathercode", "wcode"]),
    (Field::Pm25, &["pm25", "pm2_5", "pm2.5"]),
    (Field::Pm10, &["pm10"]),
    (Field::DewPoint, &["dew_point", "dew_point_2m", "dewpoint"]),
];

impl Field {
    pub fn aliases(&self) -> &'static [&'static str] {
        FIELD_ALIASES
            .iter()
            .find(|(field, _)| field == self)
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Temperature => "temperature",
            Field::ApparentTemperature => "apparent_temperature",
            Field::RelativeHumidity => "relative_humidity",
            Field::Precipitation => "precipitation",
            Field::WindSpeed => "wind_speed",
            Field::WindDirection => "wind_direction",
            Field::WeatherCode => "weather_code",
            Field::Pm25 => "pm25",
            Field::Pm10 => "pm10",
            Field::DewPoint => "dew_point",
        }
    }

    /// Physically meaningful values. Anything outside is treated as absent.
    pub fn domain(&self) -> RangeInclusive<f64> {
        match self {
            Field::Temperature | Field::DewPoint => -90.0..=60.0,
            Field::ApparentTemperature => -90.0..=70.0,
            Field::RelativeHumidity => 0.0..=100.0,
            Field::WindDirection => 0.0..=360.0,
            Field::WeatherCode => 0.0..=99.0,
            Field::Precipitation | Field::WindSpeed | Field::Pm25 | Field::Pm10 => {
                0.0..=f64::MAX
            }
            Field::Timestamp => f64::MIN..=f64::MAX,
        }
    }

    /// Domain for one source name. A `feels_like` value standing in for the
    /// temperature keeps the apparent-temperature range.
    fn alias_domain(&self, name: &str) -> RangeInclusive<f64> {
        if *self == Field::Temperature && Field::ApparentTemperature.aliases().contains(&name) {
            Field::ApparentTemperature.domain()
        } else {
            self.domain()
        }
    }
}

/// Result of normalizing a batch of raw entries.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<HourlyRecord>,
    /// Entries dropped for a missing or unparseable timestamp.
    pub skipped: usize,
}

/// Turns loosely named raw hourly entries into [`HourlyRecord`]s.
pub struct HourlyNormalizer;

impl HourlyNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one raw entry. Returns `None` only when no usable timestamp
    /// exists; bad measurements become `None` fields instead.
    pub fn normalize(&self, raw: &Map<String, Value>) -> Option<HourlyRecord> {
        let timestamp = Field::Timestamp
            .aliases()
            .iter()
            .find_map(|name| raw.get(*name).and_then(parse_timestamp))?;

        Some(HourlyRecord {
            timestamp,
            temperature: self.resolve_number(raw, Field::Temperature),
            apparent_temperature: self.resolve_number(raw, Field::ApparentTemperature),
            relative_humidity: self.resolve_number(raw, Field::RelativeHumidity),
            precipitation: self.resolve_number(raw, Field::Precipitation),
            wind_speed: self.resolve_number(raw, Field::WindSpeed),
            wind_direction: self.resolve_number(raw, Field::WindDirection),
            weather_code: self.resolve_weather_code(raw),
            pm25: self.resolve_number(raw, Field::Pm25),
            pm10: self.resolve_number(raw, Field::Pm10),
            dew_point: self.resolve_number(raw, Field::DewPoint),
        })
    }

    pub fn normalize_value(&self, raw: &Value) -> Option<HourlyRecord> {
        raw.as_object().and_then(|map| self.normalize(map))
    }

    pub fn normalize_batch<'a, I>(&self, raws: I) -> NormalizedBatch
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut batch = NormalizedBatch::default();

        for raw in raws {
            match self.normalize_value(raw) {
                Some(record) => batch.records.push(record),
                None => batch.skipped += 1,
            }
        }

        if batch.skipped > 0 {
            warn!(
                skipped = batch.skipped,
                kept = batch.records.len(),
                "Dropped hourly entries without a usable timestamp"
            );
        } else {
            debug!(kept = batch.records.len(), "Normalized hourly entries");
        }

        batch
    }

    /// First candidate that holds a usable number wins.
    fn resolve_number(&self, raw: &Map<String, Value>, field: Field) -> Option<f64> {
        field.aliases().iter().find_map(|name| {
            raw.get(*name)
                .and_then(parse_number)
                .filter(|v| field.alias_domain(name).contains(v))
        })
    }

    fn resolve_weather_code(&self, raw: &Map<String, Value>) -> Option<u8> {
        self.resolve_number(raw, Field::WeatherCode)
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as u8)
    }
}

impl Default for HourlyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::String(s) => Timestamp::parse(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|v| v.is_finite() && v.fract() == 0.0)
                    .map(|v| v as i64)
            })
            .and_then(Timestamp::from_unix),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn normalize(raw: Value) -> Option<HourlyRecord> {
        HourlyNormalizer::new().normalize_value(&raw)
    }

    #[test]
    fn test_canonical_fields() {
        let record = normalize(json!({
            "time": "2024-03-01T10:00",
            "temperature_2m": 27.4,
            "precipitation": 0.6,
            "relative_humidity_2m": 81,
            "wind_speed_10m": 9.0,
            "wind_direction_10m": 270,
            "weather_code": 61,
            "pm2_5": 33.1,
            "pm10": 48.0,
            "dew_point_2m": 22.0
        }))
        .unwrap();

        assert_eq!(record.temperature, Some(27.4));
        assert_eq!(record.precipitation, Some(0.6));
        assert_eq!(record.relative_humidity, Some(81.0));
        assert_eq!(record.wind_direction, Some(270.0));
        assert_eq!(record.weather_code, Some(61));
        assert_eq!(record.pm25, Some(33.1));
        assert_eq!(record.pm10, Some(48.0));
        assert_eq!(record.dew_point, Some(22.0));
        assert_eq!(
            record.timestamp.local_date(&chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_alias_priority() {
        let record = normalize(json!({
            "time": "2024-03-01T10:00",
            "temp": 25.0,
            "feels_like": 28.0,
            "wind_dir": 90,
            "wind_deg": 180,
            "rain": 2.5
        }))
        .unwrap();

        // `temp` outranks `feels_like`; `feels_like` still fills apparent temperature
        assert_eq!(record.temperature, Some(25.0));
        assert_eq!(record.apparent_temperature, Some(28.0));
        assert_eq!(record.wind_direction, Some(90.0));
        assert_eq!(record.precipitation, Some(2.5));
    }

    #[test]
    fn test_feels_like_fallback_for_temperature() {
        let record = normalize(json!({"time": "2024-03-01T10:00", "feels_like": 29.5})).unwrap();
        assert_eq!(record.temperature, Some(29.5));
    }

    #[test]
    fn test_feels_like_fallback_keeps_apparent_range() {
        let record = normalize(json!({"time": "2024-03-01T10:00", "feels_like": 65.0})).unwrap();
        assert_eq!(record.temperature, Some(65.0));
        assert_eq!(record.apparent_temperature, Some(65.0));

        // A real temperature column is still held to the air-temperature range
        let record = normalize(json!({"time": "2024-03-01T10:00", "temp": 65.0})).unwrap();
        assert_eq!(record.temperature, None);
    }

    #[test]
    fn test_absent_fields_stay_undefined() {
        let record = normalize(json!({"time": "2024-03-01T10:00"})).unwrap();

        assert_eq!(record.temperature, None);
        assert_eq!(record.precipitation, None);
        assert_eq!(record.pm25, None);
        assert_eq!(record.weather_code, None);
    }

    #[test]
    fn test_non_numeric_values_become_undefined() {
        let record = normalize(json!({
            "time": "2024-03-01T10:00",
            "temperature": "n/a",
            "precipitation": null,
            "pm25": "17.5",
            "pm10": -3.0,
            "weather_code": 2.5,
            "relative_humidity": 140
        }))
        .unwrap();

        assert_eq!(record.temperature, None);
        assert_eq!(record.precipitation, None);
        assert_eq!(record.pm25, Some(17.5));
        assert_eq!(record.pm10, None);
        assert_eq!(record.weather_code, None);
        assert_eq!(record.relative_humidity, None);
    }

    #[test]
    fn test_unusable_primary_falls_back_to_alias() {
        let record = normalize(json!({
            "time": "2024-03-01T10:00",
            "precipitation": "--",
            "precip": 1.5
        }))
        .unwrap();
        assert_eq!(record.precipitation, Some(1.5));
    }

    #[test]
    fn test_records_without_timestamp_are_skipped() {
        let raws = vec![
            json!({"time": "2024-03-01T10:00", "temperature": 20.0}),
            json!({"temperature": 21.0}),
            json!({"time": "not a time", "temperature": 22.0}),
            json!("garbage"),
            json!({"timestamp": 1_709_287_200, "temperature": 23.0}),
            json!({"timestamp": 1_709_290_800.0, "temperature": 24.0}),
            json!({"timestamp": 1_709_290_800.5, "temperature": 25.0}),
        ];

        let batch = HourlyNormalizer::new().normalize_batch(&raws);
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.skipped, 4);
        assert_eq!(batch.records[1].temperature, Some(23.0));
        assert_eq!(batch.records[2].temperature, Some(24.0));
        assert_eq!(batch.records[2].timestamp, Timestamp::from_unix(1_709_290_800).unwrap());
    }

    #[test]
    fn test_every_field_has_aliases() {
        for (field, names) in FIELD_ALIASES {
            assert!(!names.is_empty(), "{} has no aliases", field.canonical_name());
            assert_eq!(field.aliases(), names);
        }
    }
}
