use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};

/// Formats accepted for wall-clock timestamps without an offset.
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Observation time of an hourly record.
///
/// `Local` timestamps are wall-clock times already expressed in the city's
/// timezone (Open-Meteo returns these when queried with `timezone=`). `Fixed`
/// timestamps carry an explicit offset and are converted when bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Fixed(DateTime<FixedOffset>),
    Local(NaiveDateTime),
}

impl Timestamp {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Timestamp::Fixed(dt));
        }

        for format in LOCAL_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Timestamp::Local(naive));
            }
        }

        // Bare dates mean local midnight
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Timestamp::Local)
    }

    /// Unix epoch seconds, UTC.
    pub fn from_unix(seconds: i64) -> Option<Self> {
        Utc.timestamp_opt(seconds, 0)
            .single()
            .map(|dt| Timestamp::Fixed(dt.fixed_offset()))
    }

    /// Wall-clock time of this instant in `tz`.
    pub fn local_datetime(&self, tz: &Tz) -> NaiveDateTime {
        match self {
            Timestamp::Local(naive) => *naive,
            Timestamp::Fixed(dt) => dt.with_timezone(tz).naive_local(),
        }
    }

    /// Calendar day this instant falls on in `tz`.
    pub fn local_date(&self, tz: &Tz) -> NaiveDate {
        self.local_datetime(tz).date()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Fixed(dt) => write!(f, "{}", dt.to_rfc3339()),
            Timestamp::Local(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// One canonical hourly observation. Every measurement is optional; absence
/// means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HourlyRecord {
    pub timestamp: Timestamp,

    // May hold a feels-like fallback, so it shares the apparent range
    #[validate(range(min = -90.0, max = 70.0))]
    pub temperature: Option<f64>,

    #[validate(range(min = -90.0, max = 70.0))]
    pub apparent_temperature: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub relative_humidity: Option<f64>,

    // mm over the hour
    #[validate(range(min = 0.0))]
    pub precipitation: Option<f64>,

    // km/h
    #[validate(range(min = 0.0))]
    pub wind_speed: Option<f64>,

    #[validate(range(min = 0.0, max = 360.0))]
    pub wind_direction: Option<f64>,

    #[validate(range(max = 99))]
    pub weather_code: Option<u8>,

    // µg/m³
    #[validate(range(min = 0.0))]
    pub pm25: Option<f64>,

    #[validate(range(min = 0.0))]
    pub pm10: Option<f64>,

    #[validate(range(min = -90.0, max = 60.0))]
    pub dew_point: Option<f64>,
}

impl HourlyRecord {
    /// Record with a timestamp and no measurements.
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            temperature: None,
            apparent_temperature: None,
            relative_humidity: None,
            precipitation: None,
            wind_speed: None,
            wind_direction: None,
            weather_code: None,
            pm25: None,
            pm10: None,
            dew_point: None,
        }
    }

    pub fn builder() -> HourlyRecordBuilder {
        HourlyRecordBuilder::new()
    }

    pub fn local_date(&self, tz: &Tz) -> NaiveDate {
        self.timestamp.local_date(tz)
    }

    pub fn has_air_quality(&self) -> bool {
        self.pm25.is_some() || self.pm10.is_some()
    }
}

#[derive(Default)]
pub struct HourlyRecordBuilder {
    timestamp: Option<Timestamp>,
    temperature: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity: Option<f64>,
    precipitation: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    weather_code: Option<u8>,
    pm25: Option<f64>,
    pm10: Option<f64>,
    dew_point: Option<f64>,
}

impl HourlyRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Convenience for tests and fixtures: parses `s` with [`Timestamp::parse`].
    pub fn time(mut self, s: &str) -> Self {
        self.timestamp = Timestamp::parse(s);
        self
    }

    pub fn temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn apparent_temperature(mut self, celsius: f64) -> Self {
        self.apparent_temperature = Some(celsius);
        self
    }

    pub fn relative_humidity(mut self, percent: f64) -> Self {
        self.relative_humidity = Some(percent);
        self
    }

    pub fn precipitation(mut self, mm: f64) -> Self {
        self.precipitation = Some(mm);
        self
    }

    pub fn wind(mut self, speed: f64, direction: f64) -> Self {
        self.wind_speed = Some(speed);
        self.wind_direction = Some(direction);
        self
    }

    pub fn weather_code(mut self, code: u8) -> Self {
        self.weather_code = Some(code);
        self
    }

    pub fn pm25(mut self, value: f64) -> Self {
        self.pm25 = Some(value);
        self
    }

    pub fn pm10(mut self, value: f64) -> Self {
        self.pm10 = Some(value);
        self
    }

    pub fn dew_point(mut self, celsius: f64) -> Self {
        self.dew_point = Some(celsius);
        self
    }

    pub fn build(self) -> Result<HourlyRecord> {
        let record = HourlyRecord {
            timestamp: self
                .timestamp
                .ok_or_else(|| ProcessingError::MissingData("timestamp".to_string()))?,
            temperature: self.temperature,
            apparent_temperature: self.apparent_temperature,
            relative_humidity: self.relative_humidity,
            precipitation: self.precipitation,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            weather_code: self.weather_code,
            pm25: self.pm25,
            pm10: self.pm10,
            dew_point: self.dew_point,
        };

        record.validate()?;
        Ok(record)
    }
}
