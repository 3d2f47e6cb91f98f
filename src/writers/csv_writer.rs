use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

use crate::classifiers::{Pm25Category, WeatherCondition};
use crate::error::{ProcessingError, Result};
use crate::models::{DailyRow, Timestamp};
use crate::utils::constants::OUTPUT_DECIMALS;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn round_opt(value: Option<f64>) -> Option<f64> {
    value.map(|v| round_to(v, OUTPUT_DECIMALS))
}

pub(crate) fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Copy of `row` with every measured value rounded for output.
pub fn rounded(row: &DailyRow) -> DailyRow {
    DailyRow {
        temp_min: round_opt(row.temp_min),
        temp_max: round_opt(row.temp_max),
        total_rain: round_to(row.total_rain, OUTPUT_DECIMALS),
        pm25_avg: round_opt(row.pm25_avg),
        pm10_avg: round_opt(row.pm10_avg),
        feels_like_avg: round_opt(row.feels_like_avg),
        dew_point_avg: round_opt(row.dew_point_avg),
        wind_speed_max: round_opt(row.wind_speed_max),
        ..row.clone()
    }
}

/// Sun times as Open-Meteo prints them (`2024-03-01T05:48`) or with seconds.
fn deserialize_sun_time<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if text.trim().is_empty() {
        return Ok(None);
    }

    match Timestamp::parse(&text) {
        Some(Timestamp::Local(naive)) => Ok(Some(naive)),
        Some(Timestamp::Fixed(dt)) => Ok(Some(dt.naive_local())),
        None => Err(serde::de::Error::custom(format!("invalid sun time '{}'", text))),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// One line of the daily CSV. Label columns are written for readers of the
/// file and ignored when loading.
#[derive(Debug, Serialize, Deserialize)]
struct DailyCsvRecord {
    date: NaiveDate,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
    #[serde(default)]
    total_rain: f64,
    #[serde(default)]
    pm25_avg: Option<f64>,
    #[serde(default)]
    pm25_category: String,
    #[serde(default)]
    pm10_avg: Option<f64>,
    #[serde(default)]
    feels_like_avg: Option<f64>,
    #[serde(default)]
    dew_point_avg: Option<f64>,
    #[serde(default)]
    wind_speed_max: Option<f64>,
    #[serde(default)]
    weather_code: Option<u8>,
    #[serde(default)]
    weather: String,
    #[serde(default)]
    hour_count: usize,
    #[serde(default, deserialize_with = "deserialize_sun_time")]
    sunrise: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_sun_time")]
    sunset: Option<NaiveDateTime>,
    #[serde(default)]
    is_hot_day: bool,
    #[serde(default)]
    is_heavy_rain: bool,
    #[serde(default)]
    is_unhealthy_pm25: bool,
}

impl From<&DailyRow> for DailyCsvRecord {
    fn from(row: &DailyRow) -> Self {
        let row = rounded(row);
        Self {
            date: row.date,
            temp_min: row.temp_min,
            temp_max: row.temp_max,
            total_rain: row.total_rain,
            pm25_avg: row.pm25_avg,
            pm25_category: Pm25Category::from_value(row.pm25_avg).label().to_string(),
            pm10_avg: row.pm10_avg,
            feels_like_avg: row.feels_like_avg,
            dew_point_avg: row.dew_point_avg,
            wind_speed_max: row.wind_speed_max,
            weather_code: row.weather_code,
            weather: row
                .weather_code
                .map(WeatherCondition::from_code)
                .unwrap_or(WeatherCondition::Unknown)
                .label()
                .to_string(),
            hour_count: row.hour_count,
            sunrise: row.sunrise,
            sunset: row.sunset,
            is_hot_day: row.is_hot_day,
            is_heavy_rain: row.is_heavy_rain,
            is_unhealthy_pm25: row.is_unhealthy_pm25,
        }
    }
}

// `NaN` and `inf` cells load as undefined; a non-finite rain total as 0.
impl From<DailyCsvRecord> for DailyRow {
    fn from(record: DailyCsvRecord) -> Self {
        DailyRow {
            date: record.date,
            temp_min: finite(record.temp_min),
            temp_max: finite(record.temp_max),
            total_rain: finite(Some(record.total_rain)).unwrap_or(0.0),
            pm25_avg: finite(record.pm25_avg),
            pm10_avg: finite(record.pm10_avg),
            feels_like_avg: finite(record.feels_like_avg),
            dew_point_avg: finite(record.dew_point_avg),
            wind_speed_max: finite(record.wind_speed_max),
            weather_code: record.weather_code,
            hour_count: record.hour_count,
            sunrise: record.sunrise,
            sunset: record.sunset,
            is_hot_day: record.is_hot_day,
            is_heavy_rain: record.is_heavy_rain,
            is_unhealthy_pm25: record.is_unhealthy_pm25,
        }
    }
}

/// Writes daily rollups as CSV, one row per day.
pub struct DailyCsvWriter {
    delimiter: u8,
}

impl DailyCsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Write `rows` to `path`, creating parent directories. An empty slice
    /// still produces a file holding only the header.
    pub fn write_rows(&self, rows: &[DailyRow], path: &Path) -> Result<()> {
        create_parent_dir(path)?;
        let file = File::create(path)?;
        self.write_to(rows, file)?;

        info!(path = %path.display(), rows = rows.len(), "Wrote daily CSV");
        Ok(())
    }

    pub fn write_to<W: std::io::Write>(&self, rows: &[DailyRow], writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(DAILY_CSV_HEADER)?;
        for row in rows {
            csv_writer.serialize(DailyCsvRecord::from(row))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl Default for DailyCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

const DAILY_CSV_HEADER: [&str; 18] = [
    "date",
    "temp_min",
    "temp_max",
    "total_rain",
    "pm25_avg",
    "pm25_category",
    "pm10_avg",
    "feels_like_avg",
    "dew_point_avg",
    "wind_speed_max",
    "weather_code",
    "weather",
    "hour_count",
    "sunrise",
    "sunset",
    "is_hot_day",
    "is_heavy_rain",
    "is_unhealthy_pm25",
];

/// Loads a daily CSV written by [`DailyCsvWriter`]. Only `date` is required;
/// absent metric columns load as undefined.
pub struct DailyCsvReader {
    delimiter: u8,
}

impl DailyCsvReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Rows in date order. Duplicate dates or `temp_min > temp_max` are
    /// rejected.
    pub fn read_rows(&self, path: &Path) -> Result<Vec<DailyRow>> {
        let file = File::open(path)?;
        let rows = self.read_from(file)?;
        debug!(path = %path.display(), rows = rows.len(), "Read daily CSV");
        Ok(rows)
    }

    pub fn read_from<R: std::io::Read>(&self, reader: R) -> Result<Vec<DailyRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.deserialize::<DailyCsvRecord>() {
            let row = DailyRow::from(result?);
            row.validate_relationships()?;
            rows.push(row);
        }

        rows.sort_by_key(|row| row.date);
        if let Some(pair) = rows.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Duplicate date {} in daily CSV",
                pair[0].date
            )));
        }

        Ok(rows)
    }
}

impl Default for DailyCsvReader {
    fn default() -> Self {
        Self::new()
    }
}
