use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::classifiers::{Pm25Category, WeatherCondition};
use crate::error::{ProcessingError, Result};

/// Sunrise and sunset for one day, as reported by the upstream daily feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

impl SunTimes {
    pub fn is_empty(&self) -> bool {
        self.sunrise.is_none() && self.sunset.is_none()
    }
}

/// Externally supplied sunrise/sunset per local date.
pub type SunTable = BTreeMap<NaiveDate, SunTimes>;

/// Daily rollup of one city's hourly observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DailyRow {
    pub date: NaiveDate,

    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,

    /// Sum of hourly precipitation; missing hours count as 0 mm.
    #[validate(range(min = 0.0))]
    pub total_rain: f64,

    pub pm25_avg: Option<f64>,
    pub pm10_avg: Option<f64>,
    pub feels_like_avg: Option<f64>,
    pub dew_point_avg: Option<f64>,
    pub wind_speed_max: Option<f64>,

    /// Most severe WMO code seen during the day.
    pub weather_code: Option<u8>,

    /// Number of hourly records that contributed to this row.
    pub hour_count: usize,

    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,

    pub is_hot_day: bool,
    pub is_heavy_rain: bool,
    pub is_unhealthy_pm25: bool,
}

impl DailyRow {
    pub fn pm25_category(&self) -> Pm25Category {
        Pm25Category::from_value(self.pm25_avg)
    }

    pub fn condition(&self) -> WeatherCondition {
        self.weather_code
            .map(WeatherCondition::from_code)
            .unwrap_or(WeatherCondition::Unknown)
    }

    pub fn temperature_range(&self) -> Option<f64> {
        match (self.temp_min, self.temp_max) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }

    pub fn is_rainy(&self) -> bool {
        self.total_rain > 0.0
    }

    pub fn has_alert(&self) -> bool {
        self.is_hot_day || self.is_heavy_rain || self.is_unhealthy_pm25
    }

    pub fn sun_times(&self) -> SunTimes {
        SunTimes {
            sunrise: self.sunrise,
            sunset: self.sunset,
        }
    }

    pub fn validate_relationships(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.temp_min, self.temp_max) {
            if min > max {
                return Err(ProcessingError::TemperatureValidation {
                    message: format!("Min temperature {} > Max temperature {} on {}", min, max, self.date),
                });
            }
        }

        self.validate()?;
        Ok(())
    }
}
