use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::classifiers::{WeatherCondition, UNHEALTHY_PM25_THRESHOLD};
use crate::models::{DailyRow, HourlyRecord, ReportingWindow, SunTable};
use crate::utils::constants::{DEFAULT_HEAVY_RAIN_THRESHOLD_MM, DEFAULT_HOT_DAY_THRESHOLD_C};

/// Limits above which a day raises an alert. The PM2.5 limit is fixed by the
/// breakpoint table and is not part of this struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub hot_day_c: f64,
    pub heavy_rain_mm: f64,
}

impl AlertThresholds {
    pub fn new(hot_day_c: f64, heavy_rain_mm: f64) -> Self {
        Self {
            hot_day_c,
            heavy_rain_mm,
        }
    }

    pub fn is_hot_day(&self, temp_max: Option<f64>) -> bool {
        temp_max.is_some_and(|t| t > self.hot_day_c)
    }

    pub fn is_heavy_rain(&self, total_rain: f64) -> bool {
        total_rain > self.heavy_rain_mm
    }

    pub fn is_unhealthy_pm25(&self, pm25_avg: Option<f64>) -> bool {
        pm25_avg.is_some_and(|v| v > UNHEALTHY_PM25_THRESHOLD)
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_HOT_DAY_THRESHOLD_C, DEFAULT_HEAVY_RAIN_THRESHOLD_MM)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Running reduction of one day's hourly records.
#[derive(Debug, Default)]
struct DayAccumulator {
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    total_rain: f64,
    pm25: Mean,
    pm10: Mean,
    feels_like: Mean,
    dew_point: Mean,
    wind_speed_max: Option<f64>,
    weather_code: Option<u8>,
    hours: usize,
}

impl DayAccumulator {
    fn push(&mut self, record: &HourlyRecord) {
        self.hours += 1;

        if let Some(t) = record.temperature {
            self.temp_min = Some(self.temp_min.map_or(t, |m| m.min(t)));
            self.temp_max = Some(self.temp_max.map_or(t, |m| m.max(t)));
        }

        // Missing precipitation counts as a dry hour
        self.total_rain += record.precipitation.unwrap_or(0.0);

        self.pm25.push(record.pm25);
        self.pm10.push(record.pm10);
        self.feels_like.push(record.apparent_temperature);
        self.dew_point.push(record.dew_point);

        if let Some(w) = record.wind_speed {
            self.wind_speed_max = Some(self.wind_speed_max.map_or(w, |m| m.max(w)));
        }

        if let Some(code) = record.weather_code {
            let severity = WeatherCondition::from_code(code).severity();
            let current = self
                .weather_code
                .map(|c| WeatherCondition::from_code(c).severity());
            if current.map_or(true, |s| severity > s) {
                self.weather_code = Some(code);
            }
        }
    }

    fn finish(self, date: NaiveDate, sun: Option<&SunTable>, thresholds: &AlertThresholds) -> DailyRow {
        let pm25_avg = self.pm25.value();
        let sun_times = sun.and_then(|table| table.get(&date)).copied().unwrap_or_default();

        DailyRow {
            date,
            temp_min: self.temp_min,
            temp_max: self.temp_max,
            total_rain: self.total_rain,
            pm25_avg,
            pm10_avg: self.pm10.value(),
            feels_like_avg: self.feels_like.value(),
            dew_point_avg: self.dew_point.value(),
            wind_speed_max: self.wind_speed_max,
            weather_code: self.weather_code,
            hour_count: self.hours,
            sunrise: sun_times.sunrise,
            sunset: sun_times.sunset,
            is_hot_day: thresholds.is_hot_day(self.temp_max),
            is_heavy_rain: thresholds.is_heavy_rain(self.total_rain),
            is_unhealthy_pm25: thresholds.is_unhealthy_pm25(pm25_avg),
        }
    }
}

/// Rolls hourly records up into one [`DailyRow`] per local calendar day.
pub struct DailyAggregator {
    thresholds: AlertThresholds,
}

impl DailyAggregator {
    pub fn new() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    /// Aggregate `records` into daily rows ordered by date.
    ///
    /// Days are bucketed in `tz`. With a `window`, records whose local date
    /// lies outside it are dropped before grouping. Input order is irrelevant.
    pub fn aggregate(
        &self,
        records: &[HourlyRecord],
        tz: &Tz,
        window: Option<&ReportingWindow>,
    ) -> Vec<DailyRow> {
        self.aggregate_with_sun(records, tz, window, None)
    }

    /// As [`aggregate`](Self::aggregate), merging sunrise/sunset from `sun`
    /// for the dates it covers.
    pub fn aggregate_with_sun(
        &self,
        records: &[HourlyRecord],
        tz: &Tz,
        window: Option<&ReportingWindow>,
        sun: Option<&SunTable>,
    ) -> Vec<DailyRow> {
        let grouped = self.group_by_local_date(records, tz, window);

        let rows: Vec<DailyRow> = grouped
            .into_iter()
            .map(|(date, acc)| acc.finish(date, sun, &self.thresholds))
            .collect();

        debug!(
            hourly = records.len(),
            days = rows.len(),
            timezone = %tz,
            "Aggregated daily rows"
        );

        rows
    }

    fn group_by_local_date(
        &self,
        records: &[HourlyRecord],
        tz: &Tz,
        window: Option<&ReportingWindow>,
    ) -> BTreeMap<NaiveDate, DayAccumulator> {
        let mut grouped: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

        for record in records {
            let date = record.local_date(tz);
            if window.is_some_and(|w| !w.contains(date)) {
                continue;
            }
            grouped.entry(date).or_default().push(record);
        }

        grouped
    }
}

impl Default for DailyAggregator {
    fn default() -> Self {
        Self::new()
    }
}
