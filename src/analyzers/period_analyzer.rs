use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classifiers::{Pm25Category, PM25_BREAKPOINTS};
use crate::models::DailyRow;
use crate::utils::constants::{FREQUENT_RAIN_DAYS, HEAT_ADVISORY_TEMP_C};

/// Guidance derived from a period summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    PoorAirQuality,
    SensitiveAirQuality,
    Heat,
    FrequentRain,
    Calm,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::PoorAirQuality => {
                "Poor air quality. Wear a mask outdoors and limit outdoor activity."
            }
            Advisory::SensitiveAirQuality => {
                "Air quality is unhealthy for sensitive groups. Reduce time outside."
            }
            Advisory::Heat => "Hot weather. Avoid strenuous midday activity and stay hydrated.",
            Advisory::FrequentRain => {
                "Several rainy days. Keep rain gear at hand when heading out."
            }
            Advisory::Calm => "Conditions are relatively safe. Keep an eye on daily changes.",
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WettestDay {
    pub date: NaiveDate,
    pub total_rain: f64,
}

/// Report-level reduction of a run of daily rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub days: usize,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub wettest: Option<WettestDay>,
    pub pm25_avg: Option<f64>,
    pub pm25_category: Pm25Category,
    pub rainy_days: usize,
    pub hot_days: usize,
    pub heavy_rain_days: usize,
    pub unhealthy_pm25_days: usize,
    /// Earliest sunrise by time of day across the period, not the first
    /// sunrise timestamp.
    pub earliest_sunrise: Option<NaiveTime>,
    /// Latest sunset by time of day across the period.
    pub latest_sunset: Option<NaiveTime>,
    pub feels_like_avg: Option<f64>,
    pub dew_point_avg: Option<f64>,
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn max_of<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    values.fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

fn min_of<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    values.fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))))
}

pub struct PeriodAnalyzer;

impl PeriodAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Summarize `rows`. Empty input yields undefined statistics and zero
    /// counts.
    pub fn summarize(&self, rows: &[DailyRow]) -> PeriodSummary {
        let pm25_avg = mean(rows.iter().filter_map(|r| r.pm25_avg));

        // First day wins on equal totals
        let wettest = rows.iter().fold(None, |best: Option<WettestDay>, row| match best {
            Some(b) if b.total_rain >= row.total_rain => Some(b),
            _ => Some(WettestDay {
                date: row.date,
                total_rain: row.total_rain,
            }),
        });

        PeriodSummary {
            start: rows.iter().map(|r| r.date).min(),
            end: rows.iter().map(|r| r.date).max(),
            days: rows.len(),
            max_temp: max_of(rows.iter().filter_map(|r| r.temp_max)),
            min_temp: min_of(rows.iter().filter_map(|r| r.temp_min)),
            wettest,
            pm25_avg,
            pm25_category: Pm25Category::from_value(pm25_avg),
            rainy_days: rows.iter().filter(|r| r.is_rainy()).count(),
            hot_days: rows.iter().filter(|r| r.is_hot_day).count(),
            heavy_rain_days: rows.iter().filter(|r| r.is_heavy_rain).count(),
            unhealthy_pm25_days: rows.iter().filter(|r| r.is_unhealthy_pm25).count(),
            earliest_sunrise: rows.iter().filter_map(|r| r.sunrise.map(|t| t.time())).min(),
            latest_sunset: rows.iter().filter_map(|r| r.sunset.map(|t| t.time())).max(),
            feels_like_avg: mean(rows.iter().filter_map(|r| r.feels_like_avg)),
            dew_point_avg: mean(rows.iter().filter_map(|r| r.dew_point_avg)),
        }
    }

    /// Advisories for a summary, most pressing first. Returns `[Calm]` when
    /// nothing applies.
    pub fn advisories(&self, summary: &PeriodSummary) -> Vec<Advisory> {
        let mut advisories = Vec::new();

        let (moderate_upper, _) = PM25_BREAKPOINTS[1];
        let (sensitive_upper, _) = PM25_BREAKPOINTS[2];
        if let Some(pm25) = summary.pm25_avg {
            if pm25 > sensitive_upper {
                advisories.push(Advisory::PoorAirQuality);
            } else if pm25 > moderate_upper {
                advisories.push(Advisory::SensitiveAirQuality);
            }
        }

        if summary.max_temp.is_some_and(|t| t > HEAT_ADVISORY_TEMP_C) {
            advisories.push(Advisory::Heat);
        }

        if summary.rainy_days >= FREQUENT_RAIN_DAYS {
            advisories.push(Advisory::FrequentRain);
        }

        if advisories.is_empty() {
            advisories.push(Advisory::Calm);
        }
        advisories
    }
}

impl Default for PeriodAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32, temp_max: f64, rain: f64, pm25: Option<f64>) -> DailyRow {
        let date = NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        DailyRow {
            date,
            temp_min: Some(temp_max - 8.0),
            temp_max: Some(temp_max),
            total_rain: rain,
            pm25_avg: pm25,
            pm10_avg: None,
            feels_like_avg: Some(temp_max + 1.0),
            dew_point_avg: None,
            wind_speed_max: None,
            weather_code: None,
            hour_count: 24,
            sunrise: date.and_hms_opt(5, 50 + d, 0),
            sunset: date.and_hms_opt(17, 50 + d, 0),
            is_hot_day: temp_max > 35.0,
            is_heavy_rain: rain > 20.0,
            is_unhealthy_pm25: pm25.is_some_and(|v| v > 55.4),
        }
    }

    #[test]
    fn test_summarize_period() {
        let rows = vec![
            day(1, 30.0, 0.0, Some(20.0)),
            day(2, 36.0, 25.0, None),
            day(3, 32.0, 25.0, Some(40.0)),
            day(4, 29.0, 1.5, Some(60.0)),
        ];

        let summary = PeriodAnalyzer::new().summarize(&rows);

        assert_eq!(summary.start, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(summary.end, NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(summary.days, 4);
        assert_eq!(summary.max_temp, Some(36.0));
        assert_eq!(summary.min_temp, Some(21.0));
        assert_eq!(
            summary.wettest,
            Some(WettestDay {
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                total_rain: 25.0
            })
        );
        assert_eq!(summary.pm25_avg, Some(40.0));
        assert_eq!(summary.pm25_category, Pm25Category::UnhealthySensitive);
        assert_eq!(summary.rainy_days, 3);
        assert_eq!(summary.hot_days, 1);
        assert_eq!(summary.heavy_rain_days, 2);
        assert_eq!(summary.unhealthy_pm25_days, 1);
        assert_eq!(summary.earliest_sunrise, NaiveTime::from_hms_opt(5, 51, 0));
        assert_eq!(summary.latest_sunset, NaiveTime::from_hms_opt(17, 54, 0));
        assert_eq!(summary.feels_like_avg, Some(32.75));
        assert_eq!(summary.dew_point_avg, None);
    }

    #[test]
    fn test_empty_period_is_undefined() {
        let summary = PeriodAnalyzer::new().summarize(&[]);

        assert_eq!(summary.start, None);
        assert_eq!(summary.max_temp, None);
        assert_eq!(summary.wettest, None);
        assert_eq!(summary.pm25_avg, None);
        assert_eq!(summary.pm25_category, Pm25Category::Unknown);
        assert_eq!(summary.rainy_days, 0);
        assert_eq!(
            PeriodAnalyzer::new().advisories(&summary),
            vec![Advisory::Calm]
        );
    }

    #[test]
    fn test_advisories() {
        let analyzer = PeriodAnalyzer::new();

        let rows = vec![
            day(1, 35.0, 2.0, Some(60.0)),
            day(2, 34.0, 3.0, Some(60.0)),
            day(3, 30.0, 4.0, Some(60.0)),
        ];
        let summary = analyzer.summarize(&rows);
        assert_eq!(
            analyzer.advisories(&summary),
            vec![Advisory::PoorAirQuality, Advisory::Heat, Advisory::FrequentRain]
        );

        let rows = vec![day(1, 33.0, 0.0, Some(35.5)), day(2, 30.0, 1.0, Some(35.5))];
        let summary = analyzer.summarize(&rows);
        assert_eq!(
            analyzer.advisories(&summary),
            vec![Advisory::SensitiveAirQuality]
        );

        let rows = vec![day(1, 28.0, 0.0, Some(35.4))];
        let summary = analyzer.summarize(&rows);
        assert_eq!(analyzer.advisories(&summary), vec![Advisory::Calm]);
    }

    #[test]
    fn test_sun_extremes_compare_time_of_day() {
        let mut first = day(1, 30.0, 0.0, None);
        first.sunrise = first.date.and_hms_opt(6, 10, 0);
        first.sunset = first.date.and_hms_opt(18, 30, 0);
        let mut second = day(2, 30.0, 0.0, None);
        second.sunrise = second.date.and_hms_opt(5, 40, 0);
        second.sunset = second.date.and_hms_opt(18, 5, 0);

        let summary = PeriodAnalyzer::new().summarize(&[first, second]);
        assert_eq!(summary.earliest_sunrise, NaiveTime::from_hms_opt(5, 40, 0));
        assert_eq!(summary.latest_sunset, NaiveTime::from_hms_opt(18, 30, 0));
    }

    #[test]
    fn test_wettest_prefers_first_on_ties() {
        let rows = vec![day(1, 30.0, 0.0, None), day(2, 30.0, 0.0, None)];
        let summary = PeriodAnalyzer::new().summarize(&rows);
        assert_eq!(
            summary.wettest.map(|w| w.date),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }
}
