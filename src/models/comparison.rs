use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ProcessingError;
use crate::models::DailyRow;

/// Daily metric a comparison is run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TempMin,
    TempMax,
    TotalRain,
    Pm25Avg,
    Pm10Avg,
    FeelsLikeAvg,
    DewPointAvg,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::TempMin,
        Metric::TempMax,
        Metric::TotalRain,
        Metric::Pm25Avg,
        Metric::Pm10Avg,
        Metric::FeelsLikeAvg,
        Metric::DewPointAvg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::TempMin => "temp_min",
            Metric::TempMax => "temp_max",
            Metric::TotalRain => "total_rain",
            Metric::Pm25Avg => "pm25_avg",
            Metric::Pm10Avg => "pm10_avg",
            Metric::FeelsLikeAvg => "feels_like_avg",
            Metric::DewPointAvg => "dew_point_avg",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            Metric::TempMin | Metric::TempMax | Metric::FeelsLikeAvg | Metric::DewPointAvg => "°C",
            Metric::TotalRain => "mm",
            Metric::Pm25Avg | Metric::Pm10Avg => "µg/m³",
        }
    }

    /// Value of this metric on `row`, `None` when the day has no data for it.
    pub fn value(&self, row: &DailyRow) -> Option<f64> {
        match self {
            Metric::TempMin => row.temp_min,
            Metric::TempMax => row.temp_max,
            Metric::TotalRain => Some(row.total_rain),
            Metric::Pm25Avg => row.pm25_avg,
            Metric::Pm10Avg => row.pm10_avg,
            Metric::FeelsLikeAvg => row.feels_like_avg,
            Metric::DewPointAvg => row.dew_point_avg,
        }
    }
}

impl FromStr for Metric {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ProcessingError::UnknownMetric(s.to_string()))
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One city's daily rows, in the order the caller wants them ranked on ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySeries {
    pub city: String,
    pub rows: Vec<DailyRow>,
}

impl CitySeries {
    pub fn new(city: impl Into<String>, rows: Vec<DailyRow>) -> Self {
        Self {
            city: city.into(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSeriesPoint {
    pub date: NaiveDate,
    pub city: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySummaryStat {
    pub city: String,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    /// Number of days with a defined value.
    pub count: usize,
}

/// Headline comparison between the two best-ranked cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickTake {
    pub metric: Metric,
    pub leader: String,
    pub leader_avg: f64,
    pub runner_up: String,
    pub runner_up_avg: Option<f64>,
    /// `(leader - runner_up) / |runner_up| * 100`, absent when the runner-up
    /// average is zero or undefined.
    pub percent_higher: Option<f64>,
}

impl std::fmt::Display for QuickTake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.percent_higher, self.runner_up_avg) {
            (Some(pct), _) => write!(
                f,
                "{} is {:.1}% higher than {} on average {} ({:.1} vs {:.1} {})",
                self.leader,
                pct,
                self.runner_up,
                self.metric,
                self.leader_avg,
                self.runner_up_avg.unwrap_or_default(),
                self.metric.units()
            ),
            (None, Some(runner_up_avg)) => write!(
                f,
                "{} has the highest average {} ({:.1} vs {:.1} {} for {})",
                self.leader,
                self.metric,
                self.leader_avg,
                runner_up_avg,
                self.metric.units(),
                self.runner_up
            ),
            (None, None) => write!(
                f,
                "{} has the highest average {} ({:.1} {}); no data for {}",
                self.leader,
                self.metric,
                self.leader_avg,
                self.metric.units(),
                self.runner_up
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub metric: Metric,
    pub series: Vec<ComparisonSeriesPoint>,
    pub summary: Vec<CitySummaryStat>,
    pub quick_take: Option<QuickTake>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parsing() {
        assert_eq!("pm25_avg".parse::<Metric>().unwrap(), Metric::Pm25Avg);
        assert_eq!(" TEMP_MAX ".parse::<Metric>().unwrap(), Metric::TempMax);
        assert!(matches!(
            "humidity".parse::<Metric>(),
            Err(ProcessingError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_quick_take_display() {
        let take = QuickTake {
            metric: Metric::Pm25Avg,
            leader: "Jakarta".to_string(),
            leader_avg: 60.0,
            runner_up: "Bandung".to_string(),
            runner_up_avg: Some(12.0),
            percent_higher: Some(400.0),
        };

        assert_eq!(
            take.to_string(),
            "Jakarta is 400.0% higher than Bandung on average pm25_avg (60.0 vs 12.0 µg/m³)"
        );
    }
}
