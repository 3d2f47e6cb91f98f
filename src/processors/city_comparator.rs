use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{
    CitySeries, CitySummaryStat, ComparisonResult, ComparisonSeriesPoint, DailyRow, Metric,
    QuickTake, ReportingWindow,
};

/// Aligns several cities' daily rows for one metric and ranks the cities.
pub struct CityComparator {
    metric: Metric,
}

impl CityComparator {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }

    /// Compare `cities` in their given order, which is also the tie-break
    /// order of the ranking. Fails only on caller mistakes: no cities, or the
    /// same city twice.
    pub fn compare(
        &self,
        cities: &[CitySeries],
        window: Option<&ReportingWindow>,
    ) -> Result<ComparisonResult> {
        if cities.is_empty() {
            return Err(ProcessingError::NoCities);
        }

        let mut seen = HashSet::new();
        for city in cities {
            if !seen.insert(city.city.as_str()) {
                return Err(ProcessingError::DuplicateCity(city.city.clone()));
            }
        }

        let series: Vec<ComparisonSeriesPoint> = cities
            .iter()
            .flat_map(|city| self.city_points(city, window))
            .collect();

        let mut summary: Vec<CitySummaryStat> = cities
            .iter()
            .map(|city| self.city_stat(city, window))
            .collect();
        rank(&mut summary);

        let quick_take = self.quick_take(&summary);

        debug!(
            metric = %self.metric,
            cities = cities.len(),
            points = series.len(),
            "Compared cities"
        );

        Ok(ComparisonResult {
            metric: self.metric,
            series,
            summary,
            quick_take,
        })
    }

    /// Metric value of `row`; NaN and infinities count as undefined.
    fn value(&self, row: &DailyRow) -> Option<f64> {
        self.metric.value(row).filter(|v| v.is_finite())
    }

    /// Defined values of one city, date ascending.
    fn city_points(
        &self,
        city: &CitySeries,
        window: Option<&ReportingWindow>,
    ) -> Vec<ComparisonSeriesPoint> {
        let mut points: Vec<ComparisonSeriesPoint> = city
            .rows
            .iter()
            .filter(|row| window.map_or(true, |w| w.contains(row.date)))
            .filter_map(|row| {
                self.value(row).map(|value| ComparisonSeriesPoint {
                    date: row.date,
                    city: city.city.clone(),
                    value,
                })
            })
            .collect();

        points.sort_by_key(|p| p.date);
        points
    }

    fn city_stat(&self, city: &CitySeries, window: Option<&ReportingWindow>) -> CitySummaryStat {
        let values: Vec<f64> = city
            .rows
            .iter()
            .filter(|row| window.map_or(true, |w| w.contains(row.date)))
            .filter_map(|row| self.value(row))
            .collect();

        let avg = if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        };
        let max = values.iter().copied().reduce(f64::max);

        CitySummaryStat {
            city: city.city.clone(),
            avg,
            max,
            count: values.len(),
        }
    }

    fn quick_take(&self, ranked: &[CitySummaryStat]) -> Option<QuickTake> {
        let (top, second) = match ranked {
            [top, second, ..] => (top, second),
            _ => return None,
        };
        let leader_avg = top.avg?;

        let percent_higher = second
            .avg
            .filter(|avg| *avg != 0.0)
            .map(|avg| (leader_avg - avg) / avg.abs() * 100.0);

        Some(QuickTake {
            metric: self.metric,
            leader: top.city.clone(),
            leader_avg,
            runner_up: second.city.clone(),
            runner_up_avg: second.avg,
            percent_higher,
        })
    }
}

/// Stable sort by average, highest first; cities without an average go last.
fn rank(stats: &mut [CitySummaryStat]) {
    stats.sort_by(|a, b| match (a.avg, b.avg) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn row(d: u32, pm25: Option<f64>) -> DailyRow {
        DailyRow {
            date: day(d),
            temp_min: Some(20.0),
            temp_max: Some(30.0 + d as f64),
            total_rain: 0.0,
            pm25_avg: pm25,
            pm10_avg: None,
            feels_like_avg: None,
            dew_point_avg: None,
            wind_speed_max: None,
            weather_code: None,
            hour_count: 24,
            sunrise: None,
            sunset: None,
            is_hot_day: false,
            is_heavy_rain: false,
            is_unhealthy_pm25: false,
        }
    }

    fn city(name: &str, pm25: &[Option<f64>]) -> CitySeries {
        let rows = pm25
            .iter()
            .enumerate()
            .map(|(i, v)| row(i as u32 + 1, *v))
            .collect();
        CitySeries::new(name, rows)
    }

    #[test]
    fn test_scenario_b_ranking_and_quick_take() {
        let cities = vec![
            city("X", &[Some(10.0), Some(12.0), Some(14.0)]),
            city("Y", &[Some(50.0), Some(60.0), Some(70.0)]),
        ];

        let result = CityComparator::new(Metric::Pm25Avg)
            .compare(&cities, None)
            .unwrap();

        assert_eq!(result.summary[0].city, "Y");
        assert_eq!(result.summary[0].avg, Some(60.0));
        assert_eq!(result.summary[0].max, Some(70.0));
        assert_eq!(result.summary[1].city, "X");
        assert_eq!(result.summary[1].avg, Some(12.0));

        let take = result.quick_take.unwrap();
        assert_eq!(take.leader, "Y");
        assert_eq!(take.runner_up, "X");
        assert_eq!(take.percent_higher, Some(400.0));
    }

    #[test]
    fn test_series_is_flat_and_skips_undefined_values() {
        let cities = vec![
            city("A", &[Some(5.0), None, Some(7.0)]),
            city("B", &[None, Some(9.0)]),
        ];

        let result = CityComparator::new(Metric::Pm25Avg)
            .compare(&cities, None)
            .unwrap();

        let flat: Vec<(String, NaiveDate, f64)> = result
            .series
            .iter()
            .map(|p| (p.city.clone(), p.date, p.value))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("A".to_string(), day(1), 5.0),
                ("A".to_string(), day(3), 7.0),
                ("B".to_string(), day(2), 9.0),
            ]
        );
        assert_eq!(result.summary[0].count, 1);
        assert_eq!(result.summary[1].count, 2);
    }

    #[test]
    fn test_undefined_averages_rank_last_and_ties_keep_input_order() {
        let cities = vec![
            city("NoData", &[None, None]),
            city("First", &[Some(20.0)]),
            city("Second", &[Some(20.0)]),
        ];

        let result = CityComparator::new(Metric::Pm25Avg)
            .compare(&cities, None)
            .unwrap();
        let order: Vec<&str> = result.summary.iter().map(|s| s.city.as_str()).collect();

        assert_eq!(order, vec!["First", "Second", "NoData"]);
        assert_eq!(result.summary[2].avg, None);
        assert_eq!(result.summary[2].max, None);
        // Equal averages: 0% higher
        assert_eq!(result.quick_take.unwrap().percent_higher, Some(0.0));
    }

    #[test]
    fn test_percentage_omitted_for_zero_or_missing_runner_up() {
        let zero = vec![city("A", &[Some(10.0)]), city("B", &[Some(0.0)])];
        let take = CityComparator::new(Metric::Pm25Avg)
            .compare(&zero, None)
            .unwrap()
            .quick_take
            .unwrap();
        assert_eq!(take.percent_higher, None);
        assert_eq!(take.runner_up_avg, Some(0.0));

        let missing = vec![city("A", &[Some(10.0)]), city("B", &[None])];
        let take = CityComparator::new(Metric::Pm25Avg)
            .compare(&missing, None)
            .unwrap()
            .quick_take
            .unwrap();
        assert_eq!(take.percent_higher, None);
        assert_eq!(take.runner_up_avg, None);
    }

    #[test]
    fn test_negative_runner_up_uses_absolute_value() {
        let cities = vec![city("A", &[Some(5.0)]), city("B", &[Some(-10.0)])];
        let take = CityComparator::new(Metric::Pm25Avg)
            .compare(&cities, None)
            .unwrap()
            .quick_take
            .unwrap();
        assert_eq!(take.percent_higher, Some(150.0));
    }

    #[test]
    fn test_window_limits_points_and_stats() {
        let cities = vec![city("A", &[Some(10.0), Some(20.0), Some(30.0), Some(40.0)])];
        let window = ReportingWindow::new(day(2), 2).unwrap();

        let result = CityComparator::new(Metric::Pm25Avg)
            .compare(&cities, Some(&window))
            .unwrap();

        assert_eq!(result.series.len(), 2);
        assert_eq!(result.summary[0].avg, Some(25.0));
        assert_eq!(result.summary[0].max, Some(30.0));
        assert!(result.quick_take.is_none());
    }

    #[test]
    fn test_other_metrics() {
        let cities = vec![city("A", &[None, None]), city("B", &[None])];
        let result = CityComparator::new(Metric::TempMax)
            .compare(&cities, None)
            .unwrap();

        assert_eq!(result.summary[0].city, "A");
        assert_eq!(result.summary[0].max, Some(32.0));
        assert_eq!(result.summary[0].avg, Some(31.5));
    }

    #[test]
    fn test_non_finite_values_are_undefined() {
        let cities = vec![
            city("Broken", &[Some(f64::NAN), Some(f64::INFINITY)]),
            city("Mixed", &[Some(f64::NAN), Some(40.0)]),
            city("Clean", &[Some(80.0)]),
        ];

        let result = CityComparator::new(Metric::Pm25Avg)
            .compare(&cities, None)
            .unwrap();
        let order: Vec<&str> = result.summary.iter().map(|s| s.city.as_str()).collect();

        assert_eq!(order, vec!["Clean", "Mixed", "Broken"]);
        assert_eq!(result.summary[1].avg, Some(40.0));
        assert_eq!(result.summary[1].count, 1);
        assert_eq!(result.summary[2].avg, None);
        assert_eq!(result.summary[2].count, 0);
        assert!(result.series.iter().all(|p| p.value.is_finite()));

        let take = result.quick_take.unwrap();
        assert_eq!(take.leader, "Clean");
        assert_eq!(take.percent_higher, Some(100.0));
    }

    #[test]
    fn test_contract_violations_fail_fast() {
        let comparator = CityComparator::new(Metric::Pm25Avg);
        assert!(matches!(
            comparator.compare(&[], None),
            Err(ProcessingError::NoCities)
        ));

        let dup = vec![city("A", &[Some(1.0)]), city("A", &[Some(2.0)])];
        assert!(matches!(
            comparator.compare(&dup, None),
            Err(ProcessingError::DuplicateCity(name)) if name == "A"
        ));
    }
}
