use chrono_tz::Tz;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{DailyRow, ReportingWindow};
use crate::processors::daily_aggregator::{AlertThresholds, DailyAggregator};
use crate::readers::{CityObservations, OpenMeteoReader};
use crate::settings::parse_timezone;
use crate::utils::progress::ProgressReporter;

/// Raw payload locations for one city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityJob {
    pub city: String,
    pub weather_path: PathBuf,
    pub air_path: Option<PathBuf>,
}

/// Daily rollup of one city together with the zone it was bucketed in.
#[derive(Debug, Clone, PartialEq)]
pub struct CityRollup {
    pub city: String,
    pub timezone: Tz,
    pub rows: Vec<DailyRow>,
    pub skipped: usize,
}

/// Normalizes and aggregates several cities on a bounded rayon pool.
pub struct ParallelProcessor {
    max_workers: usize,
    thresholds: AlertThresholds,
    timezone_override: Option<Tz>,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            thresholds: AlertThresholds::default(),
            timezone_override: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Bucket every city in `tz`, ignoring the zone reported by its payload.
    pub fn with_timezone_override(mut self, tz: Option<Tz>) -> Self {
        self.timezone_override = tz;
        self
    }

    /// Read each job's payloads and aggregate them. Results keep job order.
    pub fn process_files(
        &self,
        jobs: &[CityJob],
        default_tz: Tz,
        window: Option<&ReportingWindow>,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<CityRollup>> {
        let reader = OpenMeteoReader::new();

        self.run(jobs, progress, |job| {
            let observations = reader.read_files(&job.weather_path, job.air_path.as_deref())?;
            Ok(self.rollup(&job.city, observations, default_tz, window))
        })
    }

    /// Aggregate already loaded observations. Results keep input order.
    pub fn process_observations(
        &self,
        cities: Vec<(String, CityObservations)>,
        default_tz: Tz,
        window: Option<&ReportingWindow>,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<CityRollup>> {
        self.run(&cities, progress, |(city, observations)| {
            Ok(self.rollup(city, observations.clone(), default_tz, window))
        })
    }

    fn run<T, F>(
        &self,
        items: &[T],
        progress: Option<&ProgressReporter>,
        process: F,
    ) -> Result<Vec<CityRollup>>
    where
        T: Sync,
        F: Fn(&T) -> Result<CityRollup> + Sync + Send,
    {
        let total = items.len();
        let processed_count = Arc::new(AtomicUsize::new(0));

        if let Some(p) = progress {
            p.set_message(&format!("Aggregating {} cities...", total));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let rollups: Result<Vec<CityRollup>> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = process(item);

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    result
                })
                .collect()
        });
        let rollups = rollups?;

        if let Some(p) = progress {
            p.finish_with_message(&format!("Aggregated {} cities", total));
        }
        info!(cities = total, workers = self.max_workers, "Parallel rollup complete");

        Ok(rollups)
    }

    fn rollup(
        &self,
        city: &str,
        observations: CityObservations,
        default_tz: Tz,
        window: Option<&ReportingWindow>,
    ) -> CityRollup {
        let tz = self.resolve_timezone(city, observations.timezone.as_deref(), default_tz);
        let aggregator = DailyAggregator::with_thresholds(self.thresholds);
        let rows = aggregator.aggregate_with_sun(
            &observations.records,
            &tz,
            window,
            Some(&observations.sun_table),
        );

        CityRollup {
            city: city.to_string(),
            timezone: tz,
            rows,
            skipped: observations.skipped,
        }
    }

    fn resolve_timezone(&self, city: &str, reported: Option<&str>, default_tz: Tz) -> Tz {
        if let Some(tz) = self.timezone_override {
            return tz;
        }

        match reported.map(parse_timezone) {
            Some(Ok(tz)) => tz,
            Some(Err(e)) => {
                warn!(city, error = %e, "Ignoring payload timezone, using default");
                default_tz
            }
            None => default_tz,
        }
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
