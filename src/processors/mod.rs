pub mod city_comparator;
pub mod daily_aggregator;
pub mod parallel_processor;

pub use city_comparator::CityComparator;
pub use daily_aggregator::{AlertThresholds, DailyAggregator};
pub use parallel_processor::{CityJob, CityRollup, ParallelProcessor};
