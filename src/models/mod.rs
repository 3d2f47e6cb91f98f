pub mod comparison;
pub mod daily;
pub mod hourly;
pub mod window;

pub use comparison::{
    CitySeries, CitySummaryStat, ComparisonResult, ComparisonSeriesPoint, Metric, QuickTake,
};
pub use daily::{DailyRow, SunTable, SunTimes};
pub use hourly::{HourlyRecord, HourlyRecordBuilder, Timestamp};
pub use window::ReportingWindow;
