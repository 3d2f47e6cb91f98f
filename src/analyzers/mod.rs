pub mod period_analyzer;

pub use period_analyzer::{Advisory, PeriodAnalyzer, PeriodSummary, WettestDay};
