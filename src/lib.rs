pub mod analyzers;
pub mod classifiers;
pub mod cli;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod settings;
pub mod utils;
pub mod writers;

pub use classifiers::{classify_pm25, describe_weather_code};
pub use error::{ProcessingError, Result};
