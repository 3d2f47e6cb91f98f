pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{
    daily_path_with_extension, default_daily_path, raw_air_path, raw_weather_path, slugify,
};
pub use progress::ProgressReporter;
