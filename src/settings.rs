use chrono::NaiveDate;
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::ReportingWindow;
use crate::processors::AlertThresholds;
use crate::utils::constants::{
    DEFAULT_CITY, DEFAULT_DATA_DIR, DEFAULT_DAYS, DEFAULT_HEAVY_RAIN_THRESHOLD_MM,
    DEFAULT_HOT_DAY_THRESHOLD_C, DEFAULT_TIMEZONE, ENV_PREFIX, PROCESSED_DIR, SETTINGS_FILE,
};

/// Runtime settings, layered as defaults → settings file → `ETL_WEATHER_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(length(min = 1))]
    pub city: String,

    /// Length of the reporting window in days.
    #[validate(range(min = 1, max = 16))]
    pub days: u32,

    /// IANA zone used for day bucketing.
    pub timezone: String,

    pub data_dir: PathBuf,

    #[validate(range(min = -50.0, max = 60.0))]
    pub hot_day_threshold_c: f64,

    #[validate(range(min = 0.0))]
    pub heavy_rain_threshold_mm: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            days: DEFAULT_DAYS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            hot_day_threshold_c: DEFAULT_HOT_DAY_THRESHOLD_C,
            heavy_rain_threshold_mm: DEFAULT_HEAVY_RAIN_THRESHOLD_MM,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; otherwise
    /// `weather-etl.{toml,json,yaml}` in the working directory is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = Config::builder()
            .set_default("city", DEFAULT_CITY)?
            .set_default("days", i64::from(DEFAULT_DAYS))?
            .set_default("timezone", DEFAULT_TIMEZONE)?
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("hot_day_threshold_c", DEFAULT_HOT_DAY_THRESHOLD_C)?
            .set_default("heavy_rain_threshold_mm", DEFAULT_HEAVY_RAIN_THRESHOLD_MM)?;

        let builder = match path {
            Some(p) => builder.add_source(File::from(p).required(true)),
            None => builder.add_source(File::with_name(SETTINGS_FILE).required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.check()?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    /// Field validation plus a timezone lookup.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds::new(self.hot_day_threshold_c, self.heavy_rain_threshold_mm)
    }

    /// Window of `days` days starting at `start`.
    pub fn window_from(&self, start: NaiveDate) -> Result<ReportingWindow> {
        ReportingWindow::new(start, self.days)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join(PROCESSED_DIR)
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ProcessingError::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::Builder;

    // `load` reads process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.check().is_ok());
        assert_eq!(settings.tz().unwrap(), chrono_tz::Asia::Jakarta);
        assert_eq!(settings.thresholds(), AlertThresholds::default());
        assert_eq!(settings.processed_dir(), PathBuf::from("data/processed"));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "city = \"Surabaya\"\ndays = 10\nhot_day_threshold_c = 34.5"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.city, "Surabaya");
        assert_eq!(settings.days, 10);
        assert_eq!(settings.thresholds().hot_day_c, 34.5);
        assert_eq!(settings.thresholds().heavy_rain_mm, 20.0);
        assert_eq!(settings.timezone, "Asia/Jakarta");
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "days = 40").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(ProcessingError::Validation(_))
        ));

        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "timezone = \"Mars/Olympus_Mons\"").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(ProcessingError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let result = Settings::load(Some(Path::new("/nonexistent/weather-etl.toml")));
        assert!(matches!(result, Err(ProcessingError::Settings(_))));
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "city = \"Surabaya\"\nheavy_rain_threshold_mm = 15.0").unwrap();

        std::env::set_var("ETL_WEATHER_HEAVY_RAIN_THRESHOLD_MM", "27.5");
        std::env::set_var("ETL_WEATHER_TIMEZONE", "Asia/Tokyo");
        let loaded = Settings::load(Some(file.path()));
        std::env::remove_var("ETL_WEATHER_HEAVY_RAIN_THRESHOLD_MM");
        std::env::remove_var("ETL_WEATHER_TIMEZONE");

        let settings = loaded.unwrap();
        assert_eq!(settings.city, "Surabaya");
        assert_eq!(settings.thresholds().heavy_rain_mm, 27.5);
        assert_eq!(settings.tz().unwrap(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_window_from_settings() {
        let settings = Settings::default();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = settings.window_from(start).unwrap();
        assert_eq!(window.days, 7);
        assert_eq!(window.last_day(), NaiveDate::from_ymd_opt(2024, 3, 7));
    }
}
