/// Alert thresholds
pub const DEFAULT_HOT_DAY_THRESHOLD_C: f64 = 35.0;
pub const DEFAULT_HEAVY_RAIN_THRESHOLD_MM: f64 = 20.0;

/// Period advisories
pub const HEAT_ADVISORY_TEMP_C: f64 = 33.0;
pub const FREQUENT_RAIN_DAYS: usize = 3;

/// Settings defaults
pub const DEFAULT_CITY: &str = "Bandung";
pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const SETTINGS_FILE: &str = "weather-etl";
pub const ENV_PREFIX: &str = "ETL_WEATHER";

/// Directory names under the data dir
pub const RAW_DIR: &str = "raw";
pub const PROCESSED_DIR: &str = "processed";

/// Decimal places kept when writing aggregates
pub const OUTPUT_DECIMALS: i32 = 2;

/// Output formats
pub const FORMAT_CSV: &str = "csv";
pub const FORMAT_JSON: &str = "json";
