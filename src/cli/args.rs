use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "weather-etl")]
#[command(about = "Daily weather and air-quality rollups with alerts and multi-city comparison")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Settings file [default: ./weather-etl.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => crate::utils::constants::FORMAT_CSV,
            OutputFormat::Json => crate::utils::constants::FORMAT_JSON,
        }
    }
}

/// `NAME=PATH` pair naming a city and its daily CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySource {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for CitySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=DAILY_CSV, got '{}'", s))?;

        let name = name.trim();
        let path = path.trim();
        if name.is_empty() || path.is_empty() {
            return Err(format!("expected NAME=DAILY_CSV, got '{}'", s));
        }

        Ok(Self {
            name: name.to_string(),
            path: PathBuf::from(path),
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Roll hourly Open-Meteo payloads up into daily rows with alert flags
    Rollup {
        #[arg(
            short,
            long,
            help = "City name, repeat for several cities [default: settings city]"
        )]
        city: Vec<String>,

        #[arg(
            short,
            long,
            help = "Forecast payload JSON [default: {data_dir}/raw/{slug}_weather.json]"
        )]
        weather: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Air-quality payload JSON [default: {data_dir}/raw/{slug}_air.json if present]"
        )]
        air: Option<PathBuf>,

        #[arg(long, help = "IANA timezone overriding the payload's own zone")]
        timezone: Option<String>,

        #[arg(long, help = "First day of the reporting window (YYYY-MM-DD)")]
        start: Option<NaiveDate>,

        #[arg(long, requires = "start", help = "Window length in days [default: settings days]")]
        days: Option<u32>,

        #[arg(
            short,
            long,
            help = "Output file for a single city [default: {data_dir}/processed/{slug}_daily.{ext}]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Compare daily rollups of several cities on one metric
    Compare {
        #[arg(
            short,
            long = "city",
            value_name = "NAME=DAILY_CSV",
            required = true,
            help = "City and its daily CSV, at least two"
        )]
        cities: Vec<CitySource>,

        #[arg(
            short,
            long,
            default_value = "pm25_avg",
            help = "temp_min, temp_max, total_rain, pm25_avg, pm10_avg, feels_like_avg or dew_point_avg"
        )]
        metric: String,

        #[arg(long, help = "First day of the comparison window (YYYY-MM-DD)")]
        start: Option<NaiveDate>,

        #[arg(long, requires = "start", help = "Window length in days [default: settings days]")]
        days: Option<u32>,

        #[arg(short, long, help = "Write the full comparison as JSON")]
        output: Option<PathBuf>,
    },

    /// Summarize a daily CSV: extremes, alert counts and advisories
    Summary {
        #[arg(
            short,
            long,
            help = "Daily CSV [default: {data_dir}/processed/{slug}_daily.csv]"
        )]
        input: Option<PathBuf>,

        #[arg(short, long, help = "City used for the default input path")]
        city: Option<String>,
    },

    /// Classify a PM2.5 value and/or a WMO weather code
    Classify {
        #[arg(long, help = "PM2.5 concentration in µg/m³")]
        pm25: Option<f64>,

        #[arg(long, help = "WMO weather code")]
        weather_code: Option<u8>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_source_parsing() {
        let source: CitySource = "São Paulo = data/sp.csv".parse().unwrap();
        assert_eq!(source.name, "São Paulo");
        assert_eq!(source.path, PathBuf::from("data/sp.csv"));

        assert!("Bandung".parse::<CitySource>().is_err());
        assert!("=data/x.csv".parse::<CitySource>().is_err());
    }

    #[test]
    fn test_compare_arguments() {
        let cli = Cli::try_parse_from([
            "weather-etl",
            "compare",
            "--city",
            "Bandung=a.csv",
            "--city",
            "Jakarta=b.csv",
            "--metric",
            "temp_max",
            "--start",
            "2024-03-01",
        ])
        .unwrap();

        match cli.command {
            Commands::Compare {
                cities,
                metric,
                start,
                days,
                output,
            } => {
                assert_eq!(cities.len(), 2);
                assert_eq!(cities[1].name, "Jakarta");
                assert_eq!(metric, "temp_max");
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(days, None);
                assert_eq!(output, None);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_days_requires_start() {
        let result = Cli::try_parse_from(["weather-etl", "rollup", "--days", "5"]);
        assert!(result.is_err());
    }
}
