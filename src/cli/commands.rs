use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::analyzers::PeriodAnalyzer;
use crate::classifiers::{Pm25Category, WeatherCondition};
use crate::cli::args::{CitySource, Cli, Commands, OutputFormat};
use crate::models::{CitySeries, ComparisonResult, Metric, ReportingWindow};
use crate::processors::{CityComparator, CityJob, CityRollup, ParallelProcessor};
use crate::settings::{parse_timezone, Settings};
use crate::utils::progress::ProgressReporter;
use crate::utils::{daily_path_with_extension, default_daily_path, raw_air_path, raw_weather_path};
use crate::writers::{DailyCsvReader, DailyCsvWriter, JsonWriter};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Rollup {
            city,
            weather,
            air,
            timezone,
            start,
            days,
            output,
            format,
            max_workers,
        } => {
            let cities = if city.is_empty() {
                vec![settings.city.clone()]
            } else {
                city
            };

            if cities.len() > 1 && (weather.is_some() || air.is_some() || output.is_some()) {
                bail!("--weather, --air and --output can only be used with a single --city");
            }

            let timezone_override = timezone
                .as_deref()
                .map(parse_timezone)
                .transpose()
                .context("Invalid --timezone")?;
            let default_tz = match timezone_override {
                Some(tz) => tz,
                None => settings.tz()?,
            };
            let window = build_window(&settings, start, days)?;

            let jobs: Vec<CityJob> = cities
                .iter()
                .map(|name| rollup_job(&settings, name, weather.clone(), air.clone()))
                .collect();

            println!(
                "Rolling up {} {} with {} workers...",
                jobs.len(),
                if jobs.len() == 1 { "city" } else { "cities" },
                max_workers
            );
            if let Some(w) = &window {
                println!("Window: {}", w);
            }

            let progress = ProgressReporter::for_cities(jobs.len() as u64, "Aggregating", false);
            let processor = ParallelProcessor::new(max_workers)
                .with_thresholds(settings.thresholds())
                .with_timezone_override(timezone_override);
            let rollups = processor
                .process_files(&jobs, default_tz, window.as_ref(), Some(&progress))
                .context("Failed to roll up hourly payloads")?;

            for rollup in &rollups {
                let path = match &output {
                    Some(path) => path.clone(),
                    None => daily_path_with_extension(
                        &settings.data_dir,
                        &rollup.city,
                        format.extension(),
                    ),
                };
                write_rollup(rollup, format, &path)?;
                print_rollup(rollup, &path);
            }
        }

        Commands::Compare {
            cities,
            metric,
            start,
            days,
            output,
        } => {
            if cities.len() < 2 {
                bail!("Comparison needs at least two --city NAME=DAILY_CSV entries");
            }

            let metric: Metric = metric.parse()?;
            let window = build_window(&settings, start, days)?;

            let progress = ProgressReporter::new_spinner("Loading daily CSVs...", false);
            let series = load_city_series(cities).await?;
            progress.finish_with_message(&format!("Loaded {} cities", series.len()));

            let result = CityComparator::new(metric)
                .compare(&series, window.as_ref())
                .context("Comparison failed")?;

            print_comparison(&result);

            if let Some(path) = output {
                JsonWriter::new()
                    .write_value(&result, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("\nComparison written to {}", path.display());
            }
        }

        Commands::Summary { input, city } => {
            let city = city.unwrap_or_else(|| settings.city.clone());
            let path = input.unwrap_or_else(|| default_daily_path(&settings.data_dir, &city));

            let rows = DailyCsvReader::new()
                .read_rows(&path)
                .with_context(|| format!("Failed to read daily CSV {}", path.display()))?;

            let analyzer = PeriodAnalyzer::new();
            let summary = analyzer.summarize(&rows);

            println!("Summary for {} ({})", city, path.display());
            match (summary.start, summary.end) {
                (Some(start), Some(end)) => println!("  Period: {} to {} ({} days)", start, end, summary.days),
                _ => println!("  Period: no data"),
            }
            println!("  Max temperature: {}", fmt_value(summary.max_temp, "°C"));
            println!("  Min temperature: {}", fmt_value(summary.min_temp, "°C"));
            match summary.wettest {
                Some(w) => println!("  Wettest day: {} ({:.1} mm)", w.date, w.total_rain),
                None => println!("  Wettest day: -"),
            }
            println!(
                "  PM2.5 average: {} [{}]",
                fmt_value(summary.pm25_avg, "µg/m³"),
                summary.pm25_category
            );
            println!("  Feels-like average: {}", fmt_value(summary.feels_like_avg, "°C"));
            println!("  Dew point average: {}", fmt_value(summary.dew_point_avg, "°C"));
            println!(
                "  Sunrise earliest / sunset latest: {} / {}",
                summary
                    .earliest_sunrise
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                summary
                    .latest_sunset
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!(
                "  Rainy days: {}, hot days: {}, heavy rain days: {}, unhealthy PM2.5 days: {}",
                summary.rainy_days,
                summary.hot_days,
                summary.heavy_rain_days,
                summary.unhealthy_pm25_days
            );

            println!("\nAdvisories:");
            for advisory in analyzer.advisories(&summary) {
                println!("  - {}", advisory);
            }
        }

        Commands::Classify { pm25, weather_code } => {
            if pm25.is_none() && weather_code.is_none() {
                bail!("Provide --pm25 and/or --weather-code");
            }

            if let Some(value) = pm25 {
                let category = Pm25Category::from_value(Some(value));
                println!("PM2.5 {:.1} µg/m³: {} ({})", value, category, category.color());
            }

            if let Some(code) = weather_code {
                let condition = WeatherCondition::from_code(code);
                let label = match condition.label() {
                    "" => "Unknown",
                    label => label,
                };
                println!("Weather code {}: {} {}", code, condition.icon(), label);
            }
        }
    }

    Ok(())
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the level.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

fn build_window(
    settings: &Settings,
    start: Option<NaiveDate>,
    days: Option<u32>,
) -> Result<Option<ReportingWindow>> {
    let Some(start) = start else {
        return Ok(None);
    };
    let window = ReportingWindow::new(start, days.unwrap_or(settings.days))
        .context("Invalid reporting window")?;
    Ok(Some(window))
}

fn rollup_job(
    settings: &Settings,
    city: &str,
    weather: Option<PathBuf>,
    air: Option<PathBuf>,
) -> CityJob {
    let weather_path = weather.unwrap_or_else(|| raw_weather_path(&settings.data_dir, city));
    let air_path = air.or_else(|| {
        let default = raw_air_path(&settings.data_dir, city);
        default.exists().then_some(default)
    });

    debug!(city, weather = %weather_path.display(), air = ?air_path, "Rollup job");
    CityJob {
        city: city.to_string(),
        weather_path,
        air_path,
    }
}

fn write_rollup(rollup: &CityRollup, format: OutputFormat, path: &Path) -> Result<()> {
    match format {
        OutputFormat::Csv => DailyCsvWriter::new().write_rows(&rollup.rows, path),
        OutputFormat::Json => JsonWriter::new().write_rows(&rollup.rows, path),
    }
    .with_context(|| format!("Failed to write {}", path.display()))
}

/// Load every city's daily CSV concurrently, keeping the command-line order.
async fn load_city_series(cities: Vec<CitySource>) -> Result<Vec<CitySeries>> {
    let mut join_set = JoinSet::new();

    for (index, source) in cities.into_iter().enumerate() {
        join_set.spawn_blocking(move || {
            let rows = DailyCsvReader::new()
                .read_rows(&source.path)
                .with_context(|| format!("Failed to read {}", source.path.display()))?;
            Ok::<(usize, CitySeries), anyhow::Error>((index, CitySeries::new(source.name, rows)))
        });
    }

    let mut loaded = Vec::new();
    while let Some(result) = join_set.join_next().await {
        loaded.push(result??);
    }
    loaded.sort_by_key(|(index, _)| *index);

    info!(cities = loaded.len(), "Loaded daily series");
    Ok(loaded.into_iter().map(|(_, series)| series).collect())
}

fn fmt_value(value: Option<f64>, units: &str) -> String {
    value
        .map(|v| format!("{:.1} {}", v, units))
        .unwrap_or_else(|| "-".to_string())
}

fn print_rollup(rollup: &CityRollup, path: &Path) {
    let alerts = rollup.rows.iter().filter(|r| r.has_alert()).count();
    println!(
        "{} ({}): {} days, {} with alerts, {} hourly entries skipped -> {}",
        rollup.city,
        rollup.timezone,
        rollup.rows.len(),
        alerts,
        rollup.skipped,
        path.display()
    );

    for row in rollup.rows.iter().filter(|r| r.has_alert()) {
        let mut flags = Vec::new();
        if row.is_hot_day {
            flags.push("hot day");
        }
        if row.is_heavy_rain {
            flags.push("heavy rain");
        }
        if row.is_unhealthy_pm25 {
            flags.push("unhealthy PM2.5");
        }
        println!("  ⚠️  {}: {}", row.date, flags.join(", "));
    }
}

fn print_comparison(result: &ComparisonResult) {
    println!(
        "Ranking by average {} ({}):",
        result.metric,
        result.metric.units()
    );
    for (rank, stat) in result.summary.iter().enumerate() {
        println!(
            "  {}. {:<20} avg {:>10}  max {:>10}  ({} days)",
            rank + 1,
            stat.city,
            stat.avg
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string()),
            stat.max
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string()),
            stat.count
        );
    }

    if let Some(take) = &result.quick_take {
        println!("\n{}", take);
    }
}
