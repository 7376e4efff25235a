//! One-shot queries printed as CSV or JSON.

use aqv_core::pollutant::{Metric, Pollutant};
use aqv_db::models::DateValue;
use aqv_db::DataStore;
use aqv_utils::dates::parse_date;
use chrono::Datelike;
use clap::ValueEnum;
use log::info;
use serde::Serialize;
use std::io::Write;

/// Which density chart `density` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DensityKind {
    Ridgeline,
    Raincloud,
}

/// Write `rows` as `date,value` CSV to `output`, or stdout when `None`.
pub fn write_series(rows: &[DateValue], output: Option<&str>) -> anyhow::Result<()> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut wtr = csv::Writer::from_writer(sink);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    if let Some(path) = output {
        info!("[AQV] wrote {} rows to {}", rows.len(), path);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print one line per loaded daily dataset, or the summaries as JSON.
pub fn run_summary(store: &DataStore, json: bool) -> anyhow::Result<()> {
    let summaries = store.query_dataset_summaries();
    if json {
        return print_json(&summaries);
    }
    println!(
        "year {}: {} registry cities, {} days",
        store.year(),
        store.registry().len(),
        store.date_index().len()
    );
    for s in &summaries {
        println!(
            "{:<6} {:<5} {:>5} rows {:>4} cities  {} .. {}",
            s.pollutant.as_str(),
            s.metric.as_str(),
            s.rows,
            s.cities,
            s.first_date.as_deref().unwrap_or("-"),
            s.last_date.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// National daily mean, or the daily means of one month.
pub fn run_national(
    store: &DataStore,
    pollutant: Pollutant,
    month: Option<u32>,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let rows = match month {
        Some(m) if !(1..=12).contains(&m) => anyhow::bail!("month {} is not in 1-12", m),
        Some(m) => store.query_national_monthly_mean(pollutant, m),
        None => store.query_national_daily_mean(pollutant),
    };
    write_series(&rows, output)
}

pub fn run_city(
    store: &DataStore,
    city: &str,
    pollutant: Pollutant,
    metric: Metric,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let rows = store.query_city_year_series(city, pollutant, metric);
    if rows.is_empty() {
        log::warn!("[AQV] no {} {} readings for {}", pollutant, metric, city);
    }
    write_series(&rows, output)
}

#[derive(Serialize)]
struct RadarReport {
    info: aqv_db::models::InfoPanel,
    city: Vec<aqv_db::models::RadarAxis>,
    national: Vec<aqv_db::models::RadarAxis>,
}

/// City and national radar for one day, given as `YYYY-MM-DD`. Dates past
/// the loaded data clamp onto the last day.
pub fn run_radar(store: &DataStore, city: &str, pollutant: Pollutant, date: &str) -> anyhow::Result<()> {
    let date = parse_date(date)?;
    let index = store.date_index().index_from_date(date.month(), date.day());
    print_json(&RadarReport {
        info: store.query_info_panel(city, pollutant, index),
        city: store.query_city_radar(city, index),
        national: store.query_national_radar(index),
    })
}

pub fn run_density(store: &DataStore, city: &str, pollutant: Pollutant, kind: DensityKind) -> anyhow::Result<()> {
    match kind {
        DensityKind::Ridgeline => print_json(&store.query_ridgeline(city, pollutant)),
        DensityKind::Raincloud => print_json(&store.query_raincloud(city, pollutant)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_series_to_file() {
        let path = std::env::temp_dir().join(format!("aqv-series-{}.csv", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        let rows = vec![
            DateValue {
                date: "2025-01-01".to_string(),
                value: 50.0,
            },
            DateValue {
                date: "2025-01-02".to_string(),
                value: 62.5,
            },
        ];
        write_series(&rows, Some(&path_str)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "date,value\n2025-01-01,50.0\n2025-01-02,62.5\n");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_national_rejects_bad_month() {
        let store = DataStore::new(2025, Pollutant::Aqi);
        assert!(run_national(&store, Pollutant::Aqi, Some(13), None).is_err());
    }

    #[test]
    fn test_radar_rejects_bad_date() {
        let store = DataStore::new(2025, Pollutant::Aqi);
        assert!(run_radar(&store, "北京", Pollutant::Aqi, "2025/13/01").is_err());
    }
}
