//! Wide city tables: one row per day (or month), one column per city.
//!
//! Cells are parsed exactly once, here. Empty, non-numeric and non-finite
//! cells become `None`, so downstream aggregation never re-validates shape.

use crate::observation::{DataPoint, Observation};
use aqv_utils::dates::parse_dataset_date;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashMap;

/// Parse a raw cell into a finite number.
pub fn parse_cell(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One day of readings, with cells parallel to [`Dataset::cities`].
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRow {
    pub date: NaiveDate,
    cells: Vec<Option<f64>>,
}

impl DailyRow {
    pub fn new(date: NaiveDate, cells: Vec<Option<f64>>) -> Self {
        Self { date, cells }
    }

    /// Value in column `column`, if numeric.
    pub fn cell(&self, column: usize) -> Option<f64> {
        self.cells.get(column).copied().flatten()
    }

    pub fn cells(&self) -> &[Option<f64>] {
        &self.cells
    }
}

/// A daily dataset for one pollutant and metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    cities: Vec<String>,
    columns: HashMap<String, usize>,
    rows: Vec<DailyRow>,
}

impl Dataset {
    /// Build a dataset from already-validated rows. Rows shorter than
    /// `cities` read as missing for the trailing cities.
    pub fn new(cities: Vec<String>, rows: Vec<DailyRow>) -> Self {
        let mut columns = HashMap::with_capacity(cities.len());
        for (i, city) in cities.iter().enumerate() {
            columns.entry(city.clone()).or_insert(i);
        }
        Self {
            cities,
            columns,
            rows,
        }
    }

    /// Parse a daily CSV export.
    ///
    /// Expected format (with headers): `date,<city>,<city>,...`. The date
    /// column is located by name and defaults to the first column. Rows
    /// with an empty or unparseable date are skipped.
    ///
    /// # Example CSV
    /// ```text
    /// date,北京,天津
    /// 2025-01-01,57,88
    /// 2025-01-02,,93
    /// ```
    pub fn from_csv(csv_data: &str) -> anyhow::Result<Self> {
        let table = parse_wide(csv_data, "date")?;
        let mut rows = Vec::with_capacity(table.rows.len());
        let mut skipped = 0u32;
        for (key, cells) in table.rows {
            match parse_dataset_date(&key) {
                Ok(date) => rows.push(DailyRow::new(date, cells)),
                Err(_) => skipped += 1,
            }
        }
        log::info!(
            "[AQV] loader: parsed {} daily rows x {} cities, skipped {} undated",
            rows.len(),
            table.cities.len(),
            skipped
        );
        Ok(Self::new(table.cities, rows))
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn rows(&self) -> &[DailyRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DailyRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column index of `city`.
    pub fn column(&self, city: &str) -> Option<usize> {
        self.columns.get(city).copied()
    }

    pub fn has_city(&self, city: &str) -> bool {
        self.columns.contains_key(city)
    }

    /// Numeric value of `city` at row `index`.
    pub fn value(&self, index: usize, city: &str) -> Option<f64> {
        let column = self.column(city)?;
        self.row(index)?.cell(column)
    }

    /// A copy holding only the rows whose date satisfies `keep`.
    pub fn retain_dates(&self, keep: impl Fn(&NaiveDate) -> bool) -> Self {
        Self {
            cities: self.cities.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(&r.date)).cloned().collect(),
        }
    }

    /// Numeric readings of one city in row order.
    pub fn series(&self, city: &str) -> Vec<DataPoint> {
        let Some(column) = self.column(city) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.cell(column).map(|v| DataPoint::new(r.date, v)))
            .collect()
    }

    /// All numeric readings of the row at `index`, as observations.
    pub fn observations_at(&self, index: usize) -> Vec<Observation> {
        let Some(row) = self.row(index) else {
            return Vec::new();
        };
        self.cities
            .iter()
            .enumerate()
            .filter_map(|(i, city)| {
                row.cell(i).map(|value| Observation {
                    date: row.date,
                    city: city.clone(),
                    value,
                })
            })
            .collect()
    }
}

/// One row of a monthly table, keyed by its month label (`2025-01`).
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    pub label: String,
    cells: Vec<Option<f64>>,
}

impl MonthlyRow {
    pub fn new(label: impl Into<String>, cells: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            cells,
        }
    }

    pub fn cell(&self, column: usize) -> Option<f64> {
        self.cells.get(column).copied().flatten()
    }
}

/// Monthly per-city values (e.g. `AQI_monthmean_东北.csv`), the input of
/// the ranking charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyTable {
    cities: Vec<String>,
    rows: Vec<MonthlyRow>,
}

impl MonthlyTable {
    pub fn new(cities: Vec<String>, rows: Vec<MonthlyRow>) -> Self {
        Self { cities, rows }
    }

    /// Parse a monthly CSV export.
    ///
    /// Expected format (with headers): `month,<city>,<city>,...`.
    /// Rows with an empty month label are skipped.
    pub fn from_csv(csv_data: &str) -> anyhow::Result<Self> {
        let table = parse_wide(csv_data, "month")?;
        let rows: Vec<MonthlyRow> = table
            .rows
            .into_iter()
            .filter(|(label, _)| !label.is_empty())
            .map(|(label, cells)| MonthlyRow::new(label, cells))
            .collect();
        log::info!(
            "[AQV] loader: parsed {} monthly rows x {} cities",
            rows.len(),
            table.cities.len()
        );
        Ok(Self::new(table.cities, rows))
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn rows(&self) -> &[MonthlyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct WideTable {
    cities: Vec<String>,
    rows: Vec<(String, Vec<Option<f64>>)>,
}

/// Shared reader for `<key>,<city>...` tables.
fn parse_wide(csv_data: &str, key: &str) -> anyhow::Result<WideTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers = rdr.headers()?.clone();
    let names: Vec<&str> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();
    let key_column = names
        .iter()
        .position(|h| h.eq_ignore_ascii_case(key))
        .unwrap_or(0);
    let city_columns: Vec<(usize, String)> = names
        .iter()
        .enumerate()
        .filter(|(i, name)| *i != key_column && !name.is_empty())
        .map(|(i, name)| (i, name.to_string()))
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let r = record?;
        let key_value = r.get(key_column).unwrap_or("").trim().to_string();
        let cells = city_columns
            .iter()
            .map(|(i, _)| r.get(*i).and_then(parse_cell))
            .collect();
        rows.push((key_value, cells));
    }

    Ok(WideTable {
        cities: city_columns.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}
