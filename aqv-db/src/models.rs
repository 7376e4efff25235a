//! Query result models.
//!
//! All structs derive `Serialize` so they can be handed to a renderer (or
//! printed by the CLI) as JSON.

use aqv_core::observation::DataPoint;
use aqv_core::pollutant::{Metric, Pollutant};
use aqv_data::aggregate::MonthMean;
use aqv_data::density::{DensityPoint, MonthDensity};
use aqv_data::normalize::Rgb;
use aqv_utils::dates::format_date;
use serde::Serialize;

/// A single (date, value) pair used for line chart data points.
///
/// `date` is formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateValue {
    pub date: String,
    pub value: f64,
}

impl From<&DataPoint> for DateValue {
    fn from(p: &DataPoint) -> Self {
        Self {
            date: format_date(&p.date),
            value: p.value,
        }
    }
}

/// Convert a series into line chart points.
pub fn date_values(points: &[DataPoint]) -> Vec<DateValue> {
    points.iter().map(DateValue::from).collect()
}

/// One city on the daily map.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CityMapValue {
    pub city: String,
    pub value: f64,
    /// Heatmap intensity in [0, 1].
    pub intensity: f64,
    pub color: Rgb,
}

/// One spoke of the radar chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RadarAxis {
    pub axis: Pollutant,
    /// Normalized value in [0, 1].
    pub value: f64,
    /// Raw reading; `None` when the cell was missing.
    pub original_value: Option<f64>,
}

/// The side panel describing the selected city and day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InfoPanel {
    pub city: String,
    /// Empty when the date index is outside the dataset.
    pub date: String,
    pub value: Option<f64>,
    pub unit: &'static str,
}

/// Per-month density ridges of one city.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RidgelineData {
    pub city: String,
    pub pollutant: Pollutant,
    pub bandwidth: f64,
    pub x_max: f64,
    pub months: Vec<MonthDensity>,
}

/// One month of the raincloud chart: the density "cloud", its mean and the
/// raw readings ("rain").
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RaincloudMonth {
    pub month_index: usize,
    pub mean: f64,
    pub curve: Vec<DensityPoint>,
    pub points: Vec<f64>,
}

/// Raincloud chart of one city, with the national monthly means overlaid.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RaincloudData {
    pub city: String,
    pub pollutant: Pollutant,
    pub bandwidth: f64,
    pub y_max: f64,
    pub months: Vec<RaincloudMonth>,
    pub national_means: Vec<MonthMean>,
}

/// City against national mean for the days of one month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthDetailData {
    pub city: String,
    pub pollutant: Pollutant,
    /// 1-12.
    pub month: u32,
    pub city_series: Vec<DateValue>,
    pub national_series: Vec<DateValue>,
}

/// Shape of one loaded daily dataset.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasetSummary {
    pub pollutant: Pollutant,
    pub metric: Metric,
    pub rows: usize,
    pub cities: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}
