use crate::normalize::{color_for, Rgb};
use aqv_core::observation::DataPoint;
use aqv_core::pollutant::Pollutant;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// One day of the calendar heatmap. Each month is laid out as a 7-column
/// grid whose first row starts on Sunday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// Zero-based month (0 = January).
    pub month_index: usize,
    /// Day of week, 0 = Sunday.
    pub column: u32,
    /// Week row within the month block.
    pub row: u32,
    pub value: f64,
    pub color: Rgb,
}

/// Grid position of `date` within its month block.
pub fn grid_position(date: &NaiveDate) -> (u32, u32) {
    let offset = date
        .with_day(1)
        .map(|first| first.weekday().num_days_from_sunday())
        .unwrap_or(0);
    let grid_index = date.day() + offset - 1;
    (grid_index % 7, grid_index / 7)
}

/// Calendar cells for a series, in input order.
pub fn calendar_cells(points: &[DataPoint], pollutant: Pollutant) -> Vec<CalendarCell> {
    points
        .iter()
        .map(|p| {
            let (column, row) = grid_position(&p.date);
            CalendarCell {
                date: p.date,
                month_index: p.date.month0() as usize,
                column,
                row,
                value: p.value,
                color: color_for(pollutant, p.value),
            }
        })
        .collect()
}
