use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single (date, value) pair: the unit every time-series chart consumes.
///
/// `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A numeric reading for one city on one day. Only finite values are ever
/// materialized as observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub city: String,
    pub value: f64,
}
