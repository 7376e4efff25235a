//! Data processing for air-quality observations.
//!
//! This crate turns validated daily tables into forms suitable for
//! charting: national means, per-city series, per-month density curves,
//! normalized radar values, color stops and ranking snapshots. Everything
//! here is a pure function of its inputs.

pub mod aggregate;
pub mod calendar;
pub mod density;
pub mod normalize;
pub mod ranking;
