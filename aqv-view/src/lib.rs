//! Dashboard navigation and animation state.
//!
//! This crate provides:
//! - `config`: `DashboardConfig` defaults (year, city, pollutant, ranking)
//! - `state`: the `ViewState` navigation machine and its transition errors
//! - `observer`: `ViewObserver` subscriptions notified on every change
//! - `animator`: `RankAnimator`, the deadline-polled ranking animation
//! - `dashboard`: `Dashboard`, the application context tying them together

pub mod animator;
pub mod config;
pub mod dashboard;
pub mod observer;
pub mod state;
