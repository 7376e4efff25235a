//! Kernel density estimation for per-month value distributions.
//!
//! The bandwidth is a fixed heuristic, `max(observations) / K`, rather than
//! Silverman's rule: the ridgeline chart uses `K = 30` and the raincloud
//! chart `K = 40`. Densities are evaluated on an evenly spaced grid.

use crate::aggregate::{group_by_month, mean};
use aqv_core::observation::DataPoint;
use serde::Serialize;

/// Bandwidth divisor for the ridgeline chart.
pub const RIDGELINE_BANDWIDTH_DIVISOR: f64 = 30.0;
/// Sample points on the ridgeline grid.
pub const RIDGELINE_SAMPLE_POINTS: usize = 40;
/// Bandwidth divisor for the raincloud chart.
pub const RAINCLOUD_BANDWIDTH_DIVISOR: f64 = 40.0;
/// Sample points on the raincloud grid.
pub const RAINCLOUD_SAMPLE_POINTS: usize = 100;

/// Density of the distribution at `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
}

/// Epanechnikov kernel with bandwidth `bandwidth`, evaluated at the raw
/// offset `offset` (not yet divided by the bandwidth).
pub fn epanechnikov(bandwidth: f64, offset: f64) -> f64 {
    let u = offset / bandwidth;
    if u.abs() <= 1.0 {
        0.75 * (1.0 - u * u) / bandwidth
    } else {
        0.0
    }
}

/// Kernel density estimate of `observations` at each of `sample_points`.
///
/// Each density is the mean of the kernel over all observations. An empty
/// observation set, or a bandwidth that is not a positive finite number,
/// yields zero density everywhere.
pub fn kde(bandwidth: f64, sample_points: &[f64], observations: &[f64]) -> Vec<DensityPoint> {
    let usable = !observations.is_empty() && bandwidth.is_finite() && bandwidth > 0.0;
    sample_points
        .iter()
        .map(|&x| {
            let density = if usable {
                let sum: f64 = observations
                    .iter()
                    .map(|&obs| epanechnikov(bandwidth, x - obs))
                    .sum();
                sum / observations.len() as f64
            } else {
                0.0
            };
            DensityPoint { x, density }
        })
        .collect()
}

/// `max(observations) / divisor`, or 0 when there are no observations.
pub fn heuristic_bandwidth(observations: &[f64], divisor: f64) -> f64 {
    observations
        .iter()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
        .map(|max| max / divisor)
        .unwrap_or(0.0)
}

/// `count` evenly spaced points covering `[0, domain_max]`, both ends
/// included. A non-positive domain collapses onto `[0]`.
pub fn sample_grid(domain_max: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 || !(domain_max.is_finite() && domain_max > 0.0) {
        return vec![0.0];
    }
    let step = domain_max / (count - 1) as f64;
    (0..count)
        .map(|i| if i == count - 1 { domain_max } else { i as f64 * step })
        .collect()
}

/// Density curve and summary of one month of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDensity {
    /// Zero-based month (0 = January).
    pub month_index: usize,
    pub mean: f64,
    pub max_density: f64,
    pub curve: Vec<DensityPoint>,
}

/// KDE of each month of `points`, sharing one bandwidth and grid.
pub fn monthly_densities(points: &[DataPoint], bandwidth: f64, grid: &[f64]) -> Vec<MonthDensity> {
    group_by_month(points)
        .into_iter()
        .map(|(month_index, month_points)| {
            let values: Vec<f64> = month_points.iter().map(|p| p.value).collect();
            let curve = kde(bandwidth, grid, &values);
            let max_density = curve.iter().map(|p| p.density).fold(0.0, f64::max);
            MonthDensity {
                month_index,
                mean: mean(values.iter().copied()).unwrap_or(0.0),
                max_density,
                curve,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn kernel_is_zero_outside_support() {
        assert_eq!(epanechnikov(2.0, 0.0), 0.375);
        assert_eq!(epanechnikov(2.0, 2.0), 0.0);
        assert_eq!(epanechnikov(2.0, -2.5), 0.0);
        assert!(epanechnikov(2.0, 1.0) > 0.0);
    }

    #[test]
    fn kde_single_observation_peaks_at_observation() {
        let grid = [0.0, 5.0, 10.0];
        let curve = kde(2.0, &grid, &[5.0]);
        assert_eq!(curve[0].density, 0.0);
        assert_eq!(curve[1], DensityPoint { x: 5.0, density: 0.375 });
        assert_eq!(curve[2].density, 0.0);
    }

    #[test]
    fn kde_is_mean_over_observations() {
        let curve = kde(2.0, &[5.0], &[5.0, 100.0]);
        assert_eq!(curve[0].density, 0.375 / 2.0);
    }

    #[test]
    fn kde_is_bit_identical_across_calls() {
        let observations: Vec<f64> = (0..200).map(|i| ((i * 37) % 113) as f64 * 1.7).collect();
        let bandwidth = heuristic_bandwidth(&observations, RAINCLOUD_BANDWIDTH_DIVISOR);
        let grid = sample_grid(200.0, RAINCLOUD_SAMPLE_POINTS);
        let first = kde(bandwidth, &grid, &observations);
        let second = kde(bandwidth, &grid, &observations);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.density.to_bits(), b.density.to_bits());
        }
    }

    #[test]
    fn kde_degenerate_inputs_give_zero_density() {
        let grid = sample_grid(10.0, 5);
        assert!(kde(1.0, &grid, &[]).iter().all(|p| p.density == 0.0));
        assert!(kde(0.0, &grid, &[1.0]).iter().all(|p| p.density == 0.0));
        assert!(kde(f64::NAN, &grid, &[1.0]).iter().all(|p| p.density == 0.0));
    }

    #[test]
    fn bandwidth_heuristic() {
        assert_eq!(heuristic_bandwidth(&[30.0, 90.0, 60.0], RIDGELINE_BANDWIDTH_DIVISOR), 3.0);
        assert_eq!(heuristic_bandwidth(&[], 30.0), 0.0);
    }

    #[test]
    fn grid_is_evenly_spaced_and_inclusive() {
        let grid = sample_grid(100.0, RIDGELINE_SAMPLE_POINTS);
        assert_eq!(grid.len(), RIDGELINE_SAMPLE_POINTS);
        assert_eq!(grid[0], 0.0);
        assert_eq!(*grid.last().unwrap(), 100.0);
        assert_eq!(sample_grid(0.0, 10), vec![0.0]);
        assert!(sample_grid(5.0, 0).is_empty());
    }

    #[test]
    fn monthly_densities_group_by_month() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let points = vec![
            DataPoint::new(d(1, 1), 10.0),
            DataPoint::new(d(1, 2), 20.0),
            DataPoint::new(d(4, 1), 40.0),
        ];
        let grid = sample_grid(40.0, 41);
        let months = monthly_densities(&points, 4.0, &grid);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month_index, 0);
        assert_eq!(months[0].mean, 15.0);
        assert_eq!(months[1].month_index, 3);
        assert!(months[1].max_density > 0.0);
        assert_eq!(months[1].curve.len(), 41);
    }
}
