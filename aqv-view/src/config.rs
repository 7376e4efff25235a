//! Dashboard defaults.
//!
//! `DashboardConfig` bundles every startup value the dashboard needs.
//! The CLI builds one from `Default` and overrides fields from its flags.

use aqv_core::pollutant::Pollutant;
use aqv_core::region::Region;
use aqv_data::ranking::RankOrder;
use std::time::Duration;

/// Frame intervals offered by the speed control, slowest first.
pub const SPEED_OPTIONS_MS: [u64; 3] = [3000, 2000, 1000];

/// What the dynamic ranking chart shows and how fast it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSettings {
    pub region: Region,
    pub order: RankOrder,
    /// Cities per frame; 0 shows all.
    pub top_n: usize,
    pub interval: Duration,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            region: Region::Northeast,
            order: RankOrder::Best,
            top_n: 15,
            interval: Duration::from_millis(2000),
        }
    }
}

/// Startup configuration of a [`crate::dashboard::Dashboard`].
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Year shown by the dashboard.
    pub year: i32,
    /// City selected before any map interaction.
    pub default_city: String,
    pub default_pollutant: Pollutant,
    /// Pollutant whose dataset decides which cities report data.
    pub registry_pollutant: Pollutant,
    pub rank: RankSettings,
    /// Cities in the drill-down mini ranking.
    pub mini_rank_top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            year: 2025,
            default_city: "北京".to_string(),
            default_pollutant: Pollutant::Aqi,
            registry_pollutant: Pollutant::Aqi,
            rank: RankSettings::default(),
            mini_rank_top_n: 10,
        }
    }
}
