//! Per-pollutant scaling and color policy.
//!
//! Every pollutant carries one [`PollutantProfile`]: six ascending color
//! breakpoints paired with six colors, a radar normalization maximum and a
//! heatmap saturation maximum. The two maxima are separate
//! tables; the radar axes use wider ranges than the heatmap intensity.

use aqv_core::pollutant::Pollutant;
use serde::{Serialize, Serializer};
use std::fmt;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Linear blend between `self` (t = 0) and `other` (t = 1), rounded per
    /// channel.
    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb(
            channel(self.0, other.0),
            channel(self.1, other.1),
            channel(self.2, other.2),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The air-quality palette, from good (green) to hazardous (maroon).
pub const AQI_COLORS: [Rgb; 6] = [
    Rgb::from_hex(0x00E400),
    Rgb::from_hex(0xFFFF00),
    Rgb::from_hex(0xFF7E00),
    Rgb::from_hex(0xFF0000),
    Rgb::from_hex(0x99004C),
    Rgb::from_hex(0x7E0023),
];

/// Scaling and color parameters for one pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PollutantProfile {
    pub pollutant: Pollutant,
    /// Strictly ascending, starting at 0.
    pub breakpoints: [f64; 6],
    pub colors: [Rgb; 6],
    /// Value mapped to 1.0 on a radar axis.
    pub radar_max: f64,
    /// Value at which heatmap intensity saturates.
    pub heatmap_max: f64,
}

/// The profile of `pollutant`.
pub fn profile(pollutant: Pollutant) -> PollutantProfile {
    let (breakpoints, radar_max, heatmap_max) = match pollutant {
        Pollutant::Aqi => ([0.0, 50.0, 100.0, 150.0, 200.0, 300.0], 300.0, 200.0),
        Pollutant::Pm25 => ([0.0, 35.0, 75.0, 115.0, 150.0, 250.0], 200.0, 150.0),
        Pollutant::Pm10 => ([0.0, 50.0, 150.0, 250.0, 350.0, 420.0], 200.0, 150.0),
        Pollutant::Co => ([0.0, 2.0, 4.0, 14.0, 24.0, 36.0], 5.0, 2.0),
        Pollutant::No2 => ([0.0, 40.0, 80.0, 180.0, 280.0, 565.0], 200.0, 80.0),
        Pollutant::So2 => ([0.0, 10.0, 20.0, 40.0, 60.0, 100.0], 100.0, 80.0),
        Pollutant::O3 => ([0.0, 100.0, 160.0, 215.0, 265.0, 800.0], 200.0, 160.0),
    };
    PollutantProfile {
        pollutant,
        breakpoints,
        colors: AQI_COLORS,
        radar_max,
        heatmap_max,
    }
}

/// Radar axis value: `value / radar_max`, clamped to `[0, 1]`.
///
/// A missing or non-finite value normalizes to 0.
pub fn normalize(pollutant: Pollutant, value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => (v / profile(pollutant).radar_max).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Heatmap intensity: `value / heatmap_max`, clamped to `[0, 1]`.
pub fn heat_intensity(pollutant: Pollutant, value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value / profile(pollutant).heatmap_max).clamp(0.0, 1.0)
}

/// Continuous color: linear RGB interpolation between the two breakpoints
/// surrounding `value`. Values outside the breakpoint range take the end
/// colors.
pub fn color_for(pollutant: Pollutant, value: f64) -> Rgb {
    let p = profile(pollutant);
    let stops = &p.breakpoints;
    if !value.is_finite() || value <= stops[0] {
        return p.colors[0];
    }
    for i in 1..stops.len() {
        if value <= stops[i] {
            let t = (value - stops[i - 1]) / (stops[i] - stops[i - 1]);
            return p.colors[i - 1].lerp(&p.colors[i], t);
        }
    }
    p.colors[p.colors.len() - 1]
}

/// Stepped color: the color of the first breakpoint not below `value`.
pub fn band_color(pollutant: Pollutant, value: f64) -> Rgb {
    let p = profile(pollutant);
    p.breakpoints
        .iter()
        .position(|&stop| value <= stop)
        .map(|i| p.colors[i])
        .unwrap_or(p.colors[p.colors.len() - 1])
}

/// AQI category of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AqiLevel {
    Excellent,
    Good,
    LightlyPolluted,
    ModeratelyPolluted,
    HeavilyPolluted,
    SeverelyPolluted,
}

impl AqiLevel {
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            AqiLevel::Excellent
        } else if aqi <= 100.0 {
            AqiLevel::Good
        } else if aqi <= 150.0 {
            AqiLevel::LightlyPolluted
        } else if aqi <= 200.0 {
            AqiLevel::ModeratelyPolluted
        } else if aqi <= 300.0 {
            AqiLevel::HeavilyPolluted
        } else {
            AqiLevel::SeverelyPolluted
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Excellent => "优",
            AqiLevel::Good => "良",
            AqiLevel::LightlyPolluted => "轻度污染",
            AqiLevel::ModeratelyPolluted => "中度污染",
            AqiLevel::HeavilyPolluted => "重度污染",
            AqiLevel::SeverelyPolluted => "严重污染",
        }
    }
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category shown in ranking tooltips.
pub fn level_label(aqi: f64) -> AqiLevel {
    AqiLevel::from_aqi(aqi)
}

/// One piece of a stepped legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
}

fn format_stop(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Legend for the stepped map colors: `"a-b"` per band, `">a"` for the last.
pub fn legend_entries(pollutant: Pollutant) -> Vec<LegendEntry> {
    let p = profile(pollutant);
    let n = p.breakpoints.len();
    (0..n)
        .map(|i| {
            let start = format_stop(p.breakpoints[i]);
            let label = if i + 1 < n {
                format!("{}-{}", start, format_stop(p.breakpoints[i + 1]))
            } else {
                format!(">{}", start)
            };
            LegendEntry {
                label,
                color: p.colors[i],
            }
        })
        .collect()
}

/// Tick values of the heatmap legend: 0, half and full saturation.
pub fn heat_legend_ticks(pollutant: Pollutant) -> [f64; 3] {
    let max = profile(pollutant).heatmap_max;
    [0.0, max / 2.0, max]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_are_well_formed() {
        for pollutant in Pollutant::ALL {
            let p = profile(pollutant);
            assert_eq!(p.breakpoints[0], 0.0);
            assert!(p.breakpoints.windows(2).all(|w| w[0] < w[1]), "{}", pollutant);
            assert!(p.radar_max > 0.0);
            assert!(p.heatmap_max > 0.0);
        }
    }

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(normalize(Pollutant::Aqi, Some(600.0)), 1.0);
        assert_eq!(normalize(Pollutant::Aqi, Some(-5.0)), 0.0);
        assert_eq!(normalize(Pollutant::Aqi, Some(150.0)), 0.5);
        assert_eq!(normalize(Pollutant::Co, Some(2.5)), 0.5);
        assert_eq!(normalize(Pollutant::So2, None), 0.0);
        assert_eq!(normalize(Pollutant::So2, Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_radar_and_heatmap_tables_differ() {
        assert_eq!(normalize(Pollutant::Aqi, Some(200.0)), 2.0 / 3.0);
        assert_eq!(heat_intensity(Pollutant::Aqi, 200.0), 1.0);
        assert_eq!(heat_intensity(Pollutant::Co, 1.0), 0.5);
        assert_eq!(heat_intensity(Pollutant::O3, 1000.0), 1.0);
    }

    #[test]
    fn test_color_at_breakpoints() {
        assert_eq!(color_for(Pollutant::Aqi, 50.0), Rgb::from_hex(0xFFFF00));
        assert_eq!(color_for(Pollutant::Aqi, 100.0), Rgb::from_hex(0xFF7E00));
        assert_eq!(color_for(Pollutant::Aqi, 0.0), Rgb::from_hex(0x00E400));
        assert_eq!(color_for(Pollutant::Aqi, 900.0), Rgb::from_hex(0x7E0023));
    }

    #[test]
    fn test_color_interpolates() {
        // halfway between #00E400 and #FFFF00
        assert_eq!(color_for(Pollutant::Aqi, 25.0), Rgb(128, 242, 0));
        assert_eq!(color_for(Pollutant::Aqi, 25.0).to_string(), "#80F200");
    }

    #[test]
    fn test_band_color_steps() {
        assert_eq!(band_color(Pollutant::Aqi, 0.0), Rgb::from_hex(0x00E400));
        assert_eq!(band_color(Pollutant::Aqi, 30.0), Rgb::from_hex(0xFFFF00));
        assert_eq!(band_color(Pollutant::Aqi, 50.0), Rgb::from_hex(0xFFFF00));
        assert_eq!(band_color(Pollutant::Aqi, 301.0), Rgb::from_hex(0x7E0023));
    }

    #[test]
    fn test_aqi_levels() {
        assert_eq!(AqiLevel::from_aqi(50.0).label(), "优");
        assert_eq!(AqiLevel::from_aqi(51.0).label(), "良");
        assert_eq!(AqiLevel::from_aqi(150.0).label(), "轻度污染");
        assert_eq!(AqiLevel::from_aqi(200.0).label(), "中度污染");
        assert_eq!(level_label(300.0).label(), "重度污染");
        assert_eq!(AqiLevel::from_aqi(301.0).to_string(), "严重污染");
    }

    #[test]
    fn test_legend() {
        let entries = legend_entries(Pollutant::Pm25);
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].label, "0-35");
        assert_eq!(entries[5].label, ">250");
        assert_eq!(heat_legend_ticks(Pollutant::No2), [0.0, 40.0, 80.0]);
    }

    #[test]
    fn test_rgb_serializes_as_hex() {
        let json = serde_json::to_string(&Rgb::from_hex(0x99004C)).unwrap();
        assert_eq!(json, "\"#99004C\"");
    }
}
