//! Monthly city rankings for the racing-bar charts.

use aqv_core::dataset::{MonthlyRow, MonthlyTable};
use aqv_core::pollutant::Pollutant;
use aqv_core::region::Region;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort direction of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RankOrder {
    /// Lowest value first.
    #[default]
    Best,
    /// Highest value first.
    Worst,
}

impl RankOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankOrder::Best => "best",
            RankOrder::Worst => "worst",
        }
    }

    /// Title word used in chart headings.
    pub fn title(&self) -> &'static str {
        match self {
            RankOrder::Best => "最佳",
            RankOrder::Worst => "最差",
        }
    }
}

impl fmt::Display for RankOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" | "asc" => Ok(RankOrder::Best),
            "worst" | "desc" => Ok(RankOrder::Worst),
            other => Err(format!("unknown rank order '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub city: String,
    pub value: f64,
    /// 1-based position after sorting.
    pub rank: usize,
}

/// The ranking of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankSnapshot {
    /// Month key as found in the table (`2025-01`).
    pub label: String,
    pub entries: Vec<RankEntry>,
}

/// Sort `(city, value)` pairs by `order` and keep the first `top_n`
/// (`0` keeps all). Non-finite values are dropped before ranking. Ties keep
/// their input order.
pub fn rank_cities<'a>(
    values: impl IntoIterator<Item = (&'a str, Option<f64>)>,
    order: RankOrder,
    top_n: usize,
) -> Vec<RankEntry> {
    let mut present: Vec<(&str, f64)> = values
        .into_iter()
        .filter_map(|(city, v)| v.filter(|v| v.is_finite()).map(|v| (city, v)))
        .collect();
    present.sort_by(|a, b| match order {
        RankOrder::Best => a.1.total_cmp(&b.1),
        RankOrder::Worst => b.1.total_cmp(&a.1),
    });
    if top_n > 0 {
        present.truncate(top_n);
    }
    present
        .into_iter()
        .enumerate()
        .map(|(i, (city, value))| RankEntry {
            city: city.to_string(),
            value,
            rank: i + 1,
        })
        .collect()
}

/// Ranking of one monthly row.
pub fn rank_row(table: &MonthlyTable, row: &MonthlyRow, order: RankOrder, top_n: usize) -> RankSnapshot {
    let values = table
        .cities()
        .iter()
        .enumerate()
        .map(|(i, city)| (city.as_str(), row.cell(i)));
    RankSnapshot {
        label: row.label.clone(),
        entries: rank_cities(values, order, top_n),
    }
}

/// One snapshot per row of `table`, in table order.
pub fn build_snapshots(table: &MonthlyTable, order: RankOrder, top_n: usize) -> Vec<RankSnapshot> {
    table
        .rows()
        .iter()
        .map(|row| rank_row(table, row, order, top_n))
        .collect()
}

/// Display form of a month key: `2025-01` and `2501` both read
/// `2025年 01月`.
pub fn format_month_label(label: &str) -> String {
    let label = label.trim();
    let (year, month) = match label.split_once('-') {
        Some((y, m)) => (y, m),
        None if label.len() > 2 && label.is_char_boundary(2) => label.split_at(2),
        None => (label, ""),
    };
    let year = if year.len() == 2 {
        format!("20{}", year)
    } else {
        year.to_string()
    };
    format!("{}年 {}月", year, month)
}

/// Heading of the dynamic ranking chart, e.g. `东北 AQI 最佳排名动态`.
pub fn chart_title(region: Region, pollutant: Pollutant, order: RankOrder) -> String {
    format!("{} {} {}排名动态", region, pollutant, order.title())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> MonthlyTable {
        MonthlyTable::from_csv("month,A,B,C\n2025-01,10,5,NaN\n2025-02,3,8,12\n").unwrap()
    }

    #[test]
    fn test_best_ranking_excludes_missing() {
        let snapshots = build_snapshots(&sample_table(), RankOrder::Best, 0);
        let first = &snapshots[0];
        assert_eq!(first.label, "2025-01");
        assert_eq!(
            first.entries,
            vec![
                RankEntry { city: "B".to_string(), value: 5.0, rank: 1 },
                RankEntry { city: "A".to_string(), value: 10.0, rank: 2 },
            ]
        );
    }

    #[test]
    fn test_worst_ranking_truncates() {
        let snapshots = build_snapshots(&sample_table(), RankOrder::Worst, 2);
        let cities: Vec<&str> = snapshots[1].entries.iter().map(|e| e.city.as_str()).collect();
        assert_eq!(cities, vec!["C", "B"]);
        assert_eq!(snapshots[1].entries[1].rank, 2);
    }

    #[test]
    fn test_rank_cities_drops_non_finite() {
        let entries = rank_cities(
            vec![("x", Some(f64::INFINITY)), ("y", None), ("z", Some(1.0))],
            RankOrder::Best,
            10,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].city, "z");
    }

    #[test]
    fn test_format_month_label() {
        assert_eq!(format_month_label("2025-01"), "2025年 01月");
        assert_eq!(format_month_label("2503"), "2025年 03月");
    }

    #[test]
    fn test_chart_title() {
        assert_eq!(
            chart_title(Region::Northeast, Pollutant::Aqi, RankOrder::Best),
            "东北 AQI 最佳排名动态"
        );
        assert_eq!(
            chart_title(Region::SouthChina, Pollutant::Pm25, RankOrder::Worst),
            "华南 PM2.5 最差排名动态"
        );
    }

    #[test]
    fn test_rank_order_parse() {
        assert_eq!("best".parse::<RankOrder>().unwrap(), RankOrder::Best);
        assert_eq!("WORST".parse::<RankOrder>().unwrap(), RankOrder::Worst);
        assert!("middle".parse::<RankOrder>().is_err());
    }
}
