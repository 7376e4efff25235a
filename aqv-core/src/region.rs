use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Embedded city → macro-region membership table.
pub static CITY_REGIONS_CSV: &str = include_str!("../../fixtures/city_regions.csv");

/// One of the seven fixed macro-regions used to group cities for ranking.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "东北")]
    Northeast,
    #[serde(rename = "华北")]
    NorthChina,
    #[serde(rename = "华东")]
    EastChina,
    #[serde(rename = "华南")]
    SouthChina,
    #[serde(rename = "华中")]
    CentralChina,
    #[serde(rename = "西南")]
    Southwest,
    #[serde(rename = "西北")]
    Northwest,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::Northeast,
        Region::NorthChina,
        Region::EastChina,
        Region::SouthChina,
        Region::CentralChina,
        Region::Southwest,
        Region::Northwest,
    ];

    /// Region name as used in monthly ranking file names.
    pub fn name(&self) -> &'static str {
        match self {
            Region::Northeast => "东北",
            Region::NorthChina => "华北",
            Region::EastChina => "华东",
            Region::SouthChina => "华南",
            Region::CentralChina => "华中",
            Region::Southwest => "西南",
            Region::Northwest => "西北",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| format!("unknown region '{}'", s))
    }
}

/// Static mapping from city name to macro-region.
///
/// Cities missing from the table default to [`Region::NorthChina`].
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    /// Cities in table order, with their region.
    entries: Vec<(String, Region)>,
    lookup: HashMap<String, Region>,
}

impl RegionTable {
    pub const DEFAULT_REGION: Region = Region::NorthChina;

    /// Parse a `CITY,REGION` table (with headers). Rows naming an unknown
    /// region are skipped.
    pub fn parse(csv_data: &str) -> anyhow::Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        let mut table = RegionTable::default();
        for record in rdr.records() {
            let r = record?;
            let city = r.get(0).unwrap_or("").trim();
            let region = r.get(1).unwrap_or("").trim();
            if city.is_empty() {
                continue;
            }
            match region.parse::<Region>() {
                Ok(region) => {
                    if table.lookup.insert(city.to_string(), region).is_none() {
                        table.entries.push((city.to_string(), region));
                    }
                }
                Err(e) => log::warn!("[AQV] region table: skipping {}: {}", city, e),
            }
        }
        Ok(table)
    }

    /// The table compiled into the binary.
    pub fn embedded() -> Self {
        match Self::parse(CITY_REGIONS_CSV) {
            Ok(table) => table,
            Err(e) => {
                log::warn!("[AQV] region table: embedded table unreadable: {}", e);
                RegionTable::default()
            }
        }
    }

    pub fn region_of(&self, city: &str) -> Region {
        self.lookup
            .get(city)
            .copied()
            .unwrap_or(Self::DEFAULT_REGION)
    }

    pub fn contains(&self, city: &str) -> bool {
        self.lookup.contains_key(city)
    }

    /// Cities listed for `region`, in table order.
    pub fn cities_in(&self, region: Region) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, r)| *r == region)
            .map(|(c, _)| c.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_table_covers_all_regions() {
        let table = RegionTable::embedded();
        assert!(table.len() > 250);
        for region in Region::ALL {
            assert!(!table.cities_in(region).is_empty(), "{} has no cities", region);
        }
        assert_eq!(table.region_of("沈阳"), Region::Northeast);
        assert_eq!(table.region_of("上海"), Region::EastChina);
        assert_eq!(table.region_of("克拉玛依"), Region::Northwest);
    }

    #[test]
    fn test_unknown_city_defaults_to_north_china() {
        let table = RegionTable::embedded();
        assert!(!table.contains("香港"));
        assert_eq!(table.region_of("香港"), Region::NorthChina);
    }

    #[test]
    fn test_parse_skips_unknown_regions() {
        let table = RegionTable::parse("CITY,REGION\nA,东北\nB,火星\nC,西南\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cities_in(Region::Southwest), vec!["C"]);
    }

    #[test]
    fn test_region_name_round_trip() {
        for region in Region::ALL {
            assert_eq!(region.name().parse::<Region>().unwrap(), region);
        }
        assert!("North".parse::<Region>().is_err());
    }
}
