use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A monitored pollutant (or the composite AQI index).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "AQI")]
    Aqi,
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "SO2")]
    So2,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "O3")]
    O3,
}

impl Pollutant {
    /// All pollutants in the order the dashboard lists them.
    pub const ALL: [Pollutant; 7] = [
        Pollutant::Aqi,
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::So2,
        Pollutant::No2,
        Pollutant::Co,
        Pollutant::O3,
    ];

    /// Name as used in dataset file names and column headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Aqi => "AQI",
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::So2 => "SO2",
            Pollutant::No2 => "NO2",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O3",
        }
    }

    /// Concentration unit; AQI is dimensionless.
    pub fn unit(&self) -> &'static str {
        match self {
            Pollutant::Aqi => "",
            Pollutant::Co => "mg/m³",
            _ => "μg/m³",
        }
    }

    /// Parse the pollutant list file: one pollutant per row in the first
    /// column, with a header row. Unknown names are skipped. An empty list
    /// falls back to [`Pollutant::ALL`].
    pub fn parse_list(csv_data: &str) -> anyhow::Result<Vec<Pollutant>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        let mut result = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let name = record.get(0).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            match name.parse::<Pollutant>() {
                Ok(p) if !result.contains(&p) => result.push(p),
                Ok(_) => {}
                Err(e) => log::warn!("[AQV] pollutant list: {}", e),
            }
        }
        if result.is_empty() {
            result = Pollutant::ALL.to_vec();
        }
        Ok(result)
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "AQI" => Ok(Pollutant::Aqi),
            "PM2.5" | "PM25" | "PM2_5" => Ok(Pollutant::Pm25),
            "PM10" => Ok(Pollutant::Pm10),
            "SO2" => Ok(Pollutant::So2),
            "NO2" => Ok(Pollutant::No2),
            "CO" => Ok(Pollutant::Co),
            "O3" => Ok(Pollutant::O3),
            _ => Err(format!("unknown pollutant '{}'", s.trim())),
        }
    }
}

/// Which daily statistic a dataset holds.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Max,
    Mean,
    Min,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Max, Metric::Mean, Metric::Min];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Max => "max",
            Metric::Mean => "mean",
            Metric::Min => "min",
        }
    }

    /// Daily dataset file name, e.g. `PM2.5_daymean.csv`.
    pub fn daily_file_name(&self, pollutant: Pollutant) -> String {
        format!("{}_day{}.csv", pollutant.as_str(), self.as_str())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Metric::Max),
            "mean" => Ok(Metric::Mean),
            "min" => Ok(Metric::Min),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollutant_round_trips_through_name() {
        for p in Pollutant::ALL {
            assert_eq!(p.as_str().parse::<Pollutant>().unwrap(), p);
        }
        assert_eq!("pm25".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
        assert!("NH3".parse::<Pollutant>().is_err());
    }

    #[test]
    fn test_parse_list_skips_unknown_and_duplicates() {
        let csv = "type\nAQI\nPM2.5\n\nNH3\nAQI\nCO\n";
        let list = Pollutant::parse_list(csv).unwrap();
        assert_eq!(list, vec![Pollutant::Aqi, Pollutant::Pm25, Pollutant::Co]);
    }

    #[test]
    fn test_parse_list_falls_back_to_all() {
        let list = Pollutant::parse_list("type\n").unwrap();
        assert_eq!(list, Pollutant::ALL.to_vec());
    }

    #[test]
    fn test_daily_file_name() {
        assert_eq!(Metric::Mean.daily_file_name(Pollutant::Pm25), "PM2.5_daymean.csv");
        assert_eq!(Metric::Max.daily_file_name(Pollutant::Aqi), "AQI_daymax.csv");
    }

    #[test]
    fn test_units() {
        assert_eq!(Pollutant::Aqi.unit(), "");
        assert_eq!(Pollutant::Co.unit(), "mg/m³");
        assert_eq!(Pollutant::O3.unit(), "μg/m³");
    }
}
