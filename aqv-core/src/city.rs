use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// A city and its map position.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CityCoord {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl CityCoord {
    /// Parse the city coordinate table.
    ///
    /// Expected format (with headers): `City,Longtitude,Latitude`. The
    /// misspelled `Longtitude` header is what the upstream export ships.
    /// Rows with a blank name or non-numeric coordinates are skipped.
    ///
    /// # Example CSV
    /// ```text
    /// City,Longtitude,Latitude
    /// 北京,116.4,39.9
    /// ```
    pub fn parse_csv(csv_data: &str) -> anyhow::Result<Vec<CityCoord>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let mut result = Vec::new();
        let mut skipped = 0u32;
        for record in rdr.records() {
            let r = record?;
            let name = r.get(0).unwrap_or("").trim();
            let longitude = r.get(1).and_then(|s| s.trim().parse::<f64>().ok());
            let latitude = r.get(2).and_then(|s| s.trim().parse::<f64>().ok());
            match (name.is_empty(), longitude, latitude) {
                (false, Some(longitude), Some(latitude)) => result.push(CityCoord {
                    name: name.to_string(),
                    longitude,
                    latitude,
                }),
                _ => skipped += 1,
            }
        }
        log::info!(
            "[AQV] loader: parsed {} city coordinates, skipped {}",
            result.len(),
            skipped
        );
        Ok(result)
    }
}
