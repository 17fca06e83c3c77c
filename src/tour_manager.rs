use crate::city::City;
use crate::error::{Error, Result};
use log::{debug, info, warn};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Registry of the cities a tour must visit. The position of a city in the
/// registry is the index used by every `Tour`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourManager {
    cities: Vec<City>,
}

impl TourManager {
    pub fn new() -> TourManager {
        TourManager { cities: Vec::new() }
    }

    pub fn from_cities(cities: Vec<City>) -> TourManager {
        TourManager { cities }
    }

    /// Appends a city; its index is the previous number of cities.
    pub fn add_city(&mut self, city: City) {
        self.cities.push(city);
    }

    pub fn get_city(&self, index: usize) -> Result<&City> {
        self.cities
            .get(index)
            .ok_or_else(|| Error::out_of_range("tour manager", index, self.cities.len()))
    }

    pub fn number_of_cities(&self) -> usize {
        self.cities.len()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Load cities from a delimited file whose two first columns are x and y.
    pub fn load_data<P: AsRef<Path>>(path: P, delimiter: u8, has_headers: bool) -> Result<TourManager> {
        let path = path.as_ref();
        info!("Loading cities from {}...", path.display());

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_headers)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut manager = TourManager::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.iter().all(|field| field.is_empty()) {
                debug!("Skipping empty line {}", line);
                continue;
            }

            let x = parse_coordinate(record.get(0), "x", line)?;
            let y = parse_coordinate(record.get(1), "y", line)?;
            manager.add_city(City::new(x, y));
        }

        info!("{} cities loaded", manager.number_of_cities());
        Ok(manager)
    }

    /// Random instance with integer coordinates drawn in [0, bound)
    pub fn random(count: usize, bound: f64, rng: &mut ChaCha8Rng) -> TourManager {
        let cities = (0..count)
            .map(|_| {
                let x = (rng.gen::<f64>() * bound).floor();
                let y = (rng.gen::<f64>() * bound).floor();
                City::new(x, y)
            })
            .collect();
        TourManager { cities }
    }

    /// Checks that the registry can be optimized.
    ///
    /// Coincident cities are accepted but reported, as they are the only way
    /// (besides a single city) for a tour to reach a zero distance.
    pub fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Err(Error::EmptyRegistry);
        }

        if let Some(index) = self
            .cities
            .iter()
            .position(|city| !city.x().is_finite() || !city.y().is_finite())
        {
            return Err(Error::invalid_data(format!(
                "city {} has non-finite coordinates ({})",
                index, self.cities[index]
            )));
        }

        let mut seen: HashSet<(u64, u64)> = HashSet::with_capacity(self.cities.len());
        let mut coincident = 0;
        for city in &self.cities {
            if !seen.insert((city.x().to_bits(), city.y().to_bits())) {
                coincident += 1;
            }
        }
        if coincident > 0 {
            warn!(
                "{} cities share their coordinates with another city: zero-length edges are expected",
                coincident
            );
        }
        if self.cities.len() == 1 {
            warn!("Only one city registered: every tour has a null distance");
        }

        Ok(())
    }

    /// SHA-256 of the coordinates, in registry order
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for city in &self.cities {
            hasher.update(city.x().to_le_bytes());
            hasher.update(city.y().to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

fn parse_coordinate(field: Option<&str>, axis: &str, line: u64) -> Result<f64> {
    let field = field.ok_or_else(|| Error::invalid_data(format!("line {}: missing {} coordinate", line, axis)))?;
    let value = field.parse::<f64>().map_err(|_| {
        Error::invalid_data(format!("line {}: cannot parse {} coordinate '{}'", line, axis, field))
    })?;
    if !value.is_finite() {
        return Err(Error::invalid_data(format!(
            "line {}: {} coordinate '{}' is not finite",
            line, axis, field
        )));
    }
    Ok(value)
}

impl fmt::Debug for TourManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TourManager: {} cities", self.cities.len())
    }
}
