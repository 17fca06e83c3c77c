use crate::city::City;
use crate::error::{Error, Result};
use crate::param::Param;
use crate::tour::Tour;
use crate::tour_manager::TourManager;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete experiment data and results
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Experiment {
    /// Experiment ID, i.e., output name and timestamp
    pub id: String,
    /// Timestamp of the experiment
    pub timestamp: String,
    /// tspga version and git hash used
    pub tspga_version: String,
    /// Parameters used
    pub parameters: Param,

    /// Cities of the instance, in registry order
    pub cities: TourManager,
    /// SHA-256 of the city coordinates
    pub cities_fingerprint: String,

    /// Registry indices of the best tour of the last generation, in visiting order
    pub best_tour: Vec<usize>,
    pub best_distance: f64,
    /// Best distance of the random initial population
    pub initial_distance: f64,
    /// Best distance after each generation
    pub distance_trace: Vec<f64>,
    /// Number of generations actually computed
    pub generations: usize,

    /// Execution time in seconds
    pub execution_time: f64,
}

impl Experiment {
    /// Rebuilds the best tour against the stored cities
    pub fn best_tour(&self) -> Result<Tour<'_>> {
        Tour::from_order(&self.cities, self.best_tour.clone())
    }

    pub fn best_tour_coordinates(&self) -> Result<Vec<City>> {
        Ok(self.best_tour()?.coordinates())
    }

    /// Relative improvement of the best distance over the initial one, in percent
    pub fn improvement(&self) -> f64 {
        if self.initial_distance > 0.0 {
            100.0 * (self.initial_distance - self.best_distance) / self.initial_distance
        } else {
            0.0
        }
    }

    /// String containing the formatted experiment results.
    pub fn display_results(&self) -> String {
        let mut text = String::new();
        text.push_str(&format!(
            "\n=============== Experiment {} ===============\n\n",
            self.id
        ));
        text.push_str(&format!("tspga version: v{}\n", self.tspga_version));
        text.push_str(&format!("Timestamp: {}\n", self.timestamp));
        text.push_str(&format!("Execution time: {:.2}s\n", self.execution_time));
        text.push_str(&format!(
            "Parameters: \x1b[2;97m{:?}\x1b[0m\n",
            &self.parameters
        ));
        text.push_str(&format!(
            "Cities: {} (fingerprint {})\n\n",
            self.cities.number_of_cities(),
            self.cities_fingerprint
        ));
        text.push_str("Experiment results:\n\n");
        text.push_str(&format!("Generations: {}\n", self.generations));
        text.push_str(&format!("Initial distance: {:.2}\n", self.initial_distance));
        text.push_str(&format!(
            "Final distance: \x1b[1;32m{:.2}\x1b[0m ({:.1}% shorter)\n",
            self.best_distance,
            self.improvement()
        ));

        match self.best_tour() {
            Ok(tour) => text.push_str(&format!("Solution:\n{}\n", tour)),
            Err(e) => text.push_str(&format!("Solution unavailable: {}\n", e)),
        }

        text
    }

    /// Saves the experiment in a suitable format based on file extension.
    pub fn save_auto<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => self.save_json(path),
            "bin" | "bincode" => self.save_bincode(path),
            _ => {
                warn!("Unknown format. Saving experiment in bincode.");
                let bin_path = path.with_extension("bin");
                self.save_bincode(bin_path)
            }
        }
    }

    /// Saves to JSON (human readable, but may have slight inaccuracies for decimal values)
    fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Saves as Bincode (compact binary, Rust-only)
    fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = bincode::serialize(self)?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    /// Loads the experiment from a file, automatically detecting the format based on file extension.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the experiment file.
    ///
    /// # Returns
    ///
    /// Result containing the loaded Experiment or an error.
    pub fn load_auto<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Self::load_json(path),
            "bin" | "bincode" => Self::load_bincode(path),
            _ => Self::load_with_fallback(path),
        }
    }

    fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let experiment: Experiment = serde_json::from_str(&content)?;
        Ok(experiment)
    }

    fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let experiment: Experiment = bincode::deserialize(&bytes)?;
        Ok(experiment)
    }

    /// Tries Bincode, then JSON.
    fn load_with_fallback<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Ok(experiment) = Self::load_bincode(path) {
            return Ok(experiment);
        }

        if let Ok(experiment) = Self::load_json(path) {
            return Ok(experiment);
        }

        Err(Error::invalid_data(format!(
            "unable to load an experiment from {}",
            path.display()
        )))
    }

    /// Writes the best tour as `x,y` rows in visiting order
    pub fn save_tour_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["x", "y"])?;
        for city in self.best_tour_coordinates()? {
            writer.serialize((city.x(), city.y()))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes `generation,distance` rows, generation 0 being the initial population
    pub fn save_trace_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["generation", "distance"])?;
        writer.serialize((0usize, self.initial_distance))?;
        for (generation, distance) in self.distance_trace.iter().enumerate() {
            writer.serialize((generation + 1, distance))?;
        }
        writer.flush()?;
        Ok(())
    }
}
