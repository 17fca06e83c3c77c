use crate::error::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Field definitions and associated default values

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub ga: GA,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default = "seed_default")]
    pub seed: u64,
    #[serde(default = "empty_string")]
    pub log_base: String,
    #[serde(default = "log_suffix_default")]
    pub log_suffix: String,
    #[serde(default = "log_level_default")]
    pub log_level: String,
    #[serde(default = "true_default")]
    pub display_colorful: bool,
    #[serde(default = "display_interval_default")]
    pub display_interval: usize,
    #[serde(default = "empty_string")]
    pub save_exp: String,
    #[serde(default = "empty_string")]
    pub save_tour_csv: String,
    #[serde(default = "empty_string")]
    pub save_trace_csv: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Data {
    #[serde(default = "cities_default")]
    pub cities: String,
    #[serde(default = "delimiter_default")]
    pub delimiter: String,
    #[serde(default = "true_default")]
    pub has_headers: bool,
    #[serde(default = "uzero_default")]
    pub random_cities: usize,
    #[serde(default = "random_bound_default")]
    pub random_bound: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GA {
    #[serde(default = "pop_size_default")]
    pub population_size: usize,
    #[serde(default = "max_generations_default")]
    pub max_generations: usize,
    #[serde(default = "uzero_default")]
    pub max_age_best_tour: usize,
    #[serde(default = "mutation_rate_default")]
    pub mutation_rate: f64,
    #[serde(default = "tournament_size_default")]
    pub tournament_size: usize,
    #[serde(default = "true_default")]
    pub elitism: bool,
}

// Default section definitions

impl Default for General {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Data {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for GA {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Param {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Param {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Data {
    /// Delimiter as the single byte expected by the CSV reader
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ if self.delimiter == "\\t" => Ok(b'\t'),
            _ => Err(Error::invalid_param(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }
}

pub fn get<P: AsRef<Path>>(param_file: P) -> Result<Param> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let mut config: Param = serde_yaml::from_reader(param_reader)?;

    validate(&mut config)?;

    Ok(config)
}

pub fn validate(param: &mut Param) -> Result<()> {
    if !param.general.log_base.is_empty() {
        param.general.display_colorful = false;
    }

    if param.general.display_interval == 0 {
        warn!("display_interval=0: progress will only be displayed at the end of the run.");
    }

    param.data.delimiter_byte()?;

    if param.data.cities.is_empty() && param.data.random_cities == 0 {
        return Err(Error::invalid_param(
            "no city source: provide data.cities or data.random_cities > 0",
        ));
    }

    if !param.data.cities.is_empty() && param.data.random_cities > 0 {
        warn!(
            "Both data.cities and data.random_cities are set: cities are read from {}.",
            param.data.cities
        );
    }

    if !(param.data.random_bound > 0.0) {
        return Err(Error::invalid_param(format!(
            "Invalid random_bound={}. Must be > 0.",
            param.data.random_bound
        )));
    }

    validate_ga(param)
}

fn validate_ga(param: &mut Param) -> Result<()> {
    if param.ga.population_size == 0 {
        return Err(Error::invalid_param("Invalid population_size=0. Must be >= 1."));
    }

    if param.ga.tournament_size == 0 {
        return Err(Error::invalid_param("Invalid tournament_size=0. Must be >= 1."));
    }

    if !(0.0..=1.0).contains(&param.ga.mutation_rate) {
        return Err(Error::invalid_param(format!(
            "Invalid mutation_rate={:.4}. Must be in range [0, 1].",
            param.ga.mutation_rate
        )));
    }

    if param.ga.tournament_size > param.ga.population_size {
        warn!(
            "tournament_size={} exceeds population_size={}: every selection returns the fittest tour.",
            param.ga.tournament_size, param.ga.population_size
        );
    }

    if !param.ga.elitism && param.ga.population_size == 1 {
        warn!("A single tour without elitism is replaced by a child of itself every generation.");
    }

    Ok(())
}

// Default value definitions

fn seed_default() -> u64 {
    4815162342
}
fn empty_string() -> String {
    "".to_string()
}
fn log_suffix_default() -> String {
    "log".to_string()
}
fn log_level_default() -> String {
    "info".to_string()
}
fn display_interval_default() -> usize {
    50
}
fn cities_default() -> String {
    "samples/berlin52.csv".to_string()
}
fn delimiter_default() -> String {
    ",".to_string()
}
fn random_bound_default() -> f64 {
    200.0
}
fn pop_size_default() -> usize {
    52
}
fn max_generations_default() -> usize {
    450
}
fn mutation_rate_default() -> f64 {
    0.0075
}
fn tournament_size_default() -> usize {
    3
}
fn true_default() -> bool {
    true
}
fn uzero_default() -> usize {
    0
}
