pub mod city;
pub mod error;
pub mod experiment;
pub mod ga;
pub mod param;
pub mod population;
pub mod tour;
pub mod tour_manager;
pub mod utils;

use crate::error::Result;
use crate::experiment::Experiment;
use crate::ga::ga;
use crate::tour_manager::TourManager;
use chrono::Local;
use param::Param;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use log::{debug, info};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub fn tspga_version() -> String {
    match option_env!("TSPGA_GIT_SHA") {
        Some(sha) => format!("{}#{}", env!("CARGO_PKG_VERSION"), sha),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Loads the cities named by `param.data`, or draws a random instance.
///
/// Random cities use their own generator seeded with `param.general.seed`,
/// so the instance does not depend on the evolution draws.
pub fn load_cities(param: &Param) -> Result<TourManager> {
    if !param.data.cities.is_empty() {
        TourManager::load_data(&param.data.cities, param.data.delimiter_byte()?, param.data.has_headers)
    } else {
        let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);
        let manager = TourManager::random(param.data.random_cities, param.data.random_bound, &mut rng);
        info!(
            "{} random cities generated in [0, {})",
            manager.number_of_cities(),
            param.data.random_bound
        );
        Ok(manager)
    }
}

pub fn run(param: &Param, running: Arc<AtomicBool>) -> Result<Experiment> {
    let manager = load_cities(param)?;
    cinfo!(param.general.display_colorful, "\x1b[2;97m{:?}\x1b[0m", manager);
    run_on_cities(&manager, param, running)
}

pub fn run_on_cities(manager: &TourManager, param: &Param, running: Arc<AtomicBool>) -> Result<Experiment> {
    let start = std::time::Instant::now();
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    let evolution = ga(manager, param, running)?;
    let fittest = evolution.fittest()?;
    debug!("Fittest tour: {:?}", fittest);

    let exec_time = start.elapsed().as_secs_f64();
    let name = param.general.save_exp.split('.').next().unwrap_or("");
    let id = if name.is_empty() {
        format!("tspga_{}", timestamp)
    } else {
        format!("{}_{}", name, timestamp)
    };

    Ok(Experiment {
        id,
        timestamp,
        tspga_version: tspga_version(),
        parameters: param.clone(),

        cities_fingerprint: manager.fingerprint(),
        cities: manager.clone(),

        best_tour: fittest.order().to_vec(),
        best_distance: fittest.distance(),
        initial_distance: evolution.initial_distance,
        generations: evolution.generations(),
        distance_trace: evolution.distance_trace,

        execution_time: exec_time,
    })
}
