use crate::error::{Error, Result};
use crate::tour::Tour;
use crate::tour_manager::TourManager;
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Fixed-size, ordered collection of tours.
///
/// Slots are empty only while a generation is being built; once every slot
/// has been saved the population is complete and can be ranked.
#[derive(Clone)]
pub struct Population<'a> {
    tours: Vec<Option<Tour<'a>>>,
}

impl<'a> Population<'a> {
    /// Provides a help message describing the `Population` struct and its fields.
    pub fn help() -> &'static str {
        "
        Population Struct:
        -----------------
        Represents one generation of candidate tours.

        Fields:
        - tours: Vec<Option<Tour>>
            One slot per individual. The number of slots is fixed at creation.
            A slot is None only while the generation is under construction.
        "
    }

    /// Population of `size` empty slots, to be filled with `save_tour`
    pub fn new(size: usize) -> Population<'a> {
        Population { tours: vec![None; size] }
    }

    /// Population of `size` uniformly random tours
    pub fn random(manager: &'a TourManager, size: usize, rng: &mut ChaCha8Rng) -> Population<'a> {
        Population {
            tours: (0..size).map(|_| Some(Tour::random(manager, rng))).collect(),
        }
    }

    pub fn from_tours(tours: Vec<Tour<'a>>) -> Population<'a> {
        Population {
            tours: tours.into_iter().map(Some).collect(),
        }
    }

    pub fn population_size(&self) -> usize {
        self.tours.len()
    }

    pub fn save_tour(&mut self, index: usize, tour: Tour<'a>) -> Result<()> {
        let len = self.tours.len();
        let slot = self
            .tours
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range("population", index, len))?;
        *slot = Some(tour);
        Ok(())
    }

    pub fn get_tour(&self, index: usize) -> Result<&Tour<'a>> {
        match self.tours.get(index) {
            Some(Some(tour)) => Ok(tour),
            Some(None) => Err(Error::invariant(format!("population slot {} is empty", index))),
            None => Err(Error::out_of_range("population", index, self.tours.len())),
        }
    }

    pub fn get_tour_mut(&mut self, index: usize) -> Result<&mut Tour<'a>> {
        let len = self.tours.len();
        match self.tours.get_mut(index) {
            Some(Some(tour)) => Ok(tour),
            Some(None) => Err(Error::invariant(format!("population slot {} is empty", index))),
            None => Err(Error::out_of_range("population", index, len)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.tours.iter().all(Option::is_some)
    }

    /// Iterates over the filled slots
    pub fn iter(&self) -> impl Iterator<Item = &Tour<'a>> {
        self.tours.iter().flatten()
    }

    /// Tour with the highest fitness.
    ///
    /// Only a strictly fitter tour replaces the incumbent, so the earliest of
    /// several equally fit tours is returned.
    pub fn fittest(&self) -> Result<&Tour<'a>> {
        let index = self.fittest_index()?;
        self.get_tour(index)
    }

    pub fn fittest_index(&self) -> Result<usize> {
        let mut best: Option<(usize, f64)> = None;
        for index in 0..self.tours.len() {
            let fitness = self.get_tour(index)?.fitness();
            match best {
                Some((_, best_fitness)) if fitness <= best_fitness => {}
                _ => best = Some((index, fitness)),
            }
        }
        best.map(|(index, _)| index)
            .ok_or_else(|| Error::invariant("cannot rank an empty population"))
    }
}

impl fmt::Debug for Population<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Population")
            .field("tours", &self.tours)
            .finish()
    }
}
