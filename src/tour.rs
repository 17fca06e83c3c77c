use crate::city::City;
use crate::error::{Error, Result};
use crate::tour_manager::TourManager;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::cell::Cell;
use std::fmt;

/// Fitness given to a tour of null length (single city or coincident cities)
pub const DEGENERATE_FITNESS: f64 = f64::MAX;

/// A candidate solution: a closed visiting order of every registered city.
///
/// Cities are referred to by their index in the `TourManager`. The total
/// distance is computed on first access and kept until a position changes;
/// the fitness is derived from it, so both always agree.
#[derive(Clone)]
pub struct Tour<'a> {
    manager: &'a TourManager,
    cities: Vec<usize>,
    distance: Cell<Option<f64>>,
}

impl<'a> Tour<'a> {
    /// Tour visiting the cities in registry order
    pub fn ordered(manager: &'a TourManager) -> Tour<'a> {
        Tour {
            manager,
            cities: (0..manager.number_of_cities()).collect(),
            distance: Cell::new(None),
        }
    }

    /// Uniformly random tour, used to seed the initial population
    pub fn random(manager: &'a TourManager, rng: &mut ChaCha8Rng) -> Tour<'a> {
        let mut tour = Tour::ordered(manager);
        tour.generate_individual(rng);
        tour
    }

    /// Builds a tour from an explicit order, which must be a permutation of the registry.
    pub fn from_order(manager: &'a TourManager, order: Vec<usize>) -> Result<Tour<'a>> {
        let tour = Tour {
            manager,
            cities: order,
            distance: Cell::new(None),
        };
        if !tour.is_permutation() {
            return Err(Error::invariant(format!(
                "order {:?} is not a permutation of the {} registered cities",
                tour.cities,
                manager.number_of_cities()
            )));
        }
        Ok(tour)
    }

    /// Resets the tour to the registry order and shuffles it (Fisher-Yates).
    pub fn generate_individual(&mut self, rng: &mut ChaCha8Rng) {
        self.cities = (0..self.manager.number_of_cities()).collect();
        self.cities.shuffle(rng);
        self.invalidate();
    }

    pub fn manager(&self) -> &'a TourManager {
        self.manager
    }

    pub fn tour_size(&self) -> usize {
        self.cities.len()
    }

    /// City indices in visiting order
    pub fn order(&self) -> &[usize] {
        &self.cities
    }

    pub fn city_index(&self, position: usize) -> Result<usize> {
        self.cities
            .get(position)
            .copied()
            .ok_or_else(|| Error::out_of_range("tour", position, self.cities.len()))
    }

    pub fn get_city(&self, position: usize) -> Result<&'a City> {
        let index = self.city_index(position)?;
        self.manager.get_city(index)
    }

    /// Places `city` (a registry index) at `position`.
    ///
    /// The caller is responsible for keeping the tour a permutation, e.g. by
    /// assigning the displaced city elsewhere.
    pub fn set_city(&mut self, position: usize, city: usize) -> Result<()> {
        let n_cities = self.manager.number_of_cities();
        if city >= n_cities {
            return Err(Error::out_of_range("tour manager", city, n_cities));
        }
        let len = self.cities.len();
        let slot = self
            .cities
            .get_mut(position)
            .ok_or_else(|| Error::out_of_range("tour", position, len))?;
        *slot = city;
        self.invalidate();
        Ok(())
    }

    pub fn swap_cities(&mut self, position1: usize, position2: usize) -> Result<()> {
        let len = self.cities.len();
        for position in [position1, position2] {
            if position >= len {
                return Err(Error::out_of_range("tour", position, len));
            }
        }
        self.cities.swap(position1, position2);
        self.invalidate();
        Ok(())
    }

    pub fn contains_city(&self, city: usize) -> bool {
        self.cities.contains(&city)
    }

    /// Length of the closed tour, last city linked back to the first.
    pub fn distance(&self) -> f64 {
        if let Some(distance) = self.distance.get() {
            return distance;
        }

        let cities = self.manager.cities();
        let n = self.cities.len();
        let mut distance = 0.0;
        for position in 0..n {
            let from = &cities[self.cities[position]];
            let to = &cities[self.cities[(position + 1) % n]];
            distance += from.distance_to(to);
        }

        self.distance.set(Some(distance));
        distance
    }

    /// Inverse of the distance; a null distance saturates to `DEGENERATE_FITNESS`.
    pub fn fitness(&self) -> f64 {
        let distance = self.distance();
        if distance == 0.0 {
            DEGENERATE_FITNESS
        } else {
            1.0 / distance
        }
    }

    pub fn is_permutation(&self) -> bool {
        let n = self.manager.number_of_cities();
        if self.cities.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &city in &self.cities {
            if city >= n || seen[city] {
                return false;
            }
            seen[city] = true;
        }
        true
    }

    /// Cities in visiting order
    pub fn coordinates(&self) -> Vec<City> {
        let cities = self.manager.cities();
        self.cities.iter().map(|&i| cities[i]).collect()
    }

    fn invalidate(&self) {
        self.distance.set(None);
    }
}

impl PartialEq for Tour<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cities == other.cities
    }
}

impl fmt::Display for Tour<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cities = self.manager.cities();
        let path: Vec<String> = self.cities.iter().map(|&i| format!("({})", cities[i])).collect();
        write!(f, "{}", path.join(" -> "))
    }
}

impl fmt::Debug for Tour<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tour")
            .field("cities", &self.cities)
            .field("distance", &self.distance.get())
            .finish()
    }
}
