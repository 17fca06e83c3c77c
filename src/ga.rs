use crate::cinfo;
use crate::error::{Error, Result};
use crate::param::Param;
use crate::population::Population;
use crate::tour::Tour;
use crate::tour_manager::TourManager;
use crate::utils::{display_generation, display_generation_legend};
use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

//-----------------------------------------------------------------------------
// Genetic operators
//-----------------------------------------------------------------------------

/// Selection, crossover and mutation operators with their tuning.
///
/// The engine keeps no state between calls: all randomness comes from the
/// generator handed to each operator, so a seeded generator replays a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticAlgorithm {
    /// Probability for each position of a child to be swapped with another
    pub mutation_rate: f64,
    /// Number of tours competing in each selection
    pub tournament_size: usize,
    /// Carry the fittest tour unchanged into the next generation
    pub elitism: bool,
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        GeneticAlgorithm {
            mutation_rate: 0.0075,
            tournament_size: 3,
            elitism: true,
        }
    }
}

impl GeneticAlgorithm {
    pub fn new(mutation_rate: f64, tournament_size: usize, elitism: bool) -> GeneticAlgorithm {
        GeneticAlgorithm {
            mutation_rate,
            tournament_size,
            elitism,
        }
    }

    pub fn from_param(param: &Param) -> GeneticAlgorithm {
        GeneticAlgorithm::new(param.ga.mutation_rate, param.ga.tournament_size, param.ga.elitism)
    }

    /// Builds the next generation.
    ///
    /// With elitism, slot 0 receives an unmodified copy of the fittest tour
    /// and is exempt from mutation. Every other slot is the child of two
    /// tournament winners, mutated once all children exist.
    pub fn evolve_population<'a>(&self, pop: &Population<'a>, rng: &mut ChaCha8Rng) -> Result<Population<'a>> {
        let size = pop.population_size();
        let mut new_pop = Population::new(size);

        let elitism_offset = if self.elitism && size > 0 {
            new_pop.save_tour(0, pop.fittest()?.clone())?;
            1
        } else {
            0
        };

        for i in elitism_offset..size {
            let parent1 = self.tournament_selection(pop, rng)?;
            let parent2 = self.tournament_selection(pop, rng)?;
            let child = self.crossover(parent1, parent2, rng)?;
            new_pop.save_tour(i, child)?;
        }

        for i in elitism_offset..size {
            self.mutate(new_pop.get_tour_mut(i)?, rng)?;
        }

        Ok(new_pop)
    }

    /// Fittest of `tournament_size` tours drawn with replacement.
    ///
    /// A tournament at least as large as the population is the whole
    /// population, so the global fittest is returned.
    pub fn tournament_selection<'p, 'a>(
        &self,
        pop: &'p Population<'a>,
        rng: &mut ChaCha8Rng,
    ) -> Result<&'p Tour<'a>> {
        let size = pop.population_size();
        if size == 0 {
            return Err(Error::invariant("tournament selection on an empty population"));
        }
        if self.tournament_size >= size {
            return pop.fittest();
        }

        // Only a strictly fitter competitor replaces the current winner
        let mut winner: Option<&'p Tour<'a>> = None;
        for _ in 0..self.tournament_size {
            let competitor = pop.get_tour(rng.gen_range(0..size))?;
            match winner {
                Some(best) if competitor.fitness() <= best.fitness() => {}
                _ => winner = Some(competitor),
            }
        }

        winner.ok_or_else(|| Error::invariant("tournament selection without competitors"))
    }

    /// Ordered crossover between two random cut positions, see `ordered_crossover`.
    pub fn crossover<'a>(&self, parent1: &Tour<'a>, parent2: &Tour<'a>, rng: &mut ChaCha8Rng) -> Result<Tour<'a>> {
        let size = parent1.tour_size();
        if size == 0 {
            return Ok(parent2.clone());
        }
        let start = rng.gen_range(0..size);
        let end = rng.gen_range(0..size);
        ordered_crossover(parent1, parent2, start, end)
    }

    /// Swaps each position, with probability `mutation_rate`, with a random position.
    ///
    /// Positions are visited in order on the live tour, so a later swap can
    /// move a city that an earlier swap already moved.
    pub fn mutate(&self, tour: &mut Tour, rng: &mut ChaCha8Rng) -> Result<()> {
        let size = tour.tour_size();
        for position1 in 0..size {
            if rng.gen::<f64>() < self.mutation_rate {
                let position2 = rng.gen_range(0..size);
                tour.swap_cities(position1, position2)?;
            }
        }
        Ok(())
    }
}

/// Child keeping a segment of `parent1` in place, the rest in `parent2` order.
///
/// Positions taken from `parent1`:
/// - `start < end`: strictly between the cuts;
/// - `start > end`: up to `end` and from `start` on, both included;
/// - `start == end`: none, the child is a copy of `parent2`.
///
/// The cities of `parent2` not yet in the child then fill the empty positions
/// from left to right.
// FIXME: the two unequal cases keep segments of different shape: the cut
// positions are excluded when start < end and included when start > end.
pub fn ordered_crossover<'a>(parent1: &Tour<'a>, parent2: &Tour<'a>, start: usize, end: usize) -> Result<Tour<'a>> {
    let size = parent1.tour_size();
    if parent2.tour_size() != size {
        return Err(Error::invariant(format!(
            "cannot cross over tours of size {} and {}",
            size,
            parent2.tour_size()
        )));
    }

    let manager = parent1.manager();
    let mut child: Vec<Option<usize>> = vec![None; size];
    let mut in_child = vec![false; manager.number_of_cities()];

    for (i, slot) in child.iter_mut().enumerate() {
        let from_parent1 = if start < end {
            i > start && i < end
        } else if start > end {
            !(i < start && i > end)
        } else {
            false
        };
        if from_parent1 {
            let city = parent1.order()[i];
            *slot = Some(city);
            in_child[city] = true;
        }
    }

    let mut empty = 0;
    for &city in parent2.order() {
        if in_child[city] {
            continue;
        }
        while empty < size && child[empty].is_some() {
            empty += 1;
        }
        if empty == size {
            break;
        }
        child[empty] = Some(city);
        in_child[city] = true;
    }

    let order = child
        .into_iter()
        .collect::<Option<Vec<usize>>>()
        .ok_or_else(|| Error::invariant(format!("crossover ({}, {}) left empty positions in the child", start, end)))?;

    Tour::from_order(manager, order)
}

//-----------------------------------------------------------------------------
// Genetic Algorithm driver
//-----------------------------------------------------------------------------

/// Outcome of a run: the last generation and the best distance after each generation
pub struct Evolution<'a> {
    pub population: Population<'a>,
    /// Best distance in the random initial population
    pub initial_distance: f64,
    /// `distance_trace[g]` is the best distance after generation `g + 1`
    pub distance_trace: Vec<f64>,
}

impl<'a> Evolution<'a> {
    pub fn fittest(&self) -> Result<&Tour<'a>> {
        self.population.fittest()
    }

    pub fn generations(&self) -> usize {
        self.distance_trace.len()
    }
}

/// Main function to run the genetic algorithm
///
/// # Arguments
///
/// * `manager` - The cities to visit.
/// * `param` - Parameters for the genetic algorithm.
/// * `running` - Cleared to stop the run after the current generation.
///
/// # Returns
///
/// The last population and the trace of best distances.
///
/// # Errors
///
/// Fails if the registry is empty or if an operator breaks a population invariant.
pub fn ga<'a>(manager: &'a TourManager, param: &Param, running: Arc<AtomicBool>) -> Result<Evolution<'a>> {
    let time = Instant::now();

    manager.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);
    let engine = GeneticAlgorithm::from_param(param);

    let base_pop = Population::random(manager, param.ga.population_size, &mut rng);

    info!(
        "Population size: {}, cities: {}, mutation rate {}, tournament size {}, elitism {}",
        base_pop.population_size(),
        manager.number_of_cities(),
        engine.mutation_rate,
        engine.tournament_size,
        engine.elitism
    );

    let evolution = iterative_evolution(base_pop, &engine, param, running, &mut rng)?;

    let elapsed = time.elapsed();
    info!(
        "Genetic algorithm computed {:?} generations in {:.2?}",
        evolution.generations(),
        elapsed
    );

    Ok(evolution)
}

/// Run the iterative evolution process of the genetic algorithm
///
/// Evolves `base_pop` up to `param.ga.max_generations` times, or less if
/// `running` is cleared or if the best distance has not improved for
/// `param.ga.max_age_best_tour` generations (when non-zero).
pub fn iterative_evolution<'a>(
    base_pop: Population<'a>,
    engine: &GeneticAlgorithm,
    param: &Param,
    running: Arc<AtomicBool>,
    rng: &mut ChaCha8Rng,
) -> Result<Evolution<'a>> {
    let colorful = param.general.display_colorful;
    let initial_distance = base_pop.fittest()?.distance();
    cinfo!(colorful, "Initial distance: \x1b[1;33m{:.2}\x1b[0m", initial_distance);
    cinfo!(colorful, "{}", display_generation_legend());

    let mut pop = base_pop;
    let mut distance_trace = Vec::with_capacity(param.ga.max_generations);
    let mut best_distance = initial_distance;
    let mut best_generation = 0;
    let mut generation = 0;

    while generation < param.ga.max_generations {
        if !running.load(Ordering::Relaxed) {
            info!("Signal received");
            break;
        }

        generation += 1;
        pop = engine.evolve_population(&pop, rng)?;

        let fittest = pop.fittest()?;
        let distance = fittest.distance();
        distance_trace.push(distance);
        debug!("Generation {}: {}", generation, fittest);

        if distance < best_distance {
            best_distance = distance;
            best_generation = generation;
        }

        if param.general.display_interval > 0 && generation % param.general.display_interval == 0 {
            cinfo!(colorful, "{}", display_generation(&pop, generation));
        }

        if param.ga.max_age_best_tour > 0 && generation - best_generation >= param.ga.max_age_best_tour {
            info!("Best tour has reached limit age...");
            break;
        }
    }

    if param.general.display_interval == 0 || generation % param.general.display_interval != 0 {
        cinfo!(colorful, "{}", display_generation(&pop, generation));
    }

    Ok(Evolution {
        population: pop,
        initial_distance,
        distance_trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;

    fn create_square() -> TourManager {
        TourManager::from_cities(vec![
            City::new(0.0, 0.0),
            City::new(0.0, 10.0),
            City::new(10.0, 10.0),
            City::new(10.0, 0.0),
        ])
    }

    fn create_line(n: usize) -> TourManager {
        TourManager::from_cities((0..n).map(|i| City::new(i as f64, 0.0)).collect())
    }

    fn load_berlin52() -> TourManager {
        TourManager::load_data("./samples/berlin52.csv", b',', true).unwrap()
    }

    /// Helper function to create default parameters for testing
    fn create_test_params() -> Param {
        let mut param = Param::default();
        param.general.seed = 42;
        param.general.display_colorful = false;
        param.general.display_interval = 0;
        param.ga.population_size = 30;
        param.ga.max_generations = 20;
        param
    }

    #[test]
    fn test_ordered_crossover_start_before_end() {
        let manager = create_line(8);
        let parent1 = Tour::from_order(&manager, (0..8).collect()).unwrap();
        let parent2 = Tour::from_order(&manager, (0..8).rev().collect()).unwrap();

        let child = ordered_crossover(&parent1, &parent2, 2, 5).unwrap();
        // positions 3 and 4 come from parent1, the rest follows parent2 order
        assert_eq!(child.order(), &[7, 6, 5, 3, 4, 2, 1, 0]);
    }

    #[test]
    fn test_ordered_crossover_start_after_end() {
        let manager = create_line(8);
        let parent1 = Tour::from_order(&manager, (0..8).collect()).unwrap();
        let parent2 = Tour::from_order(&manager, (0..8).rev().collect()).unwrap();

        let child = ordered_crossover(&parent1, &parent2, 5, 2).unwrap();
        // positions 0..=2 and 5..=7 come from parent1, 3 and 4 follow parent2 order
        assert_eq!(child.order(), &[0, 1, 2, 4, 3, 5, 6, 7]);
    }

    #[test]
    fn test_ordered_crossover_equal_cuts_copies_parent2() {
        let manager = create_line(8);
        let parent1 = Tour::from_order(&manager, (0..8).collect()).unwrap();
        let parent2 = Tour::from_order(&manager, vec![3, 7, 1, 0, 6, 2, 5, 4]).unwrap();

        let child = ordered_crossover(&parent1, &parent2, 4, 4).unwrap();
        assert_eq!(child.order(), parent2.order());
    }

    #[test]
    fn test_ordered_crossover_adjacent_cuts_copies_parent2() {
        let manager = create_line(6);
        let parent1 = Tour::from_order(&manager, (0..6).collect()).unwrap();
        let parent2 = Tour::from_order(&manager, vec![5, 3, 1, 0, 2, 4]).unwrap();

        let child = ordered_crossover(&parent1, &parent2, 2, 3).unwrap();
        assert_eq!(child.order(), parent2.order(), "nothing lies strictly between adjacent cuts");
    }

    #[test]
    fn test_ordered_crossover_identical_parents() {
        let manager = load_berlin52();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let parent = Tour::random(&manager, &mut rng);
        for (start, end) in [(0, 51), (51, 0), (10, 30), (30, 10), (7, 7)] {
            let child = ordered_crossover(&parent, &parent, start, end).unwrap();
            assert_eq!(child, parent, "crossing a tour with itself should give the same tour ({}, {})", start, end);
        }
    }

    #[test]
    fn test_ordered_crossover_rejects_different_sizes() {
        let small = create_line(3);
        let large = create_line(4);
        let parent1 = Tour::ordered(&small);
        let parent2 = Tour::ordered(&large);
        assert!(matches!(ordered_crossover(&parent1, &parent2, 0, 2), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_crossover_produces_valid_children() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..200 {
            let parent1 = Tour::random(&manager, &mut rng);
            let parent2 = Tour::random(&manager, &mut rng);
            let child = engine.crossover(&parent1, &parent2, &mut rng).unwrap();
            assert_eq!(child.tour_size(), 52);
            assert!(child.is_permutation(), "child should visit every city exactly once: {:?}", child);
        }
    }

    #[test]
    fn test_crossover_deterministic_with_seed() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let parent1 = Tour::random(&manager, &mut rng);
        let parent2 = Tour::random(&manager, &mut rng);

        let mut rng1 = ChaCha8Rng::seed_from_u64(123);
        let mut rng2 = ChaCha8Rng::seed_from_u64(123);
        for _ in 0..20 {
            let child1 = engine.crossover(&parent1, &parent2, &mut rng1).unwrap();
            let child2 = engine.crossover(&parent1, &parent2, &mut rng2).unwrap();
            assert_eq!(child1, child2, "same seed should produce the same child");
        }
    }

    #[test]
    fn test_crossover_single_city() {
        let manager = TourManager::from_cities(vec![City::new(1.0, 1.0)]);
        let engine = GeneticAlgorithm::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let parent = Tour::ordered(&manager);
        let child = engine.crossover(&parent, &parent, &mut rng).unwrap();
        assert_eq!(child.order(), &[0]);
    }

    #[test]
    fn test_mutate_with_zero_mutation_rate() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(0.0, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut tour = Tour::random(&manager, &mut rng);
        let before = tour.clone();

        engine.mutate(&mut tour, &mut rng).unwrap();
        assert_eq!(tour, before, "no position should move with a null mutation rate");
    }

    #[test]
    fn test_mutate_with_100_percent_rate() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(1.0, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut tour = Tour::random(&manager, &mut rng);
        let before = tour.clone();

        engine.mutate(&mut tour, &mut rng).unwrap();
        assert!(tour.is_permutation(), "mutation should only swap cities");
        assert_ne!(tour, before, "52 swaps should change the order");
    }

    #[test]
    fn test_mutate_deterministic_with_seed() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(0.1, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let base = Tour::random(&manager, &mut rng);

        let mut tour1 = base.clone();
        let mut tour2 = base.clone();
        engine.mutate(&mut tour1, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        engine.mutate(&mut tour2, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(tour1, tour2);
    }

    #[test]
    fn test_mutate_refreshes_distance() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(1.0, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut tour = Tour::random(&manager, &mut rng);
        let _ = tour.distance();

        engine.mutate(&mut tour, &mut rng).unwrap();
        let recomputed = Tour::from_order(&manager, tour.order().to_vec()).unwrap().distance();
        assert_eq!(tour.distance(), recomputed, "cached distance should follow the mutated order");
    }

    #[test]
    fn test_tournament_selection_full_size_returns_fittest() {
        let manager = load_berlin52();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = Population::random(&manager, 10, &mut rng);
        let engine = GeneticAlgorithm::new(0.0075, 10, true);
        let fittest = pop.fittest().unwrap();

        for _ in 0..50 {
            let selected = engine.tournament_selection(&pop, &mut rng).unwrap();
            assert_eq!(selected, fittest, "a tournament over the whole population should return the fittest tour");
        }
    }

    #[test]
    fn test_tournament_selection_picks_best_competitor() {
        let manager = load_berlin52();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = Population::random(&manager, 40, &mut rng);
        let engine = GeneticAlgorithm::new(0.0075, 5, true);

        // Replay the draws to know the competitors
        let mut replay = ChaCha8Rng::seed_from_u64(77);
        let competitors: Vec<usize> = (0..5).map(|_| replay.gen_range(0..40)).collect();
        let expected = competitors
            .iter()
            .map(|&i| pop.get_tour(i).unwrap())
            .fold(None, |best: Option<&Tour>, tour| match best {
                Some(b) if tour.fitness() <= b.fitness() => Some(b),
                _ => Some(tour),
            })
            .unwrap();

        let selected = engine.tournament_selection(&pop, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        assert_eq!(selected, expected);
    }

    #[test]
    fn test_tournament_selection_tie_keeps_first_drawn() {
        let manager = create_square();
        let pop = Population::from_tours(vec![
            Tour::from_order(&manager, vec![0, 2, 1, 3]).unwrap(),
            Tour::from_order(&manager, vec![0, 1, 2, 3]).unwrap(),
            Tour::from_order(&manager, vec![1, 2, 3, 0]).unwrap(),
            Tour::from_order(&manager, vec![3, 2, 1, 0]).unwrap(),
            Tour::from_order(&manager, vec![2, 3, 0, 1]).unwrap(),
        ]);
        let engine = GeneticAlgorithm::new(0.0, 3, true);

        for seed in 0..20 {
            let mut replay = ChaCha8Rng::seed_from_u64(seed);
            let drawn: Vec<usize> = (0..3).map(|_| replay.gen_range(0..5)).collect();
            // Every slot but the first holds the optimal perimeter
            let expected = drawn.iter().copied().find(|&i| i != 0).unwrap_or(0);

            let selected = engine.tournament_selection(&pop, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
            assert!(
                std::ptr::eq(selected, pop.get_tour(expected).unwrap()),
                "seed {}: draws {:?} should select slot {}",
                seed,
                drawn,
                expected
            );
        }
    }

    #[test]
    fn test_tournament_selection_empty_population() {
        let pop: Population = Population::new(0);
        let engine = GeneticAlgorithm::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(matches!(engine.tournament_selection(&pop, &mut rng), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_evolve_produces_valid_population() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(0.05, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = Population::random(&manager, 25, &mut rng);

        let new_pop = engine.evolve_population(&pop, &mut rng).unwrap();
        assert_eq!(new_pop.population_size(), 25, "population size should be constant");
        assert!(new_pop.is_complete(), "no slot should remain empty");
        assert!(new_pop.iter().all(|tour| tour.is_permutation()));
    }

    #[test]
    fn test_evolve_keeps_elite_in_first_slot() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(0.5, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = Population::random(&manager, 25, &mut rng);

        let new_pop = engine.evolve_population(&pop, &mut rng).unwrap();
        assert_eq!(
            new_pop.get_tour(0).unwrap(),
            pop.fittest().unwrap(),
            "the elite should be copied unmodified even with a high mutation rate"
        );
    }

    #[test]
    fn test_evolve_without_elitism() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(0.05, 3, false);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = Population::random(&manager, 10, &mut rng);

        let new_pop = engine.evolve_population(&pop, &mut rng).unwrap();
        assert_eq!(new_pop.population_size(), 10);
        assert!(new_pop.iter().all(|tour| tour.is_permutation()));
    }

    #[test]
    fn test_evolve_single_tour_population_with_elitism() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(1.0, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = Population::random(&manager, 1, &mut rng);

        let new_pop = engine.evolve_population(&pop, &mut rng).unwrap();
        assert_eq!(new_pop.get_tour(0).unwrap(), pop.get_tour(0).unwrap());
    }

    #[test]
    fn test_elitism_never_regresses() {
        let manager = load_berlin52();
        let engine = GeneticAlgorithm::new(0.02, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pop = Population::random(&manager, 30, &mut rng);

        for generation in 0..100 {
            let previous = pop.fittest().unwrap().distance();
            pop = engine.evolve_population(&pop, &mut rng).unwrap();
            let current = pop.fittest().unwrap().distance();
            assert!(
                current <= previous,
                "generation {}: best distance went from {} to {}",
                generation,
                previous,
                current
            );
        }
    }

    #[test]
    fn test_square_one_generation_without_mutation() {
        let manager = create_square();
        let engine = GeneticAlgorithm::new(0.0, 3, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = Population::random(&manager, 10, &mut rng);
        let best_initial = pop.iter().map(|tour| tour.distance()).fold(f64::INFINITY, f64::min);

        let new_pop = engine.evolve_population(&pop, &mut rng).unwrap();
        let best = new_pop.fittest().unwrap().distance();
        assert!(best <= best_initial, "best distance {} should not exceed initial best {}", best, best_initial);
        assert!(best >= 40.0 - 1e-9, "no tour can beat the perimeter of the square");
    }

    #[test]
    fn test_ga_deterministic_with_seed() {
        let manager = load_berlin52();
        let param = create_test_params();

        let run1 = ga(&manager, &param, Arc::new(AtomicBool::new(true))).unwrap();
        let run2 = ga(&manager, &param, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(run1.initial_distance, run2.initial_distance);
        assert_eq!(run1.distance_trace, run2.distance_trace, "same seed should replay the same run");
        assert_eq!(run1.fittest().unwrap(), run2.fittest().unwrap());
    }

    #[test]
    fn test_ga_trace() {
        let manager = load_berlin52();
        let param = create_test_params();

        let evolution = ga(&manager, &param, Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(evolution.generations(), 20, "one trace value per generation");
        assert!(evolution.distance_trace[0] <= evolution.initial_distance);
        for pair in evolution.distance_trace.windows(2) {
            assert!(pair[1] <= pair[0], "elitism should make the trace non-increasing");
        }
        assert_eq!(*evolution.distance_trace.last().unwrap(), evolution.fittest().unwrap().distance());
    }

    #[test]
    fn test_ga_stops_when_not_running() {
        let manager = load_berlin52();
        let param = create_test_params();

        let evolution = ga(&manager, &param, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(evolution.generations(), 0);
        assert_eq!(evolution.population.population_size(), 30);
        assert_eq!(evolution.fittest().unwrap().distance(), evolution.initial_distance);
    }

    #[test]
    fn test_ga_stops_when_best_tour_is_too_old() {
        let manager = load_berlin52();
        let mut param = create_test_params();
        // Every selection returns the fittest tour and nothing mutates: no progress is possible
        param.ga.tournament_size = param.ga.population_size;
        param.ga.mutation_rate = 0.0;
        param.ga.max_age_best_tour = 5;

        let evolution = ga(&manager, &param, Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(evolution.generations(), 5);
        assert!(evolution.distance_trace.iter().all(|&d| d == evolution.initial_distance));
    }

    #[test]
    fn test_ga_rejects_non_finite_cities() {
        let manager = TourManager::from_cities(vec![
            City::new(0.0, 0.0),
            City::new(f64::NAN, 1.0),
            City::new(3.0, 4.0),
            City::new(f64::INFINITY, 2.0),
        ]);
        let param = create_test_params();
        assert!(matches!(ga(&manager, &param, Arc::new(AtomicBool::new(true))), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_ga_rejects_empty_registry() {
        let manager = TourManager::new();
        let param = create_test_params();
        assert!(matches!(ga(&manager, &param, Arc::new(AtomicBool::new(true))), Err(Error::EmptyRegistry)));
    }
}
