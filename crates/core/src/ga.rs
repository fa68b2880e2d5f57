//! Genetic algorithm over part orderings and rotation assignments.
//!
//! The algorithm is step-driven: the caller scans for the first
//! [`Evaluation::Unevaluated`] individual, evaluates it, records the fitness,
//! and asks for a new generation once every individual carries a score. It
//! never terminates on its own.

use crate::config::Config;
use crate::result::Fitness;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::cmp::Ordering;

/// Evaluation state of an individual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Not placed yet.
    Unevaluated,
    /// Placed and scored.
    Evaluated(Fitness),
}

impl Evaluation {
    /// The fitness, if evaluated.
    pub fn fitness(&self) -> Option<Fitness> {
        match self {
            Evaluation::Unevaluated => None,
            Evaluation::Evaluated(f) => Some(*f),
        }
    }

    /// Returns true once a fitness has been recorded.
    pub fn is_evaluated(&self) -> bool {
        matches!(self, Evaluation::Evaluated(_))
    }
}

/// One candidate: an ordering of genes, each with a rotation in degrees.
#[derive(Debug, Clone)]
pub struct Individual<G> {
    /// Placement order.
    pub genes: Vec<G>,
    /// Rotation of `genes[i]`, in degrees.
    pub rotations: Vec<f64>,
    /// Evaluation state.
    pub evaluation: Evaluation,
}

impl<G: Clone + PartialEq> Individual<G> {
    /// Creates an unevaluated individual.
    pub fn new(genes: Vec<G>, rotations: Vec<f64>) -> Self {
        debug_assert_eq!(genes.len(), rotations.len());
        Self {
            genes,
            rotations,
            evaluation: Evaluation::Unevaluated,
        }
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns true if the individual has no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Iterates `(gene, rotation)` pairs in placement order.
    pub fn iter(&self) -> impl Iterator<Item = (&G, f64)> {
        self.genes.iter().zip(self.rotations.iter().copied())
    }

    /// One-point order crossover.
    ///
    /// The first child takes `self`'s prefix up to the cut and the remaining
    /// genes in `other`'s order; the second child is symmetric. Rotations
    /// travel with their genes.
    pub fn crossover(&self, other: &Self, cut: usize) -> (Self, Self) {
        (self.splice(other, cut), other.splice(self, cut))
    }

    fn splice(&self, other: &Self, cut: usize) -> Self {
        let cut = cut.min(self.len());
        let mut genes: Vec<G> = self.genes[..cut].to_vec();
        let mut rotations: Vec<f64> = self.rotations[..cut].to_vec();

        for (gene, rotation) in other.iter() {
            if !genes.contains(gene) {
                genes.push(gene.clone());
                rotations.push(rotation);
            }
        }

        Self::new(genes, rotations)
    }
}

/// Population-level state of the genetic algorithm.
#[derive(Debug)]
pub struct GeneticAlgorithm<G> {
    population: Vec<Individual<G>>,
    angles: Vec<f64>,
    population_size: usize,
    mutation_probability: f64,
    generation: u32,
    rng: StdRng,
}

impl<G: Clone + PartialEq> GeneticAlgorithm<G> {
    /// Seeds the population with `adam` followed by mutants of it.
    ///
    /// Uses `config.seed` for a reproducible RNG when set.
    pub fn new(adam: Individual<G>, config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(adam, config, rng)
    }

    /// Like [`GeneticAlgorithm::new`] with an explicit RNG.
    pub fn with_rng(adam: Individual<G>, config: &Config, rng: StdRng) -> Self {
        let mut ga = Self {
            population: Vec::with_capacity(config.population_size),
            angles: config.rotation_angles(),
            population_size: config.population_size.max(1),
            mutation_probability: config.mutation_probability(),
            generation: 0,
            rng,
        };

        let mut adam = adam;
        adam.evaluation = Evaluation::Unevaluated;
        while ga.population.len() + 1 < ga.population_size {
            let mutant = ga.mutate(&adam);
            ga.population.push(mutant);
        }
        ga.population.insert(0, adam);
        ga
    }

    /// The current population.
    pub fn population(&self) -> &[Individual<G>] {
        &self.population
    }

    /// Individual at `index`.
    pub fn individual(&self, index: usize) -> Option<&Individual<G>> {
        self.population.get(index)
    }

    /// Number of generations produced since construction.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Index of the first individual without a fitness.
    pub fn first_unevaluated(&self) -> Option<usize> {
        self.population
            .iter()
            .position(|ind| !ind.evaluation.is_evaluated())
    }

    /// Number of individuals in the current population that carry a fitness.
    pub fn evaluated_count(&self) -> usize {
        self.population
            .iter()
            .filter(|ind| ind.evaluation.is_evaluated())
            .count()
    }

    /// Fraction of the current population that has been evaluated.
    pub fn progress(&self) -> f64 {
        self.evaluated_count() as f64 / self.population.len().max(1) as f64
    }

    /// Records the fitness of the individual at `index`.
    pub fn set_fitness(&mut self, index: usize, fitness: Fitness) {
        if let Some(ind) = self.population.get_mut(index) {
            ind.evaluation = Evaluation::Evaluated(fitness);
        }
    }

    /// Best evaluated fitness in the current population.
    pub fn best_fitness(&self) -> Option<Fitness> {
        self.population
            .iter()
            .filter_map(|ind| ind.evaluation.fitness())
            .min_by(|a, b| a.compare(b))
    }

    /// Replaces the population with the next generation.
    ///
    /// The best individual survives with its fitness; the remaining slots are
    /// filled with mutated crossover children of rank-weighted parents.
    pub fn next_generation(&mut self) {
        self.population.sort_by(compare_evaluation);

        let mut next = Vec::with_capacity(self.population_size);
        if let Some(best) = self.population.first() {
            next.push(best.clone());
        }

        while next.len() < self.population_size && !self.population.is_empty() {
            let male = self.select(None);
            let female = self.select(Some(male));
            let cut = self.cut_point(self.population[male].len());
            let (first, second) = self.population[male].crossover(&self.population[female], cut);

            let child = self.mutate(&first);
            next.push(child);
            if next.len() < self.population_size {
                let child = self.mutate(&second);
                next.push(child);
            }
        }

        self.population = next;
        self.generation += 1;
        log::debug!(
            "generation {} created with {} individuals",
            self.generation,
            self.population.len()
        );
    }

    fn cut_point(&mut self, len: usize) -> usize {
        let u: f64 = self.rng.gen::<f64>().clamp(0.1, 0.9);
        (u * len.saturating_sub(1) as f64).round() as usize
    }

    /// Rank-weighted roulette over the sorted population.
    fn select(&mut self, exclude: Option<usize>) -> usize {
        let n = self.population.len();
        let candidates: Vec<usize> = (0..n).filter(|&i| Some(i) != exclude).collect();
        if candidates.is_empty() {
            return 0;
        }

        candidates
            .choose_weighted(&mut self.rng, |&rank| (n - rank) as f64)
            .copied()
            .unwrap_or(candidates[0])
    }

    fn mutate(&mut self, individual: &Individual<G>) -> Individual<G> {
        let mut genes = individual.genes.clone();
        let mut rotations = individual.rotations.clone();
        let n = genes.len();

        if n >= 2 && self.rng.gen::<f64>() < self.mutation_probability {
            let i = self.rng.gen_range(0..n);
            let j = self.rng.gen_range(0..n);
            genes.swap(i, j);
            rotations.swap(i, j);
        }

        for rotation in rotations.iter_mut() {
            if self.rng.gen::<f64>() < self.mutation_probability {
                if let Some(&angle) = self.angles.choose(&mut self.rng) {
                    *rotation = angle;
                }
            }
        }

        Individual::new(genes, rotations)
    }
}

/// Evaluated individuals first, best fitness first.
fn compare_evaluation<G>(a: &Individual<G>, b: &Individual<G>) -> Ordering {
    match (a.evaluation, b.evaluation) {
        (Evaluation::Evaluated(fa), Evaluation::Evaluated(fb)) => fa.compare(&fb),
        (Evaluation::Evaluated(_), Evaluation::Unevaluated) => Ordering::Less,
        (Evaluation::Unevaluated, Evaluation::Evaluated(_)) => Ordering::Greater,
        (Evaluation::Unevaluated, Evaluation::Unevaluated) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new()
            .with_population_size(10)
            .with_mutation_rate(30)
            .with_rotations(4)
            .with_seed(42)
    }

    fn adam(n: i32) -> Individual<i32> {
        Individual::new((0..n).collect(), vec![0.0; n as usize])
    }

    fn is_permutation(genes: &[i32], n: i32) -> bool {
        let mut sorted = genes.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    /// Placing low ids early scores better.
    fn score(ind: &Individual<i32>) -> Fitness {
        let misplaced: f64 = ind
            .genes
            .iter()
            .enumerate()
            .map(|(pos, &g)| (pos as f64 - g as f64).abs())
            .sum();
        Fitness {
            unplaced: 0,
            sheets: 1,
            waste: misplaced / 100.0,
            order_penalty: 0.0,
            total: ind.len(),
        }
    }

    #[test]
    fn test_initial_population() {
        let ga = GeneticAlgorithm::new(adam(6), &config());
        assert_eq!(ga.population().len(), 10);
        assert_eq!(ga.population()[0].genes, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(ga.first_unevaluated(), Some(0));
        for ind in ga.population() {
            assert!(is_permutation(&ind.genes, 6));
            assert!(ind.rotations.iter().all(|r| [0.0, 90.0, 180.0, 270.0].contains(r)));
        }
    }

    #[test]
    fn test_crossover_produces_permutations() {
        let male = Individual::new(vec![0, 1, 2, 3, 4], vec![0.0, 90.0, 180.0, 270.0, 0.0]);
        let female = Individual::new(vec![4, 3, 2, 1, 0], vec![90.0; 5]);

        for cut in 0..=5 {
            let (a, b) = male.crossover(&female, cut);
            assert!(is_permutation(&a.genes, 5));
            assert!(is_permutation(&b.genes, 5));
            assert_eq!(&a.genes[..cut], &male.genes[..cut]);
            assert_eq!(&b.genes[..cut], &female.genes[..cut]);
        }

        let (child, _) = male.crossover(&female, 2);
        assert_eq!(child.genes, vec![0, 1, 4, 3, 2]);
        assert_eq!(child.rotations, vec![0.0, 90.0, 90.0, 90.0, 90.0]);
    }

    #[test]
    fn test_generation_keeps_permutations() {
        let mut ga = GeneticAlgorithm::new(adam(8), &config());
        for _ in 0..5 {
            while let Some(i) = ga.first_unevaluated() {
                let f = score(&ga.population()[i]);
                ga.set_fitness(i, f);
            }
            ga.next_generation();
            assert_eq!(ga.population().len(), 10);
            for ind in ga.population() {
                assert!(is_permutation(&ind.genes, 8));
                assert_eq!(ind.genes.len(), ind.rotations.len());
            }
        }
        assert_eq!(ga.generation(), 5);
    }

    #[test]
    fn test_elitism_never_regresses() {
        let mut ga = GeneticAlgorithm::new(adam(7), &config());
        let mut previous: Option<Fitness> = None;

        for _ in 0..20 {
            while let Some(i) = ga.first_unevaluated() {
                let f = score(&ga.population()[i]);
                ga.set_fitness(i, f);
            }
            let best = ga.best_fitness().unwrap();
            if let Some(prev) = previous {
                assert!(!prev.is_better_than(&best));
            }
            previous = Some(best);
            ga.next_generation();
            assert!(ga.population()[0].evaluation.is_evaluated());
            assert_eq!(ga.first_unevaluated(), Some(1));
        }
    }

    #[test]
    fn test_select_skips_excluded_and_favors_rank() {
        let mut ga = GeneticAlgorithm::new(adam(5), &config());
        let mut top = 0;
        for _ in 0..500 {
            let picked = ga.select(Some(0));
            assert_ne!(picked, 0);
            assert!(picked < ga.population().len());
            if picked == 1 {
                top += 1;
            }
        }
        // Rank 1 weighs 9 of 45 against rank 9's 1 of 45.
        assert!(top > 50, "rank 1 picked {top} times");
    }

    #[test]
    fn test_progress() {
        let mut ga = GeneticAlgorithm::new(adam(3), &config());
        assert_eq!(ga.evaluated_count(), 0);
        let f = score(&ga.population()[0]);
        ga.set_fitness(0, f);
        assert!((ga.progress() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = GeneticAlgorithm::new(adam(6), &config());
        let b = GeneticAlgorithm::new(adam(6), &config());
        let genes_a: Vec<_> = a.population().iter().map(|i| i.genes.clone()).collect();
        let genes_b: Vec<_> = b.population().iter().map(|i| i.genes.clone()).collect();
        assert_eq!(genes_a, genes_b);
    }
}
