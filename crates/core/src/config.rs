//! Nesting configuration.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a nesting run.
///
/// Every field participates in the geometry that ends up in the NFP cache,
/// so changing any of them invalidates the cache, the best result and the
/// genetic algorithm state of the nester that owns it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Integer scaling factor used by the polygon-clipping adapter.
    pub clipper_scale: f64,

    /// Curve flattening and degeneracy threshold.
    pub curve_tolerance: f64,

    /// Minimum clearance between parts (and between parts and the container).
    pub spacing: f64,

    /// Number of equally spaced candidate angles in `[0, 360)`.
    pub rotations: usize,

    /// Number of individuals in the genetic algorithm.
    pub population_size: usize,

    /// Mutation probability as an integer percentage (0 - 100).
    pub mutation_rate: u32,

    /// Whether holes of placed parts can host other parts.
    pub use_holes: bool,

    /// Enable the concave-aware NFP algorithm instead of the outer-loop approximation.
    pub explore_concave: bool,

    /// Worker pool size for NFP batches (0 = available parallelism).
    pub threads: usize,

    /// Seed for the genetic algorithm RNG (None = entropy).
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clipper_scale: 10_000_000.0,
            curve_tolerance: 0.3,
            spacing: 0.0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            use_holes: false,
            explore_concave: false,
            threads: 0,
            seed: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the curve tolerance.
    pub fn with_curve_tolerance(mut self, tolerance: f64) -> Self {
        self.curve_tolerance = tolerance;
        self
    }

    /// Sets the spacing between parts.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Sets the number of candidate rotations.
    pub fn with_rotations(mut self, rotations: usize) -> Self {
        self.rotations = rotations;
        self
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the mutation rate in percent.
    pub fn with_mutation_rate(mut self, percent: u32) -> Self {
        self.mutation_rate = percent;
        self
    }

    /// Enables or disables placing parts inside holes of other parts.
    pub fn with_holes(mut self, use_holes: bool) -> Self {
        self.use_holes = use_holes;
        self
    }

    /// Enables or disables the concave-aware NFP algorithm.
    pub fn with_explore_concave(mut self, explore: bool) -> Self {
        self.explore_concave = explore;
        self
    }

    /// Sets the NFP worker pool size.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Seeds the genetic algorithm RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Mutation probability in `[0, 1]`.
    pub fn mutation_probability(&self) -> f64 {
        f64::from(self.mutation_rate.min(100)) / 100.0
    }

    /// Candidate rotation angles in degrees.
    pub fn rotation_angles(&self) -> Vec<f64> {
        let n = self.rotations.max(1);
        (0..n).map(|i| i as f64 * 360.0 / n as f64).collect()
    }

    /// Checks that every option is in its valid range.
    pub fn validate(&self) -> Result<()> {
        if !self.curve_tolerance.is_finite() || self.curve_tolerance <= 0.0 {
            return Err(Error::ConfigError(format!(
                "curve tolerance must be positive, got {}",
                self.curve_tolerance
            )));
        }
        if !self.spacing.is_finite() || self.spacing < 0.0 {
            return Err(Error::ConfigError(format!(
                "spacing must be non-negative, got {}",
                self.spacing
            )));
        }
        if self.rotations == 0 {
            return Err(Error::ConfigError("rotations must be at least 1".into()));
        }
        if self.population_size <= 2 {
            return Err(Error::ConfigError(format!(
                "population size must be greater than 2, got {}",
                self.population_size
            )));
        }
        if self.mutation_rate > 100 {
            return Err(Error::ConfigError(format!(
                "mutation rate is a percentage, got {}",
                self.mutation_rate
            )));
        }
        if !self.clipper_scale.is_finite() || self.clipper_scale < 1.0 {
            return Err(Error::ConfigError(format!(
                "clipper scale must be at least 1, got {}",
                self.clipper_scale
            )));
        }
        Ok(())
    }

    /// Applies a partial update the lenient way.
    ///
    /// Zero or out-of-range numeric fields of `update` keep the current value;
    /// the boolean switches, thread count and seed are always taken from `update`.
    pub fn merge(&self, update: &Config) -> Config {
        let mut merged = self.clone();

        if update.curve_tolerance.is_finite() && update.curve_tolerance > 0.0 {
            merged.curve_tolerance = update.curve_tolerance;
        }
        if update.spacing.is_finite() && update.spacing > 0.0 {
            merged.spacing = update.spacing;
        }
        if update.rotations > 0 {
            merged.rotations = update.rotations;
        }
        if update.population_size > 2 {
            merged.population_size = update.population_size;
        }
        if update.mutation_rate > 0 && update.mutation_rate <= 100 {
            merged.mutation_rate = update.mutation_rate;
        }

        merged.use_holes = update.use_holes;
        merged.explore_concave = update.explore_concave;
        merged.threads = update.threads;
        merged.seed = update.seed;
        merged
    }
}
