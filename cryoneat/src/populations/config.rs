use crate::genomics::{check_probability, ConfigError};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. This is
/// checked by [`validate`].
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes produced every generation.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, at or below which
    /// a genome belongs to a species.
    pub distance_threshold: f32,
    /// Top % of each species which can participate
    /// in reproduction. The best genome always survives.
    pub survival_threshold: f32,
    /// Minimum offspring count for which a species'
    /// champion is copied as-is into the next generation.
    pub champion_survival_threshold: usize,
    /// Age up to which a species is considered young.
    pub youth_age: usize,
    /// Fitness multiplier for young species.
    pub youth_reward: f32,
    /// Generations without a new best genome before
    /// a species is considered _stagnated_.
    pub stagnation_age: usize,
    /// Fitness multiplier for stagnated and terminal species.
    pub stagnation_penalty: f32,
    /// Age beyond which a species can be marked terminal.
    pub over_the_hill_age: usize,
    /// Every how many generations the oldest species
    /// beyond [`over_the_hill_age`] is marked terminal.
    ///
    /// [`over_the_hill_age`]: PopulationConfig::over_the_hill_age
    pub stagnation_epoch_cycle: NonZeroUsize,
    /// Generations without a new population champion
    /// before offspring are concentrated on the best
    /// two species.
    pub dropoff_generations: usize,
    /// Chance that offspring will be a mutated copy of
    /// a single parent (as opposed to sexual reproduction).
    pub mutate_only_chance: f32,
    /// Chance that sexually produced offspring
    /// will not be mutated.
    pub mate_only_chance: f32,
    /// Chance that the second parent will be the
    /// champion of another species.
    pub interspecies_mating_chance: f32,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::populations::PopulationConfig;
    ///
    /// let cfg1 = PopulationConfig::zero();
    ///
    /// let cfg2 = PopulationConfig {
    ///     // Specify some values here...
    ///     stagnation_penalty: 0.5,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            distance_threshold: 0.0,
            survival_threshold: 0.0,
            champion_survival_threshold: 0,
            youth_age: 0,
            youth_reward: 0.0,
            stagnation_age: 0,
            stagnation_penalty: 0.0,
            over_the_hill_age: 0,
            stagnation_epoch_cycle: NonZeroUsize::MIN,
            dropoff_generations: 0,
            mutate_only_chance: 0.0,
            mate_only_chance: 0.0,
            interspecies_mating_chance: 0.0,
        }
    }

    /// Checks that every probability lies in `[0, 1]`.
    ///
    /// # Errors
    /// Returns the first offending value.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::populations::PopulationConfig;
    ///
    /// assert!(PopulationConfig::default().validate().is_ok());
    /// assert!(PopulationConfig {
    ///     mate_only_chance: -0.1,
    ///     ..PopulationConfig::default()
    /// }
    /// .validate()
    /// .is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("survival_threshold", self.survival_threshold),
            ("mutate_only_chance", self.mutate_only_chance),
            ("mate_only_chance", self.mate_only_chance),
            ("interspecies_mating_chance", self.interspecies_mating_chance),
        ] {
            check_probability(name, value)?;
        }
        Ok(())
    }
}

impl Default for PopulationConfig {
    /// The configuration the algorithm was tuned with,
    /// for a population of 150.
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(150).expect("150 is non-zero"),
            distance_threshold: 3.0,
            survival_threshold: 0.2,
            champion_survival_threshold: 6,
            youth_age: 10,
            youth_reward: 1.0,
            stagnation_age: 10,
            stagnation_penalty: 0.01,
            over_the_hill_age: 20,
            stagnation_epoch_cycle: NonZeroUsize::new(30).expect("30 is non-zero"),
            dropoff_generations: 20,
            mutate_only_chance: 0.25,
            mate_only_chance: 0.2,
            interspecies_mating_chance: 0.001,
        }
    }
}
