use crate::genomics::{ActivationType, ConfigError};

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The kinds of mutation a genome can undergo in one
/// call to [`Genome::mutate`].
///
/// [`Genome::mutate`]: crate::genomics::Genome::mutate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationStyle {
    /// Split a gene with a new node.
    AddNode,
    /// Connect two previously unconnected nodes.
    AddConnection,
    /// Try every non-structural mutation: weight
    /// perturbation, freeze toggling, and unfreezing.
    TryAllNonStructural,
}

/// The ways two genomes can be combined by [`Genome::mate`].
///
/// [`Genome::mate`]: crate::genomics::Genome::mate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatingStyle {
    /// Common genes are taken from either parent.
    MultiPoint,
    /// Common genes get the average of both parents' weights.
    MultiPointAverage,
    /// Genes are taken from one parent up to a crossover
    /// point, and from the other after it.
    SinglePoint,
}

/// Relative weights of each [`MutationStyle`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationWeights {
    pub add_node: u32,
    pub add_connection: u32,
    pub try_all_non_structural: u32,
}

/// Relative weights of each [`MatingStyle`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatingWeights {
    pub multi_point: u32,
    pub multi_point_average: u32,
    pub single_point: u32,
}

/// Relative weights of each [`ActivationType`]
/// for nodes created by mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivationWeights {
    pub sigmoid: u32,
    pub steepened_sigmoid: u32,
    pub relu: u32,
    pub identity: u32,
}

// Picks one of `choices` with a chance proportional to its weight.
fn choose_weighted<T: Copy, R: Rng + ?Sized>(
    choices: &[(T, u32)],
    rng: &mut R,
) -> Option<T> {
    WeightedIndex::new(choices.iter().map(|(_, w)| *w))
        .ok()
        .map(|index| choices[index.sample(rng)].0)
}

impl MutationWeights {
    fn table(&self) -> [(MutationStyle, u32); 3] {
        [
            (MutationStyle::AddNode, self.add_node),
            (MutationStyle::AddConnection, self.add_connection),
            (MutationStyle::TryAllNonStructural, self.try_all_non_structural),
        ]
    }

    /// Chooses a mutation style at random.
    ///
    /// Returns `None` if all weights are zero.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<MutationStyle> {
        choose_weighted(&self.table(), rng)
    }
}

impl MatingWeights {
    fn table(&self) -> [(MatingStyle, u32); 3] {
        [
            (MatingStyle::MultiPoint, self.multi_point),
            (MatingStyle::MultiPointAverage, self.multi_point_average),
            (MatingStyle::SinglePoint, self.single_point),
        ]
    }

    /// Chooses a mating style at random.
    ///
    /// Returns `None` if all weights are zero.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<MatingStyle> {
        choose_weighted(&self.table(), rng)
    }
}

impl ActivationWeights {
    fn table(&self) -> [(ActivationType, u32); 4] {
        [
            (ActivationType::Sigmoid, self.sigmoid),
            (ActivationType::SteepenedSigmoid, self.steepened_sigmoid),
            (ActivationType::ReLU, self.relu),
            (ActivationType::Identity, self.identity),
        ]
    }

    /// Chooses an activation type at random.
    ///
    /// Returns `None` if all weights are zero.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ActivationType> {
        choose_weighted(&self.table(), rng)
    }
}

/// Configuration data for genome mutation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. This,
/// and every weight table having some positive
/// weight, is checked by [`validate`].
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Relative frequency of each mutation style.
    pub mutation_weights: MutationWeights,
    /// Relative frequency of each mating style.
    pub mating_weights: MatingWeights,
    /// Relative frequency of each activation type
    /// for nodes added by mutation.
    pub activation_weights: ActivationWeights,
    /// Chance that the weights of all unfrozen genes
    /// are perturbed during a non-structural mutation.
    pub weight_mutation_chance: f32,
    /// Chance that a random gene's freeze status is
    /// toggled during a non-structural mutation.
    pub toggle_freeze_chance: f32,
    /// Chance that a random frozen gene is unfrozen
    /// during a non-structural mutation.
    pub unfreeze_chance: f32,
    /// Chance that a common gene is frozen in a child
    /// when it is frozen in only one of the parents.
    pub freeze_from_frozen_parent_chance: f32,
    /// Chance that a common gene is copied from the
    /// stronger parent during multi-point mating.
    pub select_stronger_parent_chance: f32,
    /// Maximum magnitude of a gene's weight.
    pub weight_bound: f32,
    /// Number of node pairs sampled during a gene
    /// addition mutation before giving up.
    pub max_gene_addition_mutation_attempts: usize,
    /// Weight of excess genes in genetic distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the common gene weight average in genetic distance.
    pub common_weight_factor: f32,
    /// Gene count from which the excess and disjoint
    /// gene counts are divided by the size of the
    /// larger genome in genetic distance.
    pub normalization_threshold: usize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments,
    /// and fails [`validate`]. It is meant as a way to fill in
    /// unused values during configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{GeneticConfig, MutationWeights};
    ///
    /// let cfg = GeneticConfig {
    ///     // Specify some values here...
    ///     mutation_weights: MutationWeights {
    ///         add_node: 1,
    ///         add_connection: 1,
    ///         try_all_non_structural: 0,
    ///     },
    ///     weight_bound: 5.0,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    ///
    /// [`validate`]: GeneticConfig::validate
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            mutation_weights: MutationWeights {
                add_node: 0,
                add_connection: 0,
                try_all_non_structural: 0,
            },
            mating_weights: MatingWeights {
                multi_point: 0,
                multi_point_average: 0,
                single_point: 0,
            },
            activation_weights: ActivationWeights {
                sigmoid: 0,
                steepened_sigmoid: 0,
                relu: 0,
                identity: 0,
            },
            weight_mutation_chance: 0.0,
            toggle_freeze_chance: 0.0,
            unfreeze_chance: 0.0,
            freeze_from_frozen_parent_chance: 0.0,
            select_stronger_parent_chance: 0.0,
            weight_bound: 0.0,
            max_gene_addition_mutation_attempts: 0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
            normalization_threshold: 0,
        }
    }

    /// Checks that the configuration can drive evolution.
    ///
    /// # Errors
    /// Returns an error if a weight table has only zero
    /// weights, a probability lies outside `[0, 1]`, or the
    /// weight bound or gene addition attempt count is not positive.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::GeneticConfig;
    ///
    /// assert!(GeneticConfig::default().validate().is_ok());
    /// assert!(GeneticConfig::zero().validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mutation_weights.table().iter().all(|(_, w)| *w == 0) {
            return Err(ConfigError::NoStyleWeight("mutation style"));
        }
        if self.mating_weights.table().iter().all(|(_, w)| *w == 0) {
            return Err(ConfigError::NoStyleWeight("mating style"));
        }
        if self.activation_weights.table().iter().all(|(_, w)| *w == 0) {
            return Err(ConfigError::NoStyleWeight("activation type"));
        }
        for (name, value) in [
            ("weight_mutation_chance", self.weight_mutation_chance),
            ("toggle_freeze_chance", self.toggle_freeze_chance),
            ("unfreeze_chance", self.unfreeze_chance),
            (
                "freeze_from_frozen_parent_chance",
                self.freeze_from_frozen_parent_chance,
            ),
            (
                "select_stronger_parent_chance",
                self.select_stronger_parent_chance,
            ),
        ] {
            check_probability(name, value)?;
        }
        if !(self.weight_bound > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "weight_bound",
                value: self.weight_bound,
            });
        }
        if self.max_gene_addition_mutation_attempts == 0 {
            return Err(ConfigError::NonPositive {
                name: "max_gene_addition_mutation_attempts",
                value: 0.0,
            });
        }
        Ok(())
    }
}

pub(crate) fn check_probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

impl Default for GeneticConfig {
    /// The configuration the algorithm was tuned with.
    fn default() -> GeneticConfig {
        GeneticConfig {
            mutation_weights: MutationWeights {
                add_node: 3,
                add_connection: 5,
                try_all_non_structural: 92,
            },
            mating_weights: MatingWeights {
                multi_point: 6,
                multi_point_average: 4,
                single_point: 0,
            },
            activation_weights: ActivationWeights {
                sigmoid: 0,
                steepened_sigmoid: 1,
                relu: 0,
                identity: 0,
            },
            weight_mutation_chance: 0.9,
            toggle_freeze_chance: 0.25,
            unfreeze_chance: 0.25,
            freeze_from_frozen_parent_chance: 0.75,
            select_stronger_parent_chance: 0.5,
            weight_bound: 8.0,
            max_gene_addition_mutation_attempts: 20,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
            normalization_threshold: 20,
        }
    }
}
