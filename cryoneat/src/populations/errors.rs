use crate::genomics::ConfigError;
use crate::Innovation;

use thiserror::Error;

/// An error type indicating a failure
/// to build a population.
#[derive(Debug, Error)]
pub enum PopulationError {
    /// No nodes were given.
    #[error("population seeded with no nodes")]
    NoNodes,
    /// A seed connection refers to a node not in the node list.
    #[error(
        "seed connection {input} -> {output} has an undefined node ID \
        (largest node ID defined was {largest})"
    )]
    UndefinedNode {
        input: Innovation,
        output: Innovation,
        largest: Innovation,
    },
    /// A seed connection appears twice.
    #[error("repeated seed connection {input} -> {output}")]
    DuplicateConnection { input: Innovation, output: Innovation },
    /// A configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// An error type indicating a failure
/// to advance a population a generation.
#[derive(Debug, Error)]
pub enum EpochError {
    /// The population has no species left.
    #[error("attempted epoch on population with no species")]
    NoSpecies,
}
