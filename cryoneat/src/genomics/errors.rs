use thiserror::Error;

/// An error type indicating a failure
/// to carry out a node addition mutation.
#[derive(Debug, Error)]
pub enum NodeAdditionMutationError {
    /// The genome had no unfrozen gene
    /// that doesn't come out of a bias node.
    #[error("node mutation on genome with no splittable genes")]
    NoSplittableGene,
}

/// An error type indicating a failure
/// to carry out a gene addition mutation.
#[derive(Debug, Error)]
pub enum GeneAdditionMutationError {
    /// The genome's unfrozen genes touch no nodes
    /// that could serve as source or target.
    #[error("gene mutation on genome with no candidate endpoints")]
    NoCandidateNodes,
    /// Every sampled node pair was already connected.
    #[error("no unconnected node pair found for gene mutation after {0} attempts")]
    AttemptsExhausted(usize),
}

/// An error type indicating a failure to
/// toggle a gene's freeze status.
#[derive(Debug, Error)]
pub enum FreezeMutationError {
    /// There was no gene to toggle.
    #[error("freeze mutation on genome with no eligible genes")]
    NoEligibleGene,
    /// The toggle left some gene unconnected to
    /// the network's inputs or outputs, and was reverted.
    #[error("freeze mutation of gene {0} reverted: genome invalidated")]
    Reverted(crate::Innovation),
}

/// An error type indicating an unusable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A table of style weights has no positive weight.
    #[error("all {0} weights are zero")]
    NoStyleWeight(&'static str),
    /// A probability is outside of `[0, 1]`.
    #[error("probability `{name}` is {value}, outside of [0, 1]")]
    InvalidProbability { name: &'static str, value: f32 },
    /// A quantity that must be positive is not.
    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
}

/// An error type indicating that a mutation
/// could not be carried out and was skipped.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    NodeAddition(#[from] NodeAdditionMutationError),
    #[error(transparent)]
    GeneAddition(#[from] GeneAdditionMutationError),
    #[error(transparent)]
    Freeze(#[from] FreezeMutationError),
}

/// An error type indicating that a gene could
/// not be added to a genome.
#[derive(Debug, Error)]
pub enum GeneViabilityError {
    /// The genome already has a gene with this innovation number.
    #[error("duplicate gene insertion with ID {0}")]
    DuplicateGeneID(crate::Innovation),
    /// The genome already has a gene joining the same nodes.
    #[error("duplicate gene insertion between nodes {0} -> {1}")]
    DuplicateGeneWithEndpoints(crate::Innovation, crate::Innovation),
}
