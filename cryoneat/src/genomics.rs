//! Genomes are the focus of evolution in NEAT.
//! They are a collection of connection genes that refer to
//! globally registered nodes and connections, and can be
//! instantiated as a phenotype (a neural network). Genomes
//! can be progressively mutated, thus adding complexity
//! and functionality.

mod config;
mod distance;
mod errors;
mod genes;
mod history;
mod mating;
mod mutation;
mod nodes;
mod registry;

pub use config::{
    ActivationWeights, GeneticConfig, MatingStyle, MatingWeights, MutationStyle, MutationWeights,
};
pub(crate) use config::check_probability;
pub use errors::*;
pub use genes::Gene;
pub use history::{History, InnovationKey, InnovationLedger, InnovationRecord};
pub use nodes::{ActivationType, NodeRecord, NodeType};
pub use registry::{ConnectionRecord, ConnectionRegistry, NodeRegistry};

use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::{HashMap, HashSet};
use std::fmt;

/// A mutable collection of genes, kept
/// sorted by innovation number.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<Gene>,
    fitness: f32,
    adjusted_fitness: f32,
}

impl Genome {
    /// Creates a new genome with no genes.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    ///
    /// let genome = Genome::new();
    ///
    /// assert!(genome.is_empty());
    /// assert_eq!(genome.fitness(), 0.0);
    /// ```
    pub fn new() -> Genome {
        Genome::default()
    }

    /// Adds a new unfrozen gene to the genome.
    /// Returns a reference to the new gene.
    ///
    /// # Panics
    ///
    /// This function panics if the genome already has a gene
    /// with the same innovation number or the same endpoints.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    ///
    /// let mut genome = Genome::new();
    ///
    /// let inserted_gene = genome.add_gene(42, 3, 4, 2.5).clone();
    ///
    /// assert_eq!(genome.len(), 1);
    /// assert_eq!(inserted_gene.innovation(), 42);
    /// assert_eq!(inserted_gene.input(), 3);
    /// assert_eq!(inserted_gene.output(), 4);
    /// assert_eq!(inserted_gene.weight(), 2.5);
    ///
    /// // Genes are kept sorted by innovation number.
    /// genome.add_gene(7, 4, 3, -3.0);
    /// genome.add_gene(45, 4, 4, -1.0);
    /// let ids: Vec<_> = genome.genes().map(|g| g.innovation()).collect();
    /// assert_eq!(ids, [7, 42, 45]);
    /// ```
    pub fn add_gene(
        &mut self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
        weight: f32,
    ) -> &mut Gene {
        match self.insert_gene(Gene::new(gene_id, input_id, output_id, weight)) {
            Ok(position) => &mut self.genes[position],
            Err(e) => panic!("{} in {}", e, self),
        }
    }

    /// Inserts a gene at its sorted position, returning
    /// that position.
    ///
    /// # Errors
    ///
    /// Returns an error if the gene's innovation number or
    /// endpoints are already present in the genome.
    pub(crate) fn insert_gene(&mut self, gene: Gene) -> Result<usize, GeneViabilityError> {
        let position = self.position_of(gene.innovation());
        if self
            .genes
            .get(position)
            .map_or(false, |g| g.innovation() == gene.innovation())
        {
            return Err(GeneViabilityError::DuplicateGeneID(gene.innovation()));
        }
        if self.contains_connection(gene.input(), gene.output()) {
            return Err(GeneViabilityError::DuplicateGeneWithEndpoints(
                gene.input(),
                gene.output(),
            ));
        }
        self.genes.insert(position, gene);
        Ok(position)
    }

    fn position_of(&self, gene_id: Innovation) -> usize {
        self.genes.partition_point(|g| g.innovation() < gene_id)
    }

    /// Returns an iterator over the genome's genes,
    /// in increasing innovation number order.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(3, 0, 2, 1.0);
    /// genome.add_gene(1, 1, 2, 1.0);
    ///
    /// for gene in genome.genes() {
    ///     println!("gene: {}", gene);
    /// }
    /// ```
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.iter()
    }

    /// Returns a mutable iterator over the genome's genes,
    /// in increasing innovation number order.
    pub fn genes_mut(&mut self) -> impl Iterator<Item = &mut Gene> {
        self.genes.iter_mut()
    }

    pub(crate) fn gene_slice(&self) -> &[Gene] {
        &self.genes
    }

    /// Returns the gene with the passed innovation number, if present.
    pub fn gene(&self, gene_id: Innovation) -> Option<&Gene> {
        self.genes
            .get(self.position_of(gene_id))
            .filter(|g| g.innovation() == gene_id)
    }

    /// Returns the gene with the passed innovation number
    /// mutably, if present.
    pub fn gene_mut(&mut self, gene_id: Innovation) -> Option<&mut Gene> {
        let position = self.position_of(gene_id);
        self.genes
            .get_mut(position)
            .filter(|g| g.innovation() == gene_id)
    }

    /// Returns whether the genome has a gene
    /// with the passed innovation number.
    pub fn contains_gene(&self, gene_id: Innovation) -> bool {
        self.gene(gene_id).is_some()
    }

    /// Returns whether the genome has a gene, frozen or not,
    /// going from `input` to `output`.
    pub fn contains_connection(&self, input: Innovation, output: Innovation) -> bool {
        self.genes.iter().any(|g| g.endpoints() == (input, output))
    }

    /// Returns the number of genes in the genome.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if the genome has no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Returns the innovation numbers of every node touched
    /// by the genome's genes, sorted and without repetition.
    /// If `exclude_frozen` is `true`, only unfrozen genes
    /// are considered.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(0, 0, 3, 1.0);
    /// genome.add_gene(1, 1, 3, 1.0).set_frozen(true);
    ///
    /// assert_eq!(genome.node_ids(false), [0, 1, 3]);
    /// assert_eq!(genome.node_ids(true), [0, 3]);
    /// ```
    pub fn node_ids(&self, exclude_frozen: bool) -> Vec<Innovation> {
        let mut ids: Vec<Innovation> = self
            .genes
            .iter()
            .filter(|g| !(exclude_frozen && g.frozen()))
            .flat_map(|g| [g.input(), g.output()])
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Checks that every gene lies on a path from an input node
    /// (a sensor or bias) to an output node: its output must lead
    /// forward to some output node, and its input must be reachable
    /// backward from some input node.
    ///
    /// Every gene is checked. If `exclude_frozen` is `true`,
    /// frozen genes are not used as part of any path.
    ///
    /// # Panics
    ///
    /// Panics if a gene refers to a node missing from `nodes`.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, Genome, NodeRegistry, NodeType};
    ///
    /// let mut nodes = NodeRegistry::new();
    /// let sensor = nodes.register(NodeType::Sensor, ActivationType::Identity);
    /// let hidden = nodes.register(NodeType::Hidden, ActivationType::Sigmoid);
    /// let output = nodes.register(NodeType::Output, ActivationType::Sigmoid);
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(0, sensor, hidden, 1.0);
    /// genome.add_gene(1, hidden, output, 1.0);
    /// assert!(genome.validate(&nodes, true));
    ///
    /// // Freezing the only way out of the hidden node strands the first gene.
    /// genome.gene_mut(1).unwrap().set_frozen(true);
    /// assert!(!genome.validate(&nodes, true));
    /// assert!(genome.validate(&nodes, false));
    /// ```
    pub fn validate(&self, nodes: &NodeRegistry, exclude_frozen: bool) -> bool {
        let mut forward: HashMap<Innovation, Vec<Innovation>, RandomState> = HashMap::default();
        let mut backward: HashMap<Innovation, Vec<Innovation>, RandomState> = HashMap::default();
        for gene in self
            .genes
            .iter()
            .filter(|g| !(exclude_frozen && g.frozen()))
        {
            forward.entry(gene.input()).or_default().push(gene.output());
            backward.entry(gene.output()).or_default().push(gene.input());
        }

        // Nodes from which an output can be reached, found by walking
        // back from every output node; and nodes reachable from some
        // input node, found by walking forward from every input node.
        let endpoints = || self.genes.iter().flat_map(|g| [g.input(), g.output()]);
        let leads_to_output = reachable(
            endpoints().filter(|&id| nodes[id].node_type() == NodeType::Output),
            &backward,
        );
        let fed_by_input = reachable(
            endpoints().filter(|&id| nodes[id].is_input()),
            &forward,
        );

        self.genes
            .iter()
            .all(|g| leads_to_output.contains(&g.output()) && fed_by_input.contains(&g.input()))
    }

    /// Sets the genome's fitness to the value passed.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    ///
    /// let mut genome = Genome::new();
    ///
    /// assert_eq!(genome.fitness(), 0.0);
    ///
    /// genome.set_fitness(32.0);
    ///
    /// assert_eq!(genome.fitness(), 32.0);
    /// ```
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the genome's current fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// Returns the genome's fitness after being shared
    /// with the rest of its species, as last computed
    /// by [`Species::adjust_fitness`].
    ///
    /// [`Species::adjust_fitness`]: crate::populations::Species::adjust_fitness
    pub fn adjusted_fitness(&self) -> f32 {
        self.adjusted_fitness
    }

    pub(crate) fn set_adjusted_fitness(&mut self, adjusted_fitness: f32) {
        self.adjusted_fitness = adjusted_fitness;
    }

    /// Clears both fitness values, as for a newborn genome.
    pub(crate) fn reset_fitness(&mut self) {
        self.fitness = 0.0;
        self.adjusted_fitness = 0.0;
    }
}

// Every node reachable from `starts` following `edges`,
// the starting nodes included.
fn reachable(
    starts: impl Iterator<Item = Innovation>,
    edges: &HashMap<Innovation, Vec<Innovation>, RandomState>,
) -> HashSet<Innovation, RandomState> {
    let mut stack: Vec<Innovation> = starts.collect();
    let mut visited: HashSet<Innovation, RandomState> = stack.iter().copied().collect();
    while let Some(node) = stack.pop() {
        for &next in edges.get(&node).into_iter().flatten() {
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }
    visited
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genome {{ genes: [")?;
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", gene)?;
        }
        write!(f, "], fitness: {} }}", self.fitness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(types: &[NodeType]) -> NodeRegistry {
        let mut nodes = NodeRegistry::new();
        for node_type in types {
            nodes.register(*node_type, ActivationType::Sigmoid);
        }
        nodes
    }

    #[test]
    fn add_gene_keeps_order() {
        let mut genome = Genome::new();
        for (id, input) in [(5, 0), (1, 1), (3, 2), (0, 3)] {
            genome.add_gene(id, input, 9, 0.0);
        }
        let ids: Vec<_> = genome.genes().map(|g| g.innovation()).collect();
        assert_eq!(ids, [0, 1, 3, 5]);

        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    #[should_panic]
    fn add_gene_duplicate_gene_innovation() {
        let mut genome = Genome::new();
        genome.add_gene(0, 0, 1, 0.0);
        genome.add_gene(0, 1, 2, 0.0);
    }

    #[test]
    #[should_panic]
    fn add_gene_duplicate_io() {
        let mut genome = Genome::new();
        genome.add_gene(0, 0, 1, 0.0);
        genome.add_gene(1, 0, 1, 0.0);
    }

    #[test]
    fn insert_gene_reports_duplicates() {
        let mut genome = Genome::new();
        genome.add_gene(4, 0, 1, 0.0);
        assert!(matches!(
            genome.insert_gene(Gene::new(4, 2, 1, 0.0)),
            Err(GeneViabilityError::DuplicateGeneID(4))
        ));
        assert!(matches!(
            genome.insert_gene(Gene::new(5, 0, 1, 0.0)),
            Err(GeneViabilityError::DuplicateGeneWithEndpoints(0, 1))
        ));
        assert_eq!(genome.len(), 1);
    }

    #[test]
    fn gene_lookup() {
        let mut genome = Genome::new();
        genome.add_gene(2, 0, 1, 0.5);
        genome.add_gene(8, 1, 1, 0.5);
        assert!(genome.contains_gene(8));
        assert!(!genome.contains_gene(5));
        assert!(genome.contains_connection(1, 1));
        assert!(!genome.contains_connection(1, 0));
        genome.gene_mut(2).unwrap().set_weight(-1.0);
        assert_eq!(genome.gene(2).unwrap().weight(), -1.0);
        assert!(genome.gene_mut(3).is_none());
    }

    #[test]
    fn validate_disconnected_by_frozen_gene() {
        use NodeType::*;
        // 0: sensor, 1: sensor, 2: hidden, 3: output
        let nodes = registry(&[Sensor, Sensor, Hidden, Output]);
        let mut genome = Genome::new();
        genome.add_gene(0, 0, 2, 1.0);
        genome.add_gene(1, 2, 3, 1.0).set_frozen(true);
        genome.add_gene(2, 1, 3, 1.0);

        assert!(!genome.validate(&nodes, true));
        assert!(genome.validate(&nodes, false));
    }

    #[test]
    fn validate_checks_stranded_frozen_genes() {
        use NodeType::*;
        // 0: sensor, 1: hidden, 2: output
        let nodes = registry(&[Sensor, Hidden, Output]);
        let mut genome = Genome::new();
        genome.add_gene(0, 0, 2, 1.0);
        genome.add_gene(1, 0, 1, 1.0).set_frozen(true);
        genome.add_gene(2, 1, 2, 1.0).set_frozen(true);

        // The live gene is fine, but no live path runs through the hidden node.
        assert!(!genome.validate(&nodes, true));
        assert!(genome.validate(&nodes, false));

        // A frozen split gene is covered by its endpoints alone.
        genome.gene_mut(1).unwrap().set_frozen(false);
        genome.gene_mut(2).unwrap().set_frozen(false);
        genome.gene_mut(0).unwrap().set_frozen(true);
        assert!(genome.validate(&nodes, true));
    }

    #[test]
    fn validate_with_cycles() {
        use NodeType::*;
        // 0: bias, 1: hidden, 2: hidden, 3: output
        let nodes = registry(&[Bias, Hidden, Hidden, Output]);
        let mut genome = Genome::new();
        genome.add_gene(0, 0, 1, 1.0);
        genome.add_gene(1, 1, 2, 1.0);
        genome.add_gene(2, 2, 1, 1.0);
        genome.add_gene(3, 2, 2, 1.0);
        genome.add_gene(4, 2, 3, 1.0);
        assert!(genome.validate(&nodes, true));

        // A cycle with no way out never terminates the walk
        // toward an output, and fails validation.
        genome.gene_mut(4).unwrap().set_frozen(true);
        assert!(!genome.validate(&nodes, true));
    }

    #[test]
    fn validate_requires_input_source() {
        use NodeType::*;
        let nodes = registry(&[Sensor, Hidden, Output]);
        let mut genome = Genome::new();
        genome.add_gene(0, 1, 2, 1.0);
        assert!(!genome.validate(&nodes, true));
        genome.add_gene(1, 0, 1, 1.0);
        assert!(genome.validate(&nodes, true));
    }

    #[test]
    fn empty_genome_is_valid() {
        assert!(Genome::new().validate(&NodeRegistry::new(), true));
    }

    #[test]
    fn display() {
        let mut genome = Genome::new();
        genome.add_gene(1, 0, 2, 0.25).set_frozen(true);
        genome.add_gene(0, 1, 2, 1.0);
        genome.set_fitness(2.0);
        assert_eq!(
            genome.to_string(),
            "Genome { genes: [0[1->2, 1.000], (1[0->2, 0.250])], fitness: 2 }"
        );
    }
}
