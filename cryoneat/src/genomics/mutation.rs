use crate::genomics::{
    FreezeMutationError, Gene, GeneAdditionMutationError, GeneticConfig, Genome, History,
    InnovationKey, InnovationRecord, MutationError, MutationStyle, NodeAdditionMutationError,
    NodeRegistry, NodeType,
};
use crate::Innovation;

use rand::seq::SliceRandom;
use rand::Rng;

impl Genome {
    /// Applies one mutation to the genome, of a style chosen
    /// at random following the configured [mutation weights].
    /// Mutations that cannot be carried out are skipped.
    ///
    /// # Panics
    ///
    /// Panics if every mutation weight is zero, which
    /// [`GeneticConfig::validate`] rules out.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, GeneticConfig, Genome, History, NodeType};
    /// use rand::SeedableRng;
    ///
    /// let mut history = History::new();
    /// let sensor = history.nodes_mut().register(NodeType::Sensor, ActivationType::Identity);
    /// let output = history.nodes_mut().register(NodeType::Output, ActivationType::Sigmoid);
    /// let connection = history.connections_mut().register(sensor, output);
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(connection, sensor, output, 1.0);
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// for _ in 0..100 {
    ///     genome.mutate(&mut history, &GeneticConfig::default(), &mut rng);
    /// }
    ///
    /// // Mutations never remove genes.
    /// assert!(genome.len() >= 1);
    /// ```
    ///
    /// [mutation weights]: GeneticConfig::mutation_weights
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        let style = config
            .mutation_weights
            .choose(rng)
            .expect("mutation weights are all zero");
        if let Err(e) = self.mutate_with_style(style, history, config, rng) {
            log::trace!("skipped {:?} mutation: {}", style, e);
        }
    }

    /// Applies a mutation of the specified style to the genome.
    ///
    /// # Errors
    ///
    /// Returns an error if a structural mutation found no place to
    /// happen. Failed non-structural mutations are not reported,
    /// as each of them is only attempted by chance.
    pub fn mutate_with_style<R: Rng + ?Sized>(
        &mut self,
        style: MutationStyle,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(), MutationError> {
        match style {
            MutationStyle::AddNode => {
                self.mutate_add_node(history, config, rng)?;
            }
            MutationStyle::AddConnection => {
                self.mutate_add_connection(history, config, rng)?;
            }
            MutationStyle::TryAllNonStructural => {
                self.mutate_non_structural(history.nodes(), config, rng);
            }
        }
        Ok(())
    }

    /// Induces a _node mutation_ in the genome: a random unfrozen
    /// gene not coming out of a bias node is frozen, and a new node
    /// is placed between its endpoints. The gene into the new node
    /// has weight 1, and the gene out of it keeps the split gene's
    /// weight.
    ///
    /// Identical node mutations within a generation (splitting the
    /// same connection with the same activation type) receive the
    /// same innovation numbers.
    ///
    /// Returns the innovation numbers of the gene into the
    /// new node, the new node, and the gene out of it.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no gene to split.
    ///
    /// # Panics
    ///
    /// Panics if every activation weight is zero, which
    /// [`GeneticConfig::validate`] rules out.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, GeneticConfig, Genome, History, NodeType};
    ///
    /// let mut history = History::new();
    /// let sensor = history.nodes_mut().register(NodeType::Sensor, ActivationType::Identity);
    /// let output = history.nodes_mut().register(NodeType::Output, ActivationType::Sigmoid);
    /// let connection = history.connections_mut().register(sensor, output);
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(connection, sensor, output, -2.0);
    ///
    /// let config = GeneticConfig::default();
    /// let (into, node, out_of) = genome
    ///     .mutate_add_node(&mut history, &config, &mut rand::thread_rng())
    ///     .unwrap();
    ///
    /// assert!(genome.gene(connection).unwrap().frozen());
    /// assert_eq!(genome.gene(into).unwrap().endpoints(), (sensor, node));
    /// assert_eq!(genome.gene(into).unwrap().weight(), 1.0);
    /// assert_eq!(genome.gene(out_of).unwrap().endpoints(), (node, output));
    /// assert_eq!(genome.gene(out_of).unwrap().weight(), -2.0);
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(Innovation, Innovation, Innovation), NodeAdditionMutationError> {
        let splittable: Vec<usize> = self
            .gene_slice()
            .iter()
            .enumerate()
            .filter(|(_, g)| {
                !g.frozen() && history.nodes()[g.input()].node_type() != NodeType::Bias
            })
            .map(|(i, _)| i)
            .collect();
        let position = *splittable
            .choose(rng)
            .ok_or(NodeAdditionMutationError::NoSplittableGene)?;

        let split = &mut self.genes[position];
        split.set_frozen(true);
        let (split_id, (input, output), weight) =
            (split.innovation(), split.endpoints(), split.weight());

        let activation_type = config
            .activation_weights
            .choose(rng)
            .expect("activation weights are all zero");
        let key = InnovationKey::NodeAddition {
            split_connection: split_id,
            activation_type,
        };

        let record = match history.find_innovation(&key) {
            Some(
                record @ InnovationRecord::NodeAddition {
                    input_connection,
                    output_connection,
                    ..
                },
            ) if !self.contains_gene(input_connection) && !self.contains_gene(output_connection) => {
                record
            }
            Some(_) => {
                log::trace!(
                    "genome repeated split of connection {}; registering a fresh node",
                    split_id
                );
                history.register_split(split_id, activation_type)
            }
            None => {
                let record = history.register_split(split_id, activation_type);
                history.record_innovation(record);
                record
            }
        };

        match record {
            InnovationRecord::NodeAddition {
                new_node,
                input_connection,
                output_connection,
                ..
            } => {
                self.genes_from_split(
                    input,
                    output,
                    weight,
                    new_node,
                    input_connection,
                    output_connection,
                );
                Ok((input_connection, new_node, output_connection))
            }
            InnovationRecord::ConnectionAddition { .. } => {
                unreachable!("node addition key matched a connection addition record")
            }
        }
    }

    fn genes_from_split(
        &mut self,
        input: Innovation,
        output: Innovation,
        weight: f32,
        new_node: Innovation,
        input_connection: Innovation,
        output_connection: Innovation,
    ) {
        for gene in [
            Gene::new(input_connection, input, new_node, 1.0),
            Gene::new(output_connection, new_node, output, weight),
        ] {
            if let Err(e) = self.insert_gene(gene) {
                unreachable!("split produced an existing gene: {}", e);
            }
        }
    }

    /// Induces a _gene mutation_ in the genome: a new gene with a
    /// weight in `[-1, 1)` is added between a node touched by an
    /// unfrozen gene and a non-input node touched by an unfrozen
    /// gene, which were not previously connected.
    ///
    /// Returns the innovation number of the new gene.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no candidate nodes, or if
    /// [too many] sampled pairs were already connected.
    ///
    /// [too many]: GeneticConfig::max_gene_addition_mutation_attempts
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, GeneticConfig, Genome, History, NodeType};
    ///
    /// let mut history = History::new();
    /// let sensor = history.nodes_mut().register(NodeType::Sensor, ActivationType::Identity);
    /// let output = history.nodes_mut().register(NodeType::Output, ActivationType::Sigmoid);
    /// let connection = history.connections_mut().register(sensor, output);
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(connection, sensor, output, 1.0);
    ///
    /// let config = GeneticConfig {
    ///     max_gene_addition_mutation_attempts: 1000,
    ///     ..GeneticConfig::default()
    /// };
    ///
    /// // The only connection left is the output's loop onto itself.
    /// let id = genome
    ///     .mutate_add_connection(&mut history, &config, &mut rand::thread_rng())
    ///     .unwrap();
    /// assert_eq!(genome.gene(id).unwrap().endpoints(), (output, output));
    ///
    /// // After which there is nothing left to connect.
    /// assert!(genome
    ///     .mutate_add_connection(&mut history, &config, &mut rand::thread_rng())
    ///     .is_err());
    /// ```
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, GeneAdditionMutationError> {
        let sources = self.node_ids(true);
        let targets: Vec<Innovation> = sources
            .iter()
            .copied()
            .filter(|&id| !history.nodes()[id].is_input())
            .collect();
        if targets.is_empty() {
            return Err(GeneAdditionMutationError::NoCandidateNodes);
        }

        let attempts = config.max_gene_addition_mutation_attempts;
        let (input, output) = (0..attempts)
            .filter_map(|_| {
                let input = *sources.choose(rng)?;
                let output = *targets.choose(rng)?;
                Some((input, output))
            })
            .find(|&(input, output)| !self.contains_connection(input, output))
            .ok_or(GeneAdditionMutationError::AttemptsExhausted(attempts))?;

        let weight = rng.gen::<f32>() * 2.0 - 1.0;
        let key = InnovationKey::ConnectionAddition { input, output };
        let connection = match history.find_innovation(&key) {
            Some(InnovationRecord::ConnectionAddition { connection, .. }) => connection,
            _ => {
                let connection = history.connections_mut().register(input, output);
                history.record_innovation(InnovationRecord::ConnectionAddition {
                    input,
                    output,
                    connection,
                });
                connection
            }
        };

        if let Err(e) = self.insert_gene(Gene::new(connection, input, output, weight)) {
            unreachable!("connection mutation produced an existing gene: {}", e);
        }
        Ok(connection)
    }

    /// Tries every non-structural mutation, each with its configured
    /// chance: weight perturbation of all unfrozen genes, toggling the
    /// freeze status of a random gene, and unfreezing a random frozen
    /// gene.
    pub fn mutate_non_structural<R: Rng + ?Sized>(
        &mut self,
        nodes: &NodeRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        if rng.gen::<f32>() < config.weight_mutation_chance {
            self.mutate_weights(config, rng);
        }
        if rng.gen::<f32>() < config.toggle_freeze_chance {
            if let Err(e) = self.mutate_toggle_freeze(nodes, rng) {
                log::trace!("{}", e);
            }
        }
        if rng.gen::<f32>() < config.unfreeze_chance {
            if let Err(e) = self.mutate_unfreeze(nodes, rng) {
                log::trace!("{}", e);
            }
        }
    }

    /// Perturbs the weight of every unfrozen gene,
    /// as described in [`Gene::perturb_weight`].
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for gene in self.genes.iter_mut().filter(|g| !g.frozen()) {
            gene.perturb_weight(config.weight_bound, rng);
        }
    }

    /// Toggles the freeze status of a random gene. The change is
    /// reverted if the genome stops being
    /// [valid](Genome::validate) through its unfrozen genes.
    ///
    /// Returns the innovation number of the toggled gene.
    ///
    /// # Errors
    ///
    /// Returns an error if the genome is empty or
    /// the change was reverted.
    pub fn mutate_toggle_freeze<R: Rng + ?Sized>(
        &mut self,
        nodes: &NodeRegistry,
        rng: &mut R,
    ) -> Result<Innovation, FreezeMutationError> {
        if self.genes.is_empty() {
            return Err(FreezeMutationError::NoEligibleGene);
        }
        let position = rng.gen_range(0..self.genes.len());
        let frozen = self.genes[position].frozen();
        self.set_frozen_or_revert(position, !frozen, nodes)
    }

    /// Unfreezes a random frozen gene. The change is reverted
    /// if the genome stops being [valid](Genome::validate)
    /// through its unfrozen genes.
    ///
    /// Returns the innovation number of the unfrozen gene.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no frozen genes
    /// or the change was reverted.
    pub fn mutate_unfreeze<R: Rng + ?Sized>(
        &mut self,
        nodes: &NodeRegistry,
        rng: &mut R,
    ) -> Result<Innovation, FreezeMutationError> {
        let frozen: Vec<usize> = (0..self.genes.len())
            .filter(|&i| self.genes[i].frozen())
            .collect();
        let position = *frozen
            .choose(rng)
            .ok_or(FreezeMutationError::NoEligibleGene)?;
        self.set_frozen_or_revert(position, false, nodes)
    }

    fn set_frozen_or_revert(
        &mut self,
        position: usize,
        frozen: bool,
        nodes: &NodeRegistry,
    ) -> Result<Innovation, FreezeMutationError> {
        let gene = &mut self.genes[position];
        let (id, previous) = (gene.innovation(), gene.frozen());
        gene.set_frozen(frozen);
        if self.validate(nodes, true) {
            Ok(id)
        } else {
            self.genes[position].set_frozen(previous);
            Err(FreezeMutationError::Reverted(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, ActivationWeights};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // Sensors 0 and 1, bias 2, output 3, fully connected.
    fn seeded() -> (History, Genome) {
        let mut history = History::new();
        let mut genome = Genome::new();
        for node_type in [NodeType::Sensor, NodeType::Sensor, NodeType::Bias] {
            history.nodes_mut().register(node_type, ActivationType::Identity);
        }
        let output = history
            .nodes_mut()
            .register(NodeType::Output, ActivationType::Sigmoid);
        for input in 0..3 {
            let id = history.connections_mut().register(input, output);
            genome.add_gene(id, input, output, 0.5);
        }
        (history, genome)
    }

    #[test]
    fn mutate_nodes_addition() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (mut history, mut genome) = seeded();
        let config = GeneticConfig::default();

        let (into, node, out_of) = genome
            .mutate_add_node(&mut history, &config, &mut rng)
            .unwrap();

        assert_eq!(genome.len(), 5);
        assert_eq!(history.nodes()[node].node_type(), NodeType::Hidden);
        assert_eq!(
            history.nodes()[node].activation_type(),
            ActivationType::SteepenedSigmoid
        );
        let split_input = genome.gene(into).unwrap().input();
        assert_ne!(history.nodes()[split_input].node_type(), NodeType::Bias);
        let split = history.connections().find(split_input, 3).unwrap();
        assert!(genome.gene(split).unwrap().frozen());
        assert!(!genome.gene(into).unwrap().frozen());
        assert!(!genome.gene(out_of).unwrap().frozen());
        assert_eq!(history.generational().len(), 1);
        assert!(genome.validate(history.nodes(), true));
    }

    #[test]
    fn same_split_same_generation_same_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let (mut history, genome) = seeded();
        let config = GeneticConfig::default();

        // With a single splittable gene, both genomes split the same one.
        let mut first = genome.clone();
        let mut second = genome;
        for g in [&mut first, &mut second] {
            g.gene_mut(1).unwrap().set_frozen(true);
        }

        let a = first.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        let b = second.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        assert_eq!(a, b);
        assert_eq!(history.generational().len(), 1);

        // The next generation allocates new numbers.
        history.end_generation();
        let mut third = seeded().1;
        third.gene_mut(1).unwrap().set_frozen(true);
        let c = third.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn different_activation_different_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let (mut history, mut genome) = seeded();
        genome.gene_mut(1).unwrap().set_frozen(true);
        let mut other = genome.clone();

        let mut config = GeneticConfig::default();
        let (_, sigmoid_node, _) = genome
            .mutate_add_node(&mut history, &config, &mut rng)
            .unwrap();
        config.activation_weights = ActivationWeights {
            sigmoid: 0,
            steepened_sigmoid: 0,
            relu: 1,
            identity: 0,
        };
        let (_, relu_node, _) = other
            .mutate_add_node(&mut history, &config, &mut rng)
            .unwrap();
        assert_ne!(sigmoid_node, relu_node);
        assert_eq!(history.generational().len(), 2);
    }

    #[test]
    fn repeated_split_in_same_genome_gets_fresh_node() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let (mut history, genome) = seeded();
        let config = GeneticConfig::default();

        let mut genome = genome;
        genome.gene_mut(1).unwrap().set_frozen(true);
        let before = genome.clone();
        let (_, first_node, _) = genome
            .mutate_add_node(&mut history, &config, &mut rng)
            .unwrap();

        // Unfreeze the split gene and freeze the new ones so
        // the same connection is split again.
        let split = before
            .genes()
            .find(|g| !g.frozen() && g.input() != 2)
            .unwrap()
            .innovation();
        let new_ids: Vec<_> = genome
            .genes()
            .map(|g| g.innovation())
            .filter(|id| !before.contains_gene(*id))
            .collect();
        genome.gene_mut(split).unwrap().set_frozen(false);
        for id in new_ids {
            genome.gene_mut(id).unwrap().set_frozen(true);
        }

        let (_, second_node, _) = genome
            .mutate_add_node(&mut history, &config, &mut rng)
            .unwrap();
        assert_ne!(first_node, second_node);
        assert_eq!(genome.len(), 7);
    }

    #[test]
    fn mutate_node_addition_no_gene_found() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (mut history, mut genome) = seeded();
        let config = GeneticConfig::default();
        genome.gene_mut(0).unwrap().set_frozen(true);
        genome.gene_mut(1).unwrap().set_frozen(true);

        // Only the bias gene is left unfrozen.
        assert!(matches!(
            genome.mutate_add_node(&mut history, &config, &mut rng),
            Err(NodeAdditionMutationError::NoSplittableGene)
        ));
        assert!(history.generational().is_empty());
    }

    #[test]
    fn mutate_gene_addition() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (mut history, mut genome) = seeded();
        let config = GeneticConfig {
            max_gene_addition_mutation_attempts: 1000,
            ..GeneticConfig::default()
        };

        let id = genome
            .mutate_add_connection(&mut history, &config, &mut rng)
            .unwrap();
        let gene = genome.gene(id).unwrap();
        assert_eq!(gene.endpoints(), (3, 3));
        assert!((-1.0..1.0).contains(&gene.weight()));
        assert_eq!(history.generational().len(), 1);

        // Another genome discovering the same connection shares its number.
        let mut other = seeded().1;
        assert_eq!(
            other
                .mutate_add_connection(&mut history, &config, &mut rng)
                .unwrap(),
            id
        );
        assert_eq!(history.generational().len(), 1);
    }

    #[test]
    fn mutate_gene_addition_no_pairs_found() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (mut history, mut genome) = seeded();
        let config = GeneticConfig::default();

        let self_loop = history.connections_mut().register(3, 3);
        genome.add_gene(self_loop, 3, 3, 0.0);
        assert!(matches!(
            genome.mutate_add_connection(&mut history, &config, &mut rng),
            Err(GeneAdditionMutationError::AttemptsExhausted(20))
        ));

        assert!(matches!(
            Genome::new().mutate_add_connection(&mut history, &config, &mut rng),
            Err(GeneAdditionMutationError::NoCandidateNodes)
        ));
    }

    #[test]
    fn mutate_weights_skips_frozen() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let (_, mut genome) = seeded();
        let config = GeneticConfig::default();
        genome.gene_mut(0).unwrap().set_frozen(true);
        for _ in 0..50 {
            genome.mutate_weights(&config, &mut rng);
        }
        assert_eq!(genome.gene(0).unwrap().weight(), 0.5);
        assert!(genome.genes().all(|g| g.weight().abs() <= config.weight_bound));
    }

    #[test]
    fn freeze_toggle_reverted_when_invalidating() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut history = History::new();
        let sensor = history
            .nodes_mut()
            .register(NodeType::Sensor, ActivationType::Identity);
        let hidden = history
            .nodes_mut()
            .register(NodeType::Hidden, ActivationType::Sigmoid);
        let output = history
            .nodes_mut()
            .register(NodeType::Output, ActivationType::Sigmoid);
        let mut genome = Genome::new();
        genome.add_gene(0, sensor, hidden, 1.0);
        genome.add_gene(1, hidden, output, 1.0);

        // Freezing either gene strands the other one.
        for _ in 0..20 {
            assert!(matches!(
                genome.mutate_toggle_freeze(history.nodes(), &mut rng),
                Err(FreezeMutationError::Reverted(_))
            ));
            assert!(genome.genes().all(|g| !g.frozen()));
        }
    }

    #[test]
    fn freeze_toggle_keeps_frozen_genes_reachable() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut history = History::new();
        let sensor = history
            .nodes_mut()
            .register(NodeType::Sensor, ActivationType::Identity);
        let hidden = history
            .nodes_mut()
            .register(NodeType::Hidden, ActivationType::Sigmoid);
        let output = history
            .nodes_mut()
            .register(NodeType::Output, ActivationType::Sigmoid);
        let mut seed = Genome::new();
        seed.add_gene(0, sensor, output, 1.0);
        seed.add_gene(1, sensor, hidden, 1.0);
        seed.add_gene(2, hidden, output, 1.0).set_frozen(true);

        // Only unfreezing the second half of the split is allowed.
        for _ in 0..30 {
            let mut genome = seed.clone();
            match genome.mutate_toggle_freeze(history.nodes(), &mut rng) {
                Ok(id) => assert_eq!(id, 2),
                Err(FreezeMutationError::Reverted(id)) => assert_ne!(id, 2),
                Err(e) => panic!("unexpected error: {}", e),
            }
            assert!(!genome.gene(1).unwrap().frozen());
        }
    }

    #[test]
    fn unfreeze() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let (history, mut genome) = seeded();
        assert!(matches!(
            genome.mutate_unfreeze(history.nodes(), &mut rng),
            Err(FreezeMutationError::NoEligibleGene)
        ));
        genome.gene_mut(2).unwrap().set_frozen(true);
        assert_eq!(genome.mutate_unfreeze(history.nodes(), &mut rng).unwrap(), 2);
        assert!(genome.genes().all(|g| !g.frozen()));
    }

    #[test]
    fn mutate_never_breaks_gene_uniqueness() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let (mut history, mut genome) = seeded();
        let config = GeneticConfig {
            mutation_weights: crate::genomics::MutationWeights {
                add_node: 1,
                add_connection: 1,
                try_all_non_structural: 1,
            },
            ..GeneticConfig::default()
        };
        for _ in 0..300 {
            genome.mutate(&mut history, &config, &mut rng);
        }
        let mut pairs: Vec<_> = genome.genes().map(|g| g.endpoints()).collect();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), genome.len());
        assert!(genome
            .genes()
            .zip(genome.genes().skip(1))
            .all(|(a, b)| a.innovation() < b.innovation()));
    }
}
