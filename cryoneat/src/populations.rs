//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;
mod species;

use crate::genomics::{ActivationType, GeneticConfig, Genome, History, InnovationRecord, NodeType};
use crate::networks::Network;
use crate::Innovation;
pub use config::PopulationConfig;
pub use errors::*;
pub use species::{Species, SpeciesID};

use ahash::RandomState;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;

/// A population of genomes, along with the
/// innovation history shared by all of them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    species: Vec<Species>,
    history: History,
    generation: usize,
    generation_of_last_improvement: usize,
    champion: Option<Genome>,
    generation_champion: Option<Genome>,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population from a seed topology.
    ///
    /// `nodes` lists the role and activation type of every
    /// initial node; a node's position in the list is its ID.
    /// `connections` lists the `(input, output, weight)` of every
    /// initial connection. The first genome of the population
    /// carries exactly the seed connections, and every other genome
    /// is a copy of it that underwent [non-structural mutation].
    ///
    /// # Errors
    ///
    /// Returns an error if either configuration is invalid, if
    /// there are no nodes, or if a connection refers to an undefined
    /// node or repeats an earlier connection's endpoints.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, GeneticConfig, NodeType};
    /// use cryoneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    ///
    /// let nodes = [
    ///     (NodeType::Sensor, ActivationType::Identity),
    ///     (NodeType::Bias, ActivationType::Identity),
    ///     (NodeType::Output, ActivationType::Sigmoid),
    /// ];
    /// let connections = [(0, 2, 0.0), (1, 2, 0.0)];
    ///
    /// let population_config = PopulationConfig {
    ///     size: std::num::NonZeroUsize::new(20).unwrap(),
    ///     ..PopulationConfig::default()
    /// };
    /// let population = Population::new(
    ///     &nodes,
    ///     &connections,
    ///     population_config,
    ///     GeneticConfig::default(),
    ///     &mut rand::rngs::StdRng::seed_from_u64(0),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(population.size(), 20);
    /// assert_eq!(population.history().nodes().len(), 3);
    ///
    /// assert!(Population::new(
    ///     &nodes,
    ///     &[(0, 3, 1.0)],
    ///     PopulationConfig::default(),
    ///     GeneticConfig::default(),
    ///     &mut rand::rngs::StdRng::seed_from_u64(0),
    /// )
    /// .is_err());
    /// ```
    ///
    /// [non-structural mutation]: Genome::mutate_non_structural
    pub fn new<R: Rng + ?Sized>(
        nodes: &[(NodeType, ActivationType)],
        connections: &[(Innovation, Innovation, f32)],
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        rng: &mut R,
    ) -> Result<Population, PopulationError> {
        genetic_config.validate()?;
        population_config.validate()?;
        if nodes.is_empty() {
            return Err(PopulationError::NoNodes);
        }

        let mut seen: HashSet<(Innovation, Innovation), RandomState> = HashSet::default();
        for &(input, output, _) in connections {
            if input >= nodes.len() || output >= nodes.len() {
                return Err(PopulationError::UndefinedNode {
                    input,
                    output,
                    largest: nodes.len() - 1,
                });
            }
            if !seen.insert((input, output)) {
                return Err(PopulationError::DuplicateConnection { input, output });
            }
        }

        let mut history = History::new();
        for &(node_type, activation_type) in nodes {
            history.nodes_mut().register(node_type, activation_type);
        }
        let mut adam = Genome::new();
        for &(input, output, weight) in connections {
            let connection = history.connections_mut().register(input, output);
            history.record_innovation(InnovationRecord::ConnectionAddition {
                input,
                output,
                connection,
            });
            adam.add_gene(connection, input, output, weight);
        }

        let mut genomes = Vec::with_capacity(population_config.size.get());
        for _ in 1..population_config.size.get() {
            let mut genome = adam.clone();
            genome.mutate_non_structural(history.nodes(), &genetic_config, rng);
            genomes.push(genome);
        }
        genomes.insert(0, adam);

        let mut population = Population {
            species: vec![],
            history,
            generation: 0,
            generation_of_last_improvement: 0,
            champion: None,
            generation_champion: None,
            population_config,
            genetic_config,
        };
        population.speciate(genomes, 0);
        log::debug!(
            "seeded population of {} with {} nodes, {} connections and {} species",
            population.size(),
            nodes.len(),
            connections.len(),
            population.species.len()
        );
        Ok(population)
    }

    /// Evaluates every genome's network with `evaluator`,
    /// and stores the result as the genome's fitness.
    ///
    /// Fitness may also be set directly through
    /// [`genomes_mut`], e.g. to evaluate in parallel.
    ///
    /// [`genomes_mut`]: Population::genomes_mut
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&mut Network) -> f32,
    {
        let nodes = self.history.nodes();
        for genome in self.species.iter_mut().flat_map(|s| s.genomes.iter_mut()) {
            let mut network = Network::new(genome, nodes);
            genome.set_fitness(evaluator(&mut network));
        }
    }

    /// Advances the population a generation, replacing
    /// every genome with offspring of the fittest genomes
    /// of every species, proportionally to each species'
    /// total adjusted fitness.
    ///
    /// Genomes are expected to have been assigned
    /// their fitness beforehand.
    ///
    /// # Errors
    ///
    /// Returns an error if the population has no
    /// species, leaving it unchanged.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, GeneticConfig, NodeType};
    /// use cryoneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let mut population = Population::new(
    ///     &[
    ///         (NodeType::Sensor, ActivationType::Identity),
    ///         (NodeType::Output, ActivationType::Identity),
    ///     ],
    ///     &[(0, 1, 0.5)],
    ///     PopulationConfig::default(),
    ///     GeneticConfig::default(),
    ///     &mut rng,
    /// )
    /// .unwrap();
    ///
    /// for _ in 0..5 {
    ///     population.evaluate_fitness(|network| {
    ///         network.load_sensors(&[1.0]);
    ///         network.activate()[0].abs()
    ///     });
    ///     population.epoch(&mut rng).unwrap();
    /// }
    ///
    /// assert_eq!(population.generation(), 5);
    /// assert_eq!(population.size(), 150);
    /// ```
    pub fn epoch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), EpochError> {
        if self.species.is_empty() {
            return Err(EpochError::NoSpecies);
        }

        for species in &mut self.species {
            species.set_champions();
        }
        self.species
            .sort_by(|a, b| a.champion_fitness().total_cmp(&b.champion_fitness()));
        self.generation_champion = self.species.last().and_then(|s| s.champion()).cloned();
        if let Some(champion) = &self.generation_champion {
            if champion.fitness() >= self.champion_fitness() {
                self.champion = Some(champion.clone());
                self.generation_of_last_improvement = self.generation;
            }
        }

        let quotas = self.expected_offspring();
        log::debug!(
            "generation {}: {} species, champion fitness {}, offspring quotas {:?}",
            self.generation,
            self.species.len(),
            self.champion_fitness(),
            quotas
        );

        for species in &mut self.species {
            species.cull(self.population_config.survival_threshold);
        }

        let mut offspring = Vec::with_capacity(self.population_config.size.get());
        for (species, &quota) in self.species.iter().zip(&quotas) {
            offspring.extend(species.reproduce(
                quota,
                &self.species,
                &mut self.history,
                &self.genetic_config,
                &self.population_config,
                rng,
            ));
        }

        for species in &mut self.species {
            species.genomes.clear();
            species.age += 1;
        }
        self.speciate(offspring, self.generation + 1);
        self.species.retain(|s| !s.is_empty());
        for species in &mut self.species {
            species.refresh_template();
        }

        self.generation += 1;
        self.history.end_generation();
        Ok(())
    }

    /// Computes how many offspring each species gets to produce.
    /// Species must be ordered by increasing champion fitness.
    fn expected_offspring(&mut self) -> Vec<usize> {
        let target = self.population_config.size.get();
        let count = self.species.len();
        let mut quotas = vec![0; count];

        if self.generation - self.generation_of_last_improvement
            >= self.population_config.dropoff_generations
        {
            log::debug!(
                "no improvement in {} generations, concentrating offspring on the best species",
                self.generation - self.generation_of_last_improvement
            );
            self.generation_of_last_improvement = self.generation;
            let best = count - 1;
            if count == 1 {
                quotas[best] = target;
            } else {
                quotas[best] = target - target / 2;
                quotas[best - 1] = target / 2;
                let runner_up = &mut self.species[best - 1];
                runner_up.age_of_last_improvement = runner_up.age;
            }
            let best = &mut self.species[best];
            best.age_of_last_improvement = best.age;
            return quotas;
        }

        if self.generation % self.population_config.stagnation_epoch_cycle.get() == 0 {
            let over_the_hill_age = self.population_config.over_the_hill_age;
            if let Some(oldest) = self
                .species
                .iter_mut()
                .filter(|s| s.age > over_the_hill_age)
                .max_by_key(|s| s.age)
            {
                log::debug!("species {:?} marked terminal at age {}", oldest.id(), oldest.age);
                oldest.terminal = true;
            }
        }

        for species in &mut self.species {
            species.adjust_fitness(&self.population_config);
        }
        let total: f32 = self.species.iter().map(Species::total_adjusted_fitness).sum();

        let (mut most, mut most_quota) = (count - 1, 0);
        if total > 0.0 {
            for (i, species) in self.species.iter().enumerate() {
                quotas[i] = (species.total_adjusted_fitness() * target as f32 / total) as usize;
                if quotas[i] > most_quota {
                    most = i;
                    most_quota = quotas[i];
                }
            }
        }

        let assigned: usize = quotas.iter().sum();
        if assigned == 0 {
            log::warn!(
                "no adjusted fitness in generation {}, last species gets every offspring",
                self.generation
            );
            quotas[count - 1] = target;
        } else if assigned < target {
            quotas[most] += target - assigned;
        } else {
            trim_excess(&mut quotas, target);
        }
        debug_assert_eq!(quotas.iter().sum::<usize>(), target);
        quotas
    }

    // Assigns each genome to the first species within the distance
    // threshold, creating new species as needed.
    fn speciate(&mut self, genomes: Vec<Genome>, birth_generation: usize) {
        let threshold = self.population_config.distance_threshold;
        let config = &self.genetic_config;
        let mut born = 0;
        for genome in genomes {
            match self
                .species
                .iter_mut()
                .find(|s| s.genetic_distance(&genome, config) <= threshold)
            {
                Some(species) => species.add_genome(genome),
                None => {
                    self.species
                        .push(Species::new(SpeciesID(birth_generation, born), genome));
                    born += 1;
                }
            }
        }
    }

    /// Returns the number of genomes in the population.
    pub fn size(&self) -> usize {
        self.species.iter().map(Species::len).sum()
    }

    /// Returns the number of species in the population.
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Returns an iterator over every genome, species by species.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.species.iter().flat_map(|s| s.genomes.iter())
    }

    /// Returns a mutable iterator over every genome,
    /// in the same order as [`genomes`].
    ///
    /// [`genomes`]: Population::genomes
    pub fn genomes_mut(&mut self) -> impl Iterator<Item = &mut Genome> {
        self.species.iter_mut().flat_map(|s| s.genomes.iter_mut())
    }

    /// Returns an iterator over the population's species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the number of epochs the population has gone through.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the best genome seen across all generations, if any.
    ///
    /// A genome only becomes champion at the epoch
    /// following its evaluation.
    pub fn champion(&self) -> Option<&Genome> {
        self.champion.as_ref()
    }

    /// Returns the all-time champion's fitness, or 0
    /// if there is none.
    pub fn champion_fitness(&self) -> f32 {
        self.champion.as_ref().map_or(0.0, Genome::fitness)
    }

    /// Returns the best genome of the last generation
    /// that went through an epoch, if any.
    pub fn generation_champion(&self) -> Option<&Genome> {
        self.generation_champion.as_ref()
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Builds the network described by `genome` over
    /// the population's nodes.
    pub fn network_of(&self, genome: &Genome) -> Network {
        Network::new(genome, self.history.nodes())
    }

    /// Returns the population's genetic configuration.
    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }
}

// Takes offspring away one at a time from whichever
// species currently expects the most, until the quotas
// add up to `target`.
fn trim_excess(quotas: &mut [usize], target: usize) {
    let assigned: usize = quotas.iter().sum();
    for _ in target..assigned {
        if let Some(largest) = quotas.iter_mut().max() {
            *largest -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use std::num::NonZeroUsize;

    const XOR_NODES: [(NodeType, ActivationType); 4] = [
        (NodeType::Sensor, ActivationType::Identity),
        (NodeType::Sensor, ActivationType::Identity),
        (NodeType::Bias, ActivationType::Identity),
        (NodeType::Output, ActivationType::SteepenedSigmoid),
    ];
    const XOR_CONNECTIONS: [(Innovation, Innovation, f32); 3] =
        [(0, 3, 0.0), (1, 3, 0.0), (2, 3, 0.0)];

    fn population(size: usize, rng: &mut ChaCha8Rng) -> Population {
        Population::new(
            &XOR_NODES,
            &XOR_CONNECTIONS,
            PopulationConfig {
                size: NonZeroUsize::new(size).unwrap(),
                ..PopulationConfig::default()
            },
            GeneticConfig::default(),
            rng,
        )
        .unwrap()
    }

    #[test]
    fn seeding() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let population = population(10, &mut rng);

        assert_eq!(population.size(), 10);
        assert_eq!(population.generation(), 0);
        assert!(population.champion().is_none());
        assert_eq!(population.history().connections().len(), 3);
        assert_eq!(population.history().generational().len(), 3);
        assert!(population.genomes().all(|g| g.len() == 3));
        let first = population.genomes().next().unwrap();
        assert!(first.genes().all(|g| g.weight() == 0.0 && !g.frozen()));
    }

    #[test]
    fn seeding_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let build = |connections: &[(Innovation, Innovation, f32)], rng: &mut ChaCha8Rng| {
            Population::new(
                &XOR_NODES,
                connections,
                PopulationConfig::default(),
                GeneticConfig::default(),
                rng,
            )
        };

        assert!(matches!(
            build(&[(0, 4, 1.0)], &mut rng),
            Err(PopulationError::UndefinedNode { largest: 3, .. })
        ));
        assert!(matches!(
            build(&[(0, 3, 1.0), (1, 3, 1.0), (0, 3, -1.0)], &mut rng),
            Err(PopulationError::DuplicateConnection {
                input: 0,
                output: 3
            })
        ));
        assert!(matches!(
            Population::new(
                &[],
                &[],
                PopulationConfig::default(),
                GeneticConfig::default(),
                &mut rng
            ),
            Err(PopulationError::NoNodes)
        ));
        assert!(matches!(
            Population::new(
                &XOR_NODES,
                &XOR_CONNECTIONS,
                PopulationConfig {
                    mutate_only_chance: 2.0,
                    ..PopulationConfig::default()
                },
                GeneticConfig::default(),
                &mut rng
            ),
            Err(PopulationError::Config(_))
        ));
    }

    #[test]
    fn epoch_keeps_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut population = population(10, &mut rng);
        population.epoch(&mut rng).unwrap();

        assert_eq!(population.size(), 10);
        assert_eq!(population.generation(), 1);
        assert!(population.species().all(|s| s.champion_fitness() >= 0.0));
        assert!(population.history().generational().is_empty());
        assert!(population.history().historical().len() >= 3);
    }

    #[test]
    fn quotas_sum_to_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut population = population(37, &mut rng);
        for generation in 0..15 {
            let mut score = 0.0;
            for genome in population.genomes_mut() {
                score += 0.37;
                genome.set_fitness(score % 5.0);
            }
            for species in &mut population.species {
                species.set_champions();
            }
            population
                .species
                .sort_by(|a, b| a.champion_fitness().total_cmp(&b.champion_fitness()));
            let quotas = population.expected_offspring();
            assert_eq!(quotas.iter().sum::<usize>(), 37, "generation {}", generation);

            population.epoch(&mut rng).unwrap();
            assert_eq!(population.size(), 37);
        }
    }

    #[test]
    fn zero_fitness_goes_to_last_species() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut population = population(10, &mut rng);
        population.generation = 1;
        population.population_config.dropoff_generations = 100;
        let quotas = population.expected_offspring();
        assert_eq!(quotas.last(), Some(&10));
        assert_eq!(quotas.iter().sum::<usize>(), 10);
    }

    #[test]
    fn delta_coding_splits_between_best_two() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut population = population(11, &mut rng);
        let template = population.species[0].template().clone();
        population.species.push(Species::new(SpeciesID(0, 7), template.clone()));
        population.species.push(Species::new(SpeciesID(0, 8), template));
        population.population_config.dropoff_generations = 0;

        let quotas = population.expected_offspring();
        let count = quotas.len();
        assert_eq!(quotas[count - 1], 6);
        assert_eq!(quotas[count - 2], 5);
        assert_eq!(quotas.iter().sum::<usize>(), 11);
    }

    #[test]
    fn oldest_species_marked_terminal_on_cycle() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut population = population(10, &mut rng);
        let template = population.species[0].template().clone();
        for (index, age) in [(1, 25), (2, 40)] {
            let mut species = Species::new(SpeciesID(0, index), template.clone());
            species.age = age;
            population.species.push(species);
        }
        population.population_config.over_the_hill_age = 20;
        population.population_config.stagnation_epoch_cycle = NonZeroUsize::new(30).unwrap();
        population.population_config.dropoff_generations = 100;

        population.generation = 31;
        population.expected_offspring();
        assert!(population.species.iter().all(|s| !s.is_terminal()));

        population.generation = 60;
        population.expected_offspring();
        let terminal: Vec<_> = population
            .species
            .iter()
            .filter(|s| s.is_terminal())
            .map(|s| s.age)
            .collect();
        assert_eq!(terminal, [40]);
    }

    #[test]
    fn excess_offspring_taken_from_largest_quotas() {
        let mut quotas = [3, 5, 4];
        trim_excess(&mut quotas, 6);
        assert_eq!(quotas, [2, 2, 2]);

        let mut quotas = [3, 3, 1];
        trim_excess(&mut quotas, 1);
        assert_eq!(quotas.iter().sum::<usize>(), 1);

        let mut quotas = [2, 4];
        trim_excess(&mut quotas, 6);
        assert_eq!(quotas, [2, 4]);
    }

    #[test]
    fn champion_tracking() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut population = population(10, &mut rng);
        for (i, genome) in population.genomes_mut().enumerate() {
            genome.set_fitness(i as f32);
        }
        population.epoch(&mut rng).unwrap();
        assert_eq!(population.champion_fitness(), 9.0);
        assert_eq!(population.generation_champion().unwrap().fitness(), 9.0);

        for genome in population.genomes_mut() {
            genome.set_fitness(1.0);
        }
        population.epoch(&mut rng).unwrap();
        assert_eq!(population.champion_fitness(), 9.0);
        assert_eq!(population.generation_champion().unwrap().fitness(), 1.0);
    }

    #[test]
    fn evaluate_fitness_uses_networks() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut population = population(5, &mut rng);
        population.evaluate_fitness(|network| {
            network.load_sensors(&[1.0, 1.0]);
            network.output_ids().len() as f32 + network.sensor_ids().count() as f32
        });
        // One output, two sensors.
        assert!(population.genomes().all(|g| g.fitness() == 3.0));
    }

    #[test]
    fn empty_population_epoch_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut population = population(5, &mut rng);
        population.species.clear();
        assert!(matches!(
            population.epoch(&mut rng),
            Err(EpochError::NoSpecies)
        ));
        assert_eq!(population.generation(), 0);
    }
}
