use crate::genomics::{GeneticConfig, Genome, History};
use crate::populations::PopulationConfig;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by calculating
/// the genetic distance to a _template_, which is
/// one of the species' members, refreshed every
/// generation.
///
/// Species will stagnate after [`stagnation_age`]
/// generations without improving on their best
/// genome ever (their _legend_), and will thereafter
/// be penalized during reproduction.
///
/// [genetic distance]: PopulationConfig::distance_threshold
/// [`stagnation_age`]: PopulationConfig::stagnation_age
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesID,
    pub(super) genomes: Vec<Genome>,
    template: Genome,
    pub(super) age: usize,
    pub(super) age_of_last_improvement: usize,
    champion: Option<Genome>,
    legend: Option<Genome>,
    pub(super) terminal: bool,
    total_adjusted_fitness: f32,
    average_adjusted_fitness: f32,
}

impl Species {
    /// Creates a new species with the specified ID and
    /// template. The template is also added
    /// to the species' genome pool.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    /// use cryoneat::populations::{SpeciesID, Species};
    ///
    /// let species = Species::new(SpeciesID(1, 0), Genome::new());
    ///
    /// assert_eq!(species.len(), 1);
    /// assert_eq!(species.age(), 0);
    /// ```
    pub fn new(id: SpeciesID, template: Genome) -> Species {
        Species {
            id,
            genomes: vec![template.clone()],
            template,
            age: 0,
            age_of_last_improvement: 0,
            champion: None,
            legend: None,
            terminal: false,
            total_adjusted_fitness: 0.0,
            average_adjusted_fitness: 0.0,
        }
    }

    /// Returns the species' ID.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    /// use cryoneat::populations::{SpeciesID, Species};
    ///
    /// let species = Species::new(SpeciesID(1, 0), Genome::new());
    ///
    /// assert_eq!(species.id(), SpeciesID(1, 0));
    /// ```
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the genome new members are compared against.
    pub fn template(&self) -> &Genome {
        &self.template
    }

    /// Returns an iterator over the species' members.
    ///
    /// After an epoch's reproduction step and until the
    /// next epoch, members are ordered by decreasing fitness.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    /// Returns the number of members of the species.
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    /// Returns `true` if the species has no members.
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Returns the number of generations the species has lived through.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Returns the best member of the species as of the
    /// last call to [`set_champions`], if any.
    ///
    /// [`set_champions`]: Species::set_champions
    pub fn champion(&self) -> Option<&Genome> {
        self.champion.as_ref()
    }

    /// Returns the best genome the species has ever produced, if any
    /// has scored above 0.
    pub fn legend(&self) -> Option<&Genome> {
        self.legend.as_ref()
    }

    /// Returns the champion's fitness, or 0 if there is no champion.
    pub fn champion_fitness(&self) -> f32 {
        self.champion.as_ref().map_or(0.0, Genome::fitness)
    }

    /// Returns the legend's fitness, or 0 if there is no legend.
    pub fn legend_fitness(&self) -> f32 {
        self.legend.as_ref().map_or(0.0, Genome::fitness)
    }

    /// Returns the sum of the members' adjusted fitnesses,
    /// as computed by the last call to [`adjust_fitness`].
    ///
    /// [`adjust_fitness`]: Species::adjust_fitness
    pub fn total_adjusted_fitness(&self) -> f32 {
        self.total_adjusted_fitness
    }

    /// Returns the mean of the members' adjusted fitnesses,
    /// as computed by the last call to [`adjust_fitness`].
    ///
    /// [`adjust_fitness`]: Species::adjust_fitness
    pub fn average_adjusted_fitness(&self) -> f32 {
        self.average_adjusted_fitness
    }

    /// Returns `true` if the species has been marked for
    /// extinction for having grown too old.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Returns `true` if the species has gone
    /// [too long] without a new legend.
    ///
    /// [too long]: PopulationConfig::stagnation_age
    pub fn is_stagnated(&self, config: &PopulationConfig) -> bool {
        self.age + 1 >= self.age_of_last_improvement + config.stagnation_age
    }

    /// Adds a genome to the species.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    /// use cryoneat::populations::{SpeciesID, Species};
    ///
    /// let mut species = Species::new(SpeciesID(1, 0), Genome::new());
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(0, 0, 1, 1.0);
    /// species.add_genome(genome.clone());
    ///
    /// assert!(species.genomes().any(|g| g == &genome));
    /// ```
    pub fn add_genome(&mut self, genome: Genome) {
        self.genomes.push(genome);
    }

    /// Returns the genetic distance between the species'
    /// template and `other`.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{GeneticConfig, Genome};
    /// use cryoneat::populations::{SpeciesID, Species};
    ///
    /// let mut template = Genome::new();
    /// template.add_gene(0, 0, 1, 1.0);
    /// let species = Species::new(SpeciesID(1, 0), template.clone());
    ///
    /// assert_eq!(species.genetic_distance(&template, &GeneticConfig::default()), 0.0);
    /// ```
    pub fn genetic_distance(&self, other: &Genome, config: &GeneticConfig) -> f32 {
        Genome::genetic_distance(&self.template, other, config)
    }

    /// Computes every member's adjusted fitness through _explicit
    /// fitness sharing_: each member's fitness is penalized if the
    /// species is stagnated or terminal, rewarded if it is young,
    /// floored at 0, and divided by the size of the species.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    /// use cryoneat::populations::{PopulationConfig, SpeciesID, Species};
    ///
    /// let config = PopulationConfig {
    ///     stagnation_age: 100,
    ///     youth_age: 0,
    ///     ..PopulationConfig::default()
    /// };
    ///
    /// let mut template = Genome::new();
    /// template.set_fitness(3.0);
    /// let mut species = Species::new(SpeciesID(0, 0), template);
    /// let mut other = Genome::new();
    /// other.set_fitness(-1.0);
    /// species.add_genome(other);
    ///
    /// species.adjust_fitness(&config);
    ///
    /// assert_eq!(species.total_adjusted_fitness(), 1.5);
    /// assert_eq!(species.average_adjusted_fitness(), 0.75);
    /// ```
    pub fn adjust_fitness(&mut self, config: &PopulationConfig) {
        let penalized = self.is_stagnated(config) || self.terminal;
        let young = self.age <= config.youth_age;
        let size = self.genomes.len() as f32;

        let mut total = 0.0;
        for genome in &mut self.genomes {
            let mut adjusted = genome.fitness();
            if penalized {
                adjusted *= config.stagnation_penalty;
            }
            if young {
                adjusted *= config.youth_reward;
            }
            adjusted = adjusted.max(0.0) / size;
            genome.set_adjusted_fitness(adjusted);
            total += adjusted;
        }

        self.total_adjusted_fitness = total;
        self.average_adjusted_fitness = if self.genomes.is_empty() {
            0.0
        } else {
            total / size
        };
    }

    /// Sorts the members by decreasing fitness and records the
    /// best as the species' champion. A champion scoring above
    /// the legend becomes the new legend, which resets the
    /// species' stagnation clock.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Genome;
    /// use cryoneat::populations::{SpeciesID, Species};
    ///
    /// let mut species = Species::new(SpeciesID(0, 0), Genome::new());
    /// let mut best = Genome::new();
    /// best.set_fitness(2.0);
    /// species.add_genome(best);
    ///
    /// species.set_champions();
    ///
    /// assert_eq!(species.champion_fitness(), 2.0);
    /// assert_eq!(species.legend_fitness(), 2.0);
    /// assert_eq!(species.genomes().next().unwrap().fitness(), 2.0);
    /// ```
    pub fn set_champions(&mut self) {
        self.genomes
            .sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        self.champion = self.genomes.first().cloned();
        if self.champion_fitness() > self.legend_fitness() {
            self.age_of_last_improvement = self.age;
            self.legend = self.champion.clone();
        }
    }

    /// Discards all but the top `survival_threshold` fraction of
    /// the members (rounded down, plus one). Members must already
    /// be ordered by [`set_champions`].
    ///
    /// [`set_champions`]: Species::set_champions
    pub(super) fn cull(&mut self, survival_threshold: f32) {
        let survivors = (self.genomes.len() as f32 * survival_threshold) as usize + 1;
        self.genomes.truncate(survivors);
    }

    /// Replaces the template with the species' first member.
    pub(super) fn refresh_template(&mut self) {
        if let Some(first) = self.genomes.first() {
            self.template = first.clone();
        }
    }

    /// Produces `quota` offspring from the species' members.
    ///
    /// If the quota reaches the [champion survival threshold],
    /// the first child is an unaltered copy of the champion,
    /// fitness included. Every other child is either a mutated
    /// copy of a random member, or the result of mating two
    /// members (or, with [small chance], a member and another
    /// species' champion) which is mutated unless [mating alone]
    /// is chosen and the parents differ. The last child is
    /// always a mutated copy.
    ///
    /// # Panics
    ///
    /// Panics if `quota` is positive and the species has no members.
    ///
    /// [champion survival threshold]: PopulationConfig::champion_survival_threshold
    /// [small chance]: PopulationConfig::interspecies_mating_chance
    /// [mating alone]: PopulationConfig::mate_only_chance
    pub fn reproduce<R: Rng + ?Sized>(
        &self,
        quota: usize,
        all_species: &[Species],
        history: &mut History,
        genetic_config: &GeneticConfig,
        population_config: &PopulationConfig,
        rng: &mut R,
    ) -> Vec<Genome> {
        let mut offspring = Vec::with_capacity(quota);
        if quota == 0 {
            return offspring;
        }
        assert!(
            !self.genomes.is_empty(),
            "species {:?} has no members to reproduce",
            self.id
        );
        let champion = self
            .champion
            .as_ref()
            .unwrap_or(&self.genomes[0]);

        let mut champion_copied = false;
        for remaining in (1..=quota).rev() {
            if !champion_copied && remaining >= population_config.champion_survival_threshold {
                offspring.push(champion.clone());
                champion_copied = true;
                continue;
            }

            let mut child = if remaining == 1
                || rng.gen::<f32>() < population_config.mutate_only_chance
            {
                let mut child = self.random_member(rng).clone();
                child.mutate(history, genetic_config, rng);
                child
            } else {
                let mother = self.random_member(rng);
                let father = if rng.gen::<f32>() < population_config.interspecies_mating_chance {
                    self.other_champion(all_species, rng).unwrap_or(champion)
                } else {
                    self.random_member(rng)
                };
                let mut child = Genome::mate(mother, father, genetic_config, rng);
                if rng.gen::<f32>() >= population_config.mate_only_chance
                    || Genome::genetic_distance(mother, father, genetic_config) == 0.0
                {
                    child.mutate(history, genetic_config, rng);
                }
                child
            };
            child.reset_fitness();
            offspring.push(child);
        }
        offspring
    }

    fn random_member<R: Rng + ?Sized>(&self, rng: &mut R) -> &Genome {
        &self.genomes[rng.gen_range(0..self.genomes.len())]
    }

    // Champion of a random species other than this one.
    fn other_champion<'a, R: Rng + ?Sized>(
        &self,
        all_species: &'a [Species],
        rng: &mut R,
    ) -> Option<&'a Genome> {
        let others: Vec<&Species> = all_species.iter().filter(|s| s.id != self.id).collect();
        others
            .choose(rng)
            .and_then(|s| s.champion.as_ref().or_else(|| s.genomes.first()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, NodeType};

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scored(fitness: f32) -> Genome {
        let mut genome = Genome::new();
        genome.set_fitness(fitness);
        genome
    }

    fn species_of(fitnesses: &[f32]) -> Species {
        let mut species = Species::new(SpeciesID(0, 0), scored(fitnesses[0]));
        for &fitness in &fitnesses[1..] {
            species.add_genome(scored(fitness));
        }
        species
    }

    fn seeded_history() -> (History, Genome) {
        let mut history = History::new();
        let sensor = history
            .nodes_mut()
            .register(NodeType::Sensor, ActivationType::Identity);
        let bias = history
            .nodes_mut()
            .register(NodeType::Bias, ActivationType::Identity);
        let output = history
            .nodes_mut()
            .register(NodeType::Output, ActivationType::Sigmoid);
        let mut genome = Genome::new();
        for input in [sensor, bias] {
            let id = history.connections_mut().register(input, output);
            genome.add_gene(id, input, output, 0.5);
        }
        (history, genome)
    }

    #[test]
    fn new_species_contains_template() {
        let species = Species::new(SpeciesID(3, 1), scored(1.0));
        assert_eq!(species.len(), 1);
        assert_eq!(species.template(), &scored(1.0));
        assert!(species.champion().is_none());
        assert!(species.legend().is_none());
        assert!(!species.is_terminal());
    }

    #[test]
    fn adjust_fitness_shares_and_floors() {
        let config = PopulationConfig {
            youth_age: 0,
            stagnation_age: 100,
            ..PopulationConfig::default()
        };
        let mut species = species_of(&[4.0, -2.0, 2.0, 0.0]);
        species.age = 1;
        species.adjust_fitness(&config);

        let adjusted: Vec<f32> = species.genomes().map(|g| g.adjusted_fitness()).collect();
        assert_eq!(adjusted, [1.0, 0.0, 0.5, 0.0]);
        assert!(adjusted.iter().all(|&a| a >= 0.0));
        assert_eq!(species.total_adjusted_fitness(), adjusted.iter().sum::<f32>());
        assert_eq!(species.average_adjusted_fitness(), 1.5 / 4.0);
    }

    #[test]
    fn adjust_fitness_rewards_youth() {
        let config = PopulationConfig {
            youth_age: 10,
            youth_reward: 2.0,
            stagnation_age: 100,
            ..PopulationConfig::default()
        };
        let mut species = species_of(&[3.0]);
        species.adjust_fitness(&config);
        assert_eq!(species.total_adjusted_fitness(), 6.0);
    }

    #[test]
    fn adjust_fitness_penalizes_stagnation_and_terminal() {
        let config = PopulationConfig {
            youth_age: 0,
            stagnation_age: 3,
            stagnation_penalty: 0.5,
            ..PopulationConfig::default()
        };

        let mut species = species_of(&[8.0]);
        species.age = 2;
        assert!(species.is_stagnated(&config));
        species.adjust_fitness(&config);
        assert_eq!(species.total_adjusted_fitness(), 4.0);

        let mut species = species_of(&[8.0]);
        species.age = 1;
        assert!(!species.is_stagnated(&config));
        species.adjust_fitness(&config);
        assert_eq!(species.total_adjusted_fitness(), 8.0);

        species.terminal = true;
        species.adjust_fitness(&config);
        assert_eq!(species.total_adjusted_fitness(), 4.0);
    }

    #[test]
    fn set_champions_tracks_legend() {
        let mut species = species_of(&[1.0, 5.0, 3.0]);
        species.age = 4;
        species.set_champions();

        let order: Vec<f32> = species.genomes().map(|g| g.fitness()).collect();
        assert_eq!(order, [5.0, 3.0, 1.0]);
        assert_eq!(species.champion_fitness(), 5.0);
        assert_eq!(species.legend_fitness(), 5.0);
        assert_eq!(species.age_of_last_improvement, 4);

        // A worse champion does not replace the legend.
        species.genomes = vec![scored(2.0)];
        species.age = 6;
        species.set_champions();
        assert_eq!(species.champion_fitness(), 2.0);
        assert_eq!(species.legend_fitness(), 5.0);
        assert_eq!(species.age_of_last_improvement, 4);
    }

    #[test]
    fn zero_scores_make_no_legend() {
        let mut species = species_of(&[0.0, 0.0]);
        species.set_champions();
        assert!(species.champion().is_some());
        assert!(species.legend().is_none());
    }

    #[test]
    fn cull_keeps_top_fraction() {
        let mut species = species_of(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        species.set_champions();
        species.cull(0.2);
        let kept: Vec<f32> = species.genomes().map(|g| g.fitness()).collect();
        assert_eq!(kept, [10.0, 9.0, 8.0]);

        let mut species = species_of(&[1.0]);
        species.cull(0.0);
        assert_eq!(species.len(), 1);
    }

    #[test]
    fn reproduce_fills_quota() {
        let (mut history, genome) = seeded_history();
        let mut template = genome.clone();
        template.set_fitness(1.0);
        let mut species = Species::new(SpeciesID(0, 0), template);
        species.add_genome(genome);
        species.set_champions();

        let population_config = PopulationConfig::default();
        let genetic_config = GeneticConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let all = [species.clone()];
        for quota in [0, 1, 5, 12] {
            let offspring = species.reproduce(
                quota,
                &all,
                &mut history,
                &genetic_config,
                &population_config,
                &mut rng,
            );
            assert_eq!(offspring.len(), quota);
        }
    }

    #[test]
    fn identical_parents_always_mutated() {
        let (mut history, genome) = seeded_history();
        let mut species = Species::new(SpeciesID(0, 0), genome.clone());
        species.add_genome(genome.clone());
        species.set_champions();

        let population_config = PopulationConfig {
            mutate_only_chance: 0.0,
            mate_only_chance: 1.0,
            interspecies_mating_chance: 0.0,
            champion_survival_threshold: 100,
            ..PopulationConfig::default()
        };
        // Every mutation splits the sensor's gene.
        let genetic_config = GeneticConfig {
            mutation_weights: crate::genomics::MutationWeights {
                add_node: 1,
                add_connection: 0,
                try_all_non_structural: 0,
            },
            ..GeneticConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let all = [species.clone()];

        let offspring = species.reproduce(
            8,
            &all,
            &mut history,
            &genetic_config,
            &population_config,
            &mut rng,
        );
        assert_eq!(offspring.len(), 8);
        assert!(offspring.iter().all(|g| g.len() == genome.len() + 2));
    }

    #[test]
    fn reproduce_keeps_champion() {
        let (mut history, genome) = seeded_history();
        let mut champion = genome.clone();
        champion.set_fitness(9.0);
        let mut species = Species::new(SpeciesID(0, 0), champion.clone());
        species.add_genome(genome);
        species.set_champions();

        let population_config = PopulationConfig {
            champion_survival_threshold: 3,
            ..PopulationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let all = [species.clone()];

        let offspring = species.reproduce(
            3,
            &all,
            &mut history,
            &GeneticConfig::default(),
            &population_config,
            &mut rng,
        );
        assert_eq!(offspring[0], champion);
        assert!(offspring[1..].iter().all(|g| g.fitness() == 0.0));

        // Below the threshold, no child keeps a score.
        let offspring = species.reproduce(
            2,
            &all,
            &mut history,
            &GeneticConfig::default(),
            &population_config,
            &mut rng,
        );
        assert!(offspring.iter().all(|g| g.fitness() == 0.0));
    }

    #[test]
    fn other_champion_excludes_self() {
        let mut first = species_of(&[1.0]);
        first.set_champions();
        let mut second = Species::new(SpeciesID(0, 1), scored(4.0));
        second.set_champions();
        let all = [first.clone(), second];

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..10 {
            let champion = first.other_champion(&all, &mut rng).unwrap();
            assert_eq!(champion.fitness(), 4.0);
        }
        assert!(first.other_champion(&[first.clone()], &mut rng).is_none());
    }
}
