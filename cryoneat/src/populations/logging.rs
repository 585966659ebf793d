use super::{Population, SpeciesID};

use crate::genomics::Genome;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// Summary of a single species at logging time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeciesSummary {
    pub id: SpeciesID,
    pub size: usize,
    pub age: usize,
    pub champion_fitness: f32,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub species: Vec<SpeciesSummary>,
    pub genome_stats: Vec<(String, Stats)>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        for s in &self.species {
            writeln!(
                f,
                "\tspecies {:?}: size {}, age {}, champion fitness {}",
                s.id, s.size, s.age, s.champion_fitness
            )?;
        }
        for (name, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {:?}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all-NaN statistics.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f32::NAN,
                minimum: f32::NAN,
                mean: f32::NAN,
                median: f32::NAN,
            };
        }
        let (mut max, mut min, mut sum) = (f32::MIN, f32::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f32;

        let mid = data.len() / 2;
        let upper = *data.select_nth_unstable_by(mid, f32::total_cmp).1;
        let median = if data.len() % 2 == 0 {
            // The lower half now holds everything below `upper`.
            let lower = data[..mid]
                .iter()
                .copied()
                .max_by(f32::total_cmp)
                .unwrap_or(upper);
            (lower + upper) / 2.0
        } else {
            upper
        };

        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Species IDs, genomes and age.
    Species(Vec<(SpeciesID, Vec<Genome>, usize)>),
    /// Only species IDs, species champions, and age.
    SpeciesChampions(Vec<(SpeciesID, Genome, usize)>),
    /// Only population champion.
    PopulationChampion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// assert_eq!(logger.iter().count(), 0);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// Species champions are those of the last epoch, so
    /// species without one (before the first epoch) are
    /// sampled by their first member. The population
    /// champion is only recorded once it exists.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, GeneticConfig, NodeType};
    /// use cryoneat::logging::{EvolutionLogger, ReportingLevel};
    /// use cryoneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let population = Population::new(
    ///     &[
    ///         (NodeType::Sensor, ActivationType::Identity),
    ///         (NodeType::Output, ActivationType::Sigmoid),
    ///     ],
    ///     &[(0, 1, 0.0)],
    ///     PopulationConfig::default(),
    ///     GeneticConfig::default(),
    ///     &mut rng,
    /// )
    /// .unwrap();
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// logger.log(&population, &|g| [g.fitness(), g.len() as f32], ["fitness", "genes"]);
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.genome_stats[1].1.maximum, 1.0);
    /// ```
    pub fn log<GSE, const N: usize>(
        &mut self,
        population: &Population,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        GSE: Fn(&Genome) -> [f32; N],
    {
        let stats: Vec<[f32; N]> = population.genomes().map(genome_stat_extractor).collect();
        let genome_stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(unzip_n_vecs(stats.into_iter()))
            .map(|(name, data)| (name, Stats::from(data.into_iter())))
            .collect();
        let generation_sample = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                population
                    .species()
                    .map(|s| (s.id(), s.genomes().cloned().collect(), s.age()))
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .species()
                    .filter_map(|s| {
                        s.champion()
                            .or_else(|| s.genomes().next())
                            .map(|c| (s.id(), c.clone(), s.age()))
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => match population.champion() {
                Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };
        let species = population
            .species()
            .map(|s| SpeciesSummary {
                id: s.id(),
                size: s.len(),
                age: s.age(),
                champion_fitness: s.champion_fitness(),
            })
            .collect::<Vec<_>>();
        log::debug!(
            "logged generation {} ({} species)",
            population.generation(),
            species.len()
        );
        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample,
            species_count: species.len(),
            species,
            genome_stats,
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::default(); N];
    for items in iter {
        for (vec, item) in vecs.iter_mut().zip(items) {
            vec.push(item);
        }
    }
    vecs
}
