use cryoneat::genomics::{ActivationType, GeneticConfig, NodeType};
use cryoneat::logging::{EvolutionLogger, ReportingLevel, Stats};
use cryoneat::networks::Network;
use cryoneat::{Population, PopulationConfig};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use std::error::Error;
use std::fs;

const ERROR_MARGIN: f32 = 0.3;
const PERFECT_SCORE: f32 = 16.0;
const ITERATIONS: u64 = 200;
const MAX_GENERATIONS: usize = 100;

const NODES: [(NodeType, ActivationType); 4] = [
    (NodeType::Sensor, ActivationType::Identity),
    (NodeType::Sensor, ActivationType::Identity),
    (NodeType::Bias, ActivationType::Identity),
    (NodeType::Output, ActivationType::SteepenedSigmoid),
];
const CONNECTIONS: [(usize, usize, f32); 3] = [(0, 3, 0.0), (1, 3, 0.0), (2, 3, 0.0)];

fn evaluate_xor(network: &mut Network) -> f32 {
    let values = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut errors = [0.0; 4];
    for (i, (input, output)) in values.iter().enumerate() {
        network.clear_state();
        network.load_sensors(input);
        if !network.initialize(network.node_count()) {
            // Disconnected outputs never answer.
            return 0.0;
        }
        errors[i] = (network.outputs()[0] - output).abs();
        if errors[i] < ERROR_MARGIN {
            errors[i] = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f32>()).powf(2.0)
}

fn solved(population: &Population) -> bool {
    (population.champion_fitness() - PERFECT_SCORE).abs() < f32::EPSILON
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let (genetic_config, population_config) = match std::env::args().nth(1) {
        Some(path) => ron::from_str(&fs::read_to_string(path)?)?,
        None => (GeneticConfig::default(), PopulationConfig::default()),
    };
    genetic_config.validate()?;
    population_config.validate()?;

    logged_run(&genetic_config, &population_config)?;
    stress_test(&genetic_config, &population_config);
    Ok(())
}

// Evolves a single population, logging every generation,
// then checks the final population survives a round trip
// through RON.
fn logged_run(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
) -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(0);
    let mut population = Population::new(
        &NODES,
        &CONNECTIONS,
        population_config.clone(),
        genetic_config.clone(),
        &mut rng,
    )?;
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);

    for _ in 0..MAX_GENERATIONS {
        population.evaluate_fitness(evaluate_xor);
        logger.log(
            &population,
            &|g| [g.fitness(), g.len() as f32],
            ["fitness", "genes"],
        );
        population.epoch(&mut rng)?;
        if solved(&population) {
            break;
        }
    }
    for log in logger.iter() {
        log::info!("{}", log);
    }

    match population.champion() {
        Some(champion) if solved(&population) => println!(
            "Solution found at generation {}: {}",
            population.generation(),
            champion
        ),
        _ => println!("No solution after {} generations", population.generation()),
    }

    let serialized = ron::to_string(&population)?;
    let restored: Population = ron::from_str(&serialized)?;
    assert_eq!(restored.generation(), population.generation());
    assert_eq!(restored.size(), population.size());
    Ok(())
}

fn stress_test(genetic_config: &GeneticConfig, population_config: &PopulationConfig) {
    let generations: Vec<Option<usize>> = (0..ITERATIONS)
        .into_par_iter()
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut population = match Population::new(
                &NODES,
                &CONNECTIONS,
                population_config.clone(),
                genetic_config.clone(),
                &mut rng,
            ) {
                Ok(population) => population,
                Err(e) => {
                    log::error!("run {}: {}", seed, e);
                    return None;
                }
            };
            for _ in 0..MAX_GENERATIONS {
                population.evaluate_fitness(evaluate_xor);
                if let Err(e) = population.epoch(&mut rng) {
                    log::error!("run {}: {}", seed, e);
                    return None;
                }
                if solved(&population) {
                    return Some(population.generation());
                }
            }
            None
        })
        .collect();

    println!(
        "Successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().filter_map(|g| g.map(|g| g as f32))),
        generations.iter().filter(|g| g.is_none()).count() as f32 * 100.0 / ITERATIONS as f32,
        ITERATIONS
    );
}
