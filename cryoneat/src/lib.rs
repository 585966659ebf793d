//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes never lose genes: node mutations _freeze_ the connection
//! they split instead of disabling it, and frozen genes are kept in the
//! genotype but left out of the network a genome describes. Nodes and
//! connections are registered once in a [`History`] shared by the
//! whole population, so identical structure always carries identical
//! innovation numbers, and identical structural mutations within a
//! generation are given the same ones.
//!
//! Every operation that needs randomness takes the random number
//! generator as an argument, so runs are reproducible from a seed.
//!
//! [`History`]: genomics::History
//!
//! # Example usage: Evolution of XOR function approximator
//! ```
//! use cryoneat::genomics::{ActivationType, GeneticConfig, NodeType};
//! use cryoneat::networks::Network;
//! use cryoneat::{Population, PopulationConfig};
//! use rand::SeedableRng;
//!
//! // Allowed error margin for network answers.
//! const ERROR_MARGIN: f32 = 0.3;
//!
//! fn evaluate_xor(network: &mut Network) -> f32 {
//!     let values = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut error = 0.0;
//!     for (input, output) in values {
//!         network.clear_state();
//!         network.load_sensors(&input);
//!         network.initialize(10);
//!         let e = (network.outputs()[0] - output).abs();
//!         if e >= ERROR_MARGIN {
//!             error += e;
//!         }
//!     }
//!
//!     (4.0 - error).powf(2.0)
//! }
//!
//! fn main() {
//!     let nodes = [
//!         (NodeType::Sensor, ActivationType::Identity),
//!         (NodeType::Sensor, ActivationType::Identity),
//!         (NodeType::Bias, ActivationType::Identity),
//!         (NodeType::Output, ActivationType::SteepenedSigmoid),
//!     ];
//!     let connections = [(0, 3, 0.0), (1, 3, 0.0), (2, 3, 0.0)];
//!
//!     let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!     let mut population = Population::new(
//!         &nodes,
//!         &connections,
//!         PopulationConfig::default(),
//!         GeneticConfig::default(),
//!         &mut rng,
//!     )
//!     .unwrap();
//!
//!     for _ in 0..10 {
//!         population.evaluate_fitness(evaluate_xor);
//!         if let Err(e) = population.epoch(&mut rng) {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!         if population.champion_fitness() > 15.9 {
//!             println!("Solution found!: {}", population.champion().unwrap());
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod genomics;
pub mod networks;
pub mod populations;

pub use populations::*;

/// Innovation number of a node or a connection.
/// Numbers are handed out in increasing order and
/// never reused within a [`History`].
///
/// [`History`]: genomics::History
pub type Innovation = usize;
