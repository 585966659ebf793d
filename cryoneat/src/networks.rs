//! A Network is the phenotype of a Genome: an executable
//! graph built from the genome's unfrozen genes and the
//! node registry. Frozen genes are ignored. Genes are
//! converted into connections, and the nodes they touch,
//! along with every registered sensor, bias and output
//! node, into network nodes.
//!
//! Networks keep their state between activations, so
//! recurrent connections carry values from one
//! activation to the next.
mod connection;

use crate::genomics::{ActivationType, Genome, NodeRegistry, NodeType};
use crate::Innovation;
use connection::Connection;

use ahash::RandomState;

use std::collections::HashMap;
use std::fmt;

/// An arbitrarily-structured neural network.
///
/// Nodes are stored input nodes first (sensors and biases),
/// then outputs, then hidden nodes, each group sorted by
/// innovation number.
#[derive(Clone, Debug)]
pub struct Network {
    input_count: usize,
    output_count: usize,
    node_ids: Box<[Innovation]>,
    node_types: Box<[NodeType]>,
    input_sums: Box<[f32]>,
    activation_levels: Box<[f32]>,
    activation_functions: Box<[ActivationType]>,
    connections: Box<[Connection]>,
}

impl Network {
    /// Generates a new network from the passed genome.
    ///
    /// # Panics
    ///
    /// Panics if a gene refers to a node missing from `nodes`.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, Genome, NodeRegistry, NodeType};
    /// use cryoneat::networks::Network;
    ///
    /// let mut nodes = NodeRegistry::new();
    /// let sensor = nodes.register(NodeType::Sensor, ActivationType::Identity);
    /// let bias = nodes.register(NodeType::Bias, ActivationType::Identity);
    /// let output = nodes.register(NodeType::Output, ActivationType::Sigmoid);
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(0, sensor, output, 1.0);
    ///
    /// let network = Network::new(&genome, &nodes);
    ///
    /// // Registered sensors, biases and outputs are always present.
    /// assert_eq!(network.sensor_ids().collect::<Vec<_>>(), [sensor]);
    /// assert_eq!(network.output_ids(), [output]);
    /// ```
    pub fn new(genome: &Genome, nodes: &NodeRegistry) -> Network {
        let mut input_nodes = vec![];
        let mut output_nodes = vec![];
        let mut hidden_nodes = vec![];

        // Registry iteration is in id order, so each group is sorted.
        for (id, record) in nodes.iter() {
            match record.node_type() {
                NodeType::Sensor | NodeType::Bias => input_nodes.push(id),
                NodeType::Output => output_nodes.push(id),
                NodeType::Hidden => {}
            }
        }
        hidden_nodes.extend(
            genome
                .node_ids(true)
                .into_iter()
                .filter(|&id| nodes[id].node_type() == NodeType::Hidden),
        );

        let node_ids: Vec<Innovation> = input_nodes
            .iter()
            .chain(&output_nodes)
            .chain(&hidden_nodes)
            .copied()
            .collect();
        let (node_types, activation_functions): (Vec<_>, Vec<_>) = node_ids
            .iter()
            .map(|&id| (nodes[id].node_type(), nodes[id].activation_type()))
            .unzip();

        let node_index_from_id: HashMap<_, _, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let connections: Vec<Connection> = genome
            .genes()
            .filter(|g| !g.frozen())
            .map(|g| {
                Connection::new(
                    node_index_from_id[&g.input()],
                    node_index_from_id[&g.output()],
                    g.weight(),
                )
            })
            .collect();

        let mut network = Network {
            input_count: input_nodes.len(),
            output_count: output_nodes.len(),
            input_sums: vec![0.0; node_ids.len()].into(),
            activation_levels: vec![0.0; node_ids.len()].into(),
            node_ids: node_ids.into(),
            node_types: node_types.into(),
            activation_functions: activation_functions.into(),
            connections: connections.into(),
        };
        network.clear_state();
        network
    }

    /// Propagates every node's current activation level through
    /// its outgoing connections, and then computes new activation
    /// levels for hidden and output nodes, in that order.
    ///
    /// Returns the output nodes' new activation levels,
    /// in increasing innovation number order.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, Genome, NodeRegistry, NodeType};
    /// use cryoneat::networks::Network;
    ///
    /// let mut nodes = NodeRegistry::new();
    /// nodes.register(NodeType::Sensor, ActivationType::Identity);
    /// nodes.register(NodeType::Sensor, ActivationType::Identity);
    /// nodes.register(NodeType::Output, ActivationType::ReLU);
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(0, 0, 2, 2.5);
    /// genome.add_gene(1, 1, 2, -2.5);
    ///
    /// let mut network = Network::new(&genome, &nodes);
    /// network.load_sensors(&[0.5, 1.0]);
    ///
    /// let outputs = network.activate();
    ///
    /// assert_eq!(outputs[0], (0.5_f32 * 2.5 + 1.0 * (-2.5)).max(0.0));
    /// ```
    pub fn activate(&mut self) -> &[f32] {
        for input_sum in &mut self.input_sums[self.input_count..] {
            *input_sum = 0.0;
        }
        for connection in self.connections.iter() {
            self.input_sums[connection.target] +=
                self.activation_levels[connection.source] * connection.weight;
        }

        let outputs = self.input_count..self.input_count + self.output_count;
        let hidden = outputs.end..self.node_ids.len();
        for i in hidden.chain(outputs) {
            self.activation_levels[i] = self.activation_functions[i].apply(self.input_sums[i]);
        }
        self.outputs()
    }

    /// Activates the network until [initialized], at most
    /// `max_activations` times. Returns whether the network
    /// is initialized.
    ///
    /// [initialized]: Network::is_initialized
    pub fn initialize(&mut self, max_activations: usize) -> bool {
        for _ in 0..max_activations {
            if self.is_initialized() {
                break;
            }
            self.activate();
        }
        self.is_initialized()
    }

    /// Returns whether any output node has
    /// received a non-zero input.
    pub fn is_initialized(&self) -> bool {
        self.input_sums[self.input_count..self.input_count + self.output_count]
            .iter()
            .any(|&sum| sum != 0.0)
    }

    /// Clears the activation state of all nodes.
    /// Bias nodes keep their constant activation of 1.
    pub fn clear_state(&mut self) {
        for ((input_sum, activation), node_type) in self
            .input_sums
            .iter_mut()
            .zip(self.activation_levels.iter_mut())
            .zip(self.node_types.iter())
        {
            let value = if *node_type == NodeType::Bias { 1.0 } else { 0.0 };
            *input_sum = value;
            *activation = value;
        }
    }

    /// Loads a value into the sensor with the passed innovation
    /// number, and immediately activates it. Loading a value into a
    /// bias node does nothing. Returns `false` if the network has
    /// no input node with that innovation number.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, Genome, NodeRegistry, NodeType};
    /// use cryoneat::networks::Network;
    ///
    /// let mut nodes = NodeRegistry::new();
    /// let sensor = nodes.register(NodeType::Sensor, ActivationType::Identity);
    /// let output = nodes.register(NodeType::Output, ActivationType::Identity);
    ///
    /// let mut genome = Genome::new();
    /// genome.add_gene(0, sensor, output, -2.0);
    ///
    /// let mut network = Network::new(&genome, &nodes);
    /// assert!(network.load_sensor(sensor, 1.5));
    /// assert!(!network.load_sensor(output, 1.5));
    ///
    /// assert_eq!(network.activate(), [-3.0]);
    /// ```
    pub fn load_sensor(&mut self, id: Innovation, value: f32) -> bool {
        match self.node_ids[..self.input_count].binary_search(&id) {
            Ok(i) => {
                if self.node_types[i] == NodeType::Sensor {
                    self.input_sums[i] = value;
                    self.activation_levels[i] = self.activation_functions[i].apply(value);
                }
                true
            }
            Err(_) => false,
        }
    }

    /// Loads each value into the corresponding sensor,
    /// in the order given by [`sensor_ids`].
    ///
    /// # Panics
    ///
    /// This function panics if the length of the passed slice
    /// is not equal to the number of sensors in the network.
    ///
    /// [`sensor_ids`]: Network::sensor_ids
    pub fn load_sensors(&mut self, values: &[f32]) {
        let sensors: Vec<usize> = (0..self.input_count)
            .filter(|&i| self.node_types[i] == NodeType::Sensor)
            .collect();
        assert_eq!(
            sensors.len(),
            values.len(),
            "sensor value count does not match sensor count"
        );
        for (i, value) in sensors.into_iter().zip(values) {
            self.input_sums[i] = *value;
            self.activation_levels[i] = self.activation_functions[i].apply(*value);
        }
    }

    /// Returns the current output node activation
    /// levels, in increasing innovation number order.
    pub fn outputs(&self) -> &[f32] {
        &self.activation_levels[self.input_count..self.input_count + self.output_count]
    }

    /// Returns the current activation level of the
    /// output node with the passed innovation number.
    pub fn output(&self, id: Innovation) -> Option<f32> {
        self.output_ids()
            .binary_search(&id)
            .ok()
            .map(|i| self.outputs()[i])
    }

    /// Returns the innovation numbers of the sensor
    /// nodes, in increasing order.
    pub fn sensor_ids(&self) -> impl Iterator<Item = Innovation> + '_ {
        self.node_ids[..self.input_count]
            .iter()
            .zip(self.node_types.iter())
            .filter(|(_, t)| **t == NodeType::Sensor)
            .map(|(id, _)| *id)
    }

    /// Returns the innovation numbers of the
    /// output nodes, in increasing order.
    pub fn output_ids(&self) -> &[Innovation] {
        &self.node_ids[self.input_count..self.input_count + self.output_count]
    }

    /// Returns the number of nodes in the network.
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Returns the number of connections in the network.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}
