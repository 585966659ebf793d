use crate::genomics::{ActivationType, ConnectionRegistry, NodeRegistry, NodeType};
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Identifies a structural mutation independently
/// of the genome it happened in.
///
/// Two node additions are the same mutation iff they
/// split the same connection with the same activation
/// type for the new node. Two connection additions are
/// the same mutation iff they join the same nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InnovationKey {
    NodeAddition {
        split_connection: Innovation,
        activation_type: ActivationType,
    },
    ConnectionAddition {
        input: Innovation,
        output: Innovation,
    },
}

/// A structural mutation together with the
/// innovation numbers it produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InnovationRecord {
    /// A connection was split by a new node.
    NodeAddition {
        split_connection: Innovation,
        activation_type: ActivationType,
        new_node: Innovation,
        input_connection: Innovation,
        output_connection: Innovation,
    },
    /// A connection was added between two nodes.
    ConnectionAddition {
        input: Innovation,
        output: Innovation,
        connection: Innovation,
    },
}

impl InnovationRecord {
    /// Returns the key under which the record
    /// is matched against later mutations.
    pub fn key(&self) -> InnovationKey {
        match *self {
            InnovationRecord::NodeAddition {
                split_connection,
                activation_type,
                ..
            } => InnovationKey::NodeAddition {
                split_connection,
                activation_type,
            },
            InnovationRecord::ConnectionAddition { input, output, .. } => {
                InnovationKey::ConnectionAddition { input, output }
            }
        }
    }
}

/// An ordered table of innovation records.
///
/// Records are looked up by their [`InnovationKey`];
/// the first record added under a key is the one found.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InnovationLedger {
    records: Vec<InnovationRecord>,
    index: HashMap<InnovationKey, usize, RandomState>,
}

impl InnovationLedger {
    /// Returns an empty ledger.
    pub fn new() -> InnovationLedger {
        InnovationLedger::default()
    }

    /// Returns the position of the first record
    /// matching `key`, if any.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{InnovationKey, InnovationLedger, InnovationRecord};
    ///
    /// let mut ledger = InnovationLedger::new();
    /// let key = InnovationKey::ConnectionAddition { input: 0, output: 3 };
    /// assert_eq!(ledger.find_matching(&key), None);
    ///
    /// let id = ledger.add(InnovationRecord::ConnectionAddition { input: 0, output: 3, connection: 7 });
    /// assert_eq!(ledger.find_matching(&key), Some(id));
    /// ```
    pub fn find_matching(&self, key: &InnovationKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Appends a record and returns its position in the ledger.
    pub fn add(&mut self, record: InnovationRecord) -> usize {
        let id = self.records.len();
        self.records.push(record);
        self.index.entry(record.key()).or_insert(id);
        id
    }

    /// Returns the record at the passed position.
    pub fn get(&self, id: usize) -> Option<&InnovationRecord> {
        self.records.get(id)
    }

    /// Moves every record of `other` to the end of this
    /// ledger, leaving `other` empty.
    pub fn append(&mut self, other: &mut InnovationLedger) {
        for record in other.records.drain(..) {
            self.add(record);
        }
        other.index.clear();
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Returns the number of records in the ledger.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the ledger has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over the records, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &InnovationRecord> {
        self.records.iter()
    }
}

/// A `History` keeps track of the structure created
/// during a run, in order to make sure identical mutations
/// are assigned the same innovation numbers.
///
/// It owns the node and connection registries every gene
/// refers to, the ledger of structural mutations seen
/// in the current generation, and the archive of all the
/// previous generations' ledgers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    nodes: NodeRegistry,
    connections: ConnectionRegistry,
    generational: InnovationLedger,
    historical: InnovationLedger,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> History {
        History::default()
    }

    /// Returns the node registry.
    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    /// Returns the node registry mutably.
    pub fn nodes_mut(&mut self) -> &mut NodeRegistry {
        &mut self.nodes
    }

    /// Returns the connection registry.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Returns the connection registry mutably.
    pub fn connections_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.connections
    }

    /// Returns the ledger of the current generation.
    pub fn generational(&self) -> &InnovationLedger {
        &self.generational
    }

    /// Returns the archive of all completed generations.
    pub fn historical(&self) -> &InnovationLedger {
        &self.historical
    }

    /// Returns the record of the first mutation of the
    /// current generation matching `key`, if any.
    pub fn find_innovation(&self, key: &InnovationKey) -> Option<InnovationRecord> {
        self.generational
            .find_matching(key)
            .and_then(|id| self.generational.get(id))
            .copied()
    }

    /// Records a mutation in the current generation.
    pub fn record_innovation(&mut self, record: InnovationRecord) -> usize {
        self.generational.add(record)
    }

    /// Registers a new hidden node splitting `split_connection`,
    /// along with its two new connections, and returns the
    /// corresponding record without adding it to the ledger.
    pub(crate) fn register_split(
        &mut self,
        split_connection: Innovation,
        activation_type: ActivationType,
    ) -> InnovationRecord {
        let (input, output) = self.connections[split_connection].endpoints();
        let new_node = self.nodes.register(NodeType::Hidden, activation_type);
        let input_connection = self.connections.register(input, new_node);
        let output_connection = self.connections.register(new_node, output);
        InnovationRecord::NodeAddition {
            split_connection,
            activation_type,
            new_node,
            input_connection,
            output_connection,
        }
    }

    /// Closes the current generation: its ledger is
    /// archived and a fresh one is started, so that
    /// mutations in the next generation are matched
    /// only against each other.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{History, InnovationRecord};
    ///
    /// let mut history = History::new();
    /// history.record_innovation(InnovationRecord::ConnectionAddition {
    ///     input: 0,
    ///     output: 1,
    ///     connection: 0,
    /// });
    ///
    /// history.end_generation();
    ///
    /// assert!(history.generational().is_empty());
    /// assert_eq!(history.historical().len(), 1);
    /// ```
    pub fn end_generation(&mut self) {
        self.historical.append(&mut self.generational);
    }
}
