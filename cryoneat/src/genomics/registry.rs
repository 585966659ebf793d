use crate::genomics::{ActivationType, NodeRecord, NodeType};
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};
use std::fmt;

/// An append-only table of every node ever created
/// in a run. A node's innovation number is its
/// position in the table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeRegistry {
    records: Vec<NodeRecord>,
}

impl NodeRegistry {
    /// Returns an empty registry.
    pub fn new() -> NodeRegistry {
        NodeRegistry::default()
    }

    /// Registers a new node and returns its innovation number.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, NodeRegistry, NodeType};
    ///
    /// let mut nodes = NodeRegistry::new();
    /// let sensor = nodes.register(NodeType::Sensor, ActivationType::Identity);
    /// let output = nodes.register(NodeType::Output, ActivationType::Sigmoid);
    ///
    /// assert_eq!((sensor, output), (0, 1));
    /// assert_eq!(nodes[output].node_type(), NodeType::Output);
    /// ```
    pub fn register(&mut self, node_type: NodeType, activation_type: ActivationType) -> Innovation {
        self.records.push(NodeRecord::new(node_type, activation_type));
        self.records.len() - 1
    }

    /// Returns the record of the node with the passed
    /// innovation number, if it has been registered.
    pub fn get(&self, id: Innovation) -> Option<&NodeRecord> {
        self.records.get(id)
    }

    /// Returns the number of registered nodes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no nodes have been registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over `(innovation number, record)` pairs
    /// in order of registration.
    pub fn iter(&self) -> impl Iterator<Item = (Innovation, &NodeRecord)> {
        self.records.iter().enumerate()
    }
}

impl std::ops::Index<Innovation> for NodeRegistry {
    type Output = NodeRecord;

    fn index(&self, id: Innovation) -> &NodeRecord {
        &self.records[id]
    }
}

/// The structural facts about a registered connection:
/// the nodes it goes from and to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    input: Innovation,
    output: Innovation,
}

impl ConnectionRecord {
    /// Returns a new connection record between the passed nodes.
    pub fn new(input: Innovation, output: Innovation) -> ConnectionRecord {
        ConnectionRecord { input, output }
    }

    /// Returns the innovation number of the connection's source node.
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Returns the innovation number of the connection's target node.
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the connection's `(input, output)` endpoints.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }
}

impl fmt::Display for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.input, self.output)
    }
}

/// An append-only table of every connection ever created
/// in a run. A connection's innovation number is its position
/// in the table, and every `(input, output)` pair is registered
/// at most once.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConnectionRegistry {
    records: Vec<ConnectionRecord>,
    by_endpoints: HashMap<(Innovation, Innovation), Innovation, RandomState>,
}

impl ConnectionRegistry {
    /// Returns an empty registry.
    pub fn new() -> ConnectionRegistry {
        ConnectionRegistry::default()
    }

    /// Returns the innovation number of the connection between
    /// `input` and `output`, registering it first if it is new.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::ConnectionRegistry;
    ///
    /// let mut connections = ConnectionRegistry::new();
    /// assert_eq!(connections.register(0, 2), 0);
    /// assert_eq!(connections.register(1, 2), 1);
    ///
    /// // Registering the same pair again yields the same number.
    /// assert_eq!(connections.register(0, 2), 0);
    /// assert_eq!(connections.len(), 2);
    /// ```
    pub fn register(&mut self, input: Innovation, output: Innovation) -> Innovation {
        match self.by_endpoints.entry((input, output)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                self.records.push(ConnectionRecord::new(input, output));
                *entry.insert(self.records.len() - 1)
            }
        }
    }

    /// Returns the innovation number of the connection between
    /// `input` and `output`, if one was ever registered.
    pub fn find(&self, input: Innovation, output: Innovation) -> Option<Innovation> {
        self.by_endpoints.get(&(input, output)).copied()
    }

    /// Returns the record of the connection with the passed
    /// innovation number, if it has been registered.
    pub fn get(&self, id: Innovation) -> Option<&ConnectionRecord> {
        self.records.get(id)
    }

    /// Returns the number of registered connections.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no connections have been registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over `(innovation number, record)` pairs
    /// in order of registration.
    pub fn iter(&self) -> impl Iterator<Item = (Innovation, &ConnectionRecord)> {
        self.records.iter().enumerate()
    }
}

impl std::ops::Index<Innovation> for ConnectionRegistry {
    type Output = ConnectionRecord;

    fn index(&self, id: Innovation) -> &ConnectionRecord {
        &self.records[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_sequential() {
        let mut nodes = NodeRegistry::new();
        let types = [
            NodeType::Bias,
            NodeType::Sensor,
            NodeType::Sensor,
            NodeType::Output,
            NodeType::Hidden,
        ];
        for (expected, node_type) in types.iter().enumerate() {
            let id = nodes.register(*node_type, ActivationType::Identity);
            assert_eq!(id, expected);
            assert_eq!(nodes[id].node_type(), *node_type);
        }
        assert_eq!(nodes.len(), types.len());
        assert!(nodes.get(types.len()).is_none());
    }

    #[test]
    fn connection_ids_strictly_increase() {
        let mut connections = ConnectionRegistry::new();
        let mut last = None;
        for input in 0..5 {
            for output in 0..5 {
                let id = connections.register(input, output);
                if let Some(last) = last {
                    assert!(id > last);
                }
                last = Some(id);
            }
        }
        assert_eq!(connections.len(), 25);
    }

    #[test]
    fn connection_pairs_are_never_reissued() {
        let mut connections = ConnectionRegistry::new();
        let first = connections.register(3, 5);
        connections.register(5, 3);
        connections.register(3, 3);
        assert_eq!(connections.register(3, 5), first);
        assert_eq!(connections.find(3, 5), Some(first));
        assert_eq!(connections.find(4, 5), None);
        assert_eq!(connections[first].endpoints(), (3, 5));
        assert_eq!(connections.len(), 3);
    }
}
