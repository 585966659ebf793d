use serde::{Deserialize, Serialize};

use std::fmt;

/// An ActivationType represents the type
/// of activation function the node's network
/// equivalent will use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    // 1 / (1 + exp(-x))
    Sigmoid,
    // 1 / (1 + exp(-4.924273x))
    SteepenedSigmoid,
    // 0   if x < 0
    // x   if x ≥ 0
    ReLU,
    // x
    Identity,
}

impl ActivationType {
    /// Applies the activation function to `x`.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::Identity.apply(-3.5), -3.5);
    /// assert_eq!(ActivationType::ReLU.apply(-3.5), 0.0);
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::SteepenedSigmoid.apply(0.0), 0.5);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationType::SteepenedSigmoid => 1.0 / (1.0 + (-4.924273 * x).exp()),
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Identity => x,
        }
    }
}

/// A NodeType indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes.
    Sensor,
    /// Input nodes with a constant activation of 1.
    Bias,
    /// Hidden nodes.
    Hidden,
    /// Output nodes.
    Output,
}

impl NodeType {
    /// Returns whether the node feeds values into
    /// a network from the outside, i.e. whether it
    /// is a [`Sensor`] or a [`Bias`].
    ///
    /// [`Sensor`]: NodeType::Sensor
    /// [`Bias`]: NodeType::Bias
    pub fn is_input(self) -> bool {
        matches!(self, NodeType::Sensor | NodeType::Bias)
    }
}

/// The structural facts about a registered node.
/// Once registered a record never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    node_type: NodeType,
    activation_type: ActivationType,
}

impl NodeRecord {
    /// Returns a new record with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{ActivationType, NodeRecord, NodeType};
    ///
    /// let record = NodeRecord::new(NodeType::Hidden, ActivationType::ReLU);
    /// assert_eq!(record.node_type(), NodeType::Hidden);
    /// assert_eq!(record.activation_type(), ActivationType::ReLU);
    /// ```
    pub fn new(node_type: NodeType, activation_type: ActivationType) -> NodeRecord {
        NodeRecord {
            node_type,
            activation_type,
        }
    }

    /// Returns the node's node type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the node's activation type.
    pub fn activation_type(&self) -> ActivationType {
        self.activation_type
    }

    /// Shorthand for `self.node_type().is_input()`.
    pub fn is_input(&self) -> bool {
        self.node_type.is_input()
    }
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.node_type, self.activation_type)
    }
}
