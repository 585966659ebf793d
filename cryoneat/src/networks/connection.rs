use std::fmt;

/// A weighted link between two nodes of a network,
/// addressed by their position in the network's
/// node arrays.
#[derive(Clone, Copy, PartialEq)]
pub(super) struct Connection {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
}

impl Connection {
    pub fn new(source: usize, target: usize, weight: f32) -> Connection {
        Connection {
            source,
            target,
            weight,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} {:.9}", self.source, self.target, self.weight)
    }
}
