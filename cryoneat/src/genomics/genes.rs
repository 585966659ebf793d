use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Genes are the principal components of genomes.
/// Each is a genome's own copy of a registered
/// connection, and becomes a network connection
/// in the genome's phenotype unless it is frozen.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    id: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f32,
    frozen: bool,
}

impl Gene {
    /// Returns a new _unfrozen_ gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    /// ```
    pub fn new(id: Innovation, input: Innovation, output: Innovation, weight: f32) -> Gene {
        Gene {
            id,
            input,
            output,
            weight,
            frozen: false,
        }
    }

    /// Perturbs the gene's weight, either by resetting it
    /// (with equal chance) to a value drawn from
    /// `[-weight_bound, 1.5 ⨯ weight_bound)` or by adding a
    /// delta drawn from `[-1, 1.5)`. The result is clamped
    /// to `±weight_bound`.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let mut gene = Gene::new(42, 3, 9, 2.0);
    /// let mut rng = rand::thread_rng();
    /// for _ in 0..100 {
    ///     gene.perturb_weight(8.0, &mut rng);
    ///     assert!(gene.weight().abs() <= 8.0);
    /// }
    /// ```
    pub fn perturb_weight<R: Rng + ?Sized>(&mut self, weight_bound: f32, rng: &mut R) {
        if rng.gen::<bool>() {
            self.weight = rng.gen::<f32>() * 2.5 * weight_bound - weight_bound;
        } else {
            self.weight += rng.gen::<f32>() * 2.5 - 1.0;
        }
        self.weight = self.weight.clamp(-weight_bound, weight_bound);
    }

    /// Returns the gene's innovation number, which is
    /// that of the connection it expresses.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.innovation(), 42);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the gene's input node's innovation number.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.input(), 3);
    /// ```
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Returns the gene's output node's innovation number.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.output(), 9);
    /// ```
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the gene's input and output's innovation numbers.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the gene's weight.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let mut gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// gene.set_weight(-5.0);
    ///
    /// assert_eq!(gene.weight(), -5.0);
    /// ```
    pub fn set_weight(&mut self, w: f32) {
        self.weight = w;
    }

    /// Returns whether the gene is frozen. Frozen genes
    /// are kept in the genome but are not expressed
    /// in its phenotype.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.frozen(), false);
    /// ```
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Sets the gene's freeze status.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::Gene;
    ///
    /// let mut gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// gene.set_frozen(true);
    ///
    /// assert_eq!(gene.frozen(), true);
    /// ```
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Returns whether the gene connects a node to itself.
    pub fn is_self_loop(&self) -> bool {
        self.input == self.output
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.frozen { "(" } else { "" },
            self.id,
            self.input,
            self.output,
            self.weight,
            if self.frozen { ")" } else { "" },
        )
    }
}
