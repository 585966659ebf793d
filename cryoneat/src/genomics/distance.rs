use crate::genomics::{GeneticConfig, Genome};

use std::cmp::Ordering;

impl Genome {
    /// Calculates the _genetic distance_ between `first` and `second`,
    /// weighting gene differences as specified in `config`.
    ///
    /// Genes are matched by innovation number. Unmatched genes
    /// within the range of the other genome's innovation numbers
    /// are _disjoint_, the rest are _excess_. Once either genome
    /// reaches [the normalization threshold] in gene count, the
    /// disjoint and excess counts are divided by the larger
    /// genome's gene count.
    ///
    /// Genomes with no genes in common are infinitely distant,
    /// unless both are empty.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{GeneticConfig, Genome};
    ///
    /// // Completely arbitrary quantities.
    /// const EXCESS_FACTOR: f32 = 1.5;
    /// const DISJOINT_FACTOR: f32 = 0.5;
    /// const WEIGHT_FACTOR: f32 = 0.25;
    ///
    /// let config = GeneticConfig {
    ///     excess_gene_factor: EXCESS_FACTOR,
    ///     disjoint_gene_factor: DISJOINT_FACTOR,
    ///     common_weight_factor: WEIGHT_FACTOR,
    ///     normalization_threshold: 20,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome1 = Genome::new();
    /// let mut genome2 = Genome::new();
    ///
    /// // Common gene, weight difference of 2.0.
    /// genome1.add_gene(0, 0, 2, 1.0);
    /// genome2.add_gene(0, 0, 2, -1.0);
    ///
    /// // Disjoint genes.
    /// genome1.add_gene(1, 1, 2, 3.0);
    /// genome2.add_gene(2, 1, 3, 1.0);
    ///
    /// // Common gene, weight_difference of 0.0.
    /// genome1.add_gene(3, 2, 3, 1.0);
    /// genome2.add_gene(3, 2, 3, 1.0);
    ///
    /// // Excess gene.
    /// genome1.add_gene(4, 2, 2, 3.0);
    ///
    /// assert_eq!(
    ///     Genome::genetic_distance(&genome1, &genome2, &config),
    ///     DISJOINT_FACTOR * (1 + 1) as f32 +
    ///         EXCESS_FACTOR * (1) as f32 +
    ///         WEIGHT_FACTOR * (2.0 + 0.0) / 2.0  // Divide by number of common genes to get average.
    /// );
    /// ```
    ///
    /// [the normalization threshold]: GeneticConfig::normalization_threshold
    pub fn genetic_distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f32 {
        if first.is_empty() && second.is_empty() {
            return 0.0;
        }

        let (a, b) = (first.gene_slice(), second.gene_slice());
        let (mut i, mut j) = (0, 0);
        let (mut common, mut disjoint) = (0usize, 0usize);
        let mut weight_difference = 0.0;
        while let (Some(x), Some(y)) = (a.get(i), b.get(j)) {
            match x.innovation().cmp(&y.innovation()) {
                Ordering::Equal => {
                    common += 1;
                    weight_difference += (x.weight() - y.weight()).abs();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    disjoint += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    disjoint += 1;
                    j += 1;
                }
            }
        }
        let excess = (a.len() - i) + (b.len() - j);

        if common == 0 {
            return f32::INFINITY;
        }

        let larger = a.len().max(b.len());
        let normalization = if larger >= config.normalization_threshold {
            larger as f32
        } else {
            1.0
        };

        config.excess_gene_factor * excess as f32 / normalization
            + config.disjoint_gene_factor * disjoint as f32 / normalization
            + config.common_weight_factor * weight_difference / common as f32
    }
}
