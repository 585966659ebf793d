use crate::genomics::{Gene, GeneticConfig, Genome, MatingStyle};

use rand::Rng;

use std::cmp::Ordering;

impl Genome {
    /// Combines two genomes into a child genome, by a style
    /// chosen at random following the configured [mating weights].
    ///
    /// The child has no fitness, and never holds two genes
    /// between the same pair of nodes.
    ///
    /// # Panics
    ///
    /// Panics if every mating weight is zero, which
    /// [`GeneticConfig::validate`] rules out.
    ///
    /// # Examples
    /// ```
    /// use cryoneat::genomics::{GeneticConfig, Genome};
    ///
    /// let mut mother = Genome::new();
    /// mother.add_gene(0, 0, 2, 1.0);
    /// mother.add_gene(1, 1, 2, 1.0);
    /// mother.set_fitness(10.0);
    ///
    /// let mut father = Genome::new();
    /// father.add_gene(0, 0, 2, -1.0);
    /// father.add_gene(2, 0, 3, 1.0);
    /// father.set_fitness(1.0);
    ///
    /// let child = Genome::mate(&mother, &father, &GeneticConfig::default(), &mut rand::thread_rng());
    ///
    /// // Only the fitter parent's genes are inherited.
    /// let ids: Vec<_> = child.genes().map(|g| g.innovation()).collect();
    /// assert_eq!(ids, [0, 1]);
    /// ```
    ///
    /// [mating weights]: GeneticConfig::mating_weights
    pub fn mate<R: Rng + ?Sized>(
        mother: &Genome,
        father: &Genome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Genome {
        let style = config
            .mating_weights
            .choose(rng)
            .expect("mating weights are all zero");
        Genome::mate_with_style(style, mother, father, config, rng)
    }

    /// Combines two genomes into a child genome by the specified style.
    ///
    /// * [`MultiPoint`] and [`MultiPointAverage`] walk both parents'
    ///   genes in innovation order. Genes only the fitter parent has are
    ///   inherited, and genes only the weaker parent has are dropped.
    ///   Common genes are taken from either parent (the fitter one with
    ///   [some chance]), or get the average of both weights. A common
    ///   gene frozen in both parents is frozen; frozen in only one, it is
    ///   frozen with [a configured chance]. The mother counts as the
    ///   fitter parent on ties.
    /// * [`SinglePoint`] picks a crossover point over the genes of the
    ///   parent with fewer genes. Genes before the point come from the
    ///   larger parent and genes after it from the smaller; the common
    ///   gene at the point gets the average of both weights. Common genes
    ///   frozen in either parent are frozen.
    ///
    /// [`MultiPoint`]: MatingStyle::MultiPoint
    /// [`MultiPointAverage`]: MatingStyle::MultiPointAverage
    /// [`SinglePoint`]: MatingStyle::SinglePoint
    /// [some chance]: GeneticConfig::select_stronger_parent_chance
    /// [a configured chance]: GeneticConfig::freeze_from_frozen_parent_chance
    pub fn mate_with_style<R: Rng + ?Sized>(
        style: MatingStyle,
        mother: &Genome,
        father: &Genome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Genome {
        match style {
            MatingStyle::MultiPoint => multi_point(mother, father, false, config, rng),
            MatingStyle::MultiPointAverage => multi_point(mother, father, true, config, rng),
            MatingStyle::SinglePoint => single_point(mother, father, rng),
        }
    }

    // Adds the gene unless its endpoints are already taken.
    fn inherit(&mut self, gene: Gene) {
        if let Err(e) = self.insert_gene(gene) {
            log::trace!("dropped inherited gene: {}", e);
        }
    }
}

fn averaged(first: &Gene, second: &Gene) -> Gene {
    let mut gene = first.clone();
    gene.set_weight((first.weight() + second.weight()) / 2.0);
    gene
}

fn multi_point<R: Rng + ?Sized>(
    mother: &Genome,
    father: &Genome,
    average: bool,
    config: &GeneticConfig,
    rng: &mut R,
) -> Genome {
    let (stronger, weaker) = if father.fitness() > mother.fitness() {
        (father.gene_slice(), mother.gene_slice())
    } else {
        (mother.gene_slice(), father.gene_slice())
    };

    let mut child = Genome::new();
    let (mut s, mut w) = (0, 0);
    while let Some(strong) = stronger.get(s) {
        let weak = match weaker.get(w) {
            Some(weak) => weak,
            None => {
                child.inherit(strong.clone());
                s += 1;
                continue;
            }
        };
        match strong.innovation().cmp(&weak.innovation()) {
            Ordering::Equal => {
                let mut gene = if average {
                    averaged(strong, weak)
                } else if rng.gen::<f32>() < config.select_stronger_parent_chance {
                    strong.clone()
                } else {
                    weak.clone()
                };
                gene.set_frozen(match (strong.frozen(), weak.frozen()) {
                    (true, true) => true,
                    (false, false) => false,
                    _ => rng.gen::<f32>() < config.freeze_from_frozen_parent_chance,
                });
                child.inherit(gene);
                s += 1;
                w += 1;
            }
            Ordering::Less => {
                child.inherit(strong.clone());
                s += 1;
            }
            Ordering::Greater => w += 1,
        }
    }
    child
}

fn single_point<R: Rng + ?Sized>(mother: &Genome, father: &Genome, rng: &mut R) -> Genome {
    let (large, small) = if father.len() > mother.len() {
        (father.gene_slice(), mother.gene_slice())
    } else {
        (mother.gene_slice(), father.gene_slice())
    };
    let point = if small.is_empty() {
        0
    } else {
        rng.gen_range(0..small.len())
    };

    let mut child = Genome::new();
    let (mut l, mut s, mut counter) = (0, 0, 0);
    while let Some(short) = small.get(s) {
        let long = match large.get(l) {
            Some(long) => long,
            None => {
                child.inherit(short.clone());
                s += 1;
                continue;
            }
        };
        match long.innovation().cmp(&short.innovation()) {
            Ordering::Equal => {
                let mut gene = match counter.cmp(&point) {
                    Ordering::Less => long.clone(),
                    Ordering::Greater => short.clone(),
                    Ordering::Equal => averaged(long, short),
                };
                gene.set_frozen(long.frozen() || short.frozen());
                child.inherit(gene);
                l += 1;
                s += 1;
                counter += 1;
            }
            Ordering::Less if counter < point => {
                child.inherit(long.clone());
                l += 1;
                counter += 1;
            }
            Ordering::Less => {
                child.inherit(short.clone());
                s += 1;
            }
            Ordering::Greater => s += 1,
        }
    }
    child
}
