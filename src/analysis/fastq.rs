use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::{count_to_f64, mean};
use crate::core::sequence::ReadRecord;
use crate::error::Result;
use crate::parsing::fastq::FastqReader;
use crate::parsing::Reader;

/// Index into the per-position base tallies
const A: usize = 0;
const C: usize = 1;
const G: usize = 2;
const T: usize = 3;
const N: usize = 4;

fn base_index(base: u8) -> usize {
    match base.to_ascii_uppercase() {
        b'A' => A,
        b'C' => C,
        b'G' => G,
        b'T' => T,
        _ => N,
    }
}

/// Fractions of each base at one read position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseComposition {
    pub a: f64,
    pub c: f64,
    pub g: f64,
    pub t: f64,
    pub n: f64,
}

/// Per-position quality and composition tallies over FASTQ reads
///
/// Position `i` only counts reads longer than `i`, so shorter reads never
/// pull a later position's average down.
#[derive(Debug, Clone, Default)]
pub struct FastqAnalyzer {
    count: usize,
    total_bases: usize,
    quality_total: u64,
    /// Sum of scores at each position
    position_quality: Vec<u64>,
    /// Number of reads reaching each position
    position_depth: Vec<usize>,
    position_bases: Vec<[usize; 5]>,
    lengths: BTreeMap<usize, usize>,
}

/// Serializable snapshot of a [`FastqAnalyzer`], including the data behind
/// the per-base quality, composition and length plots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastqSummary {
    pub read_count: usize,
    pub total_bases: usize,
    pub average_length: f64,
    pub mean_quality: f64,
    pub per_base_quality: Vec<f64>,
    pub composition: Vec<BaseComposition>,
    pub length_distribution: BTreeMap<usize, usize>,
}

impl FastqAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume every remaining read of an open reader
    ///
    /// # Errors
    ///
    /// Returns the first error the reader yields.
    pub fn analyze(reader: &mut FastqReader) -> Result<Self> {
        let mut analyzer = Self::new();
        for read in reader.read()? {
            analyzer.add(&read?);
        }
        Ok(analyzer)
    }

    #[must_use]
    pub fn from_records<I>(reads: I) -> Self
    where
        I: IntoIterator<Item = ReadRecord>,
    {
        let mut analyzer = Self::new();
        for read in reads {
            analyzer.add(&read);
        }
        analyzer
    }

    pub fn add(&mut self, read: &ReadRecord) {
        let length = read.sequence.len();
        if self.position_depth.len() < length {
            self.position_depth.resize(length, 0);
            self.position_quality.resize(length, 0);
            self.position_bases.resize(length, [0; 5]);
        }

        for (i, (base, score)) in read.sequence.bytes().zip(&read.quality).enumerate() {
            self.position_depth[i] += 1;
            self.position_quality[i] += u64::from(*score);
            self.position_bases[i][base_index(base)] += 1;
            self.quality_total += u64::from(*score);
        }

        self.count += 1;
        self.total_bases += length;
        *self.lengths.entry(length).or_default() += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean read length, 0.0 with no reads
    pub fn average_length(&self) -> f64 {
        mean(count_to_f64(self.total_bases), self.count)
    }

    /// Mean Phred score over every base of every read
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_quality(&self) -> f64 {
        mean(self.quality_total as f64, self.total_bases)
    }

    /// Mean quality at each position, index 0 is the first base
    #[allow(clippy::cast_precision_loss)]
    pub fn per_base_quality(&self) -> Vec<f64> {
        self.position_quality
            .iter()
            .zip(&self.position_depth)
            .map(|(total, depth)| mean(*total as f64, *depth))
            .collect()
    }

    /// Base fractions at each position. Anything other than A/C/G/T counts as N.
    pub fn composition(&self) -> Vec<BaseComposition> {
        self.position_bases
            .iter()
            .zip(&self.position_depth)
            .map(|(bases, depth)| {
                let fraction = |i: usize| mean(count_to_f64(bases[i]), *depth);
                BaseComposition {
                    a: fraction(A),
                    c: fraction(C),
                    g: fraction(G),
                    t: fraction(T),
                    n: fraction(N),
                }
            })
            .collect()
    }

    /// Read length to number of reads, ordered by length
    pub fn length_distribution(&self) -> &BTreeMap<usize, usize> {
        &self.lengths
    }

    #[must_use]
    pub fn summary(&self) -> FastqSummary {
        FastqSummary {
            read_count: self.count,
            total_bases: self.total_bases,
            average_length: self.average_length(),
            mean_quality: self.mean_quality(),
            per_base_quality: self.per_base_quality(),
            composition: self.composition(),
            length_distribution: self.lengths.clone(),
        }
    }
}
