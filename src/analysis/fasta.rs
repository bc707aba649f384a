use serde::{Deserialize, Serialize};

use crate::analysis::{count_to_f64, mean};
use crate::core::sequence::SequenceRecord;
use crate::error::Result;
use crate::parsing::fasta::FastaReader;
use crate::parsing::Reader;

/// Running totals over FASTA records
#[derive(Debug, Clone, Default)]
pub struct FastaAnalyzer {
    count: usize,
    total_bases: usize,
    gc_bases: usize,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

/// Serializable snapshot of a [`FastaAnalyzer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastaSummary {
    pub sequence_count: usize,
    pub total_bases: usize,
    pub average_length: f64,
    pub gc_content: f64,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl FastaAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume every remaining record of an open reader
    ///
    /// # Errors
    ///
    /// Returns the first error the reader yields.
    pub fn analyze(reader: &mut FastaReader) -> Result<Self> {
        let mut analyzer = Self::new();
        for record in reader.read()? {
            analyzer.add(&record?);
        }
        Ok(analyzer)
    }

    #[must_use]
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = SequenceRecord>,
    {
        let mut analyzer = Self::new();
        for record in records {
            analyzer.add(&record);
        }
        analyzer
    }

    pub fn add(&mut self, record: &SequenceRecord) {
        let length = record.len();
        self.count += 1;
        self.total_bases += length;
        self.gc_bases += record.gc_count();
        self.min_length = Some(self.min_length.map_or(length, |m| m.min(length)));
        self.max_length = Some(self.max_length.map_or(length, |m| m.max(length)));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total_bases(&self) -> usize {
        self.total_bases
    }

    /// Mean sequence length, 0.0 with no records
    pub fn average_length(&self) -> f64 {
        mean(count_to_f64(self.total_bases), self.count)
    }

    /// Fraction of G/C bases over all sequence, 0.0 with no bases
    pub fn gc_content(&self) -> f64 {
        mean(count_to_f64(self.gc_bases), self.total_bases)
    }

    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    #[must_use]
    pub fn summary(&self) -> FastaSummary {
        FastaSummary {
            sequence_count: self.count,
            total_bases: self.total_bases,
            average_length: self.average_length(),
            gc_content: self.gc_content(),
            min_length: self.min_length,
            max_length: self.max_length,
        }
    }
}
