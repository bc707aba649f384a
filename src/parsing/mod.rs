//! Streaming readers for FASTA, FASTQ, SAM and VCF text.
//!
//! Every reader is a thin wrapper around the shared [`LineReader`] engine
//! and one format strategy:
//!
//! | Reader | Strategy | Record | Capabilities |
//! |--------|----------|--------|--------------|
//! | [`FastaReader`] | `FastaParser` | `SequenceRecord` | [`Reader`], [`SequenceReader`] |
//! | [`FastqReader`] | `FastqParser` | `ReadRecord` | [`Reader`], [`SequenceReader`] |
//! | [`SamReader`] | `SamParser` | `AlignmentRecord` | [`Reader`], [`GenomicDataReader`] |
//! | [`VcfReader`] | `VcfParser` | `VariantRecord` | [`Reader`], [`GenomicDataReader`] |
//!
//! ## Example
//!
//! ```rust,no_run
//! use genoscan::parsing::{fasta::FastaReader, Reader};
//!
//! let mut reader = FastaReader::from_path("reference.fa");
//! reader.open().unwrap();
//! for record in reader.read().unwrap() {
//!     let record = record.unwrap();
//!     println!("{}\t{}", record.id, record.len());
//! }
//! reader.close();
//! ```
//!
//! [`FastaReader`]: fasta::FastaReader
//! [`FastqReader`]: fastq::FastqReader
//! [`SamReader`]: sam::SamReader
//! [`VcfReader`]: vcf::VcfReader

use std::str::FromStr;

use crate::core::contig::Contig;
use crate::error::{Error, Result};

pub mod engine;
pub mod fasta;
pub mod fastq;
pub mod sam;
pub mod vcf;

pub use engine::{LineReader, ReaderState, RecordParser, Records, Source};

/// Capabilities shared by every reader
pub trait Reader {
    type Parser: RecordParser;

    fn engine(&self) -> &LineReader<Self::Parser>;

    fn engine_mut(&mut self) -> &mut LineReader<Self::Parser>;

    /// Unopened -> Open. Parses the header for formats that have one.
    ///
    /// # Errors
    ///
    /// See [`LineReader::open`].
    fn open(&mut self) -> Result<()> {
        self.engine_mut().open()
    }

    /// Lazy single pass over the records that have not been read yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpen` unless the reader is open.
    fn read(&mut self) -> Result<Records<'_, Self::Parser>> {
        self.engine_mut().records()
    }

    /// Release the source. Idempotent.
    fn close(&mut self) {
        self.engine_mut().close();
    }

    fn state(&self) -> ReaderState {
        self.engine().state()
    }

    /// Interpret one raw line in the reader's current context
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFormat` if the line is malformed.
    fn parse_line(
        &self,
        line: &str,
    ) -> Result<Option<<Self::Parser as RecordParser>::Fragment>> {
        self.engine().parser().parse_line(line)
    }
}

/// Readers over FASTA/FASTQ sequences
pub trait SequenceReader: Reader {
    /// Scan forward for the first record with this id. Records passed over
    /// are consumed.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the stream ends first, or any read error.
    fn get_sequence(&mut self, id: &str) -> Result<<Self::Parser as RecordParser>::Record>;

    /// Check `seq` against the reader's alphabet. Never fails.
    fn validate_sequence(&self, seq: &str) -> bool;
}

/// Readers over coordinate-based data (SAM/VCF)
pub trait GenomicDataReader: Reader {
    /// Reference dictionary declared in the header
    fn contigs(&self) -> &[Contig];

    /// Distinct reference names: header declarations, then names seen in
    /// records so far, in first-seen order
    fn get_chromosomes(&self) -> Vec<&str>;

    /// Reference genome named in the header, empty if none
    fn get_reference_genome(&self) -> String;

    /// Length declared in the header
    fn get_chromosome_length(&self, chrom: &str) -> Option<u64> {
        self.contigs()
            .iter()
            .find(|c| c.name == chrom)
            .and_then(|c| c.length)
    }

    /// False for an unknown chromosome, a position <= 0, or a position past
    /// the declared length
    fn validate_coordinate(&self, chrom: &str, pos: i64) -> bool {
        match self.contigs().iter().find(|c| c.name == chrom) {
            Some(contig) => contig.contains_position(pos),
            None => pos > 0 && self.get_chromosomes().iter().any(|c| *c == chrom),
        }
    }
}

/// Drain records until one matches `id`
pub(crate) fn find_record<P, F>(engine: &mut LineReader<P>, id: &str, key: F) -> Result<P::Record>
where
    P: RecordParser,
    F: Fn(&P::Record) -> &str,
{
    for record in engine.records()? {
        let record = record?;
        if key(&record) == id {
            return Ok(record);
        }
    }
    Err(Error::NotFound(format!("No record with id '{id}'")))
}

/// Parse a numeric column, naming the column in the error
pub(crate) fn parse_field<T: FromStr>(value: &str, column: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::format(format!("Invalid {column} value '{value}'")))
}

/// Split a list column, treating `.` and the empty string as an empty list
pub(crate) fn split_list(value: &str, separator: char) -> Vec<String> {
    if value.is_empty() || value == "." {
        Vec::new()
    } else {
        value.split(separator).map(str::to_string).collect()
    }
}
