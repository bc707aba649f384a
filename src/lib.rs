//! # genoscan
//!
//! Streaming readers and summary statistics for the four everyday flat-text
//! bioinformatics formats: FASTA, FASTQ, SAM and VCF.
//!
//! Readers yield typed records lazily in a single forward pass, expose the
//! file header where the format has one, and fail fast with the offending
//! line number on malformed input. Analyzers consume a reader once and answer
//! count, region, flag and quality queries.
//!
//! ## Features
//!
//! - **One engine, four formats**: a generic line reader with a pluggable
//!   per-format parser
//! - **Headers**: `@HD`/`@SQ`/`@RG`/`@PG` groups for SAM, meta-lines and
//!   samples for VCF
//! - **Compression**: `.gz` and `.bgz` inputs are decompressed transparently
//! - **Statistics**: length and GC summaries, per-base quality and
//!   composition, coverage, per-chromosome tallies, genotype lookup
//! - **Export**: every summary serializes to JSON
//!
//! ## Example
//!
//! ```rust,no_run
//! use genoscan::{GenomicDataReader, Reader, SamAnalyzer, SamReader};
//!
//! let mut reader = SamReader::open_path("sample.sam").unwrap();
//! println!("reference: {}", reader.get_reference_genome());
//!
//! let analyzer = SamAnalyzer::analyze(&mut reader).unwrap();
//! reader.close();
//!
//! for (chrom, count) in analyzer.chromosome_counts() {
//!     println!("{chrom}\t{count}");
//! }
//! let depth = analyzer.calculate_coverage("chr1");
//! println!("chr1:100 depth {}", depth.get(&100).copied().unwrap_or(0));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Record and header value types
//! - [`parsing`]: The line engine and the FASTA/FASTQ/SAM/VCF readers
//! - [`analysis`]: Analyzers and their serializable summaries
//! - [`config`]: Reader configuration
//! - [`error`]: The crate error type

pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use analysis::{
    AlignmentFilter, FastaAnalyzer, FastqAnalyzer, SamAnalyzer, VariantFilter, VcfAnalyzer,
};
pub use config::ReaderConfig;
pub use core::alignment::{AlignmentRecord, Cigar, CigarKind, CigarOp, Flags};
pub use core::header::{SamHeader, VcfHeader};
pub use core::sequence::{ReadRecord, SequenceRecord};
pub use core::variant::{Genotype, VariantRecord, VariantType};
pub use error::{Error, Result};
pub use parsing::fasta::FastaReader;
pub use parsing::fastq::FastqReader;
pub use parsing::sam::SamReader;
pub use parsing::vcf::VcfReader;
pub use parsing::{GenomicDataReader, Reader, ReaderState, SequenceReader, Source};
pub use utils::validation::Alphabet;
