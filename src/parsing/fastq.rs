//! FASTQ reader.
//!
//! Each record is a block of exactly four lines:
//!
//! ```text
//! @read1 optional description
//! ACGT
//! +
//! IIII
//! ```
//!
//! Quality characters are decoded with the configured offset (Phred+33 by
//! default). Blank lines are only allowed between records.

use std::io::BufRead;
use std::path::Path;

use crate::config::ReaderConfig;
use crate::core::sequence::{decode_quality, ReadRecord};
use crate::error::{Error, Result};
use crate::parsing::engine::{LineReader, RecordParser, Source};
use crate::parsing::fasta::parse_definition;
use crate::parsing::{find_record, Reader, SequenceReader};
use crate::utils::validation::{is_valid_sequence, Alphabet, PHRED33};

/// Which line of the four-line block comes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Header,
    Sequence,
    Separator,
    Quality,
}

/// One line of a FASTQ block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastqLine {
    Header { id: String, description: String },
    Sequence(String),
    Separator,
    Quality(Vec<u8>),
}

#[derive(Debug)]
struct PartialRead {
    id: String,
    description: String,
    sequence: String,
}

#[derive(Debug)]
pub struct FastqParser {
    offset: u8,
    slot: Slot,
    partial: Option<PartialRead>,
}

impl FastqParser {
    pub fn new(offset: u8) -> Self {
        Self {
            offset,
            slot: Slot::Header,
            partial: None,
        }
    }

    fn out_of_order(&self) -> Error {
        Error::format(format!("FASTQ line out of order, expected {:?}", self.slot))
    }
}

impl Default for FastqParser {
    fn default() -> Self {
        Self::new(PHRED33)
    }
}

impl RecordParser for FastqParser {
    type Fragment = FastqLine;
    type Record = ReadRecord;

    fn parse_line(&self, line: &str) -> Result<Option<FastqLine>> {
        let line = line.trim();
        match self.slot {
            Slot::Header if line.is_empty() => Ok(None),
            Slot::Header => {
                let header = line.strip_prefix('@').ok_or_else(|| {
                    Error::format(format!("Expected '@' header line, found '{line}'"))
                })?;
                let (id, description) = parse_definition(header)?;
                Ok(Some(FastqLine::Header { id, description }))
            }
            Slot::Sequence => Ok(Some(FastqLine::Sequence(line.to_string()))),
            Slot::Separator if line.starts_with('+') => Ok(Some(FastqLine::Separator)),
            Slot::Separator => Err(Error::format(format!(
                "Expected '+' separator line, found '{line}'"
            ))),
            Slot::Quality => Ok(Some(FastqLine::Quality(decode_quality(line, self.offset)?))),
        }
    }

    fn push(&mut self, fragment: FastqLine) -> Result<Option<ReadRecord>> {
        match (self.slot, fragment) {
            (Slot::Header, FastqLine::Header { id, description }) => {
                self.partial = Some(PartialRead {
                    id,
                    description,
                    sequence: String::new(),
                });
                self.slot = Slot::Sequence;
                Ok(None)
            }
            (Slot::Sequence, FastqLine::Sequence(sequence)) => match self.partial.as_mut() {
                Some(partial) => {
                    partial.sequence = sequence;
                    self.slot = Slot::Separator;
                    Ok(None)
                }
                None => Err(self.out_of_order()),
            },
            (Slot::Separator, FastqLine::Separator) => {
                self.slot = Slot::Quality;
                Ok(None)
            }
            (Slot::Quality, FastqLine::Quality(quality)) => {
                let partial = self.partial.take().ok_or_else(|| self.out_of_order())?;
                self.slot = Slot::Header;
                ReadRecord::new(partial.id, partial.description, partial.sequence, quality).map(Some)
            }
            _ => Err(self.out_of_order()),
        }
    }

    fn finish(&mut self) -> Result<Option<ReadRecord>> {
        if self.slot == Slot::Header {
            return Ok(None);
        }
        let id = self.partial.as_ref().map_or("", |p| p.id.as_str());
        Err(Error::format(format!("Truncated FASTQ record '{id}'")))
    }
}

#[derive(Debug)]
pub struct FastqReader {
    engine: LineReader<FastqParser>,
}

impl FastqReader {
    pub fn new(source: Source, config: ReaderConfig) -> Self {
        let parser = FastqParser::new(config.quality_offset);
        Self {
            engine: LineReader::new(source, parser, config),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(Source::path(path), ReaderConfig::default())
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self::new(Source::stream(reader), ReaderConfig::default())
    }

    /// Create and open in one step
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be opened.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = Self::from_path(path);
        reader.open()?;
        Ok(reader)
    }

    pub fn alphabet(&self) -> Alphabet {
        self.engine.config().alphabet.unwrap_or(Alphabet::Dna)
    }

    pub fn quality_offset(&self) -> u8 {
        self.engine.config().quality_offset
    }
}

impl Reader for FastqReader {
    type Parser = FastqParser;

    fn engine(&self) -> &LineReader<FastqParser> {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut LineReader<FastqParser> {
        &mut self.engine
    }
}

impl SequenceReader for FastqReader {
    fn get_sequence(&mut self, id: &str) -> Result<ReadRecord> {
        find_record(&mut self.engine, id, |record| record.id.as_str())
    }

    fn validate_sequence(&self, seq: &str) -> bool {
        is_valid_sequence(seq, self.alphabet())
    }
}
