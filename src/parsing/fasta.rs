//! FASTA reader.
//!
//! Records start at a `>` header, parsed as a noodles FASTA definition: the id
//! runs to the first whitespace and the rest of the line is the description.
//! Whitespace inside sequence lines is dropped and the lines are joined.
//! Blank lines and `;` comment lines are ignored. Supports both uncompressed
//! and gzip/bgzip compressed files.

use std::io::BufRead;
use std::path::Path;

use noodles::fasta::record::Definition;

use crate::config::ReaderConfig;
use crate::core::sequence::SequenceRecord;
use crate::error::{Error, Result};
use crate::parsing::engine::{LineReader, RecordParser, Source};
use crate::parsing::{find_record, Reader, SequenceReader};
use crate::utils::validation::{is_valid_sequence, Alphabet};

/// One meaningful FASTA line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastaLine {
    Header { id: String, description: String },
    Sequence(String),
}

#[derive(Debug, Default)]
pub struct FastaParser {
    current: Option<SequenceRecord>,
}

impl FastaParser {
    fn take_current(&mut self) -> Result<Option<SequenceRecord>> {
        match self.current.take() {
            Some(record) if record.is_empty() => Err(Error::format(format!(
                "Record '{}' has no sequence",
                record.id
            ))),
            other => Ok(other),
        }
    }
}

/// Split header text (without the `>` or `@` marker) into id and description
///
/// # Errors
///
/// Returns `Error::InvalidFormat` if the header has no identifier.
pub fn parse_definition(header: &str) -> Result<(String, String)> {
    let definition: Definition = format!(">{}", header.trim())
        .parse()
        .map_err(|e| Error::format(format!("Invalid header '{header}': {e}")))?;

    let id = String::from_utf8_lossy(definition.name()).to_string();
    let description = definition
        .description()
        .map(|d| String::from_utf8_lossy(d).trim().to_string())
        .unwrap_or_default();
    Ok((id, description))
}

impl RecordParser for FastaParser {
    type Fragment = FastaLine;
    type Record = SequenceRecord;

    fn parse_line(&self, line: &str) -> Result<Option<FastaLine>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            return Ok(None);
        }

        if let Some(header) = line.strip_prefix('>') {
            let (id, description) = parse_definition(header)?;
            return Ok(Some(FastaLine::Header { id, description }));
        }

        Ok(Some(FastaLine::Sequence(line.split_whitespace().collect())))
    }

    fn push(&mut self, fragment: FastaLine) -> Result<Option<SequenceRecord>> {
        match fragment {
            FastaLine::Header { id, description } => {
                let finished = self.take_current()?;
                self.current = Some(SequenceRecord::new(id, description, String::new()));
                Ok(finished)
            }
            FastaLine::Sequence(chunk) => match self.current.as_mut() {
                Some(record) => {
                    record.sequence.push_str(&chunk);
                    Ok(None)
                }
                None => Err(Error::format("Sequence data before the first '>' header")),
            },
        }
    }

    fn finish(&mut self) -> Result<Option<SequenceRecord>> {
        self.take_current()
    }
}

#[derive(Debug)]
pub struct FastaReader {
    engine: LineReader<FastaParser>,
}

impl FastaReader {
    pub fn new(source: Source, config: ReaderConfig) -> Self {
        Self {
            engine: LineReader::new(source, FastaParser::default(), config),
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
        self.engine.config().alphabet.unwrap_or(Alphabet::Iupac)
    }
}

impl Reader for FastaReader {
    type Parser = FastaParser;

    fn engine(&self) -> &LineReader<FastaParser> {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut LineReader<FastaParser> {
        &mut self.engine
    }
}

impl SequenceReader for FastaReader {
    fn get_sequence(&mut self, id: &str) -> Result<SequenceRecord> {
        find_record(&mut self.engine, id, |record| record.id.as_str())
    }

    fn validate_sequence(&self, seq: &str) -> bool {
        is_valid_sequence(seq, self.alphabet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ReaderState;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn open(text: &str) -> FastaReader {
        let mut reader = FastaReader::from_reader(Cursor::new(text.as_bytes().to_vec()));
        reader.open().unwrap();
        reader
    }

    fn read_all(reader: &mut FastaReader) -> Result<Vec<SequenceRecord>> {
        reader.read()?.collect()
    }

    #[test]
    fn test_parse_multiline_records() {
        let mut reader = open(">chr1 description here\nACGTACGT\nACGT\n\n>chr2\nGGGG\n");
        let records = read_all(&mut reader).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "chr1");
        assert_eq!(records[0].description, "description here");
        assert_eq!(records[0].sequence, "ACGTACGTACGT");
        assert_eq!(records[1].id, "chr2");
        assert_eq!(records[1].description, "");
        assert_eq!(records[1].len(), 4);
    }

    #[test]
    fn test_whitespace_inside_sequence_lines() {
        let mut reader = open(">a\nAC GT\tAC\n>b\nACGTACGT\n");
        let records = read_all(&mut reader).unwrap();
        assert_eq!(records[0].sequence, "ACGTAC");
        assert_eq!(records[1].sequence, "ACGTACGT");

        let reader = open("");
        assert_eq!(
            reader.parse_line("  GG  CC ").unwrap(),
            Some(FastaLine::Sequence("GGCC".to_string()))
        );
    }

    #[test]
    fn test_parse_definition() {
        assert_eq!(
            parse_definition("chr1  Homo sapiens chromosome 1").unwrap(),
            ("chr1".to_string(), "Homo sapiens chromosome 1".to_string())
        );
        assert_eq!(
            parse_definition("chrM").unwrap(),
            ("chrM".to_string(), String::new())
        );
        assert!(parse_definition("").is_err());
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut reader = open("");
        assert!(read_all(&mut reader).unwrap().is_empty());
    }

    #[test]
    fn test_sequence_before_header_fails() {
        let mut reader = open("ACGT\n>chr1\nACGT\n");
        match read_all(&mut reader) {
            Err(Error::InvalidFormat { line, .. }) => assert_eq!(line, Some(1)),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_header_without_sequence_fails() {
        let mut reader = open(">chr1\n>chr2\nACGT\n");
        assert!(matches!(
            read_all(&mut reader),
            Err(Error::InvalidFormat { .. })
        ));

        let mut reader = open(">chr1\nACGT\n>chr2\n");
        let mut records = reader.read().unwrap();
        assert_eq!(records.next().unwrap().unwrap().id, "chr1");
        assert!(records.next().unwrap().is_err());
    }

    #[test]
    fn test_empty_identifier_fails() {
        let reader = open("");
        assert!(reader.parse_line(">  ").is_err());
        assert_eq!(
            reader.parse_line("> chr1 x").unwrap(),
            Some(FastaLine::Header {
                id: "chr1".to_string(),
                description: "x".to_string()
            })
        );
        assert_eq!(reader.parse_line("; comment").unwrap(), None);
    }

    #[test]
    fn test_get_sequence() {
        let mut reader = open(">a\nAC\n>b\nGT\n>c\nTT\n");
        let record = reader.get_sequence("b").unwrap();
        assert_eq!(record.sequence, "GT");

        // "a" was consumed on the way to "b"
        let missing = reader.get_sequence("a").unwrap_err();
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_validate_sequence() {
        let reader = open("");
        assert!(reader.validate_sequence("ACGTN"));
        assert!(reader.validate_sequence("MKVLAW*"));
        assert!(!reader.validate_sequence("ACGT1"));
        assert!(!reader.validate_sequence(""));

        let strict = FastaReader::new(
            Source::stream(Cursor::new(Vec::new())),
            ReaderConfig::default().with_alphabet(Alphabet::Dna),
        );
        assert!(!strict.validate_sequence("MKVL"));
    }

    #[test]
    fn test_read_before_open_fails() {
        let mut reader = FastaReader::from_reader(Cursor::new(b">a\nA\n".to_vec()));
        assert_eq!(reader.state(), ReaderState::Unopened);
        assert!(matches!(
            reader.read(),
            Err(Error::NotOpen(ReaderState::Unopened))
        ));
    }

    #[test]
    fn test_open_path_gzipped() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">chr1\nACGT\n>chr2\nGG\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut temp = NamedTempFile::with_suffix(".fa.gz").unwrap();
        temp.write_all(&compressed).unwrap();
        temp.flush().unwrap();

        let mut reader = FastaReader::open_path(temp.path()).unwrap();
        let records = read_all(&mut reader).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence, "GG");
    }
}
