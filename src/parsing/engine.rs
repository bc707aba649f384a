//! Generic line-scanning engine shared by every format reader.
//!
//! [`LineReader`] owns the text source and the reader lifecycle
//! (Unopened -> Open -> Closed). Format knowledge lives entirely in a
//! [`RecordParser`] strategy: the engine feeds it header lines when the
//! source is opened, then hands every following line to
//! [`RecordParser::parse_line`] and assembles fragments into records with
//! [`RecordParser::push`].

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::utils::validation::{check_quality_offset, check_record_limit, is_gzipped};

/// Lifecycle of a reader. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Unopened,
    Open,
    Closed,
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unopened => write!(f, "unopened"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Where a reader pulls its text from
pub enum Source {
    /// A file on disk, gzip/bgzip compressed if the name ends in `.gz`/`.bgz`
    Path(PathBuf),
    /// Any buffered byte stream
    Stream(Box<dyn BufRead + Send>),
}

impl Source {
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    pub fn stream<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self::Stream(Box::new(reader))
    }

    fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Stream(_) => "<stream>".to_string(),
        }
    }
}

/// Open a file, decompressing gzip/bgzip by extension
fn open_path(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({})", self.label())
    }
}

/// Per-format parsing strategy plugged into a [`LineReader`].
pub trait RecordParser {
    /// What a single line decodes to
    type Fragment;
    /// What complete records look like
    type Record;

    /// Whether `line`, met before the first record, belongs to the header
    fn is_header_line(&self, _line: &str) -> bool {
        false
    }

    fn parse_header_line(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }

    /// Called once after the last header line, even if there were none
    fn finish_header(&mut self) -> Result<()> {
        Ok(())
    }

    /// Interpret one raw line (no trailing newline) without changing parser
    /// state. `Ok(None)` means the line carries nothing.
    fn parse_line(&self, line: &str) -> Result<Option<Self::Fragment>>;

    /// Feed a fragment; returns a record once one is complete
    fn push(&mut self, fragment: Self::Fragment) -> Result<Option<Self::Record>>;

    /// Flush whatever is buffered at end of input
    fn finish(&mut self) -> Result<Option<Self::Record>> {
        Ok(None)
    }
}

/// Line-oriented reader driving a [`RecordParser`].
pub struct LineReader<P> {
    source: Option<Source>,
    reader: Option<Box<dyn BufRead + Send>>,
    label: String,
    state: ReaderState,
    parser: P,
    config: ReaderConfig,
    line_number: usize,
    pending: Option<String>,
    records_read: usize,
    exhausted: bool,
}

impl<P: RecordParser> LineReader<P> {
    pub fn new(source: Source, parser: P, config: ReaderConfig) -> Self {
        Self {
            label: source.label(),
            source: Some(source),
            reader: None,
            state: ReaderState::Unopened,
            parser,
            config,
            line_number: 0,
            pending: None,
            records_read: 0,
            exhausted: false,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Number of the last line read, 1-based (0 before any line)
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// True once the source has been fully consumed, failed, or closed
    pub fn is_exhausted(&self) -> bool {
        self.exhausted || self.state == ReaderState::Closed
    }

    /// Open the source and consume the header.
    ///
    /// Opening an open reader does nothing. A header error closes the reader.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpen` for a closed reader, `Error::InvalidConfig`
    /// for a bad config, `Error::Io` if the source cannot be opened, or
    /// `Error::InvalidFormat` if the header is malformed.
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            ReaderState::Open => return Ok(()),
            ReaderState::Closed => return Err(Error::NotOpen(ReaderState::Closed)),
            ReaderState::Unopened => {}
        }

        check_quality_offset(self.config.quality_offset)?;

        // A path that fails to open stays in place so open can be retried
        let reader = match self.source.take() {
            Some(Source::Path(path)) => match open_path(&path) {
                Ok(reader) => reader,
                Err(e) => {
                    self.source = Some(Source::Path(path));
                    return Err(e);
                }
            },
            Some(Source::Stream(reader)) => reader,
            None => return Err(Error::NotOpen(ReaderState::Unopened)),
        };
        self.reader = Some(reader);
        self.state = ReaderState::Open;
        debug!(source = %self.label, "Opened reader");

        if let Err(e) = self.read_header() {
            self.close();
            return Err(e);
        }
        Ok(())
    }

    fn read_header(&mut self) -> Result<()> {
        while let Some(line) = self.next_line()? {
            if self.parser.is_header_line(&line) {
                let result = self.parser.parse_header_line(&line);
                result.map_err(|e| self.locate(e))?;
            } else {
                self.pending = Some(line);
                break;
            }
        }
        let result = self.parser.finish_header();
        result.map_err(|e| self.locate(e))?;

        debug!(
            source = %self.label,
            header_lines = self.line_number - usize::from(self.pending.is_some()),
            "Parsed header"
        );
        Ok(())
    }

    /// Release the source. Idempotent; a closed reader cannot be reopened.
    pub fn close(&mut self) {
        if self.state != ReaderState::Closed {
            debug!(
                source = %self.label,
                records = self.records_read,
                "Closed reader"
            );
        }
        self.source = None;
        self.reader = None;
        self.pending = None;
        self.state = ReaderState::Closed;
    }

    /// Lazy single pass over the remaining records.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpen` unless the reader is open.
    pub fn records(&mut self) -> Result<Records<'_, P>> {
        match self.state {
            ReaderState::Open => Ok(Records { reader: self }),
            state => Err(Error::NotOpen(state)),
        }
    }

    /// Next complete record. The first error exhausts the reader.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFormat`, `Error::Io` or
    /// `Error::TooManyRecords`.
    pub fn next_record(&mut self) -> Result<Option<P::Record>> {
        if self.state != ReaderState::Open || self.exhausted {
            return Ok(None);
        }

        let record = match self.advance() {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };

        if let Some(message) = check_record_limit(self.records_read, self.config.max_records) {
            warn!(source = %self.label, "{message}");
            self.exhausted = true;
            return Err(Error::TooManyRecords(self.records_read + 1));
        }
        self.records_read += 1;
        Ok(Some(record))
    }

    fn advance(&mut self) -> Result<Option<P::Record>> {
        loop {
            let Some(line) = self.next_line()? else {
                self.exhausted = true;
                let result = self.parser.finish();
                return result.map_err(|e| self.locate(e));
            };

            let fragment = self.parser.parse_line(&line).map_err(|e| self.locate(e))?;
            if let Some(fragment) = fragment {
                let result = self.parser.push(fragment);
                if let Some(record) = result.map_err(|e| self.locate(e))? {
                    return Ok(Some(record));
                }
            }
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut buf = Vec::new();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| Error::format("Line is not valid UTF-8").at_line(self.line_number))
    }

    fn locate(&self, err: Error) -> Error {
        if self.line_number == 0 {
            err
        } else {
            err.at_line(self.line_number)
        }
    }
}

impl<P> fmt::Debug for LineReader<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineReader")
            .field("source", &self.label)
            .field("state", &self.state)
            .field("line_number", &self.line_number)
            .field("records_read", &self.records_read)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`LineReader::records`]. Not restartable.
pub struct Records<'a, P: RecordParser> {
    reader: &'a mut LineReader<P>,
}

impl<P: RecordParser> Iterator for Records<'_, P> {
    type Item = Result<P::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record().transpose()
    }
}

impl<P: RecordParser> FusedIterator for Records<'_, P> {}
