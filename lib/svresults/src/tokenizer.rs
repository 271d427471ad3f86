//! A push tokenizer for separated-values records.
//!
//! Bytes are fed in chunks of any size with [`SvTokenizer::feed`] and complete records are pulled with
//! [`SvTokenizer::next_event`]. A record, a field or a quoted region might be split across any number of chunks.
//!
//! ```
//! use svresults::QueryResultsFormat;
//! use svresults::tokenizer::{SvEvent, SvTokenizer};
//!
//! let mut tokenizer = SvTokenizer::new(QueryResultsFormat::Csv);
//! tokenizer.feed(b"x,y\r\n\"a,")?;
//! tokenizer.feed(b"b\",c\r\n")?;
//! tokenizer.end()?;
//! let Some(SvEvent::Header(header)) = tokenizer.next_event() else {
//!     unreachable!()
//! };
//! assert_eq!(header.fields().collect::<Vec<_>>(), ["x", "y"]);
//! let Some(SvEvent::Row(row)) = tokenizer.next_event() else {
//!     unreachable!()
//! };
//! assert_eq!(row.fields().collect::<Vec<_>>(), ["a,b", "c"]);
//! assert!(tokenizer.next_event().is_none());
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::error::{QueryResultsParseError, QueryResultsSyntaxError, TextPosition};
use crate::format::{Escaping, QueryResultsFormat};
use memchr::{memchr, memchr3};
use std::collections::VecDeque;
use std::io;
use std::ops::Range;

/// Default maximal size of a single record in bytes.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 4096 * 4096;

/// A complete record emitted by the [`SvTokenizer`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SvEvent {
    /// The first record of the input.
    Header(SvRecord),
    /// Any later record.
    Row(SvRecord),
}

impl SvEvent {
    #[inline]
    pub fn record(&self) -> &SvRecord {
        match self {
            Self::Header(record) | Self::Row(record) => record,
        }
    }

    #[inline]
    pub fn into_record(self) -> SvRecord {
        match self {
            Self::Header(record) | Self::Row(record) => record,
        }
    }
}

/// The fields of one record, with quotes removed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SvRecord {
    data: String,
    ends: Vec<usize>,
    position: Range<TextPosition>,
}

impl SvRecord {
    /// Number of fields. It is always at least 1: an empty line is a record with a single empty field.
    #[inline]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// The field at the given index.
    pub fn field(&self, index: usize) -> Option<&str> {
        let end = *self.ends.get(index)?;
        let start = if index == 0 { 0 } else { self.ends[index - 1] };
        self.data.get(start..end)
    }

    /// Iterates on the fields in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        (0..self.ends.len()).filter_map(|i| self.field(i))
    }

    /// Is it a single empty field i.e. an empty line?
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.data.is_empty() && self.ends.len() == 1
    }

    /// Location of the record in the input, the end of line excluded.
    #[inline]
    pub fn position(&self) -> Range<TextPosition> {
        self.position.clone()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
    AfterQuoted,
    AfterCr,
}

/// Incremental tokenizer for CSV and TSV.
///
/// In CSV fields might be enclosed in `"` with `""` standing for a single quote.
/// In TSV fields are never quoted: `"` is a byte like any other.
/// Records end with LF, CR or CRLF.
///
/// Empty lines after a non-empty header are only emitted once a later non-empty record is read:
/// the empty lines at the end of the input are dropped.
///
/// An error is definitive: the tokenizer returns it again on every later call.
pub struct SvTokenizer {
    separator: u8,
    quoting: bool,
    lenient: bool,
    max_record_size: usize,
    state: State,
    in_record: bool,
    record: Vec<u8>,
    ends: Vec<usize>,
    record_start: TextPosition,
    position: TextPosition,
    last_is_cr: bool,
    header_seen: bool,
    header_is_blank: bool,
    blank_lines: Vec<TextPosition>,
    is_ending: bool,
    events: VecDeque<SvEvent>,
    error: Option<QueryResultsParseError>,
}

impl SvTokenizer {
    pub fn new(format: QueryResultsFormat) -> Self {
        let descriptor = format.descriptor();
        Self {
            separator: descriptor.separator,
            quoting: descriptor.escaping == Escaping::Csv,
            lenient: false,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            state: State::FieldStart,
            in_record: false,
            record: Vec::new(),
            ends: Vec::new(),
            record_start: TextPosition::default(),
            position: TextPosition::default(),
            last_is_cr: false,
            header_seen: false,
            header_is_blank: false,
            blank_lines: Vec::new(),
            is_ending: false,
            events: VecDeque::new(),
            error: None,
        }
    }

    /// Sets the maximal size of a record in bytes, separators and quotes included.
    ///
    /// Reaching it fails with an [`io::ErrorKind::OutOfMemory`] error.
    #[inline]
    pub fn with_max_record_size(mut self, max_record_size: usize) -> Self {
        self.max_record_size = max_record_size;
        self
    }

    /// Keeps stray quotes as data instead of failing.
    #[inline]
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Feeds the next chunk of input.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), QueryResultsParseError> {
        if let Some(error) = &self.error {
            return Err(error.duplicate());
        }
        if self.is_ending {
            return Err(QueryResultsSyntaxError::msg("Data fed after the end of the input").into());
        }
        let result = self.process(chunk);
        self.fail_on_error(result)
    }

    /// Marks the end of the input. A last record without end of line is emitted.
    pub fn end(&mut self) -> Result<(), QueryResultsParseError> {
        if let Some(error) = &self.error {
            return Err(error.duplicate());
        }
        if self.is_ending {
            return Ok(());
        }
        self.is_ending = true;
        let result = if !self.in_record {
            Ok(())
        } else if self.state == State::Quoted {
            Err(QueryResultsSyntaxError::located_message(
                "Unterminated quoted field at the end of the input",
                self.record_start..self.position,
            )
            .into())
        } else {
            self.end_record(false)
        };
        if !self.blank_lines.is_empty() {
            tracing::debug!(
                lines = self.blank_lines.len(),
                "Ignoring the empty lines at the end of the input"
            );
            self.blank_lines.clear();
        }
        self.fail_on_error(result)
    }

    /// Pops the next complete record.
    #[inline]
    pub fn next_event(&mut self) -> Option<SvEvent> {
        self.events.pop_front()
    }

    /// Has the header been read?
    #[inline]
    pub fn is_header_seen(&self) -> bool {
        self.header_seen
    }

    /// Is the input ended and all the records pulled?
    #[inline]
    pub fn is_end(&self) -> bool {
        self.is_ending && self.events.is_empty()
    }

    /// The current position in the input.
    #[inline]
    pub fn position(&self) -> TextPosition {
        self.position
    }

    fn fail_on_error(
        &mut self,
        result: Result<(), QueryResultsParseError>,
    ) -> Result<(), QueryResultsParseError> {
        if let Err(error) = &result {
            self.error = Some(error.duplicate());
            self.record.clear();
            self.ends.clear();
            self.blank_lines.clear();
        }
        result
    }

    fn process(&mut self, chunk: &[u8]) -> Result<(), QueryResultsParseError> {
        let mut i = 0;
        while let Some(&b) = chunk.get(i) {
            match self.state {
                State::AfterCr => {
                    self.state = State::FieldStart;
                    if b == b'\n' {
                        self.advance(b"\n");
                        self.record_start = self.position;
                        i += 1;
                    }
                }
                State::FieldStart if self.quoting && b == b'"' => {
                    self.in_record = true;
                    self.advance(b"\"");
                    self.state = State::Quoted;
                    i += 1;
                }
                State::FieldStart | State::Unquoted => {
                    self.in_record = true;
                    let rest = &chunk[i..];
                    let end = memchr3(self.separator, b'\r', b'\n', rest).unwrap_or(rest.len());
                    let data = &rest[..end];
                    if self.quoting && !self.lenient {
                        if let Some(quote) = memchr(b'"', data) {
                            self.advance(&data[..quote]);
                            return Err(self.error_at_current_byte(
                                "Unexpected '\"' inside of an unquoted field",
                            ));
                        }
                    }
                    self.push_data(data)?;
                    self.advance(data);
                    i += end;
                    self.state = State::Unquoted;
                    if let Some(&terminator) = rest.get(end) {
                        self.end_of_field(terminator)?;
                        i += 1;
                    }
                }
                State::Quoted => {
                    let rest = &chunk[i..];
                    if let Some(quote) = memchr(b'"', rest) {
                        self.push_data(&rest[..quote])?;
                        self.advance(&rest[..=quote]);
                        self.state = State::QuoteInQuoted;
                        i += quote + 1;
                    } else {
                        self.push_data(rest)?;
                        self.advance(rest);
                        i = chunk.len();
                    }
                }
                State::QuoteInQuoted => {
                    if b == b'"' {
                        self.push_data(b"\"")?;
                        self.advance(b"\"");
                        self.state = State::Quoted;
                        i += 1;
                    } else {
                        self.state = State::AfterQuoted;
                    }
                }
                State::AfterQuoted => {
                    if b == self.separator || b == b'\r' || b == b'\n' {
                        self.end_of_field(b)?;
                        i += 1;
                    } else if self.lenient {
                        self.state = State::Unquoted;
                    } else {
                        return Err(self.error_at_current_byte(
                            "Unexpected character after the closing quote of a field",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Consumes a separator or an end of line.
    fn end_of_field(&mut self, terminator: u8) -> Result<(), QueryResultsParseError> {
        if terminator == self.separator {
            self.check_record_size(1)?;
            self.ends.push(self.record.len());
            self.advance(&[terminator]);
            self.state = State::FieldStart;
            return Ok(());
        }
        let blank_line =
            self.state == State::Unquoted && self.ends.is_empty() && self.record.is_empty();
        self.end_record(blank_line)?;
        self.advance(&[terminator]);
        self.record_start = self.position;
        self.state = if terminator == b'\r' {
            State::AfterCr
        } else {
            State::FieldStart
        };
        Ok(())
    }

    fn end_record(&mut self, blank_line: bool) -> Result<(), QueryResultsParseError> {
        self.ends.push(self.record.len());
        let position = self.record_start..self.position;
        let data = match String::from_utf8(std::mem::take(&mut self.record)) {
            Ok(data) => data,
            Err(error) => {
                return Err(QueryResultsSyntaxError::utf8(error.utf8_error(), position).into());
            }
        };
        let record = SvRecord {
            data,
            ends: std::mem::take(&mut self.ends),
            position,
        };
        self.in_record = false;
        if !self.header_seen {
            self.header_seen = true;
            self.header_is_blank = record.is_blank();
            self.events.push_back(SvEvent::Header(record));
        } else if blank_line && !self.header_is_blank {
            // Pending empty lines are bounded like the bytes of a record
            if self.blank_lines.len() >= self.max_record_size {
                return Err(io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    format!(
                        "Reached the maximal number of {} consecutive empty lines",
                        self.max_record_size
                    ),
                )
                .into());
            }
            self.blank_lines.push(record.position.start);
        } else {
            let blank_lines = self.blank_lines.drain(..).map(|start| SvRecord {
                data: String::new(),
                ends: vec![0],
                position: start..start,
            });
            self.events.extend(blank_lines.map(SvEvent::Row));
            self.events.push_back(SvEvent::Row(record));
        }
        Ok(())
    }

    fn push_data(&mut self, data: &[u8]) -> io::Result<()> {
        self.check_record_size(data.len())?;
        self.record.extend_from_slice(data);
        Ok(())
    }

    /// Fails if the current record would go over the maximal size with `extra` more bytes.
    fn check_record_size(&self, extra: usize) -> io::Result<()> {
        let consumed = usize::try_from(self.position.offset - self.record_start.offset)
            .unwrap_or(usize::MAX)
            .saturating_add(extra);
        if consumed > self.max_record_size {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!(
                    "Reached the maximal record size of {} bytes",
                    self.max_record_size
                ),
            ));
        }
        Ok(())
    }

    fn advance(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.position.offset += 1;
            match b {
                b'\n' if self.last_is_cr => (),
                b'\r' | b'\n' => {
                    self.position.line += 1;
                    self.position.column = 0;
                }
                // UTF-8 continuation bytes do not start a new code point
                b if b & 0xC0 == 0x80 => (),
                _ => self.position.column += 1,
            }
            self.last_is_cr = b == b'\r';
        }
    }

    fn error_at_current_byte(&self, msg: &str) -> QueryResultsParseError {
        let start = self.position;
        let end = TextPosition {
            line: start.line,
            column: start.column + 1,
            offset: start.offset + 1,
        };
        QueryResultsSyntaxError::located_message(msg, start..end).into()
    }
}
