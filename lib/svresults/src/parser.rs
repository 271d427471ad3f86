use crate::error::{QueryResultsParseError, QueryResultsSyntaxError};
use crate::escape::decode_tsv_field;
use crate::format::QueryResultsFormat;
use crate::model::{Literal, Row, Value, Variable};
use crate::results::{ResultKind, ResultSet};
use crate::tokenizer::{DEFAULT_MAX_RECORD_SIZE, SvEvent, SvRecord, SvTokenizer};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::{self, Read};
#[cfg(feature = "async-tokio")]
use tokio::io::{AsyncRead, AsyncReadExt};

/// The size of the chunks read from the input by default.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;
const FALLBACK_BUFFER_CAPACITY: usize = 1024;

/// Parsers for the [SPARQL query results CSV and TSV formats](https://www.w3.org/TR/sparql11-results-csv-tsv/).
///
/// Neither format carries term types: a field is read as an IRI if it starts with `http://`
/// and has more characters after it, and as a simple literal otherwise.
///
/// ```
/// use svresults::{Literal, QueryResultsFormat, QueryResultsParser, Row, Value, Variable};
///
/// let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Csv)
///     .parse_read(b"x,y\r\nhttp://example.com/,test\r\n".as_slice());
/// assert_eq!(
///     parser.ensure_variables()?,
///     &[Variable::new("x")?, Variable::new("y")?]
/// );
/// assert_eq!(
///     parser.read_row()?,
///     Some(Row::from(vec![
///         Some(Value::uri("http://example.com/")),
///         Some(Literal::new_simple_literal("test").into())
///     ]))
/// );
/// assert_eq!(parser.read_row()?, None);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct QueryResultsParser {
    format: QueryResultsFormat,
    buffer_capacity: usize,
    max_record_size: usize,
    lenient: bool,
    strict_row_width: bool,
}

impl QueryResultsParser {
    /// Builds a parser for the given format.
    #[inline]
    pub fn from_format(format: QueryResultsFormat) -> Self {
        Self {
            format,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            lenient: false,
            strict_row_width: false,
        }
    }

    /// Sets the size of the chunks read from the input.
    ///
    /// A capacity of 0 falls back to 1024 bytes.
    #[inline]
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = if buffer_capacity == 0 {
            FALLBACK_BUFFER_CAPACITY
        } else {
            buffer_capacity
        };
        self
    }

    /// Sets the maximal size in bytes of a single record.
    ///
    /// Going over it fails with an [`io::ErrorKind::OutOfMemory`] error.
    #[inline]
    pub fn with_max_record_size(mut self, max_record_size: usize) -> Self {
        self.max_record_size = max_record_size;
        self
    }

    /// Keeps the stray quotes of CSV as data instead of failing.
    ///
    /// ```
    /// use svresults::{Literal, QueryResultsFormat, QueryResultsParser, Row};
    ///
    /// let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Csv)
    ///     .lenient()
    ///     .parse_read(b"x\r\n5\"6\r\n".as_slice());
    /// assert_eq!(
    ///     parser.read_row()?,
    ///     Some(Row::from(vec![Some(
    ///         Literal::new_simple_literal("5\"6").into()
    ///     )]))
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Fails on rows with a number of fields different from the number of variables.
    ///
    /// By default they are padded with unbound values or truncated.
    ///
    /// ```
    /// use svresults::{QueryResultsFormat, QueryResultsParser};
    ///
    /// let data = b"x,y\r\n1\r\n";
    /// let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Csv).parse_slice(data);
    /// let row = parser.read_row()?.unwrap();
    /// assert_eq!(row.len(), 2);
    /// assert_eq!(row.get(1), None);
    ///
    /// let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Csv)
    ///     .with_strict_row_width()
    ///     .parse_slice(data);
    /// assert!(parser.read_row().is_err());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn with_strict_row_width(mut self) -> Self {
        self.strict_row_width = true;
        self
    }

    /// The parsed format.
    #[inline]
    pub fn format(&self) -> QueryResultsFormat {
        self.format
    }

    /// Parses the results from a [`Read`] implementation.
    ///
    /// Nothing is read before the first call to [`ReaderSolutionsParser::ensure_variables`] or [`ReaderSolutionsParser::read_row`].
    /// The reader is dropped with the parser: pass `&mut reader` to keep it.
    pub fn parse_read<R: Read>(&self, reader: R) -> ReaderSolutionsParser<R> {
        ReaderSolutionsParser {
            reader,
            buffer: vec![0; self.buffer_capacity],
            inner: self.row_source(),
            error_returned: false,
        }
    }

    /// Parses the results from a byte slice.
    pub fn parse_slice<'a>(&self, slice: &'a [u8]) -> ReaderSolutionsParser<&'a [u8]> {
        self.parse_read(slice)
    }

    /// Parses the results from a Tokio [`AsyncRead`] implementation.
    ///
    /// ```
    /// use svresults::{QueryResultsFormat, QueryResultsParser, Variable};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), svresults::QueryResultsParseError> {
    /// let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Tsv)
    ///     .parse_tokio_async_read(b"?x\n<http://example.com/>\n".as_slice());
    /// assert_eq!(parser.ensure_variables().await?, &[Variable::new_unchecked("x")]);
    /// assert!(parser.read_row().await?.is_some());
    /// assert!(parser.read_row().await?.is_none());
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "async-tokio")]
    pub fn parse_tokio_async_read<R: AsyncRead + Unpin>(
        &self,
        reader: R,
    ) -> TokioAsyncReaderSolutionsParser<R> {
        TokioAsyncReaderSolutionsParser {
            reader,
            buffer: vec![0; self.buffer_capacity],
            inner: self.row_source(),
        }
    }

    fn row_source(&self) -> RowSource {
        let mut tokenizer =
            SvTokenizer::new(self.format).with_max_record_size(self.max_record_size);
        if self.lenient {
            tokenizer = tokenizer.lenient();
        }
        RowSource {
            format: self.format,
            strict_row_width: self.strict_row_width,
            tokenizer,
            variables: None,
            queue: VecDeque::new(),
            state: RowSourceState::Unstarted,
            failure: None,
            end_of_input: false,
            row_count: 0,
        }
    }
}

impl From<QueryResultsFormat> for QueryResultsParser {
    fn from(format: QueryResultsFormat) -> Self {
        Self::from_format(format)
    }
}

/// The progress of a row source through its input.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RowSourceState {
    /// Nothing has been read yet.
    Unstarted,
    /// Input is being read but the header is not complete yet.
    HeaderPending,
    /// The header is known, rows are being read.
    Streaming,
    /// The input is ended and all rows have been returned.
    Exhausted,
    /// An error happened. It is returned by every later operation.
    Failed,
}

/// A streaming parser of rows from a [`Read`] implementation.
///
/// Built with [`QueryResultsParser::parse_read`]. It also implements [`Iterator`] and [`ResultSet`].
///
/// ```
/// use svresults::{QueryResultsFormat, QueryResultsParser, RowSourceState};
///
/// let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Tsv)
///     .parse_read(b"?s\n<http://example.com/a>\n<http://example.com/b>\n".as_slice());
/// assert_eq!(parser.state(), RowSourceState::Unstarted);
/// let rows = parser.by_ref().collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(rows.len(), 2);
/// assert_eq!(parser.state(), RowSourceState::Exhausted);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[must_use]
pub struct ReaderSolutionsParser<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    inner: RowSource,
    error_returned: bool,
}

impl<R: Read> ReaderSolutionsParser<R> {
    /// Reads the input until the header is known and returns the variables it declares.
    ///
    /// An empty input declares no variables.
    pub fn ensure_variables(&mut self) -> Result<&[Variable], QueryResultsParseError> {
        self.fill();
        self.inner.variables()
    }

    /// Returns the next row or `None` if all rows have been returned.
    ///
    /// The rows are returned in the input order and each of them has exactly one value per variable.
    pub fn read_row(&mut self) -> Result<Option<Row>, QueryResultsParseError> {
        self.fill();
        self.inner.pop_row()
    }

    /// The variables if the header has already been read.
    #[inline]
    pub fn variables(&self) -> Option<&[Variable]> {
        self.inner.variables.as_deref()
    }

    #[inline]
    pub fn state(&self) -> RowSourceState {
        self.inner.state
    }

    /// Gives back the reader. The rows already read from it but not returned yet are lost.
    #[inline]
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) {
        while self.inner.needs_input() {
            self.inner.start();
            match read_chunk(&mut self.reader, &mut self.buffer) {
                Ok(len) => {
                    let is_last = len < self.buffer.len();
                    self.inner.push_chunk(&self.buffer[..len], is_last);
                }
                Err(error) => self.inner.fail(error.into()),
            }
        }
    }
}

impl<R: Read> Iterator for ReaderSolutionsParser<R> {
    type Item = Result<Row, QueryResultsParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error_returned {
            return None;
        }
        let result = self.read_row().transpose();
        if matches!(result, Some(Err(_))) {
            self.error_returned = true;
        }
        result
    }
}

impl<R: Read> ResultSet for ReaderSolutionsParser<R> {
    fn kind(&self) -> ResultKind {
        ResultKind::Bindings
    }

    fn variables(&mut self) -> io::Result<&[Variable]> {
        Ok(self.ensure_variables()?)
    }

    fn next_row(&mut self) -> io::Result<Option<Row>> {
        Ok(self.read_row()?)
    }
}

/// Fills `buffer` from `reader` until it is full or the reader is ended.
fn read_chunk(reader: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut len = 0;
    while len < buffer.len() {
        match reader.read(&mut buffer[len..]) {
            Ok(0) => break,
            Ok(read) => len += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => (),
            Err(error) => return Err(error),
        }
    }
    Ok(len)
}

/// A streaming parser of rows from a Tokio [`AsyncRead`] implementation.
///
/// Built with [`QueryResultsParser::parse_tokio_async_read`].
#[cfg(feature = "async-tokio")]
#[must_use]
pub struct TokioAsyncReaderSolutionsParser<R: AsyncRead + Unpin> {
    reader: R,
    buffer: Vec<u8>,
    inner: RowSource,
}

#[cfg(feature = "async-tokio")]
impl<R: AsyncRead + Unpin> TokioAsyncReaderSolutionsParser<R> {
    /// Reads the input until the header is known and returns the variables it declares.
    pub async fn ensure_variables(&mut self) -> Result<&[Variable], QueryResultsParseError> {
        self.fill().await;
        self.inner.variables()
    }

    /// Returns the next row or `None` if all rows have been returned.
    pub async fn read_row(&mut self) -> Result<Option<Row>, QueryResultsParseError> {
        self.fill().await;
        self.inner.pop_row()
    }

    #[inline]
    pub fn variables(&self) -> Option<&[Variable]> {
        self.inner.variables.as_deref()
    }

    #[inline]
    pub fn state(&self) -> RowSourceState {
        self.inner.state
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.reader
    }

    async fn fill(&mut self) {
        while self.inner.needs_input() {
            self.inner.start();
            let mut len = 0;
            let mut error = None;
            while len < self.buffer.len() {
                match self.reader.read(&mut self.buffer[len..]).await {
                    Ok(0) => break,
                    Ok(read) => len += read,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => (),
                    Err(e) => {
                        error = Some(e);
                        break;
                    }
                }
            }
            if let Some(error) = error {
                self.inner.fail(error.into());
            } else {
                let is_last = len < self.buffer.len();
                self.inner.push_chunk(&self.buffer[..len], is_last);
            }
        }
    }
}

/// The I/O independent part of the row source: turns chunks into queued rows.
struct RowSource {
    format: QueryResultsFormat,
    strict_row_width: bool,
    tokenizer: SvTokenizer,
    variables: Option<Vec<Variable>>,
    queue: VecDeque<Row>,
    state: RowSourceState,
    failure: Option<QueryResultsParseError>,
    end_of_input: bool,
    row_count: u64,
}

impl RowSource {
    /// Should more input be read before answering?
    fn needs_input(&self) -> bool {
        !self.end_of_input
            && self.failure.is_none()
            && (self.variables.is_none() || self.queue.is_empty())
    }

    fn start(&mut self) {
        if self.state == RowSourceState::Unstarted {
            self.state = RowSourceState::HeaderPending;
        }
    }

    fn push_chunk(&mut self, chunk: &[u8], is_last: bool) {
        tracing::debug!(bytes = chunk.len(), is_last, "Feeding chunk to the tokenizer");
        let mut result = self.tokenizer.feed(chunk);
        if result.is_ok() && is_last {
            result = self.tokenizer.end();
        }
        if let Err(error) = result {
            self.fail(error);
            return;
        }
        while let Some(event) = self.tokenizer.next_event() {
            if let Err(error) = self.handle_event(event) {
                self.fail(error);
                return;
            }
        }
        if is_last {
            self.end_of_input = true;
            if self.variables.is_none() {
                self.variables = Some(Vec::new());
            }
            if self.queue.is_empty() {
                self.state = RowSourceState::Exhausted;
            }
            tracing::debug!(rows = self.row_count, "End of input");
        }
    }

    fn fail(&mut self, error: QueryResultsParseError) {
        tracing::debug!(%error, "Parsing failed");
        self.queue.clear();
        self.failure = Some(error);
        self.state = RowSourceState::Failed;
    }

    fn variables(&self) -> Result<&[Variable], QueryResultsParseError> {
        if let Some(failure) = &self.failure {
            return Err(failure.duplicate());
        }
        Ok(self.variables.as_deref().unwrap_or_default())
    }

    fn pop_row(&mut self) -> Result<Option<Row>, QueryResultsParseError> {
        if let Some(failure) = &self.failure {
            return Err(failure.duplicate());
        }
        let row = self.queue.pop_front();
        if self.queue.is_empty() && self.end_of_input {
            self.state = RowSourceState::Exhausted;
        }
        Ok(row)
    }

    fn handle_event(&mut self, event: SvEvent) -> Result<(), QueryResultsParseError> {
        match event {
            SvEvent::Header(record) => {
                let variables = self.decode_header(&record)?;
                tracing::debug!(variables = variables.len(), "Header read");
                self.variables = Some(variables);
                self.state = RowSourceState::Streaming;
            }
            SvEvent::Row(record) => {
                let row = self.decode_row(&record)?;
                self.row_count += 1;
                tracing::trace!(row = self.row_count, width = row.len(), "Row queued");
                self.queue.push_back(row);
            }
        }
        Ok(())
    }

    fn decode_header(&self, record: &SvRecord) -> Result<Vec<Variable>, QueryResultsSyntaxError> {
        if record.is_blank() {
            return Ok(Vec::new());
        }
        let mut variables = Vec::with_capacity(record.len());
        for field in record.fields() {
            let name = match self.format {
                QueryResultsFormat::Csv => field,
                QueryResultsFormat::Tsv => field
                    .strip_prefix('?')
                    .or_else(|| field.strip_prefix('$'))
                    .unwrap_or(field),
            };
            let variable = Variable::new(name).map_err(|e| {
                QueryResultsSyntaxError::located_message(
                    format!("Invalid variable name '{field}' in the header: {e}"),
                    record.position(),
                )
            })?;
            if variables.contains(&variable) {
                return Err(QueryResultsSyntaxError::located_message(
                    format!("The variable {variable} is declared twice"),
                    record.position(),
                ));
            }
            variables.push(variable);
        }
        Ok(variables)
    }

    fn decode_row(&self, record: &SvRecord) -> Result<Row, QueryResultsSyntaxError> {
        let width = self.variables.as_ref().map_or(0, Vec::len);
        if width == 0 && record.is_blank() {
            return Ok(Row::default());
        }
        if record.len() != width {
            if self.strict_row_width {
                return Err(QueryResultsSyntaxError::located_message(
                    format!(
                        "The header declares {width} variables but this row has {} fields",
                        record.len()
                    ),
                    record.position(),
                ));
            }
            tracing::warn!(
                line = record.position().start.line + 1,
                fields = record.len(),
                variables = width,
                "Row width does not match the header, padding or truncating it"
            );
        }
        let mut values = Vec::with_capacity(width);
        for field in record.fields().take(width) {
            let text = match self.format {
                QueryResultsFormat::Csv => Cow::Borrowed(field),
                QueryResultsFormat::Tsv => decode_tsv_field(field).map_err(|e| {
                    QueryResultsSyntaxError::located_message(e, record.position())
                })?,
            };
            values.push(Some(reconstruct_value(text)));
        }
        values.resize(width, None);
        Ok(values.into())
    }
}

/// The fields carry no type: only the `http://` prefix makes an IRI.
fn reconstruct_value(text: Cow<'_, str>) -> Value {
    if text.len() > 7 && text.starts_with("http://") {
        Value::Uri(text.into_owned())
    } else {
        Literal::new_simple_literal(text.into_owned()).into()
    }
}
