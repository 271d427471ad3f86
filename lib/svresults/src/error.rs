use crate::format::QueryResultsFormat;
use crate::model::LiteralKind;
use crate::results::ResultKind;
use std::ops::Range;
use std::str::Utf8Error;
use std::{fmt, io};

/// Error returned during CSV or TSV results parsing.
#[derive(Debug, thiserror::Error)]
pub enum QueryResultsParseError {
    /// I/O error during parsing (file not found, record too large...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] QueryResultsSyntaxError),
}

impl QueryResultsParseError {
    /// Builds a copy of this error.
    ///
    /// I/O errors are not cloneable: the copy keeps their kind and message.
    pub(crate) fn duplicate(&self) -> Self {
        match self {
            Self::Io(error) => Self::Io(io::Error::new(error.kind(), error.to_string())),
            Self::Syntax(error) => Self::Syntax(error.clone()),
        }
    }
}

impl From<QueryResultsParseError> for io::Error {
    #[inline]
    fn from(error: QueryResultsParseError) -> Self {
        match error {
            QueryResultsParseError::Io(error) => error,
            QueryResultsParseError::Syntax(error) => error.into(),
        }
    }
}

/// An error in the syntax of the parsed file.
#[derive(Debug, Clone, thiserror::Error)]
#[error(transparent)]
pub struct QueryResultsSyntaxError(#[from] SyntaxErrorKind);

#[derive(Debug, Clone, thiserror::Error)]
enum SyntaxErrorKind {
    #[error("Invalid UTF-8 in field starting at line {}: {error}", location.start.line + 1)]
    Utf8 {
        #[source]
        error: Utf8Error,
        location: Range<TextPosition>,
    },
    #[error("{}", located(msg, location.as_ref()))]
    Msg {
        msg: String,
        location: Option<Range<TextPosition>>,
    },
}

fn located(msg: &str, location: Option<&Range<TextPosition>>) -> String {
    match location {
        Some(location) => format!(
            "Parser error at line {} column {}: {msg}",
            location.start.line + 1,
            location.start.column + 1
        ),
        None => msg.into(),
    }
}

impl QueryResultsSyntaxError {
    /// Builds an error from a printable error message.
    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        Self(SyntaxErrorKind::Msg {
            msg: msg.into(),
            location: None,
        })
    }

    /// Builds an error from a printable error message and a location
    #[inline]
    pub(crate) fn located_message(msg: impl Into<String>, location: Range<TextPosition>) -> Self {
        Self(SyntaxErrorKind::Msg {
            msg: msg.into(),
            location: Some(location),
        })
    }

    pub(crate) fn utf8(error: Utf8Error, location: Range<TextPosition>) -> Self {
        Self(SyntaxErrorKind::Utf8 { error, location })
    }

    /// The location of the error inside of the file.
    #[inline]
    pub fn location(&self) -> Option<Range<TextPosition>> {
        match &self.0 {
            SyntaxErrorKind::Utf8 { location, .. } => Some(location.clone()),
            SyntaxErrorKind::Msg { location, .. } => location.clone(),
        }
    }
}

impl From<QueryResultsSyntaxError> for io::Error {
    #[inline]
    fn from(error: QueryResultsSyntaxError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}

/// A position in a text i.e. a `line` number starting from 0, a `column` number starting from 0 (in number of code points) and a global file `offset` starting from 0 (in number of bytes).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct TextPosition {
    pub line: u64,
    pub column: u64,
    pub offset: u64,
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line + 1, self.column + 1)
    }
}

/// Error returned when writing a whole result set.
#[derive(Debug, thiserror::Error)]
pub enum QueryResultsSerializeError {
    /// I/O error from the output or from the result set being drained.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The result set is not made of variable bindings. Nothing has been written.
    #[error("Can only write {format} for variable binding results, not for {kind} results")]
    UnsupportedResultKind {
        kind: ResultKind,
        format: QueryResultsFormat,
    },
}

impl From<QueryResultsSerializeError> for io::Error {
    #[inline]
    fn from(error: QueryResultsSerializeError) -> Self {
        match error {
            QueryResultsSerializeError::Io(error) => error,
            QueryResultsSerializeError::UnsupportedResultKind { .. } => {
                Self::new(io::ErrorKind::InvalidInput, error)
            }
        }
    }
}

/// A literal that has no representation in the output format.
///
/// The serializer reports it, writes an empty field instead and goes on with the row.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("Cannot turn literal kind {kind} into {format}")]
pub struct UnsupportedLiteralKind {
    pub kind: LiteralKind,
    pub format: QueryResultsFormat,
}
