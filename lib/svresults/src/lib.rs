#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
pub mod escape;
mod format;
mod model;
mod parser;
mod results;
mod serializer;
pub mod tokenizer;
pub mod vocab;

pub use crate::error::{
    QueryResultsParseError, QueryResultsSerializeError, QueryResultsSyntaxError, TextPosition,
    UnsupportedLiteralKind,
};
pub use crate::format::{Escaping, FormatDescriptor, QueryResultsFormat};
pub use crate::model::{Literal, LiteralKind, Row, Value, Variable, VariableNameParseError};
#[cfg(feature = "async-tokio")]
pub use crate::parser::TokioAsyncReaderSolutionsParser;
pub use crate::parser::{
    DEFAULT_BUFFER_CAPACITY, QueryResultsParser, ReaderSolutionsParser, RowSourceState,
};
pub use crate::results::{MemoryResults, ResultKind, ResultSet};
#[cfg(feature = "async-tokio")]
pub use crate::serializer::TokioAsyncWriterSolutionsSerializer;
pub use crate::serializer::{QueryResultsSerializer, WriterSolutionsSerializer};
