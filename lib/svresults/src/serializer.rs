use crate::error::{QueryResultsSerializeError, UnsupportedLiteralKind};
use crate::escape::{write_blank_node, write_csv_field, write_iri, write_ntriples_escaped};
use crate::format::{Escaping, FormatDescriptor, QueryResultsFormat};
use crate::model::{Literal, LiteralKind, Row, Value, Variable};
use crate::results::{ResultKind, ResultSet};
use crate::vocab::NumericDatatype;
use std::io::{self, Write};
#[cfg(feature = "async-tokio")]
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A serializer for the [SPARQL query results CSV and TSV formats](https://www.w3.org/TR/sparql11-results-csv-tsv/).
///
/// CSV writes the raw text of each value and drops language tags and datatypes.
/// TSV writes values in the Turtle syntax, numbers being written without quotes.
///
/// ```
/// use svresults::{Literal, QueryResultsFormat, QueryResultsSerializer, Row, Variable};
/// use svresults::vocab::xsd;
///
/// let mut serializer = QueryResultsSerializer::from_format(QueryResultsFormat::Tsv)
///     .serialize_solutions_to_write(Vec::new(), vec![Variable::new("x")?, Variable::new("y")?])?;
/// serializer.serialize(&Row::from(vec![
///     Some(Literal::new_typed_literal("1", xsd::INTEGER).into()),
///     Some(Literal::new_typed_literal("2", xsd::INTEGER).into()),
/// ]))?;
/// assert_eq!(serializer.finish()?, b"?x\t?y\n1\t2\n");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct QueryResultsSerializer {
    format: QueryResultsFormat,
}

impl QueryResultsSerializer {
    /// Builds a serializer for the given format.
    #[inline]
    pub fn from_format(format: QueryResultsFormat) -> Self {
        Self { format }
    }

    /// The written format.
    #[inline]
    pub fn format(&self) -> QueryResultsFormat {
        self.format
    }

    /// Writes a whole result set: its header then all its rows.
    ///
    /// The result set is consumed. If it is not made of variable bindings nothing is written and
    /// [`QueryResultsSerializeError::UnsupportedResultKind`] is returned.
    ///
    /// ```
    /// use svresults::{Literal, MemoryResults, QueryResultsFormat, QueryResultsSerializer, Row, Variable};
    ///
    /// let results = MemoryResults::solutions(
    ///     vec![Variable::new("x")?],
    ///     vec![Row::from(vec![Some(Literal::new_simple_literal("a,b\"c").into())])],
    /// );
    /// let output = QueryResultsSerializer::from_format(QueryResultsFormat::Csv)
    ///     .serialize_results_to_write(Vec::new(), results)?;
    /// assert_eq!(output, b"x\r\n\"a,b\"\"c\"\r\n");
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn serialize_results_to_write<W: Write>(
        &self,
        writer: W,
        mut results: impl ResultSet,
    ) -> Result<W, QueryResultsSerializeError> {
        let kind = results.kind();
        if kind != ResultKind::Bindings {
            let error = QueryResultsSerializeError::UnsupportedResultKind {
                kind,
                format: self.format,
            };
            tracing::error!(%error, "Nothing written");
            return Err(error);
        }
        let variables = results.variables()?.to_vec();
        let mut serializer = self.serialize_solutions_to_write(writer, variables)?;
        while let Some(row) = results.next_row()? {
            serializer.serialize(&row)?;
        }
        Ok(serializer.finish()?)
    }

    /// Returns a [`WriterSolutionsSerializer`] writing rows into the given [`Write`] implementation.
    ///
    /// The header is written immediately.
    ///
    /// <div class="warning">Do not forget to run the [`finish`](WriterSolutionsSerializer::finish()) method to flush the writer.</div>
    pub fn serialize_solutions_to_write<W: Write>(
        &self,
        mut writer: W,
        variables: Vec<Variable>,
    ) -> io::Result<WriterSolutionsSerializer<W>> {
        let mut buffer = String::new();
        let inner = InnerSolutionsSerializer::start(&mut buffer, self.format, variables);
        writer.write_all(buffer.as_bytes())?;
        buffer.clear();
        Ok(WriterSolutionsSerializer {
            inner,
            writer,
            buffer,
        })
    }

    /// Returns a [`TokioAsyncWriterSolutionsSerializer`] writing rows into the given Tokio [`AsyncWrite`] implementation.
    ///
    /// ```
    /// use svresults::{Literal, QueryResultsFormat, QueryResultsSerializer, Row, Variable};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> std::io::Result<()> {
    /// let mut serializer = QueryResultsSerializer::from_format(QueryResultsFormat::Csv)
    ///     .serialize_solutions_to_tokio_async_write(Vec::new(), vec![Variable::new_unchecked("x")])
    ///     .await?;
    /// serializer
    ///     .serialize(&Row::from(vec![Some(Literal::new_simple_literal("test").into())]))
    ///     .await?;
    /// assert_eq!(serializer.finish().await?, b"x\r\ntest\r\n");
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "async-tokio")]
    pub async fn serialize_solutions_to_tokio_async_write<W: AsyncWrite + Unpin>(
        &self,
        mut writer: W,
        variables: Vec<Variable>,
    ) -> io::Result<TokioAsyncWriterSolutionsSerializer<W>> {
        let mut buffer = String::new();
        let inner = InnerSolutionsSerializer::start(&mut buffer, self.format, variables);
        writer.write_all(buffer.as_bytes()).await?;
        buffer.clear();
        Ok(TokioAsyncWriterSolutionsSerializer {
            inner,
            writer,
            buffer,
        })
    }
}

impl From<QueryResultsFormat> for QueryResultsSerializer {
    fn from(format: QueryResultsFormat) -> Self {
        Self::from_format(format)
    }
}

/// Writes rows into a [`Write`] implementation.
///
/// Could be built using [`QueryResultsSerializer::serialize_solutions_to_write`].
#[must_use]
pub struct WriterSolutionsSerializer<W: Write> {
    inner: InnerSolutionsSerializer,
    writer: W,
    buffer: String,
}

impl<W: Write> WriterSolutionsSerializer<W> {
    /// Writes a row.
    ///
    /// Value `i` is written in the column of variable `i`. Missing values are written as empty fields
    /// and values after the last variable are ignored.
    pub fn serialize(&mut self, row: &Row) -> io::Result<()> {
        self.inner.write(&mut self.buffer, row);
        self.writer.write_all(self.buffer.as_bytes())?;
        self.buffer.clear();
        Ok(())
    }

    /// The variables written in the header.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.inner.variables
    }

    /// Number of values written as empty fields because the format has no representation for them.
    #[inline]
    pub fn unsupported_value_count(&self) -> u64 {
        self.inner.unsupported_values
    }

    /// Flushes and returns the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Writes rows into a Tokio [`AsyncWrite`] implementation.
///
/// Could be built using [`QueryResultsSerializer::serialize_solutions_to_tokio_async_write`].
#[cfg(feature = "async-tokio")]
#[must_use]
pub struct TokioAsyncWriterSolutionsSerializer<W: AsyncWrite + Unpin> {
    inner: InnerSolutionsSerializer,
    writer: W,
    buffer: String,
}

#[cfg(feature = "async-tokio")]
impl<W: AsyncWrite + Unpin> TokioAsyncWriterSolutionsSerializer<W> {
    /// Writes a row.
    pub async fn serialize(&mut self, row: &Row) -> io::Result<()> {
        self.inner.write(&mut self.buffer, row);
        self.writer.write_all(self.buffer.as_bytes()).await?;
        self.buffer.clear();
        Ok(())
    }

    #[inline]
    pub fn unsupported_value_count(&self) -> u64 {
        self.inner.unsupported_values
    }

    /// Flushes and returns the writer.
    pub async fn finish(mut self) -> io::Result<W> {
        self.writer.flush().await?;
        Ok(self.writer)
    }
}

struct InnerSolutionsSerializer {
    format: QueryResultsFormat,
    descriptor: FormatDescriptor,
    variables: Vec<Variable>,
    unsupported_values: u64,
}

impl InnerSolutionsSerializer {
    fn start(output: &mut String, format: QueryResultsFormat, variables: Vec<Variable>) -> Self {
        let descriptor = format.descriptor();
        for (i, variable) in variables.iter().enumerate() {
            if i > 0 {
                output.push(char::from(descriptor.separator));
            }
            if let Some(prefix) = descriptor.variable_prefix {
                output.push(char::from(prefix));
            }
            output.push_str(variable.as_str());
        }
        push_eol(output, descriptor.eol);
        Self {
            format,
            descriptor,
            variables,
            unsupported_values: 0,
        }
    }

    fn write(&mut self, output: &mut String, row: &Row) {
        for i in 0..self.variables.len() {
            if i > 0 {
                output.push(char::from(self.descriptor.separator));
            }
            if let Some(value) = row.get(i) {
                self.write_value(output, value);
            }
        }
        push_eol(output, self.descriptor.eol);
    }

    fn write_value(&mut self, output: &mut String, value: &Value) {
        match value {
            Value::Uri(iri) => match self.descriptor.escaping {
                Escaping::Csv => write_csv_field(output, iri),
                Escaping::Turtle => write_iri(output, iri),
            },
            Value::BlankNode(id) => write_blank_node(output, id),
            Value::Literal(literal) if literal.kind() != LiteralKind::Lexical => {
                let error = UnsupportedLiteralKind {
                    kind: literal.kind(),
                    format: self.format,
                };
                tracing::error!(%error, "Writing an empty field instead");
                self.unsupported_values += 1;
            }
            Value::Literal(literal) => match self.descriptor.escaping {
                Escaping::Csv => write_csv_field(output, literal.value()),
                Escaping::Turtle => write_turtle_literal(output, literal),
            },
        }
    }
}

fn write_turtle_literal(output: &mut String, literal: &Literal) {
    if is_bare_number(literal) {
        output.push_str(literal.value());
        return;
    }
    output.push('"');
    write_ntriples_escaped(output, literal.value(), Some('"'));
    output.push('"');
    if let Some(language) = literal.language() {
        output.push('@');
        output.push_str(language);
    }
    if let Some(datatype) = literal.datatype() {
        output.push_str("^^");
        write_iri(output, datatype);
    }
}

/// Valid integers, decimals, floats and doubles are written without quotes nor datatype.
fn is_bare_number(literal: &Literal) -> bool {
    literal.is_valid() == Some(true)
        && literal
            .datatype()
            .is_some_and(|datatype| NumericDatatype::from_iri(datatype).is_some())
}

fn push_eol(output: &mut String, eol: &[u8]) {
    output.extend(eol.iter().copied().map(char::from));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::MemoryResults;
    use crate::vocab::xsd;

    fn build_example() -> (Vec<Variable>, Vec<Row>) {
        (
            vec![
                Variable::new_unchecked("x"),
                Variable::new_unchecked("literal"),
            ],
            vec![
                Row::from(vec![
                    Some(Value::uri("http://example/x")),
                    Some(Literal::new_simple_literal("String").into()),
                ]),
                Row::from(vec![
                    Some(Value::uri("http://example/x")),
                    Some(Literal::new_simple_literal("String-with-dquote\"").into()),
                ]),
                Row::from(vec![
                    Some(Value::blank_node("b0")),
                    Some(Literal::new_simple_literal("Blank node").into()),
                ]),
                Row::from(vec![
                    None,
                    Some(Literal::new_simple_literal("Missing 'x'").into()),
                ]),
                Row::from(vec![None, None]),
                Row::from(vec![Some(Value::uri("http://example/x")), None]),
                Row::from(vec![
                    Some(Value::blank_node("b1")),
                    Some(Literal::new_language_tagged_literal("String-with-lang", "en").into()),
                ]),
                Row::from(vec![
                    Some(Value::blank_node("b1")),
                    Some(Literal::new_typed_literal("123", xsd::INTEGER).into()),
                ]),
                Row::from(vec![
                    None,
                    Some(Literal::new_simple_literal("escape,\t\r\n").into()),
                ]),
            ],
        )
    }

    fn serialize(format: QueryResultsFormat, variables: Vec<Variable>, rows: &[Row]) -> String {
        let mut buffer = String::new();
        let mut serializer = InnerSolutionsSerializer::start(&mut buffer, format, variables);
        for row in rows {
            serializer.write(&mut buffer, row);
        }
        buffer
    }

    #[test]
    fn test_csv_serialization() {
        let (variables, rows) = build_example();
        assert_eq!(
            serialize(QueryResultsFormat::Csv, variables, &rows),
            "x,literal\r\nhttp://example/x,String\r\nhttp://example/x,\"String-with-dquote\"\"\"\r\n_:b0,Blank node\r\n,Missing 'x'\r\n,\r\nhttp://example/x,\r\n_:b1,String-with-lang\r\n_:b1,123\r\n,\"escape,\t\r\n\"\r\n"
        );
    }

    #[test]
    fn test_tsv_serialization() {
        let (variables, rows) = build_example();
        assert_eq!(
            serialize(QueryResultsFormat::Tsv, variables, &rows),
            "?x\t?literal\n<http://example/x>\t\"String\"\n<http://example/x>\t\"String-with-dquote\\\"\"\n_:b0\t\"Blank node\"\n\t\"Missing 'x'\"\n\t\n<http://example/x>\t\n_:b1\t\"String-with-lang\"@en\n_:b1\t123\n\t\"escape,\\t\\r\\n\"\n"
        );
    }

    #[test]
    fn test_numeric_fast_path() {
        let rows = [Row::from(vec![
            Some(Literal::new_typed_literal("1.5", xsd::DECIMAL).into()),
            Some(Literal::new_typed_literal("1e3", xsd::DOUBLE).into()),
            Some(Literal::new_typed_literal("abc", xsd::INTEGER).into()),
            Some(Literal::new_unchecked_typed_literal("2", xsd::INTEGER).into()),
            Some(Literal::new_typed_literal("3", xsd::INT).into()),
        ])];
        let variables = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(Variable::new_unchecked)
            .collect();
        assert_eq!(
            serialize(QueryResultsFormat::Tsv, variables, &rows),
            "?a\t?b\t?c\t?d\t?e\n1.5\t1e3\t\"abc\"^^<http://www.w3.org/2001/XMLSchema#integer>\t\"2\"^^<http://www.w3.org/2001/XMLSchema#integer>\t\"3\"^^<http://www.w3.org/2001/XMLSchema#int>\n"
        );
    }

    #[test]
    fn test_unsupported_literal_kind() -> io::Result<()> {
        let mut serializer = QueryResultsSerializer::from_format(QueryResultsFormat::Csv)
            .serialize_solutions_to_write(
                Vec::new(),
                vec![Variable::new_unchecked("a"), Variable::new_unchecked("b")],
            )?;
        serializer.serialize(&Row::from(vec![
            Some(Literal::new_with_kind("[a-z]+", LiteralKind::Pattern).into()),
            Some(Literal::new_simple_literal("ok").into()),
        ]))?;
        assert_eq!(serializer.unsupported_value_count(), 1);
        assert_eq!(serializer.finish()?, b"a,b\r\n,ok\r\n");
        Ok(())
    }

    #[test]
    fn test_unsupported_result_kind() {
        let mut output = Vec::new();
        let results = MemoryResults::new(ResultKind::Boolean, Vec::new(), Vec::new());
        let error = QueryResultsSerializer::from_format(QueryResultsFormat::Tsv)
            .serialize_results_to_write(&mut output, results)
            .unwrap_err();
        assert!(matches!(
            error,
            QueryResultsSerializeError::UnsupportedResultKind {
                kind: ResultKind::Boolean,
                format: QueryResultsFormat::Tsv
            }
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn test_result_set_is_drained() -> Result<(), QueryResultsSerializeError> {
        let (variables, rows) = build_example();
        let mut results = MemoryResults::solutions(variables, rows);
        QueryResultsSerializer::from_format(QueryResultsFormat::Csv)
            .serialize_results_to_write(Vec::new(), &mut results)?;
        assert_eq!(results.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_row_width() {
        let variables = vec![Variable::new_unchecked("a"), Variable::new_unchecked("b")];
        let rows = [
            Row::from(vec![Some(Value::uri("http://example.com/"))]),
            Row::from(vec![
                Some(Value::uri("http://example.com/1")),
                Some(Value::uri("http://example.com/2")),
                Some(Value::uri("http://example.com/3")),
            ]),
        ];
        assert_eq!(
            serialize(QueryResultsFormat::Csv, variables, &rows),
            "a,b\r\nhttp://example.com/,\r\nhttp://example.com/1,http://example.com/2\r\n"
        );
    }

    #[test]
    fn test_escaped_terms() {
        let rows = [Row::from(vec![
            Some(Value::uri("http://example.com/a,\"b\"")),
            Some(Value::blank_node("b 1")),
            Some(Literal::new_unchecked_typed_literal("x", "http://example.com/dt>").into()),
        ])];
        let variables = ["a", "b", "c"]
            .into_iter()
            .map(Variable::new_unchecked)
            .collect::<Vec<_>>();
        assert_eq!(
            serialize(QueryResultsFormat::Csv, variables.clone(), &rows),
            "a,b,c\r\n\"http://example.com/a,\"\"b\"\"\",_:b_1,x\r\n"
        );
        assert_eq!(
            serialize(QueryResultsFormat::Tsv, variables, &rows),
            "?a\t?b\t?c\n<http://example.com/a,\\\"b\\\">\t_:b_1\t\"x\"^^<http://example.com/dt>>\n"
        );
    }

    #[test]
    fn test_no_columns_csv_serialization() {
        assert_eq!(
            serialize(QueryResultsFormat::Csv, Vec::new(), &[Row::default()]),
            "\r\n\r\n"
        );
    }

    #[test]
    fn test_no_columns_tsv_serialization() {
        assert_eq!(
            serialize(QueryResultsFormat::Tsv, Vec::new(), &[Row::default()]),
            "\n\n"
        );
    }

    #[test]
    fn test_no_results_serialization() {
        assert_eq!(
            serialize(
                QueryResultsFormat::Csv,
                vec![Variable::new_unchecked("a")],
                &[]
            ),
            "a\r\n"
        );
        assert_eq!(
            serialize(
                QueryResultsFormat::Tsv,
                vec![Variable::new_unchecked("a")],
                &[]
            ),
            "?a\n"
        );
    }
}
