//! Values bound in result rows.

use crate::escape::{write_blank_node, write_iri, write_ntriples_escaped};
use crate::vocab::check_lexical_form;
use std::fmt;
use std::ops::Index;

/// A variable name, i.e. a column header of a result set.
///
/// The name is stored without the `?` or `$` prefix.
///
/// ```
/// use svresults::Variable;
///
/// assert_eq!(Variable::new("foo")?.as_str(), "foo");
/// assert!(Variable::new("").is_err());
/// # Result::<_, svresults::VariableNameParseError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Creates a variable name, checking that it can be written in a CSV or TSV header.
    pub fn new(name: impl Into<String>) -> Result<Self, VariableNameParseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(VariableNameParseError::Empty);
        }
        if let Some(c) = name
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, ',' | '"' | '?' | '$'))
        {
            return Err(VariableNameParseError::InvalidCharacter { name, character: c });
        }
        Ok(Self { name })
    }

    /// Creates a variable name from a string without validation.
    ///
    /// It is the caller's responsibility to ensure that `name` is a valid variable name.
    #[inline]
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.name
    }
}

impl fmt::Display for Variable {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

/// An error raised when a variable name is not usable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VariableNameParseError {
    #[error("Variable names must not be empty")]
    Empty,
    #[error("The variable name '{name}' contains the forbidden character {character:?}")]
    InvalidCharacter { name: String, character: char },
}

/// The way a [`Literal`] has been produced.
///
/// Only [`LiteralKind::Lexical`] literals have a textual form in CSV and TSV.
/// The other kinds are internal values of query engines that have leaked into a result set.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
#[non_exhaustive]
pub enum LiteralKind {
    /// A lexical form with an optional language tag and an optional datatype.
    #[default]
    Lexical,
    /// A boolean kept in its native form.
    Boolean,
    /// A regular expression pattern.
    Pattern,
    /// An unexpanded qualified name like `ex:foo`.
    QName,
    /// A reference to a variable.
    Variable,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lexical => "lexical",
            Self::Boolean => "boolean",
            Self::Pattern => "pattern",
            Self::QName => "qname",
            Self::Variable => "variable",
        })
    }
}

/// A literal: a lexical form with an optional language tag and an optional datatype IRI.
///
/// The validity flag tells if the lexical form belongs to the datatype lexical space.
/// It is unknown (`None`) when the datatype is not checked.
///
/// ```
/// use svresults::Literal;
/// use svresults::vocab::xsd;
///
/// assert_eq!(Literal::new_typed_literal("12", xsd::INTEGER).is_valid(), Some(true));
/// assert_eq!(Literal::new_typed_literal("1x", xsd::INTEGER).is_valid(), Some(false));
/// assert_eq!(Literal::new_simple_literal("foo").to_string(), "\"foo\"");
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Literal {
    value: String,
    language: Option<String>,
    datatype: Option<String>,
    is_valid: Option<bool>,
    kind: LiteralKind,
}

impl Literal {
    /// Builds a plain string literal.
    #[inline]
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
            is_valid: None,
            kind: LiteralKind::Lexical,
        }
    }

    /// Builds a language-tagged string.
    #[inline]
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::new_simple_literal(value)
        }
    }

    /// Builds a typed literal and checks its lexical form if the datatype is a known XSD one.
    pub fn new_typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let value = value.into();
        let datatype = datatype.into();
        let is_valid = check_lexical_form(&datatype, &value);
        Self {
            value,
            language: None,
            datatype: Some(datatype),
            is_valid,
            kind: LiteralKind::Lexical,
        }
    }

    /// Builds a typed literal without checking its lexical form.
    ///
    /// Its validity stays unknown.
    #[inline]
    pub fn new_unchecked_typed_literal(
        value: impl Into<String>,
        datatype: impl Into<String>,
    ) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::new_simple_literal(value)
        }
    }

    /// Builds a literal of a non-lexical kind with the given textual content.
    #[inline]
    pub fn new_with_kind(value: impl Into<String>, kind: LiteralKind) -> Self {
        Self {
            kind,
            ..Self::new_simple_literal(value)
        }
    }

    /// Sets the language tag.
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// The literal [lexical form](https://www.w3.org/TR/rdf11-concepts/#dfn-lexical-form).
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The datatype IRI, if any.
    #[inline]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    #[inline]
    pub fn is_valid(&self) -> Option<bool> {
        self.is_valid
    }

    #[inline]
    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    /// A lexical literal without language tag nor datatype.
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.kind == LiteralKind::Lexical && self.language.is_none() && self.datatype.is_none()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = String::with_capacity(self.value.len() + 2);
        buffer.push('"');
        write_ntriples_escaped(&mut buffer, &self.value, Some('"'));
        buffer.push('"');
        if let Some(language) = &self.language {
            buffer.push('@');
            buffer.push_str(language);
        }
        if let Some(datatype) = &self.datatype {
            buffer.push_str("^^");
            write_iri(&mut buffer, datatype);
        }
        f.write_str(&buffer)
    }
}

impl From<&str> for Literal {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new_simple_literal(value)
    }
}

impl From<String> for Literal {
    #[inline]
    fn from(value: String) -> Self {
        Self::new_simple_literal(value)
    }
}

/// A value bound to a variable in a row.
///
/// An unbound variable is represented by the absence of value (`None`), never by an empty literal.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Value {
    Uri(String),
    BlankNode(String),
    Literal(Literal),
}

impl Value {
    #[inline]
    pub fn uri(iri: impl Into<String>) -> Self {
        Self::Uri(iri.into())
    }

    #[inline]
    pub fn blank_node(id: impl Into<String>) -> Self {
        Self::BlankNode(id.into())
    }

    #[inline]
    pub fn is_uri(&self) -> bool {
        matches!(self, Self::Uri(_))
    }

    #[inline]
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// The text carried by the value: the IRI, the blank node id or the literal lexical form.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Uri(iri) => iri,
            Self::BlankNode(id) => id,
            Self::Literal(literal) => literal.value(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = String::new();
        match self {
            Self::Uri(iri) => write_iri(&mut buffer, iri),
            Self::BlankNode(id) => write_blank_node(&mut buffer, id),
            Self::Literal(literal) => return fmt::Display::fmt(literal, f),
        }
        f.write_str(&buffer)
    }
}

impl From<Literal> for Value {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

/// A fixed-width row of a result set.
///
/// The value at index `i` is bound to the variable at index `i` of the header.
///
/// ```
/// use svresults::{Row, Value};
///
/// let row = Row::from(vec![Some(Value::uri("http://example.com/")), None]);
/// assert_eq!(row.len(), 2);
/// assert_eq!(row.get(0), Some(&Value::uri("http://example.com/")));
/// assert_eq!(row.get(1), None);
/// assert_eq!(row[1], None);
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Row {
    values: Vec<Option<Value>>,
}

impl Row {
    #[inline]
    pub fn new(values: Vec<Option<Value>>) -> Self {
        Self { values }
    }

    /// The number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Is there no column at all?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at the given column, if bound.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Option<Value>> {
        self.values.iter()
    }

    #[inline]
    pub fn into_values(self) -> Vec<Option<Value>> {
        self.values
    }
}

impl From<Vec<Option<Value>>> for Row {
    #[inline]
    fn from(values: Vec<Option<Value>>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Option<Value>> for Row {
    fn from_iter<I: IntoIterator<Item = Option<Value>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Index<usize> for Row {
    type Output = Option<Value>;

    #[inline]
    fn index(&self, index: usize) -> &Option<Value> {
        &self.values[index]
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Option<Value>;
    type IntoIter = std::slice::Iter<'a, Option<Value>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for Row {
    type Item = Option<Value>;
    type IntoIter = std::vec::IntoIter<Option<Value>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
