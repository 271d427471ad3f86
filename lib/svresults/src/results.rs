//! The result sets the serializer consumes.

use crate::model::{Row, Variable};
use std::collections::VecDeque;
use std::{fmt, io};

/// The shape of a query result.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ResultKind {
    /// A table of variable bindings (`SELECT` queries).
    Bindings,
    /// A single boolean (`ASK` queries).
    Boolean,
    /// An RDF graph (`CONSTRUCT` and `DESCRIBE` queries).
    Graph,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bindings => "bindings",
            Self::Boolean => "boolean",
            Self::Graph => "graph",
        })
    }
}

/// A result set as provided by a query engine.
///
/// Rows are consumed: once returned by [`next_row`](Self::next_row) they are not kept by the result set.
pub trait ResultSet {
    fn kind(&self) -> ResultKind;

    /// The ordered and unique list of variables of the header.
    fn variables(&mut self) -> io::Result<&[Variable]>;

    /// The next row or `None` if all the rows have been consumed.
    fn next_row(&mut self) -> io::Result<Option<Row>>;
}

impl<T: ResultSet + ?Sized> ResultSet for &mut T {
    fn kind(&self) -> ResultKind {
        (**self).kind()
    }

    fn variables(&mut self) -> io::Result<&[Variable]> {
        (**self).variables()
    }

    fn next_row(&mut self) -> io::Result<Option<Row>> {
        (**self).next_row()
    }
}

/// A [`ResultSet`] fully stored in memory.
///
/// ```
/// use svresults::{Literal, MemoryResults, ResultSet, Row, Variable};
///
/// let mut results = MemoryResults::solutions(
///     vec![Variable::new("x")?],
///     vec![Row::from(vec![Some(Literal::new_simple_literal("a").into())])],
/// );
/// assert!(results.next_row()?.is_some());
/// assert!(results.next_row()?.is_none());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct MemoryResults {
    kind: ResultKind,
    variables: Vec<Variable>,
    rows: VecDeque<Row>,
}

impl MemoryResults {
    pub fn new(kind: ResultKind, variables: Vec<Variable>, rows: Vec<Row>) -> Self {
        Self {
            kind,
            variables,
            rows: rows.into(),
        }
    }

    /// Variable bindings.
    pub fn solutions(variables: Vec<Variable>, rows: Vec<Row>) -> Self {
        Self::new(ResultKind::Bindings, variables, rows)
    }

    /// Number of rows not consumed yet.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl ResultSet for MemoryResults {
    fn kind(&self) -> ResultKind {
        self.kind
    }

    fn variables(&mut self) -> io::Result<&[Variable]> {
        Ok(&self.variables)
    }

    fn next_row(&mut self) -> io::Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}
