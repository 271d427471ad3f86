//! [XML Schema](https://www.w3.org/TR/xmlschema11-2/) datatypes the codec knows about.

/// Datatype IRIs.
pub mod xsd {
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

/// The numeric datatypes written without quotes nor datatype in TSV.
///
/// Derived types like `xsd:int` or `xsd:long` are not part of it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum NumericDatatype {
    Integer,
    Float,
    Double,
    Decimal,
}

impl NumericDatatype {
    /// Looks for the numeric datatype identified by the given IRI.
    ///
    /// ```
    /// use svresults::vocab::{NumericDatatype, xsd};
    ///
    /// assert_eq!(NumericDatatype::from_iri(xsd::DECIMAL), Some(NumericDatatype::Decimal));
    /// assert_eq!(NumericDatatype::from_iri(xsd::INT), None);
    /// ```
    #[inline]
    pub fn from_iri(iri: &str) -> Option<Self> {
        match iri {
            xsd::INTEGER => Some(Self::Integer),
            xsd::FLOAT => Some(Self::Float),
            xsd::DOUBLE => Some(Self::Double),
            xsd::DECIMAL => Some(Self::Decimal),
            _ => None,
        }
    }

    #[inline]
    pub const fn iri(self) -> &'static str {
        match self {
            Self::Integer => xsd::INTEGER,
            Self::Float => xsd::FLOAT,
            Self::Double => xsd::DOUBLE,
            Self::Decimal => xsd::DECIMAL,
        }
    }

    /// Checks that `value` is in the lexical space of the datatype.
    pub fn is_valid_lexical_form(self, value: &str) -> bool {
        match self {
            Self::Integer => is_xsd_integer(value),
            Self::Decimal => is_xsd_decimal(value),
            Self::Float | Self::Double => is_xsd_double(value),
        }
    }
}

/// Lexical validity of `value` for `datatype`, if the datatype is known.
pub(crate) fn check_lexical_form(datatype: &str, value: &str) -> Option<bool> {
    if let Some(numeric) = NumericDatatype::from_iri(datatype) {
        return Some(numeric.is_valid_lexical_form(value));
    }
    match datatype {
        xsd::BOOLEAN => Some(matches!(value, "true" | "false" | "1" | "0")),
        xsd::STRING => Some(true),
        xsd::INT | xsd::LONG => Some(is_xsd_integer(value)),
        _ => None,
    }
}

fn strip_sign(value: &[u8]) -> &[u8] {
    value
        .strip_prefix(b"+")
        .or_else(|| value.strip_prefix(b"-"))
        .unwrap_or(value)
}

fn strip_digits(value: &[u8]) -> (&[u8], bool) {
    let count = value.iter().take_while(|c| c.is_ascii_digit()).count();
    (&value[count..], count > 0)
}

fn is_xsd_integer(value: &str) -> bool {
    // [+-]? [0-9]+
    let value = strip_sign(value.as_bytes());
    !value.is_empty() && value.iter().all(u8::is_ascii_digit)
}

fn is_xsd_decimal(value: &str) -> bool {
    // [+-]? ([0-9]+ ('.' [0-9]*)? | '.' [0-9]+)
    let (value, with_before) = strip_digits(strip_sign(value.as_bytes()));
    if value.is_empty() {
        return with_before;
    }
    let Some(value) = value.strip_prefix(b".") else {
        return false;
    };
    let (value, with_after) = strip_digits(value);
    value.is_empty() && (with_before || with_after)
}

fn is_xsd_double(value: &str) -> bool {
    // [+-]? ([0-9]+ ('.' [0-9]*)? | '.' [0-9]+) ([Ee] [+-]? [0-9]+)? | [+-]? INF | NaN
    if matches!(value, "INF" | "+INF" | "-INF" | "NaN") {
        return true;
    }
    let (mut value, with_before) = strip_digits(strip_sign(value.as_bytes()));
    let mut with_after = false;
    if let Some(v) = value.strip_prefix(b".") {
        (value, with_after) = strip_digits(v);
    }
    if !with_before && !with_after {
        return false;
    }
    if value.is_empty() {
        return true;
    }
    let Some(exponent) = value.strip_prefix(b"e").or_else(|| value.strip_prefix(b"E")) else {
        return false;
    };
    let (rest, with_exponent) = strip_digits(strip_sign(exponent));
    with_exponent && rest.is_empty()
}
