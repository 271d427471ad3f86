//! Field escaping for the two separated-values dialects.
//!
//! CSV only quotes a field when it contains a byte that would be read as structure.
//! TSV writes terms with the N-Triples string escapes.

use std::borrow::Cow;

/// Does the field need to be enclosed in double quotes in CSV?
#[inline]
pub fn needs_csv_quoting(value: &[u8]) -> bool {
    value.iter().any(|c| matches!(c, b'"' | b',' | b'\n' | b'\r'))
}

/// Writes a CSV field, quoting it on demand.
///
/// ```
/// let mut output = String::new();
/// svresults::escape::write_csv_field(&mut output, "a,b\"c");
/// assert_eq!(output, "\"a,b\"\"c\"");
/// ```
pub fn write_csv_field(output: &mut String, value: &str) {
    if needs_csv_quoting(value.as_bytes()) {
        output.push('"');
        for c in value.chars() {
            if c == '"' {
                output.push('"');
            }
            output.push(c);
        }
        output.push('"');
    } else {
        output.push_str(value)
    }
}

/// Writes `value` with the N-Triples string escapes.
///
/// `delimiter` is the quote character that must be escaped, if any.
/// Non-ASCII characters are written as they are.
///
/// ```
/// let mut output = String::new();
/// svresults::escape::write_ntriples_escaped(&mut output, "a\t\"b\"", Some('"'));
/// assert_eq!(output, "a\\t\\\"b\\\"");
/// ```
pub fn write_ntriples_escaped(output: &mut String, value: &str, delimiter: Option<char>) {
    for c in value.chars() {
        match c {
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            '\u{8}' => output.push_str("\\b"),
            '\u{c}' => output.push_str("\\f"),
            c if Some(c) == delimiter => {
                output.push('\\');
                output.push(c);
            }
            c if c.is_ascii_control() => {
                let code = u32::from(c);
                output.push_str("\\u00");
                for shift in [4, 0] {
                    output.extend(
                        char::from_digit((code >> shift) & 0xF, 16).map(|d| d.to_ascii_uppercase()),
                    );
                }
            }
            c => output.push(c),
        }
    }
}

/// Writes an IRI between `<` and `>`.
///
/// The escapes are the ones of string literals, `"` included. A `>` inside of the IRI is kept
/// as it is: readers take the last character of the field as the closing bracket.
///
/// ```
/// let mut output = String::new();
/// svresults::escape::write_iri(&mut output, "http://example.com/\"a>b\"");
/// assert_eq!(output, "<http://example.com/\\\"a>b\\\">");
/// ```
pub fn write_iri(output: &mut String, iri: &str) {
    output.push('<');
    write_ntriples_escaped(output, iri, Some('"'));
    output.push('>');
}

/// Writes a blank node as `_:` followed by its label.
///
/// ASCII characters that are not allowed in a N-Triples label are replaced by `_`.
pub fn write_blank_node(output: &mut String, id: &str) {
    output.push_str("_:");
    for c in id.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') || !c.is_ascii() {
            output.push(c);
        } else {
            output.push('_');
        }
    }
}

/// Reverts [`write_ntriples_escaped`].
pub fn unescape_ntriples(value: &str) -> Result<Cow<'_, str>, String> {
    if !value.contains('\\') {
        return Ok(Cow::Borrowed(value));
    }
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => output.push('\t'),
            Some('b') => output.push('\u{8}'),
            Some('n') => output.push('\n'),
            Some('r') => output.push('\r'),
            Some('f') => output.push('\u{c}'),
            Some(c @ ('"' | '\'' | '\\' | '>')) => output.push(c),
            Some('u') => output.push(read_code_point(&mut chars, 4)?),
            Some('U') => output.push(read_code_point(&mut chars, 8)?),
            Some(c) => return Err(format!("Unexpected escape sequence '\\{c}'")),
            None => return Err("Unexpected end of string after '\\'".into()),
        }
    }
    Ok(Cow::Owned(output))
}

fn read_code_point(chars: &mut std::str::Chars<'_>, len: usize) -> Result<char, String> {
    let mut code_point = 0;
    for _ in 0..len {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| format!("Expecting {len} hexadecimal digits after an escape"))?;
        code_point = code_point * 16 + digit;
    }
    char::from_u32(code_point)
        .ok_or_else(|| format!("The escaped code point U+{code_point:X} is not a valid character"))
}

/// Decodes a TSV field to the text it carries.
///
/// IRIs lose their `<` `>` brackets, quoted strings their quotes along with any language tag
/// or datatype suffix. Other fields (numbers, blank nodes...) are kept as they are.
///
/// ```
/// use svresults::escape::decode_tsv_field;
///
/// assert_eq!(decode_tsv_field("<http://example.com/>").unwrap(), "http://example.com/");
/// assert_eq!(decode_tsv_field("\"a\\tb\"@en").unwrap(), "a\tb");
/// assert_eq!(decode_tsv_field("12").unwrap(), "12");
/// ```
pub fn decode_tsv_field(field: &str) -> Result<Cow<'_, str>, String> {
    if let Some(iri) = field.strip_prefix('<') {
        let iri = iri
            .strip_suffix('>')
            .ok_or_else(|| format!("Unterminated IRI in field {field}"))?;
        return unescape_ntriples(iri);
    }
    let Some(rest) = field.strip_prefix('"') else {
        return Ok(Cow::Borrowed(field));
    };
    let bytes = rest.as_bytes();
    let mut i = 0;
    let end = loop {
        match bytes.get(i) {
            Some(b'\\') => i += 2,
            Some(b'"') => break i,
            Some(_) => i += 1,
            None => return Err(format!("Unterminated string in field {field}")),
        }
    };
    let suffix = &rest[end + 1..];
    if !suffix.is_empty() && !suffix.starts_with('@') && !suffix.starts_with("^^") {
        return Err(format!(
            "Unexpected content '{suffix}' after the closing quote of {field}"
        ));
    }
    unescape_ntriples(&rest[..end])
}
