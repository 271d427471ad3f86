use anyhow::Context;
use svresults::tokenizer::{SvEvent, SvTokenizer};
use svresults::{
    Literal, QueryResultsFormat, QueryResultsParser, QueryResultsSerializer, Row, Value,
};

fn tokenize<'a>(
    format: QueryResultsFormat,
    chunks: impl IntoIterator<Item = &'a [u8]>,
) -> Option<Vec<SvEvent>> {
    let mut tokenizer = SvTokenizer::new(format);
    let mut events = Vec::new();
    for chunk in chunks {
        tokenizer.feed(chunk).ok()?;
        events.extend(std::iter::from_fn(|| tokenizer.next_event()));
    }
    tokenizer.end().ok()?;
    events.extend(std::iter::from_fn(|| tokenizer.next_event()));
    assert!(tokenizer.is_end());
    Some(events)
}

fn parse(parser: &QueryResultsParser, data: &[u8]) -> Result<Vec<Row>, String> {
    parser
        .parse_slice(data)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())
}

/// Unbound values are written as empty fields and the empty lines at the end are not rows.
fn normalize(rows: Vec<Row>, width: usize) -> Vec<Row> {
    let empty = Value::from(Literal::new_simple_literal(""));
    let mut rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| Some(value.unwrap_or_else(|| empty.clone())))
                .collect::<Row>()
        })
        .collect::<Vec<_>>();
    if width == 1 {
        while rows.last().is_some_and(|row| row.get(0) == Some(&empty)) {
            rows.pop();
        }
    }
    rows
}

/// Checks that the way the input is cut into chunks changes neither the records nor the rows.
///
/// The 0xFF bytes, never valid UTF-8, are used as chunk separators.
pub fn fuzz_chunk_splits(format: QueryResultsFormat, data: &[u8]) {
    let unsplit = data
        .iter()
        .copied()
        .filter(|c| *c != 0xFF)
        .collect::<Vec<_>>();
    assert_eq!(
        tokenize(format, data.split(|c| *c == 0xFF)),
        tokenize(format, [unsplit.as_slice()])
    );

    let capacity = data.first().map_or(1, |c| usize::from(*c % 16) + 1);
    assert_eq!(
        parse(
            &QueryResultsParser::from_format(format).with_buffer_capacity(capacity),
            &unsplit
        ),
        parse(&QueryResultsParser::from_format(format), &unsplit),
        "buffer capacity {capacity}"
    );
}

/// Checks that writing back the parsed rows and parsing them again gives the same rows.
pub fn fuzz_result_format(format: QueryResultsFormat, data: &[u8]) {
    let mut parser = QueryResultsParser::from_format(format).parse_slice(data);
    let Ok(variables) = parser.ensure_variables().map(<[_]>::to_vec) else {
        return;
    };
    let Ok(rows) = parser.collect::<Result<Vec<_>, _>>() else {
        return;
    };

    // We try to write again
    let mut writer = QueryResultsSerializer::from_format(format)
        .serialize_solutions_to_write(Vec::new(), variables.clone())
        .unwrap();
    for row in &rows {
        writer.serialize(row).unwrap();
    }
    assert_eq!(writer.unsupported_value_count(), 0);
    let serialized = writer.finish().unwrap();

    // And to parse again
    let mut roundtrip = QueryResultsParser::from_format(format).parse_slice(&serialized);
    assert_eq!(
        roundtrip
            .ensure_variables()
            .with_context(|| format!("Parsing {:?}", String::from_utf8_lossy(&serialized)))
            .unwrap(),
        variables
    );
    assert_eq!(
        normalize(
            roundtrip
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Parsing {:?}", String::from_utf8_lossy(&serialized)))
                .unwrap(),
            variables.len()
        ),
        normalize(rows, variables.len())
    );
}
