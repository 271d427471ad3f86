#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use std::error::Error;
use std::io;
use svresults::vocab::xsd;
use svresults::{
    Literal, LiteralKind, MemoryResults, QueryResultsFormat, QueryResultsParseError,
    QueryResultsParser, QueryResultsSerializeError, QueryResultsSerializer, ResultKind,
    ResultSet, Row, RowSourceState, Value, Variable,
};

fn variables(names: &[&str]) -> Vec<Variable> {
    names.iter().copied().map(Variable::new_unchecked).collect()
}

fn write(format: QueryResultsFormat, results: MemoryResults) -> Result<Vec<u8>, Box<dyn Error>> {
    Ok(QueryResultsSerializer::from_format(format)
        .serialize_results_to_write(Vec::new(), results)?)
}

#[test]
fn test_csv_parsing_example() -> Result<(), Box<dyn Error>> {
    let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Csv)
        .parse_slice(b"x,y\r\n1,2\r\n");
    assert_eq!(parser.ensure_variables()?, variables(&["x", "y"]));
    assert_eq!(
        parser.read_row()?,
        Some(Row::from(vec![
            Some(Literal::new_simple_literal("1").into()),
            Some(Literal::new_simple_literal("2").into())
        ]))
    );
    assert_eq!(parser.read_row()?, None);
    assert_eq!(parser.state(), RowSourceState::Exhausted);
    Ok(())
}

#[test]
fn test_tsv_writing_example() -> Result<(), Box<dyn Error>> {
    let results = MemoryResults::solutions(
        variables(&["x", "y"]),
        vec![Row::from(vec![
            Some(Literal::new_typed_literal("1", xsd::INTEGER).into()),
            Some(Literal::new_typed_literal("2", xsd::INTEGER).into()),
        ])],
    );
    assert_eq!(write(QueryResultsFormat::Tsv, results)?, b"?x\t?y\n1\t2\n");
    Ok(())
}

#[test]
fn test_csv_quoting_example() -> Result<(), Box<dyn Error>> {
    let results = MemoryResults::solutions(
        variables(&["v"]),
        vec![Row::from(vec![Some(
            Literal::new_simple_literal("a,b\"c").into(),
        )])],
    );
    assert_eq!(write(QueryResultsFormat::Csv, results)?, b"v\r\n\"a,b\"\"c\"\r\n");
    Ok(())
}

#[test]
fn test_csv_quoting_property() -> Result<(), Box<dyn Error>> {
    let values = [
        "", "plain", "with space", "tab\there", "'", "\"", ",", "\r", "\n", "a\r\nb",
        "\"start", "end\"", "mixed,\"\n", "caf\u{e9}",
    ];
    for value in values {
        let results = MemoryResults::solutions(
            variables(&["v"]),
            vec![Row::from(vec![Some(Literal::new_simple_literal(value).into())])],
        );
        let output = String::from_utf8(write(QueryResultsFormat::Csv, results)?)?;
        let field = output
            .strip_prefix("v\r\n")
            .and_then(|o| o.strip_suffix("\r\n"))
            .ok_or("unexpected framing")?;
        if value.contains(['"', ',', '\r', '\n']) {
            assert_eq!(field, format!("\"{}\"", value.replace('"', "\"\"")));
        } else {
            assert_eq!(field, value);
        }
    }
    Ok(())
}

#[test]
fn test_round_trip() -> Result<(), Box<dyn Error>> {
    let rows = vec![
        Row::from(vec![
            Some(Value::uri("http://example.com/a")),
            Some(Literal::new_simple_literal("simple").into()),
        ]),
        Row::from(vec![
            Some(Value::uri("http://example.com/with,comma")),
            Some(Literal::new_simple_literal("quote \" comma , tab \t").into()),
        ]),
        Row::from(vec![
            Some(Literal::new_simple_literal("").into()),
            Some(Literal::new_simple_literal("multi\r\nline\nvalue").into()),
        ]),
        Row::from(vec![
            Some(Literal::new_simple_literal("back\\slash").into()),
            Some(Literal::new_simple_literal("caf\u{e9} \u{1F600}").into()),
        ]),
        Row::from(vec![
            Some(Value::uri("http://example.com/\"q\">")),
            Some(Literal::new_simple_literal("<not an IRI>").into()),
        ]),
    ];
    for format in QueryResultsFormat::ALL {
        let output = write(
            format,
            MemoryResults::solutions(variables(&["a", "b"]), rows.clone()),
        )?;
        let mut parser = QueryResultsParser::from_format(format).parse_slice(&output);
        assert_eq!(parser.ensure_variables()?, variables(&["a", "b"]));
        let parsed = parser.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(parsed, rows, "{format}");
    }
    Ok(())
}

#[test]
fn test_lossy_values() -> Result<(), Box<dyn Error>> {
    let results = MemoryResults::solutions(
        variables(&["l", "t", "b", "n"]),
        vec![Row::from(vec![
            Some(Literal::new_language_tagged_literal("chat", "fr").into()),
            Some(Literal::new_typed_literal("true", xsd::BOOLEAN).into()),
            Some(Value::blank_node("b0")),
            Some(Literal::new_typed_literal("12.5", xsd::DECIMAL).into()),
        ])],
    );
    let output = write(QueryResultsFormat::Tsv, results)?;
    assert_eq!(
        output,
        b"?l\t?t\t?b\t?n\n\"chat\"@fr\t\"true\"^^<http://www.w3.org/2001/XMLSchema#boolean>\t_:b0\t12.5\n"
    );
    let row = QueryResultsParser::from_format(QueryResultsFormat::Tsv)
        .parse_slice(&output)
        .next()
        .ok_or("a row is expected")??;
    assert_eq!(
        row.into_values(),
        ["chat", "true", "_:b0", "12.5"]
            .into_iter()
            .map(|v| Some(Value::from(Literal::new_simple_literal(v))))
            .collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn test_uri_heuristic() -> Result<(), Box<dyn Error>> {
    let row = QueryResultsParser::from_format(QueryResultsFormat::Csv)
        .parse_slice(b"a,b,c,d,e\r\nhttp://a,http://,HTTP://a,urn:x,https://a\r\n")
        .next()
        .ok_or("a row is expected")??;
    let kinds = row
        .iter()
        .map(|v| v.as_ref().is_some_and(Value::is_uri))
        .collect::<Vec<_>>();
    assert_eq!(kinds, [true, false, false, false, false]);
    Ok(())
}

#[test]
fn test_unsupported_values_are_skipped() -> Result<(), Box<dyn Error>> {
    let results = MemoryResults::solutions(
        variables(&["a", "b", "c"]),
        vec![Row::from(vec![
            Some(Literal::new_with_kind("true", LiteralKind::Boolean).into()),
            Some(Literal::new_with_kind("ex:foo", LiteralKind::QName).into()),
            Some(Literal::new_simple_literal("kept").into()),
        ])],
    );
    assert_eq!(write(QueryResultsFormat::Tsv, results)?, b"?a\t?b\t?c\n\t\t\"kept\"\n");
    Ok(())
}

#[test]
fn test_unsupported_result_kinds() {
    for kind in [ResultKind::Boolean, ResultKind::Graph] {
        let mut output = Vec::new();
        let is_unsupported = matches!(
            QueryResultsSerializer::from_format(QueryResultsFormat::Csv)
                .serialize_results_to_write(
                    &mut output,
                    MemoryResults::new(kind, Vec::new(), Vec::new()),
                ),
            Err(QueryResultsSerializeError::UnsupportedResultKind { .. })
        );
        assert!(is_unsupported);
        assert!(output.is_empty());
    }
}

#[test]
fn test_parser_as_result_set() -> Result<(), Box<dyn Error>> {
    let mut parser = QueryResultsParser::from_format(QueryResultsFormat::Csv)
        .parse_slice(b"s\r\nhttp://example.com/\r\n");
    assert_eq!(parser.kind(), ResultKind::Bindings);
    let output = QueryResultsSerializer::from_format(QueryResultsFormat::Tsv)
        .serialize_results_to_write(Vec::new(), &mut parser)?;
    assert_eq!(output, b"?s\n<http://example.com/>\n");
    assert_eq!(parser.state(), RowSourceState::Exhausted);
    Ok(())
}

#[test]
fn test_bad_inputs() {
    let bad_csvs: [&[u8]; 5] = [
        b"x,x\r\n",
        b"x\r\n\"unterminated",
        b"x\r\na\"b\r\n",
        b"x\r\n\"a\"b\r\n",
        b"x\r\n\xFF\r\n",
    ];
    for bad_csv in bad_csvs {
        let result = QueryResultsParser::from_format(QueryResultsFormat::Csv)
            .parse_slice(bad_csv)
            .collect::<Result<Vec<_>, _>>();
        assert!(
            matches!(result, Err(QueryResultsParseError::Syntax(_))),
            "{}",
            String::from_utf8_lossy(bad_csv)
        );
    }
    let bad_tsvs: [&[u8]; 4] = [b"?p\n<", b"?p\n\"", b"?p\n\"a\"b", b"?p\n\"\\q\""];
    for bad_tsv in bad_tsvs {
        let result = QueryResultsParser::from_format(QueryResultsFormat::Tsv)
            .parse_slice(bad_tsv)
            .collect::<Result<Vec<_>, _>>();
        assert!(result.is_err(), "{}", String::from_utf8_lossy(bad_tsv));
    }
}

#[test]
fn test_row_width_mismatches() -> Result<(), Box<dyn Error>> {
    let inputs: [(QueryResultsFormat, &[u8]); 2] = [
        (QueryResultsFormat::Csv, b"x,y\r\n1\r\n"),
        (QueryResultsFormat::Tsv, b"?x\t?y\n\"1\"\t\"2\"\t\"3\"\n\"1\"\n"),
    ];
    for (format, data) in inputs {
        let rows = QueryResultsParser::from_format(format)
            .parse_slice(data)
            .collect::<Result<Vec<_>, _>>()?;
        assert!(rows.iter().all(|row| row.len() == 2), "{format}");
        assert!(rows.iter().all(|row| row.get(0).is_some()), "{format}");

        let result = QueryResultsParser::from_format(format)
            .with_strict_row_width()
            .parse_slice(data)
            .collect::<Result<Vec<_>, _>>();
        assert!(
            matches!(result, Err(QueryResultsParseError::Syntax(_))),
            "{format}"
        );
    }
    Ok(())
}

#[test]
fn test_trailing_empty_line() -> Result<(), Box<dyn Error>> {
    for (format, data) in [
        (QueryResultsFormat::Csv, b"x,y\r\n1,2\r\n\r\n".as_slice()),
        (QueryResultsFormat::Csv, b"x\r\n1\r\n\r\n".as_slice()),
        (QueryResultsFormat::Tsv, b"?x\t?y\n1\t2\n\n".as_slice()),
    ] {
        let rows = QueryResultsParser::from_format(format)
            .with_strict_row_width()
            .parse_slice(data)
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(rows.len(), 1, "{}", String::from_utf8_lossy(data));
    }
    Ok(())
}

#[test]
fn test_separator_only_record() {
    let data = format!("x\r\n{}\r\n", ",".repeat(100_000));
    let result = QueryResultsParser::from_format(QueryResultsFormat::Csv)
        .with_max_record_size(8)
        .lenient()
        .parse_slice(data.as_bytes())
        .collect::<Result<Vec<_>, _>>();
    let Err(QueryResultsParseError::Io(error)) = result else {
        panic!("an I/O error is expected")
    };
    assert_eq!(error.kind(), io::ErrorKind::OutOfMemory);
}

#[test]
fn test_huge_record() {
    let data = format!("?p\n{}\n", "a".repeat(100_000));
    let result = QueryResultsParser::from_format(QueryResultsFormat::Tsv)
        .with_max_record_size(10_000)
        .parse_slice(data.as_bytes())
        .collect::<Result<Vec<_>, _>>();
    let Err(QueryResultsParseError::Io(error)) = result else {
        panic!("an I/O error is expected")
    };
    assert_eq!(error.kind(), io::ErrorKind::OutOfMemory);
}

#[test]
fn test_error_conversion_to_io() {
    let error = QueryResultsParser::from_format(QueryResultsFormat::Csv)
        .parse_slice(b"x\r\n\"")
        .next()
        .and_then(Result::err)
        .map(io::Error::from);
    assert_eq!(error.map(|e| e.kind()), Some(io::ErrorKind::InvalidData));
}
