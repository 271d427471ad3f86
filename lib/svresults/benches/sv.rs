#![allow(clippy::unwrap_used)]

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use svresults::vocab::xsd;
use svresults::{
    Literal, MemoryResults, QueryResultsFormat, QueryResultsParser, QueryResultsSerializer, Row,
    Value, Variable,
};

const ROW_COUNT: usize = 10_000;

fn test_variables() -> Vec<Variable> {
    ["s", "label", "count", "note"]
        .into_iter()
        .map(Variable::new_unchecked)
        .collect()
}

fn test_rows() -> Vec<Row> {
    (0..ROW_COUNT)
        .map(|i| {
            Row::from(vec![
                Some(Value::uri(format!("http://example.com/resource/{i}"))),
                Some(Literal::new_language_tagged_literal(format!("label, number {i}"), "en").into()),
                Some(Literal::new_typed_literal(i.to_string(), xsd::INTEGER).into()),
                (i % 3 == 0).then(|| Literal::new_simple_literal("a \"quoted\"\nnote").into()),
            ])
        })
        .collect()
}

fn serialize(format: QueryResultsFormat, rows: &[Row]) -> Vec<u8> {
    QueryResultsSerializer::from_format(format)
        .serialize_results_to_write(
            Vec::new(),
            MemoryResults::solutions(test_variables(), rows.to_vec()),
        )
        .unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let rows = test_rows();
    for format in QueryResultsFormat::ALL {
        let data = serialize(format, &rows);
        let mut group = c.benchmark_group("parse");
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format.name()),
            &data,
            |b, data| {
                b.iter(|| {
                    for row in QueryResultsParser::from_format(format).parse_slice(data) {
                        row.unwrap();
                    }
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("small buffer", format.name()),
            &data,
            |b, data| {
                b.iter(|| {
                    for row in QueryResultsParser::from_format(format)
                        .with_buffer_capacity(64)
                        .parse_read(data.as_slice())
                    {
                        row.unwrap();
                    }
                })
            },
        );
        group.finish();
    }
}

fn bench_serialize(c: &mut Criterion) {
    let rows = test_rows();
    for format in QueryResultsFormat::ALL {
        let mut group = c.benchmark_group("serialize");
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format.name()),
            &rows,
            |b, rows| {
                b.iter(|| {
                    let mut serializer = QueryResultsSerializer::from_format(format)
                        .serialize_solutions_to_write(Vec::new(), test_variables())
                        .unwrap();
                    for row in rows {
                        serializer.serialize(row).unwrap();
                    }
                    serializer.finish().unwrap()
                })
            },
        );
        group.finish();
    }
}

criterion_group!(sv, bench_parse, bench_serialize);

criterion_main!(sv);
