use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kql_compiler::lexer::Lexer;
use kql_compiler::parser::Parser;
use kql_compiler::{FieldType, QueryCompiler, StaticSchema};
use std::hint::black_box;

const TEST_CASES: [(&str, &str); 4] = [
    ("simple", "status:open"),
    ("medium", r#"status:open AND priority >= 2 AND NOT assignee:"jane doe""#),
    (
        "complex",
        r#"(title:"release plan" OR title:(version 1)) AND created < now-7d AND NOT tags:wont* AND host.*:*"#,
    ),
    ("field_less", r#"error* AND "connection refused" OR timeout"#),
];

fn create_schema(extra_fields: usize) -> StaticSchema {
    let mut schema = StaticSchema::new()
        .with_field("status", FieldType::Keyword)
        .with_field("priority", FieldType::Numeric)
        .with_field("assignee", FieldType::Keyword)
        .with_field("title", FieldType::Text)
        .with_field("created", FieldType::Date)
        .with_field("tags", FieldType::Keyword);
    for i in 0..extra_fields {
        schema.insert(format!("host.field_{i}"), FieldType::Keyword);
    }
    schema
}

fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, query) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &query, |b, &query| {
            b.iter(|| black_box(Lexer::tokenize(black_box(query))))
        });
    }

    group.finish();
}

fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, query) in TEST_CASES {
        let tokens = Lexer::tokenize(query);

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| {
                let mut parser = Parser::new(black_box(tokens));
                match parser.parse() {
                    Ok(tree) => black_box(tree),
                    Err(e) => panic!("parse failed: {e}"),
                }
            })
        });
    }

    group.finish();
}

fn benchmark_query_compiler(c: &mut Criterion) {
    let compiler = QueryCompiler::new(create_schema(8));
    let mut group = c.benchmark_group("query_compiler_performance");

    for (name, query) in TEST_CASES {
        let tokens = Lexer::tokenize(query);
        let tree = Parser::new(&tokens)
            .parse()
            .expect("query should parse")
            .expect("query should not be empty");

        group.bench_with_input(BenchmarkId::new("compile_tree", name), &tree, |b, tree| {
            b.iter(|| black_box(compiler.compile_node(black_box(tree)).expect("compile failed")))
        });
    }

    group.finish();
}

fn benchmark_end_to_end(c: &mut Criterion) {
    let compiler = QueryCompiler::new(create_schema(8));
    let mut group = c.benchmark_group("end_to_end_performance");

    for (name, query) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("full_pipeline", name), &query, |b, &query| {
            b.iter(|| black_box(compiler.compile(black_box(query)).expect("compile failed")))
        });
    }

    group.finish();
}

fn benchmark_field_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_fan_out");

    for fields in [10, 100, 1000] {
        let compiler = QueryCompiler::new(create_schema(fields));
        group.bench_with_input(BenchmarkId::new("pattern", fields), &compiler, |b, compiler| {
            b.iter(|| black_box(compiler.compile(black_box("host.*:foo*")).expect("compile failed")))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_query_compiler,
    benchmark_end_to_end,
    benchmark_field_fan_out
);
criterion_main!(benches);
