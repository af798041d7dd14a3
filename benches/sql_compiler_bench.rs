use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use odata_query::config::ResourceConfig;
use odata_query::lexer::Lexer;
use odata_query::memory::MemoryQuery;
use odata_query::parser::Parser;
use odata_query::predicate;
use odata_query::sql_compiler::{SqlDialect, SqlQuery};
use odata_query::{Pipeline, Query};
use serde_json::{json, Value};
use std::hint::black_box;

const FILTERS: &[(&str, &str)] = &[
    ("simple", "firstname eq 'John'"),
    ("medium", "firstname eq 'John' and age gt 2 or balance lt 1.5f"),
    (
        "complex",
        "(firstname contains 'oh' or firstname eq 'Egg') and (age gte 2 or age eq 1) and dateOfBirth lt 2010-01-01T00:00:00Z and userId ne e4c7772b-8947-4e46-98ed-644b417d2a08",
    ),
    (
        "or_chain",
        "age eq 1 or age eq 2 or age eq 3 or age eq 4 or age eq 5 or age eq 6 or age eq 7",
    ),
];

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, filter) in FILTERS {
        group.bench_with_input(BenchmarkId::new("tokenize", name), filter, |b, filter| {
            b.iter(|| {
                let tokens: Vec<_> = Lexer::new(black_box(filter)).collect();
                black_box(tokens)
            })
        });
    }

    group.finish();
}

// 基准测试：语法分析性能
fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, filter) in FILTERS {
        group.bench_with_input(BenchmarkId::new("parse", name), filter, |b, filter| {
            b.iter(|| match Parser::new(Lexer::new(black_box(filter))).try_parse_filter() {
                Ok(expr) => black_box(expr),
                Err(e) => panic!("解析失败: {}", e),
            })
        });
    }

    group.finish();
}

// 基准测试：谓词编译性能
fn benchmark_predicate_compile(c: &mut Criterion) {
    let config = ResourceConfig::sample();
    let mut group = c.benchmark_group("predicate_compile_performance");

    for (name, filter) in FILTERS {
        let expr = odata_query::parse_filter(filter).expect("解析应该成功");

        group.bench_with_input(BenchmarkId::new("compile", name), &expr, |b, expr| {
            b.iter(|| match predicate::compile(black_box(expr), &config.schema) {
                Ok(predicate) => black_box(predicate.render()),
                Err(e) => panic!("编译失败: {}", e),
            })
        });
    }

    group.finish();
}

// 基准测试：完整的 SQL 处理流程
fn benchmark_sql_end_to_end(c: &mut Criterion) {
    let config = ResourceConfig::sample();
    let pipeline = Pipeline::new(&config.schema).with_options(config.options.clone());
    let mut group = c.benchmark_group("sql_end_to_end_performance");

    for (name, filter) in FILTERS {
        let query = Query {
            filter: filter.to_string(),
            order_by: "age desc, firstname".to_string(),
            top: 20,
            skip: 40,
            count: true,
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("full_pipeline", name), &query, |b, query| {
            b.iter(|| {
                let applied = pipeline
                    .apply(SqlQuery::new(config.schema.table_name()), black_box(query))
                    .expect("编译应该成功");
                black_box(applied.query.build(SqlDialect::Postgres))
            })
        });
    }

    group.finish();
}

fn rows(n: usize) -> Vec<Value> {
    let names = ["John", "Jane", "Apple", "Harry", "Doe", "Egg"];
    (0..n)
        .map(|i| {
            json!({
                "firstname": names[i % names.len()],
                "user_age": (i % 7) as i64,
                "balance": i as f64 / 3.0,
                "date_of_birth": format!("20{:02}-01-01T00:00:00Z", i % 24),
                "user_id": "58cdeca3-645b-457c-87aa-7d5f87734255",
            })
        })
        .collect()
}

// 基准测试：内存后端过滤与排序
fn benchmark_memory_backend(c: &mut Criterion) {
    let config = ResourceConfig::sample();
    let pipeline = Pipeline::new(&config.schema);
    let query = Query {
        filter: FILTERS[1].1.to_string(),
        order_by: "age desc, firstname".to_string(),
        top: 50,
        ..Default::default()
    };

    let mut group = c.benchmark_group("memory_backend");

    for size in [100, 1_000, 10_000] {
        let data = rows(size);
        group.bench_with_input(BenchmarkId::new("apply", size), &data, |b, data| {
            b.iter(|| {
                let applied = pipeline
                    .apply(MemoryQuery::new(data.clone()), black_box(&query))
                    .expect("查询应该成功");
                black_box(applied.query.into_rows())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_predicate_compile,
    benchmark_sql_end_to_end,
    benchmark_memory_backend
);
criterion_main!(benches);
