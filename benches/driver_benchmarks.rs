//! Criterion benchmarks for unidriver

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use unidriver::backends::memory::{CannedResponse, MemoryConnectionHandle};
use unidriver::prelude::*;

// ============================================================================
// Value Benchmarks
// ============================================================================

fn bench_value_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("long", |b| {
        b.iter(|| {
            let value = Value::from(black_box(123456789i64));
            black_box(value)
        });
    });

    group.bench_function("string", |b| {
        b.iter(|| {
            let value = Value::from(black_box("Hello, World!".to_string()));
            black_box(value)
        });
    });

    group.bench_function("bytes", |b| {
        let data = vec![1u8, 2, 3, 4, 5];
        b.iter(|| {
            let value = Value::from(black_box(data.clone()));
            black_box(value)
        });
    });

    group.finish();
}

fn bench_value_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_conversions");
    group.throughput(Throughput::Elements(1));

    group.bench_function("string_to_long", |b| {
        let value = Value::String("123456789".to_string());
        b.iter(|| black_box(value.as_long()));
    });

    group.bench_function("long_to_string", |b| {
        let value = Value::Long(123456789);
        b.iter(|| black_box(value.as_string()));
    });

    group.finish();
}

// ============================================================================
// Driver Flow Benchmarks
// ============================================================================

fn scripted_driver(rows: i64) -> MemoryDriver {
    let mut response = CannedResponse::new().columns(["id", "name"]);
    for i in 0..rows {
        response = response.row([Value::Long(i), Value::from("name")]);
    }

    let handle = MemoryConnectionHandle::new();
    handle.set_default_response(response);
    MemoryDriver::with_defaults(ConnectionSource::Handle(handle))
}

fn bench_statement_creation(c: &mut Criterion) {
    let driver = scripted_driver(0);
    let mut group = c.benchmark_group("statement_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("from_sql", |b| {
        b.iter(|| {
            let statement = driver
                .create_statement(black_box("SELECT id, name FROM users"))
                .unwrap();
            black_box(statement)
        });
    });

    group.finish();
}

fn bench_cursor_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor_iteration");

    for rows in [1i64, 16, 256] {
        let driver = scripted_driver(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                let mut statement = driver.create_statement("SELECT id, name FROM users").unwrap();
                let mut result = statement.execute(&[]).unwrap();
                let mut fetched = 0u64;
                while let Some(row) = result.advance().unwrap() {
                    black_box(&row);
                    fetched += 1;
                }
                black_box(fetched)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_value_creation,
    bench_value_conversions,
    bench_statement_creation,
    bench_cursor_iteration
);
criterion_main!(benches);
