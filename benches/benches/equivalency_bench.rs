//! # Equivalency Benchmarks
//!
//! Measures the engine on flat objects, nested graphs and collections under
//! strict and loose ordering. Loose ordering is O(k²) pair trials in the
//! worst case, so reversed inputs are the interesting ones.
//!
//! Run: `cargo bench --bench equivalency_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::Serialize;
use sil_equivalency::prelude::*;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Address {
    street: String,
    city: String,
    zip: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Customer {
    id: u64,
    name: String,
    age: u32,
    address: Address,
    tags: Vec<String>,
}

fn customer(id: u64) -> Customer {
    Customer {
        id,
        name: format!("customer-{id}"),
        age: 20 + (id % 50) as u32,
        address: Address {
            street: format!("Rua {id}"),
            city: "Recife".into(),
            zip: format!("{:05}-000", id),
        },
        tags: vec!["vip".into(), format!("group-{}", id % 7)],
    }
}

/// Benchmark de objetos isolados
fn bench_objects(c: &mut Criterion) {
    let mut group = c.benchmark_group("objects");

    let subject = Value::from_serialize(&customer(1));
    let expectation = Value::from_serialize(&customer(1));
    let different = Value::from_serialize(&customer(2));
    let engine = EquivalencyEngine::default();

    group.bench_function("equivalent", |b| {
        b.iter(|| black_box(engine.compare(&subject, &expectation)))
    });

    group.bench_function("all_members_differ", |b| {
        b.iter(|| black_box(engine.compare(&subject, &different)))
    });

    group.bench_function("from_serialize", |b| {
        let value = customer(1);
        b.iter(|| black_box(Value::from_serialize(&value)))
    });

    group.finish();
}

/// Benchmark de coleções: ordem estrita vs. livre
fn bench_collections(c: &mut Criterion) {
    let mut group = c.benchmark_group("collections");

    for size in [10usize, 50, 100] {
        let customers: Vec<Customer> = (0..size as u64).map(customer).collect();
        let mut reversed = customers.clone();
        reversed.reverse();

        let expectation = Value::from_serialize(&customers);
        let same_order = Value::from_serialize(&customers);
        let reversed = Value::from_serialize(&reversed);

        let loose = EquivalencyEngine::default();
        let strict = EquivalencyEngine::new(EquivalencyOptions::default().with_strict_ordering());

        group.bench_with_input(BenchmarkId::new("strict", size), &size, |b, _| {
            b.iter(|| black_box(strict.compare(&same_order, &expectation)))
        });

        group.bench_with_input(BenchmarkId::new("loose_same_order", size), &size, |b, _| {
            b.iter(|| black_box(loose.compare(&same_order, &expectation)))
        });

        group.bench_with_input(BenchmarkId::new("loose_reversed", size), &size, |b, _| {
            b.iter(|| black_box(loose.compare(&reversed, &expectation)))
        });
    }

    group.finish();
}

/// Benchmark de profundidade: cadeia de objetos aninhados
fn bench_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth");

    fn chain(depth: usize) -> Value {
        let mut value = Value::from("leaf");
        for level in 0..depth {
            value = Value::object(Record::new("Node").with("Level", level).with("Next", value));
        }
        value
    }

    for depth in [5usize, 10, 50] {
        let subject = chain(depth);
        let expectation = chain(depth);
        let engine = EquivalencyEngine::new(EquivalencyOptions::default().allowing_infinite_recursion());

        group.bench_with_input(BenchmarkId::new("unbounded", depth), &depth, |b, _| {
            b.iter(|| black_box(engine.compare(&subject, &expectation)))
        });
    }

    group.finish();
}

/// Benchmark de configuração com seleção e regras
fn bench_configured(c: &mut Criterion) {
    let mut group = c.benchmark_group("configured");

    let customers: Vec<Customer> = (0..50).map(customer).collect();
    let subject = Value::from_serialize(&customers);
    let expectation = Value::from_serialize(&customers);

    let engine = EquivalencyEngine::new(
        EquivalencyOptions::default()
            .excluding("Address.Zip")
            .excluding("[].Tags")
            .using_tolerance("Age", 1.0),
    );

    group.bench_function("exclusions_and_tolerance", |b| {
        b.iter(|| black_box(engine.compare(&subject, &expectation)))
    });

    group.finish();
}

criterion_group!(benches, bench_objects, bench_collections, bench_depth, bench_configured);
criterion_main!(benches);
