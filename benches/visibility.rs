//! Performance benchmarks for the visibility pipeline.
//!
//! Run with: `cargo bench --bench visibility`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Access-mode resolution | <100ns | Pure function, no I/O |
//! | Per-edge visibility, unretracted | <5µs | One memoized store round-trip |
//! | Per-edge visibility, memo hit | <1µs | LRU memo hit |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use fact_graph_kernel::{
    resolve_access_mode, AccessMode, FactId, FactRecord, MetaFactBinding, ObjectId, ObjectRecord,
    SecurityContext, Subject, TraversalParams, VisibilityFilter, VisibilityPredicate,
};
use fact_graph_kernel::store::{FactStore, InMemoryFactStore};
use fact_graph_kernel::retraction_fact_type_id;
use uuid::Uuid;

const ORG: u128 = 100;

/// Create a test fact edge.
fn make_fact(id: u128, access_mode: AccessMode) -> FactRecord {
    FactRecord::new(
        FactId::new(Uuid::from_u128(id)),
        Uuid::from_u128(10),
        Uuid::from_u128(ORG),
        Uuid::from_u128(200),
        access_mode,
        1000,
    )
    .with_endpoints(
        ObjectId::new(Uuid::from_u128(1_000_000 + id)),
        ObjectId::new(Uuid::from_u128(2_000_000 + id)),
    )
}

/// Populate a store with `fact_count` public facts, every tenth retracted.
fn build_store(fact_count: u128) -> (Arc<InMemoryFactStore>, Vec<FactRecord>) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(InMemoryFactStore::new());
    let mut facts = Vec::new();

    for id in 1..=fact_count {
        let fact = make_fact(id, AccessMode::Public);
        store.add_object(ObjectRecord::new(
            fact.source_object_id.unwrap(),
            Uuid::from_u128(5),
            "o",
        ));
        store.add_fact(fact.clone());

        if id % 10 == 0 {
            let retraction = FactRecord::new(
                FactId::new(Uuid::from_u128(10_000_000 + id)),
                retraction_fact_type_id(),
                Uuid::from_u128(ORG),
                Uuid::from_u128(200),
                AccessMode::Public,
                2000,
            )
            .with_in_reference_to(fact.id);
            store.add_fact(retraction.clone());
            rt.block_on(store.save_meta_fact_binding(MetaFactBinding::new(fact.id, retraction.id)))
                .unwrap();
        }
        facts.push(fact);
    }

    (store, facts)
}

fn insider_context() -> SecurityContext {
    SecurityContext::new(Subject::new(
        Uuid::from_u128(1),
        "insider",
        Uuid::from_u128(ORG),
    ))
}

/// Benchmark the pure access-mode resolver.
fn bench_resolve_access_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_access_mode");
    group.throughput(Throughput::Elements(1));

    group.bench_function("inherit", |b| {
        b.iter(|| resolve_access_mode(black_box(None), black_box(Some(AccessMode::Explicit))))
    });
    group.bench_function("narrowing", |b| {
        b.iter(|| {
            resolve_access_mode(
                black_box(Some(AccessMode::Explicit)),
                black_box(Some(AccessMode::Public)),
            )
        })
    });
    group.bench_function("widening_rejected", |b| {
        b.iter(|| {
            resolve_access_mode(
                black_box(Some(AccessMode::Public)),
                black_box(Some(AccessMode::Explicit)),
            )
        })
    });

    group.finish();
}

/// Benchmark the full per-edge pipeline over stores of increasing size.
fn bench_visibility_filter(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("visibility_filter");

    for fact_count in [10u128, 100, 1000] {
        let (store, facts) = build_store(fact_count);

        group.throughput(Throughput::Elements(fact_count as u64));
        group.bench_with_input(
            BenchmarkId::new("facts", fact_count),
            &facts,
            |b, facts| {
                b.iter(|| {
                    // Fresh filter per iteration: the memo is per-request.
                    let filter = VisibilityFilter::new(
                        Arc::clone(&store),
                        insider_context(),
                        TraversalParams::default(),
                        10_000,
                    );
                    rt.block_on(async {
                        let mut visible = 0usize;
                        for fact in facts {
                            if filter.visible(black_box(fact)).await.unwrap() {
                                visible += 1;
                            }
                        }
                        visible
                    })
                })
            },
        );
    }

    group.finish();
}

/// Benchmark repeated decisions on one fact (memo hit path).
fn bench_memo_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, facts) = build_store(10);
    let fact = facts[0].clone();

    let filter = VisibilityFilter::new(
        store,
        insider_context(),
        TraversalParams::default(),
        10_000,
    );
    // Warm the memo.
    rt.block_on(filter.visible(&fact)).unwrap();

    let mut group = c.benchmark_group("memo_hit");
    group.throughput(Throughput::Elements(1));
    group.bench_function("visible", |b| {
        b.iter(|| rt.block_on(filter.visible(black_box(&fact))).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_access_mode,
    bench_visibility_filter,
    bench_memo_hit
);
criterion_main!(benches);
