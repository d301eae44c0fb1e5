//! Benchmark for the ingest and sizing path
//!
//! Target: 10K-client exports sized well under a second

use capacity_sizer::{AssemblerOptions, RecordAssembler, SizingEngine};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const CLIENTS: usize = 10_000;

/// Export with a size row and a throughput row per client, interleaved
/// with some noise the assembler has to skip
fn synthetic_export(clients: usize) -> String {
    let mut text = String::new();
    for i in 0..clients {
        text.push_str(&format!(
            "client-{i:05}\t{} GB\t{}.5 GB\t1.00%\n",
            i % 500,
            (i * 7) % 3000
        ));
        text.push_str(&format!(
            "client-{i:05}\t{}.25\t{}.75\t60%\t40%\n",
            (i * 13) % 5000,
            (i * 3) % 2000
        ));
        if i % 100 == 0 {
            text.push_str("Summary row without a shape\n\n");
        }
    }
    text
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");
    let text = synthetic_export(CLIENTS);
    group.throughput(Throughput::Elements((CLIENTS * 2) as u64));

    group.bench_function("assemble_10k_clients", |b| {
        b.iter(|| RecordAssembler::assemble_text(black_box(&text), AssemblerOptions::default()));
    });

    group.bench_function("assemble_10k_clients_strict", |b| {
        b.iter(|| {
            RecordAssembler::assemble_text(black_box(&text), AssemblerOptions { strict: true })
        });
    });

    group.finish();
}

fn bench_sizing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sizing");
    group.throughput(Throughput::Elements(CLIENTS as u64));

    let engine = SizingEngine::default();
    let dataset = engine
        .ingest(&synthetic_export(CLIENTS), AssemblerOptions::default())
        .dataset;

    group.bench_function("recommend_tiers", |b| {
        b.iter(|| engine.recommend_tiers(black_box(&dataset)));
    });

    group.bench_function("allocate", |b| {
        b.iter(|| engine.allocate(black_box(&dataset)));
    });

    group.finish();
}

criterion_group!(benches, bench_assemble, bench_sizing);
criterion_main!(benches);
