//! # Ledger Ingest Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | li-01 key codec | block key encode/decode |
//! | li-01 ledger store | put + cursor per block, full validation pass |
//! | li-02 reassembly | shuffled page through the engine into memory |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use li_01_ledger_store::test_utils::make_block;
use li_01_ledger_store::{decode_block_key, encode_block_key, InMemoryKVStore, LedgerStore};
use li_02_block_assembly::test_utils::RecordingWriter;
use li_02_block_assembly::{AssemblyConfig, ReassemblyEngine};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared_types::LedgerEvent;

fn page_events(start: u64, len: u64, tx_per_block: u32, seed: u64) -> Vec<LedgerEvent> {
    let mut events = Vec::new();
    for n in start..start + len {
        let mut header = make_block(n, tx_per_block);
        let transactions = std::mem::take(&mut header.transactions);
        events.push(LedgerEvent::Block(header));
        events.extend(transactions.into_iter().map(LedgerEvent::Transaction));
    }
    events.shuffle(&mut StdRng::seed_from_u64(seed));
    events
}

fn bench_key_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("li-01-key-codec");
    group.bench_function("encode_decode_block_key", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n = (n + 7_919) % 1_000_000_000;
            let key = encode_block_key(black_box(n)).unwrap();
            black_box(decode_block_key(&key).unwrap())
        })
    });
    group.finish();
}

fn bench_ledger_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("li-01-ledger-store");
    let blocks: Vec<_> = (0..1_000).map(|n| make_block(n, 10)).collect();

    group.throughput(Throughput::Elements(blocks.len() as u64));
    group.bench_function("put_with_cursor_1k", |b| {
        b.iter(|| {
            let mut store = LedgerStore::new(InMemoryKVStore::new());
            for block in &blocks {
                store.put(block).unwrap();
                store.store_cursor(block.number + 1).unwrap();
            }
            black_box(store)
        })
    });

    let mut filled = LedgerStore::new(InMemoryKVStore::new());
    for block in &blocks {
        filled.put(block).unwrap();
    }
    group.bench_function("validate_1k", |b| {
        b.iter(|| black_box(filled.validate().unwrap()))
    });
    group.finish();
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("li-02-reassembly");

    for tx_per_block in [0u32, 10, 100] {
        let events = page_events(0, 1_000, tx_per_block, 42);
        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("shuffled_page_1k_blocks", tx_per_block),
            &events,
            |b, events| {
                b.iter(|| {
                    let mut engine = ReassemblyEngine::new(
                        RecordingWriter::new(),
                        AssemblyConfig::with_window(1_000),
                        0,
                    )
                    .unwrap();
                    for event in events.iter().cloned() {
                        engine.apply(event).unwrap();
                    }
                    assert_eq!(engine.next_block(), 1_000);
                    black_box(engine.into_writer())
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_key_codec, bench_ledger_store, bench_reassembly);
criterion_main!(benches);
