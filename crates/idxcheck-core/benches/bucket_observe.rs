use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use idxcheck_core::{
    CheckerConfig, IndexConsistency, IndexDescriptor, KeyHasher, KeyString, MemoryRecordStore,
    RecordId, index_name_hash,
};
use serde_json::json;

fn bench_key_hash(c: &mut Criterion) {
    let hasher = KeyHasher::new(1 << 16).expect("valid bucket count");
    let seed = index_name_hash("a_1");
    let mut group = c.benchmark_group("key_hash");
    for len in [8_usize, 64, 512] {
        let key = vec![0xA5_u8; len];
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &key, |b, key| {
            b.iter(|| hasher.bucket(&KeyString::new(black_box(key), b"\x01"), seed));
        });
    }
    group.finish();
}

fn bench_phase_one(c: &mut Criterion) {
    const KEYS: u64 = 10_000;
    let store = MemoryRecordStore::new();
    let values = [json!(0)];
    let mut group = c.benchmark_group("phase_one");
    group.throughput(Throughput::Elements(KEYS * 2));
    group.bench_function("paired_observations", |b| {
        b.iter(|| {
            let mut checker = IndexConsistency::new(
                &store,
                "bench.coll",
                [IndexDescriptor::new("a_1", ["a"])],
                CheckerConfig::default(),
            )
            .expect("checker");
            let handle = checker.lookup("a_1").expect("a_1");
            for key in 0..KEYS {
                let bytes = key.to_be_bytes();
                let key_string = KeyString::untyped(&bytes);
                let record_id = RecordId::new(key as i64);
                checker
                    .observe_document_key(handle, &key_string, record_id, &values)
                    .expect("document key");
                checker
                    .observe_index_key(handle, &key_string, record_id, &values)
                    .expect("index key");
            }
            black_box(checker.has_any_mismatch())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_key_hash, bench_phase_one);
criterion_main!(benches);
