use criterion::{black_box, criterion_group, criterion_main, Criterion};
use talon::search::tt::{Bound, Tt};

fn bench_tt(c: &mut Criterion) {
    let mut tt = Tt::new();
    tt.set_capacity_mb(16);

    c.bench_function("tt_store_probe_cycle", |ben| {
        let mut key = 0x9E37_79B9_7F4A_7C15u64;
        ben.iter(|| {
            key = key.wrapping_mul(0xBF58_476D_1CE4_E5B9).wrapping_add(1);
            tt.store(key, 42, 17, None, 8, Bound::Exact);
            black_box(tt.probe(black_box(key)))
        })
    });
}

criterion_group!(benches, bench_tt);
criterion_main!(benches);
