use {
    criterion::{black_box, criterion_group, criterion_main, Criterion},
    snowflake::IdGenerator,
    std::{sync::Arc, thread},
};

fn bench_new(c: &mut Criterion) {
    c.bench_function("bench_new", |b| {
        b.iter(|| {
            let _ = black_box(IdGenerator::new(1, 1).unwrap());
        });
    });
}

fn bench_builder(c: &mut Criterion) {
    c.bench_function("bench_builder", |b| {
        b.iter(|| {
            let epoch: u64 = 1609459200000; // 2021-01-01 00:00:00.000 UTC

            let _ = black_box(
                IdGenerator::builder()
                    .with_worker_id_bits(4)
                    .with_datacenter_id_bits(6)
                    .with_worker_id(1)
                    .with_datacenter_id(1)
                    .with_epoch(epoch)
                    .build()
                    .unwrap(),
            );
        });
    });
}

fn bench_next_id(c: &mut Criterion) {
    let generator = IdGenerator::new(1, 1).unwrap();
    c.bench_function("bench_next_id", |b| {
        b.iter(|| {
            let _ = black_box(generator.next_id());
        });
    });
}

fn bench_next_id_contended(c: &mut Criterion) {
    let generator = Arc::new(IdGenerator::new(1, 1).unwrap());
    c.bench_function("bench_next_id_contended", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0 .. 4)
                .map(|_| {
                    let generator = Arc::clone(&generator);
                    thread::spawn(move || {
                        for _ in 0 .. 1000 {
                            black_box(generator.next_id());
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
}

fn bench_decompose(c: &mut Criterion) {
    let generator = IdGenerator::new(1, 1).unwrap();
    let id = generator.next_id();
    c.bench_function("bench_decompose", |b| {
        b.iter(|| {
            let _ = black_box(generator.decompose(black_box(id)));
        });
    });
}

criterion_group!(
    benches,
    bench_new,
    bench_builder,
    bench_next_id,
    bench_next_id_contended,
    bench_decompose
);
criterion_main!(benches);
