use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use antnet::{Matrix, NetworkBuilder};

const SIZES: [usize; 4] = [24, 64, 64, 6];

fn run_bench(c: &mut Criterion) {
    let mut net = NetworkBuilder::from_sizes(&SIZES)
        .unwrap()
        .build_with_seed(0)
        .unwrap();
    let input = vec![0.1_f64; net.input_dim()];

    c.bench_function("run_24_64_64_6", |b| {
        b.iter(|| {
            let out = net.run(black_box(&input)).unwrap();
            black_box(out[0]);
        })
    });
}

fn train_bench(c: &mut Criterion) {
    let base = NetworkBuilder::from_sizes(&SIZES)
        .unwrap()
        .build_with_seed(0)
        .unwrap();

    let mut group = c.benchmark_group("train_24_64_64_6");
    for m in [1_usize, 32, 256] {
        let inputs = Matrix::from_flat(vec![0.1; m * SIZES[0]], m, SIZES[0]).unwrap();
        let targets = Matrix::from_flat(vec![0.5; m * SIZES[3]], m, SIZES[3]).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(m), &m, |b, _| {
            b.iter_batched_ref(
                || {
                    let mut net = base.clone();
                    // Warm the scratch so the timed step never allocates.
                    net.train(inputs.view(), targets.view(), 0.01).unwrap();
                    net
                },
                |net| {
                    let cost = net.train(inputs.view(), targets.view(), 0.01).unwrap();
                    black_box(cost);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, run_bench, train_bench);
criterion_main!(benches);
