use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use pqsigrm_recover::{
    gf2::{dual, BinaryMatrix},
    params::{CodeParameters, ParameterSet, RecoveryConfig},
    recovery::{find_swaps, generator_from_public_key, match_from_correlation, recover_permutation},
    signatures::{Correlation, Path},
    synthetic::{SyntheticInstance, SyntheticOptions},
};

fn random_matrix(rows: usize, cols: usize, seed: u64) -> BinaryMatrix {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut m = BinaryMatrix::zeros(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            if rng.gen_bool(0.5) {
                m.set(r, c, true);
            }
        }
    }
    m
}

fn toy_instance(signatures: usize) -> SyntheticInstance {
    let options = SyntheticOptions {
        signatures,
        ..SyntheticOptions::default()
    };
    SyntheticInstance::generate(&CodeParameters::for_set(ParameterSet::Toy32), &options)
        .expect("toy instance")
}

fn gf2_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("gf2");

    for size in [128usize, 256, 512].iter() {
        let m = random_matrix(*size / 2, *size, *size as u64);
        group.bench_with_input(BenchmarkId::new("echelonize", size), &m, |b, m| {
            b.iter(|| {
                let mut work = m.clone();
                work.echelonize()
            })
        });
        group.bench_with_input(BenchmarkId::new("dual", size), &m, |b, m| {
            b.iter(|| dual(m))
        });
    }

    group.finish();
}

fn correlation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation");
    let instance = toy_instance(8000);

    group.bench_function("update_8000x32", |b| {
        b.iter(|| {
            let mut correlation = Correlation::new(32);
            correlation.update(&instance.signatures).expect("update");
            correlation.finish().expect("finish")
        })
    });

    group.bench_function("fold_u", |b| {
        let path = Path::parse("U").expect("path");
        b.iter(|| {
            let mut work = instance.signatures.clone();
            path.apply(&mut work, 5).expect("fold")
        })
    });

    group.finish();
}

fn recovery_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("recovery");
    group.sample_size(20);
    let params = CodeParameters::for_set(ParameterSet::Toy32);
    let config = RecoveryConfig::default();
    let instance = toy_instance(8000);

    let mut correlation = Correlation::new(32);
    correlation.update(&instance.signatures).expect("update");
    let matrix = correlation.finish().expect("finish");
    group.bench_function("match_32", |b| b.iter(|| match_from_correlation(&matrix)));

    group.bench_function("find_swaps_32", |b| {
        b.iter(|| find_swaps(&instance.public_generator, params.k_app, &config))
    });

    let generator = generator_from_public_key(&instance.public_key, &params).expect("generator");
    group.bench_function("recover_toy", |b| {
        b.iter(|| recover_permutation(&instance.signatures, &generator, &params, &config))
    });

    group.finish();
}

criterion_group!(
    benches,
    gf2_benchmarks,
    correlation_benchmarks,
    recovery_benchmarks
);
criterion_main!(benches);
