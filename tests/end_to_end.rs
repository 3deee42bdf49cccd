//! End-to-end recovery on synthetic length-32 instances
//!
//! The instances carry the same two-level (u, u + v) structure as the real
//! parameter sets, so the full pipeline runs: correlation, matching, swap
//! correction, code extraction and the second level.

use pqsigrm_recover::params::{CodeParameters, Depth, ParameterSet, RecoveryConfig};
use pqsigrm_recover::recovery::{
    depth1, depth2, extract_codes, generator_from_public_key, offending_rank,
    recover_permutation,
};
use pqsigrm_recover::signatures::SignatureBuffer;
use pqsigrm_recover::storage::{
    read_permutation, read_public_key, write_permutation, write_public_key,
};
use pqsigrm_recover::synthetic::{SyntheticInstance, SyntheticOptions};
use pqsigrm_recover::verify::{check_twin_structure, count_good_matched_pairs};

fn toy() -> CodeParameters {
    CodeParameters::for_set(ParameterSet::Toy32)
}

fn instance(seed: u64) -> SyntheticInstance {
    let options = SyntheticOptions {
        seed,
        ..SyntheticOptions::default()
    };
    SyntheticInstance::generate(&toy(), &options).unwrap()
}

/// The generator rebuilt from the public key spans the public code
#[test]
fn test_generator_matches_public_code() {
    let params = toy();
    let inst = instance(1);
    let g = generator_from_public_key(&inst.public_key, &params).unwrap();
    let stacked = g.vstack(&inst.public_generator).unwrap();
    assert_eq!(g.rank(), params.len_t());
    assert_eq!(stacked.rank(), params.len_t());
}

/// Depth one pairs every structured twin and fixes the top-level orientation
#[test]
fn test_depth_one_pairs_all_twins() {
    let params = toy();
    let config = RecoveryConfig::default();
    let inst = instance(2);
    let g = generator_from_public_key(&inst.public_key, &params).unwrap();

    let outcome = depth1(&inst.signatures, &g, &params, &config, None).unwrap();
    let layout = outcome.permutation.inverse();

    let twins = check_twin_structure(&inst.secret, &layout, 16).unwrap();
    assert!(twins.passed(), "{:?}", twins);
    assert_eq!(outcome.report.swap.final_rank, params.appended_dimension(Depth::One));

    let ordered = g.select_columns(outcome.permutation.as_slice());
    assert_eq!(offending_rank(&ordered).unwrap(), params.k_app);

    let pairs = (0..16)
        .map(|i| {
            let (a, b) = (outcome.permutation[i], outcome.permutation[i + 16]);
            (a.min(b), a.max(b))
        })
        .collect();
    assert_eq!(count_good_matched_pairs(&inst.secret, &pairs), 16);
}

/// Depth two keeps the top-level pairs and recovers the inner ones
#[test]
fn test_depth_two_recovers_inner_twins() {
    let params = toy();
    let config = RecoveryConfig::default();
    let inst = instance(3);
    let g = generator_from_public_key(&inst.public_key, &params).unwrap();

    let first = depth1(&inst.signatures, &g, &params, &config, None).unwrap();
    let second = depth2(&inst.signatures, &g, &first.permutation, &params, &config, None).unwrap();
    let layout = second.permutation.inverse();

    assert!(check_twin_structure(&inst.secret, &layout, 16).unwrap().passed());
    assert!(check_twin_structure(&inst.secret, &layout, 8).unwrap().passed());

    let codes = extract_codes(&g.select_columns(second.permutation.as_slice())).unwrap();
    let dims = codes.dimensions();
    assert_eq!((dims.dim_a, dims.dim_u, dims.dim_v), (2, 11, 5));
    assert_eq!(offending_rank(&codes.u).unwrap(), params.appended_dimension(Depth::Two));
    assert_eq!(second.report.codes, Some(dims));
}

/// Every seed ends depth one on exactly the appended dimension
#[test]
fn test_depth_one_rank_across_seeds() {
    let params = toy();
    let config = RecoveryConfig::default();
    for seed in 40..50 {
        let inst = instance(seed);
        let g = generator_from_public_key(&inst.public_key, &params).unwrap();
        let first = depth1(&inst.signatures, &g, &params, &config, None).unwrap();
        assert_eq!(first.report.swap.final_rank, params.k_app, "seed {}", seed);

        let codes = extract_codes(&g.select_columns(first.permutation.as_slice())).unwrap();
        assert_eq!(codes.dimensions().dim_a, params.k_app, "seed {}", seed);
    }
}

/// The full pipeline over files written in the on-disk formats
#[test]
fn test_recovery_through_files() {
    let params = toy();
    let inst = instance(4);
    let dir = tempfile::tempdir().unwrap();

    let pk_path = dir.path().join("pk.bin");
    let sigs_path = dir.path().join("sigs.bin");
    let out_path = dir.path().join("perm.bin");
    write_public_key(&pk_path, &inst.public_key).unwrap();
    std::fs::write(&sigs_path, inst.signatures.as_bytes()).unwrap();

    let t = read_public_key(&pk_path, &params).unwrap();
    assert_eq!(t, inst.public_key);
    let sigs = SignatureBuffer::from_file(&sigs_path, &params).unwrap();
    assert_eq!(sigs.len(), inst.signatures.len());

    let config = RecoveryConfig {
        cache_dir: Some(dir.path().join("cache")),
        ..RecoveryConfig::default()
    };
    let g = generator_from_public_key(&t, &params).unwrap();
    let recovery = recover_permutation(&sigs, &g, &params, &config).unwrap();
    assert_eq!(recovery.report.depths.len(), 2);
    assert_eq!(recovery.report.signatures, 8000);

    write_permutation(&out_path, &recovery.secret_layout()).unwrap();
    let layout = read_permutation(&out_path, params.code_n).unwrap();
    assert_eq!(layout, recovery.secret_layout());
    assert!(check_twin_structure(&inst.secret, &layout, 16).unwrap().passed());
    assert!(check_twin_structure(&inst.secret, &layout, 8).unwrap().passed());

    // Cached correlations give the same answer on a second run.
    let again = recover_permutation(&sigs, &g, &params, &config).unwrap();
    assert_eq!(again.permutation, recovery.permutation);
}
