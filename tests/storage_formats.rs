//! On-disk format checks for keys, signatures and matched pairs

use std::fs;

use pqsigrm_recover::error::error_codes;
use pqsigrm_recover::params::{CodeParameters, ParameterSet};
use pqsigrm_recover::signatures::SignatureBuffer;
use pqsigrm_recover::storage::{
    read_matched_pairs, read_public_key, write_matched_pairs, SecretKey,
};
use pqsigrm_recover::synthetic::{SyntheticInstance, SyntheticOptions};

fn toy() -> CodeParameters {
    CodeParameters::for_set(ParameterSet::Toy32)
}

/// A signature file that is not a whole number of records is rejected by name
#[test]
fn test_truncated_signature_file() {
    let params = toy();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.sigs");
    fs::write(&path, vec![0u8; 2 * params.record_len() - 1]).unwrap();

    let err = SignatureBuffer::from_file(&path, &params).unwrap_err();
    assert_eq!(err.error_code(), error_codes::SIGNATURE_SIZE_MISMATCH);
    let message = err.to_string();
    assert!(message.contains("truncated.sigs"));
    assert!(message.contains(&params.record_len().to_string()));
}

/// Error vectors are read from behind the length field and the message
#[test]
fn test_signature_record_offsets() {
    let params = toy();
    let mut record = vec![0u8; params.record_len()];
    record[params.error_offset()] = 0b0000_0101;
    record[params.error_offset() + params.error_bytes() - 1] = 0x80;
    record[0] = 0xff;
    let sigs = SignatureBuffer::from_bytes(record, &params, "one.sigs").unwrap();

    assert_eq!(sigs.len(), 1);
    assert!(sigs.bit(0, 0));
    assert!(!sigs.bit(0, 1));
    assert!(sigs.bit(0, 2));
    assert!(sigs.bit(0, params.code_n - 1));
}

/// Public key files must have the exact padded size
#[test]
fn test_public_key_file_size() {
    let params = toy();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pk.bin");
    fs::write(&path, vec![0u8; params.public_key_bytes() + 8]).unwrap();

    let err = read_public_key(&path, &params).unwrap_err();
    assert_eq!(err.error_code(), error_codes::PUBLIC_KEY_SIZE_MISMATCH);
    assert!(err.to_string().contains(&params.public_key_bytes().to_string()));
}

/// A toy secret key survives the file round trip
#[test]
fn test_secret_key_file() {
    let params = toy();
    let options = SyntheticOptions {
        signatures: 8,
        ..SyntheticOptions::default()
    };
    let inst = SyntheticInstance::generate(&params, &options).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sk.bin");
    let key = SecretKey::from_permutation(&inst.secret).unwrap();
    pqsigrm_recover::storage::write_permutation(&path, &key.permutation().unwrap()).unwrap();

    let loaded = SecretKey::from_file(&path, &params).unwrap();
    assert_eq!(loaded.permutation().unwrap(), inst.secret);

    fs::write(&path, [0u8; 10]).unwrap();
    let err = SecretKey::from_file(&path, &params).unwrap_err();
    assert_eq!(err.error_code(), error_codes::PERMUTATION_SIZE_MISMATCH);
}

/// Pairs written out read back canonicalised
#[test]
fn test_matched_pairs_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pairs.txt");
    write_matched_pairs(&path, &[(5, 1), (0, 2), (1, 5)]).unwrap();

    let pairs = read_matched_pairs(&path, 8).unwrap();
    assert_eq!(pairs.len(), 2);
    assert!(pairs.contains(&(1, 5)));
    assert!(pairs.contains(&(0, 2)));

    let err = read_matched_pairs(&path, 4).unwrap_err();
    assert_eq!(err.error_code(), error_codes::MATCHED_PAIRS_MALFORMED);
}
