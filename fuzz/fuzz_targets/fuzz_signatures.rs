#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pqsigrm_recover::params::{CodeParameters, ParameterSet};
use pqsigrm_recover::signatures::{Correlation, Path, SignatureBuffer};

#[derive(Arbitrary, Debug)]
struct SignatureFuzzInput {
    path: String,
    data: Vec<u8>,
}

fuzz_target!(|input: SignatureFuzzInput| {
    let params = CodeParameters::for_set(ParameterSet::Toy32);
    let Ok(mut sigs) = SignatureBuffer::from_bytes(input.data, &params, "fuzz") else {
        return;
    };

    // Folding along any valid short path keeps the correlation well formed
    if let Ok(path) = Path::parse(&input.path) {
        if path.len() > 3 {
            return;
        }
        let len = path.apply(&mut sigs, params.code_m).expect("short path");
        let mut correlation = Correlation::new(len);
        if correlation.update(&sigs).is_ok() {
            let matrix = correlation.finish().expect("non-empty population");
            for i in 0..len {
                assert_eq!(matrix.get(i, i), 1.0);
                for j in 0..len {
                    let v = matrix.get(i, j);
                    assert!((-1.0..=1.0).contains(&v));
                    assert_eq!(v, matrix.get(j, i));
                }
            }
        }
    }
});
