#![no_main]

use libfuzzer_sys::fuzz_target;
use pqsigrm_recover::params::{CodeParameters, ParameterSet};
use pqsigrm_recover::storage::{encode_public_key, parse_public_key};

fuzz_target!(|data: &[u8]| {
    let params = CodeParameters::for_set(ParameterSet::Toy32);

    // Anything of the right size parses, and re-encodes to itself modulo padding
    if let Ok(t) = parse_public_key(data, &params, "fuzz") {
        let encoded = encode_public_key(&t);
        assert_eq!(encoded.len(), data.len());
        let reparsed = parse_public_key(&encoded, &params, "fuzz").expect("re-encoded key parses");
        assert_eq!(reparsed, t);
    }
});
