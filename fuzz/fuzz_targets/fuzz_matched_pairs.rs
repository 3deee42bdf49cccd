#![no_main]

use libfuzzer_sys::fuzz_target;
use pqsigrm_recover::storage::parse_matched_pairs;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(pairs) = parse_matched_pairs(text, 64, "fuzz") {
            for &(a, b) in &pairs {
                assert!(a < b && b < 64);
            }
        }
    }
});
