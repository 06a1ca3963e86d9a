//! Fuzz target for the pattern grammar.
//!
//! Parsing arbitrary pattern sources must never panic, only return an
//! error; and every accepted pattern must admit its own corner cases.

#![no_main]

use fc_core::arbitrary::pattern;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(arb) = pattern(data) {
        for case in arb.corner_cases() {
            assert!(arb.can_generate(&case), "pattern rejects its own corner");
        }
    }
});
