//! Fuzz target for the tagged value model.
//!
//! JSON round-trips must never panic, and deserialized values must be
//! self-equal (hash/equality lawfulness).

#![no_main]

use fc_common::Value;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<Value>(data) {
        assert_eq!(value, value.clone());
        let _ = value.canonical_hash();
        let _ = serde_json::to_string(&value);
    }
});
