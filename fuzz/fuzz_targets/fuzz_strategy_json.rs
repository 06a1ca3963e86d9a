//! Fuzz target for strategy config JSON loading.
//!
//! Parsing plus validation must never panic on arbitrary input.

#![no_main]

use fc_config::{validate_strategy, StrategyConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<StrategyConfig>(data) {
        let _ = validate_strategy(&config);
    }
});
