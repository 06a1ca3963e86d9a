//! FluentCheck core engine.
//!
//! A property-based testing engine built from three subsystems:
//! - the arbitrary algebra ([`arbitrary`]): composable value generators
//!   with Bayesian size estimation through filters, maps, and chains;
//! - the explorer ([`explore`]): a nested-loop walk over quantifiers with
//!   fixed, confidence-based, or coverage-based stopping;
//! - the shrinker ([`shrink`]): budgeted search for a minimal falsifying
//!   example.
//!
//! Scenarios are assembled with the fluent surface in [`scenario`]:
//!
//! ```
//! use fc_core::prelude::*;
//!
//! let result = fluent_check()
//!     .forall("a", integer(-100, 100))
//!     .forall("b", integer(-100, 100))
//!     .then(|b| {
//!         let a = b.int("a");
//!         let x = b.int("b");
//!         a + x == x + a
//!     })
//!     .config(StrategyConfig::default().with_sample_size(200).with_random_generator(42))
//!     .check()
//!     .unwrap();
//! assert!(result.satisfiable);
//! ```

pub mod arbitrary;
pub mod explore;
pub mod logging;
pub mod sample;
pub mod scenario;
pub mod shrink;
pub mod stats;

/// Everything needed to write a scenario.
pub mod prelude {
    pub use crate::arbitrary::{
        any_integer, any_real, array, ascii_char, ascii_string, boolean, char_range, constant,
        empty, graph, integer, nat, path, pattern, real, record, set, string_of, tuple, union,
        Arbitrary, GraphConfig,
    };
    pub use crate::scenario::{fluent_check, Bindings, FluentCheck, PropertyOutcome};
    pub use fc_common::{FluentResult, Value};
    pub use fc_config::{ShrinkStrategyKind, StrategyConfig};
}
