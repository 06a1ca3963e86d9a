//! A generated value plus the pre-map original it came from.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::value::Value;

/// One value produced by an arbitrary.
///
/// `value` is the observable the predicate sees; `original` is the
/// preimage under any map/transform chain, kept so shrinking can work in
/// the base domain. Two picks are equal iff their `value`s deep-equal;
/// `original` never participates in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    pub value: Value,
    pub original: Value,
}

impl Pick {
    pub fn new(value: Value, original: Value) -> Self {
        Self { value, original }
    }

    /// A pick that is its own preimage (leaf arbitraries).
    pub fn leaf(value: Value) -> Self {
        let original = value.clone();
        Self { value, original }
    }
}

impl PartialEq for Pick {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Pick {}

impl Hash for Pick {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}
