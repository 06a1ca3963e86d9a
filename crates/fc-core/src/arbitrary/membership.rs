//! Optimistic membership: `can_generate`.
//!
//! Returns false only on proof of non-membership. Combinators that erase
//! information (maps without inverses, chains) answer true; shrinking
//! uses this to keep only candidates that provably remain inside the
//! parent space, so optimism errs toward trying a candidate rather than
//! silently dropping it.

use fc_common::{Pick, Value};

use super::Arbitrary;

impl Arbitrary {
    /// Whether this arbitrary could have produced the pick.
    pub fn can_generate(&self, pick: &Pick) -> bool {
        match self {
            Arbitrary::Empty => false,
            Arbitrary::Constant(v) => pick.value == *v,
            Arbitrary::Boolean => matches!(pick.value, Value::Bool(_)),
            Arbitrary::Integer { min, max } => match pick.value.as_int() {
                Some(v) => v >= *min && v <= *max,
                None => false,
            },
            Arbitrary::Real { min, max } => match pick.value {
                Value::Real(v) => v >= *min && v <= *max,
                _ => false,
            },
            Arbitrary::Array {
                inner,
                min_len,
                max_len,
            } => match pick.value.as_list() {
                Some(items) => {
                    if items.len() < *min_len || items.len() > *max_len {
                        return false;
                    }
                    let originals = pick.value.as_list().and_then(|_| pick.original.as_list());
                    items.iter().enumerate().all(|(i, item)| {
                        let original = originals
                            .and_then(|os| os.get(i))
                            .unwrap_or(item)
                            .clone();
                        inner.can_generate(&Pick::new(item.clone(), original))
                    })
                }
                None => false,
            },
            Arbitrary::Set {
                elements,
                min_len,
                max_len,
            } => match pick.value.as_list() {
                Some(items) => {
                    if items.len() < *min_len || items.len() > *max_len {
                        return false;
                    }
                    let mut seen = std::collections::HashSet::new();
                    items.iter().all(|item| {
                        seen.insert(item.canonical_hash()) && elements.contains(item)
                    })
                }
                None => false,
            },
            Arbitrary::Tuple { components } => match pick.value.as_list() {
                Some(items) => {
                    if items.len() != components.len() {
                        return false;
                    }
                    let originals = pick.original.as_list();
                    components.iter().zip(items).enumerate().all(|(i, (c, item))| {
                        let original = originals
                            .and_then(|os| os.get(i))
                            .unwrap_or(item)
                            .clone();
                        c.can_generate(&Pick::new(item.clone(), original))
                    })
                }
                None => false,
            },
            Arbitrary::Record { fields } => match pick.value.as_map() {
                Some(entries) => {
                    if entries.len() != fields.len() {
                        return false;
                    }
                    let originals = pick.original.as_map();
                    fields.iter().all(|(name, field)| match entries.get(name) {
                        Some(v) => {
                            let original = originals
                                .and_then(|os| os.get(name))
                                .unwrap_or(v)
                                .clone();
                            field.can_generate(&Pick::new(v.clone(), original))
                        }
                        None => false,
                    })
                }
                None => false,
            },
            Arbitrary::Union { branches } => branches.iter().any(|b| b.can_generate(pick)),
            Arbitrary::Mapped { base, inverse, .. } => match inverse {
                Some(inv) => {
                    let preimage = inv(&pick.value);
                    base.can_generate(&Pick::new(preimage.clone(), preimage))
                }
                // No inverse: no proof of non-membership is available.
                None => true,
            },
            Arbitrary::Filtered {
                base, predicate, ..
            } => predicate(&pick.value) && base.can_generate(pick),
            Arbitrary::Chained { .. } => true,
            Arbitrary::Unique { base, .. } => base.can_generate(pick),
            Arbitrary::Pattern(p) => p.can_generate(&pick.value),
            Arbitrary::Graph(g) => g.can_generate(&pick.value),
            Arbitrary::Path(p) => p.can_generate(&pick.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::{array, boolean, integer, record, set, tuple, union};

    fn leaf(v: Value) -> Pick {
        Pick::leaf(v)
    }

    #[test]
    fn integer_bounds_are_proof() {
        let arb = integer(0, 10);
        assert!(arb.can_generate(&leaf(Value::Int(5))));
        assert!(!arb.can_generate(&leaf(Value::Int(11))));
        assert!(!arb.can_generate(&leaf(Value::Bool(true))));
    }

    #[test]
    fn set_rejects_duplicates_and_foreign_elements() {
        let arb = set(vec![1i64, 2, 3], 1, 3);
        assert!(arb.can_generate(&leaf(Value::List(vec![Value::Int(1), Value::Int(3)]))));
        assert!(!arb.can_generate(&leaf(Value::List(vec![Value::Int(1), Value::Int(1)]))));
        assert!(!arb.can_generate(&leaf(Value::List(vec![Value::Int(9)]))));
    }

    #[test]
    fn tuple_checks_arity_and_components() {
        let arb = tuple(vec![integer(0, 5), boolean()]);
        assert!(arb.can_generate(&leaf(Value::List(vec![
            Value::Int(3),
            Value::Bool(true)
        ]))));
        assert!(!arb.can_generate(&leaf(Value::List(vec![Value::Int(3)]))));
        assert!(!arb.can_generate(&leaf(Value::List(vec![
            Value::Int(9),
            Value::Bool(true)
        ]))));
    }

    #[test]
    fn record_checks_keys() {
        let arb = record(vec![("n", integer(0, 5))]).unwrap();
        let good = Value::Map([("n".to_string(), Value::Int(2))].into_iter().collect());
        let bad_key = Value::Map([("m".to_string(), Value::Int(2))].into_iter().collect());
        assert!(arb.can_generate(&leaf(good)));
        assert!(!arb.can_generate(&leaf(bad_key)));
    }

    #[test]
    fn union_accepts_any_branch() {
        let arb = union(vec![integer(0, 1), integer(10, 11)]);
        assert!(arb.can_generate(&leaf(Value::Int(10))));
        assert!(!arb.can_generate(&leaf(Value::Int(5))));
    }

    #[test]
    fn mapped_without_inverse_is_optimistic() {
        let arb = integer(0, 5).map(|v| Value::Int(v.as_int().unwrap_or(0) * 2));
        assert!(arb.can_generate(&leaf(Value::Int(999))));
    }

    #[test]
    fn mapped_with_inverse_has_proof() {
        let arb = integer(0, 5).map_with_inverse(
            |v| Value::Int(v.as_int().unwrap_or(0) * 2),
            |v| Value::Int(v.as_int().unwrap_or(0) / 2),
        );
        assert!(arb.can_generate(&leaf(Value::Int(10))));
        assert!(!arb.can_generate(&leaf(Value::Int(20))));
    }

    #[test]
    fn filtered_uses_predicate_as_proof() {
        let arb = integer(0, 100).filter(|v| v.as_int().unwrap_or(0) % 2 == 0);
        assert!(arb.can_generate(&leaf(Value::Int(4))));
        assert!(!arb.can_generate(&leaf(Value::Int(5))));
    }

    #[test]
    fn array_checks_length_and_items() {
        let arb = array(integer(0, 3), 1, 2);
        assert!(arb.can_generate(&leaf(Value::List(vec![Value::Int(2)]))));
        assert!(!arb.can_generate(&leaf(Value::List(vec![]))));
        assert!(!arb.can_generate(&leaf(Value::List(vec![Value::Int(7)]))));
    }
}
