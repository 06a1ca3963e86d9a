//! Structural shrinking: narrow an arbitrary around a known value.
//!
//! `shrink(initial)` returns a new arbitrary covering a strictly smaller
//! space whose members are simpler than `initial` and still belong to the
//! original space. Integers close toward zero, containers toward their
//! minimum length; products shrink one component at a time with the rest
//! pinned. The shrinker samples candidates from the returned space and
//! re-verifies falsification before accepting any of them.

use fc_common::{Pick, Value};

use super::{constant, integer, real, tuple, union, Arbitrary};

impl Arbitrary {
    /// A strictly narrower arbitrary containing values simpler than
    /// `initial`, or `Empty` when no smaller candidate space exists.
    pub fn shrink(&self, initial: &Pick) -> Arbitrary {
        match self {
            Arbitrary::Empty | Arbitrary::Constant(_) => Arbitrary::Empty,
            Arbitrary::Boolean => match initial.value {
                // false is the minimum of the boolean order.
                Value::Bool(true) => constant(Value::Bool(false)),
                _ => Arbitrary::Empty,
            },
            Arbitrary::Integer { min, max } => match initial.value.as_int() {
                Some(v) if v > 0 => integer((*min).max(0), v - 1),
                Some(v) if v < 0 => integer(v + 1, (*max).min(0)),
                _ => Arbitrary::Empty,
            },
            Arbitrary::Real { min, max } => match initial.value {
                Value::Real(v) if v > 0.0 => real((*min).max(0.0), v / 2.0),
                Value::Real(v) if v < 0.0 => real(v / 2.0, (*max).min(0.0)),
                _ => Arbitrary::Empty,
            },
            Arbitrary::Array {
                inner,
                min_len,
                max_len: _,
            } => match initial.value.as_list() {
                Some(items) if items.len() > *min_len => {
                    // Halve toward the minimum length.
                    let target = (items.len() / 2).max(*min_len);
                    let hi = if target < items.len() {
                        target
                    } else {
                        items.len() - 1
                    };
                    super::array((**inner).clone(), *min_len, hi)
                }
                _ => Arbitrary::Empty,
            },
            Arbitrary::Set {
                elements,
                min_len,
                max_len: _,
            } => match initial.value.as_list() {
                Some(items) if items.len() > *min_len => {
                    let target = (items.len() / 2).max(*min_len);
                    let hi = if target < items.len() {
                        target
                    } else {
                        items.len() - 1
                    };
                    Arbitrary::Set {
                        elements: elements.clone(),
                        min_len: *min_len,
                        max_len: hi,
                    }
                }
                _ => Arbitrary::Empty,
            },
            Arbitrary::Tuple { components } => {
                let (values, originals) = match split_product(initial) {
                    Some(parts) => parts,
                    None => return Arbitrary::Empty,
                };
                if values.len() != components.len() {
                    return Arbitrary::Empty;
                }
                // One shrinking component at a time, the others pinned to
                // their current values.
                let mut variants = Vec::new();
                for (i, component) in components.iter().enumerate() {
                    let part = Pick::new(values[i].clone(), originals[i].clone());
                    let narrowed = component.shrink(&part);
                    if matches!(narrowed, Arbitrary::Empty) {
                        continue;
                    }
                    let slots: Vec<Arbitrary> = components
                        .iter()
                        .enumerate()
                        .map(|(j, _)| {
                            if j == i {
                                narrowed.clone()
                            } else {
                                constant(values[j].clone())
                            }
                        })
                        .collect();
                    variants.push(tuple(slots));
                }
                union(variants)
            }
            Arbitrary::Record { fields } => {
                let entries = match initial.value.as_map() {
                    Some(entries) => entries.clone(),
                    None => return Arbitrary::Empty,
                };
                let originals = initial.original.as_map().cloned().unwrap_or_default();
                let mut variants = Vec::new();
                for (i, (name, field)) in fields.iter().enumerate() {
                    let Some(value) = entries.get(name) else {
                        return Arbitrary::Empty;
                    };
                    let original = originals.get(name).unwrap_or(value).clone();
                    let narrowed = field.shrink(&Pick::new(value.clone(), original));
                    if matches!(narrowed, Arbitrary::Empty) {
                        continue;
                    }
                    let slots: Vec<(&str, Arbitrary)> = fields
                        .iter()
                        .enumerate()
                        .map(|(j, (n, _))| {
                            let arb = if j == i {
                                narrowed.clone()
                            } else {
                                constant(entries.get(n).cloned().unwrap_or(Value::None))
                            };
                            (n.as_str(), arb)
                        })
                        .collect();
                    if let Ok(rec) = super::record(slots) {
                        variants.push(rec);
                    }
                }
                union(variants)
            }
            Arbitrary::Union { branches } => {
                // Shrink within the branch that owns the value.
                for branch in branches {
                    if branch.can_generate(initial) {
                        return branch.shrink(initial);
                    }
                }
                Arbitrary::Empty
            }
            Arbitrary::Mapped {
                base,
                map,
                inverse,
                ..
            } => {
                // Shrink the preimage and re-map.
                let pre = Pick::new(initial.original.clone(), initial.original.clone());
                let narrowed = base.shrink(&pre);
                if matches!(narrowed, Arbitrary::Empty) {
                    return Arbitrary::Empty;
                }
                Arbitrary::Mapped {
                    base: std::sync::Arc::new(narrowed),
                    map: map.clone(),
                    inverse: inverse.clone(),
                    token: super::next_token(),
                }
            }
            Arbitrary::Filtered {
                base, predicate, ..
            } => {
                let narrowed = base.shrink(initial);
                if matches!(narrowed, Arbitrary::Empty) {
                    return Arbitrary::Empty;
                }
                Arbitrary::Filtered {
                    base: std::sync::Arc::new(narrowed),
                    predicate: predicate.clone(),
                    token: super::next_token(),
                }
            }
            // The continuation depended on an outer value that is gone;
            // there is no sound narrower space to offer.
            Arbitrary::Chained { .. } => Arbitrary::Empty,
            Arbitrary::Unique { base, .. } => base.shrink(initial),
            Arbitrary::Pattern(p) => p.shrink(initial),
            Arbitrary::Graph(g) => g.shrink(initial),
            Arbitrary::Path(p) => p.shrink(initial),
        }
    }
}

fn split_product(pick: &Pick) -> Option<(Vec<Value>, Vec<Value>)> {
    let values = pick.value.as_list()?.to_vec();
    let originals = match pick.original.as_list() {
        Some(os) if os.len() == values.len() => os.to_vec(),
        _ => values.clone(),
    };
    Some((values, originals))
}
