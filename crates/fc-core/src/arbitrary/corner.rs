//! Corner cases: finite, high-value samples per arbitrary.
//!
//! The biased sampler prepends this sequence before random fill, and
//! existential search bootstraps from it. The sets are small by
//! construction; product spaces cap their cartesian expansion.

use fc_common::{Pick, Value};

use super::Arbitrary;

/// Cap on corner cases emitted by any single arbitrary.
const CORNER_CAP: usize = 32;

impl Arbitrary {
    /// The corner-case sequence for this arbitrary. May be empty; always
    /// finite; every entry satisfies `can_generate`.
    pub fn corner_cases(&self) -> Vec<Pick> {
        let mut cases = match self {
            Arbitrary::Empty => Vec::new(),
            Arbitrary::Constant(v) => vec![Pick::leaf(v.clone())],
            Arbitrary::Boolean => vec![
                Pick::leaf(Value::Bool(false)),
                Pick::leaf(Value::Bool(true)),
            ],
            Arbitrary::Integer { min, max } => {
                let mut candidates = vec![*min, *max, 0, -1, 1];
                candidates.retain(|v| *v >= *min && *v <= *max);
                let mut seen = std::collections::HashSet::new();
                candidates
                    .into_iter()
                    .filter(|v| seen.insert(*v))
                    .map(|v| Pick::leaf(Value::Int(v)))
                    .collect()
            }
            Arbitrary::Real { min, max } => {
                let mut candidates = vec![*min, *max, 0.0];
                candidates.retain(|v| *v >= *min && *v <= *max);
                let mut seen = std::collections::HashSet::new();
                candidates
                    .into_iter()
                    .filter(|v| seen.insert(v.to_bits()))
                    .map(|v| Pick::leaf(Value::Real(v)))
                    .collect()
            }
            Arbitrary::Array {
                inner,
                min_len,
                max_len,
            } => {
                let inner_cases = inner.corner_cases();
                let mut out = Vec::new();
                // Shortest arrays first: empty (when allowed), then
                // min-length runs of each inner corner, then one
                // max-length run of the first corner.
                if *min_len == 0 {
                    out.push(Pick::new(Value::List(vec![]), Value::List(vec![])));
                }
                for case in &inner_cases {
                    if *min_len > 0 {
                        out.push(repeat_pick(case, *min_len));
                    }
                }
                if let Some(first) = inner_cases.first() {
                    if *max_len > *min_len && *max_len <= 64 {
                        out.push(repeat_pick(first, *max_len));
                    }
                }
                out
            }
            Arbitrary::Set {
                elements,
                min_len,
                max_len,
            } => {
                let mut out = Vec::new();
                if *min_len == 0 {
                    out.push(Pick::new(Value::List(vec![]), Value::List(vec![])));
                }
                if *min_len > 0 {
                    let smallest: Vec<Value> = elements.iter().take(*min_len).cloned().collect();
                    let v = Value::List(smallest);
                    out.push(Pick::new(v.clone(), v));
                }
                if *max_len == elements.len() && *max_len > *min_len {
                    let all = Value::List(elements.clone());
                    out.push(Pick::new(all.clone(), all));
                }
                out
            }
            Arbitrary::Tuple { components } => {
                let per_component: Vec<Vec<Pick>> =
                    components.iter().map(|c| c.corner_cases()).collect();
                cartesian(&per_component)
                    .into_iter()
                    .map(|combo| {
                        let values: Vec<Value> = combo.iter().map(|p| p.value.clone()).collect();
                        let originals: Vec<Value> =
                            combo.iter().map(|p| p.original.clone()).collect();
                        Pick::new(Value::List(values), Value::List(originals))
                    })
                    .collect()
            }
            Arbitrary::Record { fields } => {
                let per_field: Vec<Vec<Pick>> =
                    fields.iter().map(|(_, a)| a.corner_cases()).collect();
                cartesian(&per_field)
                    .into_iter()
                    .map(|combo| {
                        let values: Vec<(String, Value)> = fields
                            .iter()
                            .zip(&combo)
                            .map(|((n, _), p)| (n.clone(), p.value.clone()))
                            .collect();
                        let originals: Vec<(String, Value)> = fields
                            .iter()
                            .zip(&combo)
                            .map(|((n, _), p)| (n.clone(), p.original.clone()))
                            .collect();
                        Pick::new(super::map_value(values), super::map_value(originals))
                    })
                    .collect()
            }
            Arbitrary::Union { branches } => branches
                .iter()
                .flat_map(|b| b.corner_cases())
                .collect(),
            Arbitrary::Mapped { base, map, .. } => base
                .corner_cases()
                .into_iter()
                .map(|p| Pick::new(map(&p.value), p.original))
                .collect(),
            Arbitrary::Filtered {
                base, predicate, ..
            } => base
                .corner_cases()
                .into_iter()
                .filter(|p| predicate(&p.value))
                .collect(),
            Arbitrary::Chained {
                base, continuation, ..
            } => base
                .corner_cases()
                .into_iter()
                .flat_map(|p| {
                    let arb = continuation(&p.value);
                    arb.corner_cases().into_iter().take(1)
                })
                .collect(),
            Arbitrary::Unique { base, .. } => base.corner_cases(),
            Arbitrary::Pattern(p) => p.corner_cases(),
            Arbitrary::Graph(g) => g.corner_cases(),
            Arbitrary::Path(p) => p.corner_cases(),
        };
        // Dedup by value and cap.
        let mut seen = std::collections::HashSet::new();
        cases.retain(|p| seen.insert(p.value.canonical_hash()));
        cases.truncate(CORNER_CAP);
        cases
    }
}

fn repeat_pick(case: &Pick, len: usize) -> Pick {
    Pick::new(
        Value::List(vec![case.value.clone(); len]),
        Value::List(vec![case.original.clone(); len]),
    )
}

/// Bounded cartesian product of per-child corner lists.
fn cartesian(per_child: &[Vec<Pick>]) -> Vec<Vec<Pick>> {
    let mut combos: Vec<Vec<Pick>> = vec![Vec::new()];
    for child_cases in per_child {
        if child_cases.is_empty() {
            return Vec::new();
        }
        let mut next = Vec::new();
        for combo in &combos {
            for case in child_cases {
                if next.len() >= CORNER_CAP {
                    break;
                }
                let mut extended = combo.clone();
                extended.push(case.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::{array, boolean, integer, tuple, union};

    fn values(picks: &[Pick]) -> Vec<Value> {
        picks.iter().map(|p| p.value.clone()).collect()
    }

    #[test]
    fn integer_corners_hit_endpoints_and_zero() {
        let cases = values(&integer(-100, 100).corner_cases());
        assert!(cases.contains(&Value::Int(-100)));
        assert!(cases.contains(&Value::Int(100)));
        assert!(cases.contains(&Value::Int(0)));
    }

    #[test]
    fn integer_corners_respect_bounds() {
        let cases = values(&integer(5, 9).corner_cases());
        assert!(cases.contains(&Value::Int(5)));
        assert!(cases.contains(&Value::Int(9)));
        assert!(!cases.contains(&Value::Int(0)));
    }

    #[test]
    fn all_corners_are_members() {
        let arbs = vec![
            integer(-10, 10),
            array(boolean(), 0, 4),
            tuple(vec![integer(0, 3), boolean()]),
            union(vec![integer(0, 1), integer(10, 11)]),
            integer(0, 100).filter(|v| v.as_int().unwrap_or(0) >= 50),
        ];
        for arb in arbs {
            for case in arb.corner_cases() {
                assert!(
                    arb.can_generate(&case),
                    "{arb:?} rejects its own corner {:?}",
                    case.value
                );
            }
        }
    }

    #[test]
    fn empty_has_no_corners() {
        assert!(Arbitrary::Empty.corner_cases().is_empty());
    }

    #[test]
    fn corner_lists_are_deduped_and_capped() {
        let t = tuple(vec![integer(0, 4); 6]);
        let cases = t.corner_cases();
        assert!(cases.len() <= CORNER_CAP);
        let mut seen = std::collections::HashSet::new();
        for c in &cases {
            assert!(seen.insert(c.value.canonical_hash()));
        }
    }
}
