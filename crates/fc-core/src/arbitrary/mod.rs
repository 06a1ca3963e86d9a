//! The arbitrary algebra: composable value generators with size
//! estimation.
//!
//! An [`Arbitrary`] is an immutable description of a search space. All
//! run-local state (filter posteriors, uniqueness seen-sets) lives in a
//! [`pick::PosteriorSession`] owned by the run, keyed by quantifier slot
//! and instance token, so sharing one arbitrary across positions never
//! correlates their estimates.
//!
//! Leaves: `Constant`, `Boolean`, `Integer`, `Real`. Containers: `Array`,
//! `Set`, `Tuple`, `Record`. Combinators: `Union`, `Mapped`, `Filtered`,
//! `Chained`, `Unique`. String and pattern spaces are built from integer
//! spaces in [`string`]; random graphs and paths live in [`graph`].
//! `Empty` is the zero of the algebra: absorbing in products, identity in
//! sums.

pub mod corner;
pub mod graph;
pub mod membership;
pub mod pick;
pub mod shrink;
pub mod size;
pub mod string;

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fc_common::{Error, Result, Value};

pub use graph::{GraphConfig, GraphSpace, PathSpace};
pub use pick::{PickContext, PosteriorSession};
pub use string::PatternSpace;

/// Value-to-value transform attached to a `Mapped` arbitrary.
pub type MapFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
/// Acceptance predicate attached to a `Filtered` arbitrary.
pub type FilterFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
/// Dependent continuation attached to a `Chained` arbitrary.
pub type ChainFn = Arc<dyn Fn(&Value) -> Arbitrary + Send + Sync>;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Fresh identity token for combinators that carry closures. Tokens give
/// closure-bearing arbitraries stable equality/hash semantics and key
/// their session state.
pub(crate) fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// A composable value generator.
#[derive(Clone)]
pub enum Arbitrary {
    /// The empty search space (NoArbitrary).
    Empty,
    Constant(Value),
    Boolean,
    Integer {
        min: i64,
        max: i64,
    },
    Real {
        min: f64,
        max: f64,
    },
    Array {
        inner: Arc<Arbitrary>,
        min_len: usize,
        max_len: usize,
    },
    /// Subsets of a fixed element list with bounded cardinality.
    Set {
        elements: Vec<Value>,
        min_len: usize,
        max_len: usize,
    },
    Tuple {
        components: Vec<Arbitrary>,
    },
    Record {
        fields: Vec<(String, Arbitrary)>,
    },
    Union {
        branches: Vec<Arbitrary>,
    },
    Mapped {
        base: Arc<Arbitrary>,
        map: MapFn,
        inverse: Option<MapFn>,
        token: u64,
    },
    Filtered {
        base: Arc<Arbitrary>,
        predicate: FilterFn,
        token: u64,
    },
    Chained {
        base: Arc<Arbitrary>,
        continuation: ChainFn,
        token: u64,
    },
    Unique {
        base: Arc<Arbitrary>,
        /// Count pre-image uniqueness instead of post-image (relevant
        /// under lossy maps).
        by_original: bool,
        token: u64,
    },
    Pattern(PatternSpace),
    Graph(GraphSpace),
    Path(PathSpace),
}

impl Arbitrary {
    /// Tag name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Arbitrary::Empty => "empty",
            Arbitrary::Constant(_) => "constant",
            Arbitrary::Boolean => "boolean",
            Arbitrary::Integer { .. } => "integer",
            Arbitrary::Real { .. } => "real",
            Arbitrary::Array { .. } => "array",
            Arbitrary::Set { .. } => "set",
            Arbitrary::Tuple { .. } => "tuple",
            Arbitrary::Record { .. } => "record",
            Arbitrary::Union { .. } => "union",
            Arbitrary::Mapped { .. } => "mapped",
            Arbitrary::Filtered { .. } => "filtered",
            Arbitrary::Chained { .. } => "chained",
            Arbitrary::Unique { .. } => "unique",
            Arbitrary::Pattern(_) => "pattern",
            Arbitrary::Graph(_) => "graph",
            Arbitrary::Path(_) => "path",
        }
    }

    /// Map through a transform; the preimage is kept on every pick for
    /// shrinking. Without an inverse the mapped size is an upper bound
    /// and membership stays optimistic.
    pub fn map(self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Arbitrary {
        Arbitrary::Mapped {
            base: Arc::new(self),
            map: Arc::new(f),
            inverse: None,
            token: next_token(),
        }
    }

    /// Map with an inverse, enabling membership proofs through the map.
    pub fn map_with_inverse(
        self,
        f: impl Fn(&Value) -> Value + Send + Sync + 'static,
        inverse: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Arbitrary {
        Arbitrary::Mapped {
            base: Arc::new(self),
            map: Arc::new(f),
            inverse: Some(Arc::new(inverse)),
            token: next_token(),
        }
    }

    /// Keep only values accepted by the predicate. The acceptance rate is
    /// learned per run as a Beta posterior; a filter whose upper credible
    /// size bound falls below one pick is declared exhausted.
    pub fn filter(self, pred: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Arbitrary {
        Arbitrary::Filtered {
            base: Arc::new(self),
            predicate: Arc::new(pred),
            token: next_token(),
        }
    }

    /// Dependent composition: generate a base value, then generate from
    /// the arbitrary the continuation builds for it.
    pub fn chain(self, k: impl Fn(&Value) -> Arbitrary + Send + Sync + 'static) -> Arbitrary {
        Arbitrary::Chained {
            base: Arc::new(self),
            continuation: Arc::new(k),
            token: next_token(),
        }
    }

    /// Deduplicate picks within a run (post-image uniqueness).
    pub fn unique(self) -> Arbitrary {
        Arbitrary::Unique {
            base: Arc::new(self),
            by_original: false,
            token: next_token(),
        }
    }

    /// Deduplicate by pre-image, for lossy maps where distinct originals
    /// may collide post-map.
    pub fn unique_by_original(self) -> Arbitrary {
        Arbitrary::Unique {
            base: Arc::new(self),
            by_original: true,
            token: next_token(),
        }
    }

    /// Structural 64-bit hash, composed from child hashes.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// The empty arbitrary: absorbing in products, identity in sums.
pub fn empty() -> Arbitrary {
    Arbitrary::Empty
}

/// A single-value space of exact size 1.
pub fn constant(value: impl Into<Value>) -> Arbitrary {
    Arbitrary::Constant(value.into())
}

pub fn boolean() -> Arbitrary {
    Arbitrary::Boolean
}

/// Integers in [min, max]; the empty arbitrary when min > max.
pub fn integer(min: i64, max: i64) -> Arbitrary {
    if min > max {
        Arbitrary::Empty
    } else {
        Arbitrary::Integer { min, max }
    }
}

/// Unbounded-feel integer space over the 32-bit range.
pub fn any_integer() -> Arbitrary {
    integer(i32::MIN as i64, i32::MAX as i64)
}

/// Naturals 0..=max.
pub fn nat(max: i64) -> Arbitrary {
    integer(0, max.max(0))
}

/// Reals in [min, max]; the empty arbitrary when the interval is empty.
pub fn real(min: f64, max: f64) -> Arbitrary {
    if !(min <= max) || min.is_nan() || max.is_nan() {
        Arbitrary::Empty
    } else {
        Arbitrary::Real { min, max }
    }
}

pub fn any_real() -> Arbitrary {
    real(-1.0e9, 1.0e9)
}

/// Lists of `inner` with length in [min_len, max_len].
pub fn array(inner: Arbitrary, min_len: usize, max_len: usize) -> Arbitrary {
    if min_len > max_len {
        return Arbitrary::Empty;
    }
    if matches!(inner, Arbitrary::Empty) && min_len > 0 {
        return Arbitrary::Empty;
    }
    Arbitrary::Array {
        inner: Arc::new(inner),
        min_len,
        max_len,
    }
}

/// Subsets of `elements` with cardinality in [min_len, max_len].
/// Duplicated elements are collapsed; an unsatisfiable minimum yields the
/// empty arbitrary.
pub fn set<T: Into<Value>>(elements: Vec<T>, min_len: usize, max_len: usize) -> Arbitrary {
    let mut seen = std::collections::HashSet::new();
    let mut distinct = Vec::new();
    for e in elements {
        let v = e.into();
        if seen.insert(v.canonical_hash()) {
            distinct.push(v);
        }
    }
    let max_len = max_len.min(distinct.len());
    if min_len > max_len {
        return Arbitrary::Empty;
    }
    Arbitrary::Set {
        elements: distinct,
        min_len,
        max_len,
    }
}

/// Fixed-arity product. Any empty component makes the whole product
/// empty.
pub fn tuple(components: Vec<Arbitrary>) -> Arbitrary {
    if components.iter().any(|c| matches!(c, Arbitrary::Empty)) {
        return Arbitrary::Empty;
    }
    Arbitrary::Tuple { components }
}

/// Named product over a field schema. Fails fast on duplicate field
/// names; an empty child makes the record empty.
pub fn record(fields: Vec<(&str, Arbitrary)>) -> Result<Arbitrary> {
    let mut names = std::collections::HashSet::new();
    for (name, _) in &fields {
        if !names.insert(*name) {
            return Err(Error::SchemaValidation(format!(
                "duplicate record field {name:?}"
            )));
        }
    }
    if fields.iter().any(|(_, a)| matches!(a, Arbitrary::Empty)) {
        return Ok(Arbitrary::Empty);
    }
    Ok(Arbitrary::Record {
        fields: fields
            .into_iter()
            .map(|(n, a)| (n.to_string(), a))
            .collect(),
    })
}

/// Weighted sum of branches (weights are branch sizes). Empty branches
/// drop out; an all-empty union is empty.
pub fn union(branches: Vec<Arbitrary>) -> Arbitrary {
    let branches: Vec<Arbitrary> = branches
        .into_iter()
        .filter(|b| !matches!(b, Arbitrary::Empty))
        .collect();
    match branches.len() {
        0 => Arbitrary::Empty,
        1 => branches.into_iter().next().unwrap_or(Arbitrary::Empty),
        _ => Arbitrary::Union { branches },
    }
}

// Re-exported string/graph constructors live in their modules.
pub use graph::{graph, path};
pub use string::{ascii_char, ascii_string, char_range, pattern, string_of};

impl fmt::Debug for Arbitrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arbitrary::Empty => write!(f, "Empty"),
            Arbitrary::Constant(v) => write!(f, "Constant({v})"),
            Arbitrary::Boolean => write!(f, "Boolean"),
            Arbitrary::Integer { min, max } => write!(f, "Integer[{min}, {max}]"),
            Arbitrary::Real { min, max } => write!(f, "Real[{min}, {max}]"),
            Arbitrary::Array {
                inner,
                min_len,
                max_len,
            } => write!(f, "Array[{min_len}..{max_len}]({inner:?})"),
            Arbitrary::Set {
                elements,
                min_len,
                max_len,
            } => write!(f, "Set[{min_len}..{max_len}] over {}", elements.len()),
            Arbitrary::Tuple { components } => f.debug_tuple("Tuple").field(components).finish(),
            Arbitrary::Record { fields } => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                write!(f, "Record{names:?}")
            }
            Arbitrary::Union { branches } => f.debug_tuple("Union").field(branches).finish(),
            Arbitrary::Mapped { base, token, .. } => write!(f, "Mapped#{token}({base:?})"),
            Arbitrary::Filtered { base, token, .. } => write!(f, "Filtered#{token}({base:?})"),
            Arbitrary::Chained { base, token, .. } => write!(f, "Chained#{token}({base:?})"),
            Arbitrary::Unique {
                base, by_original, ..
            } => write!(f, "Unique(by_original={by_original}, {base:?})"),
            Arbitrary::Pattern(p) => write!(f, "Pattern({:?})", p.source()),
            Arbitrary::Graph(g) => write!(f, "Graph({:?})", g.config()),
            Arbitrary::Path(p) => write!(f, "Path(max_len={})", p.max_len()),
        }
    }
}

impl PartialEq for Arbitrary {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arbitrary::Empty, Arbitrary::Empty) => true,
            (Arbitrary::Constant(a), Arbitrary::Constant(b)) => a == b,
            (Arbitrary::Boolean, Arbitrary::Boolean) => true,
            (
                Arbitrary::Integer { min: a1, max: a2 },
                Arbitrary::Integer { min: b1, max: b2 },
            ) => a1 == b1 && a2 == b2,
            (
                Arbitrary::Real { min: a1, max: a2 },
                Arbitrary::Real { min: b1, max: b2 },
            ) => a1.to_bits() == b1.to_bits() && a2.to_bits() == b2.to_bits(),
            (
                Arbitrary::Array {
                    inner: a,
                    min_len: al,
                    max_len: ah,
                },
                Arbitrary::Array {
                    inner: b,
                    min_len: bl,
                    max_len: bh,
                },
            ) => al == bl && ah == bh && a == b,
            (
                Arbitrary::Set {
                    elements: a,
                    min_len: al,
                    max_len: ah,
                },
                Arbitrary::Set {
                    elements: b,
                    min_len: bl,
                    max_len: bh,
                },
            ) => al == bl && ah == bh && a == b,
            (Arbitrary::Tuple { components: a }, Arbitrary::Tuple { components: b }) => a == b,
            (Arbitrary::Record { fields: a }, Arbitrary::Record { fields: b }) => a == b,
            (Arbitrary::Union { branches: a }, Arbitrary::Union { branches: b }) => a == b,
            // Closure-bearing combinators compare by instance token.
            (Arbitrary::Mapped { token: a, .. }, Arbitrary::Mapped { token: b, .. }) => a == b,
            (Arbitrary::Filtered { token: a, .. }, Arbitrary::Filtered { token: b, .. }) => a == b,
            (Arbitrary::Chained { token: a, .. }, Arbitrary::Chained { token: b, .. }) => a == b,
            (Arbitrary::Unique { token: a, .. }, Arbitrary::Unique { token: b, .. }) => a == b,
            (Arbitrary::Pattern(a), Arbitrary::Pattern(b)) => a == b,
            (Arbitrary::Graph(a), Arbitrary::Graph(b)) => a == b,
            (Arbitrary::Path(a), Arbitrary::Path(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Arbitrary {}

impl Hash for Arbitrary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Arbitrary::Empty | Arbitrary::Boolean => {}
            Arbitrary::Constant(v) => v.hash(state),
            Arbitrary::Integer { min, max } => {
                min.hash(state);
                max.hash(state);
            }
            Arbitrary::Real { min, max } => {
                min.to_bits().hash(state);
                max.to_bits().hash(state);
            }
            Arbitrary::Array {
                inner,
                min_len,
                max_len,
            } => {
                inner.hash(state);
                min_len.hash(state);
                max_len.hash(state);
            }
            Arbitrary::Set {
                elements,
                min_len,
                max_len,
            } => {
                elements.hash(state);
                min_len.hash(state);
                max_len.hash(state);
            }
            Arbitrary::Tuple { components } => components.hash(state),
            Arbitrary::Record { fields } => fields.hash(state),
            Arbitrary::Union { branches } => branches.hash(state),
            Arbitrary::Mapped { token, .. }
            | Arbitrary::Filtered { token, .. }
            | Arbitrary::Chained { token, .. }
            | Arbitrary::Unique { token, .. } => token.hash(state),
            Arbitrary::Pattern(p) => p.hash(state),
            Arbitrary::Graph(g) => g.hash(state),
            Arbitrary::Path(p) => p.hash(state),
        }
    }
}

/// Build a Value::Map from name/value pairs, used by record picks.
pub(crate) fn map_value(entries: Vec<(String, Value)>) -> Value {
    Value::Map(entries.into_iter().collect::<BTreeMap<String, Value>>())
}
