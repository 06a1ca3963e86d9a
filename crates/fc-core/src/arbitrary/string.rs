//! String spaces, derived from integer spaces, and a pattern arbitrary
//! over a small character-class grammar.
//!
//! Plain strings are arrays of code points mapped (with inverse) to
//! `Value::Str`, so membership and shrinking compose through the usual
//! array machinery for free. Patterns get their own space: a parsed
//! `class{m,n}` part list generates directly, while membership is
//! delegated to an anchored `regex` compiled from the same source.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use regex::Regex;

use fc_common::{ArbitrarySize, Error, Pick, Result, Value};

use super::pick::{uniform_index, PickContext};
use super::{array, integer, union, Arbitrary};

/// Expansion bound for `*` and `+` quantifiers.
const UNBOUNDED_CAP: usize = 8;

/// Characters in [lo, hi], as single-character strings. Ranges spanning
/// the surrogate gap split into a union of the valid halves.
pub fn char_range(lo: char, hi: char) -> Arbitrary {
    if lo > hi {
        return Arbitrary::Empty;
    }
    let (lo, hi) = (lo as u32, hi as u32);
    const GAP_LO: u32 = 0xD800;
    const GAP_HI: u32 = 0xDFFF;
    if lo < GAP_LO && hi > GAP_HI {
        return union(vec![
            code_range(lo, GAP_LO - 1),
            code_range(GAP_HI + 1, hi),
        ]);
    }
    code_range(lo, hi)
}

fn code_range(lo: u32, hi: u32) -> Arbitrary {
    integer(lo as i64, hi as i64).map_with_inverse(
        |v| {
            let code = v.as_int().unwrap_or(0).clamp(0, char::MAX as i64) as u32;
            let c = char::from_u32(code).unwrap_or('\u{FFFD}');
            Value::Str(c.to_string())
        },
        |v| {
            let code = v
                .as_str()
                .and_then(|s| s.chars().next())
                .map(|c| c as u32)
                .unwrap_or(0);
            Value::Int(code as i64)
        },
    )
}

/// Printable ASCII characters.
pub fn ascii_char() -> Arbitrary {
    char_range(' ', '~')
}

/// Strings of `char_arb` characters with length in [min_len, max_len].
pub fn string_of(char_arb: Arbitrary, min_len: usize, max_len: usize) -> Arbitrary {
    array(char_arb, min_len, max_len).map_with_inverse(
        |v| {
            let joined: String = v
                .as_list()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str())
                        .collect::<String>()
                })
                .unwrap_or_default();
            Value::Str(joined)
        },
        |v| {
            let chars: Vec<Value> = v
                .as_str()
                .map(|s| s.chars().map(|c| Value::Str(c.to_string())).collect())
                .unwrap_or_default();
            Value::List(chars)
        },
    )
}

/// Printable ASCII strings.
pub fn ascii_string(min_len: usize, max_len: usize) -> Arbitrary {
    string_of(ascii_char(), min_len, max_len)
}

/// Strings matching a pattern over the supported grammar: literals,
/// escapes, classes (`[a-z0-9_]`, `\d`, `\w`, `\s`), quantifiers
/// (`?`, `*`, `+`, `{m}`, `{m,n}`), and top-level alternation.
pub fn pattern(source: &str) -> Result<Arbitrary> {
    Ok(Arbitrary::Pattern(PatternSpace::parse(source)?))
}

/// One quantified character class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PatternPart {
    /// Sorted, deduplicated class members.
    chars: Vec<char>,
    min: usize,
    max: usize,
}

/// A parsed pattern: alternation over part sequences, plus the anchored
/// matcher used for membership proofs.
#[derive(Clone)]
pub struct PatternSpace {
    source: String,
    alternatives: Vec<Vec<PatternPart>>,
    matcher: Arc<Regex>,
}

impl PatternSpace {
    pub fn parse(source: &str) -> Result<Self> {
        let alternatives = source
            .split('|')
            .map(parse_sequence)
            .collect::<Result<Vec<_>>>()?;
        if alternatives.iter().all(|a| a.is_empty()) && !source.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: source.to_string(),
                message: "pattern has no generatable parts".into(),
            });
        }
        let anchored = format!("^(?:{source})$");
        let matcher = Regex::new(&anchored).map_err(|e| Error::InvalidPattern {
            pattern: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
            matcher: Arc::new(matcher),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn size(&self) -> ArbitrarySize {
        let mut total = ArbitrarySize::zero();
        for alt in &self.alternatives {
            let mut alt_size = ArbitrarySize::exact(1);
            for part in alt {
                let class = ArbitrarySize::exact(part.chars.len() as u64);
                let mut lengths = ArbitrarySize::zero();
                for len in part.min..=part.max {
                    lengths = lengths.sum(&class.pow(len as u32));
                }
                alt_size = alt_size.product(&lengths);
            }
            total = total.sum(&alt_size);
        }
        total
    }

    pub fn pick(&self, ctx: &mut PickContext<'_>) -> Option<Pick> {
        if self.alternatives.is_empty() {
            return None;
        }
        // Alternatives weighted by their share of the space.
        let weights: Vec<u64> = self
            .alternatives
            .iter()
            .map(|alt| {
                alt.iter()
                    .map(|p| (p.chars.len() as u64).saturating_pow(p.max as u32).max(1))
                    .fold(1u64, u64::saturating_mul)
            })
            .collect();
        let total: u128 = weights.iter().map(|w| *w as u128).sum();
        if total == 0 {
            return None;
        }
        let target = ((ctx.rng.next_f64() * total as f64) as u128).min(total - 1);
        let mut cumulative = 0u128;
        let mut chosen = 0usize;
        for (i, w) in weights.iter().enumerate() {
            cumulative += *w as u128;
            if target < cumulative {
                chosen = i;
                break;
            }
        }

        let mut out = String::new();
        for part in &self.alternatives[chosen] {
            let span = (part.max - part.min) as u64 + 1;
            let len = part.min + uniform_index(ctx.rng, span)? as usize;
            for _ in 0..len {
                let idx = uniform_index(ctx.rng, part.chars.len() as u64)? as usize;
                out.push(part.chars[idx]);
            }
        }
        let v = Value::Str(out);
        Some(Pick::new(v.clone(), v))
    }

    pub fn corner_cases(&self) -> Vec<Pick> {
        let mut out = Vec::new();
        for alt in &self.alternatives {
            let shortest: String = alt
                .iter()
                .flat_map(|p| std::iter::repeat(p.chars.first().copied().unwrap_or('?')).take(p.min))
                .collect();
            let v = Value::Str(shortest);
            out.push(Pick::new(v.clone(), v));
            let highest: String = alt
                .iter()
                .flat_map(|p| std::iter::repeat(p.chars.last().copied().unwrap_or('?')).take(p.min))
                .collect();
            let v = Value::Str(highest);
            out.push(Pick::new(v.clone(), v));
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|p| seen.insert(p.value.canonical_hash()));
        out
    }

    pub fn can_generate(&self, value: &Value) -> bool {
        match value.as_str() {
            Some(s) => self.matcher.is_match(s),
            None => false,
        }
    }

    /// Shrink to the minimal-length sub-space when the value is longer
    /// than the pattern's minimum.
    pub fn shrink(&self, initial: &Pick) -> Arbitrary {
        let Some(s) = initial.value.as_str() else {
            return Arbitrary::Empty;
        };
        let min_total: usize = self
            .alternatives
            .iter()
            .map(|alt| alt.iter().map(|p| p.min).sum())
            .min()
            .unwrap_or(0);
        if s.chars().count() <= min_total {
            return Arbitrary::Empty;
        }
        let narrowed: Vec<Vec<PatternPart>> = self
            .alternatives
            .iter()
            .map(|alt| {
                alt.iter()
                    .map(|p| PatternPart {
                        chars: p.chars.clone(),
                        min: p.min,
                        max: p.min,
                    })
                    .collect()
            })
            .collect();
        Arbitrary::Pattern(PatternSpace {
            source: self.source.clone(),
            alternatives: narrowed,
            matcher: self.matcher.clone(),
        })
    }
}

impl std::fmt::Debug for PatternSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PatternSpace({:?})", self.source)
    }
}

impl PartialEq for PatternSpace {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.alternatives == other.alternatives
    }
}

impl Eq for PatternSpace {}

impl Hash for PatternSpace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.alternatives.hash(state);
    }
}

fn class_digits() -> Vec<char> {
    ('0'..='9').collect()
}

fn class_word() -> Vec<char> {
    ('a'..='z')
        .chain('A'..='Z')
        .chain('0'..='9')
        .chain(std::iter::once('_'))
        .collect()
}

fn class_space() -> Vec<char> {
    vec![' ', '\t']
}

fn parse_sequence(source: &str) -> Result<Vec<PatternPart>> {
    let err = |message: &str| Error::InvalidPattern {
        pattern: source.to_string(),
        message: message.to_string(),
    };
    let mut parts = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        let class: Vec<char> = match c {
            '[' => {
                let mut members = Vec::new();
                let mut prev: Option<char> = None;
                loop {
                    let Some(m) = chars.next() else {
                        return Err(err("unterminated character class"));
                    };
                    match m {
                        ']' => break,
                        // A backslash would mean something else to the
                        // membership matcher; keep the grammars aligned.
                        '\\' => return Err(err("escapes inside classes are not supported")),
                        '-' if prev.is_some() && chars.peek() != Some(&']') => {
                            let lo = match prev.take() {
                                Some(p) => p,
                                None => return Err(err("range without start")),
                            };
                            let Some(hi) = chars.next() else {
                                return Err(err("range without end"));
                            };
                            if lo > hi {
                                return Err(err("inverted class range"));
                            }
                            members.extend(lo..=hi);
                        }
                        other => {
                            if let Some(p) = prev.take() {
                                members.push(p);
                            }
                            prev = Some(other);
                        }
                    }
                }
                if let Some(p) = prev {
                    members.push(p);
                }
                if members.is_empty() {
                    return Err(err("empty character class"));
                }
                members
            }
            '\\' => match chars.next() {
                Some('d') => class_digits(),
                Some('w') => class_word(),
                Some('s') => class_space(),
                Some(escaped) => vec![escaped],
                None => return Err(err("dangling escape")),
            },
            '(' | ')' => return Err(err("groups are not supported")),
            '^' | '$' => return Err(err("anchors are not supported")),
            '.' => (' '..='~').collect(),
            literal => vec![literal],
        };

        let mut members = class;
        members.sort_unstable();
        members.dedup();

        let (min, max) = match chars.peek() {
            Some('?') => {
                chars.next();
                (0, 1)
            }
            Some('*') => {
                chars.next();
                (0, UNBOUNDED_CAP)
            }
            Some('+') => {
                chars.next();
                (1, UNBOUNDED_CAP)
            }
            Some('{') => {
                chars.next();
                let mut spec = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) => spec.push(d),
                        None => return Err(err("unterminated quantifier")),
                    }
                }
                parse_repetition(&spec).ok_or_else(|| err("malformed quantifier"))?
            }
            _ => (1, 1),
        };
        if min > max {
            return Err(err("quantifier minimum exceeds maximum"));
        }
        parts.push(PatternPart {
            chars: members,
            min,
            max,
        });
    }
    Ok(parts)
}

fn parse_repetition(spec: &str) -> Option<(usize, usize)> {
    match spec.split_once(',') {
        Some((lo, hi)) => {
            let min = lo.trim().parse().ok()?;
            let max = if hi.trim().is_empty() {
                min + UNBOUNDED_CAP
            } else {
                hi.trim().parse().ok()?
            };
            Some((min, max))
        }
        None => {
            let n = spec.trim().parse().ok()?;
            Some((n, n))
        }
    }
}
