//! Random graphs and paths over them.
//!
//! A graph value is a map `{nodes: n, edges: [[u, v], ...]}` (with a
//! third weight component when a weight arbitrary is configured); node
//! ids are `0..n`. Paths are node lists produced by bounded random walks
//! over a freshly generated graph.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use fc_common::{ArbitrarySize, Pick, Value};

use super::pick::{uniform_index, PickContext};
use super::Arbitrary;

/// Retries for a destination-constrained walk before reporting no pick.
const PATH_RETRIES: usize = 10;

/// Shape of a random graph space.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    pub min_nodes: usize,
    pub max_nodes: usize,
    /// Independent inclusion probability per candidate edge.
    pub edge_probability: f64,
    pub directed: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_nodes: 0,
            max_nodes: 8,
            edge_probability: 0.3,
            directed: false,
        }
    }
}

/// Random graphs under a [`GraphConfig`], optionally edge-weighted.
#[derive(Debug, Clone)]
pub struct GraphSpace {
    config: GraphConfig,
    weight: Option<Arc<Arbitrary>>,
}

/// Graphs under `config`; pass a weight arbitrary to label every edge.
pub fn graph(config: GraphConfig, weight: Option<Arbitrary>) -> Arbitrary {
    if config.min_nodes > config.max_nodes {
        return Arbitrary::Empty;
    }
    Arbitrary::Graph(GraphSpace {
        config,
        weight: weight.map(Arc::new),
    })
}

/// Paths over graphs drawn from `graph_arb`, as node-id lists of at most
/// `max_len + 1` nodes. `src`/`dst` pin the endpoints when given.
pub fn path(
    graph_arb: Arbitrary,
    src: Option<usize>,
    dst: Option<usize>,
    max_len: usize,
) -> Arbitrary {
    Arbitrary::Path(PathSpace {
        graph: Arc::new(graph_arb),
        src,
        dst,
        max_len,
    })
}

impl GraphSpace {
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn candidate_pairs(&self, n: usize) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for u in 0..n {
            for v in 0..n {
                if u == v {
                    continue;
                }
                if !self.config.directed && u > v {
                    continue;
                }
                pairs.push((u, v));
            }
        }
        pairs
    }

    pub fn size(&self) -> ArbitrarySize {
        let per_edge = match &self.weight {
            // Each candidate edge is absent or present with one of the
            // weight space's values.
            Some(w) => w.size().sum(&ArbitrarySize::exact(1)),
            None => ArbitrarySize::exact(2),
        };
        let mut total = ArbitrarySize::zero();
        for n in self.config.min_nodes..=self.config.max_nodes {
            let edges = self.candidate_pairs(n).len() as u32;
            total = total.sum(&per_edge.pow(edges));
            if total.value == u64::MAX {
                break;
            }
        }
        total
    }

    pub fn pick(&self, ctx: &mut PickContext<'_>) -> Option<Pick> {
        let span = (self.config.max_nodes - self.config.min_nodes) as u64 + 1;
        let n = self.config.min_nodes + uniform_index(ctx.rng, span)? as usize;
        let mut edges = Vec::new();
        for (u, v) in self.candidate_pairs(n) {
            if ctx.rng.next_f64() >= self.config.edge_probability {
                continue;
            }
            let mut edge = vec![Value::Int(u as i64), Value::Int(v as i64)];
            if let Some(w) = &self.weight {
                let weight = w.pick(ctx)?;
                edge.push(weight.value);
            }
            edges.push(Value::List(edge));
        }
        let v = graph_value(n, edges);
        Some(Pick::new(v.clone(), v))
    }

    pub fn corner_cases(&self) -> Vec<Pick> {
        let mut out = Vec::new();
        // The edgeless minimum graph.
        let v = graph_value(self.config.min_nodes, vec![]);
        out.push(Pick::new(v.clone(), v));
        // A small complete graph, when the space allows one.
        let n = self.config.max_nodes.min(4);
        if n > self.config.min_nodes && self.config.edge_probability > 0.0 {
            let weight_corner = self
                .weight
                .as_ref()
                .and_then(|w| w.corner_cases().into_iter().next());
            if self.weight.is_none() || weight_corner.is_some() {
                let edges: Vec<Value> = self
                    .candidate_pairs(n)
                    .into_iter()
                    .map(|(u, v)| {
                        let mut edge = vec![Value::Int(u as i64), Value::Int(v as i64)];
                        if let Some(wc) = &weight_corner {
                            edge.push(wc.value.clone());
                        }
                        Value::List(edge)
                    })
                    .collect();
                let v = graph_value(n, edges);
                out.push(Pick::new(v.clone(), v));
            }
        }
        out
    }

    pub fn can_generate(&self, value: &Value) -> bool {
        let Some((n, edges)) = decode_graph(value) else {
            return false;
        };
        if n < self.config.min_nodes || n > self.config.max_nodes {
            return false;
        }
        let expected_arity = if self.weight.is_some() { 3 } else { 2 };
        let mut seen = std::collections::HashSet::new();
        edges.iter().all(|edge| {
            let Some(items) = edge.as_list() else {
                return false;
            };
            if items.len() != expected_arity {
                return false;
            }
            let (Some(u), Some(v)) = (items[0].as_int(), items[1].as_int()) else {
                return false;
            };
            let (u, v) = (u as usize, v as usize);
            if u >= n || v >= n || u == v {
                return false;
            }
            if !self.config.directed && u > v {
                return false;
            }
            if !seen.insert((u, v)) {
                return false;
            }
            match &self.weight {
                Some(w) => w.can_generate(&Pick::leaf(items[2].clone())),
                None => true,
            }
        })
    }

    /// Narrow toward fewer nodes, halving like arrays do.
    pub fn shrink(&self, initial: &Pick) -> Arbitrary {
        let Some((n, _)) = decode_graph(&initial.value) else {
            return Arbitrary::Empty;
        };
        if n <= self.config.min_nodes {
            return Arbitrary::Empty;
        }
        let target = (n / 2).max(self.config.min_nodes);
        let hi = if target < n { target } else { n - 1 };
        Arbitrary::Graph(GraphSpace {
            config: GraphConfig {
                min_nodes: self.config.min_nodes,
                max_nodes: hi,
                ..self.config
            },
            weight: self.weight.clone(),
        })
    }
}

impl PartialEq for GraphSpace {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
            && match (&self.weight, &other.weight) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}

impl Eq for GraphSpace {}

impl Hash for GraphSpace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.min_nodes.hash(state);
        self.config.max_nodes.hash(state);
        self.config.edge_probability.to_bits().hash(state);
        self.config.directed.hash(state);
        if let Some(w) = &self.weight {
            w.hash(state);
        }
    }
}

/// Bounded random walks over generated graphs.
#[derive(Debug, Clone)]
pub struct PathSpace {
    graph: Arc<Arbitrary>,
    src: Option<usize>,
    dst: Option<usize>,
    max_len: usize,
}

impl PathSpace {
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Dependent composition: like chains, the walk's own contribution is
    /// not counted.
    pub fn size(&self) -> ArbitrarySize {
        self.graph.size()
    }

    pub fn pick(&self, ctx: &mut PickContext<'_>) -> Option<Pick> {
        for _ in 0..PATH_RETRIES {
            let g = self.graph.pick(ctx)?;
            let Some((n, edges)) = decode_graph(&g.value) else {
                return None;
            };
            if n == 0 {
                continue;
            }
            let adjacency = build_adjacency(n, &edges);
            let start = match self.src {
                Some(s) if s < n => s,
                Some(_) => continue,
                None => uniform_index(ctx.rng, n as u64)? as usize,
            };
            let mut walk = vec![start];
            let mut here = start;
            while walk.len() <= self.max_len {
                if self.dst == Some(here) {
                    break;
                }
                let next_hops = &adjacency[here];
                if next_hops.is_empty() {
                    break;
                }
                // Without a destination, stop early with some mass on
                // shorter walks.
                if self.dst.is_none() && ctx.rng.next_f64() < 0.25 {
                    break;
                }
                let idx = uniform_index(ctx.rng, next_hops.len() as u64)? as usize;
                here = next_hops[idx];
                walk.push(here);
            }
            if let Some(d) = self.dst {
                if here != d {
                    continue;
                }
            }
            let v = Value::List(walk.into_iter().map(|u| Value::Int(u as i64)).collect());
            return Some(Pick::new(v.clone(), v));
        }
        None
    }

    pub fn corner_cases(&self) -> Vec<Pick> {
        match (self.src, self.dst) {
            // The trivial walk, when source and destination agree.
            (Some(s), Some(d)) if s == d => {
                let v = Value::List(vec![Value::Int(s as i64)]);
                vec![Pick::new(v.clone(), v)]
            }
            (Some(s), None) => {
                let v = Value::List(vec![Value::Int(s as i64)]);
                vec![Pick::new(v.clone(), v)]
            }
            _ => Vec::new(),
        }
    }

    pub fn can_generate(&self, value: &Value) -> bool {
        let Some(items) = value.as_list() else {
            return false;
        };
        if items.is_empty() || items.len() > self.max_len + 1 {
            return false;
        }
        let Some(nodes) = items
            .iter()
            .map(|v| v.as_int().filter(|n| *n >= 0))
            .collect::<Option<Vec<i64>>>()
        else {
            return false;
        };
        if let Some(s) = self.src {
            if nodes.first() != Some(&(s as i64)) {
                return false;
            }
        }
        if let Some(d) = self.dst {
            if nodes.last() != Some(&(d as i64)) {
                return false;
            }
        }
        // Edge membership depends on the generated graph, which is gone;
        // stay optimistic beyond the structural checks.
        true
    }

    pub fn shrink(&self, initial: &Pick) -> Arbitrary {
        let Some(items) = initial.value.as_list() else {
            return Arbitrary::Empty;
        };
        if items.len() <= 1 || self.max_len == 0 {
            return Arbitrary::Empty;
        }
        let target = ((items.len() - 1) / 2).min(self.max_len - 1);
        Arbitrary::Path(PathSpace {
            graph: self.graph.clone(),
            src: self.src,
            dst: self.dst,
            max_len: target,
        })
    }
}

impl PartialEq for PathSpace {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph
            && self.src == other.src
            && self.dst == other.dst
            && self.max_len == other.max_len
    }
}

impl Eq for PathSpace {}

impl Hash for PathSpace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph.hash(state);
        self.src.hash(state);
        self.dst.hash(state);
        self.max_len.hash(state);
    }
}

fn graph_value(nodes: usize, edges: Vec<Value>) -> Value {
    Value::Map(
        [
            ("nodes".to_string(), Value::Int(nodes as i64)),
            ("edges".to_string(), Value::List(edges)),
        ]
        .into_iter()
        .collect(),
    )
}

fn decode_graph(value: &Value) -> Option<(usize, Vec<Value>)> {
    let map = value.as_map()?;
    let n = map.get("nodes")?.as_int()?;
    if n < 0 {
        return None;
    }
    let edges = map.get("edges")?.as_list()?.to_vec();
    Some((n as usize, edges))
}

fn build_adjacency(n: usize, edges: &[Value]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); n];
    for edge in edges {
        let Some(items) = edge.as_list() else {
            continue;
        };
        let (Some(u), Some(v)) = (
            items.first().and_then(Value::as_int),
            items.get(1).and_then(Value::as_int),
        ) else {
            continue;
        };
        let (u, v) = (u as usize, v as usize);
        if u < n && v < n {
            adjacency[u].push(v);
        }
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::integer;
    use crate::arbitrary::pick::PosteriorSession;
    use crate::sample::rng::StdSource;

    fn draw(arb: &Arbitrary, n: usize, seed: u64) -> Vec<Pick> {
        let mut rng = StdSource::from_seed(seed);
        let mut session = PosteriorSession::new();
        let mut ctx = PickContext::new(&mut rng, &mut session, 0);
        (0..n).filter_map(|_| arb.pick(&mut ctx)).collect()
    }

    #[test]
    fn generated_graphs_are_members() {
        let arb = graph(GraphConfig::default(), None);
        for p in draw(&arb, 60, 21) {
            assert!(arb.can_generate(&p), "rejected own pick {:?}", p.value);
        }
    }

    #[test]
    fn weighted_graphs_carry_weights() {
        let arb = graph(
            GraphConfig {
                min_nodes: 3,
                max_nodes: 5,
                edge_probability: 0.9,
                directed: false,
            },
            Some(integer(1, 9)),
        );
        let mut saw_edge = false;
        for p in draw(&arb, 30, 22) {
            assert!(arb.can_generate(&p));
            let (_, edges) = decode_graph(&p.value).unwrap();
            for e in &edges {
                saw_edge = true;
                let items = e.as_list().unwrap();
                assert_eq!(items.len(), 3);
                let w = items[2].as_int().unwrap();
                assert!((1..=9).contains(&w));
            }
        }
        assert!(saw_edge);
    }

    #[test]
    fn undirected_edges_are_canonical() {
        let arb = graph(
            GraphConfig {
                min_nodes: 4,
                max_nodes: 4,
                edge_probability: 1.0,
                directed: false,
            },
            None,
        );
        let p = &draw(&arb, 1, 23)[0];
        let (_, edges) = decode_graph(&p.value).unwrap();
        // Complete undirected graph on 4 nodes.
        assert_eq!(edges.len(), 6);
        for e in edges {
            let items = e.as_list().unwrap();
            assert!(items[0].as_int().unwrap() < items[1].as_int().unwrap());
        }
    }

    #[test]
    fn path_respects_endpoints() {
        let g = graph(
            GraphConfig {
                min_nodes: 5,
                max_nodes: 5,
                edge_probability: 1.0,
                directed: false,
            },
            None,
        );
        let arb = path(g, Some(0), None, 4);
        for p in draw(&arb, 40, 24) {
            let items = p.value.as_list().unwrap();
            assert_eq!(items[0].as_int(), Some(0));
            assert!(items.len() <= 5);
            assert!(arb.can_generate(&p));
        }
    }

    #[test]
    fn path_to_destination_ends_there() {
        let g = graph(
            GraphConfig {
                min_nodes: 4,
                max_nodes: 4,
                edge_probability: 1.0,
                directed: false,
            },
            None,
        );
        let arb = path(g, Some(0), Some(2), 6);
        let drawn = draw(&arb, 20, 25);
        assert!(!drawn.is_empty());
        for p in drawn {
            let items = p.value.as_list().unwrap();
            assert_eq!(items.last().unwrap().as_int(), Some(2));
        }
    }

    #[test]
    fn graph_shrink_reduces_node_budget() {
        let arb = graph(GraphConfig::default(), None);
        let picks = draw(&arb, 50, 26);
        let big = picks
            .iter()
            .find(|p| decode_graph(&p.value).unwrap().0 >= 6)
            .expect("no large graph drawn");
        let narrowed = match arb.shrink(big) {
            Arbitrary::Graph(g) => g,
            other => panic!("unexpected shrink {other:?}"),
        };
        let n = decode_graph(&big.value).unwrap().0;
        assert!(narrowed.config.max_nodes < n);
    }

    #[test]
    fn empty_node_range_is_empty_space() {
        let arb = graph(
            GraphConfig {
                min_nodes: 5,
                max_nodes: 2,
                ..GraphConfig::default()
            },
            None,
        );
        assert_eq!(arb, Arbitrary::Empty);
    }
}
