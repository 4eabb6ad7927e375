//! Edge/degree ledger shared by the build phases.
//!
//! Owned by exactly one in-flight build. Phases read adjacency and
//! similarity through it and mutate it only via [`Ledger::try_connect`],
//! which enforces canonical dedup, per-level degree caps and the global
//! edge budget in one place.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::config::GraphConfig;
use crate::edge::{Edge, EdgeMeta, circular_span, edge_type, layer_weight, pair_key};
use crate::similarity::{SimilarityOracle, Token, clamp_unit};

pub(crate) struct Ledger<'a, T, S: ?Sized> {
    tokens: &'a [T],
    oracle: &'a S,
    config: &'a GraphConfig,
    /// BTreeSet keeps traversal order, and so the build, deterministic.
    adjacency: Vec<BTreeSet<usize>>,
    connected: HashSet<(usize, usize)>,
    /// `degree[node][level]`
    degree: Vec<Vec<usize>>,
    similarity_cache: HashMap<(usize, usize), f64>,
    edges: Vec<Edge>,
    oracle_calls: usize,
    cache_hits: usize,
}

impl<'a, T, S> Ledger<'a, T, S>
where
    T: Token,
    S: SimilarityOracle<T> + ?Sized,
{
    pub(crate) fn new(tokens: &'a [T], oracle: &'a S, config: &'a GraphConfig) -> Self {
        let n = tokens.len();
        Self {
            tokens,
            oracle,
            config,
            adjacency: vec![BTreeSet::new(); n],
            connected: HashSet::new(),
            degree: vec![vec![0; config.degree_caps.len()]; n],
            similarity_cache: HashMap::new(),
            edges: Vec::with_capacity(config.max_edges.min(n.saturating_mul(4))),
            oracle_calls: 0,
            cache_hits: 0,
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn budget_exhausted(&self) -> bool {
        self.edges.len() >= self.config.max_edges
    }

    pub(crate) fn oracle_calls(&self) -> usize {
        self.oracle_calls
    }

    pub(crate) fn cache_hits(&self) -> usize {
        self.cache_hits
    }

    /// Whether `node` can take one more edge at `level`.
    pub(crate) fn has_capacity(&self, node: usize, level: usize) -> bool {
        let used = self
            .degree
            .get(node)
            .and_then(|levels| levels.get(level))
            .copied()
            .unwrap_or(0);
        used < self.config.degree_cap(level)
    }

    /// Memoized, clamped similarity for the canonical pair.
    pub(crate) fn cached_similarity(&mut self, a: usize, b: usize) -> f64 {
        let key = pair_key(a, b);
        if let Some(&sim) = self.similarity_cache.get(&key) {
            self.cache_hits += 1;
            return sim;
        }
        self.oracle_calls += 1;
        let sim = clamp_unit(
            self.oracle
                .similarity(&self.tokens[key.0], &self.tokens[key.1]),
        );
        self.similarity_cache.insert(key, sim);
        sim
    }

    /// Record `a↔b` at `level` if the pair is new, both endpoints have
    /// degree left at that level, and the edge budget allows it.
    pub(crate) fn try_connect(
        &mut self,
        a: usize,
        b: usize,
        level: usize,
        via: Option<usize>,
        similarity: f64,
        path_length: usize,
    ) -> bool {
        let n = self.node_count();
        if a == b || a >= n || b >= n {
            return false;
        }
        let key = pair_key(a, b);
        if self.connected.contains(&key)
            || self.budget_exhausted()
            || !self.has_capacity(a, level)
            || !self.has_capacity(b, level)
        {
            return false;
        }

        let (source, target) = key;
        let similarity = clamp_unit(similarity);
        let edge = Edge {
            source_index: source,
            target_index: target,
            level,
            edge_type: edge_type(level),
            weight: layer_weight(similarity, self.config.decay_factor, level),
            similarity,
            via_index: via,
            path_length,
            meta: EdgeMeta {
                span: circular_span(source, target, n),
                source_label: self.tokens[source].label().to_string(),
                target_label: self.tokens[target].label().to_string(),
                similarity,
                via_label: via.map(|v| self.tokens[v].label().to_string()),
            },
        };
        tracing::trace!(source, target, level, similarity, "connected");

        self.connected.insert(key);
        self.adjacency[source].insert(target);
        self.adjacency[target].insert(source);
        self.degree[source][level] += 1;
        self.degree[target][level] += 1;
        self.edges.push(edge);
        true
    }

    /// Hop distances from `source` over the current adjacency, up to
    /// `max_hops`. Includes `source` itself at distance 0.
    pub(crate) fn distance_bfs(&self, source: usize, max_hops: usize) -> HashMap<usize, usize> {
        let mut dist = HashMap::new();
        if source >= self.node_count() {
            return dist;
        }
        let mut frontier = VecDeque::new();
        dist.insert(source, 0);
        frontier.push_back(source);

        while let Some(node) = frontier.pop_front() {
            let d = dist[&node];
            if d >= max_hops {
                continue;
            }
            for &next in &self.adjacency[node] {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    frontier.push_back(next);
                }
            }
        }
        dist
    }

    /// Nodes whose shortest distance from `source` is exactly `depth`,
    /// each paired with the direct neighbor of `source` it was first
    /// reached through. Returned in discovery order.
    pub(crate) fn reach_at_depth(&self, source: usize, depth: usize) -> Vec<(usize, usize)> {
        let mut reached = Vec::new();
        if depth == 0 || source >= self.node_count() {
            return reached;
        }

        // node -> (depth, first hop)
        let mut visited: HashMap<usize, (usize, usize)> = HashMap::new();
        let mut frontier = VecDeque::new();
        visited.insert(source, (0, source));
        for &neighbor in &self.adjacency[source] {
            visited.insert(neighbor, (1, neighbor));
            frontier.push_back(neighbor);
        }

        while let Some(node) = frontier.pop_front() {
            let (d, via) = visited[&node];
            if d == depth {
                reached.push((node, via));
                continue;
            }
            for &next in &self.adjacency[node] {
                if !visited.contains_key(&next) {
                    visited.insert(next, (d + 1, via));
                    frontier.push_back(next);
                }
            }
        }
        reached
    }

    pub(crate) fn into_edges(self) -> Vec<Edge> {
        self.edges
    }
}
