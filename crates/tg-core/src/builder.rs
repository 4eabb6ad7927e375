//! Layered similarity-graph construction.
//!
//! A build runs three phases over one edge/degree ledger:
//!
//! 1. **Ring**: `i ↔ (i+1) mod N` at level 0, unconditionally. The graph is
//!    connected before any gated expansion happens.
//! 2. **Layer expansion**: for each level `ℓ = 1..=max_layers`, every node
//!    looks at the nodes exactly `ℓ+1` hops away in the graph built so far
//!    and connects to those whose similarity clears the threshold, subject
//!    to the per-level degree cap. Only nodes already reachable through the
//!    graph are ever scored, so no level does all-pairs similarity.
//! 3. **Bounded-hop pass**: every pair further apart than the top level
//!    whose similarity clears the strong threshold is joined directly, so
//!    strongly similar tokens always end up close in the final graph,
//!    budget permitting.
//!
//! The edge budget is checked throughout; once exhausted, remaining phases
//! stop and the edges built so far are returned as-is.

use serde::Serialize;

use crate::config::{GraphConfig, GraphOptions};
use crate::constants::RING_WEIGHT;
use crate::edge::Edge;
use crate::ledger::Ledger;
use crate::similarity::{SimilarityOracle, Token};

/// Counters describing one build. Never affects the edge list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuildStats {
    pub config: GraphConfig,
    pub ring_edges: usize,
    /// Edges added by expansion, indexed by `level - 1`.
    pub layer_edges: Vec<usize>,
    pub connectivity_edges: usize,
    pub oracle_calls: usize,
    pub cache_hits: usize,
    pub budget_exhausted: bool,
}

impl BuildStats {
    pub fn total_edges(&self) -> usize {
        self.ring_edges + self.layer_edges.iter().sum::<usize>() + self.connectivity_edges
    }
}

/// Reusable builder holding caller options. Options are resolved against
/// the token count on every build.
#[derive(Clone, Debug, Default)]
pub struct LayeredGraphBuilder {
    options: GraphOptions,
}

impl LayeredGraphBuilder {
    pub fn new(options: GraphOptions) -> Self {
        Self { options }
    }

    pub fn build<T, S>(&self, tokens: &[T], oracle: &S) -> Vec<Edge>
    where
        T: Token,
        S: SimilarityOracle<T> + ?Sized,
    {
        self.build_with_stats(tokens, oracle).0
    }

    pub fn build_with_stats<T, S>(&self, tokens: &[T], oracle: &S) -> (Vec<Edge>, BuildStats)
    where
        T: Token,
        S: SimilarityOracle<T> + ?Sized,
    {
        let n = tokens.len();
        let config = self.options.resolve(n);
        let mut stats = BuildStats {
            config: config.clone(),
            ring_edges: 0,
            layer_edges: vec![0; config.max_layers],
            connectivity_edges: 0,
            oracle_calls: 0,
            cache_hits: 0,
            budget_exhausted: false,
        };
        if n < 2 {
            return (Vec::new(), stats);
        }

        let mut ledger = Ledger::new(tokens, oracle, &config);

        stats.ring_edges = build_ring(&mut ledger);
        tracing::debug!(n, edges = stats.ring_edges, "base ring built");

        expand_layers(&mut ledger, &config, &mut stats.layer_edges);
        tracing::debug!(
            edges = ledger.edge_count(),
            per_level = ?stats.layer_edges,
            "layer expansion finished"
        );

        stats.connectivity_edges = connect_strong_pairs(&mut ledger, &config);

        stats.oracle_calls = ledger.oracle_calls();
        stats.cache_hits = ledger.cache_hits();
        stats.budget_exhausted = ledger.budget_exhausted();
        if stats.budget_exhausted {
            tracing::debug!(max_edges = config.max_edges, "edge budget exhausted");
        }
        (ledger.into_edges(), stats)
    }
}

/// Build with `options` in one call.
pub fn build_layered_graph<T, S>(tokens: &[T], options: &GraphOptions, oracle: &S) -> Vec<Edge>
where
    T: Token,
    S: SimilarityOracle<T> + ?Sized,
{
    LayeredGraphBuilder::new(options.clone()).build(tokens, oracle)
}

fn build_ring<T, S>(ledger: &mut Ledger<'_, T, S>) -> usize
where
    T: Token,
    S: SimilarityOracle<T> + ?Sized,
{
    let n = ledger.node_count();
    (0..n)
        .filter(|&i| ledger.try_connect(i, (i + 1) % n, 0, None, RING_WEIGHT, 1))
        .count()
}

fn expand_layers<T, S>(
    ledger: &mut Ledger<'_, T, S>,
    config: &GraphConfig,
    per_level: &mut [usize],
) where
    T: Token,
    S: SimilarityOracle<T> + ?Sized,
{
    let n = ledger.node_count();

    for level in 1..=config.max_layers {
        if ledger.budget_exhausted() {
            break;
        }
        if config.degree_cap(level) == 0 {
            continue;
        }
        let depth = level + 1;
        let mut added = 0;

        'sources: for source in 0..n {
            if ledger.budget_exhausted() {
                break;
            }
            if !ledger.has_capacity(source, level) {
                continue;
            }

            for (target, via) in ledger.reach_at_depth(source, depth) {
                if !ledger.has_capacity(source, level) {
                    break;
                }
                if !ledger.has_capacity(target, level) {
                    continue;
                }
                let similarity = ledger.cached_similarity(source, target);
                if similarity < config.similarity_threshold {
                    continue;
                }
                if ledger.try_connect(source, target, level, Some(via), similarity, depth) {
                    added += 1;
                } else if ledger.budget_exhausted() {
                    break 'sources;
                }
            }
        }

        per_level[level - 1] = added;
    }
}

fn connect_strong_pairs<T, S>(ledger: &mut Ledger<'_, T, S>, config: &GraphConfig) -> usize
where
    T: Token,
    S: SimilarityOracle<T> + ?Sized,
{
    let Some(level) = config.connectivity_level() else {
        tracing::debug!(
            threshold = config.similarity_threshold,
            strong = config.strong_similarity_threshold,
            max_layers = config.max_layers,
            "bounded-hop pass skipped"
        );
        return 0;
    };

    let n = ledger.node_count();
    let mut added = 0;

    'sources: for source in 0..n {
        if ledger.budget_exhausted() {
            break;
        }
        if !ledger.has_capacity(source, level) {
            continue;
        }
        let dist = ledger.distance_bfs(source, level);

        for target in source + 1..n {
            if dist.contains_key(&target) {
                continue;
            }
            if !ledger.has_capacity(source, level) {
                break;
            }
            if !ledger.has_capacity(target, level) {
                continue;
            }
            let similarity = ledger.cached_similarity(source, target);
            if similarity < config.strong_similarity_threshold {
                continue;
            }
            if ledger.try_connect(source, target, level, None, similarity, level + 1) {
                added += 1;
            } else if ledger.budget_exhausted() {
                break 'sources;
            }
        }
    }

    tracing::debug!(level, edges = added, "bounded-hop pass finished");
    added
}
