//! Read-only analysis of a finished edge list.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::config::GraphConfig;
use crate::edge::{Edge, pair_key};
use crate::similarity::{SimilarityOracle, clamp_unit};

/// Aggregate shape of a graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub edges_per_level: BTreeMap<usize, usize>,
    pub max_degree_per_level: BTreeMap<usize, usize>,
    pub min_similarity_per_level: BTreeMap<usize, f64>,
    pub total_weight: f64,
    pub mean_span: f64,
}

pub fn summarize(edges: &[Edge], n: usize) -> GraphSummary {
    let mut edges_per_level = BTreeMap::new();
    let mut min_similarity_per_level: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degree: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    let mut total_weight = 0.0;
    let mut span_sum = 0usize;

    for e in edges {
        *edges_per_level.entry(e.level).or_insert(0) += 1;
        min_similarity_per_level
            .entry(e.level)
            .and_modify(|m| *m = m.min(e.similarity))
            .or_insert(e.similarity);
        *degree.entry((e.source_index, e.level)).or_insert(0) += 1;
        *degree.entry((e.target_index, e.level)).or_insert(0) += 1;
        total_weight += e.weight;
        span_sum += e.meta.span;
    }

    let mut max_degree_per_level = BTreeMap::new();
    for ((_, level), d) in degree {
        let entry = max_degree_per_level.entry(level).or_insert(0);
        *entry = (*entry).max(d);
    }

    GraphSummary {
        node_count: n,
        edge_count: edges.len(),
        edges_per_level,
        max_degree_per_level,
        min_similarity_per_level,
        total_weight,
        mean_span: if edges.is_empty() {
            0.0
        } else {
            span_sum as f64 / edges.len() as f64
        },
    }
}

fn adjacency(edges: &[Edge], n: usize) -> Vec<Vec<usize>> {
    let mut adj = vec![Vec::new(); n];
    for e in edges {
        if e.source_index < n && e.target_index < n {
            adj[e.source_index].push(e.target_index);
            adj[e.target_index].push(e.source_index);
        }
    }
    adj
}

fn bfs_within(adj: &[Vec<usize>], a: usize, b: usize, limit: usize) -> Option<usize> {
    if a >= adj.len() || b >= adj.len() {
        return None;
    }
    if a == b {
        return Some(0);
    }
    let mut seen = vec![false; adj.len()];
    let mut frontier = VecDeque::from([(a, 0usize)]);
    seen[a] = true;
    while let Some((node, d)) = frontier.pop_front() {
        if d >= limit {
            continue;
        }
        for &next in &adj[node] {
            if next == b {
                return Some(d + 1);
            }
            if !seen[next] {
                seen[next] = true;
                frontier.push_back((next, d + 1));
            }
        }
    }
    None
}

/// Shortest hop count between `a` and `b`, if it is at most `limit`.
pub fn hop_distance(edges: &[Edge], n: usize, a: usize, b: usize, limit: usize) -> Option<usize> {
    bfs_within(&adjacency(edges, n), a, b, limit)
}

/// A broken structural guarantee.
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    BudgetExceeded { edges: usize, max_edges: usize },
    RingIncomplete { expected: usize, found: usize },
    NonCanonical { source: usize, target: usize },
    Duplicate { source: usize, target: usize },
    DegreeCapExceeded { node: usize, level: usize, degree: usize, cap: usize },
    BelowThreshold { source: usize, target: usize, level: usize, similarity: f64 },
    StrongPairTooFar { source: usize, target: usize, similarity: f64, limit: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetExceeded { edges, max_edges } => {
                write!(f, "edge budget exceeded: {edges} > {max_edges}")
            }
            Self::RingIncomplete { expected, found } => {
                write!(f, "base ring incomplete: expected {expected} edges, found {found}")
            }
            Self::NonCanonical { source, target } => {
                write!(f, "edge {source}->{target} is not in canonical order")
            }
            Self::Duplicate { source, target } => {
                write!(f, "pair ({source}, {target}) appears more than once")
            }
            Self::DegreeCapExceeded { node, level, degree, cap } => {
                write!(f, "node {node} has degree {degree} at level {level} (cap {cap})")
            }
            Self::BelowThreshold { source, target, level, similarity } => write!(
                f,
                "edge ({source}, {target}) at level {level} has similarity {similarity:.3} below threshold"
            ),
            Self::StrongPairTooFar { source, target, similarity, limit } => write!(
                f,
                "strong pair ({source}, {target}) with similarity {similarity:.3} is more than {limit} hops apart"
            ),
        }
    }
}

/// Check a built edge list against the builder's guarantees.
///
/// The bounded-hop check scores every pair with `oracle`, so it is
/// quadratic in the token count. Pairs where either endpoint has no degree
/// left at the connectivity level, or where the edge budget is used up,
/// are exempt.
pub fn check_invariants<T, S>(
    edges: &[Edge],
    tokens: &[T],
    config: &GraphConfig,
    oracle: &S,
) -> Vec<Violation>
where
    S: SimilarityOracle<T> + ?Sized,
{
    let n = tokens.len();
    let mut violations = Vec::new();

    if edges.len() > config.max_edges {
        violations.push(Violation::BudgetExceeded {
            edges: edges.len(),
            max_edges: config.max_edges,
        });
    }

    let mut seen = HashSet::new();
    let mut degree: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for e in edges {
        if e.source_index >= e.target_index {
            violations.push(Violation::NonCanonical {
                source: e.source_index,
                target: e.target_index,
            });
        }
        let key = pair_key(e.source_index, e.target_index);
        if !seen.insert(key) {
            violations.push(Violation::Duplicate {
                source: key.0,
                target: key.1,
            });
        }
        *degree.entry((e.source_index, e.level)).or_insert(0) += 1;
        *degree.entry((e.target_index, e.level)).or_insert(0) += 1;
        if e.level > 0 && e.similarity < config.similarity_threshold {
            violations.push(Violation::BelowThreshold {
                source: e.source_index,
                target: e.target_index,
                level: e.level,
                similarity: e.similarity,
            });
        }
    }

    for (&(node, level), &d) in &degree {
        let cap = config.degree_cap(level);
        if d > cap {
            violations.push(Violation::DegreeCapExceeded {
                node,
                level,
                degree: d,
                cap,
            });
        }
    }

    let expected_ring = match n {
        0 | 1 => 0,
        2 => 1,
        _ => n,
    };
    let found_ring = (0..n)
        .filter(|&i| {
            n >= 2 && {
                let key = pair_key(i, (i + 1) % n);
                edges.iter().any(|e| e.level == 0 && e.key() == key)
            }
        })
        .map(|i| pair_key(i, (i + 1) % n))
        .collect::<HashSet<_>>()
        .len();
    if found_ring != expected_ring {
        violations.push(Violation::RingIncomplete {
            expected: expected_ring,
            found: found_ring,
        });
    }

    if let Some(level) = config.connectivity_level()
        && edges.len() < config.max_edges
    {
        let adj = adjacency(edges, n);
        let cap = config.degree_cap(level);
        let has_room = |node: usize| degree.get(&(node, level)).copied().unwrap_or(0) < cap;
        let limit = level + 1;
        for a in 0..n {
            if !has_room(a) {
                continue;
            }
            for b in a + 1..n {
                if !has_room(b) {
                    continue;
                }
                let similarity = clamp_unit(oracle.similarity(&tokens[a], &tokens[b]));
                if similarity < config.strong_similarity_threshold {
                    continue;
                }
                if bfs_within(&adj, a, b, limit).is_none() {
                    violations.push(Violation::StrongPairTooFar {
                        source: a,
                        target: b,
                        similarity,
                        limit,
                    });
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::LayeredGraphBuilder;
    use crate::config::GraphOptions;
    use crate::edge::{EdgeMeta, edge_type};

    fn edge(a: usize, b: usize, level: usize, similarity: f64) -> Edge {
        Edge {
            source_index: a,
            target_index: b,
            level,
            edge_type: edge_type(level),
            weight: 1.0,
            similarity,
            via_index: None,
            path_length: 1,
            meta: EdgeMeta {
                span: a.abs_diff(b),
                source_label: String::new(),
                target_label: String::new(),
                similarity,
                via_label: None,
            },
        }
    }

    fn ring(n: usize) -> Vec<Edge> {
        (0..n)
            .map(|i| {
                let (a, b) = pair_key(i, (i + 1) % n);
                edge(a, b, 0, 1.0)
            })
            .collect()
    }

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{i}")).collect()
    }

    #[test]
    fn test_hop_distance() {
        let edges = ring(8);
        assert_eq!(hop_distance(&edges, 8, 0, 4, 10), Some(4));
        assert_eq!(hop_distance(&edges, 8, 0, 4, 3), None);
        assert_eq!(hop_distance(&edges, 8, 2, 2, 0), Some(0));
        assert_eq!(hop_distance(&edges, 8, 0, 7, 1), Some(1));
    }

    #[test]
    fn test_summary_counts() {
        let mut edges = ring(6);
        edges.push(edge(0, 2, 1, 0.6));
        edges.push(edge(0, 3, 1, 0.4));
        let s = summarize(&edges, 6);
        assert_eq!(s.edge_count, 8);
        assert_eq!(s.edges_per_level.get(&0), Some(&6));
        assert_eq!(s.edges_per_level.get(&1), Some(&2));
        assert_eq!(s.max_degree_per_level.get(&0), Some(&2));
        assert_eq!(s.max_degree_per_level.get(&1), Some(&2));
        assert_eq!(s.min_similarity_per_level.get(&1), Some(&0.4));
    }

    #[test]
    fn test_summary_empty() {
        let s = summarize(&[], 0);
        assert_eq!(s.edge_count, 0);
        assert_eq!(s.mean_span, 0.0);
    }

    #[test]
    fn test_clean_build_has_no_violations() {
        let tokens = labels(25);
        let oracle = |a: &String, b: &String| if a.len() == b.len() { 0.9 } else { 0.2 };
        let builder = LayeredGraphBuilder::default();
        let (edges, stats) = builder.build_with_stats(&tokens, &oracle);
        let violations = check_invariants(&edges, &tokens, &stats.config, &oracle);
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_detects_structural_violations() {
        let tokens = labels(4);
        let config = GraphOptions::new().max_layers(1).max_degree_per_layer(1usize).resolve(4);
        let oracle = |_: &String, _: &String| 0.0;
        let mut edges = ring(4);
        edges.push(edge(3, 1, 1, 0.9));
        edges.push(edge(0, 1, 1, 0.1));
        edges.push(edge(1, 3, 1, 0.9));

        let violations = check_invariants(&edges, &tokens, &config, &oracle);
        assert!(violations.contains(&Violation::NonCanonical { source: 3, target: 1 }));
        assert!(violations.contains(&Violation::Duplicate { source: 0, target: 1 }));
        assert!(violations.contains(&Violation::Duplicate { source: 1, target: 3 }));
        assert!(violations.iter().any(|v| matches!(v, Violation::BelowThreshold { .. })));
        assert!(violations.iter().any(|v| matches!(
            v,
            Violation::DegreeCapExceeded { node: 1, level: 1, .. }
        )));
    }

    #[test]
    fn test_detects_missing_ring_edge() {
        let tokens = labels(5);
        let config = GraphOptions::new().resolve(5);
        let oracle = |_: &String, _: &String| 0.0;
        let mut edges = ring(5);
        edges.pop();
        let violations = check_invariants(&edges, &tokens, &config, &oracle);
        assert_eq!(
            violations,
            vec![Violation::RingIncomplete { expected: 5, found: 4 }]
        );
    }

    #[test]
    fn test_detects_distant_strong_pair() {
        let tokens = labels(12);
        let config = GraphOptions::new().max_layers(1).resolve(12);
        let oracle = |a: &String, b: &String| {
            if (a.as_str(), b.as_str()) == ("t0", "t6") { 0.99 } else { 0.0 }
        };
        let violations = check_invariants(&ring(12), &tokens, &config, &oracle);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].to_string().contains("strong pair (0, 6)"));
    }
}
