use serde::{Deserialize, Serialize};

use crate::constants::{MIN_EDGE_WEIGHT, RING_WEIGHT};

/// Canonical (min, max) ordering of an unordered pair.
pub fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Circular distance between two positions in a sequence of length `n`.
pub fn circular_span(a: usize, b: usize, n: usize) -> usize {
    let d = a.abs_diff(b);
    d.min(n.saturating_sub(d))
}

/// `1` on the ring, `max(0.05, similarity * decay^level)` above it.
pub fn layer_weight(similarity: f64, decay_factor: f64, level: usize) -> f64 {
    if level == 0 {
        return RING_WEIGHT;
    }
    (similarity * decay_factor.powi(level as i32)).max(MIN_EDGE_WEIGHT)
}

/// Type tag carried by an edge at `level`.
pub fn edge_type(level: usize) -> String {
    if level == 0 {
        "adjacency:base".to_string()
    } else {
        format!("adjacency:layer:{level}")
    }
}

/// Descriptive metadata. Never consulted by the builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMeta {
    pub span: usize,
    pub source_label: String,
    pub target_label: String,
    pub similarity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_label: Option<String>,
}

/// An undirected edge stored once with `source_index < target_index`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source_index: usize,
    pub target_index: usize,
    pub level: usize,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub weight: f64,
    pub similarity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_index: Option<usize>,
    pub path_length: usize,
    pub meta: EdgeMeta,
}

impl Edge {
    pub fn key(&self) -> (usize, usize) {
        (self.source_index, self.target_index)
    }
}

/// Serialize an edge list as a JSON array.
pub fn export_json(edges: &[Edge]) -> serde_json::Result<String> {
    serde_json::to_string(edges)
}

/// Like [`export_json`], indented for reading.
pub fn export_json_pretty(edges: &[Edge]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(edges)
}

/// Parse a JSON array produced by [`export_json`]. Floats read back
/// bit-for-bit.
pub fn import_json(json: &str) -> serde_json::Result<Vec<Edge>> {
    serde_json::from_str(json)
}
