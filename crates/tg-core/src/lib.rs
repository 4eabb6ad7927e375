//! Layered similarity-graph builder.
//!
//! Turns an ordered token sequence and a pairwise similarity oracle into a
//! bounded-degree, multi-layer graph: a base ring for connectivity, then
//! similarity-gated layers discovered through the graph itself, then a
//! final pass guaranteeing strongly similar tokens sit within a bounded
//! number of hops of each other.
//!
//! Zero I/O. Every build owns its own state and returns a plain edge list.

pub mod builder;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod edge;
mod ledger;
pub mod similarity;

pub use builder::{BuildStats, LayeredGraphBuilder, build_layered_graph};
pub use config::{DegreeCap, GraphConfig, GraphOptions};
pub use diagnostics::{GraphSummary, Violation, check_invariants, hop_distance, summarize};
pub use edge::{Edge, EdgeMeta, export_json, export_json_pretty, import_json};
pub use similarity::{
    DescriptorSimilarity, SimilarityOracle, Token, TokenDescriptor, clamp_unit, cosine_similarity,
};
