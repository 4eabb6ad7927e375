//! Configuration resolution.
//!
//! Callers hand the builder loosely specified knobs: fields may be missing,
//! out of range, or (for degree caps) given as one scalar meant for every
//! layer. [`GraphOptions::resolve`] turns that into a [`GraphConfig`] where
//! every field is concrete and clamped, so the build phases never branch on
//! "is this set?".

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    DEFAULT_DECAY_FACTOR, DEFAULT_EDGES_PER_NODE, DEFAULT_MAX_LAYERS,
    DEFAULT_SIMILARITY_THRESHOLD, DEGREE_LOG_SCALE, MAX_DECAY_FACTOR, MAX_LAYERS, MIN_DECAY_FACTOR,
    MIN_DEFAULT_DEGREE, STRONG_THRESHOLD_FLOOR, STRONG_THRESHOLD_OFFSET,
};
use crate::similarity::clamp_unit;

/// Per-layer degree cap as supplied by a caller.
///
/// A scalar applies to every expansion layer. An array configures layers
/// in order: entry `i` is the cap for level `i + 1`. Missing, negative or
/// non-finite entries fall back to the computed default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DegreeCap {
    Uniform(f64),
    PerLayer(Vec<Option<f64>>),
}

impl DegreeCap {
    fn for_level(&self, level: usize) -> Option<usize> {
        let raw = match self {
            Self::Uniform(v) => Some(*v),
            Self::PerLayer(caps) => level
                .checked_sub(1)
                .and_then(|i| caps.get(i).copied().flatten()),
        }?;
        (raw.is_finite() && raw >= 0.0).then(|| raw.floor() as usize)
    }
}

impl From<usize> for DegreeCap {
    fn from(cap: usize) -> Self {
        Self::Uniform(cap as f64)
    }
}

impl From<Vec<usize>> for DegreeCap {
    fn from(caps: Vec<usize>) -> Self {
        Self::PerLayer(caps.into_iter().map(|c| Some(c as f64)).collect())
    }
}

/// Any scalar a config source might hold where a number is expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(i64),
    Float(f64),
    Other(IgnoredAny),
}

impl LooseNumber {
    fn to_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Float(v) if v.is_finite() => Some(v.floor() as i64),
            _ => None,
        }
    }

    fn to_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            Self::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseDegreeCap {
    PerLayer(Vec<LooseNumber>),
    Uniform(LooseNumber),
}

// A wrongly typed field reads as unset so `resolve` substitutes its default
// instead of the whole record failing to load.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(LooseNumber::deserialize(deserializer)?.to_i64())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(LooseNumber::deserialize(deserializer)?.to_f64())
}

fn lenient_degree_cap<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DegreeCap>, D::Error> {
    Ok(match LooseDegreeCap::deserialize(deserializer)? {
        LooseDegreeCap::PerLayer(caps) => Some(DegreeCap::PerLayer(
            caps.iter().map(LooseNumber::to_f64).collect(),
        )),
        LooseDegreeCap::Uniform(cap) => cap.to_f64().map(DegreeCap::Uniform),
    })
}

/// Loose, caller-facing build options. Every field is optional, and a field
/// of the wrong type deserializes as `None` rather than failing the record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    #[serde(alias = "maxLayers", deserialize_with = "lenient_i64")]
    pub max_layers: Option<i64>,
    #[serde(alias = "maxEdges", deserialize_with = "lenient_i64")]
    pub max_edges: Option<i64>,
    #[serde(alias = "maxDegreePerLayer", deserialize_with = "lenient_degree_cap")]
    pub max_degree_per_layer: Option<DegreeCap>,
    #[serde(alias = "similarityThreshold", deserialize_with = "lenient_f64")]
    pub similarity_threshold: Option<f64>,
    #[serde(alias = "strongSimilarityThreshold", deserialize_with = "lenient_f64")]
    pub strong_similarity_threshold: Option<f64>,
    #[serde(alias = "decayFactor", deserialize_with = "lenient_f64")]
    pub decay_factor: Option<f64>,
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_layers(mut self, layers: i64) -> Self {
        self.max_layers = Some(layers);
        self
    }

    pub fn max_edges(mut self, edges: i64) -> Self {
        self.max_edges = Some(edges);
        self
    }

    pub fn max_degree_per_layer(mut self, cap: impl Into<DegreeCap>) -> Self {
        self.max_degree_per_layer = Some(cap.into());
        self
    }

    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn strong_similarity_threshold(mut self, threshold: f64) -> Self {
        self.strong_similarity_threshold = Some(threshold);
        self
    }

    pub fn decay_factor(mut self, decay: f64) -> Self {
        self.decay_factor = Some(decay);
        self
    }

    /// Overlay `other` on top of `self`: fields set in `other` win.
    pub fn merged_with(mut self, other: &GraphOptions) -> Self {
        if other.max_layers.is_some() {
            self.max_layers = other.max_layers;
        }
        if other.max_edges.is_some() {
            self.max_edges = other.max_edges;
        }
        if other.max_degree_per_layer.is_some() {
            self.max_degree_per_layer = other.max_degree_per_layer.clone();
        }
        if other.similarity_threshold.is_some() {
            self.similarity_threshold = other.similarity_threshold;
        }
        if other.strong_similarity_threshold.is_some() {
            self.strong_similarity_threshold = other.strong_similarity_threshold;
        }
        if other.decay_factor.is_some() {
            self.decay_factor = other.decay_factor;
        }
        self
    }

    /// Resolve against a token count. Never fails: anything missing or out
    /// of range is replaced by its default or clamped.
    pub fn resolve(&self, n: usize) -> GraphConfig {
        let max_layers = match self.max_layers {
            Some(layers) if layers >= 0 => (layers as usize).min(MAX_LAYERS),
            _ => DEFAULT_MAX_LAYERS,
        };

        let complete = complete_edge_count(n);
        let requested = match self.max_edges {
            Some(edges) if edges > 0 => edges as usize,
            _ => complete.min(n.saturating_mul(DEFAULT_EDGES_PER_NODE)),
        };
        let max_edges = complete.min(n.max(requested));

        let fallback = default_degree_cap(n);
        let mut degree_caps = Vec::with_capacity(max_layers + 1);
        degree_caps.push(usize::MAX);
        for level in 1..=max_layers {
            let cap = self
                .max_degree_per_layer
                .as_ref()
                .and_then(|c| c.for_level(level))
                .unwrap_or(fallback);
            degree_caps.push(cap);
        }

        let similarity_threshold = self
            .similarity_threshold
            .filter(|t| t.is_finite())
            .map(clamp_unit)
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);

        let strong_similarity_threshold = self
            .strong_similarity_threshold
            .filter(|t| t.is_finite())
            .unwrap_or_else(|| {
                (similarity_threshold + STRONG_THRESHOLD_OFFSET).max(STRONG_THRESHOLD_FLOOR)
            });

        let decay_factor = self
            .decay_factor
            .filter(|d| d.is_finite())
            .map(|d| d.clamp(MIN_DECAY_FACTOR, MAX_DECAY_FACTOR))
            .unwrap_or(DEFAULT_DECAY_FACTOR);

        GraphConfig {
            node_count: n,
            max_layers,
            max_edges,
            degree_caps,
            similarity_threshold,
            strong_similarity_threshold: clamp_unit(strong_similarity_threshold),
            decay_factor,
        }
    }
}

/// Fully resolved configuration for one build over `node_count` tokens.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphConfig {
    pub node_count: usize,
    pub max_layers: usize,
    pub max_edges: usize,
    /// Indexed by level. Level 0 (the ring) is always `usize::MAX`.
    pub degree_caps: Vec<usize>,
    pub similarity_threshold: f64,
    pub strong_similarity_threshold: f64,
    pub decay_factor: f64,
}

impl GraphConfig {
    /// Degree cap at `level`; levels beyond the configured range get 0.
    pub fn degree_cap(&self, level: usize) -> usize {
        self.degree_caps.get(level).copied().unwrap_or(0)
    }

    /// Level at which the bounded-hop pass connects strongly similar pairs,
    /// or `None` when the pass cannot have any effect.
    pub fn connectivity_level(&self) -> Option<usize> {
        if self.strong_similarity_threshold <= self.similarity_threshold {
            return None;
        }
        let last_cap_index = self.degree_caps.len().saturating_sub(1);
        let level = self.max_layers.min(last_cap_index);
        (level > 0).then_some(level)
    }
}

/// Edge count of the complete graph on `n` nodes.
pub fn complete_edge_count(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// `max(4, ceil(log2(max(2, n)) * 3))`
pub fn default_degree_cap(n: usize) -> usize {
    let scaled = ((n.max(2) as f64).log2() * DEGREE_LOG_SCALE).ceil() as usize;
    scaled.max(MIN_DEFAULT_DEGREE)
}
