/// Expansion rounds beyond the base ring when none are requested.
pub const DEFAULT_MAX_LAYERS: usize = 3;

/// Upper clamp on expansion rounds.
pub const MAX_LAYERS: usize = 64;

/// Default edge allowance per token when no edge budget is given.
pub const DEFAULT_EDGES_PER_NODE: usize = 8;

/// Lower bound of the computed per-layer degree cap.
pub const MIN_DEFAULT_DEGREE: usize = 4;

/// Multiplier applied to log2(N) when computing the default degree cap.
pub const DEGREE_LOG_SCALE: f64 = 3.0;

/// Minimum similarity an expansion edge must clear.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Offset added to the similarity threshold for the strong default.
pub const STRONG_THRESHOLD_OFFSET: f64 = 0.35;

/// Floor of the default strong-similarity threshold.
pub const STRONG_THRESHOLD_FLOOR: f64 = 0.8;

/// Per-level weight decay.
pub const DEFAULT_DECAY_FACTOR: f64 = 0.72;

/// Decay factor clamp bounds.
pub const MIN_DECAY_FACTOR: f64 = 0.1;
pub const MAX_DECAY_FACTOR: f64 = 0.95;

/// Expansion edges never weigh less than this.
pub const MIN_EDGE_WEIGHT: f64 = 0.05;

/// Weight and similarity recorded on base ring edges.
pub const RING_WEIGHT: f64 = 1.0;

/// Dimensionality of hashed trigram descriptors.
pub const DESCRIPTOR_DIM: usize = 64;
