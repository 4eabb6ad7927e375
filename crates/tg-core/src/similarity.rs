//! Similarity oracles and token descriptors.
//!
//! The builder only consumes similarity through [`SimilarityOracle`]; any
//! pure `Fn(&T, &T) -> f64` qualifies. [`TokenDescriptor`] plus
//! [`DescriptorSimilarity`] is a default oracle for hosts that have nothing
//! better: a hashed character-trigram profile compared by cosine.

use serde::{Deserialize, Serialize};

use crate::constants::DESCRIPTOR_DIM;

/// Anything the builder can label in edge metadata.
pub trait Token {
    fn label(&self) -> &str;
}

impl Token for String {
    fn label(&self) -> &str {
        self
    }
}

impl Token for &str {
    fn label(&self) -> &str {
        self
    }
}

/// Pure pairwise similarity in [0, 1]. Out-of-range results are clamped by
/// the builder before use.
pub trait SimilarityOracle<T: ?Sized> {
    fn similarity(&self, a: &T, b: &T) -> f64;
}

impl<T: ?Sized, F> SimilarityOracle<T> for F
where
    F: Fn(&T, &T) -> f64,
{
    fn similarity(&self, a: &T, b: &T) -> f64 {
        self(a, b)
    }
}

/// Clamp to [0, 1]. NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Cosine similarity with negatives floored to 0. Mismatched lengths or
/// zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    clamp_unit(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// FNV-1a over the bytes of `s`.
fn fnv1a(s: &str) -> u64 {
    let mut h = 0xcbf29ce484222325u64;
    for b in s.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// A token with a fixed-width, L2-normalized trigram profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub label: String,
    pub vector: Vec<f32>,
}

impl TokenDescriptor {
    /// Build a descriptor with an explicit vector (e.g. a real embedding).
    pub fn new(label: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            vector,
        }
    }

    /// Hash the boundary-padded character trigrams of `text` into
    /// `DESCRIPTOR_DIM` buckets. Case-insensitive.
    pub fn from_text(text: &str) -> Self {
        let mut vector = vec![0.0f32; DESCRIPTOR_DIM];
        let padded: Vec<char> = format!("^{}$", text.to_lowercase()).chars().collect();

        if padded.len() < 3 {
            return Self::new(text, vector);
        }
        for window in padded.windows(3) {
            let gram: String = window.iter().collect();
            let bucket = (fnv1a(&gram) % DESCRIPTOR_DIM as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Self::new(text, vector)
    }
}

impl Token for TokenDescriptor {
    fn label(&self) -> &str {
        &self.label
    }
}

/// Cosine oracle over [`TokenDescriptor`] vectors.
#[derive(Clone, Copy, Debug, Default)]
pub struct DescriptorSimilarity;

impl SimilarityOracle<TokenDescriptor> for DescriptorSimilarity {
    fn similarity(&self, a: &TokenDescriptor, b: &TokenDescriptor) -> f64 {
        cosine_similarity(&a.vector, &b.vector)
    }
}
