//! Fixed-length feature vectors for semantic scoring.
//!
//! Document vectors are TF-IDF weights placed in first-occurrence order of
//! the document's terms. Query vectors cannot use IDF (a query is not part
//! of the corpus), so both sides are compared in a hashed projection space:
//! every weighted term is folded into the slot chosen by hashing the term.
//! Shared terms land in the same slot, which makes the cosine meaningful.

use std::{
    collections::{HashMap, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
};

use crate::{inverted_index::InvertedIndex, tokenizer};

/// Default number of slots in a feature vector.
pub const DEFAULT_DIMENSION: usize = 100;

/// A document's feature vector plus the term owning each populated slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embedding {
    /// `terms[i]` is the term weighted in `values[i]`.
    pub terms: Vec<String>,
    /// Fixed-length TF-IDF values; slots past `terms.len()` stay zero.
    pub values: Vec<f32>,
}

impl Embedding {
    /// Fold the document vector into the hashed space used by queries.
    pub fn project(&self) -> Vec<f32> {
        let dimension = self.values.len();
        let mut projected = vec![0.0; dimension];
        if dimension == 0 {
            return projected;
        }
        for (term, value) in self.terms.iter().zip(&self.values) {
            projected[slot(term, dimension)] += value;
        }
        projected
    }

    pub fn approximate_size(&self) -> usize {
        self.values.len() * std::mem::size_of::<f32>()
            + self.terms.iter().map(String::len).sum::<usize>()
    }
}

/// Compute a document vector from its index terms.
///
/// Term frequency is `count / total_tokens`; inverse document frequency is
/// `ln(total_documents / max(1, document_frequency))`, read from `index`
/// as it stands right now. Vectors are not refreshed when the corpus
/// changes later.
pub fn embed(
    tokens: &[String],
    index: &InvertedIndex,
    dimension: usize,
) -> Embedding {
    let mut values = vec![0.0; dimension];
    if tokens.is_empty() || dimension == 0 {
        return Embedding {
            terms: Vec::new(),
            values,
        };
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for token in tokens {
        let count = counts.entry(token.as_str()).or_insert(0);
        if *count == 0 {
            order.push(token.as_str());
        }
        *count += 1;
    }

    let total_tokens = tokens.len() as f32;
    let total_docs = index.size().max(1) as f32;
    let terms: Vec<String> =
        order.iter().take(dimension).map(|t| t.to_string()).collect();

    for (slot, term) in terms.iter().enumerate() {
        let tf = counts[term.as_str()] as f32 / total_tokens;
        let df = index.document_frequency(term).max(1) as f32;
        values[slot] = tf * (total_docs / df).ln();
    }

    Embedding { terms, values }
}

/// Deterministic hashed projection of a query.
///
/// Each distinct query term contributes its term frequency to the slot
/// selected by hashing it.
pub fn embed_query(text: &str, dimension: usize) -> Vec<f32> {
    let mut values = vec![0.0; dimension];
    let tokens = tokenizer::tokenize(text);
    if tokens.is_empty() || dimension == 0 {
        return values;
    }

    let weight = 1.0 / tokens.len() as f32;
    for token in &tokens {
        values[slot(token, dimension)] += weight;
    }
    values
}

/// Cosine of the angle between `a` and `b`; 0 when either has no
/// magnitude. Vectors of unequal length are compared over the shorter.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn slot(term: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    term.hash(&mut hasher);
    (hasher.finish() % dimension as u64) as usize
}
