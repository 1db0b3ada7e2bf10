//! Composite relevance scoring, highlighting and result ordering.
//!
//! A candidate's score is the sum of:
//!
//! | Factor                                  | Weight          |
//! |-----------------------------------------|-----------------|
//! | full query text inside the title        | 10.0            |
//! | full query text inside a tag            | 7.0             |
//! | full query text inside the content      | 5.0             |
//! | each query token among title tokens     | 3.0             |
//! | each query token among tag tokens       | 2.0             |
//! | each query token among content tokens   | 1.0             |
//! | each query token in author/category/... | 1.0 (contextual)|
//! | `priority = high` / `critical`          | 1.0 / 2.0       |
//! | vector similarity                       | cosine × 5.0    |
//!
//! Any candidate that reaches scoring gets at least [`MIN_SCORE`].

use std::{cmp::Ordering, collections::HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    document::{Document, Priority},
    embedding::{self, cosine_similarity},
    query::{SearchOptions, SortKey, SortOrder},
    text_util, tokenizer,
};

pub const TITLE_EXACT_WEIGHT: f32 = 10.0;
pub const TAG_EXACT_WEIGHT: f32 = 7.0;
pub const CONTENT_EXACT_WEIGHT: f32 = 5.0;
pub const TITLE_TOKEN_WEIGHT: f32 = 3.0;
pub const TAG_TOKEN_WEIGHT: f32 = 2.0;
pub const CONTENT_TOKEN_WEIGHT: f32 = 1.0;
pub const CONTEXT_TOKEN_WEIGHT: f32 = 1.0;
pub const HIGH_PRIORITY_BOOST: f32 = 1.0;
pub const CRITICAL_PRIORITY_BOOST: f32 = 2.0;
pub const SEMANTIC_WEIGHT: f32 = 5.0;

/// Floor applied to every scored candidate.
pub const MIN_SCORE: f32 = 0.1;

/// How a result relates to the query, decided by a fixed priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Semantic,
    Fuzzy,
    Contextual,
}

/// Query tokens and phrase found in each field, for the caller to mark up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub title: Vec<String>,
    pub content: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceFactor {
    pub factor: String,
    pub weight: f32,
}

/// A ranked document. Lives only as long as the caller needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
    pub highlights: Highlights,
    pub explanation: String,
    pub match_type: MatchType,
    pub matched_terms: Vec<String>,
    pub relevance_factors: Vec<RelevanceFactor>,
}

/// Query text normalized once and shared by every candidate.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    /// Lowercased, trimmed query text.
    pub phrase: String,
    /// Distinct stemmed tokens, in query order.
    pub terms: Vec<String>,
    /// Distinct unstemmed words, in query order.
    pub words: Vec<String>,
    /// Hashed query projection.
    pub vector: Vec<f32>,
}

impl PreparedQuery {
    pub fn new(text: &str, dimension: usize) -> Self {
        Self {
            phrase: text.trim().to_lowercase(),
            terms: dedup(tokenizer::tokenize(text)),
            words: dedup(tokenizer::words(text)),
            vector: embedding::embed_query(text, dimension),
        }
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Per-field token sets of one document.
struct FieldTokens {
    title: HashSet<String>,
    content: HashSet<String>,
    tags: HashSet<String>,
    context: HashSet<String>,
}

impl FieldTokens {
    fn of(doc: &Document) -> Self {
        let set = |text: &str| -> HashSet<String> {
            tokenizer::tokenize(text).into_iter().collect()
        };
        let mut context_text = format!(
            "{} {}",
            doc.metadata.author, doc.metadata.category
        );
        for name in &doc.metadata.collaborators {
            context_text.push(' ');
            context_text.push_str(name);
        }

        Self {
            title: set(&doc.title),
            content: set(&doc.content),
            tags: set(&doc.tags.join(" ")),
            context: set(&context_text),
        }
    }
}

/// Score of one candidate with the factors that produced it.
#[derive(Debug, Clone)]
pub struct Scored {
    pub score: f32,
    pub factors: Vec<RelevanceFactor>,
    pub matched_terms: Vec<String>,
}

/// Compute the composite relevance score of `doc`.
pub fn score(
    doc: &Document,
    query: &PreparedQuery,
    options: &SearchOptions,
) -> Scored {
    let mut factors = Vec::new();
    let mut push = |factor: &str, weight: f32| {
        if weight > 0.0 {
            factors.push(RelevanceFactor {
                factor: factor.to_string(),
                weight,
            });
        }
    };

    if !query.phrase.is_empty() {
        if doc.title.to_lowercase().contains(&query.phrase) {
            push("title exact match", TITLE_EXACT_WEIGHT);
        }
        if doc.content.to_lowercase().contains(&query.phrase) {
            push("content exact match", CONTENT_EXACT_WEIGHT);
        }
        if doc
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&query.phrase))
        {
            push("tag exact match", TAG_EXACT_WEIGHT);
        }
    }

    let fields = FieldTokens::of(doc);
    let overlap = |set: &HashSet<String>| {
        query.terms.iter().filter(|t| set.contains(*t)).count() as f32
    };
    push("title terms", overlap(&fields.title) * TITLE_TOKEN_WEIGHT);
    push("content terms", overlap(&fields.content) * CONTENT_TOKEN_WEIGHT);
    push("tag terms", overlap(&fields.tags) * TAG_TOKEN_WEIGHT);
    if options.contextual {
        push("context terms", overlap(&fields.context) * CONTEXT_TOKEN_WEIGHT);
    }

    match doc.metadata.priority {
        Priority::High => push("high priority", HIGH_PRIORITY_BOOST),
        Priority::Critical => {
            push("critical priority", CRITICAL_PRIORITY_BOOST)
        }
        Priority::Low | Priority::Medium => {}
    }

    if options.semantic
        && let Some(embedding) = &doc.embedding
    {
        let similarity =
            cosine_similarity(&embedding.project(), &query.vector).max(0.0);
        push("semantic similarity", similarity * SEMANTIC_WEIGHT);
    }

    let matched_terms = query
        .terms
        .iter()
        .filter(|t| {
            fields.title.contains(*t)
                || fields.content.contains(*t)
                || fields.tags.contains(*t)
        })
        .cloned()
        .collect();

    let total: f32 = factors.iter().map(|f| f.weight).sum();
    Scored {
        score: total.max(MIN_SCORE),
        factors,
        matched_terms,
    }
}

/// Query words and the full phrase that each field actually contains.
pub fn highlights(doc: &Document, query: &PreparedQuery) -> Highlights {
    let needles: Vec<&str> = std::iter::once(query.phrase.as_str())
        .filter(|phrase| !phrase.is_empty())
        .chain(
            query
                .words
                .iter()
                .map(String::as_str)
                .filter(|w| *w != query.phrase),
        )
        .collect();

    let found_in = |haystack: &str| -> Vec<String> {
        let haystack = haystack.to_lowercase();
        needles
            .iter()
            .filter(|needle| haystack.contains(**needle))
            .map(|needle| needle.to_string())
            .collect()
    };

    Highlights {
        title: found_in(&doc.title),
        content: found_in(&doc.content),
        tags: found_in(&doc.tags.join("\n")),
    }
}

/// Classify the match: exact phrase first, then by enabled option.
pub fn match_type(
    doc: &Document,
    query: &PreparedQuery,
    options: &SearchOptions,
) -> MatchType {
    let exact = !query.phrase.is_empty()
        && (doc.title.to_lowercase().contains(&query.phrase)
            || doc.content.to_lowercase().contains(&query.phrase));

    if exact {
        MatchType::Exact
    } else if options.semantic {
        MatchType::Semantic
    } else if options.fuzzy {
        MatchType::Fuzzy
    } else {
        MatchType::Contextual
    }
}

/// Human-readable summary of the factors behind a score.
pub fn explain(factors: &[RelevanceFactor], score: f32) -> String {
    if factors.is_empty() {
        return format!("weak match (score {score:.2})");
    }
    let parts: Vec<String> = factors
        .iter()
        .map(|f| format!("{} (+{:.2})", f.factor, f.weight))
        .collect();
    format!("score {score:.2}: {}", parts.join(", "))
}

/// Score candidates in parallel, dropping anything at or below zero.
///
/// Output keeps the input order; sorting happens in [`sort_results`].
pub fn rank(
    candidates: &[&Document],
    query: &PreparedQuery,
    options: &SearchOptions,
) -> Vec<SearchResult> {
    candidates
        .par_iter()
        .filter_map(|doc| {
            let scored = score(doc, query, options);
            if scored.score <= 0.0 {
                return None;
            }

            let mut document = (*doc).clone();
            document.embedding = None;
            if !options.include_content {
                document.content =
                    text_util::extract_snippet(&doc.content, &query.phrase)
                        .map(|(snippet, _)| snippet)
                        .unwrap_or_default();
            }

            Some(SearchResult {
                highlights: highlights(doc, query),
                explanation: explain(&scored.factors, scored.score),
                match_type: match_type(doc, query, options),
                matched_terms: scored.matched_terms,
                relevance_factors: scored.factors,
                score: scored.score,
                document,
            })
        })
        .collect()
}

/// Stable sort by the requested key and direction.
pub fn sort_results(
    results: &mut [SearchResult],
    key: SortKey,
    order: SortOrder,
) {
    results.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Relevance => {
                a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal)
            }
            SortKey::Date => a
                .document
                .metadata
                .modified_at
                .cmp(&b.document.metadata.modified_at),
            SortKey::Title => a
                .document
                .title
                .to_lowercase()
                .cmp(&b.document.title.to_lowercase()),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Slice one page out of the ordered results.
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}
