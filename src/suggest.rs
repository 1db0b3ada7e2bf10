use serde::{Deserialize, Serialize};

use crate::{
    analytics::AnalyticsTracker,
    fuzzy,
    inverted_index::InvertedIndex,
    ranking::SearchResult,
    tokenizer,
};

/// Default number of suggestions returned.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Partial input shorter than this gets no completions.
const MIN_COMPLETION_CHARS: usize = 2;

const COMPLETION_SCORE: f32 = 0.8;
const CORRECTION_SCORE: f32 = 0.9;
const RELATED_SCORE: f32 = 0.6;

/// Known phrases offered as completions.
pub const COMPLETION_PHRASES: &[&str] = &[
    "machine learning",
    "meeting notes",
    "project planning",
    "business strategy",
    "creative writing",
    "research notes",
    "product roadmap",
    "weekly review",
    "technical documentation",
    "personal journal",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Completion,
    Correction,
    Related,
    Trending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub score: f32,
}

/// Inputs the generator draws from. `index` and `results` are optional so
/// type-ahead can run with history alone.
pub struct SuggestionSources<'a> {
    pub analytics: &'a AnalyticsTracker,
    /// Stemmed terms, used to tell known words from typos.
    pub index: Option<&'a InvertedIndex>,
    /// Unstemmed words as written in the documents. Corrections prefer
    /// these so they read like real words.
    pub vocabulary: Option<&'a InvertedIndex>,
    pub results: &'a [SearchResult],
}

/// Produce ranked suggestions for `partial`.
///
/// Trending entries are scored by their share of the history window;
/// completions, corrections and related tags use fixed scores. Output is
/// sorted by score, de-duplicated by text and truncated to `limit`.
pub fn suggest(
    partial: &str,
    sources: &SuggestionSources<'_>,
    limit: usize,
) -> Vec<Suggestion> {
    let needle = partial.trim().to_lowercase();
    let mut out = trending(&needle, sources.analytics);
    out.extend(completions(&needle));
    if let Some(index) = sources.index {
        out.extend(correction(&needle, index, sources.vocabulary));
    }
    out.extend(related(&needle, sources.results));

    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen = std::collections::HashSet::new();
    out.retain(|s| seen.insert(s.text.to_lowercase()));
    out.truncate(limit);
    out
}

fn trending(needle: &str, analytics: &AnalyticsTracker) -> Vec<Suggestion> {
    let total = analytics.history_len();
    if total == 0 {
        return Vec::new();
    }

    let mut found: Vec<Suggestion> = analytics
        .frequencies()
        .into_iter()
        .filter(|(query, _)| {
            let lower = query.to_lowercase();
            lower != needle && (needle.is_empty() || lower.contains(needle))
        })
        .map(|(query, count)| Suggestion {
            text: query.to_string(),
            kind: SuggestionKind::Trending,
            score: count as f32 / total as f32,
        })
        .collect();
    // Frequencies come from a HashMap; fix the order before the stable sort.
    found.sort_by(|a, b| a.text.cmp(&b.text));
    found
}

fn completions(needle: &str) -> Vec<Suggestion> {
    if needle.chars().count() < MIN_COMPLETION_CHARS {
        return Vec::new();
    }

    COMPLETION_PHRASES
        .iter()
        .filter(|phrase| phrase.contains(needle) && **phrase != needle)
        .map(|phrase| Suggestion {
            text: phrase.to_string(),
            kind: SuggestionKind::Completion,
            score: COMPLETION_SCORE,
        })
        .collect()
}

/// Replace unknown words with the closest known word, if any is one edit
/// away. Punctuation is dropped; short and stop words pass through.
fn correction(
    needle: &str,
    index: &InvertedIndex,
    vocabulary: Option<&InvertedIndex>,
) -> Option<Suggestion> {
    let mut changed = false;
    let corrected: Vec<String> = tokenizer::split_words(needle)
        .into_iter()
        .map(|word| {
            if word.chars().count() < fuzzy::MIN_FUZZY_CHARS
                || tokenizer::is_stop_word(&word)
                || index.lookup(&tokenizer::stem(&word)).is_some()
            {
                return word;
            }
            match closest_word(&word, index, vocabulary) {
                Some(replacement) => {
                    changed = true;
                    replacement
                }
                None => word,
            }
        })
        .collect();

    changed.then(|| Suggestion {
        text: corrected.join(" "),
        kind: SuggestionKind::Correction,
        score: CORRECTION_SCORE,
    })
}

/// A written-out neighbor from `vocabulary` when there is one, otherwise
/// the nearest stemmed index term.
fn closest_word(
    word: &str,
    index: &InvertedIndex,
    vocabulary: Option<&InvertedIndex>,
) -> Option<String> {
    if let Some(vocabulary) = vocabulary
        && let Some(surface) = fuzzy::neighbors(word, vocabulary).first()
    {
        return Some(surface.to_string());
    }
    fuzzy::neighbors(word, index)
        .first()
        .map(|term| term.to_string())
}

fn related(needle: &str, results: &[SearchResult]) -> Vec<Suggestion> {
    results
        .iter()
        .take(3)
        .flat_map(|r| r.document.tags.iter())
        .filter(|tag| {
            let tag = tag.to_lowercase();
            !tag.is_empty() && !needle.contains(&tag)
        })
        .map(|tag| Suggestion {
            text: tag.clone(),
            kind: SuggestionKind::Related,
            score: RELATED_SCORE,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::Document,
        ranking::{Highlights, MatchType},
    };

    fn tracker(queries: &[&str]) -> AnalyticsTracker {
        let mut tracker = AnalyticsTracker::default();
        for q in queries {
            tracker.record_query(q);
        }
        tracker
    }

    fn sources<'a>(analytics: &'a AnalyticsTracker) -> SuggestionSources<'a> {
        SuggestionSources {
            analytics,
            index: None,
            vocabulary: None,
            results: &[],
        }
    }

    #[test]
    fn trending_filters_by_partial_and_excludes_current() {
        let analytics =
            tracker(&["rust async", "rust async", "rust", "python"]);
        let out = suggest("rust", &sources(&analytics), 5);

        assert_eq!(out[0].text, "rust async");
        assert_eq!(out[0].kind, SuggestionKind::Trending);
        assert!((out[0].score - 0.5).abs() < 1e-6);
        assert!(out.iter().all(|s| s.text != "rust"));
        assert!(out.iter().all(|s| s.text != "python"));
    }

    #[test]
    fn empty_partial_returns_all_trending() {
        let analytics = tracker(&["alpha", "beta"]);
        let out = suggest("", &sources(&analytics), 5);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.kind == SuggestionKind::Trending));
    }

    #[test]
    fn completions_need_two_characters() {
        let analytics = tracker(&[]);
        assert!(suggest("m", &sources(&analytics), 5).is_empty());

        let out = suggest("mach", &sources(&analytics), 5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "machine learning");
        assert_eq!(out[0].kind, SuggestionKind::Completion);
    }

    #[test]
    fn output_is_truncated() {
        let analytics = tracker(&[]);
        // "meeting notes" and "research notes" both complete "no".
        let out = suggest("no", &sources(&analytics), 1);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn correction_falls_back_to_index_terms() {
        let analytics = tracker(&[]);
        let mut index = InvertedIndex::new();
        index.insert(&["strategy", "business"], "a");

        let out = suggest("busines stratgy", &SuggestionSources {
            analytics: &analytics,
            index: Some(&index),
            vocabulary: None,
            results: &[],
        }, 5);
        let correction = out
            .iter()
            .find(|s| s.kind == SuggestionKind::Correction)
            .unwrap();
        assert_eq!(correction.text, "business strategy");
    }

    #[test]
    fn correction_prefers_written_words_and_ignores_punctuation() {
        let analytics = tracker(&[]);
        let text = "Business strategy for creating markets";
        let mut index = InvertedIndex::new();
        index.insert(&tokenizer::tokenize(text), "a");
        let mut vocabulary = InvertedIndex::new();
        vocabulary.insert(&tokenizer::words(text), "a");

        let out = suggest("busines, the stratgy! creatin", &SuggestionSources {
            analytics: &analytics,
            index: Some(&index),
            vocabulary: Some(&vocabulary),
            results: &[],
        }, 5);
        let correction = out
            .iter()
            .find(|s| s.kind == SuggestionKind::Correction)
            .unwrap();
        // Stems such as "busi" or "creat" never leak into the suggestion.
        assert_eq!(correction.text, "business the strategy creating");
    }

    #[test]
    fn related_tags_come_from_top_results() {
        let analytics = tracker(&[]);
        let result = SearchResult {
            document: Document {
                tags: vec!["ai".to_string(), "research".to_string()],
                ..Document::default()
            },
            score: 1.0,
            highlights: Highlights::default(),
            explanation: String::new(),
            match_type: MatchType::Exact,
            matched_terms: vec![],
            relevance_factors: vec![],
        };
        let results = [result];
        let out = suggest("research", &SuggestionSources {
            analytics: &analytics,
            index: None,
            vocabulary: None,
            results: &results,
        }, 5);

        assert!(out.iter().any(|s| s.text == "ai"
            && s.kind == SuggestionKind::Related));
        assert!(out.iter().all(|s| s.text != "research"));
    }
}
