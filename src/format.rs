//! Terminal and JSON rendering for the command line.

use std::fmt::Write as _;

use serde::Serialize;

use crate::{
    analytics::AnalyticsState,
    engine::{Diagnostics, SearchResponse},
    error::Result,
    ranking::SearchResult,
    suggest::Suggestion,
    text_util,
};

const MARK_OPEN: &str = "**";
const MARK_CLOSE: &str = "**";

/// Pretty-printed JSON for any response type.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn format_human(response: &SearchResponse, offset: usize) -> String {
    let mut out = String::new();
    if response.results.is_empty() {
        out.push_str("No results found.\n");
    }

    for (i, result) in response.results.iter().enumerate() {
        format_result(&mut out, offset + i + 1, result);
    }

    let analytics = &response.analytics;
    if !response.results.is_empty() {
        let _ = writeln!(
            out,
            "\n{} of {} result(s) in {:.2} ms ({})",
            response.results.len(),
            analytics.total_found,
            analytics.search_time,
            analytics.query_id
        );
    }
    if !response.suggestions.is_empty() {
        let _ = writeln!(
            out,
            "Did you mean: {}",
            inline_suggestions(&response.suggestions)
        );
    }
    out
}

fn format_result(out: &mut String, rank: usize, result: &SearchResult) {
    let doc = &result.document;
    let title = text_util::mark_terms(
        &doc.title,
        &result.highlights.title,
        MARK_OPEN,
        MARK_CLOSE,
    );
    let _ = writeln!(
        out,
        "{rank:>3}. [{:.3}] {title}  ({}, {:?})",
        result.score,
        doc.id,
        result.match_type
    );

    let anchor = result
        .highlights
        .content
        .first()
        .map(String::as_str)
        .unwrap_or_default();
    if let Some((snippet, line)) = text_util::extract_snippet(&doc.content, anchor)
    {
        let marked = text_util::mark_terms(
            &snippet,
            &result.highlights.content,
            MARK_OPEN,
            MARK_CLOSE,
        );
        for (i, text) in marked.lines().enumerate() {
            let _ = writeln!(out, "     {:>4}: {text}", line + i);
        }
    }

    if !doc.tags.is_empty() {
        let _ = writeln!(out, "     tags: {}", doc.tags.join(", "));
    }
    let _ = writeln!(out, "     {}", result.explanation);
}

fn inline_suggestions(suggestions: &[Suggestion]) -> String {
    suggestions
        .iter()
        .map(|s| format!("{} ({})", s.text, kind_label(s)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn kind_label(suggestion: &Suggestion) -> String {
    format!("{:?}", suggestion.kind).to_lowercase()
}

pub fn format_suggestions(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return "No suggestions.\n".to_string();
    }
    let mut out = String::new();
    for s in suggestions {
        let _ = writeln!(
            out,
            "{:<11} {:.2}  {}",
            kind_label(s),
            s.score,
            s.text
        );
    }
    out
}

pub fn format_diagnostics(report: &Diagnostics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Documents:           {}", report.documents_count);
    let _ = writeln!(out, "Index terms:         {}", report.index_size);
    let _ = writeln!(
        out,
        "Average search time: {:.2} ms",
        report.average_search_time
    );
    let _ = writeln!(
        out,
        "Memory usage:        {}",
        human_bytes(report.memory_usage)
    );
    if report.recommendations.is_empty() {
        out.push_str("\nNo recommendations.\n");
    } else {
        out.push_str("\nRecommendations:\n");
        for rec in &report.recommendations {
            let _ = writeln!(out, "  - {rec}");
        }
    }
    out
}

pub fn format_analytics(
    state: &AnalyticsState,
    trending: &[(String, usize)],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total queries:         {}", state.total_queries);
    let _ = writeln!(
        out,
        "Average response time: {:.2} ms",
        state.average_response_time
    );
    let _ = writeln!(out, "History window:        {}", state.query_history.len());
    let _ = writeln!(out, "Failed queries:        {}", state.failed_queries.len());
    let _ = writeln!(out, "User satisfaction:     {:.1}", state.user_satisfaction);
    let _ = writeln!(
        out,
        "Click-through rate:    {:.0}%",
        state.click_through_rate * 100.0
    );

    if !trending.is_empty() {
        out.push_str("\nTrending:\n");
        for (query, count) in trending {
            let _ = writeln!(out, "  {count:>4}  {query}");
        }
    }
    if !state.failed_queries.is_empty() {
        out.push_str("\nRecent failures:\n");
        for query in state.failed_queries.iter().rev().take(5) {
            let _ = writeln!(out, "  {query}");
        }
    }
    out
}

fn human_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::Document,
        engine::SearchEngine,
        query::SearchQuery,
        suggest::SuggestionKind,
    };

    fn response(query: &str) -> SearchResponse {
        let engine = SearchEngine::default();
        engine.initialize(vec![Document {
            tags: vec!["ml".to_string()],
            ..Document::new(
                "intro",
                "Machine Learning Basics",
                "Supervised learning uses labels.",
            )
        }]);
        engine.search(&SearchQuery::new(query)).unwrap()
    }

    #[test]
    fn human_output_marks_matches() {
        let out = format_human(&response("learning"), 0);
        assert!(out.contains("  1. ["));
        assert!(out.contains("Machine **Learning** Basics"));
        assert!(out.contains("Supervised **learning** uses labels."));
        assert!(out.contains("tags: ml"));
        assert!(out.contains("1 of 1 result(s)"));
    }

    #[test]
    fn human_output_marks_titles_with_width_changing_case() {
        let engine = SearchEngine::default();
        engine.initialize(vec![Document::new("1", "ẞȺbc notes", "body")]);
        let response = engine.search(&SearchQuery::new("ⱥbc")).unwrap();
        assert_eq!(response.results.len(), 1);

        let out = format_human(&response, 0);
        assert!(out.contains("ẞ**Ⱥbc** notes"), "{out}");
    }

    #[test]
    fn human_output_without_results() {
        let out = format_human(&response("zzzzzz"), 0);
        assert!(out.starts_with("No results found."));
    }

    #[test]
    fn rank_continues_after_offset() {
        let out = format_human(&response("learning"), 10);
        assert!(out.contains(" 11. ["));
    }

    #[test]
    fn json_uses_camel_case() {
        let json = to_json(&response("learning")).unwrap();
        assert!(json.contains("\"totalFound\": 1"));
        assert!(json.contains("\"matchType\": \"exact\""));
        assert!(json.contains("\"queryId\""));
    }

    #[test]
    fn suggestions_table() {
        let out = format_suggestions(&[Suggestion {
            text: "machine learning".to_string(),
            kind: SuggestionKind::Completion,
            score: 0.8,
        }]);
        assert_eq!(out, "completion  0.80  machine learning\n");
        assert_eq!(format_suggestions(&[]), "No suggestions.\n");
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn analytics_lists_trending() {
        let state = AnalyticsState {
            total_queries: 2,
            ..AnalyticsState::default()
        };
        let out = format_analytics(&state, &[("rust".to_string(), 2)]);
        assert!(out.contains("Total queries:         2"));
        assert!(out.contains("     2  rust"));
        assert!(out.contains("Click-through rate:    68%"));
    }
}
