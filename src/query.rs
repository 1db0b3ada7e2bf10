use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentType, Priority};

/// Inclusive bounds on a document's modification time (Unix seconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl DateRange {
    pub fn contains(&self, timestamp: u64) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// Structured filters. Dimensions combine with AND; values inside one
/// dimension combine with OR. Empty dimensions do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    #[serde(rename = "type")]
    pub types: Vec<DocumentType>,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub priorities: Vec<Priority>,
    pub date_range: Option<DateRange>,
}

impl Filters {
    /// Whether `doc` satisfies every non-empty filter dimension.
    ///
    /// Tag, author and category comparisons ignore ASCII case.
    pub fn matches(&self, doc: &Document) -> bool {
        let any_eq = |wanted: &[String], value: &str| {
            wanted.is_empty()
                || wanted.iter().any(|w| w.eq_ignore_ascii_case(value))
        };

        (self.types.is_empty() || self.types.contains(&doc.doc_type))
            && (self.tags.is_empty()
                || doc.tags.iter().any(|tag| any_eq(&self.tags, tag)))
            && any_eq(&self.authors, &doc.metadata.author)
            && any_eq(&self.categories, &doc.metadata.category)
            && (self.priorities.is_empty()
                || self.priorities.contains(&doc.metadata.priority))
            && self
                .date_range
                .is_none_or(|range| range.contains(doc.metadata.modified_at))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.tags.is_empty()
            && self.authors.is_empty()
            && self.categories.is_empty()
            && self.priorities.is_empty()
            && self.date_range.is_none()
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Relevance,
    Date,
    Title,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Default page size.
pub const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Expand query tokens to index terms one edit away.
    pub fuzzy: bool,
    /// Add the vector-similarity factor to the score.
    pub semantic: bool,
    /// Match query tokens against author, category and collaborators.
    pub contextual: bool,
    /// Return full content; otherwise results carry a snippet.
    pub include_content: bool,
    pub limit: usize,
    pub offset: usize,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fuzzy: true,
            semantic: true,
            contextual: true,
            include_content: true,
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort_by: SortKey::Relevance,
            sort_order: SortOrder::Desc,
        }
    }
}

/// A free-text query with its filters and options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub text: String,
    pub filters: Filters,
    pub options: SearchOptions,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Whitespace-only queries are treated as empty.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;

    fn doc() -> Document {
        Document {
            id: "1".to_string(),
            title: "Title".to_string(),
            tags: vec!["AI".to_string(), "research".to_string()],
            doc_type: DocumentType::Note,
            metadata: Metadata {
                author: "Ana Silva".to_string(),
                category: "Technology".to_string(),
                priority: Priority::High,
                modified_at: 500,
                ..Metadata::default()
            },
            ..Document::default()
        }
    }

    #[test]
    fn empty_filters_match_everything() {
        assert!(Filters::default().is_empty());
        assert!(Filters::default().matches(&doc()));
    }

    #[test]
    fn or_within_dimension() {
        let filters = Filters {
            types: vec![DocumentType::Page, DocumentType::Note],
            ..Filters::default()
        };
        assert!(filters.matches(&doc()));
    }

    #[test]
    fn and_across_dimensions() {
        let filters = Filters {
            types: vec![DocumentType::Note],
            priorities: vec![Priority::Low],
            ..Filters::default()
        };
        assert!(!filters.matches(&doc()));
    }

    #[test]
    fn tags_and_authors_ignore_case() {
        let filters = Filters {
            tags: vec!["ai".to_string()],
            authors: vec!["ana silva".to_string()],
            categories: vec!["technology".to_string()],
            ..Filters::default()
        };
        assert!(filters.matches(&doc()));
    }

    #[test]
    fn date_range_is_inclusive() {
        let within = Filters {
            date_range: Some(DateRange {
                start: Some(500),
                end: Some(500),
            }),
            ..Filters::default()
        };
        assert!(within.matches(&doc()));

        let after = Filters {
            date_range: Some(DateRange {
                start: Some(501),
                end: None,
            }),
            ..Filters::default()
        };
        assert!(!after.matches(&doc()));
    }

    #[test]
    fn blank_queries() {
        assert!(SearchQuery::new("").is_blank());
        assert!(SearchQuery::new("  \t").is_blank());
        assert!(!SearchQuery::new("x").is_blank());
    }

    #[test]
    fn deserialize_query_with_defaults() {
        let json = r#"{"text": "ml", "filters": {"type": ["note"]},
                       "options": {"limit": 5, "sortBy": "date"}}"#;
        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.filters.types, vec![DocumentType::Note]);
        assert_eq!(query.options.limit, 5);
        assert_eq!(query.options.sort_by, SortKey::Date);
        assert!(query.options.fuzzy);
        assert_eq!(query.options.sort_order, SortOrder::Desc);
    }
}
