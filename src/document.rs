use std::fmt;

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// The closed set of document kinds a note collection can hold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Document,
    Note,
    Template,
    Database,
    Page,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Note => "note",
            Self::Template => "template",
            Self::Database => "database",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive fields carried alongside a document's text.
///
/// Timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub author: String,
    pub created_at: u64,
    pub modified_at: u64,
    pub word_count: usize,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    pub collaborators: Vec<String>,
    pub category: String,
    pub priority: Priority,
}

/// The unit of indexing.
///
/// Every field except `id` is optional when deserializing: sparse and
/// empty documents are indexed as-is rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub metadata: Metadata,
    /// Feature vector computed when the document was last indexed.
    #[serde(skip)]
    pub embedding: Option<Embedding>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Concatenated title, content and tags: the text the inverted index
    /// and the vector model see.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.content.len() + 16 * self.tags.len(),
        );
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.content);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text
    }

    /// Rough heap footprint, used by diagnostics.
    pub fn approximate_size(&self) -> usize {
        let strings = self.id.len()
            + self.title.len()
            + self.content.len()
            + self.tags.iter().map(String::len).sum::<usize>()
            + self.metadata.author.len()
            + self.metadata.category.len()
            + self
                .metadata
                .collaborators
                .iter()
                .map(String::len)
                .sum::<usize>();
        let vector = self
            .embedding
            .as_ref()
            .map_or(0, Embedding::approximate_size);
        std::mem::size_of::<Self>() + strings + vector
    }
}
