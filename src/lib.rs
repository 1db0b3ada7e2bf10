//! notesearch - an in-memory search and ranking engine for note collections.
//!
//! Documents are tokenized into an inverted index and a TF-IDF feature
//! vector. Queries combine exact phrase, per-field token overlap, priority
//! and vector similarity into one score, with structured filters, sorting,
//! pagination, suggestions and running analytics on top.
//!
//! # Quick start
//!
//! ```
//! use notesearch::{Document, SearchEngine, SearchQuery};
//!
//! let engine = SearchEngine::default();
//! engine.initialize(vec![
//!     Document::new("1", "Introduction to Machine Learning", "Models learn."),
//!     Document::new("2", "Business Strategy Guide", "Markets."),
//! ]);
//!
//! let response = engine.search(&SearchQuery::new("machine learning")).unwrap();
//! assert_eq!(response.results[0].document.id, "1");
//! ```

pub mod analytics;
pub mod data_dir;
pub mod debounce;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod format;
pub mod fuzzy;
pub mod ingestion;
pub mod inverted_index;
pub mod query;
pub mod query_id;
pub mod ranking;
pub mod state_db;
pub mod suggest;
pub mod text_util;
pub mod tokenizer;
pub mod walker;

pub use analytics::{AnalyticsState, AnalyticsTracker};
pub use data_dir::DataDir;
pub use document::{Document, DocumentType, Metadata, Priority};
pub use engine::{
    Diagnostics,
    EngineConfig,
    SearchAnalytics,
    SearchEngine,
    SearchResponse,
};
pub use error::{Error, Result};
pub use query::{
    DateRange,
    Filters,
    SearchOptions,
    SearchQuery,
    SortKey,
    SortOrder,
};
pub use ranking::{MatchType, SearchResult};
pub use state_db::{MemoryStore, StateDb, StateStore};
pub use suggest::{Suggestion, SuggestionKind};
