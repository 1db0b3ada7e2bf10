//! The search facade: owns the index, runs queries and keeps analytics.
//!
//! Lifecycle is `new` → `initialize` → any mix of `index_document`,
//! `remove_document` and `search`. Index state sits behind a read-mostly
//! lock so concurrent searches never block each other; analytics sit behind
//! their own mutex. Nothing here spawns threads or timers.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        RwLock,
        RwLockReadGuard,
        RwLockWriteGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Instant,
};

use serde::{Deserialize, Serialize};

use crate::{
    analytics::{
        AnalyticsState,
        AnalyticsTracker,
        DEFAULT_FAILURE_LIMIT,
        DEFAULT_HISTORY_LIMIT,
    },
    document::Document,
    embedding::{self, DEFAULT_DIMENSION},
    error::{Error, Result},
    fuzzy,
    inverted_index::InvertedIndex,
    query::{SearchOptions, SearchQuery},
    query_id::QueryId,
    ranking::{self, PreparedQuery, SearchResult},
    state_db::StateStore,
    suggest::{self, DEFAULT_SUGGESTION_LIMIT, Suggestion, SuggestionSources},
    tokenizer,
};

/// Index terms above which diagnostics suggest optimization.
pub const DEFAULT_LARGE_INDEX_TERMS: usize = 10_000;

/// Average search time (ms) above which diagnostics flag slowness.
pub const DEFAULT_SLOW_SEARCH_MS: f64 = 100.0;

/// Successful queries between analytics flushes.
pub const DEFAULT_FLUSH_INTERVAL: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub dimension: usize,
    pub history_limit: usize,
    pub failure_limit: usize,
    pub suggestion_limit: usize,
    /// Flush analytics every this many queries. Zero disables periodic
    /// flushing; [`SearchEngine::flush`] still works.
    pub flush_interval: u64,
    pub large_index_terms: usize,
    pub slow_search_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            history_limit: DEFAULT_HISTORY_LIMIT,
            failure_limit: DEFAULT_FAILURE_LIMIT,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            large_index_terms: DEFAULT_LARGE_INDEX_TERMS,
            slow_search_ms: DEFAULT_SLOW_SEARCH_MS,
        }
    }
}

/// Per-search figures returned alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalytics {
    /// Results before pagination.
    pub total_found: usize,
    /// Milliseconds spent in `search`.
    pub search_time: f64,
    pub query_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub suggestions: Vec<Suggestion>,
    pub analytics: SearchAnalytics,
}

/// Point-in-time health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Distinct terms in the inverted index.
    pub index_size: usize,
    pub documents_count: usize,
    pub average_search_time: f64,
    /// Approximate bytes held by documents, vectors and postings.
    pub memory_usage: usize,
    pub recommendations: Vec<String>,
}

#[derive(Default)]
struct IndexState {
    documents: HashMap<String, Document>,
    index: InvertedIndex,
    /// Same documents keyed by unstemmed words, for readable corrections.
    vocabulary: InvertedIndex,
}

impl IndexState {
    /// Insert or replace `doc`. Old postings go first so removed terms
    /// stop matching.
    fn insert(&mut self, mut doc: Document, dimension: usize) {
        self.index.remove(&doc.id);
        self.vocabulary.remove(&doc.id);
        let words = tokenizer::words(&doc.searchable_text());
        let tokens: Vec<String> =
            words.iter().map(|word| tokenizer::stem(word)).collect();
        self.index.insert(&tokens, &doc.id);
        self.vocabulary.insert(&words, &doc.id);
        doc.embedding = Some(embedding::embed(&tokens, &self.index, dimension));
        self.documents.insert(doc.id.clone(), doc);
    }

    fn remove(&mut self, id: &str) -> bool {
        let had_postings = self.index.remove(id);
        self.vocabulary.remove(id);
        self.documents.remove(id).is_some() || had_postings
    }

    /// Ids reachable from the query, in sorted order for stable ties.
    ///
    /// Term postings, fuzzy neighbours of each term when enabled, and any
    /// document whose title, content or tags contain the raw phrase.
    fn candidates(
        &self,
        query: &PreparedQuery,
        options: &SearchOptions,
    ) -> BTreeSet<&str> {
        let mut ids = BTreeSet::new();
        let mut add_postings = |term: &str| {
            if let Some(postings) = self.index.lookup(term) {
                ids.extend(postings.iter().map(String::as_str));
            }
        };

        for term in &query.terms {
            add_postings(term);
            if options.fuzzy {
                for neighbor in fuzzy::neighbors(term, &self.index) {
                    add_postings(neighbor);
                }
            }
        }

        if !query.phrase.is_empty() {
            for (id, doc) in &self.documents {
                if contains_phrase(doc, &query.phrase) {
                    ids.insert(id.as_str());
                }
            }
        }
        ids
    }

    fn approximate_size(&self) -> usize {
        self.documents
            .values()
            .map(Document::approximate_size)
            .sum::<usize>()
            + self.index.approximate_size()
            + self.vocabulary.approximate_size()
    }
}

fn contains_phrase(doc: &Document, phrase: &str) -> bool {
    doc.title.to_lowercase().contains(phrase)
        || doc.content.to_lowercase().contains(phrase)
        || doc.tags.iter().any(|t| t.to_lowercase().contains(phrase))
}

pub struct SearchEngine {
    config: EngineConfig,
    state: RwLock<IndexState>,
    analytics: Mutex<AnalyticsTracker>,
    store: Option<Arc<dyn StateStore>>,
    /// Held across snapshot and save so writes reach the store in order.
    persist_lock: Mutex<()>,
    initialized: AtomicBool,
    sequence: AtomicU64,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SearchEngine {
    /// An engine with no persistence; analytics live only in memory.
    pub fn new(config: EngineConfig) -> Self {
        let tracker =
            AnalyticsTracker::new(config.history_limit, config.failure_limit);
        Self {
            config,
            state: RwLock::new(IndexState::default()),
            analytics: Mutex::new(tracker),
            store: None,
            persist_lock: Mutex::new(()),
            initialized: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Reset all in-memory state, index `documents` in order, then hydrate
    /// analytics from the store if one is attached.
    ///
    /// Each document is vectorized against the corpus as it stands when
    /// that document is inserted.
    pub fn initialize<I>(&self, documents: I)
    where
        I: IntoIterator<Item = Document>,
    {
        let count = {
            let mut state = self.write_state();
            *state = IndexState::default();
            for doc in documents {
                state.insert(doc, self.config.dimension);
            }
            state.documents.len()
        };

        let persisted = self.load_persisted();
        {
            let mut analytics = self.lock_analytics();
            analytics.reset();
            if let Some(saved) = persisted {
                analytics.hydrate(saved);
            }
        }

        self.initialized.store(true, Ordering::Release);
        tracing::info!(documents = count, "search engine initialized");
    }

    /// Insert or replace one document.
    pub fn index_document(&self, doc: Document) -> Result<()> {
        self.ensure_initialized()?;
        tracing::debug!(id = %doc.id, "indexing document");
        self.write_state().insert(doc, self.config.dimension);
        Ok(())
    }

    /// Drop a document and all its postings. Returns whether it existed.
    pub fn remove_document(&self, id: &str) -> Result<bool> {
        self.ensure_initialized()?;
        let removed = self.write_state().remove(id);
        tracing::debug!(id, removed, "removing document");
        Ok(removed)
    }

    pub fn document(&self, id: &str) -> Option<Document> {
        self.read_state().documents.get(id).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.read_state().documents.len()
    }

    /// Run one query end to end.
    ///
    /// Blank text returns an empty response without touching the index or
    /// analytics. The only error is [`Error::NotInitialized`].
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.ensure_initialized()?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let query_id = QueryId::new(&query.text, sequence).to_string();

        if query.is_blank() {
            return Ok(SearchResponse {
                results: Vec::new(),
                suggestions: Vec::new(),
                analytics: SearchAnalytics {
                    total_found: 0,
                    search_time: 0.0,
                    query_id,
                },
            });
        }

        let started = Instant::now();
        let prepared = PreparedQuery::new(&query.text, self.config.dimension);
        let options = &query.options;

        let (results, total_found, suggestions) = {
            let state = self.read_state();
            let candidates: Vec<&Document> = state
                .candidates(&prepared, options)
                .into_iter()
                .filter_map(|id| state.documents.get(id))
                .filter(|doc| query.filters.matches(doc))
                .collect();

            let mut ranked = ranking::rank(&candidates, &prepared, options);
            ranking::sort_results(
                &mut ranked,
                options.sort_by,
                options.sort_order,
            );
            let total_found = ranked.len();
            let page = ranking::paginate(ranked, options.offset, options.limit);

            let suggestions = {
                let analytics = self.lock_analytics();
                suggest::suggest(
                    &query.text,
                    &SuggestionSources {
                        analytics: &analytics,
                        index: Some(&state.index),
                        vocabulary: Some(&state.vocabulary),
                        results: &page,
                    },
                    self.config.suggestion_limit,
                )
            };
            (page, total_found, suggestions)
        };

        let search_time = started.elapsed().as_secs_f64() * 1000.0;
        self.record(&query.text, search_time, total_found == 0);

        tracing::debug!(
            query = %query.text,
            %query_id,
            total_found,
            returned = results.len(),
            search_time_ms = search_time,
            "search complete"
        );

        Ok(SearchResponse {
            results,
            suggestions,
            analytics: SearchAnalytics {
                total_found,
                search_time,
                query_id,
            },
        })
    }

    /// Type-ahead suggestions without running a search.
    pub fn suggest(&self, partial: &str) -> Result<Vec<Suggestion>> {
        self.ensure_initialized()?;
        let state = self.read_state();
        let analytics = self.lock_analytics();
        Ok(suggest::suggest(
            partial,
            &SuggestionSources {
                analytics: &analytics,
                index: Some(&state.index),
                vocabulary: Some(&state.vocabulary),
                results: &[],
            },
            self.config.suggestion_limit,
        ))
    }

    pub fn analytics(&self) -> AnalyticsState {
        self.lock_analytics().snapshot()
    }

    /// Most frequent recent queries.
    pub fn trending(&self, limit: usize) -> Vec<(String, usize)> {
        self.lock_analytics().trending(limit)
    }

    /// Write analytics to the store now. Failures are logged, not returned.
    pub fn flush(&self) {
        self.persist();
    }

    pub fn run_diagnostics(&self) -> Diagnostics {
        let (index_size, documents_count, memory_usage) = {
            let state = self.read_state();
            (
                state.index.term_count(),
                state.documents.len(),
                state.approximate_size(),
            )
        };
        let average_search_time =
            self.lock_analytics().snapshot().average_response_time;

        let mut recommendations = Vec::new();
        if index_size > self.config.large_index_terms {
            recommendations.push(format!(
                "index is large ({index_size} terms), consider optimization"
            ));
        }
        if average_search_time > self.config.slow_search_ms {
            recommendations.push(format!(
                "average search time is {average_search_time:.1} ms, \
                 consider narrower queries or filters"
            ));
        }
        if documents_count == 0 {
            recommendations
                .push("no documents indexed, add some notes first".into());
        }

        Diagnostics {
            index_size,
            documents_count,
            average_search_time,
            memory_usage,
            recommendations,
        }
    }

    fn record(&self, text: &str, millis: f64, failed: bool) {
        let due = {
            let mut analytics = self.lock_analytics();
            analytics.record_query(text);
            analytics.record_timing(millis);
            if failed {
                analytics.record_failure(text);
            }
            self.config.flush_interval > 0
                && analytics.total_queries() % self.config.flush_interval == 0
        };

        if due {
            self.persist();
        }
    }

    /// Lock order is `persist_lock` then analytics, so a later snapshot
    /// can never be overwritten by an earlier one.
    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let _persisting =
            self.persist_lock.lock().unwrap_or_else(|e| e.into_inner());
        let snapshot = self.lock_analytics().snapshot();
        match store.save_state(&snapshot) {
            Ok(()) => tracing::debug!(
                total_queries = snapshot.total_queries,
                "analytics flushed"
            ),
            Err(e) => tracing::warn!("failed to save analytics: {e}"),
        }
    }

    fn load_persisted(&self) -> Option<AnalyticsState> {
        let store = self.store.as_ref()?;
        match store.load_state() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("failed to load analytics: {e}");
                None
            }
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_analytics(&self) -> MutexGuard<'_, AnalyticsTracker> {
        self.analytics.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::{DocumentType, Metadata, Priority},
        query::{Filters, SortKey, SortOrder},
        state_db::MemoryStore,
    };

    struct FailingStore;

    /// Remembers the query count of every save, in arrival order.
    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<u64>>,
    }

    impl StateStore for RecordingStore {
        fn load_state(&self) -> Result<Option<AnalyticsState>> {
            Ok(None)
        }

        fn save_state(&self, state: &AnalyticsState) -> Result<()> {
            self.saved.lock().unwrap().push(state.total_queries);
            Ok(())
        }
    }

    impl StateStore for FailingStore {
        fn load_state(&self) -> Result<Option<AnalyticsState>> {
            Err(Error::Config("load failed".into()))
        }

        fn save_state(&self, _: &AnalyticsState) -> Result<()> {
            Err(Error::Config("save failed".into()))
        }
    }

    fn doc(id: &str, title: &str, content: &str) -> Document {
        Document::new(id, title, content)
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document {
                tags: vec!["ai".into(), "ml".into()],
                metadata: Metadata {
                    author: "Ana".into(),
                    priority: Priority::High,
                    modified_at: 300,
                    ..Metadata::default()
                },
                ..doc(
                    "1",
                    "Introduction to Machine Learning",
                    "Neural networks and gradient descent.",
                )
            },
            Document {
                tags: vec!["business".into()],
                metadata: Metadata {
                    author: "Bruno".into(),
                    modified_at: 100,
                    ..Metadata::default()
                },
                ..doc("2", "Business Strategy Guide", "Markets and pricing.")
            },
            Document {
                tags: vec!["writing".into()],
                doc_type: DocumentType::Note,
                metadata: Metadata {
                    author: "Carla".into(),
                    modified_at: 200,
                    ..Metadata::default()
                },
                ..doc("3", "Creative Writing Tips", "Show, don't tell.")
            },
        ]
    }

    fn engine() -> SearchEngine {
        let engine = SearchEngine::default();
        engine.initialize(corpus());
        engine
    }

    #[test]
    fn search_before_initialize_fails() {
        let engine = SearchEngine::default();
        assert!(matches!(
            engine.search(&SearchQuery::new("x")),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            engine.index_document(doc("1", "a", "b")),
            Err(Error::NotInitialized)
        ));
    }

    #[test]
    fn not_initialized_wins_over_empty_query() {
        let engine = SearchEngine::default();
        assert!(engine.search(&SearchQuery::new("")).is_err());
    }

    #[test]
    fn blank_query_is_empty_and_unrecorded() {
        let engine = engine();
        let response = engine.search(&SearchQuery::new("   ")).unwrap();
        assert!(response.results.is_empty());
        assert!(response.suggestions.is_empty());
        assert_eq!(engine.analytics().total_queries, 0);
    }

    #[test]
    fn title_match_ranks_first() {
        let engine = engine();
        let response =
            engine.search(&SearchQuery::new("machine learning")).unwrap();
        assert_eq!(response.results[0].document.id, "1");
        assert!(response.results[0].score > 0.0);
        assert_eq!(response.analytics.total_found, response.results.len());
    }

    #[test]
    fn reindex_replaces_terms() {
        let engine = engine();
        engine
            .index_document(doc("2", "Quarterly Budget", "Spreadsheets."))
            .unwrap();

        let old = engine.search(&SearchQuery::new("strategy")).unwrap();
        assert!(old.results.iter().all(|r| r.document.id != "2"));
        let new = engine.search(&SearchQuery::new("budget")).unwrap();
        assert_eq!(new.results[0].document.id, "2");
        assert_eq!(engine.document_count(), 3);
    }

    #[test]
    fn removed_document_never_returned() {
        let engine = engine();
        assert!(engine.remove_document("1").unwrap());
        assert!(!engine.remove_document("1").unwrap());

        let response =
            engine.search(&SearchQuery::new("machine learning")).unwrap();
        assert!(response.results.iter().all(|r| r.document.id != "1"));
        assert!(engine.document("1").is_none());
    }

    #[test]
    fn fuzzy_expansion_finds_typos() {
        let engine = engine();
        let response = engine.search(&SearchQuery::new("markts")).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].document.id, "2");

        let strict = SearchQuery::new("markts").with_options(SearchOptions {
            fuzzy: false,
            ..SearchOptions::default()
        });
        assert!(engine.search(&strict).unwrap().results.is_empty());
    }

    #[test]
    fn filters_and_sorting() {
        let engine = engine();
        let query = SearchQuery::new("guide tips learning")
            .with_filters(Filters {
                types: vec![DocumentType::Document],
                ..Filters::default()
            })
            .with_options(SearchOptions {
                sort_by: SortKey::Date,
                sort_order: SortOrder::Asc,
                ..SearchOptions::default()
            });
        let ids: Vec<String> = engine
            .search(&query)
            .unwrap()
            .results
            .into_iter()
            .map(|r| r.document.id)
            .collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn failed_queries_are_recorded() {
        let engine = engine();
        engine.search(&SearchQuery::new("zzzqqq")).unwrap();
        let state = engine.analytics();
        assert_eq!(state.total_queries, 1);
        assert_eq!(state.failed_queries, ["zzzqqq"]);
    }

    #[test]
    fn query_ids_differ_per_call() {
        let engine = engine();
        let a = engine.search(&SearchQuery::new("guide")).unwrap();
        let b = engine.search(&SearchQuery::new("guide")).unwrap();
        assert_ne!(a.analytics.query_id, b.analytics.query_id);
    }

    #[test]
    fn flushes_every_interval_and_hydrates() {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig {
            flush_interval: 2,
            ..EngineConfig::default()
        };
        let engine = SearchEngine::new(config.clone()).with_store(store.clone());
        engine.initialize(corpus());

        engine.search(&SearchQuery::new("guide")).unwrap();
        assert!(store.load_state().unwrap().is_none());
        engine.search(&SearchQuery::new("tips")).unwrap();
        assert_eq!(store.load_state().unwrap().unwrap().total_queries, 2);

        let restarted = SearchEngine::new(config).with_store(store);
        restarted.initialize(corpus());
        assert_eq!(restarted.analytics().total_queries, 2);
        assert_eq!(restarted.trending(1)[0].1, 1);
    }

    #[test]
    fn store_failures_do_not_break_search() {
        let config = EngineConfig {
            flush_interval: 1,
            ..EngineConfig::default()
        };
        let engine =
            SearchEngine::new(config).with_store(Arc::new(FailingStore));
        engine.initialize(corpus());

        assert!(engine.search(&SearchQuery::new("guide")).is_ok());
        engine.flush();
        assert_eq!(engine.analytics().total_queries, 1);
    }

    #[test]
    fn concurrent_flushes_never_save_an_older_snapshot() {
        let store = Arc::new(RecordingStore::default());
        let config = EngineConfig {
            flush_interval: 1,
            ..EngineConfig::default()
        };
        let engine =
            Arc::new(SearchEngine::new(config).with_store(store.clone()));
        engine.initialize(corpus());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        engine.search(&SearchQuery::new("guide")).unwrap();
                        engine.flush();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 200);
        assert!(saved.windows(2).all(|w| w[0] <= w[1]), "{saved:?}");
        assert_eq!(saved.last(), Some(&100));
    }

    #[test]
    fn suggest_offers_trending_queries() {
        let engine = engine();
        engine.search(&SearchQuery::new("creative writing")).unwrap();
        let suggestions = engine.suggest("creat").unwrap();
        assert!(suggestions.iter().any(|s| s.text == "creative writing"));
    }

    #[test]
    fn diagnostics_report_counts() {
        let engine = SearchEngine::new(EngineConfig {
            large_index_terms: 1,
            ..EngineConfig::default()
        });
        engine.initialize(corpus());

        let report = engine.run_diagnostics();
        assert_eq!(report.documents_count, 3);
        assert!(report.index_size > 1);
        assert!(report.memory_usage > 0);
        assert!(report.recommendations[0].contains("index is large"));
    }

    #[test]
    fn initialize_resets_previous_corpus() {
        let engine = engine();
        engine.initialize(vec![doc("9", "Solo", "Only one.")]);
        assert_eq!(engine.document_count(), 1);
        assert!(engine.document("1").is_none());
    }
}
