use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Default number of queries kept in the history window.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default number of failed queries kept.
pub const DEFAULT_FAILURE_LIMIT: usize = 50;

/// Fixed satisfaction figure reported until real feedback exists.
pub const DEFAULT_USER_SATISFACTION: f64 = 4.2;

/// Fixed click-through figure reported until real feedback exists.
pub const DEFAULT_CLICK_THROUGH_RATE: f64 = 0.68;

/// Process-wide search statistics. This is also the persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsState {
    pub total_queries: u64,
    /// Running mean in milliseconds, updated incrementally.
    pub average_response_time: f64,
    /// Most recent queries, oldest first.
    pub query_history: VecDeque<String>,
    /// Most recent queries that found nothing, oldest first.
    pub failed_queries: VecDeque<String>,
    pub user_satisfaction: f64,
    pub click_through_rate: f64,
}

impl Default for AnalyticsState {
    fn default() -> Self {
        Self {
            total_queries: 0,
            average_response_time: 0.0,
            query_history: VecDeque::new(),
            failed_queries: VecDeque::new(),
            user_satisfaction: DEFAULT_USER_SATISFACTION,
            click_through_rate: DEFAULT_CLICK_THROUGH_RATE,
        }
    }
}

/// Accumulates query counts, timings and bounded history.
#[derive(Debug, Clone)]
pub struct AnalyticsTracker {
    state: AnalyticsState,
    history_limit: usize,
    failure_limit: usize,
}

impl Default for AnalyticsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, DEFAULT_FAILURE_LIMIT)
    }
}

impl AnalyticsTracker {
    pub fn new(history_limit: usize, failure_limit: usize) -> Self {
        Self {
            state: AnalyticsState::default(),
            history_limit,
            failure_limit,
        }
    }

    /// Count a query and append it to the history window.
    pub fn record_query(&mut self, text: &str) {
        self.state.total_queries += 1;
        push_bounded(
            &mut self.state.query_history,
            text.to_string(),
            self.history_limit,
        );
    }

    /// Fold a response time into the running mean.
    ///
    /// Uses the post-increment query count as `n`, so call this after
    /// [`AnalyticsTracker::record_query`] for the same search.
    pub fn record_timing(&mut self, millis: f64) {
        let n = self.state.total_queries.max(1) as f64;
        let avg = self.state.average_response_time;
        self.state.average_response_time = (avg * (n - 1.0) + millis) / n;
    }

    pub fn record_failure(&mut self, text: &str) {
        push_bounded(
            &mut self.state.failed_queries,
            text.to_string(),
            self.failure_limit,
        );
    }

    /// How often each query appears in the history window.
    pub fn frequencies(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for query in &self.state.query_history {
            *counts.entry(query.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Most frequent history entries, highest count first. Ties break
    /// alphabetically so the output is stable.
    pub fn trending(&self, limit: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .frequencies()
            .into_iter()
            .map(|(query, count)| (query.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    pub fn history_len(&self) -> usize {
        self.state.query_history.len()
    }

    pub fn total_queries(&self) -> u64 {
        self.state.total_queries
    }

    pub fn snapshot(&self) -> AnalyticsState {
        self.state.clone()
    }

    /// Replace the in-memory state with a persisted one, trimming the
    /// bounded lists to the configured windows.
    pub fn hydrate(&mut self, mut state: AnalyticsState) {
        trim_front(&mut state.query_history, self.history_limit);
        trim_front(&mut state.failed_queries, self.failure_limit);
        self.state = state;
    }

    pub fn reset(&mut self) {
        self.state = AnalyticsState::default();
    }
}

fn push_bounded(list: &mut VecDeque<String>, item: String, limit: usize) {
    list.push_back(item);
    trim_front(list, limit);
}

fn trim_front(list: &mut VecDeque<String>, limit: usize) {
    while list.len() > limit {
        list.pop_front();
    }
}
