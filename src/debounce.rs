//! Keystroke coalescing for interactive callers.
//!
//! The engine answers every query it is given. A caller typing one
//! character at a time only cares about the last query in a burst, so this
//! module sits in front of the engine: queries go into a channel, and a
//! search runs only once the input has been quiet for `delay`.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::sleep,
};

use crate::{
    engine::{SearchEngine, SearchResponse},
    error::Result,
    query::SearchQuery,
};

/// A query that survived debouncing and the engine's answer to it.
#[derive(Debug)]
pub struct Debounced {
    pub query: SearchQuery,
    pub response: Result<SearchResponse>,
}

/// Sending half handed to the input loop. Dropping it lets the worker
/// finish the pending query and exit.
#[derive(Debug, Clone)]
pub struct Debouncer {
    tx: mpsc::UnboundedSender<SearchQuery>,
}

impl Debouncer {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(
        engine: Arc<SearchEngine>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Debounced>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(engine, delay, rx, out_tx));
        (Self { tx }, out_rx, handle)
    }

    /// Queue a query. Returns false once the worker has stopped.
    pub fn submit(&self, query: SearchQuery) -> bool {
        self.tx.send(query).is_ok()
    }
}

async fn run(
    engine: Arc<SearchEngine>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<SearchQuery>,
    out: mpsc::UnboundedSender<Debounced>,
) {
    while let Some(mut latest) = rx.recv().await {
        let mut superseded = 0usize;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(query) => {
                        latest = query;
                        superseded += 1;
                    }
                    None => break,
                },
                _ = sleep(delay) => break,
            }
        }
        if superseded > 0 {
            tracing::trace!(superseded, "coalesced queries");
        }

        let query = latest.clone();
        let engine = Arc::clone(&engine);
        let response =
            match tokio::task::spawn_blocking(move || engine.search(&query))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("search task failed: {e}");
                    continue;
                }
            };

        if out
            .send(Debounced {
                query: latest,
                response,
            })
            .is_err()
        {
            break;
        }
    }
}
