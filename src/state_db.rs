use std::{path::Path, sync::Mutex};

use redb::{Database, ReadableDatabase, TableDefinition};

use crate::{analytics::AnalyticsState, error::Result};

const ENGINE_STATE: TableDefinition<&str, &str> =
    TableDefinition::new("engine_state");

const ANALYTICS_KEY: &str = "analytics";

/// Where the engine keeps analytics between runs.
///
/// Implementations report failures through `Result`; the engine logs them
/// and carries on with in-memory state.
pub trait StateStore: Send + Sync {
    fn load_state(&self) -> Result<Option<AnalyticsState>>;
    fn save_state(&self, state: &AnalyticsState) -> Result<()>;
}

/// redb-backed store. Analytics are kept as one JSON value.
pub struct StateDb {
    db: Database,
}

impl StateDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        txn.open_table(ENGINE_STATE)?;
        txn.commit()?;

        Ok(Self { db })
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ENGINE_STATE)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ENGINE_STATE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }
}

impl StateStore for StateDb {
    fn load_state(&self) -> Result<Option<AnalyticsState>> {
        self.get(ANALYTICS_KEY)?
            .map(|json| serde_json::from_str::<AnalyticsState>(&json))
            .transpose()
            .map_err(Into::into)
    }

    fn save_state(&self, state: &AnalyticsState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.set(ANALYTICS_KEY, &json)
    }
}

/// In-memory store for tests and `--no-persist` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<AnalyticsState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load_state(&self) -> Result<Option<AnalyticsState>> {
        let guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save_state(&self, state: &AnalyticsState) -> Result<()> {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, StateDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = StateDb::open(&tmp.path().join("state.redb")).unwrap();
        (tmp, db)
    }

    fn sample() -> AnalyticsState {
        AnalyticsState {
            total_queries: 3,
            average_response_time: 12.5,
            query_history: ["rust", "redb", "rust"].map(String::from).into(),
            failed_queries: ["xyz123"].map(String::from).into(),
            ..AnalyticsState::default()
        }
    }

    #[test]
    fn empty_db_has_no_state() {
        let (_tmp, db) = test_db();
        assert!(db.load_state().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let (_tmp, db) = test_db();
        db.save_state(&sample()).unwrap();
        assert_eq!(db.load_state().unwrap(), Some(sample()));
    }

    #[test]
    fn save_overwrites() {
        let (_tmp, db) = test_db();
        db.save_state(&sample()).unwrap();
        db.save_state(&AnalyticsState::default()).unwrap();
        assert_eq!(db.load_state().unwrap(), Some(AnalyticsState::default()));
    }

    #[test]
    fn reopen_preserves_state() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.redb");
        {
            let db = StateDb::open(&path).unwrap();
            db.save_state(&sample()).unwrap();
        }
        let db = StateDb::open(&path).unwrap();
        assert_eq!(db.load_state().unwrap(), Some(sample()));
    }

    #[test]
    fn corrupt_value_is_an_error() {
        let (_tmp, db) = test_db();
        db.set(ANALYTICS_KEY, "{not json").unwrap();
        assert!(db.load_state().is_err());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_state().unwrap().is_none());
        store.save_state(&sample()).unwrap();
        assert_eq!(store.load_state().unwrap(), Some(sample()));
    }
}
