use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

/// Identifier attached to every search response.
///
/// Derived from the query text and the engine's query sequence number, so
/// repeating the same text still yields a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryId {
    pub numeric: u64,
    /// Short hex form shown to users (e.g. "a1b2c3d4").
    pub short: String,
}

const SHORT_LEN: usize = 8;

impl QueryId {
    pub fn new(text: &str, sequence: u64) -> Self {
        let numeric = Self::hash_pair(text, sequence);
        Self {
            numeric,
            short: Self::short_hex(numeric, SHORT_LEN),
        }
    }

    fn hash_pair(text: &str, sequence: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        sequence.hash(&mut hasher);
        hasher.finish()
    }

    fn short_hex(value: u64, len: usize) -> String {
        let full = format!("{value:016x}");
        full[..len].to_string()
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q-{}", self.short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(QueryId::new("rust", 1), QueryId::new("rust", 1));
    }

    #[test]
    fn sequence_changes_id() {
        assert_ne!(QueryId::new("rust", 1), QueryId::new("rust", 2));
    }

    #[test]
    fn display_format() {
        let id = QueryId::new("rust", 7).to_string();
        assert!(id.starts_with("q-"));
        assert_eq!(id.len(), 2 + SHORT_LEN);
    }
}
