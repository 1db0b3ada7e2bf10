use std::collections::{BTreeSet, HashMap, HashSet};

/// Maps normalized terms to the set of document ids containing them.
///
/// Only membership is stored. A reverse map from document id to its terms
/// keeps [`InvertedIndex::remove`] proportional to the document's own
/// vocabulary instead of the whole index.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    postings: HashMap<String, BTreeSet<String>>,
    doc_terms: HashMap<String, HashSet<String>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `doc_id` to the posting set of every distinct term.
    ///
    /// Inserting the same id for a term twice is a no-op.
    pub fn insert<S: AsRef<str>>(&mut self, terms: &[S], doc_id: &str) {
        let known = self.doc_terms.entry(doc_id.to_string()).or_default();
        for term in terms {
            let term = term.as_ref();
            if known.insert(term.to_string()) {
                self.postings
                    .entry(term.to_string())
                    .or_default()
                    .insert(doc_id.to_string());
            }
        }
    }

    /// Drop every posting for `doc_id`. Returns whether the id was indexed.
    pub fn remove(&mut self, doc_id: &str) -> bool {
        let Some(terms) = self.doc_terms.remove(doc_id) else {
            return false;
        };

        for term in terms {
            if let Some(set) = self.postings.get_mut(&term) {
                set.remove(doc_id);
                if set.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
        true
    }

    /// Posting set for `term`, if any document contains it.
    pub fn lookup(&self, term: &str) -> Option<&BTreeSet<String>> {
        self.postings.get(term)
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, BTreeSet::len)
    }

    pub fn contains_document(&self, doc_id: &str) -> bool {
        self.doc_terms.contains_key(doc_id)
    }

    /// Number of indexed documents.
    pub fn size(&self) -> usize {
        self.doc_terms.len()
    }

    /// Number of distinct terms with at least one posting.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    /// Rough heap footprint of the posting structures, used by diagnostics.
    pub fn approximate_size(&self) -> usize {
        let postings: usize = self
            .postings
            .iter()
            .map(|(term, ids)| {
                term.len() + ids.iter().map(String::len).sum::<usize>()
            })
            .sum();
        let reverse: usize = self
            .doc_terms
            .iter()
            .map(|(id, terms)| {
                id.len() + terms.iter().map(String::len).sum::<usize>()
            })
            .sum();
        postings + reverse
    }
}
