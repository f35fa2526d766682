//! Document score lists.

use serde::{Deserialize, Serialize};

use crate::index::DocId;

/// A `(docid, score)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Internal document id.
    pub doc_id: DocId,
    /// Document score.
    pub score: f64,
}

/// Sequence of document scores produced by a scoring operator.
///
/// Operators build score lists in ascending docid order so that parents can
/// merge them; [`rank`](crate::search::rank) orders a list for output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreList {
    entries: Vec<ScoreEntry>,
}

impl ScoreList {
    /// Create an empty score list.
    pub fn new() -> Self {
        ScoreList {
            entries: Vec::new(),
        }
    }

    /// Create an empty score list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        ScoreList {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a document score.
    pub fn add(&mut self, doc_id: DocId, score: f64) {
        self.entries.push(ScoreEntry { doc_id, score });
    }

    /// Get the docid of the n'th entry.
    pub fn doc_id(&self, n: usize) -> Option<DocId> {
        self.entries.get(n).map(|e| e.doc_id)
    }

    /// Get the score of the n'th entry.
    pub fn score(&self, n: usize) -> Option<f64> {
        self.entries.get(n).map(|e| e.score)
    }

    /// Get the entries.
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoreEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if this list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score of a document, if present. Linear scan.
    pub fn score_of(&self, doc_id: DocId) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.doc_id == doc_id)
            .map(|e| e.score)
    }
}

impl IntoIterator for ScoreList {
    type Item = ScoreEntry;
    type IntoIter = std::vec::IntoIter<ScoreEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScoreList {
    type Item = &'a ScoreEntry;
    type IntoIter = std::slice::Iter<'a, ScoreEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(DocId, f64)> for ScoreList {
    fn from_iter<I: IntoIterator<Item = (DocId, f64)>>(iter: I) -> Self {
        ScoreList {
            entries: iter
                .into_iter()
                .map(|(doc_id, score)| ScoreEntry { doc_id, score })
                .collect(),
        }
    }
}
