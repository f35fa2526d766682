//! Postings and inverted lists.
//!
//! An [`InvertedList`] holds the docid-ascending postings of a term (or of a
//! derived expression such as `#NEAR/3`) within one field. Postings carry
//! their positions as an immutable ascending sequence; evaluation keeps its
//! own position cursors instead of mutating the list.

use serde::{Deserialize, Serialize};

use crate::index::{DocId, Position};

/// Occurrences of one term (or derived expression) in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Internal document id.
    pub doc_id: DocId,
    /// Number of occurrences in the document.
    pub term_freq: u32,
    /// 1-based token offsets within the field, ascending.
    pub positions: Vec<Position>,
}

impl Posting {
    /// Create a posting whose term frequency is the number of positions.
    pub fn new(doc_id: DocId, positions: Vec<Position>) -> Self {
        debug_assert!(positions.windows(2).all(|w| w[0] <= w[1]));
        Posting {
            doc_id,
            term_freq: positions.len() as u32,
            positions,
        }
    }

    /// Get the positions of this posting.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }
}

/// Docid-ordered postings for a term or derived term expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvertedList {
    /// Field the postings were read from.
    field: String,
    /// Collection term frequency for this field/term.
    collection_term_freq: u64,
    /// Postings, strictly ascending by docid.
    postings: Vec<Posting>,
}

impl InvertedList {
    /// Create an empty inverted list for a field.
    pub fn new<S: Into<String>>(field: S) -> Self {
        InvertedList {
            field: field.into(),
            collection_term_freq: 0,
            postings: Vec::new(),
        }
    }

    /// Create an inverted list from postings and a collection term frequency
    /// supplied by the index.
    ///
    /// The collection term frequency is taken as given, not recomputed from
    /// the postings.
    pub fn from_postings<S: Into<String>>(
        field: S,
        postings: Vec<Posting>,
        collection_term_freq: u64,
    ) -> Self {
        debug_assert!(postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
        InvertedList {
            field: field.into(),
            collection_term_freq,
            postings,
        }
    }

    /// Append a posting for a document greater than every docid already in
    /// the list. The posting's frequency is added to the collection term
    /// frequency.
    pub fn append_posting(&mut self, posting: Posting) {
        debug_assert!(
            self.postings
                .last()
                .is_none_or(|last| last.doc_id < posting.doc_id),
            "postings must be appended in ascending docid order"
        );
        self.collection_term_freq += u64::from(posting.term_freq);
        self.postings.push(posting);
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Number of documents in this list.
    pub fn doc_freq(&self) -> u64 {
        self.postings.len() as u64
    }

    /// Collection term frequency for this field/term.
    pub fn collection_term_freq(&self) -> u64 {
        self.collection_term_freq
    }

    /// Get the postings.
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Get the docid of the n'th posting.
    pub fn doc_id(&self, n: usize) -> Option<DocId> {
        self.postings.get(n).map(|p| p.doc_id)
    }

    /// Number of postings.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if this list has no postings.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Consume the list, returning its postings.
    pub fn into_postings(self) -> Vec<Posting> {
        self.postings
    }
}
