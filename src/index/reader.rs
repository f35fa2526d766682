//! Read interface the query engine consumes from an index.

use crate::error::Result;
use crate::index::posting::InvertedList;
use crate::index::DocId;

/// Trait for index readers.
///
/// Implementations are read-only and may be shared across threads that
/// evaluate independent queries. Every statistic is per field; the engine
/// never asks for a cross-field aggregate other than [`doc_count`].
///
/// [`doc_count`]: IndexReader::doc_count
pub trait IndexReader: Send + Sync + std::fmt::Debug {
    /// Get the number of documents in the index.
    fn doc_count(&self) -> u64;

    /// Get the inverted list for a field and term.
    ///
    /// An unknown term yields an empty list for the field, not an error.
    fn postings(&self, field: &str, term: &str) -> Result<InvertedList>;

    /// Number of documents with a non-empty `field`.
    fn field_doc_count(&self, field: &str) -> Result<u64>;

    /// Total number of tokens in `field` across the collection.
    fn total_term_freq(&self, field: &str) -> Result<u64>;

    /// Total number of occurrences of `term` in `field` across the collection.
    fn term_total_freq(&self, field: &str, term: &str) -> Result<u64>;

    /// Number of documents containing `term` in `field`.
    fn doc_freq(&self, field: &str, term: &str) -> Result<u64>;

    /// Length of `field` in the given document, in tokens.
    fn field_length(&self, field: &str, doc_id: DocId) -> Result<u64>;

    /// External identifier of a document, if the document exists.
    fn external_id(&self, doc_id: DocId) -> Result<Option<String>>;

    /// Average length of `field` over the documents that contain it.
    fn avg_field_length(&self, field: &str) -> Result<f64> {
        let docs = self.field_doc_count(field)?;
        if docs == 0 {
            return Ok(0.0);
        }
        Ok(self.total_term_freq(field)? as f64 / docs as f64)
    }
}
