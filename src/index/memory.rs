//! In-memory index implementing [`IndexReader`].
//!
//! Documents are added already analyzed: each field value is a sequence of
//! normalized tokens separated by whitespace. Internal docids are dense and
//! ascend in insertion order starting at 0; token positions are 1-based.
//!
//! The index can be written to and read from a JSON snapshot so the CLI can
//! evaluate queries against a prepared collection.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::index::posting::{InvertedList, Posting};
use crate::index::reader::IndexReader;
use crate::index::{DocId, Position};

/// Per-field postings and statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FieldIndex {
    /// Term -> postings, ascending by docid.
    terms: AHashMap<String, Vec<Posting>>,
    /// Sum of field lengths over all documents.
    total_terms: u64,
    /// Number of documents with a non-empty field.
    doc_count: u64,
    /// Field length per docid (0 when the document lacks the field).
    lengths: Vec<u64>,
}

impl FieldIndex {
    fn length(&self, doc_id: DocId) -> u64 {
        usize::try_from(doc_id)
            .ok()
            .and_then(|i| self.lengths.get(i))
            .copied()
            .unwrap_or(0)
    }
}

/// An in-memory, read-optimized index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryIndex {
    /// External ids, indexed by internal docid.
    external_ids: Vec<String>,
    /// External id -> internal docid.
    internal_ids: AHashMap<String, DocId>,
    /// Field name -> field index.
    fields: BTreeMap<String, FieldIndex>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document and return its internal docid.
    ///
    /// Each `(field, text)` pair holds pre-analyzed tokens separated by
    /// whitespace. A field may appear more than once; its tokens are
    /// concatenated in the given order.
    pub fn add_document<S: Into<String>>(
        &mut self,
        external_id: S,
        fields: &[(&str, &str)],
    ) -> Result<DocId> {
        let external_id = external_id.into();
        if self.internal_ids.contains_key(&external_id) {
            return Err(ProximaError::invalid_parameter(format!(
                "duplicate external id: {external_id}"
            )));
        }

        let doc_id = self.external_ids.len() as DocId;

        let mut field_tokens: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for &(field, text) in fields {
            field_tokens
                .entry(field)
                .or_default()
                .extend(text.split_whitespace());
        }

        for (field, tokens) in field_tokens {
            let field_index = self.fields.entry(field.to_string()).or_default();
            let mut positions: BTreeMap<&str, Vec<Position>> = BTreeMap::new();
            for (offset, &token) in tokens.iter().enumerate() {
                positions
                    .entry(token)
                    .or_default()
                    .push(offset as Position + 1);
            }

            for (term, term_positions) in positions {
                field_index
                    .terms
                    .entry(term.to_string())
                    .or_default()
                    .push(Posting::new(doc_id, term_positions));
            }

            let length = tokens.len() as u64;
            field_index.lengths.resize(doc_id as usize + 1, 0);
            field_index.lengths[doc_id as usize] = length;
            field_index.total_terms += length;
            if length > 0 {
                field_index.doc_count += 1;
            }
        }

        self.internal_ids.insert(external_id.clone(), doc_id);
        self.external_ids.push(external_id);
        Ok(doc_id)
    }

    /// Look up the internal docid of an external id.
    pub fn internal_id(&self, external_id: &str) -> Option<DocId> {
        self.internal_ids.get(external_id).copied()
    }

    /// Names of the indexed fields, in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Load an index snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ProximaError::index_access(format!("cannot open {}: {e}", path.display()))
        })?;
        let index: MemoryIndex = serde_json::from_reader(BufReader::new(file))?;
        debug!(
            "loaded index from {} ({} documents, {} fields)",
            path.display(),
            index.external_ids.len(),
            index.fields.len()
        );
        Ok(index)
    }

    /// Write an index snapshot to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    fn field(&self, field: &str) -> Option<&FieldIndex> {
        self.fields.get(field)
    }
}

impl IndexReader for MemoryIndex {
    fn doc_count(&self) -> u64 {
        self.external_ids.len() as u64
    }

    fn postings(&self, field: &str, term: &str) -> Result<InvertedList> {
        let Some(postings) = self.field(field).and_then(|f| f.terms.get(term)) else {
            return Ok(InvertedList::new(field));
        };
        let ctf = postings.iter().map(|p| u64::from(p.term_freq)).sum();
        Ok(InvertedList::from_postings(field, postings.clone(), ctf))
    }

    fn field_doc_count(&self, field: &str) -> Result<u64> {
        Ok(self.field(field).map_or(0, |f| f.doc_count))
    }

    fn total_term_freq(&self, field: &str) -> Result<u64> {
        Ok(self.field(field).map_or(0, |f| f.total_terms))
    }

    fn term_total_freq(&self, field: &str, term: &str) -> Result<u64> {
        Ok(self
            .field(field)
            .and_then(|f| f.terms.get(term))
            .map_or(0, |postings| {
                postings.iter().map(|p| u64::from(p.term_freq)).sum()
            }))
    }

    fn doc_freq(&self, field: &str, term: &str) -> Result<u64> {
        Ok(self
            .field(field)
            .and_then(|f| f.terms.get(term))
            .map_or(0, |postings| postings.len() as u64))
    }

    fn field_length(&self, field: &str, doc_id: DocId) -> Result<u64> {
        if doc_id >= self.doc_count() {
            return Err(ProximaError::index_access(format!(
                "document {doc_id} is not in the index"
            )));
        }
        Ok(self.field(field).map_or(0, |f| f.length(doc_id)))
    }

    fn external_id(&self, doc_id: DocId) -> Result<Option<String>> {
        Ok(usize::try_from(doc_id)
            .ok()
            .and_then(|i| self.external_ids.get(i))
            .cloned())
    }
}
