//! # Proxima
//!
//! Structured query evaluation over an inverted index.
//!
//! ## Features
//!
//! - Composable query operators: term, `#SYN`, `#AND`, `#OR`, `#NEAR/k`,
//!   `#WINDOW/k`, `#SCORE`, `#SUM`, `#WSUM`, `#WAND`
//! - Unranked and ranked Boolean, BM25 and Indri retrieval models
//! - Indri default scores for documents missing from a sub-query
//! - A structured query parser and TREC run output
//!
//! ## Example
//!
//! ```
//! use proxima::index::MemoryIndex;
//! use proxima::query::{QueryParser, RetrievalModel};
//! use proxima::search::Searcher;
//!
//! let mut index = MemoryIndex::new();
//! index.add_document("doc-1", &[("body", "the quick brown fox")]).unwrap();
//! index.add_document("doc-2", &[("body", "a quick fox")]).unwrap();
//!
//! let model = RetrievalModel::indri(2500.0, 0.4).unwrap();
//! let query = QueryParser::for_model(&model).parse("#near/2(quick fox)").unwrap();
//! let scores = Searcher::new(&index, model).search(&query).unwrap();
//! assert_eq!(scores.len(), 2);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod search;

pub mod prelude {
    pub use crate::error::{ProximaError, Result};
    pub use crate::index::{DocId, IndexReader, InvertedList, MemoryIndex, Posting};
    pub use crate::query::{QueryOperator, QueryParser, RetrievalModel, ScoreList};
    pub use crate::search::{RankedDocument, Searcher, rank, trec_lines};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
