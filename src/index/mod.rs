//! Index access for query evaluation.
//!
//! The engine reads postings and corpus statistics through the
//! [`IndexReader`] trait. [`MemoryIndex`] is the bundled implementation.

pub mod memory;
pub mod posting;
pub mod reader;

/// Internal document id.
pub type DocId = u64;

/// 1-based token offset within a field.
pub type Position = u32;

/// Field searched when a query term names none.
pub const DEFAULT_FIELD: &str = "body";

// Re-export commonly used types
pub use memory::MemoryIndex;
pub use posting::{InvertedList, Posting};
pub use reader::IndexReader;
