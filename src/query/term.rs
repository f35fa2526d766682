//! Term and synonym operators.

use std::fmt;

use crate::error::Result;
use crate::index::{DEFAULT_FIELD, IndexReader, InvertedList, Position, Posting};
use crate::query::cursor::{Union, merge_positions};
use crate::query::model::RetrievalModel;
use crate::query::operator::{QueryOperator, evaluate_postings};

/// A leaf operator that reads one term's postings from one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermOperator {
    /// The term to look up.
    term: String,
    /// The field to search in.
    field: String,
}

impl TermOperator {
    /// Create a term operator on the default field.
    ///
    /// The term is matched exactly; normalize it (e.g. lowercase) before
    /// building the operator.
    pub fn new<T: Into<String>>(term: T) -> Self {
        TermOperator {
            term: term.into(),
            field: DEFAULT_FIELD.to_string(),
        }
    }

    /// Search a different field.
    pub fn with_field<F: Into<String>>(mut self, field: F) -> Self {
        self.field = field.into();
        self
    }

    /// Get the term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Fetch the term's inverted list. An unknown term yields an empty list.
    pub fn evaluate(&self, index: &dyn IndexReader) -> Result<InvertedList> {
        index.postings(&self.field, &self.term)
    }
}

impl fmt::Display for TermOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field == DEFAULT_FIELD {
            write!(f, "{}", self.term)
        } else {
            write!(f, "{}.{}", self.term, self.field)
        }
    }
}

/// Evaluate a `#SYN` operator: the union of its arguments, treated as one
/// term.
pub(crate) fn evaluate_synonym(
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<InvertedList> {
    let lists = evaluate_postings("#SYN", args, index, model)?;
    let field = lists.first().map_or(DEFAULT_FIELD, |l| l.field());
    let mut result = InvertedList::new(field);

    let slices: Vec<&[Posting]> = lists.iter().map(InvertedList::postings).collect();
    for (doc_id, row) in Union::new(slices) {
        let positions: Vec<&[Position]> = row.iter().flatten().map(|p| p.positions()).collect();
        result.append_posting(Posting::new(doc_id, merge_positions(&positions)));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;

    fn index() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document("d0", &[("body", "car auto car")]).unwrap();
        index
            .add_document("d1", &[("body", "truck"), ("title", "car")])
            .unwrap();
        index.add_document("d2", &[("body", "auto")]).unwrap();
        index
    }

    #[test]
    fn test_term_operator() {
        let index = index();
        let term = TermOperator::new("car");
        assert_eq!(term.field(), "body");
        assert_eq!(term.to_string(), "car");

        let list = term.evaluate(&index).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.postings()[0].positions(), &[1, 3]);

        let title = TermOperator::new("car").with_field("title");
        assert_eq!(title.to_string(), "car.title");
        assert_eq!(title.evaluate(&index).unwrap().doc_id(0), Some(1));
    }

    #[test]
    fn test_unknown_term_is_empty() {
        let index = index();
        let list = TermOperator::new("zeppelin").evaluate(&index).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.collection_term_freq(), 0);
    }

    #[test]
    fn test_synonym_merges_positions() {
        let index = index();
        let args = vec![QueryOperator::term("car"), QueryOperator::term("auto")];
        let list = evaluate_synonym(&args, &index, &RetrievalModel::UnrankedBoolean).unwrap();

        let docs: Vec<u64> = list.postings().iter().map(|p| p.doc_id).collect();
        assert_eq!(docs, vec![0, 2]);
        assert_eq!(list.postings()[0].positions(), &[1, 2, 3]);
        assert_eq!(list.postings()[0].term_freq, 3);
        assert_eq!(list.collection_term_freq(), 4);
    }

    #[test]
    fn test_synonym_of_one_argument() {
        let index = index();
        let args = vec![QueryOperator::term("auto")];
        let list = evaluate_synonym(&args, &index, &RetrievalModel::UnrankedBoolean).unwrap();
        assert_eq!(list, TermOperator::new("auto").evaluate(&index).unwrap());
    }
}
