//! Scores for documents a score list does not contain.
//!
//! Under Indri a document that lacks a query term still gets a smoothed,
//! non-zero score. A [`DefaultScore`] describes how to compute that score for
//! any document, so parents combining several score lists can fill in the
//! holes.

use crate::error::Result;
use crate::index::{DocId, IndexReader};
use crate::query::model::RetrievalModel;
use crate::query::scorer::{IndriScorer, Scorer};

/// How a score list scores documents it does not contain.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultScore {
    /// Missing documents score 0.
    Zero,
    /// Indri term score with a term frequency of zero.
    Term {
        /// Field whose length normalizes the score.
        field: String,
        /// Collection probability of the term.
        p_mle: f64,
    },
    /// Weighted geometric mean of child defaults. Weights sum to 1.
    GeometricMean(Vec<(f64, DefaultScore)>),
    /// Weighted arithmetic mean of child defaults. Weights sum to 1.
    ArithmeticMean(Vec<(f64, DefaultScore)>),
}

impl DefaultScore {
    /// Compute the default score of a document.
    pub fn score(
        &self,
        doc_id: DocId,
        index: &dyn IndexReader,
        model: &RetrievalModel,
    ) -> Result<f64> {
        let RetrievalModel::Indri(params) = model else {
            return Ok(0.0);
        };

        match self {
            DefaultScore::Zero => Ok(0.0),
            DefaultScore::Term { field, p_mle } => {
                let field_length = index.field_length(field, doc_id)? as f64;
                Ok(IndriScorer::from_p_mle(*p_mle, params).score(0.0, field_length))
            }
            DefaultScore::GeometricMean(parts) => {
                let mut product = 1.0;
                for (weight, part) in parts {
                    product *= part.score(doc_id, index, model)?.powf(*weight);
                }
                Ok(product)
            }
            DefaultScore::ArithmeticMean(parts) => {
                let mut sum = 0.0;
                for (weight, part) in parts {
                    sum += weight * part.score(doc_id, index, model)?;
                }
                Ok(sum)
            }
        }
    }
}
