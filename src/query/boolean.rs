//! `#AND` and `#OR`.
//!
//! Under the Boolean models both operators merge score lists: `#AND` keeps
//! documents present in every argument, `#OR` those present in any. Ranked
//! Boolean combines scores with min and max respectively. Under Indri,
//! `#AND` is a `#WAND` with equal weights.

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::query::combine;
use crate::query::cursor::{Intersection, Union};
use crate::query::default_score::DefaultScore;
use crate::query::model::RetrievalModel;
use crate::query::operator::{QueryOperator, QueryResult, evaluate_scores};
use crate::query::score_list::{ScoreEntry, ScoreList};

/// Evaluate an `#AND` operator.
pub(crate) fn evaluate_and(
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    let ranked = match model {
        RetrievalModel::UnrankedBoolean => false,
        RetrievalModel::RankedBoolean => true,
        RetrievalModel::Indri(_) => {
            let weights = vec![1.0; args.len()];
            return combine::weighted_geometric_mean(args, &weights, index, model);
        }
        RetrievalModel::Bm25(_) => return Err(ProximaError::unsupported("#AND", model.name())),
    };

    let children = evaluate_scores(args, index, model)?;
    let lists: Vec<&[ScoreEntry]> = children.iter().map(|(scores, _)| scores.entries()).collect();

    let mut scores = ScoreList::new();
    for (doc_id, entries) in Intersection::new(lists) {
        let score = if ranked {
            entries.iter().map(|e| e.score).fold(f64::INFINITY, f64::min)
        } else {
            1.0
        };
        scores.add(doc_id, score);
    }

    Ok(QueryResult::scores(scores, DefaultScore::Zero))
}

/// Evaluate an `#OR` operator.
pub(crate) fn evaluate_or(
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    let ranked = match model {
        RetrievalModel::UnrankedBoolean => false,
        RetrievalModel::RankedBoolean => true,
        RetrievalModel::Bm25(_) | RetrievalModel::Indri(_) => {
            return Err(ProximaError::unsupported("#OR", model.name()));
        }
    };

    let children = evaluate_scores(args, index, model)?;
    let lists: Vec<&[ScoreEntry]> = children.iter().map(|(scores, _)| scores.entries()).collect();

    let mut scores = ScoreList::new();
    for (doc_id, row) in Union::new(lists) {
        let score = if ranked {
            row.iter()
                .flatten()
                .map(|e| e.score)
                .fold(f64::NEG_INFINITY, f64::max)
        } else {
            1.0
        };
        scores.add(doc_id, score);
    }

    Ok(QueryResult::scores(scores, DefaultScore::Zero))
}
