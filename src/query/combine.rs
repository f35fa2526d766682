//! Score combinators: `#SUM`, `#WSUM` and `#WAND`.
//!
//! Each combinator walks the union of its arguments' score lists. A
//! document missing from an argument takes that argument's default score,
//! which is 0 except under Indri.

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::query::cursor::Union;
use crate::query::default_score::DefaultScore;
use crate::query::model::RetrievalModel;
use crate::query::operator::{QueryOperator, QueryResult, evaluate_scores};
use crate::query::score_list::{ScoreEntry, ScoreList};

/// How weighted child scores are folded together.
#[derive(Debug, Clone, Copy)]
enum Mean {
    Arithmetic,
    Geometric,
}

/// Evaluate a `#SUM` operator. BM25 only.
pub(crate) fn evaluate_sum(
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    if !matches!(model, RetrievalModel::Bm25(_)) {
        return Err(ProximaError::unsupported("#SUM", model.name()));
    }

    let children = evaluate_scores(args, index, model)?;
    let lists: Vec<&[ScoreEntry]> = children.iter().map(|(scores, _)| scores.entries()).collect();

    let mut scores = ScoreList::new();
    for (doc_id, row) in Union::new(lists) {
        scores.add(doc_id, row.iter().flatten().map(|e| e.score).sum());
    }

    Ok(QueryResult::scores(scores, DefaultScore::Zero))
}

/// Evaluate a `#WSUM` operator. Indri only.
pub(crate) fn evaluate_weighted_sum(
    args: &[QueryOperator],
    weights: &[f64],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    if !matches!(model, RetrievalModel::Indri(_)) {
        return Err(ProximaError::unsupported("#WSUM", model.name()));
    }
    combine("#WSUM", args, weights, Mean::Arithmetic, index, model)
}

/// Evaluate a `#WAND` operator. Indri only.
pub(crate) fn evaluate_weighted_and(
    args: &[QueryOperator],
    weights: &[f64],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    if !matches!(model, RetrievalModel::Indri(_)) {
        return Err(ProximaError::unsupported("#WAND", model.name()));
    }
    weighted_geometric_mean(args, weights, index, model)
}

/// Weighted geometric mean of the arguments' scores, filling gaps with
/// default scores.
pub(crate) fn weighted_geometric_mean(
    args: &[QueryOperator],
    weights: &[f64],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    combine("#WAND", args, weights, Mean::Geometric, index, model)
}

/// Validate weights and scale them to sum to 1.
fn normalize_weights(operator: &str, weights: &[f64]) -> Result<Vec<f64>> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(ProximaError::malformed_query(format!(
            "{operator} weights must be non-negative, got {bad}"
        )));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(ProximaError::malformed_query(format!(
            "{operator} weights must have a positive sum"
        )));
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

fn combine(
    operator: &str,
    args: &[QueryOperator],
    weights: &[f64],
    mean: Mean,
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    if weights.len() != args.len() {
        return Err(ProximaError::malformed_query(format!(
            "{operator} has {} weights for {} arguments",
            weights.len(),
            args.len()
        )));
    }
    let weights = normalize_weights(operator, weights)?;

    let children = evaluate_scores(args, index, model)?;
    let lists: Vec<&[ScoreEntry]> = children.iter().map(|(scores, _)| scores.entries()).collect();

    let mut scores = ScoreList::new();
    for (doc_id, row) in Union::new(lists) {
        let mut combined = match mean {
            Mean::Arithmetic => 0.0,
            Mean::Geometric => 1.0,
        };
        for ((entry, (_, default)), weight) in row.iter().zip(&children).zip(&weights) {
            let score = match entry {
                Some(entry) => entry.score,
                None => default.score(doc_id, index, model)?,
            };
            match mean {
                Mean::Arithmetic => combined += weight * score,
                Mean::Geometric => combined *= score.powf(*weight),
            }
        }
        scores.add(doc_id, combined);
    }

    let parts: Vec<(f64, DefaultScore)> = weights
        .into_iter()
        .zip(children.into_iter().map(|(_, default)| default))
        .collect();
    let default = match mean {
        Mean::Arithmetic => DefaultScore::ArithmeticMean(parts),
        Mean::Geometric => DefaultScore::GeometricMean(parts),
    };

    Ok(QueryResult::scores(scores, default))
}
