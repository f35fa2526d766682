//! Query evaluation entry point and result ranking.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::index::{DocId, IndexReader};
use crate::query::{QueryOperator, QueryParser, RetrievalModel, ScoreList};

/// A document in a ranked result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    /// 1-based rank.
    pub rank: usize,
    /// External document identifier.
    pub external_id: String,
    /// Internal document id.
    pub doc_id: DocId,
    /// Document score.
    pub score: f64,
}

/// Evaluates queries against one index under one retrieval model.
#[derive(Debug, Clone, Copy)]
pub struct Searcher<'a> {
    index: &'a dyn IndexReader,
    model: RetrievalModel,
}

impl<'a> Searcher<'a> {
    /// Create a searcher.
    pub fn new(index: &'a dyn IndexReader, model: RetrievalModel) -> Self {
        Searcher { index, model }
    }

    /// Get the retrieval model.
    pub fn model(&self) -> &RetrievalModel {
        &self.model
    }

    /// Evaluate a query tree and return its docid-ordered score list.
    ///
    /// A root that produces an inverted list is scored as if wrapped in
    /// `#SCORE`.
    pub fn search(&self, query: &QueryOperator) -> Result<ScoreList> {
        let result = query.evaluate(self.index, &self.model)?;
        let (scores, _) = result.into_scores(self.index, &self.model)?;
        debug!("{query} matched {} documents under {}", scores.len(), self.model);
        Ok(scores)
    }

    /// Parse a query string with the model's default operator and evaluate it.
    pub fn search_str(&self, query: &str) -> Result<ScoreList> {
        let tree = QueryParser::for_model(&self.model).parse(query)?;
        self.search(&tree)
    }

    /// Evaluate a query and return its top `max_results` documents.
    pub fn top_docs(
        &self,
        query: &QueryOperator,
        max_results: usize,
    ) -> Result<Vec<RankedDocument>> {
        rank(&self.search(query)?, self.index, max_results)
    }
}

/// Order a score list for output.
///
/// Documents are sorted by descending score with ties broken by ascending
/// external id, then truncated to `max_results`.
pub fn rank(
    scores: &ScoreList,
    index: &dyn IndexReader,
    max_results: usize,
) -> Result<Vec<RankedDocument>> {
    let mut ranked = scores
        .iter()
        .map(|entry| {
            let external_id = index.external_id(entry.doc_id)?.ok_or_else(|| {
                ProximaError::index_access(format!(
                    "no external id for document {}",
                    entry.doc_id
                ))
            })?;
            Ok(RankedDocument {
                rank: 0,
                external_id,
                doc_id: entry.doc_id,
                score: entry.score,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.external_id.cmp(&b.external_id))
    });
    ranked.truncate(max_results);
    for (i, doc) in ranked.iter_mut().enumerate() {
        doc.rank = i + 1;
    }

    Ok(ranked)
}

/// Format a ranking as TREC run lines: `qid Q0 external_id rank score run_id`.
///
/// An empty ranking yields a single `dummy` line so every query appears in
/// the run file.
pub fn trec_lines(query_id: &str, ranked: &[RankedDocument], run_id: &str) -> Vec<String> {
    if ranked.is_empty() {
        return vec![format!("{query_id} Q0 dummy 1 0 {run_id}")];
    }
    ranked
        .iter()
        .map(|doc| {
            format!(
                "{query_id} Q0 {} {} {} {run_id}",
                doc.external_id, doc.rank, doc.score
            )
        })
        .collect()
}
