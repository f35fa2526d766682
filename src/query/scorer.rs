//! Scoring of inverted lists under each retrieval model.
//!
//! `#SCORE` turns an inverted list into a score list. The per-document
//! formula lives behind the [`Scorer`] trait; [`score_postings`] gathers the
//! corpus statistics a scorer needs and drives it over the postings.

use std::fmt::Debug;

use crate::error::{ProximaError, Result};
use crate::index::{IndexReader, InvertedList};
use crate::query::default_score::DefaultScore;
use crate::query::model::{Bm25Params, IndriParams, RetrievalModel};
use crate::query::operator::{QueryOperator, QueryResult};
use crate::query::score_list::ScoreList;

/// Trait for per-document scorers.
pub trait Scorer: Send + Debug {
    /// Calculate the score of a document from its term frequency and field
    /// length.
    fn score(&self, term_freq: f64, field_length: f64) -> f64;

    /// Whether [`Scorer::score`] reads the field length.
    fn needs_field_length(&self) -> bool {
        true
    }

    /// Get the name of this scorer.
    fn name(&self) -> &'static str;
}

/// Boolean scorer: a constant 1.0, or the term frequency when ranked.
#[derive(Debug, Clone, Copy)]
pub struct BooleanScorer {
    ranked: bool,
}

impl BooleanScorer {
    /// Scorer for unranked Boolean retrieval.
    pub fn unranked() -> Self {
        BooleanScorer { ranked: false }
    }

    /// Scorer for ranked Boolean retrieval.
    pub fn ranked() -> Self {
        BooleanScorer { ranked: true }
    }
}

impl Scorer for BooleanScorer {
    fn score(&self, term_freq: f64, _field_length: f64) -> f64 {
        if self.ranked { term_freq } else { 1.0 }
    }

    fn needs_field_length(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        if self.ranked { "RankedBoolean" } else { "UnrankedBoolean" }
    }
}

/// BM25 scorer for one inverted list.
#[derive(Debug, Clone)]
pub struct Bm25Scorer {
    /// Robertson/Spärck Jones weight, clamped at zero.
    rsj: f64,
    /// Query term weight.
    user_weight: f64,
    /// Average length of the field.
    avg_field_length: f64,
    k1: f64,
    b: f64,
}

impl Bm25Scorer {
    /// Create a scorer for a list with `doc_freq` documents in a collection
    /// of `total_docs`.
    pub fn new(total_docs: u64, doc_freq: u64, avg_field_length: f64, params: &Bm25Params) -> Self {
        Self::with_params(
            total_docs,
            doc_freq,
            avg_field_length,
            params.k1(),
            params.k3(),
            params.b(),
        )
    }

    /// Create a scorer with raw, unvalidated parameters.
    pub fn with_params(
        total_docs: u64,
        doc_freq: u64,
        avg_field_length: f64,
        k1: f64,
        k3: f64,
        b: f64,
    ) -> Self {
        let n = total_docs as f64;
        let df = doc_freq as f64;
        let rsj = ((n - df + 0.5) / (df + 0.5)).ln().max(0.0);

        // Queries carry no term repetition, so qtf is always 1.
        let qtf = 1.0;
        let user_weight = (k3 + 1.0) * qtf / (k3 + qtf);

        Bm25Scorer {
            rsj,
            user_weight,
            avg_field_length,
            k1,
            b,
        }
    }

    /// Get the RSJ weight.
    pub fn rsj(&self) -> f64 {
        self.rsj
    }

    /// Calculate the term frequency weight.
    pub fn tf_weight(&self, term_freq: f64, field_length: f64) -> f64 {
        let length_ratio = if self.avg_field_length > 0.0 {
            field_length / self.avg_field_length
        } else {
            0.0
        };
        let norm = (1.0 - self.b) + self.b * length_ratio;
        let denominator = term_freq + self.k1 * norm;
        if denominator <= 0.0 {
            return 0.0;
        }
        term_freq / denominator
    }
}

impl Scorer for Bm25Scorer {
    fn score(&self, term_freq: f64, field_length: f64) -> f64 {
        self.rsj * self.tf_weight(term_freq, field_length) * self.user_weight
    }

    fn name(&self) -> &'static str {
        "BM25"
    }
}

/// Indri scorer: Dirichlet smoothing interpolated with the collection model.
#[derive(Debug, Clone)]
pub struct IndriScorer {
    /// Maximum likelihood estimate of the term in the collection.
    p_mle: f64,
    mu: f64,
    lambda: f64,
}

impl IndriScorer {
    /// Create a scorer for a term occurring `collection_term_freq` times in a
    /// field holding `collection_length` tokens.
    pub fn new(collection_term_freq: u64, collection_length: u64, params: &IndriParams) -> Self {
        let p_mle = if collection_length > 0 {
            collection_term_freq as f64 / collection_length as f64
        } else {
            0.0
        };
        Self::from_p_mle(p_mle, params)
    }

    /// Create a scorer from a precomputed collection probability.
    pub fn from_p_mle(p_mle: f64, params: &IndriParams) -> Self {
        IndriScorer {
            p_mle,
            mu: params.mu(),
            lambda: params.lambda(),
        }
    }

    /// Get the collection probability.
    pub fn p_mle(&self) -> f64 {
        self.p_mle
    }
}

impl Scorer for IndriScorer {
    fn score(&self, term_freq: f64, field_length: f64) -> f64 {
        let denominator = field_length + self.mu;
        let smoothed = if denominator > 0.0 {
            (term_freq + self.mu * self.p_mle) / denominator
        } else {
            0.0
        };
        (1.0 - self.lambda) * smoothed + self.lambda * self.p_mle
    }

    fn name(&self) -> &'static str {
        "Indri"
    }
}

/// Evaluate a `#SCORE` operator.
pub(crate) fn evaluate_score(
    arg: &QueryOperator,
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<QueryResult> {
    let list = arg.evaluate(index, model)?.into_postings("#SCORE")?;
    let (scores, default) = score_postings(list, index, model)?;
    Ok(QueryResult::scores(scores, default))
}

/// Score every posting of an inverted list under `model`.
///
/// Returns the score list in docid order together with the score a document
/// without a posting would receive.
pub fn score_postings(
    list: InvertedList,
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<(ScoreList, DefaultScore)> {
    let field = list.field().to_string();

    let (scorer, default): (Box<dyn Scorer>, DefaultScore) = match model {
        RetrievalModel::UnrankedBoolean => {
            (Box::new(BooleanScorer::unranked()), DefaultScore::Zero)
        }
        RetrievalModel::RankedBoolean => (Box::new(BooleanScorer::ranked()), DefaultScore::Zero),
        RetrievalModel::Bm25(params) => {
            let scorer = Bm25Scorer::new(
                index.doc_count(),
                list.doc_freq(),
                index.avg_field_length(&field)?,
                params,
            );
            (Box::new(scorer), DefaultScore::Zero)
        }
        RetrievalModel::Indri(params) => {
            let scorer = IndriScorer::new(
                list.collection_term_freq(),
                index.total_term_freq(&field)?,
                params,
            );
            let default = DefaultScore::Term {
                field: field.clone(),
                p_mle: scorer.p_mle(),
            };
            (Box::new(scorer), default)
        }
    };

    let mut scores = ScoreList::with_capacity(list.len());
    for posting in list.postings() {
        let field_length = if scorer.needs_field_length() {
            index.field_length(&field, posting.doc_id)? as f64
        } else {
            0.0
        };
        let score = scorer.score(f64::from(posting.term_freq), field_length);
        if !score.is_finite() {
            return Err(ProximaError::invalid_parameter(format!(
                "{} produced a non-finite score for document {}",
                scorer.name(),
                posting.doc_id
            )));
        }
        scores.add(posting.doc_id, score);
    }

    Ok((scores, default))
}
