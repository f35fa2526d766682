//! Retrieval models.
//!
//! A [`RetrievalModel`] selects the scoring semantics every operator uses and
//! carries the model's parameters. Models are validated at construction and
//! immutable afterwards.

use std::collections::HashMap;
use std::fmt;

use log::warn;
use serde::Serialize;

use crate::error::{ProximaError, Result};

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bm25Params {
    k1: f64,
    k3: f64,
    b: f64,
}

impl Bm25Params {
    /// Create validated BM25 parameters.
    ///
    /// `k1` and `k3` must be finite and non-negative; `b` must lie in `(0, 1)`.
    pub fn new(k1: f64, k3: f64, b: f64) -> Result<Self> {
        if !k1.is_finite() || k1 < 0.0 {
            return Err(ProximaError::invalid_parameter(format!(
                "BM25 k_1 must be >= 0, got {k1}"
            )));
        }
        if !k3.is_finite() || k3 < 0.0 {
            return Err(ProximaError::invalid_parameter(format!(
                "BM25 k_3 must be >= 0, got {k3}"
            )));
        }
        if !(b > 0.0 && b < 1.0) {
            return Err(ProximaError::invalid_parameter(format!(
                "BM25 b must lie in (0, 1), got {b}"
            )));
        }
        Ok(Bm25Params { k1, k3, b })
    }

    /// Get the k1 parameter.
    pub fn k1(&self) -> f64 {
        self.k1
    }

    /// Get the k3 parameter.
    pub fn k3(&self) -> f64 {
        self.k3
    }

    /// Get the b parameter.
    pub fn b(&self) -> f64 {
        self.b
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params {
            k1: 1.2,
            k3: 0.0,
            b: 0.75,
        }
    }
}

/// Indri (Dirichlet + Jelinek-Mercer) parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndriParams {
    mu: f64,
    lambda: f64,
}

impl IndriParams {
    /// Create validated Indri parameters.
    ///
    /// `mu` must be finite and non-negative; `lambda` must lie in `(0, 1)`.
    pub fn new(mu: f64, lambda: f64) -> Result<Self> {
        if !mu.is_finite() || mu < 0.0 {
            return Err(ProximaError::invalid_parameter(format!(
                "Indri mu must be >= 0, got {mu}"
            )));
        }
        if !(lambda > 0.0 && lambda < 1.0) {
            return Err(ProximaError::invalid_parameter(format!(
                "Indri lambda must lie in (0, 1), got {lambda}"
            )));
        }
        Ok(IndriParams { mu, lambda })
    }

    /// Get the mu parameter.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Get the lambda parameter.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl Default for IndriParams {
    fn default() -> Self {
        IndriParams {
            mu: 2500.0,
            lambda: 0.4,
        }
    }
}

/// Scoring semantics for query evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RetrievalModel {
    /// Every match scores 1.0.
    UnrankedBoolean,
    /// Matches score by term frequency; AND takes the minimum, OR the maximum.
    RankedBoolean,
    /// Okapi BM25.
    Bm25(Bm25Params),
    /// Indri query likelihood with two-stage smoothing.
    Indri(IndriParams),
}

impl RetrievalModel {
    /// Create a BM25 model.
    pub fn bm25(k1: f64, k3: f64, b: f64) -> Result<Self> {
        Ok(RetrievalModel::Bm25(Bm25Params::new(k1, k3, b)?))
    }

    /// Create an Indri model.
    pub fn indri(mu: f64, lambda: f64) -> Result<Self> {
        Ok(RetrievalModel::Indri(IndriParams::new(mu, lambda)?))
    }

    /// Get the name of this model.
    pub fn name(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean => "UnrankedBoolean",
            RetrievalModel::RankedBoolean => "RankedBoolean",
            RetrievalModel::Bm25(_) => "BM25",
            RetrievalModel::Indri(_) => "Indri",
        }
    }

    /// Build a model from `retrievalAlgorithm`, `BM25:k_1`, `BM25:k_3`,
    /// `BM25:b`, `Indri:mu` and `Indri:lambda` parameters.
    ///
    /// A missing `retrievalAlgorithm` falls back to unranked Boolean. A
    /// ranked model with a missing or unparsable parameter is rejected.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let Some(algorithm) = params.get("retrievalAlgorithm") else {
            warn!("no retrievalAlgorithm given, using UnrankedBoolean");
            return Ok(RetrievalModel::UnrankedBoolean);
        };

        match algorithm.trim() {
            "UnrankedBoolean" => Ok(RetrievalModel::UnrankedBoolean),
            "RankedBoolean" => Ok(RetrievalModel::RankedBoolean),
            "BM25" => RetrievalModel::bm25(
                numeric_param(params, "BM25:k_1")?,
                numeric_param(params, "BM25:k_3")?,
                numeric_param(params, "BM25:b")?,
            ),
            "Indri" => RetrievalModel::indri(
                numeric_param(params, "Indri:mu")?,
                numeric_param(params, "Indri:lambda")?,
            ),
            other => Err(ProximaError::invalid_parameter(format!(
                "unknown retrieval algorithm: {other}"
            ))),
        }
    }
}

impl fmt::Display for RetrievalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn numeric_param(params: &HashMap<String, String>, key: &str) -> Result<f64> {
    let value = params
        .get(key)
        .ok_or_else(|| ProximaError::invalid_parameter(format!("missing parameter {key}")))?;
    value.trim().parse::<f64>().map_err(|e| {
        ProximaError::invalid_parameter(format!("{key}: cannot parse {value:?}: {e}"))
    })
}
