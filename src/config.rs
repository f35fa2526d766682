//! Batch evaluation configuration.
//!
//! Configuration comes either from a JSON document or from a `key=value`
//! parameter file:
//!
//! ```text
//! indexPath=index.json
//! queryFilePath=queries.txt
//! trecEvalOutputPath=run.txt
//! retrievalAlgorithm=BM25
//! BM25:k_1=1.2
//! BM25:k_3=0
//! BM25:b=0.75
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::query::RetrievalModel;

/// Retrieval model settings as written in configuration.
///
/// Unlike [`RetrievalModel`], this type may hold out-of-range values;
/// [`ModelConfig::build`] validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "algorithm")]
pub enum ModelConfig {
    /// Unranked Boolean retrieval.
    #[default]
    UnrankedBoolean,
    /// Ranked Boolean retrieval.
    RankedBoolean,
    /// BM25.
    #[serde(rename = "BM25")]
    Bm25 {
        /// Term frequency saturation.
        k1: f64,
        /// Query term frequency saturation.
        k3: f64,
        /// Length normalization.
        b: f64,
    },
    /// Indri.
    Indri {
        /// Dirichlet prior.
        mu: f64,
        /// Collection model interpolation weight.
        lambda: f64,
    },
}

impl ModelConfig {
    /// Validate the settings and build the retrieval model.
    pub fn build(&self) -> Result<RetrievalModel> {
        match *self {
            ModelConfig::UnrankedBoolean => Ok(RetrievalModel::UnrankedBoolean),
            ModelConfig::RankedBoolean => Ok(RetrievalModel::RankedBoolean),
            ModelConfig::Bm25 { k1, k3, b } => RetrievalModel::bm25(k1, k3, b),
            ModelConfig::Indri { mu, lambda } => RetrievalModel::indri(mu, lambda),
        }
    }
}

impl From<&RetrievalModel> for ModelConfig {
    fn from(model: &RetrievalModel) -> Self {
        match model {
            RetrievalModel::UnrankedBoolean => ModelConfig::UnrankedBoolean,
            RetrievalModel::RankedBoolean => ModelConfig::RankedBoolean,
            RetrievalModel::Bm25(params) => ModelConfig::Bm25 {
                k1: params.k1(),
                k3: params.k3(),
                b: params.b(),
            },
            RetrievalModel::Indri(params) => ModelConfig::Indri {
                mu: params.mu(),
                lambda: params.lambda(),
            },
        }
    }
}

/// Configuration of a batch evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Index snapshot to load.
    pub index_path: PathBuf,
    /// File of `qid:query` lines.
    pub query_file: PathBuf,
    /// TREC run file to write.
    pub output_path: PathBuf,
    /// Retrieval model.
    #[serde(default)]
    pub model: ModelConfig,
    /// Documents kept per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Run tag written in the last TREC column.
    #[serde(default = "default_run_id")]
    pub run_id: String,
}

fn default_max_results() -> usize {
    100
}

fn default_run_id() -> String {
    "run-1".to_string()
}

impl EvalConfig {
    /// Load a configuration file. Files ending in `.json` are read as JSON,
    /// anything else as a `key=value` parameter file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        debug!("loading configuration from {}", path.display());

        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            Self::from_json(&text)
        } else {
            Self::from_key_values(&text)
        }
    }

    /// Parse a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: EvalConfig = serde_json::from_str(text)?;
        config.model.build()?;
        Ok(config)
    }

    /// Parse a `key=value` parameter file.
    pub fn from_key_values(text: &str) -> Result<Self> {
        let params = parse_key_values(text)?;
        let model = RetrievalModel::from_params(&params)?;

        let max_results = match params.get("maxResults") {
            Some(value) => value.trim().parse().map_err(|e| {
                ProximaError::invalid_parameter(format!("maxResults: cannot parse {value:?}: {e}"))
            })?,
            None => default_max_results(),
        };

        Ok(EvalConfig {
            index_path: required_path(&params, "indexPath")?,
            query_file: required_path(&params, "queryFilePath")?,
            output_path: required_path(&params, "trecEvalOutputPath")?,
            model: ModelConfig::from(&model),
            max_results,
            run_id: params.get("runId").cloned().unwrap_or_else(default_run_id),
        })
    }

    /// Build the configured retrieval model.
    pub fn retrieval_model(&self) -> Result<RetrievalModel> {
        self.model.build()
    }
}

/// Parse `key=value` lines. Blank lines and lines starting with `#` are
/// skipped; keys and values are trimmed.
pub fn parse_key_values(text: &str) -> Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            ProximaError::invalid_parameter(format!(
                "line {}: expected key=value, got {line:?}",
                number + 1
            ))
        })?;
        params.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(params)
}

fn required_path(params: &HashMap<String, String>, key: &str) -> Result<PathBuf> {
    params
        .get(key)
        .map(PathBuf::from)
        .ok_or_else(|| ProximaError::invalid_parameter(format!("missing parameter {key}")))
}
