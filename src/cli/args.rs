//! Command line argument parsing for the Proxima CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;

/// Proxima - structured query evaluation over an inverted index
#[derive(Parser, Debug, Clone)]
#[command(name = "proxima")]
#[command(about = "Evaluate structured Boolean, BM25 and Indri queries over an inverted index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ProximaArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ProximaArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n + 1,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build an index snapshot from a JSON Lines document file
    Index(IndexArgs),

    /// Evaluate one query and print the ranking
    Search(SearchArgs),

    /// Evaluate a query file and write a TREC run file
    Batch(BatchArgs),
}

/// Arguments for building an index
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// Document file, one `{"id": ..., "fields": {...}}` object per line
    #[arg(value_name = "DOCUMENT_FILE")]
    pub document_file: PathBuf,

    /// Where to write the index snapshot (JSON)
    #[arg(short, long, value_name = "INDEX_FILE")]
    pub output: PathBuf,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Index snapshot (JSON)
    #[arg(short, long, value_name = "INDEX_FILE")]
    pub index: PathBuf,

    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Retrieval model and its parameters
    #[command(flatten)]
    pub model: ModelArgs,

    /// Maximum number of results to return
    #[arg(short = 'n', long, default_value = "10")]
    pub max_results: usize,
}

/// Retrieval model selection
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Retrieval model
    #[arg(short, long, default_value = "unranked-boolean")]
    pub model: ModelKind,

    /// BM25 k_1
    #[arg(long, default_value = "1.2")]
    pub k1: f64,

    /// BM25 k_3
    #[arg(long, default_value = "0.0")]
    pub k3: f64,

    /// BM25 b
    #[arg(long, default_value = "0.75")]
    pub b: f64,

    /// Indri mu
    #[arg(long, default_value = "2500")]
    pub mu: f64,

    /// Indri lambda
    #[arg(long, default_value = "0.4")]
    pub lambda: f64,
}

impl ModelArgs {
    /// Convert to a model configuration; parameters of other models are ignored.
    pub fn to_config(&self) -> ModelConfig {
        match self.model {
            ModelKind::UnrankedBoolean => ModelConfig::UnrankedBoolean,
            ModelKind::RankedBoolean => ModelConfig::RankedBoolean,
            ModelKind::Bm25 => ModelConfig::Bm25 {
                k1: self.k1,
                k3: self.k3,
                b: self.b,
            },
            ModelKind::Indri => ModelConfig::Indri {
                mu: self.mu,
                lambda: self.lambda,
            },
        }
    }
}

/// Retrieval models selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Every match scores 1
    UnrankedBoolean,
    /// Matches score by term frequency
    RankedBoolean,
    /// Okapi BM25
    Bm25,
    /// Indri query likelihood
    Indri,
}

/// Arguments for batch evaluation
#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    /// Parameter file (`key=value`, or JSON when it ends in `.json`)
    #[arg(short, long, value_name = "PARAM_FILE")]
    pub params: PathBuf,

    /// Override the number of documents kept per query
    #[arg(short = 'n', long)]
    pub max_results: Option<usize>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
