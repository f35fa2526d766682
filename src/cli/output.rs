//! Output formatting for CLI commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, ProximaArgs};
use crate::error::Result;
use crate::search::RankedDocument;

/// Result structure for index building.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexSummary {
    pub output_path: String,
    pub documents: u64,
    pub fields: Vec<String>,
    pub duration_ms: u64,
}

/// Result structure for a single search.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub model: String,
    pub total_hits: usize,
    pub duration_ms: u64,
    pub results: Vec<RankedDocument>,
}

/// Result structure for batch evaluation.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub output_path: String,
    pub model: String,
    pub queries: usize,
    pub lines_written: usize,
    pub duration_ms: u64,
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &ProximaArgs) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            print!("{result}");
        }
        OutputFormat::Json => println!("{}", to_json(result, args.pretty)?),
    }
    Ok(())
}

fn to_json<T: Serialize>(result: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(json)
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Index written to: {}", self.output_path)?;
        writeln!(f, "Documents: {}", self.documents)?;
        writeln!(f, "Fields: {}", self.fields.join(", "))?;
        writeln!(f, "Build time: {}ms", self.duration_ms)
    }
}

impl fmt::Display for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Results ({}):", self.model)?;
        writeln!(f, "═══════════════")?;
        for doc in &self.results {
            writeln!(f, "{:>4}. {:<24} {:.6}", doc.rank, doc.external_id, doc.score)?;
        }
        writeln!(f)?;
        writeln!(f, "Total hits: {}", self.total_hits)?;
        writeln!(f, "Search time: {}ms", self.duration_ms)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Queries evaluated: {} ({})", self.queries, self.model)?;
        writeln!(f, "Run file: {} ({} lines)", self.output_path, self.lines_written)?;
        writeln!(f, "Total time: {}ms", self.duration_ms)
    }
}
