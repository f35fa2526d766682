//! Command implementations for the Proxima CLI.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use log::{debug, info};
use rayon::prelude::*;
use serde::Deserialize;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EvalConfig;
use crate::error::{ProximaError, Result};
use crate::index::{IndexReader, MemoryIndex};
use crate::query::{QueryParser, RetrievalModel};
use crate::search::{Searcher, rank, trec_lines};

/// Execute a CLI command.
pub fn execute_command(args: ProximaArgs) -> Result<()> {
    match &args.command {
        Command::Index(index_args) => build_index(index_args, &args),
        Command::Search(search_args) => search_index(search_args, &args),
        Command::Batch(batch_args) => run_batch(batch_args, &args),
    }
}

/// One line of a document file.
#[derive(Debug, Deserialize)]
struct DocumentRecord {
    id: String,
    fields: BTreeMap<String, String>,
}

/// Build an index snapshot from a JSON Lines document file.
fn build_index(args: &IndexArgs, cli_args: &ProximaArgs) -> Result<()> {
    let start_time = Instant::now();
    let index = read_documents(&args.document_file)?;

    index.save(&args.output)?;
    info!("indexed {} documents", index.doc_count());

    output_result(
        "Index built successfully",
        &IndexSummary {
            output_path: args.output.display().to_string(),
            documents: index.doc_count(),
            fields: index.field_names().map(str::to_string).collect(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Load a JSON Lines document file into a new index.
///
/// Each non-blank line is `{"id": "...", "fields": {"body": "...", ...}}`
/// with pre-analyzed, whitespace-separated tokens.
pub fn read_documents<P: AsRef<Path>>(path: P) -> Result<MemoryIndex> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open document file {}", path.display()))?;

    let mut index = MemoryIndex::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DocumentRecord = serde_json::from_str(&line).map_err(|e| {
            ProximaError::invalid_parameter(format!(
                "{} line {}: {e}",
                path.display(),
                line_num + 1
            ))
        })?;
        let fields: Vec<(&str, &str)> = record
            .fields
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
            .collect();
        index.add_document(record.id, &fields)?;
    }

    Ok(index)
}

/// Evaluate one query.
fn search_index(args: &SearchArgs, cli_args: &ProximaArgs) -> Result<()> {
    let model = args.model.to_config().build()?;
    let index = MemoryIndex::load(&args.index)?;

    let start_time = Instant::now();
    let tree = QueryParser::for_model(&model).parse(&args.query)?;
    debug!("parsed query: {tree}");

    let searcher = Searcher::new(&index, model);
    let scores = searcher.search(&tree)?;
    let total_hits = scores.len();
    let results = rank(&scores, &index, args.max_results)?;

    output_result(
        &format!("Query: {tree}"),
        &SearchResults {
            query: tree.to_string(),
            model: model.to_string(),
            total_hits,
            duration_ms: start_time.elapsed().as_millis() as u64,
            results,
        },
        cli_args,
    )
}

/// Evaluate every query of a query file and write a TREC run file.
fn run_batch(args: &BatchArgs, cli_args: &ProximaArgs) -> Result<()> {
    let mut config = EvalConfig::load(&args.params)?;
    if let Some(max_results) = args.max_results {
        config.max_results = max_results;
    }
    let model = config.retrieval_model()?;
    let index = MemoryIndex::load(&config.index_path)?;
    let queries = read_queries(&config.query_file)?;
    info!("evaluating {} queries under {model}", queries.len());

    let start_time = Instant::now();
    let lines = evaluate_queries(&index, model, &queries, config.max_results, &config.run_id)?;

    write_run_file(&config.output_path, &lines)
        .with_context(|| format!("cannot write run file {}", config.output_path.display()))?;

    output_result(
        "Batch evaluation finished",
        &BatchSummary {
            output_path: config.output_path.display().to_string(),
            model: model.to_string(),
            queries: queries.len(),
            lines_written: lines.len(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

fn write_run_file(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

/// Read `qid:query` lines, skipping blank lines.
pub fn read_queries<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let text = fs::read_to_string(path)?;
    parse_queries(&text)
}

/// Parse `qid:query` lines, skipping blank lines.
pub fn parse_queries(text: &str) -> Result<Vec<(String, String)>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_num, line)| {
            let (qid, query) = line.split_once(':').ok_or_else(|| {
                ProximaError::malformed_query(format!(
                    "line {}: expected qid:query, got {line:?}",
                    line_num + 1
                ))
            })?;
            Ok((qid.trim().to_string(), query.trim().to_string()))
        })
        .collect()
}

/// Evaluate queries in parallel against a shared index and return their TREC
/// lines in input order.
pub fn evaluate_queries(
    index: &MemoryIndex,
    model: RetrievalModel,
    queries: &[(String, String)],
    max_results: usize,
    run_id: &str,
) -> Result<Vec<String>> {
    let parser = QueryParser::for_model(&model);
    let searcher = Searcher::new(index, model);

    let per_query = queries
        .par_iter()
        .map(|(qid, query)| {
            let tree = parser.parse(query)?;
            let scores = searcher.search(&tree)?;
            let ranked = rank(&scores, index, max_results)?;
            debug!("query {qid}: {} documents", scores.len());
            Ok(trec_lines(qid, &ranked, run_id))
        })
        .collect::<Result<Vec<Vec<String>>>>()?;

    Ok(per_query.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    fn index() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document("d0", &[("body", "apple pie")]).unwrap();
        index.add_document("d1", &[("body", "apple tart")]).unwrap();
        index
    }

    #[test]
    fn test_parse_queries() {
        let queries = parse_queries("10:apple pie\n\n11: #and(a b)\n").unwrap();
        assert_eq!(
            queries,
            vec![
                ("10".to_string(), "apple pie".to_string()),
                ("11".to_string(), "#and(a b)".to_string())
            ]
        );
        assert!(parse_queries("no separator").is_err());
    }

    #[test]
    fn test_evaluate_queries_keeps_input_order() {
        let index = index();
        let queries = vec![
            ("3".to_string(), "tart".to_string()),
            ("1".to_string(), "zzz".to_string()),
            ("2".to_string(), "apple".to_string()),
        ];
        let lines = evaluate_queries(
            &index,
            RetrievalModel::UnrankedBoolean,
            &queries,
            10,
            "run-1",
        )
        .unwrap();
        assert_eq!(
            lines,
            vec![
                "3 Q0 d1 1 1 run-1",
                "1 Q0 dummy 1 0 run-1",
                "2 Q0 d0 1 1 run-1",
                "2 Q0 d1 2 1 run-1",
            ]
        );
    }

    #[test]
    fn test_read_documents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs.jsonl");
        fs::write(
            &path,
            "{\"id\": \"a\", \"fields\": {\"body\": \"apple pie\", \"title\": \"pie\"}}\n\n\
             {\"id\": \"b\", \"fields\": {\"body\": \"tart\"}}\n",
        )
        .unwrap();

        let index = read_documents(&path).unwrap();
        assert_eq!(index.doc_count(), 2);
        assert_eq!(index.internal_id("b"), Some(1));
        assert_eq!(index.field_names().collect::<Vec<_>>(), vec!["body", "title"]);

        fs::write(&path, "{\"id\": \"a\"}\n").unwrap();
        let err = read_documents(&path).unwrap_err();
        assert!(matches!(err, ProximaError::InvalidParameter(_)));
    }

    #[test]
    fn test_io_failures_name_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.jsonl");

        let err = read_documents(&missing).unwrap_err();
        assert!(matches!(err, ProximaError::Anyhow(_)));
        assert!(err.to_string().contains("cannot open document file"));
        assert!(err.to_string().contains("missing.jsonl"));

        let index_path = temp_dir.path().join("index.json");
        let query_path = temp_dir.path().join("queries.txt");
        let params_path = temp_dir.path().join("run.params");
        let run_path = temp_dir.path().join("no-such-dir").join("run.txt");
        index().save(&index_path).unwrap();
        fs::write(&query_path, "1:apple\n").unwrap();
        fs::write(
            &params_path,
            format!(
                "indexPath={}\nqueryFilePath={}\ntrecEvalOutputPath={}\n",
                index_path.display(),
                query_path.display(),
                run_path.display()
            ),
        )
        .unwrap();

        let args = ProximaArgs::try_parse_from([
            "proxima",
            "-q",
            "batch",
            "--params",
            params_path.to_str().unwrap(),
        ])
        .unwrap();
        let err = execute_command(args).unwrap_err();
        assert!(matches!(err, ProximaError::Anyhow(_)));
        assert!(err.to_string().contains("cannot write run file"));
    }

    #[test]
    fn test_malformed_query_fails_the_batch() {
        let index = index();
        let queries = vec![("1".to_string(), "#and(apple".to_string())];
        let err = evaluate_queries(&index, RetrievalModel::UnrankedBoolean, &queries, 10, "r")
            .unwrap_err();
        assert!(matches!(err, ProximaError::MalformedQuery(_)));
    }
}
