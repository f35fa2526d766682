//! Integration tests for operator evaluation across retrieval models.

use proxima::prelude::*;
use proxima::query::{DefaultScore, QueryResult};

fn postings(index: &MemoryIndex, query: &QueryOperator) -> Result<InvertedList> {
    query
        .evaluate(index, &RetrievalModel::UnrankedBoolean)?
        .into_postings("test")
}

fn scores(index: &MemoryIndex, model: RetrievalModel, query: &QueryOperator) -> Result<ScoreList> {
    Searcher::new(index, model).search(query)
}

fn term(t: &str) -> QueryOperator {
    QueryOperator::term(t)
}

/// One document with "a" at positions 1 and 10 and "b" at 2 and 11.
fn near_index() -> Result<MemoryIndex> {
    let mut index = MemoryIndex::new();
    index.add_document("d0", &[("body", "a b x x x x x x x a b")])?;
    Ok(index)
}

#[test]
fn test_near_matches_each_pair() -> Result<()> {
    let index = near_index()?;

    let near = postings(&index, &QueryOperator::near(2, vec![term("a"), term("b")]))?;
    assert_eq!(near.len(), 1);
    assert_eq!(near.postings()[0].term_freq, 2);
    assert_eq!(near.postings()[0].positions(), &[2, 11]);

    let near = postings(&index, &QueryOperator::near(1, vec![term("a"), term("b")]))?;
    assert_eq!(near.postings()[0].term_freq, 2);

    Ok(())
}

#[test]
fn test_window_is_order_independent() -> Result<()> {
    let mut index = MemoryIndex::new();
    index.add_document("d0", &[("body", "x x b x a")])?;

    for args in [vec![term("a"), term("b")], vec![term("b"), term("a")]] {
        let window = postings(&index, &QueryOperator::window(3, args))?;
        assert_eq!(window.len(), 1, "window should match in either order");
        assert_eq!(window.postings()[0].positions(), &[5]);
    }

    let near = postings(&index, &QueryOperator::near(3, vec![term("a"), term("b")]))?;
    assert!(near.is_empty());

    Ok(())
}

#[test]
fn test_indri_default_score_below_match_and_monotone_in_mu() -> Result<()> {
    let mut index = MemoryIndex::new();
    index.add_document("with", &[("body", "apple pie crust")])?;
    index.add_document("without", &[("body", "lemon pie crust")])?;
    let query = QueryOperator::and(vec![term("apple")]);

    let mut previous_default = None;
    for mu in [10.0, 100.0, 1000.0] {
        let model = RetrievalModel::indri(mu, 0.4)?;
        let result = query.evaluate(&index, &model)?;
        let QueryResult::Scores { scores, default } = result else {
            panic!("expected scores");
        };
        let matched = scores.score_of(0).unwrap();
        let missing = default.score(1, &index, &model)?;

        assert!(missing > 0.0);
        assert!(missing < matched, "mu = {mu}");
        if let Some(previous) = previous_default {
            assert!(missing > previous, "default score should rise with mu");
        }
        previous_default = Some(missing);
    }

    Ok(())
}

#[test]
fn test_wand_collapses_where_wsum_averages() -> Result<()> {
    let mut index = MemoryIndex::new();
    let mut filler = vec!["common"; 200];
    index.add_document("d", &[("body", "hot hot hot hot hot")])?;
    filler[0] = "cold";
    index.add_document("e", &[("body", filler.join(" ").as_str())])?;
    let model = RetrievalModel::indri(1.0, 0.01)?;

    let pairs = || vec![(1.0, term("hot")), (1.0, term("cold"))];
    let wand = scores(&index, model, &QueryOperator::weighted_and(pairs()))?;
    let wsum = scores(&index, model, &QueryOperator::weighted_sum(pairs()))?;

    let wand_d = wand.score_of(0).unwrap();
    let wsum_d = wsum.score_of(0).unwrap();
    assert!(wsum_d > 0.4, "wsum = {wsum_d}");
    assert!(wand_d < wsum_d / 2.0, "wand = {wand_d}, wsum = {wsum_d}");

    Ok(())
}

#[test]
fn test_bm25_sum_prefers_rare_terms() -> Result<()> {
    let mut index = MemoryIndex::new();
    index.add_document("d0", &[("body", "common rare")])?;
    index.add_document("d1", &[("body", "common common")])?;
    index.add_document("d2", &[("body", "common filler")])?;
    index.add_document("d3", &[("body", "filler filler")])?;
    index.add_document("d4", &[("body", "filler other")])?;
    let model = RetrievalModel::bm25(1.2, 0.0, 0.75)?;

    let result = scores(&index, model, &QueryOperator::sum(vec![term("common"), term("rare")]))?;
    let ranked = rank(&result, &index, 10)?;
    assert_eq!(ranked[0].external_id, "d0");

    Ok(())
}

#[test]
fn test_unsupported_combinations() -> Result<()> {
    let index = near_index()?;
    let bm25 = RetrievalModel::bm25(1.2, 0.0, 0.75)?;

    let cases = [
        (RetrievalModel::UnrankedBoolean, QueryOperator::weighted_and(vec![(1.0, term("a"))])),
        (RetrievalModel::RankedBoolean, QueryOperator::weighted_sum(vec![(1.0, term("a"))])),
        (RetrievalModel::RankedBoolean, QueryOperator::sum(vec![term("a")])),
        (bm25, QueryOperator::or(vec![term("a")])),
        (bm25, QueryOperator::and(vec![term("a")])),
    ];
    for (model, query) in cases {
        let err = query.evaluate(&index, &model).unwrap_err();
        assert!(
            matches!(err, ProximaError::UnsupportedCombination { .. }),
            "{query} under {model}: {err}"
        );
    }

    Ok(())
}

#[test]
fn test_evaluation_is_idempotent() -> Result<()> {
    let mut index = MemoryIndex::new();
    index.add_document("d0", &[("body", "red green blue"), ("title", "colors")])?;
    index.add_document("d1", &[("body", "green blue green")])?;
    index.add_document("d2", &[("body", "blue")])?;

    let model = RetrievalModel::indri(50.0, 0.3)?;
    let query = QueryParser::for_model(&model).parse(
        "#wand(2 #near/1(green blue) 1 #syn(red green) 0.5 #window/4(blue red))",
    )?;

    let first = scores(&index, model, &query)?;
    let second = scores(&index, model, &query)?;
    assert_eq!(first, second);
    assert!(!first.is_empty());

    Ok(())
}

#[test]
fn test_nested_indri_defaults_stay_positive() -> Result<()> {
    let mut index = MemoryIndex::new();
    index.add_document("d0", &[("body", "alpha beta")])?;
    index.add_document("d1", &[("body", "gamma delta")])?;
    index.add_document("d2", &[("body", "beta gamma")])?;
    let model = RetrievalModel::indri(20.0, 0.5)?;

    let query = QueryOperator::weighted_sum(vec![
        (0.7, QueryOperator::and(vec![term("alpha"), term("beta")])),
        (0.3, QueryOperator::weighted_and(vec![(1.0, term("gamma")), (3.0, term("delta"))])),
    ]);
    let result = query.evaluate(&index, &model)?;
    let QueryResult::Scores { scores, default } = result else {
        panic!("expected scores");
    };

    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|e| e.score.is_finite() && e.score > 0.0));
    assert!(matches!(default, DefaultScore::ArithmeticMean(_)));

    Ok(())
}

#[test]
fn test_outputs_are_docid_ascending() -> Result<()> {
    let mut index = MemoryIndex::new();
    for i in 0..20 {
        let text = if i % 3 == 0 { "x y" } else if i % 3 == 1 { "y" } else { "x" };
        index.add_document(format!("d{i}"), &[("body", text)])?;
    }

    for (model, query) in [
        (RetrievalModel::RankedBoolean, QueryOperator::or(vec![term("x"), term("y")])),
        (RetrievalModel::RankedBoolean, QueryOperator::and(vec![term("x"), term("y")])),
        (RetrievalModel::bm25(1.2, 0.0, 0.75)?, QueryOperator::sum(vec![term("y"), term("x")])),
        (RetrievalModel::indri(10.0, 0.5)?, QueryOperator::and(vec![term("y"), term("x")])),
    ] {
        let list = scores(&index, model, &query)?;
        let docs: Vec<DocId> = list.iter().map(|e| e.doc_id).collect();
        assert!(docs.windows(2).all(|w| w[0] < w[1]), "{query} under {model}");
    }

    Ok(())
}
