//! The query operator tree.
//!
//! A [`QueryOperator`] is built once per query (usually by the
//! [`QueryParser`](crate::query::parser::QueryParser)) and evaluated
//! bottom-up: every operator evaluates its children first and then merges
//! their results. Leaf and proximity operators produce inverted lists;
//! scoring operators produce score lists under the active
//! [`RetrievalModel`].

use std::fmt;

use log::debug;

use crate::error::{ProximaError, Result};
use crate::index::{IndexReader, InvertedList};
use crate::query::default_score::DefaultScore;
use crate::query::model::RetrievalModel;
use crate::query::score_list::ScoreList;
use crate::query::term::TermOperator;
use crate::query::{boolean, combine, proximity, scorer, term};

/// A node of the query tree.
///
/// Argument order is significant: it fixes the required sequence for
/// `Near` and aligns `weights` with `args` for the weighted operators.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    /// A single term in a field.
    Term(TermOperator),
    /// Union of its arguments' postings, positions merged per document.
    Synonym(Vec<QueryOperator>),
    /// Documents matching every argument.
    And(Vec<QueryOperator>),
    /// Documents matching any argument.
    Or(Vec<QueryOperator>),
    /// Ordered proximity: each argument within `distance` after the previous.
    Near {
        /// Maximum gap between consecutive arguments.
        distance: u32,
        /// Arguments in required order.
        args: Vec<QueryOperator>,
    },
    /// Unordered proximity: all arguments inside a window of `distance` tokens.
    Window {
        /// Maximum span of a match, in tokens.
        distance: u32,
        /// Arguments in any order.
        args: Vec<QueryOperator>,
    },
    /// Turns an inverted list into a score list.
    Score(Box<QueryOperator>),
    /// Additive combination of BM25 scores.
    Sum(Vec<QueryOperator>),
    /// Weighted arithmetic mean of Indri scores.
    WeightedSum {
        /// Arguments.
        args: Vec<QueryOperator>,
        /// One weight per argument.
        weights: Vec<f64>,
    },
    /// Weighted geometric mean of Indri scores.
    WeightedAnd {
        /// Arguments.
        args: Vec<QueryOperator>,
        /// One weight per argument.
        weights: Vec<f64>,
    },
}

/// The materialized result of evaluating an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Docid-ascending postings with positions.
    Postings(InvertedList),
    /// Document scores, plus the score a non-matching document receives.
    Scores {
        /// Matching documents and their scores.
        scores: ScoreList,
        /// Score of documents absent from `scores`.
        default: DefaultScore,
    },
}

impl QueryResult {
    /// Wrap a score list with its default score.
    pub fn scores(scores: ScoreList, default: DefaultScore) -> Self {
        QueryResult::Scores { scores, default }
    }

    /// Number of documents in the result.
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Postings(list) => list.len(),
            QueryResult::Scores { scores, .. } => scores.len(),
        }
    }

    /// Check if the result has no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the inverted list, failing if this is a score list.
    pub fn into_postings(self, operator: &str) -> Result<InvertedList> {
        match self {
            QueryResult::Postings(list) => Ok(list),
            QueryResult::Scores { .. } => Err(ProximaError::malformed_query(format!(
                "{operator} requires arguments that produce inverted lists"
            ))),
        }
    }

    /// Take the score list, scoring an inverted list under `model` first.
    pub fn into_scores(
        self,
        index: &dyn IndexReader,
        model: &RetrievalModel,
    ) -> Result<(ScoreList, DefaultScore)> {
        match self {
            QueryResult::Postings(list) => scorer::score_postings(list, index, model),
            QueryResult::Scores { scores, default } => Ok((scores, default)),
        }
    }
}

impl QueryOperator {
    /// A term in the default field.
    pub fn term<S: Into<String>>(term: S) -> Self {
        QueryOperator::Term(TermOperator::new(term))
    }

    /// A term in a specific field.
    pub fn term_in<T: Into<String>, F: Into<String>>(term: T, field: F) -> Self {
        QueryOperator::Term(TermOperator::new(term).with_field(field))
    }

    /// A `#SYN` operator.
    pub fn synonym(args: Vec<QueryOperator>) -> Self {
        QueryOperator::Synonym(args)
    }

    /// An `#AND` operator.
    pub fn and(args: Vec<QueryOperator>) -> Self {
        QueryOperator::And(args)
    }

    /// An `#OR` operator.
    pub fn or(args: Vec<QueryOperator>) -> Self {
        QueryOperator::Or(args)
    }

    /// A `#NEAR/distance` operator.
    pub fn near(distance: u32, args: Vec<QueryOperator>) -> Self {
        QueryOperator::Near { distance, args }
    }

    /// A `#WINDOW/distance` operator.
    pub fn window(distance: u32, args: Vec<QueryOperator>) -> Self {
        QueryOperator::Window { distance, args }
    }

    /// A `#SCORE` operator.
    pub fn score(arg: QueryOperator) -> Self {
        QueryOperator::Score(Box::new(arg))
    }

    /// A `#SUM` operator.
    pub fn sum(args: Vec<QueryOperator>) -> Self {
        QueryOperator::Sum(args)
    }

    /// A `#WSUM` operator from `(weight, argument)` pairs.
    pub fn weighted_sum(pairs: Vec<(f64, QueryOperator)>) -> Self {
        let (weights, args) = pairs.into_iter().unzip();
        QueryOperator::WeightedSum { args, weights }
    }

    /// A `#WAND` operator from `(weight, argument)` pairs.
    pub fn weighted_and(pairs: Vec<(f64, QueryOperator)>) -> Self {
        let (weights, args) = pairs.into_iter().unzip();
        QueryOperator::WeightedAnd { args, weights }
    }

    /// Get the operator name as written in queries.
    pub fn name(&self) -> &'static str {
        match self {
            QueryOperator::Term(_) => "#TERM",
            QueryOperator::Synonym(_) => "#SYN",
            QueryOperator::And(_) => "#AND",
            QueryOperator::Or(_) => "#OR",
            QueryOperator::Near { .. } => "#NEAR",
            QueryOperator::Window { .. } => "#WINDOW",
            QueryOperator::Score(_) => "#SCORE",
            QueryOperator::Sum(_) => "#SUM",
            QueryOperator::WeightedSum { .. } => "#WSUM",
            QueryOperator::WeightedAnd { .. } => "#WAND",
        }
    }

    /// Check if this operator produces an inverted list rather than scores.
    pub fn produces_postings(&self) -> bool {
        matches!(
            self,
            QueryOperator::Term(_)
                | QueryOperator::Synonym(_)
                | QueryOperator::Near { .. }
                | QueryOperator::Window { .. }
        )
    }

    /// Get the arguments of this operator.
    pub fn args(&self) -> &[QueryOperator] {
        match self {
            QueryOperator::Term(_) => &[],
            QueryOperator::Score(arg) => std::slice::from_ref(arg.as_ref()),
            QueryOperator::Synonym(args)
            | QueryOperator::And(args)
            | QueryOperator::Or(args)
            | QueryOperator::Sum(args)
            | QueryOperator::Near { args, .. }
            | QueryOperator::Window { args, .. }
            | QueryOperator::WeightedSum { args, .. }
            | QueryOperator::WeightedAnd { args, .. } => args,
        }
    }

    /// Evaluate this operator against an index under a retrieval model.
    pub fn evaluate(&self, index: &dyn IndexReader, model: &RetrievalModel) -> Result<QueryResult> {
        self.check_arity()?;

        let result = match self {
            QueryOperator::Term(term) => QueryResult::Postings(term.evaluate(index)?),
            QueryOperator::Synonym(args) => {
                QueryResult::Postings(term::evaluate_synonym(args, index, model)?)
            }
            QueryOperator::And(args) => boolean::evaluate_and(args, index, model)?,
            QueryOperator::Or(args) => boolean::evaluate_or(args, index, model)?,
            QueryOperator::Near { distance, args } => {
                QueryResult::Postings(proximity::evaluate_near(*distance, args, index, model)?)
            }
            QueryOperator::Window { distance, args } => {
                QueryResult::Postings(proximity::evaluate_window(*distance, args, index, model)?)
            }
            QueryOperator::Score(arg) => scorer::evaluate_score(arg, index, model)?,
            QueryOperator::Sum(args) => combine::evaluate_sum(args, index, model)?,
            QueryOperator::WeightedSum { args, weights } => {
                combine::evaluate_weighted_sum(args, weights, index, model)?
            }
            QueryOperator::WeightedAnd { args, weights } => {
                combine::evaluate_weighted_and(args, weights, index, model)?
            }
        };

        debug!("{} produced {} documents", self.name(), result.len());
        Ok(result)
    }

    fn check_arity(&self) -> Result<()> {
        let args = self.args().len();
        match self {
            QueryOperator::Term(_) => Ok(()),
            QueryOperator::Near { .. } | QueryOperator::Window { .. } if args < 2 => {
                Err(ProximaError::malformed_query(format!(
                    "{} requires at least two arguments, got {args}",
                    self.name()
                )))
            }
            QueryOperator::WeightedSum { weights, .. } | QueryOperator::WeightedAnd { weights, .. }
                if weights.len() != args =>
            {
                Err(ProximaError::malformed_query(format!(
                    "{} has {} weights for {args} arguments",
                    self.name(),
                    weights.len()
                )))
            }
            _ if args == 0 => Err(ProximaError::malformed_query(format!(
                "{} requires at least one argument",
                self.name()
            ))),
            _ => Ok(()),
        }
    }
}

/// Evaluate arguments that must all produce inverted lists.
pub(crate) fn evaluate_postings(
    operator: &str,
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<Vec<InvertedList>> {
    let lists = args
        .iter()
        .map(|arg| arg.evaluate(index, model)?.into_postings(operator))
        .collect::<Result<Vec<_>>>()?;

    if let Some(first) = lists.first()
        && let Some(other) = lists.iter().find(|l| l.field() != first.field())
    {
        return Err(ProximaError::malformed_query(format!(
            "{operator} arguments span fields {} and {}",
            first.field(),
            other.field()
        )));
    }

    Ok(lists)
}

/// Evaluate arguments as score lists, scoring inverted lists implicitly.
pub(crate) fn evaluate_scores(
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<Vec<(ScoreList, DefaultScore)>> {
    args.iter()
        .map(|arg| arg.evaluate(index, model)?.into_scores(index, model))
        .collect()
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Term(term) => write!(f, "{term}"),
            QueryOperator::Near { distance, args } => {
                write!(f, "#near/{distance}(")?;
                write_args(f, args)
            }
            QueryOperator::Window { distance, args } => {
                write!(f, "#window/{distance}(")?;
                write_args(f, args)
            }
            QueryOperator::WeightedSum { args, weights }
            | QueryOperator::WeightedAnd { args, weights } => {
                write!(f, "{}(", self.name().to_lowercase())?;
                for (i, (weight, arg)) in weights.iter().zip(args).enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{weight} {arg}")?;
                }
                f.write_str(")")
            }
            _ => {
                write!(f, "{}(", self.name().to_lowercase())?;
                write_args(f, self.args())
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[QueryOperator]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}
