//! Query operators, retrieval models and scoring.

mod boolean;
mod combine;
pub mod cursor;
pub mod default_score;
pub mod model;
pub mod operator;
pub mod parser;
mod proximity;
pub mod score_list;
pub mod scorer;
pub mod term;

pub use self::cursor::{DocCursor, Intersection, PositionCursor, Union, merge_positions};
pub use self::default_score::DefaultScore;
pub use self::model::{Bm25Params, IndriParams, RetrievalModel};
pub use self::operator::{QueryOperator, QueryResult};
pub use self::parser::{DefaultOperator, QueryParser};
pub use self::proximity::{near_positions, window_positions};
pub use self::score_list::{ScoreEntry, ScoreList};
pub use self::scorer::{BooleanScorer, Bm25Scorer, IndriScorer, Scorer, score_postings};
pub use self::term::TermOperator;
