//! Query parser for the structured query language.
//!
//! Supported syntax:
//! - Terms: `apple`, field-qualified terms: `apple.title`
//! - Operators: `#and`, `#or`, `#syn`, `#sum`, `#score`, `#near/K`,
//!   `#window/K`, each followed by a parenthesised argument list
//! - Weighted operators: `#wsum(0.3 apple 0.7 pie)`, `#wand(...)`
//!
//! Operator names are case-insensitive; terms are lowercased. A query that
//! is not a single operator is wrapped in the parser's default operator.

use std::iter::Peekable;
use std::str::Chars;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ProximaError, Result};
use crate::index::DEFAULT_FIELD;
use crate::query::model::RetrievalModel;
use crate::query::operator::QueryOperator;
use crate::query::term::TermOperator;

lazy_static! {
    static ref OPERATOR: Regex =
        Regex::new(r"(?i)^#(and|or|syn|sum|wsum|wand|score|near|window)(?:/(\d+))?$")
            .expect("operator pattern is valid");
}

/// Operator wrapped around unstructured queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultOperator {
    /// `#and`
    And,
    /// `#or`
    Or,
    /// `#sum`
    Sum,
}

impl DefaultOperator {
    /// The default operator conventionally used with a retrieval model.
    pub fn for_model(model: &RetrievalModel) -> Self {
        match model {
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean => DefaultOperator::Or,
            RetrievalModel::Bm25(_) => DefaultOperator::Sum,
            RetrievalModel::Indri(_) => DefaultOperator::And,
        }
    }

    fn wrap(self, args: Vec<QueryOperator>) -> QueryOperator {
        match self {
            DefaultOperator::And => QueryOperator::and(args),
            DefaultOperator::Or => QueryOperator::or(args),
            DefaultOperator::Sum => QueryOperator::sum(args),
        }
    }
}

/// Parser from query strings to operator trees.
#[derive(Debug, Clone)]
pub struct QueryParser {
    /// Field searched by terms without a qualifier.
    default_field: String,
    /// Operator wrapped around unstructured queries.
    default_operator: DefaultOperator,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    /// Create a parser searching `body` with `#or` as the default operator.
    pub fn new() -> Self {
        QueryParser {
            default_field: DEFAULT_FIELD.to_string(),
            default_operator: DefaultOperator::Or,
        }
    }

    /// Create a parser with the default operator for `model`.
    pub fn for_model(model: &RetrievalModel) -> Self {
        Self::new().with_default_operator(DefaultOperator::for_model(model))
    }

    /// Set the field searched by unqualified terms.
    pub fn with_default_field<S: Into<String>>(mut self, field: S) -> Self {
        self.default_field = field.into();
        self
    }

    /// Set the operator wrapped around unstructured queries.
    pub fn with_default_operator(mut self, operator: DefaultOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Get the default field.
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Parse a query string into an operator tree.
    pub fn parse(&self, query_str: &str) -> Result<QueryOperator> {
        let tokens = Tokenizer::new(query_str).tokenize();
        if tokens.is_empty() {
            return Err(ProximaError::malformed_query("empty query"));
        }

        let mut parser = TreeBuilder {
            tokens: tokens.into_iter().peekable(),
            default_field: &self.default_field,
        };

        let mut roots = Vec::new();
        while parser.tokens.peek().is_some() {
            roots.push(parser.parse_expression()?);
        }

        match roots.pop() {
            Some(root) if roots.is_empty() && !matches!(root, QueryOperator::Term(_)) => Ok(root),
            Some(last) => {
                roots.push(last);
                Ok(self.default_operator.wrap(roots))
            }
            None => Err(ProximaError::malformed_query("empty query")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
}

/// Splits a query string on whitespace, commas and parentheses.
struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    fn new(query_str: &'a str) -> Self {
        Tokenizer {
            chars: query_str.chars().peekable(),
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(&ch) = self.chars.peek() {
            match ch {
                '(' => {
                    self.chars.next();
                    tokens.push(Token::Open);
                }
                ')' => {
                    self.chars.next();
                    tokens.push(Token::Close);
                }
                c if c.is_whitespace() || c == ',' => {
                    self.chars.next();
                }
                _ => tokens.push(Token::Word(self.read_word())),
            }
        }
        tokens
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | ',') {
                break;
            }
            word.push(ch);
            self.chars.next();
        }
        word
    }
}

/// Recursive-descent builder over the token stream.
struct TreeBuilder<'a> {
    tokens: Peekable<std::vec::IntoIter<Token>>,
    default_field: &'a str,
}

impl TreeBuilder<'_> {
    fn parse_expression(&mut self) -> Result<QueryOperator> {
        match self.tokens.next() {
            Some(Token::Word(word)) if word.starts_with('#') => self.parse_operator(&word),
            Some(Token::Word(word)) => self.parse_term(&word),
            Some(Token::Open) => Err(ProximaError::parse("unexpected '(' without an operator")),
            Some(Token::Close) => Err(ProximaError::parse("unbalanced ')'")),
            None => Err(ProximaError::parse("unexpected end of query")),
        }
    }

    fn parse_operator(&mut self, word: &str) -> Result<QueryOperator> {
        let captures = OPERATOR
            .captures(word)
            .ok_or_else(|| ProximaError::malformed_query(format!("unknown operator {word}")))?;
        let name = captures[1].to_lowercase();
        let distance = captures
            .get(2)
            .map(|m| {
                m.as_str().parse::<u32>().map_err(|e| {
                    ProximaError::malformed_query(format!("{word}: invalid distance: {e}"))
                })
            })
            .transpose()?;

        if self.tokens.next() != Some(Token::Open) {
            return Err(ProximaError::malformed_query(format!(
                "{word} must be followed by '('"
            )));
        }

        match (name.as_str(), distance) {
            ("near", Some(k)) => Ok(QueryOperator::near(k, self.parse_arguments()?)),
            ("window", Some(k)) => Ok(QueryOperator::window(k, self.parse_arguments()?)),
            ("near" | "window", None) => Err(ProximaError::malformed_query(format!(
                "{word} requires a distance, e.g. #{name}/3"
            ))),
            (_, Some(_)) => Err(ProximaError::malformed_query(format!(
                "#{name} does not take a distance"
            ))),
            ("wsum", None) => Ok(QueryOperator::weighted_sum(self.parse_weighted_arguments()?)),
            ("wand", None) => Ok(QueryOperator::weighted_and(self.parse_weighted_arguments()?)),
            ("score", None) => {
                let mut args = self.parse_arguments()?;
                match (args.pop(), args.is_empty()) {
                    (Some(arg), true) => Ok(QueryOperator::score(arg)),
                    _ => Err(ProximaError::malformed_query(
                        "#score takes exactly one argument",
                    )),
                }
            }
            ("and", None) => Ok(QueryOperator::and(self.parse_arguments()?)),
            ("or", None) => Ok(QueryOperator::or(self.parse_arguments()?)),
            ("syn", None) => Ok(QueryOperator::synonym(self.parse_arguments()?)),
            ("sum", None) => Ok(QueryOperator::sum(self.parse_arguments()?)),
            _ => Err(ProximaError::malformed_query(format!("unknown operator {word}"))),
        }
    }

    /// Parse arguments up to and including the closing parenthesis.
    fn parse_arguments(&mut self) -> Result<Vec<QueryOperator>> {
        let mut args = Vec::new();
        loop {
            match self.tokens.peek() {
                Some(Token::Close) => {
                    self.tokens.next();
                    return Ok(args);
                }
                Some(_) => args.push(self.parse_expression()?),
                None => return Err(ProximaError::parse("missing ')'")),
            }
        }
    }

    fn parse_weighted_arguments(&mut self) -> Result<Vec<(f64, QueryOperator)>> {
        let mut pairs = Vec::new();
        loop {
            let weight = match self.tokens.next() {
                Some(Token::Close) => return Ok(pairs),
                Some(Token::Word(word)) => parse_weight(&word)?,
                Some(Token::Open) => {
                    return Err(ProximaError::malformed_query("expected a weight, found '('"));
                }
                None => return Err(ProximaError::parse("missing ')'")),
            };
            if self.tokens.peek() == Some(&Token::Close) {
                return Err(ProximaError::malformed_query(format!(
                    "weight {weight} has no argument"
                )));
            }
            pairs.push((weight, self.parse_expression()?));
        }
    }

    fn parse_term(&self, word: &str) -> Result<QueryOperator> {
        let (term, field) = match word.split_once('.') {
            Some((term, field)) => (term, field),
            None => (word, self.default_field),
        };
        if term.is_empty() || field.is_empty() {
            return Err(ProximaError::malformed_query(format!("invalid term {word}")));
        }
        Ok(QueryOperator::Term(
            TermOperator::new(term.to_lowercase()).with_field(field),
        ))
    }
}

fn parse_weight(word: &str) -> Result<f64> {
    let weight: f64 = word
        .parse()
        .map_err(|_| ProximaError::malformed_query(format!("expected a weight, found {word}")))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(ProximaError::malformed_query(format!(
            "weights must be finite and non-negative, got {word}"
        )));
    }
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> QueryOperator {
        QueryParser::new().parse(query).unwrap()
    }

    fn parse_err(query: &str) -> ProximaError {
        QueryParser::new().parse(query).unwrap_err()
    }

    #[test]
    fn test_unstructured_query_is_wrapped() {
        assert_eq!(
            parse("Apple pie"),
            QueryOperator::or(vec![QueryOperator::term("apple"), QueryOperator::term("pie")])
        );
        assert_eq!(parse("apple"), QueryOperator::or(vec![QueryOperator::term("apple")]));
        assert_eq!(
            parse("#and(apple) pie"),
            QueryOperator::or(vec![
                QueryOperator::and(vec![QueryOperator::term("apple")]),
                QueryOperator::term("pie"),
            ])
        );
        assert_eq!(
            parse("#syn(a b) #near/2(c d)").to_string(),
            "#or(#syn(a b) #near/2(c d))"
        );

        let indri = RetrievalModel::indri(2500.0, 0.4).unwrap();
        let query = QueryParser::for_model(&indri).parse("apple pie").unwrap();
        assert_eq!(query.name(), "#AND");

        let bm25 = RetrievalModel::bm25(1.2, 0.0, 0.75).unwrap();
        let query = QueryParser::for_model(&bm25).parse("apple pie").unwrap();
        assert_eq!(query.name(), "#SUM");
    }

    #[test]
    fn test_structured_query() {
        let query = parse("#AND(#near/3(apple pie.title) #SYN(car, auto))");
        assert_eq!(
            query,
            QueryOperator::and(vec![
                QueryOperator::near(
                    3,
                    vec![QueryOperator::term("apple"), QueryOperator::term_in("pie", "title")]
                ),
                QueryOperator::synonym(vec![
                    QueryOperator::term("car"),
                    QueryOperator::term("auto")
                ]),
            ])
        );
    }

    #[test]
    fn test_weighted_query() {
        let query = parse("#wsum(0.3 apple 0.7 #window/5(a b))");
        assert_eq!(
            query,
            QueryOperator::weighted_sum(vec![
                (0.3, QueryOperator::term("apple")),
                (
                    0.7,
                    QueryOperator::window(
                        5,
                        vec![QueryOperator::term("a"), QueryOperator::term("b")]
                    )
                ),
            ])
        );
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "#and(apple #near/3(a b.title) #wsum(0.3 x 0.7 y))",
            "#wand(1 #score(#syn(car auto)) 2.5 z)",
            "#sum(a.url b)",
        ] {
            let query = parse(text);
            assert_eq!(query.to_string(), text);
            assert_eq!(parse(&query.to_string()), query);
        }
    }

    #[test]
    fn test_malformed_queries() {
        for text in [
            "",
            "   ",
            "#and(apple",
            "#and(apple))",
            "apple)",
            "#foo(apple)",
            "#near(a b)",
            "#and/3(a b)",
            "#wsum(apple 0.5)",
            "#wsum(0.5 apple 0.5)",
            "#wsum(-1 apple)",
            "#score(a b)",
            "(apple)",
            ".title",
            "apple.",
        ] {
            let err = parse_err(text);
            assert!(matches!(err, ProximaError::MalformedQuery(_)), "{text:?}: {err}");
        }
    }

    #[test]
    fn test_default_field() {
        let parser = QueryParser::new().with_default_field("title");
        assert_eq!(parser.default_field(), "title");
        assert_eq!(
            parser.parse("#and(apple)").unwrap(),
            QueryOperator::and(vec![QueryOperator::term_in("apple", "title")])
        );
    }
}
