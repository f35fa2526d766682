//! Proximity operators: `#NEAR/k` and `#WINDOW/k`.
//!
//! Both intersect their arguments' inverted lists and then match positions
//! inside each shared document. A match consumes one position from every
//! argument, so matches never overlap. The derived posting records one
//! position per match.

use crate::error::Result;
use crate::index::{DEFAULT_FIELD, IndexReader, InvertedList, Position, Posting};
use crate::query::cursor::{Intersection, PositionCursor};
use crate::query::model::RetrievalModel;
use crate::query::operator::{QueryOperator, evaluate_postings};

/// Evaluate a `#NEAR/distance` operator.
pub(crate) fn evaluate_near(
    distance: u32,
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<InvertedList> {
    evaluate_proximity("#NEAR", distance, args, index, model, near_positions)
}

/// Evaluate a `#WINDOW/distance` operator.
pub(crate) fn evaluate_window(
    distance: u32,
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
) -> Result<InvertedList> {
    evaluate_proximity("#WINDOW", distance, args, index, model, window_positions)
}

fn evaluate_proximity(
    operator: &str,
    distance: u32,
    args: &[QueryOperator],
    index: &dyn IndexReader,
    model: &RetrievalModel,
    matcher: fn(&[&[Position]], u32) -> Vec<Position>,
) -> Result<InvertedList> {
    let lists = evaluate_postings(operator, args, index, model)?;
    let field = lists.first().map_or(DEFAULT_FIELD, |l| l.field());
    let mut result = InvertedList::new(field);

    let slices: Vec<&[Posting]> = lists.iter().map(InvertedList::postings).collect();
    for (doc_id, postings) in Intersection::new(slices) {
        let positions: Vec<&[Position]> = postings.iter().map(|p| p.positions()).collect();
        let matches = matcher(&positions, distance);
        if !matches.is_empty() {
            result.append_posting(Posting::new(doc_id, matches));
        }
    }

    Ok(result)
}

/// Result of trying to extend a match from one anchor position.
enum Step {
    /// Every follower lined up; holds the last argument's position.
    Matched(Position),
    /// Some follower is too far from its predecessor.
    Missed,
    /// Some follower has no positions left.
    Exhausted,
}

fn extend_match(anchor: Position, followers: &mut [PositionCursor<'_>], distance: u32) -> Step {
    let mut previous = anchor;
    for cursor in followers.iter_mut() {
        loop {
            match cursor.current() {
                None => return Step::Exhausted,
                Some(position) if position <= previous => cursor.advance(),
                Some(position) if position - previous <= distance => {
                    previous = position;
                    break;
                }
                Some(_) => return Step::Missed,
            }
        }
    }
    Step::Matched(previous)
}

/// Ordered proximity matching within one document.
///
/// Each argument must occur after the previous one, at most `distance`
/// positions later. Returns the position of the last argument of every
/// match.
pub fn near_positions(positions: &[&[Position]], distance: u32) -> Vec<Position> {
    let Some((first, rest)) = positions.split_first() else {
        return Vec::new();
    };
    let mut lead = PositionCursor::new(first);
    let mut followers: Vec<PositionCursor<'_>> =
        rest.iter().map(|p| PositionCursor::new(p)).collect();

    let mut matches = Vec::new();
    while let Some(anchor) = lead.current() {
        match extend_match(anchor, &mut followers, distance) {
            Step::Matched(position) => {
                matches.push(position);
                followers.iter_mut().for_each(PositionCursor::advance);
            }
            Step::Missed => {}
            Step::Exhausted => break,
        }
        lead.advance();
    }
    matches
}

/// Unordered proximity matching within one document.
///
/// A match is one position per argument, in any order, spanning at most
/// `distance` positions (`max - min + 1 <= distance`). Returns the largest
/// position of every match.
pub fn window_positions(positions: &[&[Position]], distance: u32) -> Vec<Position> {
    let mut cursors: Vec<PositionCursor<'_>> =
        positions.iter().map(|p| PositionCursor::new(p)).collect();
    let mut matches = Vec::new();
    if cursors.is_empty() {
        return matches;
    }

    loop {
        let mut min: Option<(Position, usize)> = None;
        let mut max: Position = 0;
        for (i, cursor) in cursors.iter().enumerate() {
            let Some(position) = cursor.current() else {
                return matches;
            };
            if min.is_none_or(|(lowest, _)| position < lowest) {
                min = Some((position, i));
            }
            max = max.max(position);
        }

        let Some((lowest, lowest_arg)) = min else {
            return matches;
        };
        let span = u64::from(max - lowest) + 1;
        if span <= u64::from(distance) {
            matches.push(max);
            cursors.iter_mut().for_each(PositionCursor::advance);
        } else {
            cursors[lowest_arg].advance();
        }
    }
}
