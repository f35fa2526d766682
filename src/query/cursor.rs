//! Cursors and merge-joins over materialized operator results.
//!
//! A [`DocCursor`] is a read position into one child's docid-ascending
//! result. It only moves forward. [`Intersection`] and [`Union`] drive a set
//! of cursors in lockstep to produce the documents shared by every child or
//! present in any child. [`PositionCursor`] plays the same role over the
//! position sequence of a single posting.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::index::{DocId, Position, Posting};
use crate::query::score_list::ScoreEntry;

/// An entry keyed by document id.
pub trait DocEntry {
    /// The entry's document id.
    fn doc_id(&self) -> DocId;
}

impl DocEntry for Posting {
    fn doc_id(&self) -> DocId {
        self.doc_id
    }
}

impl DocEntry for ScoreEntry {
    fn doc_id(&self) -> DocId {
        self.doc_id
    }
}

/// Forward-only read position into a docid-ascending slice.
#[derive(Debug)]
pub struct DocCursor<'a, T> {
    entries: &'a [T],
    next: usize,
}

impl<'a, T: DocEntry> DocCursor<'a, T> {
    /// Create a cursor positioned at the first entry.
    pub fn new(entries: &'a [T]) -> Self {
        DocCursor { entries, next: 0 }
    }

    /// Entry under the cursor, or `None` once exhausted.
    pub fn current(&self) -> Option<&'a T> {
        self.entries.get(self.next)
    }

    /// Document id under the cursor.
    pub fn doc_id(&self) -> Option<DocId> {
        self.current().map(DocEntry::doc_id)
    }

    /// Move to the next entry.
    pub fn advance(&mut self) {
        if self.next < self.entries.len() {
            self.next += 1;
        }
    }

    /// Move to the first entry whose docid is `>= target` and return it.
    pub fn advance_to(&mut self, target: DocId) -> Option<&'a T> {
        while let Some(entry) = self.current() {
            if entry.doc_id() >= target {
                return Some(entry);
            }
            self.next += 1;
        }
        None
    }

    /// Check if every entry has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.entries.len()
    }
}

/// Forward-only read position into an ascending position sequence.
#[derive(Debug)]
pub struct PositionCursor<'a> {
    positions: &'a [Position],
    next: usize,
}

impl<'a> PositionCursor<'a> {
    /// Create a cursor at the first position.
    pub fn new(positions: &'a [Position]) -> Self {
        PositionCursor { positions, next: 0 }
    }

    /// Position under the cursor.
    pub fn current(&self) -> Option<Position> {
        self.positions.get(self.next).copied()
    }

    /// Move to the next position.
    pub fn advance(&mut self) {
        if self.next < self.positions.len() {
            self.next += 1;
        }
    }

    /// Check if every position has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.positions.len()
    }
}

/// Outcome of aligning the non-leading cursors on a candidate document.
enum Alignment {
    /// Every cursor sits on the candidate.
    Matched,
    /// Some cursor passed the candidate; no document before this one can match.
    Missed(DocId),
    /// Some cursor ran out; nothing else can match.
    Exhausted,
}

/// K-way intersection of docid-ascending lists.
///
/// Cursors are visited shortest list first, which only affects cost. Each
/// item holds the matching entry of every list in the original argument
/// order.
#[derive(Debug)]
pub struct Intersection<'a, T> {
    cursors: Vec<DocCursor<'a, T>>,
    order: Vec<usize>,
    exhausted: bool,
}

impl<'a, T: DocEntry> Intersection<'a, T> {
    /// Create an intersection over the given lists.
    pub fn new(lists: Vec<&'a [T]>) -> Self {
        let mut order: Vec<usize> = (0..lists.len()).collect();
        order.sort_by_key(|&i| lists[i].len());
        let exhausted = lists.is_empty();
        Intersection {
            cursors: lists.into_iter().map(DocCursor::new).collect(),
            order,
            exhausted,
        }
    }

    fn align(&mut self, target: DocId) -> Alignment {
        for &j in &self.order[1..] {
            match self.cursors[j].advance_to(target) {
                None => return Alignment::Exhausted,
                Some(entry) if entry.doc_id() > target => {
                    return Alignment::Missed(entry.doc_id());
                }
                Some(_) => {}
            }
        }
        Alignment::Matched
    }
}

impl<'a, T: DocEntry> Iterator for Intersection<'a, T> {
    type Item = (DocId, Vec<&'a T>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let lead = self.order[0];

        loop {
            let Some(candidate) = self.cursors[lead].current() else {
                self.exhausted = true;
                return None;
            };
            let doc_id = candidate.doc_id();

            match self.align(doc_id) {
                Alignment::Matched => {
                    let entries: Vec<&'a T> =
                        self.cursors.iter().filter_map(DocCursor::current).collect();
                    self.cursors[lead].advance();
                    return Some((doc_id, entries));
                }
                Alignment::Missed(next_doc) => {
                    self.cursors[lead].advance_to(next_doc);
                }
                Alignment::Exhausted => {
                    self.exhausted = true;
                    return None;
                }
            }
        }
    }
}

/// K-way union of docid-ascending lists.
///
/// Each item holds, per list in argument order, the entry for the document
/// or `None` when that list lacks it. Documents come out in ascending order.
#[derive(Debug)]
pub struct Union<'a, T> {
    cursors: Vec<DocCursor<'a, T>>,
    heap: BinaryHeap<Reverse<(DocId, usize)>>,
}

impl<'a, T: DocEntry> Union<'a, T> {
    /// Create a union over the given lists.
    pub fn new(lists: Vec<&'a [T]>) -> Self {
        let cursors: Vec<DocCursor<'a, T>> = lists.into_iter().map(DocCursor::new).collect();
        let heap = cursors
            .iter()
            .enumerate()
            .filter_map(|(i, cursor)| cursor.doc_id().map(|doc_id| Reverse((doc_id, i))))
            .collect();
        Union { cursors, heap }
    }
}

impl<'a, T: DocEntry> Iterator for Union<'a, T> {
    type Item = (DocId, Vec<Option<&'a T>>);

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((doc_id, _)) = *self.heap.peek()?;
        let mut row: Vec<Option<&'a T>> = vec![None; self.cursors.len()];

        while let Some(&Reverse((next_doc, i))) = self.heap.peek() {
            if next_doc != doc_id {
                break;
            }
            self.heap.pop();
            let cursor = &mut self.cursors[i];
            row[i] = cursor.current();
            cursor.advance();
            if let Some(following) = cursor.doc_id() {
                self.heap.push(Reverse((following, i)));
            }
        }

        Some((doc_id, row))
    }
}

/// Merge ascending position sequences into one ascending sequence.
///
/// Duplicates across inputs are kept.
pub fn merge_positions(lists: &[&[Position]]) -> Vec<Position> {
    let total = lists.iter().map(|l| l.len()).sum();
    let mut merged = Vec::with_capacity(total);
    let mut cursors: Vec<PositionCursor<'_>> =
        lists.iter().map(|l| PositionCursor::new(l)).collect();

    let mut heap: BinaryHeap<Reverse<(Position, usize)>> = cursors
        .iter()
        .enumerate()
        .filter_map(|(i, cursor)| cursor.current().map(|p| Reverse((p, i))))
        .collect();

    while let Some(Reverse((position, i))) = heap.pop() {
        merged.push(position);
        let cursor = &mut cursors[i];
        cursor.advance();
        if let Some(next) = cursor.current() {
            heap.push(Reverse((next, i)));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(doc_ids: &[DocId]) -> Vec<ScoreEntry> {
        doc_ids
            .iter()
            .map(|&doc_id| ScoreEntry {
                doc_id,
                score: doc_id as f64,
            })
            .collect()
    }

    #[test]
    fn test_doc_cursor() {
        let entries = scores(&[2, 5, 9]);
        let mut cursor = DocCursor::new(&entries);

        assert_eq!(cursor.doc_id(), Some(2));
        assert_eq!(cursor.advance_to(6).map(|e| e.doc_id), Some(9));
        assert_eq!(cursor.advance_to(3).map(|e| e.doc_id), Some(9));
        cursor.advance();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.advance_to(0).map(|e| e.doc_id), None);
    }

    #[test]
    fn test_intersection_keeps_argument_order() {
        let long = scores(&[1, 2, 3, 4, 5, 6]);
        let short = scores(&[2, 6]);
        let mid = scores(&[2, 3, 6]);

        let result: Vec<(DocId, Vec<DocId>)> =
            Intersection::new(vec![&long[..], &short[..], &mid[..]])
                .map(|(doc, entries)| (doc, entries.iter().map(|e| e.doc_id).collect()))
                .collect();

        assert_eq!(result, vec![(2, vec![2, 2, 2]), (6, vec![6, 6, 6])]);
    }

    #[test]
    fn test_intersection_stops_when_any_list_is_exhausted() {
        let a = scores(&[1, 2, 3]);
        let b: Vec<ScoreEntry> = Vec::new();
        assert_eq!(Intersection::new(vec![&a[..], &b[..]]).count(), 0);

        let none: Vec<&[ScoreEntry]> = Vec::new();
        assert_eq!(Intersection::new(none).count(), 0);
    }

    #[test]
    fn test_union() {
        let a = scores(&[1, 4]);
        let b = scores(&[2, 4, 7]);

        let result: Vec<(DocId, Vec<bool>)> = Union::new(vec![&a[..], &b[..]])
            .map(|(doc, row)| (doc, row.iter().map(Option::is_some).collect()))
            .collect();

        assert_eq!(
            result,
            vec![
                (1, vec![true, false]),
                (2, vec![false, true]),
                (4, vec![true, true]),
                (7, vec![false, true]),
            ]
        );
    }

    #[test]
    fn test_merge_positions() {
        let merged = merge_positions(&[&[1, 8, 20], &[3, 8], &[], &[2]]);
        assert_eq!(merged, vec![1, 2, 3, 8, 8, 20]);
    }

    #[test]
    fn test_position_cursor() {
        let positions = [4, 9];
        let mut cursor = PositionCursor::new(&positions);
        assert_eq!(cursor.current(), Some(4));
        cursor.advance();
        cursor.advance();
        cursor.advance();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.current(), None);
    }
}
