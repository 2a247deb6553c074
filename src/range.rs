//! A range is a pair of positions in document order. Like positions, ranges are plain values - all
//! the transformation methods return new ranges.

use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use smallvec::{smallvec, SmallVec};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::Document;
use crate::operation::{MergeOperation, MoveOperation, Operation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::{Position, Stickiness};

pub type Ranges = SmallVec<[Range; 2]>;

#[derive(Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Debug for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Range {
    /// Create a range. Boundaries of a non-collapsed range stick inwards, so content inserted
    /// right at a boundary stays outside of the range.
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(!start.is_after(&end), "Range start {:?} after end {:?}", start, end);
        let collapsed = start == end;
        Range {
            start: start.with_stickiness(if collapsed { Stickiness::ToNone } else { Stickiness::ToNext }),
            end: end.with_stickiness(if collapsed { Stickiness::ToNone } else { Stickiness::ToPrevious }),
        }
    }

    pub fn collapsed(pos: Position) -> Self {
        Range::new(pos.clone(), pos)
    }

    pub fn from_position_and_shift(pos: &Position, shift: usize) -> Self {
        Range::new(pos.clone(), pos.shifted_by(shift as isize))
    }

    /// Glue ranges into one. The first range is the reference: ranges touching it (directly or
    /// through other touching ranges) are joined to it, anything else is dropped.
    pub fn from_ranges(ranges: &[Range]) -> Option<Range> {
        let reference = ranges.first()?;
        let mut sorted: Vec<&Range> = ranges.iter().collect();
        sorted.sort_by(|a, b| if a.start.is_after(&b.start) { Ordering::Greater } else { Ordering::Less });
        let ref_index = sorted.iter().position(|r| std::ptr::eq(*r, reference))?;

        let mut start = reference.start.clone();
        let mut end = reference.end.clone();
        for r in sorted[..ref_index].iter().rev() {
            if r.end != start { break; }
            start = r.start.clone();
        }
        for r in &sorted[ref_index + 1..] {
            if r.start != end { break; }
            end = r.end.clone();
        }
        Some(Range::new(start, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn is_flat(&self) -> bool {
        self.start.has_same_parent_as(&self.end)
    }

    pub fn root(&self) -> &str {
        &self.start.root
    }

    /// Number of nodes of the start's parent which are fully covered by the range. For a flat range
    /// that's the distance between the boundaries.
    pub fn flat_len(&self) -> usize {
        let depth = self.start.path.len().saturating_sub(1);
        let end = &self.end.path;
        if self.end.root != self.start.root || end.len() <= depth || end[..depth] != self.start.path[..depth] {
            return 0;
        }
        end[depth].saturating_sub(self.start.offset())
    }

    pub fn contains_position(&self, pos: &Position) -> bool {
        pos.is_after(&self.start) && pos.is_before(&self.end)
    }

    /// Whether `other` is inside this range. With `loose`, shared boundaries count as inside.
    pub fn contains_range(&self, other: &Range, loose: bool) -> bool {
        let loose = loose && !other.is_collapsed();
        let contains_start = self.contains_position(&other.start) || (loose && self.start == other.start);
        let contains_end = self.contains_position(&other.end) || (loose && self.end == other.end);
        contains_start && contains_end
    }

    pub fn is_intersecting(&self, other: &Range) -> bool {
        self.start.is_before(&other.end) && self.end.is_after(&other.start)
    }

    pub fn intersection(&self, other: &Range) -> Option<Range> {
        if !self.is_intersecting(other) { return None; }

        let start = if self.start.is_after(&other.start) { &self.start } else { &other.start };
        let end = if self.end.is_before(&other.end) { &self.end } else { &other.end };
        Some(Range::new(start.clone(), end.clone()))
    }

    /// The parts of this range not covered by `other`. Zero, one or two ranges, in document order.
    pub fn difference(&self, other: &Range) -> Ranges {
        let mut result = Ranges::new();
        if self.is_intersecting(other) {
            if self.contains_position(&other.start) {
                result.push(Range::new(self.start.clone(), other.start.clone()));
            }
            if self.contains_position(&other.end) {
                result.push(Range::new(other.end.clone(), self.end.clone()));
            }
        } else {
            result.push(self.clone());
        }
        result
    }

    /// Split the range into the smallest set of flat ranges covering the same nodes. Needs the
    /// document to know how many children the elements along the start path have.
    pub fn minimal_flat_ranges(&self, doc: &Document) -> Result<Vec<Range>, ApplyError> {
        let mut ranges = Vec::new();
        let diff_at = self.start.path.iter().zip(self.end.path.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let mut pos = self.start.clone().with_stickiness(Stickiness::ToNone);

        // Up: the rest of each element the start is in.
        while pos.path.len() > diff_at + 1 {
            let max_offset = doc.parent_of(&pos)?.child_count();
            let how_many = max_offset - pos.offset();
            if how_many != 0 {
                ranges.push(Range::from_position_and_shift(&pos, how_many));
            }
            pos.path.pop();
            pos.set_offset(pos.offset() + 1);
        }

        // Down: everything before the end on each level.
        while pos.path.len() <= self.end.path.len() {
            let offset = self.end.path[pos.path.len() - 1];
            let how_many = offset.saturating_sub(pos.offset());
            if how_many != 0 {
                ranges.push(Range::from_position_and_shift(&pos, how_many));
            }
            pos.set_offset(offset);
            pos.path.push(0);
        }
        Ok(ranges)
    }

    // ***** Transformations.

    pub fn transformed_by_insertion(&self, insert_position: &Position, how_many: usize, spread: bool) -> Ranges {
        if spread && self.contains_position(insert_position) {
            smallvec![
                Range::new(self.start.clone(), insert_position.clone()),
                Range::new(
                    insert_position.shifted_by(how_many as isize),
                    self.end.transformed_by_insertion(insert_position, how_many)
                ),
            ]
        } else {
            smallvec![Range::new(
                self.start.transformed_by_insertion(insert_position, how_many),
                self.end.transformed_by_insertion(insert_position, how_many),
            )]
        }
    }

    /// Returns None if the whole range was removed.
    pub fn transformed_by_deletion(&self, delete_position: &Position, how_many: usize) -> Option<Range> {
        let start = self.start.transformed_by_deletion(delete_position, how_many);
        let end = self.end.transformed_by_deletion(delete_position, how_many);

        match (start, end) {
            (None, None) => None,
            (start, end) => Some(Range::new(
                start.unwrap_or_else(|| delete_position.clone()),
                end.unwrap_or_else(|| delete_position.clone()),
            )),
        }
    }

    pub fn transformed_by_move(&self, source: &Position, target: &Position, how_many: usize, spread: bool) -> Ranges {
        if self.is_collapsed() {
            return smallvec![Range::collapsed(self.start.transformed_by_move(source, target, how_many))];
        }

        let move_range = Range::from_position_and_shift(source, how_many);
        let insert_position = target.transformed_by_deletion(source, how_many)
            .unwrap_or_else(|| target.clone());

        if self.contains_position(target) && !spread
            && (move_range.contains_position(&self.start) || move_range.contains_position(&self.end)) {
            let start = self.start.transformed_by_move(source, target, how_many);
            let end = self.end.transformed_by_move(source, target, how_many);
            return smallvec![Range::new(start, end)];
        }

        let difference_set = self.difference(&move_range);
        let common = self.intersection(&move_range);

        let delete = |p: &Position| p.transformed_by_deletion(source, how_many).unwrap_or_else(|| p.clone());
        let difference = match difference_set.len() {
            1 => Some(Range::new(delete(&difference_set[0].start), delete(&difference_set[0].end))),
            2 => Some(Range::new(self.start.clone(), delete(&self.end))),
            _ => None,
        };

        let mut result = match difference {
            Some(d) => d.transformed_by_insertion(&insert_position, how_many, common.is_some() || spread),
            None => Ranges::new(),
        };

        if let Some(common) = common {
            let transformed_common = Range::new(
                common.start.combined(&move_range.start, &insert_position),
                common.end.combined(&move_range.start, &insert_position),
            );
            if result.len() == 2 {
                result.insert(1, transformed_common);
            } else {
                result.push(transformed_common);
            }
        }

        result
    }

    pub fn transformed_by_move_operation(&self, op: &MoveOperation, spread: bool) -> Ranges {
        self.transformed_by_move(&op.source_position, &op.target_position, op.how_many, spread)
    }

    pub fn transformed_by_split_operation(&self, op: &SplitOperation) -> Range {
        let start = self.start.transformed_by_split_operation(op);
        let mut end = self.end.transformed_by_split_operation(op);

        if self.end == op.insertion_position {
            end = self.end.shifted_by(1);
        }

        // The end was next to the graveyard element used by the split and got moved with it.
        if start.root != end.root {
            end = self.end.shifted_by(-1);
        }

        Range::new(start, end)
    }

    pub fn transformed_by_merge_operation(&self, op: &MergeOperation) -> Range {
        let deletion_position = op.deletion_position();

        // A range spanning exactly the "closing tag" of the merge target collapses.
        if self.start == op.target_position && self.end == deletion_position {
            return Range::collapsed(self.start.clone());
        }

        let mut start = self.start.transformed_by_merge_operation(op);
        let mut end = self.end.transformed_by_merge_operation(op);

        // The end was right before the merged element and went to the graveyard with it.
        if start.root != end.root {
            end = self.end.shifted_by(-1);
        }

        if start.is_after(&end) {
            if op.source_position.is_before(&op.target_position) {
                start = end.clone();
                start.set_offset(0);
            } else {
                if deletion_position != start {
                    end = deletion_position;
                }
                start = op.target_position.clone();
            }
        }

        Range::new(start, end)
    }

    pub fn transformed_by_wrap_operation(&self, op: &WrapOperation) -> Range {
        let start = self.start.transformed_by_wrap_operation(op);
        let mut end = self.end.transformed_by_wrap_operation(op);

        if start.root != end.root {
            end = self.end.clone();
        }
        if start.is_after(&end) { end = start.clone(); }

        Range::new(start, end)
    }

    pub fn transformed_by_unwrap_operation(&self, op: &UnwrapOperation) -> Range {
        let start = self.start.transformed_by_unwrap_operation(op);
        let mut end = self.end.transformed_by_unwrap_operation(op);

        // The end was right after the unwrapped element and went to the graveyard with it. It
        // belongs after the lifted children.
        if start.root != end.root {
            end = op.element_position().shifted_by(op.how_many as isize);
        }
        if start.is_after(&end) { end = start.clone(); }

        Range::new(start, end)
    }

    pub fn transformed_by_operation(&self, op: &Operation) -> Ranges {
        match op {
            Operation::Insert(op) => self.transformed_by_insertion(&op.position, op.how_many(), false),
            Operation::Move(op) => self.transformed_by_move_operation(op, false),
            Operation::Split(op) => smallvec![self.transformed_by_split_operation(op)],
            Operation::Merge(op) => smallvec![self.transformed_by_merge_operation(op)],
            Operation::Wrap(op) => smallvec![self.transformed_by_wrap_operation(op)],
            Operation::Unwrap(op) => smallvec![self.transformed_by_unwrap_operation(op)],
            _ => smallvec![self.clone()],
        }
    }

    /// Transform the range by a sequence of operations. Pieces which end up inside other pieces
    /// are dropped.
    pub fn transformed_by_operations<'a>(&self, ops: impl IntoIterator<Item = &'a Operation>) -> Ranges {
        let mut ranges: Ranges = smallvec![self.clone()];

        for op in ops {
            let mut i = 0;
            while i < ranges.len() {
                let result = ranges[i].transformed_by_operation(op);
                let n = result.len();
                ranges.remove(i);
                for (j, r) in result.into_iter().enumerate() {
                    ranges.insert(i + j, r);
                }
                i += n;
            }
        }

        let mut i = 0;
        while i < ranges.len() {
            let mut j = i + 1;
            while j < ranges.len() {
                let (a, b) = (&ranges[i], &ranges[j]);
                if a.contains_range(b, false) || b.contains_range(a, false) || a == b {
                    ranges.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        ranges
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn r(start: &[usize], end: &[usize]) -> Range {
        Range::new(Position::new("main", start), Position::new("main", end))
    }

    #[test]
    fn difference_and_intersection() {
        let a = r(&[0, 1], &[0, 6]);
        let b = r(&[0, 3], &[0, 4]);
        assert_eq!(a.difference(&b).as_slice(), &[r(&[0, 1], &[0, 3]), r(&[0, 4], &[0, 6])]);
        assert_eq!(a.intersection(&b), Some(b.clone()));
        assert_eq!(b.difference(&a).len(), 0);

        let c = r(&[0, 6], &[0, 8]);
        assert!(!a.is_intersecting(&c));
        assert_eq!(a.difference(&c).as_slice(), &[a.clone()]);
    }

    #[test]
    fn flat_len_counts_nodes_in_the_start_parent() {
        assert_eq!(r(&[0, 1], &[0, 4]).flat_len(), 3);
        // Only the fully covered nodes count.
        assert_eq!(r(&[1, 3], &[1, 5, 2]).flat_len(), 2);
        assert_eq!(r(&[1, 3], &[2]).flat_len(), 0);
    }

    #[test]
    fn insertion_spreads_only_when_asked() {
        let a = r(&[0, 0], &[0, 6]);
        let at = Position::new("main", &[0, 3]);
        assert_eq!(a.transformed_by_insertion(&at, 2, true).as_slice(), &[r(&[0, 0], &[0, 3]), r(&[0, 5], &[0, 8])]);
        assert_eq!(a.transformed_by_insertion(&at, 2, false).as_slice(), &[r(&[0, 0], &[0, 8])]);

        // Boundaries stick inwards.
        let edge = Position::new("main", &[0, 0]);
        assert_eq!(a.transformed_by_insertion(&edge, 2, false).as_slice(), &[r(&[0, 2], &[0, 8])]);
    }

    #[test]
    fn move_splits_range() {
        // Move [2, 4) of "abcdef" to the end of the parent.
        let a = r(&[0, 1], &[0, 5]);
        let result = a.transformed_by_move(&Position::new("main", &[0, 2]), &Position::new("main", &[0, 6]), 2, false);
        assert_eq!(result.as_slice(), &[r(&[0, 1], &[0, 3]), r(&[0, 4], &[0, 6])]);
    }

    #[test]
    fn deletion_of_whole_range() {
        let a = r(&[0, 2], &[0, 3]);
        assert_eq!(a.transformed_by_deletion(&Position::new("main", &[0, 1]), 3), None);
        assert_eq!(a.transformed_by_deletion(&Position::new("main", &[0, 0]), 1), Some(r(&[0, 1], &[0, 2])));
    }

    #[test]
    fn from_ranges_glues_touching_pieces() {
        let pieces = [r(&[0, 3], &[0, 5]), r(&[0, 1], &[0, 3]), r(&[0, 5], &[0, 6]), r(&[0, 8], &[0, 9])];
        assert_eq!(Range::from_ranges(&pieces), Some(r(&[0, 1], &[0, 6])));
        assert_eq!(Range::from_ranges(&[]), None);
    }

    #[test]
    fn minimal_flat_ranges_of_a_deep_range() {
        use crate::model::Node;

        let mut doc = Document::new();
        doc.create_root("main", ["ab", "cd", "ef"].iter().map(|t| Node::element("p", Node::text(t))).collect());

        let flat = r(&[0, 1], &[2, 1]).minimal_flat_ranges(&doc).unwrap();
        assert_eq!(flat, vec![r(&[0, 1], &[0, 2]), r(&[1], &[2]), r(&[2, 0], &[2, 1])]);

        let already_flat = r(&[1, 0], &[1, 2]);
        assert_eq!(already_flat.minimal_flat_ranges(&doc).unwrap(), vec![already_flat.clone()]);
    }
}
