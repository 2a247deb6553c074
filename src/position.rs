//! Positions address a point in the document tree by a root name plus a path of child offsets.
//!
//! Text is stored one character per node, so every offset in a path is a plain child index. A
//! position with path `[2, 5]` sits inside the root's third child, before that element's sixth
//! child.
//!
//! Most of this module is the positional algebra the transformation rules are built on: given a
//! position which was valid before some edit, where does the "same" place end up afterwards?

use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use smallvec::SmallVec;
use smartstring::alias::String as SmartString;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::model::GRAVEYARD;
use crate::operation::{MergeOperation, MoveOperation, InsertOperation, Operation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::range::Range;

pub type Path = SmallVec<[usize; 4]>;

/// Decides which side of an insertion point a position belongs to when content is inserted right
/// at it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stickiness {
    /// Sticks to the node after it. Content inserted at the position ends up before it.
    ToNext,
    /// Sticks to the node before it. Content inserted at the position ends up after it.
    ToPrevious,
    /// Sticks to nothing. Behaves like `ToNext` for insertions but never travels with moved
    /// content.
    #[default]
    ToNone,
}

/// Result of comparing two positions in document order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PositionRelation { Before, Same, After, Different }

/// How two paths relate. `Prefix` means the first path is a strict prefix of the second.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum PathRelation { Same, Prefix, Extension, DiffersAt(usize) }

pub(crate) fn compare_paths(a: &[usize], b: &[usize]) -> PathRelation {
    let common = a.len().min(b.len());
    for i in 0..common {
        if a[i] != b[i] { return PathRelation::DiffersAt(i); }
    }
    match a.len().cmp(&b.len()) {
        Ordering::Equal => PathRelation::Same,
        Ordering::Less => PathRelation::Prefix,
        Ordering::Greater => PathRelation::Extension,
    }
}

#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub root: SmartString,
    pub path: Path,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stickiness: Stickiness,
}

// Stickiness is a transformation hint, not part of where the position is.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.path == other.path
    }
}
impl Eq for Position {}

impl Debug for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:?}", self.root, self.path.as_slice())?;
        match self.stickiness {
            Stickiness::ToNone => Ok(()),
            Stickiness::ToNext => f.write_str(">"),
            Stickiness::ToPrevious => f.write_str("<"),
        }
    }
}

impl Position {
    pub fn new(root: &str, path: &[usize]) -> Self {
        assert!(!path.is_empty(), "Position path cannot be empty");
        Position { root: root.into(), path: path.into(), stickiness: Stickiness::ToNone }
    }

    pub(crate) fn from_path(root: SmartString, path: Path) -> Self {
        debug_assert!(!path.is_empty());
        Position { root, path, stickiness: Stickiness::ToNone }
    }

    /// Position in the graveyard root.
    pub fn graveyard(offset: usize) -> Self {
        Position::new(GRAVEYARD, &[offset])
    }

    pub fn with_stickiness(mut self, stickiness: Stickiness) -> Self {
        self.stickiness = stickiness;
        self
    }

    pub fn offset(&self) -> usize {
        // Paths are never empty.
        self.path[self.path.len() - 1]
    }

    pub fn set_offset(&mut self, offset: usize) {
        let last = self.path.len() - 1;
        self.path[last] = offset;
    }

    pub fn parent_path(&self) -> &[usize] {
        &self.path[..self.path.len() - 1]
    }

    /// The position right before this position's parent element. None for positions directly in
    /// a root.
    pub fn parent_position(&self) -> Option<Position> {
        if self.path.len() < 2 { return None; }
        Some(Position::from_path(self.root.clone(), self.parent_path().into()))
    }

    /// Position with the same parent and a child path appended. Used to step into the node after
    /// this position.
    pub fn child(&self, offset: usize) -> Position {
        let mut path = self.path.clone();
        path.push(offset);
        Position::from_path(self.root.clone(), path)
    }

    pub fn is_in_graveyard(&self) -> bool {
        self.root == GRAVEYARD
    }

    /// A copy of this position moved `shift` places along its parent. Offsets saturate so
    /// "shift to the end of the parent" can be expressed with `isize::MAX`.
    pub fn shifted_by(&self, shift: isize) -> Position {
        let mut result = self.clone();
        let offset = self.offset();
        let new_offset = if shift >= 0 {
            offset.saturating_add(shift as usize)
        } else {
            offset.saturating_sub(shift.unsigned_abs())
        };
        result.set_offset(new_offset);
        result
    }

    pub fn compare_with(&self, other: &Position) -> PositionRelation {
        if self.root != other.root { return PositionRelation::Different; }
        match compare_paths(&self.path, &other.path) {
            PathRelation::Same => PositionRelation::Same,
            PathRelation::Prefix => PositionRelation::Before,
            PathRelation::Extension => PositionRelation::After,
            PathRelation::DiffersAt(i) => {
                if self.path[i] < other.path[i] { PositionRelation::Before } else { PositionRelation::After }
            }
        }
    }

    pub fn is_before(&self, other: &Position) -> bool {
        self.compare_with(other) == PositionRelation::Before
    }

    pub fn is_after(&self, other: &Position) -> bool {
        self.compare_with(other) == PositionRelation::After
    }

    pub fn has_same_parent_as(&self, other: &Position) -> bool {
        self.root == other.root && self.parent_path() == other.parent_path()
    }

    /// Whether `self` is somewhere inside the node which sits right after `ancestor`.
    pub(crate) fn is_inside_node_at(&self, ancestor: &Position) -> bool {
        self.root == ancestor.root
            && compare_paths(&ancestor.path, &self.path) == PathRelation::Prefix
    }

    // ***** Transformation primitives.

    /// Where this position ends up after `how_many` nodes are inserted at `insert_position`.
    pub fn transformed_by_insertion(&self, insert_position: &Position, how_many: usize) -> Position {
        let mut result = self.clone();
        if self.root != insert_position.root { return result; }

        match compare_paths(insert_position.parent_path(), self.parent_path()) {
            PathRelation::Same => {
                if insert_position.offset() < self.offset()
                    || (insert_position.offset() == self.offset() && self.stickiness != Stickiness::ToPrevious) {
                    result.set_offset(self.offset() + how_many);
                }
            }
            PathRelation::Prefix => {
                let i = insert_position.path.len() - 1;
                if insert_position.offset() <= self.path[i] {
                    result.path[i] += how_many;
                }
            }
            _ => {}
        }
        result
    }

    /// Where this position ends up after `how_many` nodes starting at `delete_position` are
    /// removed. Returns None if the position was inside the removed nodes.
    pub fn transformed_by_deletion(&self, delete_position: &Position, how_many: usize) -> Option<Position> {
        let mut result = self.clone();
        if self.root != delete_position.root { return Some(result); }

        match compare_paths(delete_position.parent_path(), self.parent_path()) {
            PathRelation::Same => {
                let del = delete_position.offset();
                if del < self.offset() {
                    if del.saturating_add(how_many) > self.offset() { return None; }
                    result.set_offset(self.offset() - how_many);
                }
            }
            PathRelation::Prefix => {
                let i = delete_position.path.len() - 1;
                let del = delete_position.offset();
                if del <= self.path[i] {
                    if del.saturating_add(how_many) > self.path[i] { return None; }
                    result.path[i] -= how_many;
                }
            }
            _ => {}
        }
        Some(result)
    }

    /// Where this position ends up after `how_many` nodes are moved from `source` to `target`.
    /// `target` is expressed in the document before the move, like in [`MoveOperation`].
    pub fn transformed_by_move(&self, source: &Position, target: &Position, how_many: usize) -> Position {
        // The target position as seen once the moved nodes have been taken out.
        let target = target.transformed_by_deletion(source, how_many)
            .unwrap_or_else(|| target.clone());

        // Nodes put back where they were. Nothing moves.
        if *source == target {
            return self.clone();
        }

        match self.transformed_by_deletion(source, how_many) {
            None => self.combined(source, &target),
            Some(_) if *self == *source && self.stickiness == Stickiness::ToNext => self.combined(source, &target),
            Some(_) if *self == source.shifted_by(how_many as isize) && self.stickiness == Stickiness::ToPrevious => {
                self.combined(source, &target)
            }
            Some(transformed) => transformed.transformed_by_insertion(&target, how_many),
        }
    }

    /// Re-roots this position, which is at or below `source`, so it is at the same place relative
    /// to `target`.
    pub fn combined(&self, source: &Position, target: &Position) -> Position {
        let i = source.path.len() - 1;
        let mut path: Path = target.path.clone();
        let last = path.len() - 1;
        path[last] = target.offset() + self.path[i] - source.offset();
        path.extend_from_slice(&self.path[i + 1..]);

        Position { root: target.root.clone(), path, stickiness: self.stickiness }
    }

    pub fn transformed_by_insert_operation(&self, op: &InsertOperation) -> Position {
        self.transformed_by_insertion(&op.position, op.how_many())
    }

    pub fn transformed_by_move_operation(&self, op: &MoveOperation) -> Position {
        self.transformed_by_move(&op.source_position, &op.target_position, op.how_many)
    }

    pub fn transformed_by_split_operation(&self, op: &SplitOperation) -> Position {
        let moved_range = op.moved_range();
        let is_contained = moved_range.contains_position(self)
            || (moved_range.start == *self && self.stickiness == Stickiness::ToNext);

        if is_contained {
            self.combined(&op.split_position, &op.move_target_position())
        } else if let Some(graveyard_position) = &op.graveyard_position {
            self.transformed_by_move(graveyard_position, &op.insertion_position, 1)
        } else {
            self.transformed_by_insertion(&op.insertion_position, 1)
        }
    }

    pub fn transformed_by_merge_operation(&self, op: &MergeOperation) -> Position {
        let moved_range = op.moved_range();
        let is_contained = moved_range.contains_position(self) || moved_range.start == *self;

        if is_contained {
            // The merged element is taken out after its children. The target may be anywhere.
            self.combined(&op.source_position, &op.target_position)
                .transformed_by_move(&op.deletion_position(), &op.graveyard_position, 1)
        } else if *self == op.deletion_position() {
            Position { stickiness: self.stickiness, ..op.deletion_position() }
        } else {
            self.transformed_by_move(&op.deletion_position(), &op.graveyard_position, 1)
        }
    }

    pub fn transformed_by_wrap_operation(&self, op: &WrapOperation) -> Position {
        let range = op.wrapped_range();
        // Nothing sticks into an empty wrapper.
        let is_contained = op.how_many > 0 && (range.contains_position(self)
            || (range.start == *self && self.stickiness == Stickiness::ToNext)
            || (range.end == *self && self.stickiness == Stickiness::ToPrevious));

        if is_contained {
            return self.combined(&range.start, &op.target_position());
        }

        if let Some(graveyard_position) = &op.graveyard_position {
            if self.is_inside_node_at(graveyard_position) {
                // Anything already inside the reused element stays after the wrapped nodes.
                let mut pos = self.combined(graveyard_position, &op.element_position());
                let i = graveyard_position.path.len();
                pos.path[i] += op.how_many;
                return pos;
            }
        }

        let was_at_end = *self == range.end;
        // Take the wrapped nodes out...
        let mut pos = self.transformed_by_deletion(&range.start, op.how_many)
            .unwrap_or_else(|| self.clone());
        let mut start = range.start.clone();
        // ... take the wrapping element out of the graveyard (if that's where it comes from) ...
        if let Some(graveyard_position) = &op.graveyard_position {
            if let Some(graveyard_position) = graveyard_position.transformed_by_deletion(&range.start, op.how_many) {
                pos = pos.transformed_by_deletion(&graveyard_position, 1).unwrap_or(pos);
                start = start.transformed_by_deletion(&graveyard_position, 1).unwrap_or(start);
            }
        }
        // ... and put the wrapper where the nodes were.
        if pos == start && !was_at_end {
            pos
        } else {
            pos.transformed_by_insertion(&start, 1)
        }
    }

    pub fn transformed_by_unwrap_operation(&self, op: &UnwrapOperation) -> Position {
        let element = op.element_position();
        let i = element.path.len() - 1;
        let same_branch = self.root == element.root
            && self.path.len() > i
            && self.path[..i] == element.path[..i];

        // First the children are lifted out, in front of the element.
        let (lifted, was_inside) = if same_branch && self.path.len() > i + 1 && self.path[i] == element.offset() {
            (self.combined(&op.position, &element), true)
        } else if same_branch && self.path[i] > element.offset() {
            let mut pos = self.clone();
            pos.path[i] += op.how_many;
            (pos, false)
        } else {
            (self.clone(), false)
        };

        // Then the emptied element goes to the graveyard.
        let emptied = element.shifted_by(op.how_many as isize);
        if was_inside {
            // Positions which were inside the element never travel with it.
            let pos = lifted.with_stickiness(Stickiness::ToNone)
                .transformed_by_move(&emptied, &op.graveyard_position, 1);
            pos.with_stickiness(self.stickiness)
        } else {
            lifted.transformed_by_move(&emptied, &op.graveyard_position, 1)
        }
    }

    /// Transform this position by any operation.
    pub fn transformed_by_operation(&self, op: &Operation) -> Position {
        match op {
            Operation::Insert(op) => self.transformed_by_insert_operation(op),
            Operation::Move(op) => self.transformed_by_move_operation(op),
            Operation::Split(op) => self.transformed_by_split_operation(op),
            Operation::Merge(op) => self.transformed_by_merge_operation(op),
            Operation::Wrap(op) => self.transformed_by_wrap_operation(op),
            Operation::Unwrap(op) => self.transformed_by_unwrap_operation(op),
            _ => self.clone(),
        }
    }
}

impl From<&Position> for Range {
    fn from(pos: &Position) -> Self {
        Range::new(pos.clone(), pos.clone())
    }
}
