//! Relations remember how two operations were positioned relative to each other when they were
//! transformed. When one of them is later undone, the operation undoing it comes with no such
//! memory - it might put content at the same spot as some other operation, and the usual
//! tie-breaking would pick the wrong side. The recorded relation settles it.
//!
//! Relations are only ever recorded and read during a single [`transform_sets`] call.
//!
//! [`transform_sets`]: crate::transform::transform_sets

use std::collections::HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::position::Path;
use crate::range::Range;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Side { A, B }

/// Identifies an original (untransformed) operation within a [`transform_sets`] call.
///
/// [`transform_sets`]: crate::transform::transform_sets
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct OpId {
    pub side: Side,
    pub base_version: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarkerSide { Left, Right }

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Relation {
    /// Move target was before the other move's source.
    InsertBefore,
    InsertAfter,
    /// Move target was at (or inside) the content a merge picked up.
    InsertAtSource,
    /// Move target was between the merge target and the merged element.
    InsertBetween,
    MoveTargetAfter,
    SplitBefore,
    SplitAtSource,
    MergeTargetNotMoved,
    MergeSourceNotMoved,
    MergeSameElement,
    /// The split happened inside a moved range, `offset` nodes after its start, leaving
    /// `how_many` moved nodes after the split.
    SplitInsideMove { how_many: usize, offset: usize },
    /// One boundary of a marker was inside moved content.
    MarkerMoved { side: MarkerSide, path: Path },
    /// Where the marker boundaries were relative to a merge.
    MarkerMerged {
        was_in_left_element: bool,
        was_start_before_merged_element: bool,
        was_end_before_merged_element: bool,
        was_in_right_element: bool,
    },
}

/// Relations recorded so far, from the first operation's original to the second's.
#[derive(Debug, Clone, Default)]
pub(crate) struct RelationTracker {
    relations: HashMap<OpId, HashMap<OpId, Relation>>,
}

impl RelationTracker {
    pub fn get(&self, a: OpId, b: OpId) -> Option<&Relation> {
        self.relations.get(&a)?.get(&b)
    }

    fn set(&mut self, a: OpId, b: OpId, relation: Relation) {
        self.relations.entry(a).or_default().insert(b, relation);
    }

    /// Record how `a` relates to `b`, before either is transformed by the other.
    pub fn update(&mut self, a: &Operation, a_id: OpId, b: &Operation, b_id: OpId) {
        match (a, b) {
            (Operation::Move(a), Operation::Merge(b)) => {
                if a.target_position == b.source_position || b.moved_range().contains_position(&a.target_position) {
                    self.set(a_id, b_id, Relation::InsertAtSource);
                } else if a.target_position == b.deletion_position() {
                    self.set(a_id, b_id, Relation::InsertBetween);
                } else if a.target_position.is_after(&b.source_position) {
                    self.set(a_id, b_id, Relation::MoveTargetAfter);
                }
            }
            (Operation::Move(a), Operation::Move(b)) => {
                if a.target_position == b.source_position || a.target_position.is_before(&b.source_position) {
                    self.set(a_id, b_id, Relation::InsertBefore);
                } else {
                    self.set(a_id, b_id, Relation::InsertAfter);
                }
            }
            (Operation::Split(a), Operation::Merge(b)) => {
                if a.split_position.is_before(&b.source_position) {
                    self.set(a_id, b_id, Relation::SplitBefore);
                }
            }
            (Operation::Split(a), Operation::Move(b)) => {
                if a.split_position == b.source_position || a.split_position.is_before(&b.source_position) {
                    self.set(a_id, b_id, Relation::SplitBefore);
                } else {
                    let range = b.moved_range();
                    if a.split_position.has_same_parent_as(&b.source_position) && range.contains_position(&a.split_position) {
                        self.set(a_id, b_id, Relation::SplitInsideMove {
                            how_many: range.end.offset() - a.split_position.offset(),
                            offset: a.split_position.offset() - range.start.offset(),
                        });
                    }
                }
            }
            (Operation::Merge(a), Operation::Merge(b)) => {
                // Later checks win.
                if a.target_position != b.source_position {
                    self.set(a_id, b_id, Relation::MergeTargetNotMoved);
                }
                if a.source_position == b.target_position {
                    self.set(a_id, b_id, Relation::MergeSourceNotMoved);
                }
                if a.source_position == b.source_position {
                    self.set(a_id, b_id, Relation::MergeSameElement);
                }
            }
            (Operation::Merge(a), Operation::Split(b)) => {
                if a.source_position == b.split_position {
                    self.set(a_id, b_id, Relation::SplitAtSource);
                }
            }
            (Operation::Marker(a), Operation::Move(b)) => {
                let Some(marker_range) = &a.new_range else { return; };
                let moved_range = b.moved_range();
                if let Some(relation) = marker_move_relation(marker_range, &moved_range) {
                    self.set(a_id, b_id, relation);
                }
            }
            (Operation::Marker(a), Operation::Merge(b)) => {
                let Some(marker_range) = &a.new_range else { return; };
                let was_in_left_element = marker_range.start == b.target_position;
                let was_start_before_merged_element = marker_range.start == b.deletion_position();
                let was_end_before_merged_element = marker_range.end == b.deletion_position();
                let was_in_right_element = marker_range.end == b.source_position;

                if was_in_left_element || was_start_before_merged_element
                    || was_end_before_merged_element || was_in_right_element {
                    self.set(a_id, b_id, Relation::MarkerMerged {
                        was_in_left_element,
                        was_start_before_merged_element,
                        was_end_before_merged_element,
                        was_in_right_element,
                    });
                }
            }
            _ => {}
        }
    }
}

fn marker_move_relation(marker_range: &Range, moved_range: &Range) -> Option<Relation> {
    let affected_left = moved_range.contains_position(&marker_range.start) || moved_range.start == marker_range.start;
    let affected_right = moved_range.contains_position(&marker_range.end) || moved_range.end == marker_range.end;

    if (affected_left || affected_right) && !moved_range.contains_range(marker_range, false) {
        Some(if affected_left {
            Relation::MarkerMoved { side: MarkerSide::Left, path: marker_range.start.path.clone() }
        } else {
            Relation::MarkerMoved { side: MarkerSide::Right, path: marker_range.end.path.clone() }
        })
    } else {
        None
    }
}
