#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::Document;
use crate::operation::SplitOperation;
use crate::position::{Position, Stickiness};
use crate::range::Range;

/// Merge two elements. All `how_many` children of the element containing `source_position` are
/// moved to `target_position` (usually the end of the previous sibling), and the emptied element
/// is moved to `graveyard_position`.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeOperation {
    pub source_position: Position,
    pub how_many: usize,
    pub target_position: Position,
    pub graveyard_position: Position,
    pub base_version: usize,
}

impl MergeOperation {
    pub fn new(source_position: Position, how_many: usize, target_position: Position,
               graveyard_position: Position, base_version: usize) -> Self {
        MergeOperation {
            source_position: source_position.with_stickiness(Stickiness::ToPrevious),
            how_many,
            target_position: target_position.with_stickiness(Stickiness::ToNext),
            graveyard_position: graveyard_position.with_stickiness(Stickiness::ToNext),
            base_version,
        }
    }

    /// The position right before the merged element.
    pub fn deletion_position(&self) -> Position {
        self.source_position.parent_position()
            .unwrap_or_else(|| self.source_position.clone())
    }

    /// Everything from the source position to the end of the merged element.
    pub fn moved_range(&self) -> Range {
        Range::new(self.source_position.clone(), self.source_position.shifted_by(isize::MAX))
    }

    pub fn get_reversed(&self) -> SplitOperation {
        let split_position = self.target_position.transformed_by_merge_operation(self);
        let insertion_position = self.deletion_position().transformed_by_merge_operation(self);
        // The merged element is wherever the graveyard move put it.
        let graveyard_position = self.graveyard_position.transformed_by_deletion(&self.deletion_position(), 1)
            .unwrap_or_else(|| self.graveyard_position.clone());

        SplitOperation::new(split_position, self.how_many, insertion_position,
                            Some(graveyard_position), self.base_version + 1)
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        if self.source_position.path.len() < 2 || self.target_position.path.len() < 2 {
            return Err(ApplyError::InvalidMerge);
        }
        let source = doc.parent_of(&self.source_position)?;
        if self.how_many != source.child_count() {
            return Err(ApplyError::InvalidMerge);
        }
        doc.parent_of(&self.target_position)?;
        doc.parent_of(&self.graveyard_position)?;
        if self.target_position.is_inside_node_at(&self.deletion_position()) {
            return Err(ApplyError::MoveIntoItself);
        }
        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        let merged = self.deletion_position();
        let how_many = doc.element_after(&merged)?.child_count();
        doc.move_nodes(&merged.child(0), how_many, &self.target_position)?;

        let merged = merged.transformed_by_move(&merged.child(0), &self.target_position, how_many);
        doc.move_nodes(&merged, 1, &self.graveyard_position)
    }
}
