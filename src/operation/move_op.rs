#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::Document;
use crate::position::{Position, Stickiness};
use crate::range::Range;

/// What a move is used for. Removing and reinserting are moves to and from the graveyard.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MoveKind { Move, Remove, Reinsert }

/// Move a flat run of `how_many` siblings from `source_position` to `target_position`. The
/// target is expressed in the document as it is before the move.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MoveOperation {
    pub source_position: Position,
    pub how_many: usize,
    pub target_position: Position,
    pub base_version: usize,
}

impl MoveOperation {
    pub fn new(source_position: Position, how_many: usize, target_position: Position, base_version: usize) -> Self {
        MoveOperation {
            source_position: source_position.with_stickiness(Stickiness::ToNext),
            how_many,
            target_position: target_position.with_stickiness(Stickiness::ToNone),
            base_version,
        }
    }

    pub fn kind(&self) -> MoveKind {
        if self.target_position.is_in_graveyard() {
            MoveKind::Remove
        } else if self.source_position.is_in_graveyard() {
            MoveKind::Reinsert
        } else {
            MoveKind::Move
        }
    }

    pub fn is_remove(&self) -> bool {
        self.kind() == MoveKind::Remove
    }

    pub fn moved_range(&self) -> Range {
        Range::from_position_and_shift(&self.source_position, self.how_many)
    }

    /// Where the moved nodes start once the move has happened.
    pub fn moved_range_start(&self) -> Position {
        self.target_position.transformed_by_deletion(&self.source_position, self.how_many)
            .unwrap_or_else(|| self.target_position.clone())
    }

    pub fn get_reversed(&self) -> MoveOperation {
        let new_target = self.source_position.transformed_by_insertion(&self.target_position, self.how_many);
        MoveOperation::new(self.moved_range_start(), self.how_many, new_target, self.base_version + 1)
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        doc.check_flat_run(&self.source_position, self.how_many)?;
        doc.parent_of(&self.target_position)?;
        if self.moved_range().contains_position(&self.target_position) {
            return Err(ApplyError::MoveIntoItself);
        }
        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        if self.how_many == 0 { return Ok(()); }
        doc.move_nodes(&self.source_position, self.how_many, &self.target_position)
    }
}
