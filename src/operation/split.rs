#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::{Document, Node};
use crate::operation::MergeOperation;
use crate::position::{Position, Stickiness};
use crate::range::Range;

/// Split an element in two at `split_position`. The `how_many` children after the split
/// position go into a new element inserted at `insertion_position`.
///
/// The new element is a shallow copy of the split element, unless `graveyard_position` is set,
/// in which case the element is taken from the graveyard. (That's how undoing a merge gets the
/// original element back.)
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitOperation {
    pub split_position: Position,
    pub how_many: usize,
    pub insertion_position: Position,
    pub graveyard_position: Option<Position>,
    pub base_version: usize,
}

impl SplitOperation {
    pub fn new(split_position: Position, how_many: usize, insertion_position: Position,
               graveyard_position: Option<Position>, base_version: usize) -> Self {
        SplitOperation {
            split_position: split_position.with_stickiness(Stickiness::ToNext),
            how_many,
            insertion_position: insertion_position.with_stickiness(Stickiness::ToNone),
            graveyard_position: graveyard_position.map(|p| p.with_stickiness(Stickiness::ToNext)),
            base_version,
        }
    }

    /// The usual insertion position: right after the split element.
    pub fn insertion_position_for(split_position: &Position) -> Position {
        let mut pos = split_position.parent_position()
            .unwrap_or_else(|| split_position.clone());
        pos.set_offset(pos.offset() + 1);
        pos
    }

    /// Where the split off children land.
    pub fn move_target_position(&self) -> Position {
        self.insertion_position.child(0)
    }

    /// Everything from the split position to the end of the split element.
    pub fn moved_range(&self) -> Range {
        Range::new(self.split_position.clone(), self.split_position.shifted_by(isize::MAX))
    }

    pub fn get_reversed(&self) -> MergeOperation {
        MergeOperation::new(self.move_target_position(), self.how_many, self.split_position.clone(),
                            Position::graveyard(0), self.base_version + 1)
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        let element = doc.parent_of(&self.split_position)?;
        if self.split_position.path.len() < 2 {
            return Err(ApplyError::NotAnElement(self.split_position.clone()));
        }
        if self.how_many != element.child_count() - self.split_position.offset() {
            return Err(ApplyError::InvalidRange(self.split_position.clone()));
        }
        doc.parent_of(&self.insertion_position)?;
        if let Some(graveyard_position) = &self.graveyard_position {
            doc.element_after(graveyard_position)
                .map_err(|_| ApplyError::MissingGraveyardElement(graveyard_position.clone()))?;
        }
        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        let split_element = self.split_position.parent_position()
            .ok_or_else(|| ApplyError::NotAnElement(self.split_position.clone()))?;

        // First put the new element in place, then fill it.
        let (split_element, new_element) = match &self.graveyard_position {
            Some(graveyard_position) => {
                doc.move_nodes(graveyard_position, 1, &self.insertion_position)?;
                (
                    split_element.transformed_by_move(graveyard_position, &self.insertion_position, 1),
                    self.insertion_position.transformed_by_deletion(graveyard_position, 1)
                        .unwrap_or_else(|| self.insertion_position.clone()),
                )
            }
            None => {
                let clone = doc.element_after(&split_element)?.shallow_clone();
                doc.insert_nodes(&self.insertion_position, vec![Node::Element(clone)])?;
                (split_element.transformed_by_insertion(&self.insertion_position, 1), self.insertion_position.clone())
            }
        };

        let source = split_element.child(self.split_position.offset());
        let how_many = doc.element_after(&split_element)?.child_count() - source.offset();
        let target = new_element.child(0);
        doc.move_nodes(&source, how_many, &target)
    }
}
