#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::Document;
use crate::operation::WrapOperation;
use crate::position::{Position, Stickiness};
use crate::range::Range;

/// Replace an element with its children. `position` is the start of the element's content and
/// `how_many` its child count. The emptied element goes to `graveyard_position`, which is
/// expressed like the target of a move done after the children were lifted out.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnwrapOperation {
    pub position: Position,
    pub how_many: usize,
    pub graveyard_position: Position,
    pub base_version: usize,
}

impl UnwrapOperation {
    pub fn new(position: Position, how_many: usize, graveyard_position: Position, base_version: usize) -> Self {
        UnwrapOperation {
            position: position.with_stickiness(Stickiness::ToPrevious),
            how_many,
            graveyard_position: graveyard_position.with_stickiness(Stickiness::ToNext),
            base_version,
        }
    }

    /// The position right before the unwrapped element.
    pub fn element_position(&self) -> Position {
        self.position.parent_position()
            .unwrap_or_else(|| self.position.clone())
            .with_stickiness(Stickiness::ToNone)
    }

    pub fn unwrapped_range(&self) -> Range {
        Range::from_position_and_shift(&self.position, self.how_many)
    }

    /// Where the element sits right before it's sent to the graveyard.
    fn emptied_position(&self) -> Position {
        self.element_position().shifted_by(self.how_many as isize)
    }

    pub fn get_reversed(&self) -> WrapOperation {
        let graveyard_position = self.graveyard_position.transformed_by_deletion(&self.emptied_position(), 1)
            .unwrap_or_else(|| self.graveyard_position.clone());
        WrapOperation::new_from_graveyard(self.element_position(), self.how_many, graveyard_position, self.base_version + 1)
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        if self.position.path.len() < 2 {
            return Err(ApplyError::NotAnElement(self.position.clone()));
        }
        let element = doc.element_after(&self.element_position())?;
        if self.position.offset() != 0 || element.child_count() != self.how_many {
            return Err(ApplyError::InvalidRange(self.position.clone()));
        }
        doc.parent_of(&self.graveyard_position).map(|_| ())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        let element = self.element_position();
        let how_many = doc.element_after(&element)?.child_count();
        let children = doc.remove_nodes(&element.child(0), how_many)?;
        doc.insert_nodes(&element, children)?;
        doc.move_nodes(&element.shifted_by(how_many as isize), 1, &self.graveyard_position)
    }
}
