#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::{Document, Element, Node};
use crate::operation::UnwrapOperation;
use crate::position::{Position, Stickiness};
use crate::range::Range;

/// Wrap a flat run of `how_many` siblings starting at `position` in an element. The wrapping
/// element is either given (`element`) or taken from the graveyard (`graveyard_position`).
/// Exactly one of the two is set.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrapOperation {
    pub position: Position,
    pub how_many: usize,
    pub element: Option<Element>,
    pub graveyard_position: Option<Position>,
    pub base_version: usize,
}

impl WrapOperation {
    pub fn new(position: Position, how_many: usize, element: Element, base_version: usize) -> Self {
        WrapOperation {
            position: position.with_stickiness(Stickiness::ToNext),
            how_many,
            element: Some(element.shallow_clone()),
            graveyard_position: None,
            base_version,
        }
    }

    pub fn new_from_graveyard(position: Position, how_many: usize, graveyard_position: Position, base_version: usize) -> Self {
        WrapOperation {
            position: position.with_stickiness(Stickiness::ToNext),
            how_many,
            element: None,
            graveyard_position: Some(graveyard_position.with_stickiness(Stickiness::ToNext)),
            base_version,
        }
    }

    pub fn wrapped_range(&self) -> Range {
        Range::from_position_and_shift(&self.position, self.how_many)
    }

    /// The graveyard position once the wrapped nodes have been taken out.
    fn graveyard_position_after_removal(&self) -> Option<Position> {
        self.graveyard_position.as_ref()
            .and_then(|p| p.transformed_by_deletion(&self.position, self.how_many))
    }

    /// Where the wrapping element is once the operation is applied.
    pub fn element_position(&self) -> Position {
        match self.graveyard_position_after_removal() {
            Some(g) => self.position.transformed_by_deletion(&g, 1).unwrap_or_else(|| self.position.clone()),
            None => self.position.clone(),
        }.with_stickiness(Stickiness::ToNone)
    }

    /// Where the wrapped nodes start once the operation is applied.
    pub fn target_position(&self) -> Position {
        self.element_position().child(0)
    }

    pub fn get_reversed(&self) -> UnwrapOperation {
        UnwrapOperation::new(self.target_position(), self.how_many, Position::graveyard(0), self.base_version + 1)
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        doc.check_flat_run(&self.position, self.how_many)?;
        match (&self.element, &self.graveyard_position) {
            (Some(_), None) => Ok(()),
            (None, Some(g)) => {
                if self.wrapped_range().contains_position(g) || self.graveyard_position_after_removal().is_none() {
                    return Err(ApplyError::MoveIntoItself);
                }
                doc.element_after(g).map(|_| ())
                    .map_err(|_| ApplyError::MissingGraveyardElement(g.clone()))
            }
            _ => Err(ApplyError::InvalidPosition(self.position.clone())),
        }
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        let wrapped = doc.remove_nodes(&self.position, self.how_many)?;

        let mut element = match (&self.element, self.graveyard_position_after_removal()) {
            (_, Some(g)) => match doc.remove_nodes(&g, 1)?.pop() {
                Some(Node::Element(e)) => e,
                _ => return Err(ApplyError::MissingGraveyardElement(g)),
            },
            (Some(e), None) => e.shallow_clone(),
            (None, None) => return Err(ApplyError::InvalidPosition(self.position.clone())),
        };

        element.children.splice(0..0, wrapped);
        doc.insert_nodes(&self.element_position(), vec![Node::Element(element)])
    }
}
