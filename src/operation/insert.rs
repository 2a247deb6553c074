#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::{Document, Node};
use crate::operation::MoveOperation;
use crate::position::Position;

/// Insert a list of nodes at a position.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InsertOperation {
    pub position: Position,
    pub nodes: Vec<Node>,
    /// When set, inserted nodes pick up attributes changed around them by concurrent attribute
    /// operations during transformation. Typing inside bold text wants this.
    #[cfg_attr(feature = "serde", serde(default))]
    pub should_receive_attributes: bool,
    pub base_version: usize,
}

impl InsertOperation {
    pub fn new(position: Position, nodes: Vec<Node>, base_version: usize) -> Self {
        InsertOperation { position, nodes, should_receive_attributes: false, base_version }
    }

    pub fn how_many(&self) -> usize {
        self.nodes.len()
    }

    /// Inserting is undone by removing the inserted nodes.
    pub fn get_reversed(&self) -> MoveOperation {
        MoveOperation::new(self.position.clone(), self.how_many(), Position::graveyard(0), self.base_version + 1)
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        doc.parent_of(&self.position).map(|_| ())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        doc.insert_nodes(&self.position, self.nodes.clone())
    }
}
