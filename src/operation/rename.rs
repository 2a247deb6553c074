use smartstring::alias::String as SmartString;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::Document;
use crate::position::{Position, Stickiness};

/// Change the name of the element right after `position`.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenameOperation {
    pub position: Position,
    pub old_name: SmartString,
    pub new_name: SmartString,
    pub base_version: usize,
}

impl RenameOperation {
    pub fn new(position: Position, old_name: &str, new_name: &str, base_version: usize) -> Self {
        RenameOperation { position: position.with_stickiness(Stickiness::ToNext), old_name: old_name.into(), new_name: new_name.into(), base_version }
    }

    pub fn get_reversed(&self) -> RenameOperation {
        RenameOperation {
            position: self.position.clone(),
            old_name: self.new_name.clone(),
            new_name: self.old_name.clone(),
            base_version: self.base_version + 1,
        }
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        let element = doc.element_after(&self.position)?;
        if element.name != self.old_name {
            return Err(ApplyError::NameMismatch { expected: self.old_name.to_string(), found: element.name.to_string() });
        }
        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        // Renames which were transformed into no-ops still go through here.
        if self.old_name == self.new_name { return Ok(()); }
        let element = doc.element_at_mut(&self.position.root, &self.position.path)?;
        element.name = self.new_name.clone();
        Ok(())
    }
}
