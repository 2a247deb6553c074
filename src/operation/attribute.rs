use smartstring::alias::String as SmartString;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::{AttrValue, Document};
use crate::range::Range;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttributeKind { Add, Remove, Change }

/// Set, remove or change an attribute on every node in a flat range.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttributeOperation {
    pub range: Range,
    pub key: SmartString,
    pub old_value: Option<AttrValue>,
    pub new_value: Option<AttrValue>,
    pub base_version: usize,
}

impl AttributeOperation {
    pub fn new(range: Range, key: &str, old_value: Option<AttrValue>, new_value: Option<AttrValue>, base_version: usize) -> Self {
        AttributeOperation { range, key: key.into(), old_value, new_value, base_version }
    }

    pub fn kind(&self) -> AttributeKind {
        match (&self.old_value, &self.new_value) {
            (None, _) => AttributeKind::Add,
            (_, None) => AttributeKind::Remove,
            _ => AttributeKind::Change,
        }
    }

    pub fn get_reversed(&self) -> AttributeOperation {
        AttributeOperation {
            range: self.range.clone(),
            key: self.key.clone(),
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
            base_version: self.base_version + 1,
        }
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        if !self.range.is_flat() {
            return Err(ApplyError::InvalidRange(self.range.start.clone()));
        }
        doc.check_flat_run(&self.range.start, self.range.flat_len())?;

        let parent = doc.parent_of(&self.range.start)?;
        let nodes = &parent.children[self.range.start.offset()..self.range.end.offset()];
        for node in nodes {
            let current = node.attribute(&self.key);
            let ok = match &self.old_value {
                Some(old) => current == Some(old),
                // Adding an attribute which is already there is a conflict, unless this is a no-op.
                None => current.is_none() || self.new_value.is_none(),
            };
            if !ok {
                return Err(ApplyError::AttributeMismatch { key: self.key.to_string() });
            }
        }
        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        if self.old_value == self.new_value { return Ok(()); }

        let (start, end) = (self.range.start.offset(), self.range.end.offset());
        let parent = doc.parent_of_mut(&self.range.start)?;
        for node in &mut parent.children[start..end] {
            match &self.new_value {
                Some(v) => { node.attrs_mut().insert(self.key.clone(), v.clone()); }
                None => { node.attrs_mut().remove(&self.key); }
            }
        }
        Ok(())
    }
}
