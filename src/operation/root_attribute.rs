use smartstring::alias::String as SmartString;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::{AttrValue, Document};

/// Change an attribute on a root element.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RootAttributeOperation {
    pub root: SmartString,
    pub key: SmartString,
    pub old_value: Option<AttrValue>,
    pub new_value: Option<AttrValue>,
    pub base_version: usize,
}

impl RootAttributeOperation {
    pub fn new(root: &str, key: &str, old_value: Option<AttrValue>, new_value: Option<AttrValue>, base_version: usize) -> Self {
        RootAttributeOperation { root: root.into(), key: key.into(), old_value, new_value, base_version }
    }

    pub fn get_reversed(&self) -> RootAttributeOperation {
        RootAttributeOperation {
            root: self.root.clone(),
            key: self.key.clone(),
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
            base_version: self.base_version + 1,
        }
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        let root = doc.root(&self.root).ok_or_else(|| ApplyError::MissingRoot(self.root.to_string()))?;
        let current = root.attrs.get(&self.key);
        let ok = match &self.old_value {
            Some(old) => current == Some(old),
            None => current.is_none() || self.new_value.is_none(),
        };
        if ok { Ok(()) } else { Err(ApplyError::AttributeMismatch { key: self.key.to_string() }) }
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        let root = doc.root_mut(&self.root)?;
        match &self.new_value {
            Some(v) => { root.attrs.insert(self.key.clone(), v.clone()); }
            None => { root.attrs.remove(&self.key); }
        }
        Ok(())
    }
}
