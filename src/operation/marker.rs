use smartstring::alias::String as SmartString;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::Document;
use crate::range::Range;

/// Add, move or remove a named marker. A `None` range means the marker doesn't exist.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkerOperation {
    pub name: SmartString,
    pub old_range: Option<Range>,
    pub new_range: Option<Range>,
    /// Markers like comments are part of the data. Selection-like markers aren't.
    #[cfg_attr(feature = "serde", serde(default))]
    pub affects_data: bool,
    pub base_version: usize,
}

impl MarkerOperation {
    pub fn new(name: &str, old_range: Option<Range>, new_range: Option<Range>, affects_data: bool, base_version: usize) -> Self {
        MarkerOperation { name: name.into(), old_range, new_range, affects_data, base_version }
    }

    pub fn get_reversed(&self) -> MarkerOperation {
        MarkerOperation {
            name: self.name.clone(),
            old_range: self.new_range.clone(),
            new_range: self.old_range.clone(),
            affects_data: self.affects_data,
            base_version: self.base_version + 1,
        }
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        if let Some(range) = &self.new_range {
            doc.parent_of(&range.start)?;
            doc.parent_of(&range.end)?;
        }
        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        match &self.new_range {
            Some(range) => { doc.markers_mut().insert(self.name.clone(), range.clone()); }
            None => { doc.markers_mut().remove(&self.name); }
        }
        Ok(())
    }
}
