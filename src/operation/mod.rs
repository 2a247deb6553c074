//! Operations are the atomic, reversible, versioned edits made to a [`Document`].
//!
//! Every kind of operation is its own struct. They're wrapped up in the closed [`Operation`] enum,
//! which is what the transformation code dispatches on. Each operation knows how to:
//!
//! - validate itself against a document (only done when applying - transformation trusts its
//!   inputs),
//! - apply itself,
//! - produce its reverse (an operation which undoes it, valid at the next version).

use std::fmt::{Display, Formatter};
use num_enum::{IntoPrimitive, TryFromPrimitive};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::model::Document;

mod insert;
mod move_op;
mod rename;
mod attribute;
mod root_attribute;
mod marker;
mod split;
mod merge;
mod wrap;
mod unwrap;

pub use insert::InsertOperation;
pub use move_op::{MoveKind, MoveOperation};
pub use rename::RenameOperation;
pub use attribute::{AttributeKind, AttributeOperation};
pub use root_attribute::RootAttributeOperation;
pub use marker::MarkerOperation;
pub use split::SplitOperation;
pub use merge::MergeOperation;
pub use wrap::WrapOperation;
pub use unwrap::UnwrapOperation;

/// The discriminant of an [`Operation`]. Used as an index into the transformation table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpKind {
    Insert = 0,
    Move,
    Rename,
    Attribute,
    RootAttribute,
    Marker,
    Split,
    Merge,
    Wrap,
    Unwrap,
    NoOp,
}

impl OpKind {
    pub const COUNT: usize = OpKind::NoOp as usize + 1;
}

/// An explicitly empty edit. Produced by transformations when nothing is left to do, and used to
/// pad transformed sequences.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoOperation {
    pub base_version: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(tag = "type"))]
pub enum Operation {
    Insert(InsertOperation),
    Move(MoveOperation),
    Rename(RenameOperation),
    Attribute(AttributeOperation),
    RootAttribute(RootAttributeOperation),
    Marker(MarkerOperation),
    Split(SplitOperation),
    Merge(MergeOperation),
    Wrap(WrapOperation),
    Unwrap(UnwrapOperation),
    NoOp(NoOperation),
}

// Forwards a method call to whichever operation struct is inside.
macro_rules! each_op {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            Operation::Insert($op) => $body,
            Operation::Move($op) => $body,
            Operation::Rename($op) => $body,
            Operation::Attribute($op) => $body,
            Operation::RootAttribute($op) => $body,
            Operation::Marker($op) => $body,
            Operation::Split($op) => $body,
            Operation::Merge($op) => $body,
            Operation::Wrap($op) => $body,
            Operation::Unwrap($op) => $body,
            Operation::NoOp($op) => $body,
        }
    };
}

impl Operation {
    pub fn no_op(base_version: usize) -> Self {
        Operation::NoOp(NoOperation { base_version })
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Insert(_) => OpKind::Insert,
            Operation::Move(_) => OpKind::Move,
            Operation::Rename(_) => OpKind::Rename,
            Operation::Attribute(_) => OpKind::Attribute,
            Operation::RootAttribute(_) => OpKind::RootAttribute,
            Operation::Marker(_) => OpKind::Marker,
            Operation::Split(_) => OpKind::Split,
            Operation::Merge(_) => OpKind::Merge,
            Operation::Wrap(_) => OpKind::Wrap,
            Operation::Unwrap(_) => OpKind::Unwrap,
            Operation::NoOp(_) => OpKind::NoOp,
        }
    }

    pub fn base_version(&self) -> usize {
        each_op!(self, op => op.base_version)
    }

    pub fn set_base_version(&mut self, base_version: usize) {
        each_op!(self, op => op.base_version = base_version)
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, Operation::NoOp(_))
    }

    /// Whether the operation changes anything a user could see. Operations which only shuffle
    /// content around inside the graveyard (and markers which don't affect data) aren't document
    /// operations.
    pub fn is_document_operation(&self) -> bool {
        match self {
            Operation::Insert(op) => !op.position.is_in_graveyard(),
            Operation::Move(op) => !(op.source_position.is_in_graveyard() && op.target_position.is_in_graveyard()),
            Operation::Rename(op) => !op.position.is_in_graveyard(),
            Operation::Attribute(op) => !op.range.start.is_in_graveyard(),
            Operation::RootAttribute(_) => true,
            Operation::Marker(op) => op.affects_data,
            Operation::Split(op) => !op.split_position.is_in_graveyard(),
            Operation::Merge(op) => !op.source_position.is_in_graveyard() || !op.target_position.is_in_graveyard(),
            Operation::Wrap(op) => !op.position.is_in_graveyard(),
            Operation::Unwrap(op) => !op.position.is_in_graveyard(),
            Operation::NoOp(_) => true,
        }
    }

    /// An operation which undoes this one. Its base version is this operation's version + 1.
    pub fn get_reversed(&self) -> Operation {
        match self {
            Operation::Insert(op) => op.get_reversed().into(),
            Operation::Move(op) => op.get_reversed().into(),
            Operation::Rename(op) => op.get_reversed().into(),
            Operation::Attribute(op) => op.get_reversed().into(),
            Operation::RootAttribute(op) => op.get_reversed().into(),
            Operation::Marker(op) => op.get_reversed().into(),
            Operation::Split(op) => op.get_reversed().into(),
            Operation::Merge(op) => op.get_reversed().into(),
            Operation::Wrap(op) => op.get_reversed().into(),
            Operation::Unwrap(op) => op.get_reversed().into(),
            Operation::NoOp(op) => Operation::no_op(op.base_version + 1),
        }
    }

    /// Check the operation can be applied to the document as it is now.
    pub fn validate(&self, doc: &Document) -> Result<(), ApplyError> {
        match self {
            Operation::NoOp(_) => Ok(()),
            Operation::Insert(op) => op.validate(doc),
            Operation::Move(op) => op.validate(doc),
            Operation::Rename(op) => op.validate(doc),
            Operation::Attribute(op) => op.validate(doc),
            Operation::RootAttribute(op) => op.validate(doc),
            Operation::Marker(op) => op.validate(doc),
            Operation::Split(op) => op.validate(doc),
            Operation::Merge(op) => op.validate(doc),
            Operation::Wrap(op) => op.validate(doc),
            Operation::Unwrap(op) => op.validate(doc),
        }
    }

    /// Apply the operation without checking versions or preconditions. Use
    /// [`Document::apply`] instead.
    pub(crate) fn execute(&self, doc: &mut Document) -> Result<(), ApplyError> {
        match self {
            Operation::NoOp(_) => Ok(()),
            Operation::Insert(op) => op.execute(doc),
            Operation::Move(op) => op.execute(doc),
            Operation::Rename(op) => op.execute(doc),
            Operation::Attribute(op) => op.execute(doc),
            Operation::RootAttribute(op) => op.execute(doc),
            Operation::Marker(op) => op.execute(doc),
            Operation::Split(op) => op.execute(doc),
            Operation::Merge(op) => op.execute(doc),
            Operation::Wrap(op) => op.execute(doc),
            Operation::Unwrap(op) => op.execute(doc),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{}", self.kind(), self.base_version())
    }
}

macro_rules! impl_from_op {
    ($($variant:ident($ty:ty)),*) => {
        $(impl From<$ty> for Operation {
            fn from(op: $ty) -> Self { Operation::$variant(op) }
        })*
    };
}

impl_from_op!(Insert(InsertOperation), Move(MoveOperation), Rename(RenameOperation),
    Attribute(AttributeOperation), RootAttribute(RootAttributeOperation), Marker(MarkerOperation),
    Split(SplitOperation), Merge(MergeOperation), Wrap(WrapOperation), Unwrap(UnwrapOperation),
    NoOp(NoOperation));
