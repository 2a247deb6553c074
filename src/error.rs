use thiserror::Error;
use crate::operation::OpKind;
use crate::position::Position;

/// Errors raised when an operation is applied to a document whose state doesn't match what the
/// operation expects. Transformation never produces these - it trusts its inputs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApplyError {
    #[error("operation base version {op} does not match document version {doc}")]
    VersionMismatch { op: usize, doc: usize },

    #[error("root {0:?} does not exist")]
    MissingRoot(String),

    #[error("position {0:?} does not point into the document")]
    InvalidPosition(Position),

    #[error("position {0:?} does not point at an element")]
    NotAnElement(Position),

    #[error("range starting at {0:?} is not flat or runs past its parent")]
    InvalidRange(Position),

    #[error("trying to move a range into itself")]
    MoveIntoItself,

    #[error("attribute {key:?} does not hold the expected old value")]
    AttributeMismatch { key: String },

    #[error("element name mismatch: expected {expected:?}, found {found:?}")]
    NameMismatch { expected: String, found: String },

    #[error("marker {0:?} does not hold the expected old range")]
    MarkerMismatch(String),

    #[error("merge source and target parents must be elements and sizes must match")]
    InvalidMerge,

    #[error("graveyard holds no element at {0:?}")]
    MissingGraveyardElement(Position),
}

/// A pairwise transformation rule failed. This always points at a defect (or at operations which
/// don't really share a base version) and must not be papered over.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum TransformError {
    #[error("{a:?} x {b:?}: position {pos:?} vanished while transforming")]
    LostPosition { a: OpKind, b: OpKind, pos: Position },

    #[error("{a:?} x {b:?}: {reason}")]
    Invalid { a: OpKind, b: OpKind, reason: &'static str },
}

impl TransformError {
    pub(crate) fn lost(a: OpKind, b: OpKind, pos: &Position) -> Self {
        TransformError::LostPosition { a, b, pos: pos.clone() }
    }
}
