//! Operational transformation for tree-structured rich text documents.
//!
//! Documents are trees: named roots holding elements, which hold more elements or characters.
//! Every change is an [`Operation`]. Two users editing the same version of a document each
//! produce operations, and before one user can apply the other's operations they have to be
//! *transformed* so they still mean the same thing in a document which has moved on.
//!
//! This crate is built out of a few layers:
//!
//! 1. [`Position`] and [`Range`] are plain values addressing the tree by path. Each can compute
//!    where it ends up after any kind of change.
//! 2. [`Operation`] is the closed set of changes: insert, move (and remove), rename, attribute,
//!    root attribute, marker, split, merge, wrap and unwrap. Every operation can be validated
//!    against and applied to a [`Document`], and reversed.
//! 3. [`transform`] transforms one operation by another through an explicit table of pairwise
//!    rules, and [`transform_sets`] does it for two whole sequences, optionally consulting an
//!    [`OperationHistory`] so undo behaves.
//!
//! ## Example
//!
//! ```
//! use tree_ot::*;
//!
//! let mut doc = Document::new();
//! doc.create_root("main", Node::text("abc"));
//!
//! // Two users type at the same spot.
//! let a: Operation = InsertOperation::new(Position::new("main", &[1]), Node::text("x"), 0).into();
//! let b: Operation = InsertOperation::new(Position::new("main", &[1]), Node::text("y"), 0).into();
//!
//! let mut left = doc.clone();
//! left.apply(&a).unwrap();
//! left.apply_all(&transform(&b, &a, &TransformContext::weak()).unwrap()).unwrap();
//!
//! let mut right = doc.clone();
//! right.apply(&b).unwrap();
//! right.apply_all(&transform(&a, &b, &TransformContext::strong()).unwrap()).unwrap();
//!
//! assert!(left.content_eq(&right));
//! ```

pub mod error;
pub mod model;
pub mod position;
pub mod range;
pub mod operation;
pub mod transform;
pub mod relations;
pub mod history;

pub use error::{ApplyError, TransformError};
pub use model::{AttrValue, Attributes, Document, Element, Node, GRAVEYARD};
pub use position::{Position, Stickiness};
pub use range::Range;
pub use operation::{
    AttributeKind, AttributeOperation, InsertOperation, MarkerOperation, MergeOperation, MoveKind, MoveOperation, NoOperation,
    OpKind, Operation, RenameOperation, RootAttributeOperation, SplitOperation, UnwrapOperation,
    WrapOperation,
};
pub use transform::{transform, transform_sets, TransformContext, TransformSetsOptions, TransformTable, TransformedSets};
pub use relations::Relation;
pub use history::{History, OperationHistory};
