//! Undo bookkeeping.
//!
//! Transformation only needs to ask two questions about the past: was this operation undone, and
//! which operation (if any) does this one undo? That's the [`OperationHistory`] trait. [`History`]
//! is a straightforward in-memory implementation, keyed by base version.

use std::collections::{BTreeMap, BTreeSet};
use crate::operation::Operation;

pub trait OperationHistory {
    /// Whether some later operation undid `op`.
    fn is_undone_operation(&self, op: &Operation) -> bool;

    /// The operation `op` undoes, if `op` is an undoing operation.
    fn undone_operation(&self, op: &Operation) -> Option<&Operation>;
}

/// A log of every operation applied to a document, in order.
#[derive(Debug, Clone, Default)]
pub struct History {
    operations: Vec<Operation>,
    /// Undoing operation base version -> undone operation base version.
    undo_pairs: BTreeMap<usize, usize>,
    undone: BTreeSet<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation. Operations must be added in version order.
    pub fn add_operation(&mut self, op: Operation) {
        debug_assert_eq!(op.base_version(), self.operations.len(), "History must be appended in order");
        self.operations.push(op);
    }

    pub fn version(&self) -> usize {
        self.operations.len()
    }

    pub fn operation(&self, base_version: usize) -> Option<&Operation> {
        self.operations.get(base_version)
    }

    /// All operations with base versions in `from..to`.
    pub fn operations(&self, from: usize, to: usize) -> &[Operation] {
        let to = to.min(self.operations.len());
        if from >= to { return &[]; }
        &self.operations[from..to]
    }

    /// Record that the operation at `undoing` reverts the one at `undone`.
    pub fn set_operation_as_undone(&mut self, undone: usize, undoing: usize) {
        self.undo_pairs.insert(undoing, undone);
        self.undone.insert(undone);
    }

    pub fn is_undoing_operation(&self, op: &Operation) -> bool {
        self.undo_pairs.contains_key(&op.base_version())
    }
}

impl OperationHistory for History {
    fn is_undone_operation(&self, op: &Operation) -> bool {
        self.undone.contains(&op.base_version())
    }

    fn undone_operation(&self, op: &Operation) -> Option<&Operation> {
        self.undo_pairs.get(&op.base_version())
            .and_then(|&undone| self.operations.get(undone))
    }
}
