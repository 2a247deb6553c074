//! Operational transformation.
//!
//! Given two operations `a` and `b` which were both created against the same document version,
//! [`transform`] produces `a'`: a list of operations with the intention of `a`, valid in the
//! document after `b` has been applied. Applying `b` then `transform(a, b)` gives the same document
//! as applying `a` then `transform(b, a)` (with the strength flag flipped).
//!
//! The actual rules live in the [`rules`] submodule, one file per kind of the transformed
//! operation. They're looked up through an explicit dispatch table indexed by [`OpKind`]. Pairs
//! with no registered rule don't affect each other and `a` is returned unchanged.

use lazy_static::lazy_static;
use smallvec::{smallvec, SmallVec};

use crate::error::TransformError;
use crate::operation::{OpKind, Operation};
use crate::relations::Relation;

mod rules;
mod sets;

pub use sets::{transform_sets, TransformSetsOptions, TransformedSets};

/// The result of transforming one operation. Almost always a single operation.
pub type Ops = SmallVec<[Operation; 1]>;

pub(crate) type TResult = Result<Ops, TransformError>;

pub(crate) type Rule = fn(Operation, &Operation, &TransformContext) -> TResult;

/// Everything a rule needs to know beyond the two operations themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformContext {
    /// Breaks ties when both operations want the same spot. The two sides of a transformation
    /// must always be called with opposite values.
    pub a_is_strong: bool,
    pub a_was_undone: bool,
    pub b_was_undone: bool,
    /// What was recorded about `a` and the operation `b` is undoing, if any.
    pub ab_relation: Option<Relation>,
    pub ba_relation: Option<Relation>,
    /// Treat removals like any other move, without giving them priority.
    pub force_weak_remove: bool,
}

impl TransformContext {
    pub fn strong() -> Self {
        TransformContext { a_is_strong: true, ..Default::default() }
    }

    pub fn weak() -> Self {
        TransformContext::default()
    }

    /// The context for the other direction of the same pair.
    pub fn flipped(&self) -> Self {
        TransformContext {
            a_is_strong: !self.a_is_strong,
            a_was_undone: self.b_was_undone,
            b_was_undone: self.a_was_undone,
            ab_relation: self.ba_relation.clone(),
            ba_relation: self.ab_relation.clone(),
            force_weak_remove: self.force_weak_remove,
        }
    }
}

/// Pairwise rules, indexed by the kinds of the transformed and the applied operation.
pub struct TransformTable {
    rules: [[Option<Rule>; OpKind::COUNT]; OpKind::COUNT],
}

lazy_static! {
    static ref TABLE: TransformTable = TransformTable::new();
}

impl Default for TransformTable {
    fn default() -> Self { Self::new() }
}

impl TransformTable {
    /// Build the complete table. Done once, the result is immutable.
    pub fn new() -> Self {
        let mut table = TransformTable { rules: [[None; OpKind::COUNT]; OpKind::COUNT] };
        rules::register(&mut table);
        table
    }

    /// The shared table used by [`transform`] and [`transform_sets`].
    pub fn shared() -> &'static TransformTable {
        &TABLE
    }

    pub(crate) fn set(&mut self, a: OpKind, b: OpKind, rule: Rule) {
        let slot = &mut self.rules[usize::from(u8::from(a))][usize::from(u8::from(b))];
        debug_assert!(slot.is_none(), "Rule for {:?} x {:?} registered twice", a, b);
        *slot = Some(rule);
    }

    pub fn has_rule(&self, a: OpKind, b: OpKind) -> bool {
        self.rules[usize::from(u8::from(a))][usize::from(u8::from(b))].is_some()
    }

    /// Transform `a` so it can be applied after `b`. The resulting operations are numbered
    /// consecutively, starting right after `b`.
    pub fn transform(&self, a: &Operation, b: &Operation, ctx: &TransformContext) -> TResult {
        let rule = self.rules[usize::from(u8::from(a.kind()))][usize::from(u8::from(b.kind()))];

        let mut result = match rule {
            // A move leaving everything in place changes nothing, and nothing changes it.
            _ if is_idle_move(a) => smallvec![Operation::no_op(0)],
            _ if is_idle_move(b) => smallvec![a.clone()],
            None => smallvec![a.clone()],
            Some(rule) => match rule(a.clone(), b, ctx) {
                Ok(ops) => ops,
                Err(err) => {
                    tracing::error!(?a, ?b, ?ctx, %err, "Error during operation transformation");
                    return Err(err);
                }
            },
        };

        if result.is_empty() {
            result.push(Operation::no_op(0));
        }
        for (i, op) in result.iter_mut().enumerate() {
            op.set_base_version(b.base_version() + 1 + i);
        }

        tracing::trace!(?a, ?b, ?result, "transformed");
        Ok(result)
    }
}

fn is_idle_move(op: &Operation) -> bool {
    matches!(op, Operation::Move(op) if op.how_many == 0 || op.moved_range_start() == op.source_position)
}

/// Transform `a` by `b` using the shared rule table.
pub fn transform(a: &Operation, b: &Operation, ctx: &TransformContext) -> TResult {
    TABLE.transform(a, b, ctx)
}
