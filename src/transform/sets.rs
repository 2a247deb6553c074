use crate::error::TransformError;
use crate::history::OperationHistory;
use crate::operation::Operation;
use crate::relations::{OpId, Relation, RelationTracker, Side};
use super::{TransformContext, TransformTable};

#[derive(Clone, Copy, Default)]
pub struct TransformSetsOptions<'a> {
    /// Consulted for undo information. Without it nothing counts as undone.
    pub history: Option<&'a dyn OperationHistory>,
    /// Record and use relations between operations. Only useful together with `history`.
    pub use_context: bool,
    /// Pad the shorter result with no-ops so both results have the same length.
    pub pad_with_no_ops: bool,
    pub force_weak_remove: bool,
}

impl std::fmt::Debug for TransformSetsOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformSetsOptions")
            .field("history", &self.history.is_some())
            .field("use_context", &self.use_context)
            .field("pad_with_no_ops", &self.pad_with_no_ops)
            .field("force_weak_remove", &self.force_weak_remove)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformedSets {
    /// `a` transformed, to be applied after all of `b`.
    pub operations_a: Vec<Operation>,
    /// `b` transformed, to be applied after all of `a`.
    pub operations_b: Vec<Operation>,
    /// For each entry in `operations_a`, the index of the input operation it came from. Padding
    /// has no origin.
    pub origins_a: Vec<Option<usize>>,
    pub origins_b: Vec<Option<usize>>,
}

#[derive(Debug)]
struct Slot {
    op: Operation,
    origin: usize,
    /// For entries of `a`: index of the first entry of `b` not yet transformed against.
    next: usize,
}

struct ContextFactory<'a> {
    history: Option<&'a dyn OperationHistory>,
    use_context: bool,
    force_weak_remove: bool,
    originals_a: &'a [Operation],
    originals_b: &'a [Operation],
    relations: RelationTracker,
}

impl<'a> ContextFactory<'a> {
    fn original(&self, side: Side, origin: usize) -> &'a Operation {
        match side {
            Side::A => &self.originals_a[origin],
            Side::B => &self.originals_b[origin],
        }
    }

    fn id(&self, side: Side, origin: usize) -> OpId {
        OpId { side, base_version: self.original(side, origin).base_version() }
    }

    fn was_undone(&self, side: Side, origin: usize) -> bool {
        self.history.is_some_and(|h| h.is_undone_operation(self.original(side, origin)))
    }

    /// The relation between `x` and whatever `y` undoes.
    fn relation(&self, x: (Side, usize), y: (Side, usize)) -> Option<Relation> {
        let history = self.history?;
        let undone = history.undone_operation(self.original(y.0, y.1))?;
        let undone_id = OpId { side: y.0, base_version: undone.base_version() };
        self.relations.get(self.id(x.0, x.1), undone_id).cloned()
    }

    fn context(&self, x: (Side, usize), y: (Side, usize), a_is_strong: bool) -> TransformContext {
        TransformContext {
            a_is_strong,
            a_was_undone: self.was_undone(x.0, x.1),
            b_was_undone: self.was_undone(y.0, y.1),
            ab_relation: if self.use_context { self.relation(x, y) } else { None },
            ba_relation: if self.use_context { self.relation(y, x) } else { None },
            force_weak_remove: self.force_weak_remove,
        }
    }
}

fn pad_with_no_ops(slots: &mut Vec<Slot>, len: usize) {
    while slots.len() < len {
        slots.push(Slot { op: Operation::no_op(0), origin: usize::MAX, next: 0 });
    }
}

fn finish(slots: Vec<Slot>, first_version: Option<usize>) -> (Vec<Operation>, Vec<Option<usize>>) {
    slots.into_iter().enumerate().map(|(i, slot)| {
        let mut op = slot.op;
        if let Some(v) = first_version { op.set_base_version(v + i); }
        (op, (slot.origin != usize::MAX).then_some(slot.origin))
    }).unzip()
}

impl TransformTable {
    /// Transform two sequences of operations against each other. Both sequences must start at
    /// the same document version.
    ///
    /// Every operation in `a` is transformed by every operation in `b` in order, and the other way
    /// around. Transformations can split an operation into several. The new pieces keep being
    /// transformed against the rest of the other sequence, and the other sequence's remaining
    /// operations are transformed against all of the pieces.
    pub fn transform_sets(&self, operations_a: &[Operation], operations_b: &[Operation],
                          options: &TransformSetsOptions) -> Result<TransformedSets, TransformError> {
        let mut a: Vec<Slot> = operations_a.iter().cloned().enumerate()
            .map(|(origin, op)| Slot { op, origin, next: 0 }).collect();
        let mut b: Vec<Slot> = operations_b.iter().cloned().enumerate()
            .map(|(origin, op)| Slot { op, origin, next: 0 }).collect();

        let (Some(last_a), Some(last_b)) = (operations_a.last(), operations_b.last()) else {
            let (operations_a, origins_a) = finish(a, None);
            let (operations_b, origins_b) = finish(b, None);
            return Ok(TransformedSets { operations_a, operations_b, origins_a, origins_b });
        };
        let next_version_a = last_a.base_version() + 1;
        let next_version_b = last_b.base_version() + 1;

        let mut factory = ContextFactory {
            history: options.history,
            use_context: options.use_context,
            force_weak_remove: options.force_weak_remove,
            originals_a: operations_a,
            originals_b: operations_b,
            relations: RelationTracker::default(),
        };

        let mut i = 0;
        while i < a.len() {
            let index_b = a[i].next;
            if index_b >= b.len() {
                i += 1;
                continue;
            }

            let x = (Side::A, a[i].origin);
            let y = (Side::B, b[index_b].origin);
            let (op_a, op_b) = (&a[i].op, &b[index_b].op);

            let new_a = self.transform(op_a, op_b, &factory.context(x, y, true))?;
            let new_b = self.transform(op_b, op_a, &factory.context(y, x, false))?;

            if options.use_context {
                let (id_a, id_b) = (factory.id(x.0, x.1), factory.id(y.0, y.1));
                factory.relations.update(op_a, id_a, op_b, id_b);
                factory.relations.update(op_b, id_b, op_a, id_a);
            }

            let next = index_b + new_b.len();
            a.splice(i..=i, new_a.into_iter().map(|op| Slot { op, origin: x.1, next }));
            b.splice(index_b..=index_b, new_b.into_iter().map(|op| Slot { op, origin: y.1, next: 0 }));
        }

        if options.pad_with_no_ops {
            let len = a.len().max(b.len());
            pad_with_no_ops(&mut a, len);
            pad_with_no_ops(&mut b, len);
        }

        // `a` now goes after `b` and the other way around.
        let (operations_a, origins_a) = finish(a, Some(next_version_b));
        let (operations_b, origins_b) = finish(b, Some(next_version_a));

        tracing::debug!(a = operations_a.len(), b = operations_b.len(), "transformed operation sets");
        Ok(TransformedSets { operations_a, operations_b, origins_a, origins_b })
    }
}

/// Transform two sequences of operations against each other using the shared rule table.
pub fn transform_sets(operations_a: &[Operation], operations_b: &[Operation],
                      options: &TransformSetsOptions) -> Result<TransformedSets, TransformError> {
    TransformTable::shared().transform_sets(operations_a, operations_b, options)
}
