//! The pairwise transformation rules. Each file holds the rules for one kind of transformed
//! operation (`a`). A rule takes ownership of (a clone of) `a` and returns what's left of it.

use smallvec::smallvec;

use crate::operation::{MoveOperation, OpKind, Operation};
use crate::position::Position;
use crate::range::Range;
use super::{Ops, TransformTable};

mod attribute;
mod insert;
mod marker;
mod merge;
mod move_op;
mod rename;
mod root_attribute;
mod split;
mod unwrap;
mod wrap;

// Registers a typed rule. The closure never captures anything, so it coerces to a plain fn.
macro_rules! rule {
    ($table:expr, $a:ident x $b:ident => $f:path) => {
        $table.set(OpKind::$a, OpKind::$b, |a, b, ctx| match (a, b) {
            (Operation::$a(a), Operation::$b(b)) => $f(a, b, ctx),
            _ => unreachable!("Rule registered for the wrong operation kinds"),
        })
    };
}

pub(super) fn register(t: &mut TransformTable) {
    rule!(t, Attribute x Attribute => attribute::by_attribute);
    rule!(t, Attribute x Insert => attribute::by_insert);
    rule!(t, Attribute x Move => attribute::by_move);
    rule!(t, Attribute x Split => attribute::by_split);
    rule!(t, Attribute x Merge => attribute::by_merge);
    rule!(t, Attribute x Wrap => attribute::by_wrap);
    rule!(t, Attribute x Unwrap => attribute::by_unwrap);

    rule!(t, Insert x Attribute => insert::by_attribute);
    rule!(t, Insert x Insert => insert::by_insert);
    rule!(t, Insert x Move => insert::by_move);
    rule!(t, Insert x Split => insert::by_split);
    rule!(t, Insert x Merge => insert::by_merge);
    rule!(t, Insert x Wrap => insert::by_wrap);
    rule!(t, Insert x Unwrap => insert::by_unwrap);

    rule!(t, Marker x Insert => marker::by_insert);
    rule!(t, Marker x Marker => marker::by_marker);
    rule!(t, Marker x Move => marker::by_move);
    rule!(t, Marker x Split => marker::by_split);
    rule!(t, Marker x Merge => marker::by_merge);
    rule!(t, Marker x Wrap => marker::by_wrap);
    rule!(t, Marker x Unwrap => marker::by_unwrap);

    rule!(t, Merge x Insert => merge::by_insert);
    rule!(t, Merge x Move => merge::by_move);
    rule!(t, Merge x Split => merge::by_split);
    rule!(t, Merge x Merge => merge::by_merge);
    rule!(t, Merge x Wrap => merge::by_wrap);
    rule!(t, Merge x Unwrap => merge::by_unwrap);

    rule!(t, Move x Insert => move_op::by_insert);
    rule!(t, Move x Move => move_op::by_move);
    rule!(t, Move x Split => move_op::by_split);
    rule!(t, Move x Merge => move_op::by_merge);
    rule!(t, Move x Wrap => move_op::by_wrap);
    rule!(t, Move x Unwrap => move_op::by_unwrap);

    rule!(t, Rename x Insert => rename::by_insert);
    rule!(t, Rename x Move => rename::by_move);
    rule!(t, Rename x Rename => rename::by_rename);
    rule!(t, Rename x Split => rename::by_split);
    rule!(t, Rename x Merge => rename::by_merge);
    rule!(t, Rename x Wrap => rename::by_wrap);
    rule!(t, Rename x Unwrap => rename::by_unwrap);

    rule!(t, RootAttribute x RootAttribute => root_attribute::by_root_attribute);

    rule!(t, Split x Insert => split::by_insert);
    rule!(t, Split x Move => split::by_move);
    rule!(t, Split x Split => split::by_split);
    rule!(t, Split x Merge => split::by_merge);
    rule!(t, Split x Wrap => split::by_wrap);
    rule!(t, Split x Unwrap => split::by_unwrap);

    rule!(t, Wrap x Insert => wrap::by_insert);
    rule!(t, Wrap x Move => wrap::by_move);
    rule!(t, Wrap x Split => wrap::by_split);
    rule!(t, Wrap x Merge => wrap::by_merge);
    rule!(t, Wrap x Wrap => wrap::by_wrap);
    rule!(t, Wrap x Unwrap => wrap::by_unwrap);

    rule!(t, Unwrap x Insert => unwrap::by_insert);
    rule!(t, Unwrap x Move => unwrap::by_move);
    rule!(t, Unwrap x Split => unwrap::by_split);
    rule!(t, Unwrap x Merge => unwrap::by_merge);
    rule!(t, Unwrap x Wrap => unwrap::by_wrap);
    rule!(t, Unwrap x Unwrap => unwrap::by_unwrap);
}

fn no_op() -> Ops {
    smallvec![Operation::no_op(0)]
}

fn one(op: impl Into<Operation>) -> Ops {
    smallvec![op.into()]
}

/// Turn flat ranges into moves to `target`, in order. Each generated move shifts the ranges and
/// target of the moves after it, so those are fixed up as we go.
fn make_move_operations(mut ranges: Vec<Range>, mut target: Position) -> Ops {
    let mut result = Ops::new();

    for i in 0..ranges.len() {
        let range = &ranges[i];
        let op = MoveOperation::new(range.start.clone(), range.flat_len(), target.clone(), 0);

        for j in i + 1..ranges.len() {
            // The remaining ranges never intersect the moved one, so this always gives one range.
            let transformed = ranges[j].transformed_by_move_operation(&op, false);
            ranges[j] = transformed[0].clone();
        }
        target = target.transformed_by_move_operation(&op);
        result.push(op.into());
    }

    result
}

/// A range following a flat run of nodes through a transformation of its boundaries. Collapsed
/// results are dropped.
fn non_collapsed(range: Range) -> Option<Range> {
    (!range.is_collapsed()).then_some(range)
}
