use smallvec::smallvec;

use crate::model::Node;
use crate::operation::{InsertOperation, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::{Position, Stickiness};
use crate::range::Range;
use crate::transform::{TResult, TransformContext};
use super::{no_op, one};

fn set_range(a: &mut WrapOperation, range: &Range) {
    a.position = range.start.clone().with_stickiness(Stickiness::ToNext);
    a.how_many = range.flat_len();
}

/// `a` is dropped. Its element still ends up in the graveyard, like on the other side where `a`
/// got applied and then reverted.
fn cancelled(a: WrapOperation) -> TResult {
    match (a.element, a.graveyard_position) {
        (Some(element), _) => Ok(one(InsertOperation::new(Position::graveyard(0), vec![Node::Element(element)], 0))),
        (None, Some(g)) if g.offset() != 0 => Ok(one(MoveOperation::new(g, 1, Position::graveyard(0), 0))),
        _ => Ok(no_op()),
    }
}

pub(super) fn by_insert(mut a: WrapOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    // Only nodes inserted between the wrapped ones. Deeper insertions stay inside their node.
    if a.position.has_same_parent_as(&b.position) && a.wrapped_range().contains_position(&b.position) {
        a.how_many += b.how_many();
    }
    a.position = a.position.transformed_by_insert_operation(b);
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_insert_operation(b));
    Ok(one(a))
}

pub(super) fn by_move(mut a: WrapOperation, b: &MoveOperation, _ctx: &TransformContext) -> TResult {
    let wrapped = a.wrapped_range();
    let moved = b.moved_range();
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_move_operation(b));

    if moved.start.has_same_parent_as(&wrapped.start) {
        // Everything is moved. The wrap follows.
        if moved.contains_range(&wrapped, true) {
            a.position = a.position.combined(&b.source_position, &b.moved_range_start());
            return Ok(one(a));
        }

        // Moved nodes are not wrapped any more.
        let (ws, we) = (wrapped.start.offset(), wrapped.end.offset());
        let (ms, me) = (moved.start.offset(), moved.end.offset());
        let overlap = me.min(we).saturating_sub(ms.max(ws));
        let removed_before = me.min(ws).saturating_sub(ms);

        let mut start = ws - removed_before;
        let mut how_many = a.how_many - overlap;

        // Nodes moved in between the wrapped nodes get wrapped too.
        let target = b.moved_range_start();
        if target.has_same_parent_as(&wrapped.start) {
            let t = target.offset();
            if t > start && t < start + how_many {
                how_many += b.how_many;
            } else if t <= start {
                start += b.how_many;
            }
        }

        a.position.set_offset(start);
        // Nodes moved somewhere before the wrapped ones shift them too.
        if !target.has_same_parent_as(&wrapped.start) {
            a.position = a.position.transformed_by_insertion(&target, b.how_many);
        }
        a.how_many = how_many;
        return Ok(one(a));
    }

    if b.target_position.has_same_parent_as(&wrapped.start) && wrapped.contains_position(&b.target_position) {
        a.how_many += b.how_many;
    }
    a.position = a.position.transformed_by_move_operation(b);
    Ok(one(a))
}

pub(super) fn by_split(mut a: WrapOperation, b: &SplitOperation, _ctx: &TransformContext) -> TResult {
    let wrapped = a.wrapped_range();
    let k = b.split_position.offset();

    // The parent of the wrapped nodes was split between them. Both halves get wrapped.
    if b.split_position.has_same_parent_as(&wrapped.start)
        && wrapped.start.offset() < k && k < wrapped.end.offset() {
        let first_count = k - wrapped.start.offset();
        let second_position = b.move_target_position();
        let second_count = wrapped.end.offset() - k;
        a.how_many = first_count;

        return match a.element.clone() {
            Some(element) => {
                let second = WrapOperation::new(second_position, second_count, element, 0);
                Ok(smallvec![a.into(), second.into()])
            }
            None => {
                // Copy the graveyard element with an empty split, and use the copy for the second half.
                let graveyard = a.graveyard_position.clone()
                    .unwrap_or_else(|| Position::graveyard(0))
                    .transformed_by_split_operation(b);
                let copy_at = graveyard.child(0);
                let copy_insertion = SplitOperation::insertion_position_for(&copy_at);
                let copy = SplitOperation::new(copy_at, 0, copy_insertion, None, 0);

                a.graveyard_position = Some(graveyard.clone());
                let second = WrapOperation::new_from_graveyard(second_position, second_count, graveyard, 0);
                Ok(smallvec![copy.into(), a.into(), second.into()])
            }
        };
    }

    // One of the wrapped elements was split. The new element is wrapped too.
    let insertion = &b.insertion_position;
    if insertion.has_same_parent_as(&wrapped.start)
        && insertion.offset() > wrapped.start.offset() && insertion.offset() <= wrapped.end.offset() {
        a.how_many += 1;
    }

    a.position = a.position.transformed_by_split_operation(b);
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_split_operation(b));
    Ok(one(a))
}

pub(super) fn by_merge(mut a: WrapOperation, b: &MergeOperation, _ctx: &TransformContext) -> TResult {
    let range = a.wrapped_range().transformed_by_merge_operation(b);
    set_range(&mut a, &range);
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_merge_operation(b));
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: WrapOperation, b: &WrapOperation, ctx: &TransformContext) -> TResult {
    let range_a = a.wrapped_range();
    let range_b = b.wrapped_range();
    let same = range_a == range_b;

    if !same && !range_a.is_intersecting(&range_b) {
        a.position = a.position.transformed_by_wrap_operation(b);
        a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_wrap_operation(b));
        return Ok(one(a));
    }

    let a_contains_b = range_a.contains_range(&range_b, true);
    let b_contains_a = range_b.contains_range(&range_a, true);

    // The contained wrap is cancelled. For the same range, the weaker one.
    if (same && !ctx.a_is_strong) || (!same && b_contains_a) {
        a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_wrap_operation(b));
        return cancelled(a);
    }

    let partial = !same && !a_contains_b;
    if partial && !ctx.a_is_strong {
        // Only wrap the nodes `b` did not take.
        let Some(mine) = range_a.difference(&range_b).first().cloned() else { return Ok(no_op()) };
        set_range(&mut a, &mine.transformed_by_wrap_operation(b));
        a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_wrap_operation(b));
        return Ok(one(a));
    }

    // Revert `b` and wrap in its place.
    let reverted = b.get_reversed();
    a.position = a.position.transformed_by_wrap_operation(b).transformed_by_unwrap_operation(&reverted);
    a.graveyard_position = a.graveyard_position
        .map(|g| g.transformed_by_wrap_operation(b).transformed_by_unwrap_operation(&reverted));

    let leftover = range_b.difference(&range_a).first().cloned();
    match leftover {
        Some(leftover) if partial => {
            // `b`'s element is on top of the graveyard now. Wrap the rest of its nodes with it.
            let rewrap = leftover.transformed_by_wrap_operation(&a);
            let rewrap = WrapOperation::new_from_graveyard(rewrap.start.clone(), rewrap.flat_len(), Position::graveyard(0), 0);
            Ok(smallvec![reverted.into(), a.into(), rewrap.into()])
        }
        _ => Ok(smallvec![reverted.into(), a.into()]),
    }
}

pub(super) fn by_unwrap(mut a: WrapOperation, b: &UnwrapOperation, _ctx: &TransformContext) -> TResult {
    let range = a.wrapped_range().transformed_by_unwrap_operation(b);
    set_range(&mut a, &range);
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_unwrap_operation(b));
    Ok(one(a))
}
