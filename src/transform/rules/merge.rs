use smallvec::smallvec;

use crate::operation::{InsertOperation, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::Stickiness;
use crate::relations::Relation;
use crate::transform::{TResult, TransformContext};
use super::{no_op, one};

pub(super) fn by_insert(mut a: MergeOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    if a.source_position.has_same_parent_as(&b.position) {
        a.how_many += b.how_many();
    }
    a.source_position = a.source_position.transformed_by_insert_operation(b);
    a.target_position = a.target_position.transformed_by_insert_operation(b);
    a.graveyard_position = a.graveyard_position.transformed_by_insert_operation(b);
    Ok(one(a))
}

pub(super) fn by_merge(mut a: MergeOperation, b: &MergeOperation, ctx: &TransformContext) -> TResult {
    if a.source_position == b.source_position && a.target_position == b.target_position {
        if !ctx.b_was_undone {
            return Ok(no_op());
        }
        // Merge the (now empty) element from the graveyard. Nothing happens, but a later split
        // undoing `b` can still turn this back into a real merge.
        a.source_position = b.graveyard_position.child(0).with_stickiness(Stickiness::ToPrevious);
        a.how_many = 0;
        return Ok(one(a));
    }

    // The same element was merged into different places.
    if a.source_position == b.source_position && !ctx.b_was_undone
        && ctx.ab_relation != Some(Relation::SplitAtSource) {
        let a_to_graveyard = a.target_position.is_in_graveyard();
        let b_to_graveyard = b.target_position.is_in_graveyard();

        let a_is_weak = a_to_graveyard && !b_to_graveyard;
        let b_is_weak = b_to_graveyard && !a_to_graveyard;
        let force_move = b_is_weak || (!a_is_weak && ctx.a_is_strong);

        if !force_move {
            return Ok(no_op());
        }
        let source = b.target_position.transformed_by_merge_operation(b);
        let target = a.target_position.transformed_by_merge_operation(b);
        return Ok(one(MoveOperation::new(source, a.how_many, target, 0)));
    }

    if a.source_position.has_same_parent_as(&b.target_position) {
        a.how_many += b.how_many;
    }

    a.source_position = a.source_position.transformed_by_merge_operation(b);
    a.target_position = a.target_position.transformed_by_merge_operation(b);

    if a.graveyard_position != b.graveyard_position || !ctx.a_is_strong {
        a.graveyard_position = a.graveyard_position.transformed_by_merge_operation(b);
    }
    Ok(one(a))
}

pub(super) fn by_move(mut a: MergeOperation, b: &MoveOperation, ctx: &TransformContext) -> TResult {
    // The merged element got removed. Nothing to merge.
    if b.is_remove() && !ctx.b_was_undone && !ctx.force_weak_remove
        && a.deletion_position().has_same_parent_as(&b.source_position)
        && b.moved_range().contains_position(&a.source_position) {
        return Ok(no_op());
    }

    if a.source_position.has_same_parent_as(&b.target_position) {
        a.how_many += b.how_many;
    }
    if a.source_position.has_same_parent_as(&b.source_position) {
        a.how_many -= b.how_many;
    }

    a.source_position = a.source_position.transformed_by_move_operation(b);
    a.target_position = a.target_position.transformed_by_move_operation(b);

    // Merges treat the graveyard like a strong insertion would.
    if a.graveyard_position != b.target_position {
        a.graveyard_position = a.graveyard_position.transformed_by_move_operation(b);
    }
    Ok(one(a))
}

pub(super) fn by_split(mut a: MergeOperation, b: &SplitOperation, ctx: &TransformContext) -> TResult {
    if let Some(graveyard_position) = &b.graveyard_position {
        a.graveyard_position = a.graveyard_position.transformed_by_deletion(graveyard_position, 1)
            .unwrap_or_else(|| a.graveyard_position.clone());

        // `b` reuses the element this (emptied) merge points at. It is a real merge again.
        if a.deletion_position() == *graveyard_position {
            a.how_many = b.how_many;
        }
    }

    // Merging to where the split happened. Usually the nodes go into the new element, except
    // when the merge targets the inside of an element, or `b` brings back the merged element
    // itself, or we know the target was never moved.
    if a.target_position == b.split_position {
        let merge_inside = b.how_many != 0;
        let merge_splitting_element = b.graveyard_position.as_ref() == Some(&a.deletion_position());

        if merge_inside || merge_splitting_element || ctx.ab_relation == Some(Relation::MergeTargetNotMoved) {
            a.source_position = a.source_position.transformed_by_split_operation(b);
            return Ok(one(a));
        }
    }

    if a.source_position == b.split_position {
        if ctx.ab_relation == Some(Relation::MergeSourceNotMoved) {
            a.how_many = 0;
            a.target_position = a.target_position.transformed_by_split_operation(b);
            return Ok(one(a));
        }

        if ctx.ab_relation == Some(Relation::MergeSameElement) || a.source_position.offset() > 0 {
            a.source_position = b.move_target_position().with_stickiness(Stickiness::ToPrevious);
            a.target_position = a.target_position.transformed_by_split_operation(b);
            return Ok(one(a));
        }
    }

    if a.source_position.has_same_parent_as(&b.split_position) {
        a.how_many = b.split_position.offset();
    }

    a.source_position = a.source_position.transformed_by_split_operation(b);
    a.target_position = a.target_position.transformed_by_split_operation(b);
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: MergeOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    // Some of the merged children got wrapped into one.
    if b.position.parent_path() == a.deletion_position().path.as_slice() && b.position.root == a.source_position.root {
        a.how_many = a.how_many + 1 - b.how_many;
    }

    a.source_position = a.source_position.transformed_by_wrap_operation(b);
    a.target_position = a.target_position.transformed_by_wrap_operation(b);
    a.graveyard_position = a.graveyard_position.transformed_by_wrap_operation(b);
    Ok(one(a))
}

pub(super) fn by_unwrap(mut a: MergeOperation, b: &UnwrapOperation, ctx: &TransformContext) -> TResult {
    let element = b.element_position();
    let deletion = a.deletion_position();

    // The merged element was unwrapped. Its children are out already, only moving them is left.
    if deletion == element {
        let target = a.target_position.transformed_by_unwrap_operation(b);
        return Ok(one(MoveOperation::new(element, b.how_many, target, 0)));
    }

    // The merge target's element was unwrapped. Move the children next to its lifted children,
    // then remove the emptied element.
    if a.target_position.root == element.root && a.target_position.parent_path() == element.path.as_slice() {
        let source = a.source_position.transformed_by_unwrap_operation(b);
        let target = a.target_position.transformed_by_unwrap_operation(b);
        let graveyard = a.graveyard_position.transformed_by_unwrap_operation(b);

        let children = MoveOperation::new(source.clone(), a.how_many, target, 0);
        let emptied = source.parent_position().unwrap_or_else(|| source.clone())
            .transformed_by_move_operation(&children);
        let graveyard = graveyard.transformed_by_move_operation(&children);
        return Ok(smallvec![children.into(), MoveOperation::new(emptied, 1, graveyard, 0).into()]);
    }

    // Unwrapping one of the merged children.
    if element.root == deletion.root && element.parent_path() == deletion.path.as_slice() {
        a.how_many = a.how_many + b.how_many - 1;
    }

    a.source_position = a.source_position.transformed_by_unwrap_operation(b);
    a.target_position = a.target_position.transformed_by_unwrap_operation(b);
    // Both want to put their element at the same graveyard spot. The stronger one gets it.
    if a.graveyard_position != b.graveyard_position || !ctx.a_is_strong {
        a.graveyard_position = a.graveyard_position.transformed_by_unwrap_operation(b);
    }
    Ok(one(a))
}
