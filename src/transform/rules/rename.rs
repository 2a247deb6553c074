use smallvec::smallvec;

use crate::operation::{InsertOperation, MergeOperation, MoveOperation, RenameOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::Stickiness;
use crate::transform::{TResult, TransformContext};
use super::{no_op, one};

pub(super) fn by_insert(mut a: RenameOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_insert_operation(b);
    Ok(one(a))
}

pub(super) fn by_move(mut a: RenameOperation, b: &MoveOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_move_operation(b);
    Ok(one(a))
}

pub(super) fn by_rename(mut a: RenameOperation, b: &RenameOperation, ctx: &TransformContext) -> TResult {
    if a.position == b.position {
        if !ctx.a_is_strong {
            return Ok(no_op());
        }
        a.old_name = b.new_name.clone();
    }
    Ok(one(a))
}

pub(super) fn by_split(mut a: RenameOperation, b: &SplitOperation, _ctx: &TransformContext) -> TResult {
    // The renamed element was split. Its new half gets renamed too. (Unless it came from the
    // graveyard, with its own name.)
    if a.position.root == b.split_position.root && a.position.path.as_slice() == b.split_position.parent_path()
        && b.graveyard_position.is_none() {
        let extra = RenameOperation::new(a.position.shifted_by(1), &a.old_name, &a.new_name, 0);
        return Ok(smallvec![a.into(), extra.into()]);
    }

    a.position = a.position.transformed_by_split_operation(b);
    Ok(one(a))
}

pub(super) fn by_merge(mut a: RenameOperation, b: &MergeOperation, _ctx: &TransformContext) -> TResult {
    // The renamed element was merged away. Rename it in the graveyard.
    if a.position == b.deletion_position() {
        a.position = b.graveyard_position.clone().with_stickiness(Stickiness::ToNext);
        return Ok(one(a));
    }

    a.position = a.position.transformed_by_merge_operation(b);
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: RenameOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_wrap_operation(b);
    Ok(one(a))
}

pub(super) fn by_unwrap(mut a: RenameOperation, b: &UnwrapOperation, _ctx: &TransformContext) -> TResult {
    // The renamed element was unwrapped and sits in the graveyard now.
    let element = b.element_position();
    if a.position == element {
        let emptied = element.shifted_by(b.how_many as isize);
        a.position = b.graveyard_position.transformed_by_deletion(&emptied, 1)
            .unwrap_or_else(|| b.graveyard_position.clone())
            .with_stickiness(Stickiness::ToNext);
        return Ok(one(a));
    }

    a.position = a.position.transformed_by_unwrap_operation(b);
    Ok(one(a))
}
