use smallvec::smallvec;

use crate::model::{AttrValue, Node};
use crate::operation::{AttributeOperation, InsertOperation, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::{Position, Stickiness};
use crate::range::Range;
use crate::transform::{Ops, TResult, TransformContext};
use super::{no_op, non_collapsed, one};

fn with_ranges(a: &AttributeOperation, ranges: impl IntoIterator<Item = Range>) -> Ops {
    ranges.into_iter()
        .map(|range| AttributeOperation::new(range, &a.key, a.old_value.clone(), a.new_value.clone(), 0).into())
        .collect()
}

/// Inserted nodes don't necessarily carry the value an attribute change expects. This brings
/// each run of equally valued inserted nodes to `value` first.
pub(super) fn complementary_operations(position: &Position, nodes: &[Node], key: &str, value: &Option<AttrValue>) -> Ops {
    let mut result = Ops::new();
    let mut run_start = 0;

    for i in 1..=nodes.len() {
        let run_value = nodes[run_start].attribute(key);
        if i < nodes.len() && nodes[i].attribute(key) == run_value { continue; }

        if run_value != value.as_ref() {
            let range = Range::new(position.shifted_by(run_start as isize), position.shifted_by(i as isize));
            result.push(AttributeOperation::new(range, key, run_value.cloned(), value.clone(), 0).into());
        }
        run_start = i;
    }

    result
}

pub(super) fn by_attribute(a: AttributeOperation, b: &AttributeOperation, ctx: &TransformContext) -> TResult {
    if a.key != b.key || !a.range.start.has_same_parent_as(&b.range.start) {
        return Ok(one(a));
    }

    // Nodes `b` didn't touch are changed as usual.
    let mut result = with_ranges(&a, a.range.difference(&b.range));

    // The common part has `b`'s value now. Only the stronger side overwrites it.
    if let Some(common) = a.range.intersection(&b.range) {
        if ctx.a_is_strong {
            result.push(AttributeOperation::new(common, &b.key, b.new_value.clone(), a.new_value.clone(), 0).into());
        }
    }

    if result.is_empty() { Ok(no_op()) } else { Ok(result) }
}

pub(super) fn by_insert(mut a: AttributeOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    if a.range.start.has_same_parent_as(&b.position) && a.range.contains_position(&b.position) {
        // Inserted text may pick up the attribute. Other nodes split the range in two.
        let ranges = a.range.transformed_by_insertion(&b.position, b.how_many(), !b.should_receive_attributes);
        let mut result = Ops::new();
        if b.should_receive_attributes {
            result.extend(complementary_operations(&b.position, &b.nodes, &a.key, &a.old_value));
        }
        result.extend(with_ranges(&a, ranges));
        return Ok(result);
    }

    if let Some(range) = a.range.transformed_by_insertion(&b.position, b.how_many(), false).into_iter().next() {
        a.range = range;
    }
    Ok(one(a))
}

/// Transform a range by a move without ever gluing pieces together which weren't together
/// before. Pieces keep document order where possible.
pub(super) fn break_range_by_move(range: &Range, b: &MoveOperation) -> Vec<Range> {
    let move_range = b.moved_range();

    let (difference, common): (Vec<Range>, Option<Range>) = if move_range.contains_range(range, true) {
        (Vec::new(), Some(range.clone()))
    } else if range.start.has_same_parent_as(&move_range.start) {
        (range.difference(&move_range).into_vec(), range.intersection(&move_range))
    } else {
        // Moves somewhere below the range don't change which nodes the range covers.
        (vec![range.clone()], None)
    };

    let target = b.moved_range_start();
    let mut result = Vec::new();
    for diff in difference {
        let Some(diff) = diff.transformed_by_deletion(&b.source_position, b.how_many) else { continue; };
        let spread = diff.start.has_same_parent_as(&target);
        result.extend(diff.transformed_by_insertion(&target, b.how_many, spread));
    }

    if let Some(common) = common {
        result.extend(common.transformed_by_move_operation(b, false).into_iter().next());
    }

    result
}

pub(super) fn by_move(a: AttributeOperation, b: &MoveOperation, _ctx: &TransformContext) -> TResult {
    let ranges = break_range_by_move(&a.range, b);
    Ok(with_ranges(&a, ranges))
}

pub(super) fn by_split(mut a: AttributeOperation, b: &SplitOperation, _ctx: &TransformContext) -> TResult {
    // The split element was the last one in the range. The new element gets the change too.
    if a.range.end == b.insertion_position {
        if b.graveyard_position.is_none() {
            a.range = Range::new(a.range.start.clone(), a.range.end.shifted_by(1));
        }
        return Ok(one(a));
    }

    // Split in the middle of the range. The changed nodes are now in two elements.
    if a.range.start.has_same_parent_as(&b.split_position) && a.range.contains_position(&b.split_position) {
        let move_target = b.move_target_position();
        let second = AttributeOperation::new(
            Range::new(move_target.clone(), a.range.end.combined(&b.split_position, &move_target)),
            &a.key, a.old_value.clone(), a.new_value.clone(), 0);
        a.range = Range::new(a.range.start.clone(), b.split_position.clone());
        return Ok(smallvec![a.into(), second.into()]);
    }

    a.range = a.range.transformed_by_split_operation(b);
    Ok(one(a))
}

pub(super) fn by_merge(a: AttributeOperation, b: &MergeOperation, _ctx: &TransformContext) -> TResult {
    let mut ranges = Vec::new();
    let deletion_position = b.deletion_position();

    // The merged element itself was changed. It's in the graveyard now, and changed there.
    if a.range.start.has_same_parent_as(&deletion_position)
        && (a.range.contains_position(&deletion_position) || a.range.start == deletion_position) {
        ranges.push(Range::from_position_and_shift(&b.graveyard_position, 1));
    }

    // The range may have covered nothing but the merged element.
    ranges.extend(non_collapsed(a.range.transformed_by_merge_operation(b)));

    Ok(with_ranges(&a, ranges))
}

pub(super) fn by_wrap(a: AttributeOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    let wrapped = b.wrapped_range();
    let mut ranges = Vec::new();

    // The element came out of the graveyard, changed.
    if let Some(graveyard_position) = &b.graveyard_position {
        if a.range.start.has_same_parent_as(graveyard_position)
            && (a.range.contains_position(graveyard_position) || a.range.start == *graveyard_position) {
            ranges.push(Range::from_position_and_shift(&b.element_position(), 1));
        }
    }

    if a.range.start.has_same_parent_as(&wrapped.start) && a.range.is_intersecting(&wrapped) {
        // The wrapped part goes into the new element. The element itself isn't changed.
        let mut pieces: Vec<Range> = a.range.difference(&wrapped).into_iter()
            .filter_map(|diff| non_collapsed(diff.transformed_by_wrap_operation(b)))
            .collect();
        if let Some(common) = a.range.intersection(&wrapped) {
            let target = b.target_position();
            let common = Range::new(common.start.combined(&wrapped.start, &target), common.end.combined(&wrapped.start, &target));
            let before_common = pieces.iter().filter(|p| p.start.is_before(&wrapped.start)).count();
            pieces.insert(before_common.min(pieces.len()), common);
        }
        ranges.extend(pieces);
    } else {
        ranges.extend(non_collapsed(a.range.transformed_by_wrap_operation(b)));
    }

    if ranges.is_empty() { return Ok(no_op()); }
    Ok(with_ranges(&a, ranges))
}

pub(super) fn by_unwrap(a: AttributeOperation, b: &UnwrapOperation, _ctx: &TransformContext) -> TResult {
    let element = b.element_position();

    if a.range.start.has_same_parent_as(&element)
        && (a.range.contains_position(&element) || a.range.start == element) {
        // The unwrapped element was changed. It ends up in the graveyard, its children take its
        // place and stay as they are.
        let mut ranges = Vec::new();
        let before = Range::new(a.range.start.clone(), element.clone());
        ranges.extend(non_collapsed(before));

        let after_start = element.shifted_by(1).with_stickiness(Stickiness::ToNext);
        if after_start.is_before(&a.range.end) {
            let after = Range::new(after_start, a.range.end.clone());
            ranges.extend(non_collapsed(after.transformed_by_unwrap_operation(b)));
        }

        let emptied = element.shifted_by(b.how_many as isize);
        let graveyard_position = b.graveyard_position.transformed_by_deletion(&emptied, 1)
            .unwrap_or_else(|| b.graveyard_position.clone());
        ranges.push(Range::from_position_and_shift(&graveyard_position, 1));
        return Ok(with_ranges(&a, ranges));
    }

    match non_collapsed(a.range.transformed_by_unwrap_operation(b)) {
        Some(range) => Ok(with_ranges(&a, [range])),
        None => Ok(no_op()),
    }
}
