use smallvec::smallvec;

use crate::operation::{InsertOperation, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::{compare_paths, PathRelation, Stickiness};
use crate::range::Range;
use crate::relations::Relation;
use crate::transform::{TResult, TransformContext};
use super::{make_move_operations, no_op, one};

fn set_range(a: &mut MoveOperation, range: &Range) {
    a.source_position = range.start.clone().with_stickiness(Stickiness::ToNext);
    a.how_many = range.flat_len();
}

/// Whether `a` moves nodes into the range moved by `b`.
fn targets_into_moved_range(a: &MoveOperation, b: &MoveOperation) -> bool {
    a.target_position.transformed_by_deletion(&b.source_position, b.how_many).is_none()
}

pub(super) fn by_insert(mut a: MoveOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    // Nodes inserted inside the moved range are moved too.
    let range = a.moved_range().transformed_by_insertion(&b.position, b.how_many(), false);
    set_range(&mut a, &range[0]);

    if a.target_position != b.position {
        a.target_position = a.target_position.transformed_by_insert_operation(b);
    }
    Ok(one(a))
}

pub(super) fn by_move(a: MoveOperation, b: &MoveOperation, ctx: &TransformContext) -> TResult {
    let range_a = a.moved_range();
    let range_b = b.moved_range();

    let mut a_is_strong = ctx.a_is_strong;

    // Whether `a`'s nodes should land before `b`'s when both target the same spot.
    let mut insert_before = !ctx.a_is_strong;
    if ctx.ab_relation == Some(Relation::InsertBefore) || ctx.ba_relation == Some(Relation::InsertAfter) {
        insert_before = true;
    } else if ctx.ab_relation == Some(Relation::InsertAfter) || ctx.ba_relation == Some(Relation::InsertBefore) {
        insert_before = false;
    }

    let new_target = if a.target_position == b.target_position && insert_before {
        a.target_position.transformed_by_deletion(&b.source_position, b.how_many)
            .unwrap_or_else(|| a.target_position.clone())
    } else {
        a.target_position.transformed_by_move_operation(b)
    };

    // Both ranges are moved into each other. There is no sensible result, so `b` is reverted.
    if targets_into_moved_range(&a, b) && targets_into_moved_range(b, &a) {
        return Ok(one(b.get_reversed()));
    }

    // `b` happened entirely inside the range `a` moves. It is carried along.
    if range_a.contains_position(&b.target_position) && range_a.contains_range(&range_b, true) {
        let range = Range::new(
            range_a.start.transformed_by_move_operation(b),
            range_a.end.transformed_by_move_operation(b),
        );
        return Ok(make_move_operations(vec![range], new_target));
    }

    // `a` happened entirely inside the range `b` moved.
    if range_b.contains_position(&a.target_position) && range_b.contains_range(&range_a, true) {
        let moved_start = b.moved_range_start();
        let range = Range::new(
            range_a.start.combined(&b.source_position, &moved_start),
            range_a.end.combined(&b.source_position, &moved_start),
        );
        return Ok(make_move_operations(vec![range], new_target));
    }

    // One range is an ancestor of the other. They don't really conflict.
    if a.source_position.root == b.source_position.root
        && matches!(compare_paths(a.source_position.parent_path(), b.source_position.parent_path()),
                    PathRelation::Prefix | PathRelation::Extension) {
        let range = Range::new(
            range_a.start.transformed_by_move_operation(b),
            range_a.end.transformed_by_move_operation(b),
        );
        return Ok(make_move_operations(vec![range], new_target));
    }

    // Removing content wins over moving it somewhere else. (Unless the removal is being undone.)
    if a.is_remove() && !b.is_remove() && !ctx.a_was_undone && !ctx.force_weak_remove {
        a_is_strong = true;
    } else if !a.is_remove() && b.is_remove() && !ctx.b_was_undone && !ctx.force_weak_remove {
        a_is_strong = false;
    }

    // A range moved into the middle of the other one is carried along with it, and the overlap
    // stays with the carrier. Either side reaches the same result this way.
    let b_into_a = b.target_position.has_same_parent_as(&range_a.start) && range_a.contains_position(&b.target_position);
    let a_into_b = a.target_position.has_same_parent_as(&range_b.start) && range_b.contains_position(&a.target_position);

    let moved_start = b.moved_range_start();
    let mut ranges = Vec::new();
    let mut before_common = 0;
    for piece in range_a.difference(&range_b) {
        let is_before_common = piece.start.is_before(&range_b.start);
        let start = piece.start.transformed_by_deletion(&b.source_position, b.how_many).unwrap_or(piece.start);
        let end = piece.end.transformed_by_deletion(&b.source_position, b.how_many).unwrap_or(piece.end);
        let spread = start.has_same_parent_as(&moved_start) && !b_into_a;
        let transformed = Range::new(start, end).transformed_by_insertion(&moved_start, b.how_many, spread);
        if is_before_common {
            before_common += transformed.len();
        }
        ranges.extend(transformed);
    }

    if let Some(common) = range_a.intersection(&range_b).filter(|_| (a_is_strong && !b_into_a) || a_into_b) {
        let common = Range::new(
            common.start.combined(&b.source_position, &moved_start),
            common.end.combined(&b.source_position, &moved_start),
        );
        // Keep the pieces in their original order.
        ranges.insert(before_common, common);
    }

    if ranges.is_empty() {
        return Ok(no_op());
    }
    Ok(make_move_operations(ranges, new_target))
}

pub(super) fn by_split(mut a: MoveOperation, b: &SplitOperation, ctx: &TransformContext) -> TResult {
    let mut new_target = a.target_position.transformed_by_split_operation(b);
    let move_range = a.moved_range();

    // The last moved element got split. The new element joins the moved range.
    if move_range.end == b.insertion_position {
        if b.graveyard_position.is_none() {
            a.how_many += 1;
        }
        a.target_position = new_target;
        return Ok(one(a));
    }

    // The split happened between the moved nodes. Move both halves.
    if move_range.start.has_same_parent_as(&b.split_position) && move_range.contains_position(&b.split_position) {
        let right = Range::new(b.split_position.clone(), move_range.end.clone()).transformed_by_split_operation(b);
        let left = Range::new(move_range.start.clone(), b.split_position.clone());
        return Ok(make_move_operations(vec![left, right], new_target));
    }

    if a.target_position == b.split_position && ctx.ab_relation == Some(Relation::InsertAtSource) {
        new_target = b.move_target_position();
    }
    if a.target_position == b.insertion_position && ctx.ab_relation == Some(Relation::InsertBetween) {
        new_target = a.target_position.clone();
    }

    let mut ranges = vec![move_range.transformed_by_split_operation(b)];

    // The moved range held the graveyard element the split took back. Move it along too.
    if let Some(graveyard_position) = &b.graveyard_position {
        let moves_graveyard_element = move_range.start == *graveyard_position
            || move_range.contains_position(graveyard_position);
        if a.how_many > 1 && moves_graveyard_element && !ctx.a_was_undone {
            ranges.push(Range::from_position_and_shift(&b.insertion_position, 1));
        }
    }

    Ok(make_move_operations(ranges, new_target))
}

pub(super) fn by_merge(mut a: MoveOperation, b: &MergeOperation, ctx: &TransformContext) -> TResult {
    let moved_range = a.moved_range();
    let deletion_position = b.deletion_position();

    if deletion_position.has_same_parent_as(&a.source_position) && moved_range.contains_position(&b.source_position) {
        if a.is_remove() && !ctx.force_weak_remove {
            // A removed element got merged. Removing wins: the merge is reverted and the element
            // removed after all.
            if !ctx.a_was_undone {
                let mut results = smallvec![];

                let mut graveyard_source = b.graveyard_position.clone();
                let mut split_nodes_source = b.target_position.transformed_by_merge_operation(b);

                if a.how_many > 1 {
                    let rest = MoveOperation::new(a.source_position.clone(), a.how_many - 1, a.target_position.clone(), 0);
                    graveyard_source = graveyard_source.transformed_by_move_operation(&rest);
                    split_nodes_source = split_nodes_source.transformed_by_move_operation(&rest);
                    results.push(rest.into());
                }

                let graveyard_target = deletion_position.combined(&a.source_position, &a.target_position);
                let graveyard_move = MoveOperation::new(graveyard_source.clone(), 1, graveyard_target.clone(), 0);

                let split_nodes_target = graveyard_move.moved_range_start().child(0);
                let split_nodes_source = split_nodes_source.with_stickiness(Stickiness::ToNone)
                    .transformed_by_move(&graveyard_source, &graveyard_target, 1);
                let split_nodes_move = MoveOperation::new(split_nodes_source, b.how_many, split_nodes_target, 0);

                results.push(graveyard_move.into());
                results.push(split_nodes_move.into());
                return Ok(results);
            }
        } else if a.how_many == 1 {
            // The only moved element got merged. It stays in the graveyard.
            if !ctx.b_was_undone {
                return Ok(no_op());
            }
            a.source_position = b.graveyard_position.clone().with_stickiness(Stickiness::ToNext);
            a.target_position = a.target_position.transformed_by_merge_operation(b);
            return Ok(one(a));
        }
    }

    let range = moved_range.transformed_by_merge_operation(b);
    set_range(&mut a, &range);
    a.target_position = a.target_position.transformed_by_merge_operation(b);
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: MoveOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    let move_range = a.moved_range();
    let wrapped = b.wrapped_range();
    let new_target = a.target_position.transformed_by_wrap_operation(b);

    if move_range.is_flat() && move_range.start.has_same_parent_as(&wrapped.start) {
        // All wrapped nodes are moved. The wrapper goes with them.
        if move_range.contains_range(&wrapped, true) {
            let start = move_range.start.clone().with_stickiness(Stickiness::ToNone).transformed_by_wrap_operation(b);
            let end = move_range.end.clone().with_stickiness(Stickiness::ToNone).transformed_by_wrap_operation(b);
            set_range(&mut a, &Range::new(start, end));
            a.target_position = new_target;
            return Ok(one(a));
        }

        // Some of the moved nodes are now inside the wrapper. They're moved out of it.
        if !wrapped.contains_range(&move_range, true) {
            if let Some(common) = move_range.intersection(&wrapped) {
                let target = b.target_position();
                let inner = Range::new(
                    common.start.combined(&wrapped.start, &target),
                    common.end.combined(&wrapped.start, &target),
                );
                let outer = move_range.difference(&wrapped).into_iter()
                    .map(|piece| piece.transformed_by_wrap_operation(b))
                    .next();

                let ranges = match outer {
                    None => vec![inner],
                    Some(outer) if wrapped.start.is_after(&move_range.start) => vec![outer, inner],
                    Some(outer) => vec![inner, outer],
                };
                return Ok(make_move_operations(ranges, new_target));
            }
        }
    }

    let range = move_range.transformed_by_wrap_operation(b);
    set_range(&mut a, &range);
    a.target_position = new_target;
    Ok(one(a))
}

pub(super) fn by_unwrap(mut a: MoveOperation, b: &UnwrapOperation, _ctx: &TransformContext) -> TResult {
    let move_range = a.moved_range();
    let element = b.element_position();
    let new_target = a.target_position.transformed_by_unwrap_operation(b);

    // The unwrapped element was among the moved nodes. Its children are moved instead.
    if move_range.start.has_same_parent_as(&element)
        && (move_range.start == element || move_range.contains_position(&element)) {
        a.how_many = a.how_many + b.how_many - 1;
        if a.how_many == 0 {
            return Ok(no_op());
        }
        a.target_position = new_target;
        return Ok(one(a));
    }

    let range = move_range.transformed_by_unwrap_operation(b);
    set_range(&mut a, &range);
    a.target_position = new_target;
    Ok(one(a))
}

#[cfg(test)]
mod test {
    use crate::model::{Document, Element, Node};
    use crate::operation::*;
    use crate::position::Position;
    use crate::relations::Relation;
    use crate::transform::{transform, TransformContext};

    fn converge(doc: &Document, a: &Operation, b: &Operation) -> (Document, Document) {
        let mut left = doc.clone();
        left.apply(a).unwrap();
        left.apply_all(&transform(b, a, &TransformContext::weak()).unwrap()).unwrap();

        let mut right = doc.clone();
        right.apply(b).unwrap();
        right.apply_all(&transform(a, b, &TransformContext::strong()).unwrap()).unwrap();
        (left, right)
    }

    fn text_doc(s: &str) -> Document {
        let mut doc = Document::new();
        doc.create_root("main", Node::text(s));
        doc
    }

    fn mv(from: usize, n: usize, to: usize) -> Operation {
        MoveOperation::new(Position::new("main", &[from]), n, Position::new("main", &[to]), 0).into()
    }

    fn remove(from: usize, n: usize) -> Operation {
        MoveOperation::new(Position::new("main", &[from]), n, Position::graveyard(0), 0).into()
    }

    #[test]
    fn same_range_moved_to_different_places() {
        let doc = text_doc("abcdef");
        let (left, right) = converge(&doc, &mv(1, 2, 6), &mv(1, 2, 0));
        assert!(left.content_eq(&right));
        assert!(left.content_eq(&text_doc("adefbc")), "{:?}", left.root("main"));
    }

    #[test]
    fn overlapping_moves() {
        let doc = text_doc("abcdefgh");
        let (left, right) = converge(&doc, &mv(1, 3, 8), &mv(2, 3, 0));
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
    }

    #[test]
    fn remove_beats_move() {
        let doc = text_doc("abcdef");
        // `b` is strong here, but removing still wins.
        let a = mv(1, 2, 6);
        let b = remove(1, 2);

        let mut left = doc.clone();
        left.apply(&b).unwrap();
        left.apply_all(&transform(&a, &b, &TransformContext::strong()).unwrap()).unwrap();

        let mut right = doc.clone();
        right.apply(&a).unwrap();
        right.apply_all(&transform(&b, &a, &TransformContext::weak()).unwrap()).unwrap();

        assert!(left.content_eq(&right));
        assert!(left.content_eq(&text_doc("adef")), "{:?}", left.root("main"));
    }

    #[test]
    fn same_target_uses_relation() {
        let doc = text_doc("abcdef");
        let a = mv(0, 1, 6);
        let b = mv(1, 1, 6);

        let ctx = TransformContext { a_is_strong: true, ab_relation: Some(Relation::InsertBefore), ..Default::default() };
        let result = transform(&a, &b, &ctx).unwrap();
        let Operation::Move(op) = &result[0] else { panic!() };
        // `a` lands before the node moved by `b`.
        assert_eq!(op.target_position, Position::new("main", &[5]));
    }

    #[test]
    fn moved_range_split_in_the_middle() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text("foobar")), Node::element("p", Node::text("xyz"))]);
        let a: Operation = MoveOperation::new(Position::new("main", &[0, 1]), 4, Position::new("main", &[1, 3]), 0).into();
        let split = Position::new("main", &[0, 3]);
        let b: Operation = SplitOperation::new(split.clone(), 3, SplitOperation::insertion_position_for(&split), None, 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", vec![
            Node::element("p", Node::text("f")),
            Node::element("p", Node::text("r")),
            Node::element("p", Node::text("xyzooba")),
        ]);
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }

    #[test]
    fn removed_element_was_merged() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text("ab")), Node::element("p", Node::text("cd"))]);
        let a = remove(1, 1);
        let b: Operation = MergeOperation::new(Position::new("main", &[1, 0]), 2, Position::new("main", &[0, 2]),
                                               Position::graveyard(0), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", vec![Node::element("p", Node::text("ab"))]);
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }

    #[test]
    fn paragraphs_moved_into_each_other() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text("ab")), Node::element("p", Node::text("cd"))]);
        let a = MoveOperation::new(Position::new("main", &[0]), 1, Position::new("main", &[1, 1]), 0);
        let b = MoveOperation::new(Position::new("main", &[1]), 1, Position::new("main", &[0, 1]), 0);

        // Each side reverts the other one.
        let result = transform(&a.clone().into(), &b.clone().into(), &TransformContext::strong()).unwrap();
        assert_eq!(result.as_slice(), &[Operation::Move(b.get_reversed())]);
        let result = transform(&b.clone().into(), &a.clone().into(), &TransformContext::weak()).unwrap();
        assert_eq!(result.as_slice(), &[Operation::Move(a.get_reversed())]);

        let (left, right) = converge(&doc, &a.into(), &b.into());
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        assert!(left.content_eq(&doc), "{:?}", left.root("main"));
    }

    #[test]
    fn moving_the_wrapped_nodes() {
        let doc = text_doc("abcdef");
        let a = mv(1, 2, 6);
        let b: Operation = WrapOperation::new(Position::new("main", &[1]), 2, Element::new("q"), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        let root = left.root("main").unwrap();
        assert_eq!(root.children.len(), 5);
        assert_eq!(root.children[4].as_element().unwrap().children, Node::text("bc"));
    }

    #[test]
    fn moving_the_unwrapped_element() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("q", Node::text("ab")), Node::element("p", vec![])]);
        let a: Operation = MoveOperation::new(Position::new("main", &[0]), 1, Position::new("main", &[1, 0]), 0).into();
        let b: Operation = UnwrapOperation::new(Position::new("main", &[0, 0]), 2, Position::graveyard(0), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", vec![Node::element("p", Node::text("ab"))]);
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }

    fn para_doc(paras: &[&str]) -> Document {
        let mut doc = Document::new();
        doc.create_root("main", paras.iter().map(|s| Node::element("p", Node::text(s))).collect());
        doc
    }

    #[test]
    fn removed_range_takes_nodes_moved_into_it() {
        let doc = para_doc(&["wxyz"]);
        let a: Operation = MoveOperation::new(Position::new("main", &[0, 0]), 3, Position::graveyard(0), 0).into();
        let b: Operation = MoveOperation::new(Position::new("main", &[0, 2]), 2, Position::new("main", &[0, 1]), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        assert!(left.content_eq(&para_doc(&[""])), "{:?}", left.root("main"));

        // Same result with the strength the other way around.
        let (left, right) = converge(&doc, &b, &a);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        assert!(left.content_eq(&para_doc(&[""])), "{:?}", left.root("main"));
    }

    #[test]
    fn node_moved_into_a_removed_range() {
        let doc = para_doc(&["w", "abcd"]);
        let a: Operation = MoveOperation::new(Position::new("main", &[0, 0]), 1, Position::new("main", &[1, 3]), 0).into();
        let b: Operation = MoveOperation::new(Position::new("main", &[1, 2]), 2, Position::graveyard(0), 0).into();

        for (a, b) in [(&a, &b), (&b, &a)] {
            let (left, right) = converge(&doc, a, b);
            assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
            assert!(left.content_eq(&para_doc(&["", "ab"])), "{:?}", left.root("main"));
        }
    }
}
