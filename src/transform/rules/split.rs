use smallvec::smallvec;

use crate::error::TransformError;
use crate::operation::{InsertOperation, OpKind, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::{Position, Stickiness};
use crate::relations::Relation;
use crate::transform::{Ops, TResult, TransformContext};
use super::{no_op, one};

// Moves the split position with `f`, without letting it travel with moved content.
fn move_split_position(a: &mut SplitOperation, f: impl FnOnce(&Position) -> Position) {
    let pos = f(&a.split_position.clone().with_stickiness(Stickiness::ToNone));
    a.split_position = pos.with_stickiness(Stickiness::ToNext);
}

// A split creating a new element always inserts it right after the split one. A split reusing a
// graveyard element keeps that only while it held before the transformation.
fn follows_split(a: &SplitOperation) -> bool {
    a.graveyard_position.is_none()
        || a.insertion_position == SplitOperation::insertion_position_for(&a.split_position)
}

fn update_insertion(a: &mut SplitOperation, follows: bool, f: impl FnOnce(&Position) -> Position) {
    a.insertion_position = if follows {
        SplitOperation::insertion_position_for(&a.split_position)
    } else {
        f(&a.insertion_position)
    };
}

pub(super) fn by_insert(mut a: SplitOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    let follows = a.graveyard_position.is_none();
    if a.split_position.has_same_parent_as(&b.position) && a.split_position.offset() < b.position.offset() {
        a.how_many += b.how_many();
    }
    a.split_position = a.split_position.transformed_by_insert_operation(b);
    update_insertion(&mut a, follows, |p| p.transformed_by_insert_operation(b));
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_insert_operation(b));
    Ok(one(a))
}

pub(super) fn by_merge(mut a: SplitOperation, b: &MergeOperation, ctx: &TransformContext) -> TResult {
    // The split element got merged into a different element. Splitting it now would create a copy
    // of the wrong element, so the merged-away element is copied in the graveyard and used instead.
    if a.graveyard_position.is_none() && !ctx.b_was_undone && a.split_position.has_same_parent_as(&b.source_position) {
        let split_position = b.graveyard_position.child(0);
        let insertion_position = SplitOperation::insertion_position_for(&split_position);
        let extra = SplitOperation::new(split_position, 0, insertion_position.clone(), None, 0);

        a.split_position = a.split_position.transformed_by_merge_operation(b);
        a.insertion_position = SplitOperation::insertion_position_for(&a.split_position);
        a.graveyard_position = Some(insertion_position.with_stickiness(Stickiness::ToNext));
        return Ok(smallvec![extra.into(), a.into()]);
    }

    let deletion_position = b.deletion_position();
    if a.split_position.has_same_parent_as(&deletion_position) && !a.split_position.is_after(&deletion_position) {
        a.how_many -= 1;
    }
    if a.split_position.has_same_parent_as(&b.target_position) {
        a.how_many += b.how_many;
    }

    a.split_position = a.split_position.transformed_by_merge_operation(b);
    a.insertion_position = SplitOperation::insertion_position_for(&a.split_position);
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_merge_operation(b));
    Ok(one(a))
}

pub(super) fn by_move(mut a: SplitOperation, b: &MoveOperation, ctx: &TransformContext) -> TResult {
    let follows = a.graveyard_position.is_none();
    let range_to_move = b.moved_range();

    if let Some(graveyard_position) = &a.graveyard_position {
        // The element the split was going to use got moved out of the graveyard. Just move the
        // split nodes into it.
        let graveyard_element_moved = range_to_move.start == *graveyard_position
            || range_to_move.contains_position(graveyard_position);
        if !ctx.b_was_undone && graveyard_element_moved {
            let source = a.split_position.transformed_by_move_operation(b);
            let target = graveyard_position.transformed_by_move_operation(b).child(0);
            return Ok(one(MoveOperation::new(source, a.how_many, target, 0)));
        }
        a.graveyard_position = Some(graveyard_position.transformed_by_move_operation(b));
    }

    let split_at_target = a.split_position == b.target_position;

    if split_at_target && (ctx.ba_relation == Some(Relation::InsertAtSource) || ctx.ab_relation == Some(Relation::SplitBefore)) {
        a.how_many += b.how_many;
        a.split_position = a.split_position.transformed_by_deletion(&b.source_position, b.how_many)
            .ok_or_else(|| TransformError::lost(OpKind::Split, OpKind::Move, &a.split_position))?;
        a.insertion_position = SplitOperation::insertion_position_for(&a.split_position);
        return Ok(one(a));
    }

    if split_at_target {
        if let Some(Relation::SplitInsideMove { how_many, offset }) = &ctx.ab_relation {
            a.how_many += how_many;
            a.split_position = a.split_position.shifted_by(*offset as isize);
            return Ok(one(a));
        }
    }

    // The split position was inside the moved range. What stays is split where the range was taken
    // out, and everything after that hole goes to the new element.
    if a.split_position.has_same_parent_as(&b.source_position) && range_to_move.contains_position(&a.split_position) {
        let mut end = a.split_position.offset() + a.how_many;
        if !b.target_position.has_same_parent_as(&b.source_position) {
            end -= b.how_many;
        }
        let hole = b.source_position.clone().with_stickiness(Stickiness::ToNone).transformed_by_move_operation(b);

        a.how_many = end - hole.offset();
        a.split_position = hole.with_stickiness(Stickiness::ToNext);
        a.insertion_position = SplitOperation::insertion_position_for(&a.split_position);
        return Ok(one(a));
    }

    // A move which puts the nodes back where they were changes nothing.
    if b.source_position != b.target_position {
        if a.split_position.has_same_parent_as(&b.source_position) && a.split_position.offset() <= b.source_position.offset() {
            a.how_many -= b.how_many;
        }
        if a.split_position.has_same_parent_as(&b.target_position) && a.split_position.offset() < b.target_position.offset() {
            a.how_many += b.how_many;
        }
    }

    move_split_position(&mut a, |p| p.transformed_by_move_operation(b));
    update_insertion(&mut a, follows, |p| p.transformed_by_move_operation(b));
    Ok(one(a))
}

pub(super) fn by_split(mut a: SplitOperation, b: &SplitOperation, ctx: &TransformContext) -> TResult {
    if a.split_position == b.split_position {
        match (&a.graveyard_position, &b.graveyard_position) {
            (None, None) => return Ok(no_op()),
            (Some(ga), Some(gb)) if ga == gb => return Ok(no_op()),
            _ => {}
        }

        // Undo context says the split belongs before the nodes `b` moved here. Nothing left to split.
        if ctx.ab_relation == Some(Relation::SplitBefore) {
            a.how_many = 0;
            a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_split_operation(b));
            return Ok(one(a));
        }
    }

    // Both splits reuse the same element from the graveyard. Only one can have it.
    if let (Some(ga), Some(gb)) = (&a.graveyard_position, &b.graveyard_position) {
        if ga == gb {
            let a_in_graveyard = a.split_position.is_in_graveyard();
            let b_in_graveyard = b.split_position.is_in_graveyard();
            let a_is_weak = a_in_graveyard && !b_in_graveyard;
            let b_is_weak = b_in_graveyard && !a_in_graveyard;

            if !(b_is_weak || (!a_is_weak && ctx.a_is_strong)) {
                return Ok(no_op());
            }

            let mut result = Ops::new();
            // Put back what `b` split off, then split `a`'s nodes off into the element.
            if b.how_many > 0 {
                result.push(MoveOperation::new(b.move_target_position(), b.how_many, b.split_position.clone(), 0).into());
            }
            if a.how_many > 0 {
                result.push(MoveOperation::new(a.split_position.clone(), a.how_many, a.move_target_position(), 0).into());
            }
            if result.is_empty() {
                return Ok(no_op());
            }
            return Ok(result);
        }
    }

    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_split_operation(b));

    // Splitting right where `b` put its new element. The element ends up in the split off part.
    if a.split_position == b.insertion_position && ctx.ab_relation == Some(Relation::SplitBefore) {
        a.how_many += 1;
        return Ok(one(a));
    }

    if b.split_position == a.insertion_position && ctx.ba_relation == Some(Relation::SplitBefore) {
        let target = b.insertion_position.child(0);
        let extra = MoveOperation::new(a.insertion_position.clone(), 1, target, 0);
        return Ok(smallvec![a.into(), extra.into()]);
    }

    if a.split_position.has_same_parent_as(&b.split_position) && a.split_position.offset() < b.split_position.offset() {
        a.how_many -= b.how_many;
    }

    a.split_position = a.split_position.transformed_by_split_operation(b);
    a.insertion_position = SplitOperation::insertion_position_for(&a.split_position);
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: SplitOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    let follows = follows_split(&a);
    let wrapped = b.wrapped_range();

    if a.split_position.has_same_parent_as(&wrapped.start) {
        let k = a.split_position.offset();
        let (ws, we) = (wrapped.start.offset(), wrapped.end.offset());

        // Split in the middle of the wrapped nodes. The wrapper is split first, then its parent
        // right after the wrapper.
        if ws < k && k < we {
            let wrapper = b.element_position();
            let inner_position = wrapper.child(k - ws);
            let inner_insertion = SplitOperation::insertion_position_for(&inner_position);
            let inner = SplitOperation::new(inner_position, we - k, inner_insertion, None, 0);

            a.how_many = a.how_many + 1 - (we - k);
            a.split_position = wrapper.shifted_by(1).with_stickiness(Stickiness::ToNext);
            update_insertion(&mut a, follows, |p| p.transformed_by_wrap_operation(b).transformed_by_split_operation(&inner));
            a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_wrap_operation(b));
            return Ok(smallvec![inner.into(), a.into()]);
        }

        // All wrapped nodes are split off. They're one node now.
        if k <= ws {
            a.how_many = a.how_many + 1 - b.how_many;
        }
    }

    move_split_position(&mut a, |p| p.transformed_by_wrap_operation(b));
    update_insertion(&mut a, follows, |p| p.transformed_by_wrap_operation(b));
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_wrap_operation(b));
    Ok(one(a))
}

pub(super) fn by_unwrap(mut a: SplitOperation, b: &UnwrapOperation, _ctx: &TransformContext) -> TResult {
    let follows = follows_split(&a);
    let element = b.element_position();

    // The split element is gone, its children are where they should be.
    if a.split_position.parent_position().as_ref() == Some(&element) {
        return Ok(no_op());
    }

    if a.split_position.has_same_parent_as(&element) && a.split_position.offset() <= element.offset() {
        a.how_many = a.how_many + b.how_many - 1;
    }

    move_split_position(&mut a, |p| p.transformed_by_unwrap_operation(b));
    update_insertion(&mut a, follows, |p| p.transformed_by_unwrap_operation(b));
    a.graveyard_position = a.graveyard_position.map(|g| g.transformed_by_unwrap_operation(b));
    Ok(one(a))
}

#[cfg(test)]
mod test {
    use crate::model::{Document, Element, Node};
    use crate::operation::*;
    use crate::position::Position;
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

    fn split(path: &[usize], how_many: usize) -> Operation {
        let pos = Position::new("main", path);
        SplitOperation::new(pos.clone(), how_many, SplitOperation::insertion_position_for(&pos), None, 0).into()
    }

    fn para_doc(text: &str) -> Document {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text(text))]);
        doc
    }

    #[test]
    fn same_split_twice() {
        let doc = para_doc("abcd");
        let a = split(&[0, 2], 2);
        let (left, right) = converge(&doc, &a, &a.clone());
        assert!(left.content_eq(&right));
        assert_eq!(left.root("main").unwrap().children.len(), 2);
    }

    #[test]
    fn typing_after_the_split_point() {
        let doc = para_doc("abcd");
        let a = split(&[0, 2], 2);
        let b: Operation = InsertOperation::new(Position::new("main", &[0, 3]), Node::text("x"), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", vec![Node::element("p", Node::text("ab")), Node::element("p", Node::text("cxd"))]);
        assert!(left.content_eq(&expected));
    }

    #[test]
    fn split_in_the_middle_of_wrapped_nodes() {
        let doc = para_doc("abcd");
        let a = split(&[0, 2], 2);
        let b: Operation = WrapOperation::new(Position::new("main", &[0, 1]), 2, Element::new("span"), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", vec![
            Node::element("p", [Node::text("a"), vec![Node::element("span", Node::text("b"))]].concat()),
            Node::element("p", [vec![Node::element("span", Node::text("c"))], Node::text("d")].concat()),
        ]);
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }

    #[test]
    fn split_of_unwrapped_element() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("q", Node::text("abcd"))]);
        let a = split(&[0, 2], 2);
        let b: Operation = UnwrapOperation::new(Position::new("main", &[0, 0]), 4, Position::graveyard(0), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", Node::text("abcd"));
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }

    #[test]
    fn split_element_merged_elsewhere() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("h", Node::text("Foo")), Node::element("p", Node::text("Bar"))]);
        let a = split(&[1, 1], 2);
        let b: Operation = MergeOperation::new(Position::new("main", &[1, 0]), 3, Position::new("main", &[0, 3]),
                                               Position::graveyard(0), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", vec![Node::element("h", Node::text("FooB")), Node::element("p", Node::text("ar"))]);
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }

    #[test]
    fn split_point_moved_away_within_the_element() {
        let doc = para_doc("wxy");
        let a = split(&[0, 2], 1);
        let b: Operation = MoveOperation::new(Position::new("main", &[0, 1]), 2, Position::new("main", &[0, 0]), 0).into();

        let a2 = transform(&a, &b, &TransformContext::strong()).unwrap();
        assert!(matches!(&a2[0], Operation::Split(op) if op.how_many == 0 && op.split_position.path[..] == [0, 3]), "{:?}", a2);

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Document::new();
        expected.create_root("main", vec![Node::element("p", Node::text("xyw")), Node::element("p", vec![])]);
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }
}
