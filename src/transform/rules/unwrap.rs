use smallvec::smallvec;

use crate::operation::{InsertOperation, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::{Position, Stickiness};
use crate::transform::{TResult, TransformContext};
use super::{no_op, one};

/// Whether `pos` points at a child of the element at `element`.
fn is_child_of(pos: &Position, element: &Position) -> bool {
    pos.root == element.root && pos.parent_path() == element.path.as_slice()
}

pub(super) fn by_insert(mut a: UnwrapOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    if is_child_of(&b.position, &a.element_position()) {
        a.how_many += b.how_many();
    }
    a.position = a.position.transformed_by_insert_operation(b);
    a.graveyard_position = a.graveyard_position.transformed_by_insert_operation(b);
    Ok(one(a))
}

pub(super) fn by_move(mut a: UnwrapOperation, b: &MoveOperation, _ctx: &TransformContext) -> TResult {
    let element = a.element_position();
    if is_child_of(&b.source_position, &element) {
        a.how_many -= b.how_many;
    }
    if is_child_of(&b.target_position, &element) {
        a.how_many += b.how_many;
    }

    a.position = a.position.transformed_by_move_operation(b);
    // Nodes removed at the same spot go after the unwrapped element.
    if a.graveyard_position != b.target_position {
        a.graveyard_position = a.graveyard_position.transformed_by_move_operation(b);
    }
    Ok(one(a))
}

pub(super) fn by_split(mut a: UnwrapOperation, b: &SplitOperation, _ctx: &TransformContext) -> TResult {
    let element = a.element_position();
    let graveyard = a.graveyard_position.transformed_by_split_operation(b);

    // The unwrapped element was split in two. Unwrap both halves.
    if is_child_of(&b.split_position, &element) {
        let first = UnwrapOperation::new(element.child(0), b.split_position.offset(), graveyard.clone(), 0);
        let second_element = b.insertion_position.clone()
            .with_stickiness(Stickiness::ToNone)
            .transformed_by_unwrap_operation(&first);
        let second = UnwrapOperation::new(second_element.child(0), b.how_many, graveyard, 0);
        return Ok(smallvec![first.into(), second.into()]);
    }

    // One of the children was split.
    if is_child_of(&b.insertion_position, &element) {
        a.how_many += 1;
    }

    a.position = a.position.transformed_by_split_operation(b);
    a.graveyard_position = graveyard;
    Ok(one(a))
}

pub(super) fn by_merge(mut a: UnwrapOperation, b: &MergeOperation, ctx: &TransformContext) -> TResult {
    let element = a.element_position();
    let deletion = b.deletion_position();

    // The element was merged away and its children are where they belong.
    if deletion == element {
        return Ok(no_op());
    }

    if is_child_of(&b.target_position, &element) {
        a.how_many += b.how_many;
    }
    if is_child_of(&deletion, &element) {
        a.how_many -= 1;
    }

    a.position = a.position.transformed_by_merge_operation(b);
    if a.graveyard_position != b.graveyard_position || !ctx.a_is_strong {
        a.graveyard_position = a.graveyard_position.transformed_by_merge_operation(b);
    }
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: UnwrapOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    // Some children are in a single wrapper now.
    if is_child_of(&b.position, &a.element_position()) {
        a.how_many = a.how_many + 1 - b.how_many;
    }

    a.position = a.position.transformed_by_wrap_operation(b);
    a.graveyard_position = a.graveyard_position.transformed_by_wrap_operation(b);
    Ok(one(a))
}

pub(super) fn by_unwrap(mut a: UnwrapOperation, b: &UnwrapOperation, ctx: &TransformContext) -> TResult {
    let element = a.element_position();
    if b.element_position() == element {
        return Ok(no_op());
    }

    // A child was replaced by its own children.
    if is_child_of(&b.element_position(), &element) {
        a.how_many = a.how_many + b.how_many - 1;
    }

    a.position = a.position.transformed_by_unwrap_operation(b);
    // Same graveyard spot for both elements. The stronger one gets it.
    if a.graveyard_position != b.graveyard_position || !ctx.a_is_strong {
        a.graveyard_position = a.graveyard_position.transformed_by_unwrap_operation(b);
    }
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

    fn quote(children: Vec<Node>) -> Document {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("quote", children)]);
        doc
    }

    fn unwrap(path: &[usize], how_many: usize) -> Operation {
        UnwrapOperation::new(Position::new("main", path), how_many, Position::graveyard(0), 0).into()
    }

    fn plain(s: &str) -> Document {
        let mut doc = Document::new();
        doc.create_root("main", Node::text(s));
        doc
    }

    #[test]
    fn typing_inside_the_unwrapped_element() {
        let doc = quote(Node::text("ab"));
        let b: Operation = InsertOperation::new(Position::new("main", &[0, 1]), Node::text("x"), 0).into();

        let (left, right) = converge(&doc, &unwrap(&[0, 0], 2), &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        assert!(left.content_eq(&plain("axb")));
    }

    #[test]
    fn same_element_unwrapped_twice() {
        let doc = quote(Node::text("ab"));
        let op = unwrap(&[0, 0], 2);

        let (left, right) = converge(&doc, &op, &op.clone());
        assert!(left.content_eq(&plain("ab")));
        assert!(right.content_eq(&plain("ab")));
        assert_eq!(left.graveyard(), right.graveyard());
        assert_eq!(left.graveyard().children.len(), 1);
    }

    #[test]
    fn nested_elements_unwrapped() {
        let mut children = vec![Node::element("p", Node::text("ab"))];
        children.extend(Node::text("c"));
        let doc = quote(children);

        let (left, right) = converge(&doc, &unwrap(&[0, 0], 2), &unwrap(&[0, 0, 0], 2));
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        assert!(left.content_eq(&plain("abc")));
    }

    #[test]
    fn children_wrapped_while_unwrapping() {
        let doc = quote(Node::text("abc"));
        let b: Operation = WrapOperation::new(Position::new("main", &[0, 1]), 2, Element::new("x"), 0).into();

        let (left, right) = converge(&doc, &unwrap(&[0, 0], 3), &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));

        let mut expected = Node::text("a");
        expected.push(Node::element("x", Node::text("bc")));
        assert_eq!(left.root("main").unwrap().children, expected);
    }

    #[test]
    fn child_moved_out_before_unwrapping() {
        let mut doc = quote(Node::text("abc"));
        doc.create_root("other", vec![]);
        let b: Operation = MoveOperation::new(Position::new("main", &[0, 1]), 1, Position::new("other", &[0]), 0).into();

        let (left, right) = converge(&doc, &unwrap(&[0, 0], 3), &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        assert!(left.root("main").unwrap().children == Node::text("ac"));
        assert!(left.root("other").unwrap().children == Node::text("b"));
    }

    #[test]
    fn sibling_removed_to_the_same_graveyard_spot() {
        let mut doc = Document::new();
        doc.create_root("main", vec![
            Node::element("quote", vec![Node::element("p", Node::text("a"))]),
            Node::element("p", Node::text("b")),
        ]);
        let a = unwrap(&[0, 0], 1);
        let b: Operation = MoveOperation::new(Position::new("main", &[1]), 1, Position::graveyard(0), 0).into();

        for (a, b) in [(&a, &b), (&b, &a)] {
            let (left, right) = converge(&doc, a, b);
            assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
            // The unwrapped element stays in front of the removed paragraph.
            assert_eq!(left.graveyard(), right.graveyard());
            assert_eq!(left.graveyard().children[0].as_element().unwrap().name.as_str(), "quote");
        }
    }
}
