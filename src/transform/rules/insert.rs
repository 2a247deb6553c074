use crate::operation::{AttributeOperation, InsertOperation, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::transform::{Ops, TResult, TransformContext};
use super::attribute::complementary_operations;
use super::one;

pub(super) fn by_attribute(a: InsertOperation, b: &AttributeOperation, _ctx: &TransformContext) -> TResult {
    // The attribute change covers the insertion spot. Inserted text picks up the new value.
    let extra = if a.should_receive_attributes
        && a.position.has_same_parent_as(&b.range.start) && b.range.contains_position(&a.position) {
        complementary_operations(&a.position, &a.nodes, &b.key, &b.new_value)
    } else {
        Ops::new()
    };

    let mut result = one(a);
    result.extend(extra);
    Ok(result)
}

pub(super) fn by_insert(mut a: InsertOperation, b: &InsertOperation, ctx: &TransformContext) -> TResult {
    if a.position == b.position && ctx.a_is_strong {
        return Ok(one(a));
    }
    a.position = a.position.transformed_by_insert_operation(b);
    Ok(one(a))
}

pub(super) fn by_move(mut a: InsertOperation, b: &MoveOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_move_operation(b);
    Ok(one(a))
}

pub(super) fn by_split(mut a: InsertOperation, b: &SplitOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_split_operation(b);
    Ok(one(a))
}

pub(super) fn by_merge(mut a: InsertOperation, b: &MergeOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_merge_operation(b);
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: InsertOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_wrap_operation(b);
    Ok(one(a))
}

pub(super) fn by_unwrap(mut a: InsertOperation, b: &UnwrapOperation, _ctx: &TransformContext) -> TResult {
    a.position = a.position.transformed_by_unwrap_operation(b);
    Ok(one(a))
}

#[cfg(test)]
mod test {
    use crate::model::{AttrValue, Document, Element, Node};
    use crate::operation::*;
    use crate::position::Position;
    use crate::range::Range;
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

    #[test]
    fn same_spot_strong_goes_first() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text("ab"))]);
        let a: Operation = InsertOperation::new(Position::new("main", &[0, 1]), Node::text("x"), 0).into();
        let b: Operation = InsertOperation::new(Position::new("main", &[0, 1]), Node::text("y"), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right));

        let mut expected = Document::new();
        expected.create_root("main", vec![Node::element("p", Node::text("axyb"))]);
        assert!(left.content_eq(&expected), "{:?}", left.root("main"));
    }

    #[test]
    fn typing_into_bold_text() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text("foobar"))]);

        let mut insert = InsertOperation::new(Position::new("main", &[0, 3]), Node::text("xy"), 0);
        insert.should_receive_attributes = true;
        let a: Operation = insert.into();
        let b: Operation = AttributeOperation::new(
            Range::new(Position::new("main", &[0, 1]), Position::new("main", &[0, 5])),
            "bold", None, Some(AttrValue::Bool(true)), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        let p = left.root("main").unwrap().children[0].as_element().unwrap();
        assert_eq!(p.children[3].attribute("bold"), Some(&AttrValue::Bool(true)));
    }

    #[test]
    fn insert_into_wrapped_range() {
        let mut doc = Document::new();
        doc.create_root("main", Node::text("abcd"));
        let a: Operation = InsertOperation::new(Position::new("main", &[2]), Node::text("x"), 0).into();
        let b: Operation = WrapOperation::new(Position::new("main", &[1]), 2, Element::new("q"), 0).into();

        let (left, right) = converge(&doc, &a, &b);
        assert!(left.content_eq(&right), "{:?} != {:?}", left.root("main"), right.root("main"));
        assert_eq!(left.root("main").unwrap().children.len(), 3);
    }
}
