use crate::operation::RootAttributeOperation;
use crate::transform::{TResult, TransformContext};
use super::{no_op, one};

pub(super) fn by_root_attribute(mut a: RootAttributeOperation, b: &RootAttributeOperation, ctx: &TransformContext) -> TResult {
    if a.root == b.root && a.key == b.key {
        if !ctx.a_is_strong || a.new_value == b.new_value {
            return Ok(no_op());
        }
        a.old_value = b.new_value.clone();
    }
    Ok(one(a))
}

#[cfg(test)]
mod test {
    use crate::model::{AttrValue, Document};
    use crate::operation::*;
    use crate::transform::{transform, TransformContext};

    #[test]
    fn conflicting_root_attributes() {
        let mut doc = Document::new();
        doc.create_root("main", vec![]);
        let a: Operation = RootAttributeOperation::new("main", "lang", None, Some(AttrValue::from("en")), 0).into();
        let b: Operation = RootAttributeOperation::new("main", "lang", None, Some(AttrValue::from("pl")), 0).into();

        let mut left = doc.clone();
        left.apply(&a).unwrap();
        left.apply_all(&transform(&b, &a, &TransformContext::weak()).unwrap()).unwrap();

        let mut right = doc.clone();
        right.apply(&b).unwrap();
        let a2 = transform(&a, &b, &TransformContext::strong()).unwrap();
        let Operation::RootAttribute(op) = &a2[0] else { panic!("{:?}", a2) };
        assert_eq!(op.old_value, Some(AttrValue::from("pl")));
        right.apply_all(&a2).unwrap();

        assert_eq!(left.root("main").unwrap().attrs, right.root("main").unwrap().attrs);
        assert_eq!(left.root("main").unwrap().attrs.get("lang"), Some(&AttrValue::from("en")));
    }

    #[test]
    fn identical_changes_become_no_ops() {
        let a: Operation = RootAttributeOperation::new("main", "x", None, Some(AttrValue::Bool(true)), 0).into();
        let result = transform(&a, &a.clone(), &TransformContext::strong()).unwrap();
        assert!(result[0].is_no_op());
    }
}
