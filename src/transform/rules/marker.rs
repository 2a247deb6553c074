use crate::operation::{InsertOperation, MarkerOperation, MergeOperation, MoveOperation, SplitOperation, UnwrapOperation, WrapOperation};
use crate::position::Position;
use crate::range::Range;
use crate::relations::{MarkerSide, Relation};
use crate::transform::{TResult, TransformContext};
use super::{no_op, one};

fn map_ranges(a: &mut MarkerOperation, f: impl Fn(&Range) -> Range) {
    a.old_range = a.old_range.as_ref().map(&f);
    a.new_range = a.new_range.as_ref().map(&f);
}

fn by_move_glued(range: &Range, b: &MoveOperation) -> Range {
    let ranges = range.transformed_by_move_operation(b, false);
    Range::from_ranges(&ranges).unwrap_or_else(|| range.clone())
}

pub(super) fn by_insert(mut a: MarkerOperation, b: &InsertOperation, _ctx: &TransformContext) -> TResult {
    map_ranges(&mut a, |r| {
        r.transformed_by_insertion(&b.position, b.how_many(), false).into_iter().next()
            .unwrap_or_else(|| r.clone())
    });
    Ok(one(a))
}

pub(super) fn by_marker(mut a: MarkerOperation, b: &MarkerOperation, ctx: &TransformContext) -> TResult {
    if a.name == b.name {
        if !ctx.a_is_strong {
            return Ok(no_op());
        }
        a.old_range = b.new_range.clone();
    }
    Ok(one(a))
}

pub(super) fn by_move(mut a: MarkerOperation, b: &MoveOperation, ctx: &TransformContext) -> TResult {
    a.old_range = a.old_range.as_ref().map(|r| by_move_glued(r, b));

    if let Some(new_range) = &a.new_range {
        let transformed = by_move_glued(new_range, b);

        // Undoing a move: put the boundary which travelled with the moved content back where it
        // was before.
        if let Some(Relation::MarkerMoved { side, path }) = &ctx.ab_relation {
            let restored = Position::from_path(new_range.start.root.clone(), path.clone());
            match side {
                MarkerSide::Left if b.target_position == new_range.start && !restored.is_after(&transformed.end) => {
                    a.new_range = Some(Range::new(restored, transformed.end));
                    return Ok(one(a));
                }
                MarkerSide::Right if b.target_position == new_range.end && !transformed.start.is_after(&restored) => {
                    a.new_range = Some(Range::new(transformed.start, restored));
                    return Ok(one(a));
                }
                _ => {}
            }
        }
        a.new_range = Some(transformed);
    }

    Ok(one(a))
}

pub(super) fn by_split(mut a: MarkerOperation, b: &SplitOperation, ctx: &TransformContext) -> TResult {
    a.old_range = a.old_range.as_ref().map(|r| r.transformed_by_split_operation(b));

    if let Some(new_range) = &a.new_range {
        let transformed = new_range.transformed_by_split_operation(b);

        // Undoing a merge: boundaries at the split position go back to the element they were in.
        if let Some(Relation::MarkerMerged {
            was_in_left_element, was_start_before_merged_element,
            was_end_before_merged_element, was_in_right_element,
        }) = &ctx.ab_relation {
            let mut start = transformed.start.clone();
            let mut end = transformed.end.clone();

            if new_range.start == b.split_position {
                if *was_start_before_merged_element {
                    start = b.insertion_position.clone();
                } else if !*was_in_left_element {
                    start = b.move_target_position();
                }
            }
            if new_range.end == b.split_position {
                if *was_in_right_element {
                    end = b.move_target_position();
                } else if *was_end_before_merged_element {
                    end = b.insertion_position.clone();
                }
            }

            if !start.is_after(&end) {
                a.new_range = Some(Range::new(start, end));
                return Ok(one(a));
            }
        }
        a.new_range = Some(transformed);
    }

    Ok(one(a))
}

pub(super) fn by_merge(mut a: MarkerOperation, b: &MergeOperation, _ctx: &TransformContext) -> TResult {
    map_ranges(&mut a, |r| r.transformed_by_merge_operation(b));
    Ok(one(a))
}

pub(super) fn by_wrap(mut a: MarkerOperation, b: &WrapOperation, _ctx: &TransformContext) -> TResult {
    map_ranges(&mut a, |r| r.transformed_by_wrap_operation(b));
    Ok(one(a))
}

pub(super) fn by_unwrap(mut a: MarkerOperation, b: &UnwrapOperation, _ctx: &TransformContext) -> TResult {
    map_ranges(&mut a, |r| r.transformed_by_unwrap_operation(b));
    Ok(one(a))
}

#[cfg(test)]
mod test {
    use crate::model::{Document, Node};
    use crate::operation::*;
    use crate::position::Position;
    use crate::range::Range;
    use crate::relations::{MarkerSide, Relation};
    use crate::transform::{transform, TransformContext};

    fn r(start: usize, end: usize) -> Range {
        Range::new(Position::new("main", &[0, start]), Position::new("main", &[0, end]))
    }

    #[test]
    fn same_marker_strong_wins() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text("abcdef"))]);

        let a: Operation = MarkerOperation::new("comment", None, Some(r(0, 2)), true, 0).into();
        let b: Operation = MarkerOperation::new("comment", None, Some(r(3, 5)), true, 0).into();

        let mut left = doc.clone();
        left.apply(&a).unwrap();
        left.apply_all(&transform(&b, &a, &TransformContext::weak()).unwrap()).unwrap();

        let mut right = doc.clone();
        right.apply(&b).unwrap();
        right.apply_all(&transform(&a, &b, &TransformContext::strong()).unwrap()).unwrap();

        assert_eq!(left.markers(), right.markers());
        assert_eq!(left.markers().get("comment"), Some(&r(0, 2)));
    }

    #[test]
    fn marker_follows_insertions() {
        let a: Operation = MarkerOperation::new("m", None, Some(r(2, 4)), false, 0).into();
        let b: Operation = InsertOperation::new(Position::new("main", &[0, 0]), Node::text("xy"), 0).into();
        let result = transform(&a, &b, &TransformContext::strong()).unwrap();
        let Operation::Marker(op) = &result[0] else { panic!() };
        assert_eq!(op.new_range, Some(r(4, 6)));
    }

    #[test]
    fn undone_move_restores_left_boundary() {
        // The marker started in content which was moved away to [0, 8] and now comes back.
        let a: Operation = MarkerOperation::new("m", None, Some(r(6, 8)), false, 0).into();
        let b: Operation = MoveOperation::new(Position::new("main", &[0, 8]), 2, Position::new("main", &[0, 6]), 0).into();
        let ctx = TransformContext {
            a_is_strong: true,
            ab_relation: Some(Relation::MarkerMoved { side: MarkerSide::Left, path: [0, 2].into_iter().collect() }),
            ..Default::default()
        };
        let result = transform(&a, &b, &ctx).unwrap();
        let Operation::Marker(op) = &result[0] else { panic!() };
        assert_eq!(op.new_range, Some(r(2, 10)));
    }
}
