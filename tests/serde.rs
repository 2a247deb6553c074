#![cfg(feature = "serde")]

use tree_ot::*;

fn round_trip(op: &Operation) -> Operation {
    let json = serde_json::to_string(op).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn operations_survive_json() {
    let range = Range::new(Position::new("main", &[0, 1]), Position::new("main", &[0, 4]));
    let ops: Vec<Operation> = vec![
        InsertOperation::new(Position::new("main", &[0, 2]), Node::text("hi"), 3).into(),
        MoveOperation::new(Position::new("main", &[1]), 2, Position::graveyard(0), 4).into(),
        AttributeOperation::new(range.clone(), "bold", None, Some(true.into()), 5).into(),
        RenameOperation::new(Position::new("main", &[0]), "paragraph", "heading1", 6).into(),
        RootAttributeOperation::new("main", "lang", Some("en".into()), Some("pl".into()), 7).into(),
        MarkerOperation::new("comment:1", None, Some(range), true, 8).into(),
        WrapOperation::new(Position::new("main", &[1]), 2, Element::new("blockQuote").with_attr("level", 2i64), 9).into(),
        UnwrapOperation::new(Position::new("main", &[1, 0]), 2, Position::graveyard(0), 10).into(),
        Operation::no_op(11),
    ];

    for op in &ops {
        assert_eq!(&round_trip(op), op);
    }
}

#[test]
fn operations_are_tagged_by_type() {
    let op: Operation = MoveOperation::new(Position::new("main", &[1]), 2, Position::graveyard(0), 4).into();
    let value = serde_json::to_value(&op).unwrap();
    assert_eq!(value["type"], "Move");
    assert_eq!(value["how_many"], 2);
}

#[test]
fn transformed_operations_can_be_shipped() {
    let mut doc = Document::new();
    doc.create_root("main", vec![Node::element("p", Node::text("Foo"))]);

    let split = Position::new("main", &[0, 1]);
    let a: Operation = SplitOperation::new(split.clone(), 2, SplitOperation::insertion_position_for(&split), None, 0).into();
    let b: Operation = InsertOperation::new(Position::new("main", &[0, 3]), Node::text("d"), 0).into();

    let transformed = transform(&a, &b, &TransformContext::strong()).unwrap();
    let json = serde_json::to_string(&transformed.to_vec()).unwrap();
    let received: Vec<Operation> = serde_json::from_str(&json).unwrap();

    doc.apply(&b).unwrap();
    doc.apply_all(&received).unwrap();
    let root = doc.root("main").unwrap();
    assert_eq!(root.children, vec![
        Node::element("p", Node::text("F")),
        Node::element("p", Node::text("ood")),
    ]);
}
