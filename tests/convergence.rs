use std::io::Write;
use rand::prelude::*;
use tree_ot::*;

/// Prints the seed if the test panics while it's alive.
struct Seed(u64);
impl Drop for Seed {
    fn drop(&mut self) {
        if std::thread::panicking() {
            eprintln!("*** CRASHED ON SEED {} ***", self.0);
            drop(std::io::stderr().flush());
        }
    }
}

fn random_str(len: usize, rng: &mut SmallRng) -> String {
    let alphabet: Vec<char> = "abcdefghijklmnop_".chars().collect();
    (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
}

fn text_len(doc: &Document) -> usize {
    doc.root("main").map_or(0, |root| root.children.len())
}

fn text(doc: &Document) -> String {
    doc.root("main").unwrap().children.iter().map(|n| match n {
        Node::Char { ch, .. } => *ch,
        Node::Element(_) => '#',
    }).collect()
}

/// Type or remove something in the flat text of the main root, and apply it.
fn make_random_change(doc: &mut Document, rng: &mut SmallRng) -> Operation {
    let len = text_len(doc);
    let version = doc.version();

    let op: Operation = if len == 0 || rng.gen_bool(0.55) {
        let pos = rng.gen_range(0..=len);
        let content = random_str(rng.gen_range(1..3), rng);
        InsertOperation::new(Position::new("main", &[pos]), Node::text(&content), version).into()
    } else {
        let pos = rng.gen_range(0..len);
        let span = rng.gen_range(1..=usize::min(4, len - pos));
        MoveOperation::new(Position::new("main", &[pos]), span, Position::graveyard(0), version).into()
    };

    doc.apply(&op).unwrap();
    op
}

fn converge_random(seed: u64, max_ops: usize) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut doc = Document::new();
    let initial = random_str(rng.gen_range(0..12), &mut rng);
    doc.create_root("main", Node::text(&initial));

    let mut left = doc.clone();
    let ops_a: Vec<Operation> = (0..rng.gen_range(1..=max_ops)).map(|_| make_random_change(&mut left, &mut rng)).collect();
    let mut right = doc.clone();
    let ops_b: Vec<Operation> = (0..rng.gen_range(1..=max_ops)).map(|_| make_random_change(&mut right, &mut rng)).collect();

    let result = transform_sets(&ops_a, &ops_b, &TransformSetsOptions::default()).unwrap();
    left.apply_all(&result.operations_b).unwrap();
    right.apply_all(&result.operations_a).unwrap();

    assert!(left.content_eq(&right), "{:?} != {:?}", text(&left), text(&right));
}

#[test]
fn concurrent_typing_converges() {
    for seed in 0..300 {
        let seed = Seed(seed);
        converge_random(seed.0, 1);
    }
}

#[test]
fn concurrent_edit_sequences_converge() {
    for seed in 0..300 {
        let seed = Seed(seed);
        converge_random(seed.0, 4);
    }
}

#[test]
#[ignore]
fn concurrent_edit_sequences_converge_forever() {
    for seed in 0.. {
        if seed % 1000 == 0 { println!("seed {}", seed); }
        let seed = Seed(seed);
        converge_random(seed.0, 8);
    }
}

/// Paths of the paragraphs in `element`, looking inside block quotes.
fn paragraphs(element: &Element, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (i, child) in element.children.iter().enumerate() {
        if let Node::Element(e) = child {
            prefix.push(i);
            if e.name == "bq" { paragraphs(e, prefix, out); } else { out.push(prefix.clone()); }
            prefix.pop();
        }
    }
}

fn element_at<'a>(doc: &'a Document, path: &[usize]) -> &'a Element {
    path.iter().fold(doc.root("main").unwrap(), |e, &i| e.children[i].as_element().unwrap())
}

fn at(path: &[usize]) -> Position {
    Position::new("main", path)
}

fn child(path: &[usize], offset: usize) -> Position {
    let mut path = path.to_vec();
    path.push(offset);
    at(&path)
}

/// A few paragraphs, some of them in block quotes.
fn random_structured_doc(rng: &mut SmallRng) -> Document {
    let mut doc = Document::new();
    let children = (0..rng.gen_range(1..4)).map(|_| {
        if rng.gen_bool(0.25) {
            let paras = (0..rng.gen_range(1..3))
                .map(|_| Node::element("p", Node::text(&"abcd"[..rng.gen_range(0..4)])))
                .collect();
            Node::element("bq", paras)
        } else {
            Node::element("p", Node::text(&"wxyz"[..rng.gen_range(0..5)]))
        }
    }).collect();
    doc.create_root("main", children);
    doc
}

/// Some edit around a random paragraph. Not necessarily valid.
fn random_edit(doc: &Document, rng: &mut SmallRng) -> Option<Operation> {
    let version = doc.version();
    let mut paras = vec![];
    paragraphs(doc.root("main").unwrap(), &mut vec![], &mut paras);
    if paras.is_empty() {
        return Some(InsertOperation::new(at(&[0]), vec![Node::element("p", Node::text("n"))], version).into());
    }

    let p = paras.choose(rng).unwrap().clone();
    let len = element_at(doc, &p).children.len();
    let (parent, idx) = (&p[..p.len() - 1], p[p.len() - 1]);
    let siblings = element_at(doc, parent).children.len();

    let op: Operation = match rng.gen_range(0..12) {
        0 => {
            let mut op = InsertOperation::new(child(&p, rng.gen_range(0..=len)), Node::text("Q"), version);
            op.should_receive_attributes = rng.gen_bool(0.5);
            op.into()
        }
        1 if len > 0 => {
            let start = rng.gen_range(0..len);
            let n = rng.gen_range(1..=len - start);
            MoveOperation::new(child(&p, start), n, Position::graveyard(0), version).into()
        }
        2 if len > 0 => {
            let start = rng.gen_range(0..len);
            let n = rng.gen_range(1..=len - start);
            let q = paras.choose(rng).unwrap().clone();
            let target = rng.gen_range(0..=element_at(doc, &q).children.len());
            if q == p && (start..=start + n).contains(&target) { return None; }
            MoveOperation::new(child(&p, start), n, child(&q, target), version).into()
        }
        3 if len > 0 => {
            let start = rng.gen_range(0..len);
            let e = element_at(doc, &p);
            let old = e.children[start].attribute("bold").cloned();
            let mut end = start + 1;
            while end < len && end < start + 3 && e.children[end].attribute("bold").cloned() == old {
                end += 1;
            }
            let new = if old.is_some() { None } else { Some(AttrValue::Bool(true)) };
            AttributeOperation::new(Range::new(child(&p, start), child(&p, end)), "bold", old, new, version).into()
        }
        4 => {
            let name = element_at(doc, &p).name.clone();
            RenameOperation::new(at(&p), &name, if name == "p" { "h" } else { "p" }, version).into()
        }
        5 => {
            let offset = rng.gen_range(0..=len);
            let split = child(&p, offset);
            SplitOperation::new(split.clone(), len - offset, SplitOperation::insertion_position_for(&split), None, version).into()
        }
        6 if idx + 1 < siblings => {
            let mut next = parent.to_vec();
            next.push(idx + 1);
            let n = element_at(doc, &next);
            if n.name == "bq" { return None; }
            MergeOperation::new(child(&next, 0), n.children.len(), child(&p, len), Position::graveyard(0), version).into()
        }
        7 => {
            let n = rng.gen_range(1..=siblings - idx);
            WrapOperation::new(at(&p), n, Element::new("bq"), version).into()
        }
        8 if len > 0 => {
            let start = rng.gen_range(0..len);
            let n = rng.gen_range(1..=len - start);
            WrapOperation::new(child(&p, start), n, Element::new("span"), version).into()
        }
        9 if p.len() == 2 => {
            let n = element_at(doc, parent).children.len();
            UnwrapOperation::new(child(parent, 0), n, Position::graveyard(0), version).into()
        }
        10 => MoveOperation::new(at(&p), 1, Position::graveyard(0), version).into(),
        11 => {
            let q = paras.choose(rng).unwrap().clone();
            if q.starts_with(&p) { return None; }
            MoveOperation::new(at(&p), 1, at(&q), version).into()
        }
        _ => return None,
    };
    Some(op)
}

/// A random edit which applies to `doc`. Moves which leave everything in place are skipped.
fn make_random_edit(doc: &Document, rng: &mut SmallRng) -> Operation {
    loop {
        let Some(op) = random_edit(doc, rng) else { continue };
        if let Operation::Move(m) = &op {
            if !m.target_position.is_in_graveyard()
                && (m.target_position == m.source_position || m.target_position == m.source_position.shifted_by(m.how_many as isize)) {
                continue;
            }
        }
        if doc.clone().apply(&op).is_ok() { return op; }
    }
}

fn structural_pair_converges(seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let doc = random_structured_doc(&mut rng);
    let a = make_random_edit(&doc, &mut rng);
    let b = make_random_edit(&doc, &mut rng);

    let mut left = doc.clone();
    left.apply(&a).unwrap();
    left.apply_all(&transform(&b, &a, &TransformContext::weak()).unwrap()).unwrap();

    let mut right = doc.clone();
    right.apply(&b).unwrap();
    right.apply_all(&transform(&a, &b, &TransformContext::strong()).unwrap()).unwrap();

    assert!(left.content_eq(&right), "{:?} != {:?}\n a={:?}\n b={:?}", left.root("main"), right.root("main"), a, b);
}

fn structural_sets_converge(seed: u64, max_ops: usize) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let doc = random_structured_doc(&mut rng);

    let mut left = doc.clone();
    let mut ops_a = vec![];
    for _ in 0..rng.gen_range(1..=max_ops) {
        let op = make_random_edit(&left, &mut rng);
        left.apply(&op).unwrap();
        ops_a.push(op);
    }
    let mut right = doc.clone();
    let mut ops_b = vec![];
    for _ in 0..rng.gen_range(1..=max_ops) {
        let op = make_random_edit(&right, &mut rng);
        right.apply(&op).unwrap();
        ops_b.push(op);
    }

    let result = transform_sets(&ops_a, &ops_b, &TransformSetsOptions::default()).unwrap();
    left.apply_all(&result.operations_b).unwrap();
    right.apply_all(&result.operations_a).unwrap();

    assert!(left.content_eq(&right), "{:?} != {:?}\n a={:?}\n b={:?}", left.root("main"), right.root("main"), ops_a, ops_b);
}

#[test]
fn concurrent_structural_edits_converge() {
    for seed in 0..5000 {
        let seed = Seed(seed);
        structural_pair_converges(seed.0);
    }
}

#[test]
fn concurrent_structural_sequences_converge() {
    for seed in 0..1000 {
        let seed = Seed(seed);
        structural_sets_converge(seed.0, 3);
    }
}

#[test]
#[ignore]
fn concurrent_structural_edits_converge_forever() {
    for seed in 0.. {
        if seed % 1000 == 0 { println!("seed {}", seed); }
        let seed = Seed(seed);
        structural_pair_converges(seed.0);
    }
}

#[test]
fn both_sides_remove_overlapping_text() {
    let mut doc = Document::new();
    doc.create_root("main", Node::text("abcdef"));

    let a: Operation = MoveOperation::new(Position::new("main", &[1]), 3, Position::graveyard(0), 0).into();
    let b: Operation = MoveOperation::new(Position::new("main", &[2]), 3, Position::graveyard(0), 0).into();

    let mut left = doc.clone();
    left.apply(&a).unwrap();
    left.apply_all(&transform(&b, &a, &TransformContext::weak()).unwrap()).unwrap();

    let mut right = doc.clone();
    right.apply(&b).unwrap();
    right.apply_all(&transform(&a, &b, &TransformContext::strong()).unwrap()).unwrap();

    assert_eq!(text(&left), "af");
    assert_eq!(text(&right), "af");
    assert_eq!(left.graveyard().children.len(), 4);
    assert_eq!(right.graveyard().children.len(), 4);
}
