use std::collections::BTreeMap;
use smartstring::alias::String as SmartString;

use crate::error::ApplyError;
use crate::model::{Element, Node, GRAVEYARD};
use crate::operation::Operation;
use crate::position::Position;
use crate::range::Range;

/// A set of named roots (plus the graveyard), the document's markers and its version.
///
/// The version counts applied operations. An operation can only be applied to a document whose
/// version matches the operation's base version.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Document {
    roots: BTreeMap<SmartString, Element>,
    markers: BTreeMap<SmartString, Range>,
    version: usize,
}

impl Default for Document {
    fn default() -> Self { Self::new() }
}

impl Document {
    pub fn new() -> Self {
        let mut roots = BTreeMap::new();
        roots.insert(GRAVEYARD.into(), Element::new("$root"));
        Document { roots, markers: BTreeMap::new(), version: 0 }
    }

    /// Add a root holding `children`. Replaces any existing root with the same name.
    pub fn create_root(&mut self, name: &str, children: Vec<Node>) -> &mut Element {
        debug_assert_ne!(name, GRAVEYARD);
        let root = self.roots.entry(name.into()).or_insert_with(|| Element::new("$root"));
        *root = Element::with_children("$root", children);
        root
    }

    pub fn root(&self, name: &str) -> Option<&Element> {
        self.roots.get(name)
    }

    pub(crate) fn root_mut(&mut self, name: &str) -> Result<&mut Element, ApplyError> {
        self.roots.get_mut(name).ok_or_else(|| ApplyError::MissingRoot(name.into()))
    }

    pub fn graveyard(&self) -> &Element {
        &self.roots[GRAVEYARD]
    }

    pub fn version(&self) -> usize {
        self.version
    }

    pub fn markers(&self) -> &BTreeMap<SmartString, Range> {
        &self.markers
    }

    pub(crate) fn markers_mut(&mut self) -> &mut BTreeMap<SmartString, Range> {
        &mut self.markers
    }

    /// Validate and apply an operation, bumping the document version.
    pub fn apply(&mut self, op: &Operation) -> Result<(), ApplyError> {
        if op.base_version() != self.version {
            return Err(ApplyError::VersionMismatch { op: op.base_version(), doc: self.version });
        }

        tracing::trace!(?op, version = self.version, "applying operation");
        op.validate(self)?;
        op.execute(self)?;
        self.version += 1;
        Ok(())
    }

    /// Apply a list of operations in order.
    pub fn apply_all<'a>(&mut self, ops: impl IntoIterator<Item = &'a Operation>) -> Result<(), ApplyError> {
        for op in ops {
            self.apply(op)?;
        }
        Ok(())
    }

    /// Compare the user visible content of two documents: every root except the graveyard,
    /// including root attributes.
    pub fn content_eq(&self, other: &Document) -> bool {
        let visible = |doc: &'_ Document| doc.roots.iter()
            .filter(|(name, _)| *name != GRAVEYARD)
            .map(|(name, e)| (name.clone(), e.clone()))
            .collect::<Vec<_>>();
        visible(self) == visible(other)
    }

    // ***** Tree access used by the operations.

    pub(crate) fn element_at(&self, root: &str, path: &[usize]) -> Result<&Element, ApplyError> {
        let mut element = self.roots.get(root).ok_or_else(|| ApplyError::MissingRoot(root.into()))?;
        for (depth, &offset) in path.iter().enumerate() {
            element = element.children.get(offset)
                .and_then(Node::as_element)
                .ok_or_else(|| ApplyError::NotAnElement(Position::from_path(root.into(), path[..=depth].into())))?;
        }
        Ok(element)
    }

    pub(crate) fn element_at_mut(&mut self, root: &str, path: &[usize]) -> Result<&mut Element, ApplyError> {
        let mut element = self.root_mut(root)?;
        for (depth, &offset) in path.iter().enumerate() {
            element = element.children.get_mut(offset)
                .and_then(Node::as_element_mut)
                .ok_or_else(|| ApplyError::NotAnElement(Position::from_path(root.into(), path[..=depth].into())))?;
        }
        Ok(element)
    }

    /// The element a position is in. Fails if the position's offset is past its parent's end.
    pub(crate) fn parent_of(&self, pos: &Position) -> Result<&Element, ApplyError> {
        let parent = self.element_at(&pos.root, pos.parent_path())?;
        if pos.offset() > parent.child_count() {
            return Err(ApplyError::InvalidPosition(pos.clone()));
        }
        Ok(parent)
    }

    pub(crate) fn parent_of_mut(&mut self, pos: &Position) -> Result<&mut Element, ApplyError> {
        let parent = self.element_at_mut(&pos.root, pos.parent_path())?;
        if pos.offset() > parent.child_count() {
            return Err(ApplyError::InvalidPosition(pos.clone()));
        }
        Ok(parent)
    }

    /// The node right after a position.
    pub fn node_after(&self, pos: &Position) -> Option<&Node> {
        self.parent_of(pos).ok()?.children.get(pos.offset())
    }

    /// The element right after a position.
    pub(crate) fn element_after(&self, pos: &Position) -> Result<&Element, ApplyError> {
        self.element_at(&pos.root, &pos.path)
    }

    pub(crate) fn check_flat_run(&self, pos: &Position, how_many: usize) -> Result<(), ApplyError> {
        let parent = self.parent_of(pos)?;
        if pos.offset() + how_many > parent.child_count() {
            return Err(ApplyError::InvalidRange(pos.clone()));
        }
        Ok(())
    }

    pub(crate) fn insert_nodes(&mut self, pos: &Position, nodes: Vec<Node>) -> Result<(), ApplyError> {
        let parent = self.parent_of_mut(pos)?;
        let offset = pos.offset();
        parent.children.splice(offset..offset, nodes);
        Ok(())
    }

    pub(crate) fn remove_nodes(&mut self, pos: &Position, how_many: usize) -> Result<Vec<Node>, ApplyError> {
        self.check_flat_run(pos, how_many)?;
        let parent = self.parent_of_mut(pos)?;
        let offset = pos.offset();
        Ok(parent.children.drain(offset..offset + how_many).collect())
    }

    /// Move `how_many` nodes from `source` to `target`. `target` is expressed in the document as
    /// it is before the move.
    pub(crate) fn move_nodes(&mut self, source: &Position, how_many: usize, target: &Position) -> Result<(), ApplyError> {
        if Range::from_position_and_shift(source, how_many).contains_position(target) {
            return Err(ApplyError::MoveIntoItself);
        }
        let target = target.transformed_by_deletion(source, how_many)
            .ok_or(ApplyError::MoveIntoItself)?;
        // Validate the target before anything is taken out.
        self.check_flat_run(source, how_many)?;
        let nodes = self.remove_nodes(source, how_many)?;
        self.insert_nodes(&target, nodes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn move_nodes_within_parent() {
        let mut doc = Document::new();
        doc.create_root("main", Node::text("abcdef"));
        doc.move_nodes(&Position::new("main", &[1]), 2, &Position::new("main", &[5])).unwrap();
        let text: String = doc.root("main").unwrap().children.iter().map(|n| match n {
            Node::Char { ch, .. } => *ch,
            _ => '?',
        }).collect();
        assert_eq!(text, "adebcf");
    }

    #[test]
    fn cannot_move_into_itself() {
        let mut doc = Document::new();
        doc.create_root("main", vec![Node::element("p", Node::text("ab"))]);
        let err = doc.move_nodes(&Position::new("main", &[0]), 1, &Position::new("main", &[0, 1]));
        assert_eq!(err, Err(ApplyError::MoveIntoItself));
    }
}
