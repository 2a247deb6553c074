//! The document tree operations are applied to.
//!
//! This is deliberately simple. Text is stored one character per node (each with its own
//! attributes), so every offset in a [`Position`](crate::Position) path is a child index.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use smartstring::alias::String as SmartString;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod document;

pub use document::Document;

/// Name of the root which holds removed content.
pub const GRAVEYARD: &str = "$graveyard";

#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(SmartString),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self { AttrValue::Bool(v) }
}
impl From<i64> for AttrValue {
    fn from(v: i64) -> Self { AttrValue::Int(v) }
}
impl From<&str> for AttrValue {
    fn from(v: &str) -> Self { AttrValue::Str(v.into()) }
}

pub type Attributes = BTreeMap<SmartString, AttrValue>;

#[derive(Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Element {
    pub name: SmartString,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: Attributes,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

#[derive(Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    Char { ch: char, attrs: Attributes },
    Element(Element),
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element { name: name.into(), attrs: Attributes::new(), children: Vec::new() }
    }

    pub fn with_children(name: &str, children: Vec<Node>) -> Self {
        Element { name: name.into(), attrs: Attributes::new(), children }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Name and attributes only. This is what a split puts on the new half.
    pub fn shallow_clone(&self) -> Self {
        Element { name: self.name.clone(), attrs: self.attrs.clone(), children: Vec::new() }
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl Node {
    pub fn element(name: &str, children: Vec<Node>) -> Self {
        Node::Element(Element::with_children(name, children))
    }

    /// One node per character.
    pub fn text(s: &str) -> Vec<Node> {
        Self::text_with_attrs(s, &Attributes::new())
    }

    pub fn text_with_attrs(s: &str, attrs: &Attributes) -> Vec<Node> {
        s.chars().map(|ch| Node::Char { ch, attrs: attrs.clone() }).collect()
    }

    pub fn attrs(&self) -> &Attributes {
        match self {
            Node::Char { attrs, .. } => attrs,
            Node::Element(e) => &e.attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        match self {
            Node::Char { attrs, .. } => attrs,
            Node::Element(e) => &mut e.attrs,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attrs().get(key)
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Char { .. } => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Char { .. } => None,
        }
    }
}

// Compact debug output - test failures print whole trees.
impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Char { ch, attrs } if attrs.is_empty() => write!(f, "{:?}", ch),
            Node::Char { ch, attrs } => write!(f, "{:?}{:?}", ch, attrs),
            Node::Element(e) => e.fmt(f),
        }
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}", self.name)?;
        for (k, v) in &self.attrs {
            write!(f, " {}={:?}", k, v)?;
        }
        f.write_str(">")?;
        f.debug_list().entries(self.children.iter()).finish()
    }
}
