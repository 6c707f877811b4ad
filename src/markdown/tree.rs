// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! A small, HTML-shaped document tree.
//!
//! The [mdast](markdown::mdast) produced by the `markdown` crate is rich, but
//! it is more than the delta converter needs. The builder collapses it into
//! this tree: every node is either an [`Element`] with a [`Tag`], a few
//! string attributes and its children, or a run of [`TreeNode::Text`].

use std::collections::BTreeMap;
use std::fmt;

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode {
    /// An element, such as a paragraph or a link.
    Element(Element),

    /// Literal text.
    Text(String),
}

impl TreeNode {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        TreeNode::Text(value.into())
    }

    /// Creates an element node with no attributes.
    pub fn element(tag: Tag, children: Vec<TreeNode>) -> Self {
        TreeNode::Element(Element::new(tag).with_children(children))
    }
}

impl From<Element> for TreeNode {
    fn from(element: Element) -> Self {
        TreeNode::Element(element)
    }
}

/// An element in the document tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    tag: Tag,
    attributes: BTreeMap<String, String>,
    children: Option<Vec<TreeNode>>,
}

impl Element {
    /// Creates an element with no attributes and no children.
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            children: None,
        }
    }

    /// Sets an attribute, returning the updated element.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the element's children, returning the updated element.
    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Returns the value of the attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The element's children.
    ///
    /// An element whose children were never set has no children.
    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// True if the element is a checkbox, such as the marker at the start
    /// of a task list item.
    pub fn is_checkbox(&self) -> bool {
        self.tag == Tag::Input && self.attribute("type") == Some("checkbox")
    }

    /// True if the element is a checkbox that is ticked.
    pub fn is_checked(&self) -> bool {
        self.is_checkbox() && self.attribute("checked").is_some_and(|v| v != "false")
    }

    /// True if the element's class names a code language, as in
    /// `class="language-rust"`.
    pub fn has_language(&self) -> bool {
        self.attribute("class").is_some_and(|class| {
            class
                .split_whitespace()
                .any(|c| c.starts_with("language-") || c.starts_with("lang-"))
        })
    }
}

/// The kind of an [`Element`].
///
/// Every tag the delta converter knows about has its own variant; anything
/// else is carried as [`Tag::Other`] and treated as a transparent container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    /// `h1` through `h6`.
    Heading(u8),
    Blockquote,
    Code,
    Pre,
    UnorderedList,
    OrderedList,
    ListItem,
    Input,
    Strong,
    Emphasis,
    Underline,
    Mark,
    Strike,
    Link,
    Image,
    Break,
    Paragraph,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    ThematicBreak,
    Other(String),
}

/// Tag names and their aliases.
const TAG_TABLE: &[(&str, Tag)] = &[
    ("h1", Tag::Heading(1)),
    ("h2", Tag::Heading(2)),
    ("h3", Tag::Heading(3)),
    ("h4", Tag::Heading(4)),
    ("h5", Tag::Heading(5)),
    ("h6", Tag::Heading(6)),
    ("blockquote", Tag::Blockquote),
    ("code", Tag::Code),
    ("pre", Tag::Pre),
    ("ul", Tag::UnorderedList),
    ("ol", Tag::OrderedList),
    ("li", Tag::ListItem),
    ("input", Tag::Input),
    ("strong", Tag::Strong),
    ("b", Tag::Strong),
    ("em", Tag::Emphasis),
    ("i", Tag::Emphasis),
    ("u", Tag::Underline),
    ("ins", Tag::Underline),
    ("mark", Tag::Mark),
    ("del", Tag::Strike),
    ("s", Tag::Strike),
    ("strike", Tag::Strike),
    ("a", Tag::Link),
    ("img", Tag::Image),
    ("br", Tag::Break),
    ("p", Tag::Paragraph),
    ("table", Tag::Table),
    ("tr", Tag::TableRow),
    ("td", Tag::TableCell),
    ("th", Tag::TableHeader),
    ("hr", Tag::ThematicBreak),
];

impl Tag {
    /// Looks up a tag by name. Names are case-insensitive, and aliases such
    /// as `b` for `strong` resolve to the same tag.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        TAG_TABLE
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, tag)| tag.clone())
            .unwrap_or(Tag::Other(lower))
    }

    /// The canonical name of the tag.
    pub fn name(&self) -> &str {
        match self {
            Tag::Other(name) => name,
            tag => TAG_TABLE
                .iter()
                .find(|(_, t)| t == tag)
                .map(|(n, _)| *n)
                .unwrap_or("?"),
        }
    }

    /// True if the element always ends with its own newline.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Tag::Heading(_)
                | Tag::Blockquote
                | Tag::Pre
                | Tag::UnorderedList
                | Tag::OrderedList
                | Tag::ListItem
                | Tag::TableRow
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
