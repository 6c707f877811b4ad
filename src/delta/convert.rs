// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Converts a document tree into delta operations.
//!
//! The tree is walked top-down. Each element derives its own attribute set
//! from the one it inherited, adding whatever formatting the element stands
//! for, and passes that set on to its children. Text is emitted with the
//! attributes of every element above it, and block elements end with a
//! newline that carries their line formats.

use crate::delta::{Attributes, Delta, Embed, Format, Op};
use crate::markdown::tree::{Element, Tag, TreeNode};
use log::trace;
use thiserror::Error;

/// An error converting a document tree.
#[derive(Debug, Error)]
pub enum Error {
    /// An element lacks an attribute it cannot be converted without.
    #[error("<{tag}> element is missing its \"{attribute}\" attribute")]
    MissingAttribute {
        tag: String,
        attribute: &'static str,
    },
}

/// The kind of list an item belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListKind {
    #[default]
    Bullet,
    Ordered,
}

impl ListKind {
    fn as_str(&self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Ordered => "ordered",
        }
    }
}

/// Converts top-level tree nodes, appending the resulting ops to `delta`.
pub fn convert(nodes: &[TreeNode], delta: &mut Delta) -> Result<(), Error> {
    convert_nodes(nodes, &Attributes::new(), None, delta)
}

/// Converts sibling nodes that all inherit `inherited`.
///
/// `parent_list` is set only when the siblings are the items of a list.
fn convert_nodes(
    nodes: &[TreeNode],
    inherited: &Attributes,
    parent_list: Option<ListKind>,
    delta: &mut Delta,
) -> Result<(), Error> {
    for node in nodes {
        match node {
            TreeNode::Text(text) => {
                if !text.is_empty() {
                    delta.push(Op::text(text.as_str(), inherited));
                }
            }
            TreeNode::Element(element) => {
                convert_element(element, inherited, parent_list, delta)?;
            }
        }
    }
    Ok(())
}

fn convert_element(
    element: &Element,
    inherited: &Attributes,
    parent_list: Option<ListKind>,
    delta: &mut Delta,
) -> Result<(), Error> {
    let mut children = element.children();
    let mut child_list = None;

    let attributes = match element.tag() {
        Tag::Image => {
            let src = required(element, "src")?;
            delta.push(Op::embed(Embed::Image(src.to_string())));
            return Ok(());
        }
        Tag::Break => {
            delta.push(Op::text("\n", inherited));
            return Ok(());
        }
        Tag::Heading(level) => inherited.with(Format::Header, *level),
        Tag::Blockquote => inherited.with(Format::Blockquote, true),
        Tag::Code if element.has_language() => inherited.with(Format::CodeBlock, true),
        Tag::Code => inherited.with(Format::Code, true),
        Tag::Pre => inherited.with(Format::CodeBlock, true),
        Tag::UnorderedList => {
            child_list = Some(ListKind::Bullet);
            inherited.clone()
        }
        Tag::OrderedList => {
            child_list = Some(ListKind::Ordered);
            inherited.clone()
        }
        Tag::ListItem => {
            let (attributes, rest) = list_item(children, inherited, parent_list);
            children = rest;
            attributes
        }
        Tag::Strong => inherited.with(Format::Bold, true),
        Tag::Emphasis => inherited.with(Format::Italic, true),
        Tag::Underline => inherited.with(Format::Underline, true),
        Tag::Mark => inherited.with(Format::Highlight, true),
        Tag::Strike => inherited.with(Format::Strike, true),
        Tag::Link => inherited.with(Format::Link, required(element, "href")?),
        Tag::Paragraph
        | Tag::Input
        | Tag::Table
        | Tag::TableRow
        | Tag::TableCell
        | Tag::TableHeader
        | Tag::ThematicBreak
        | Tag::Other(_) => inherited.clone(),
    };

    convert_nodes(children, &attributes, child_list, delta)?;

    if *element.tag() == Tag::Paragraph || element.tag().is_block() {
        delta.push(Op::text("\n", &attributes));
    }

    Ok(())
}

/// Works out the attributes of a list item and the children to convert.
///
/// An item that starts with a checkbox is a task item; the checkbox itself
/// is not converted. Whether or not an item is checked is decided by the
/// item alone, never by an enclosing item.
fn list_item<'t>(
    children: &'t [TreeNode],
    inherited: &Attributes,
    parent_list: Option<ListKind>,
) -> (Attributes, &'t [TreeNode]) {
    match children.split_first() {
        Some((TreeNode::Element(first), rest)) if first.is_checkbox() => {
            trace!("task item, checked: {}", first.is_checked());
            let attributes = inherited.with(Format::List, "checked");
            let attributes = if first.is_checked() {
                attributes.with(Format::Checked, true)
            } else {
                attributes.without(Format::Checked)
            };
            (attributes, rest)
        }
        _ => {
            let kind = parent_list.unwrap_or_default();
            let attributes = inherited
                .with(Format::List, kind.as_str())
                .without(Format::Checked);
            (attributes, children)
        }
    }
}

fn required<'e>(element: &'e Element, attribute: &'static str) -> Result<&'e str, Error> {
    element
        .attribute(attribute)
        .ok_or_else(|| Error::MissingAttribute {
            tag: element.tag().to_string(),
            attribute,
        })
}
