// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Quill-style rich-text deltas.
//!
//! A [`Delta`] is a flat list of insert operations. Each [`Op`] inserts
//! either a run of text or a single embed, such as an image, and may carry
//! formatting [`Attributes`]. Serialized, a delta looks like this:
//!
//! ```json
//! {"ops": [{"insert": "Bold", "attributes": {"bold": true}}, {"insert": " text\n"}]}
//! ```
//!
//! # See also
//!
//! - [Quill's Delta format](https://quilljs.com/docs/delta/).

pub mod convert;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A formatting attribute understood by the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Header,
    Blockquote,
    CodeBlock,
    Code,
    List,
    Checked,
    Bold,
    Italic,
    Underline,
    Highlight,
    Strike,
    Link,
}

impl Format {
    /// The attribute's key in a serialized delta.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Header => "header",
            Format::Blockquote => "blockquote",
            Format::CodeBlock => "code-block",
            Format::Code => "code",
            Format::List => "list",
            Format::Checked => "checked",
            Format::Bold => "bold",
            Format::Italic => "italic",
            Format::Underline => "underline",
            Format::Highlight => "highlight",
            Format::Strike => "strike",
            Format::Link => "link",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The value of a formatting attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<u8> for AttributeValue {
    fn from(value: u8) -> Self {
        AttributeValue::Int(value.into())
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

/// A set of formatting attributes.
///
/// Attributes are never modified in place. [`Attributes::with()`] and
/// [`Attributes::without()`] return a new set, leaving the original alone,
/// so a set handed to one subtree can never be changed by another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    /// An empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this set with `format` set to `value`, replacing
    /// any existing value.
    pub fn with(&self, format: Format, value: impl Into<AttributeValue>) -> Self {
        let mut attributes = self.clone();
        attributes.0.insert(format.to_string(), value.into());
        attributes
    }

    /// Returns a copy of this set without `format`.
    pub fn without(&self, format: Format) -> Self {
        let mut attributes = self.clone();
        attributes.0.remove(format.as_str());
        attributes
    }

    /// The value of `format`, if it is set.
    pub fn get(&self, format: Format) -> Option<&AttributeValue> {
        self.0.get(format.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of attributes that are set.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// An embedded object. Each embed serializes as a single-key object, such
/// as `{"image": "https://example.com/cat.png"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Embed {
    Image(String),
    Video(String),
    Audio(String),
}

impl Embed {
    /// The media reference carried by the embed.
    pub fn source(&self) -> &str {
        match self {
            Embed::Image(src) | Embed::Video(src) | Embed::Audio(src) => src,
        }
    }

    fn with_source(&self, source: String) -> Self {
        match self {
            Embed::Image(_) => Embed::Image(source),
            Embed::Video(_) => Embed::Video(source),
            Embed::Audio(_) => Embed::Audio(source),
        }
    }
}

/// What an [`Op`] inserts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    Text(String),
    Embed(Embed),
}

/// A single insert operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    pub insert: Insert,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl Op {
    /// Inserts `text` with the given attributes. Empty attribute sets are
    /// left off entirely.
    pub fn text(text: impl Into<String>, attributes: &Attributes) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes: (!attributes.is_empty()).then(|| attributes.clone()),
        }
    }

    /// Inserts a bare newline.
    pub fn newline() -> Self {
        Self::text("\n", &Attributes::new())
    }

    /// Inserts an embed, without attributes.
    pub fn embed(embed: Embed) -> Self {
        Self {
            insert: Insert::Embed(embed),
            attributes: None,
        }
    }

    /// The inserted text, if this is a text insert.
    pub fn as_text(&self) -> Option<&str> {
        match &self.insert {
            Insert::Text(text) => Some(text),
            Insert::Embed(_) => None,
        }
    }

    /// True for a lone newline carrying line formats, such as the newline
    /// that ends a header or a list item.
    fn is_line_format(&self) -> bool {
        self.attributes.is_some() && self.as_text() == Some("\n")
    }
}

/// A rich-text document: an ordered list of insert operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    ops: Vec<Op>,
}

impl Delta {
    /// An empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// A delta holding nothing but a single newline, which is the smallest
    /// valid editor document.
    pub fn newline() -> Self {
        Self::from(vec![Op::newline()])
    }

    /// Wraps plain text in a delta.
    ///
    /// Empty text yields an empty delta.
    pub fn wrap_plain_text(text: &str) -> Self {
        if text.is_empty() {
            Self::new()
        } else {
            Self::from(vec![Op::text(text, &Attributes::new())])
        }
    }

    /// Appends `op`, merging it into the previous op when both insert text
    /// with the same attributes.
    ///
    /// Newlines carrying line formats are never merged with their
    /// neighbors, so every formatted line keeps its own newline op.
    pub fn push(&mut self, op: Op) {
        if let Some(last) = self.ops.last_mut() {
            if !last.is_line_format() && !op.is_line_format() && last.attributes == op.attributes {
                if let (Insert::Text(prev), Insert::Text(next)) = (&mut last.insert, &op.insert) {
                    prev.push_str(next);
                    return;
                }
            }
        }
        self.ops.push(op);
    }

    /// Appends `op` as its own operation, without merging.
    pub fn append(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True if the last op inserts text ending in a newline.
    pub fn ends_with_newline(&self) -> bool {
        self.ops
            .last()
            .and_then(Op::as_text)
            .is_some_and(|text| text.ends_with('\n'))
    }

    /// Appends a bare newline op unless the delta already ends in one.
    ///
    /// Editors require every document to end with a newline.
    pub fn ensure_trailing_newline(&mut self) {
        if !self.ends_with_newline() {
            self.append(Op::newline());
        }
    }

    /// Concatenates every text insert, skipping embeds.
    pub fn plain_text(&self) -> String {
        self.ops.iter().filter_map(Op::as_text).collect()
    }

    /// Returns a copy of the delta in which embeds whose source appears in
    /// `id_map` point at the mapped source instead.
    pub fn replace_media_ids(&self, id_map: &HashMap<String, String>) -> Self {
        let ops = self
            .ops
            .iter()
            .map(|op| match &op.insert {
                Insert::Embed(embed) => match id_map.get(embed.source()) {
                    Some(id) => Op {
                        insert: Insert::Embed(embed.with_source(id.clone())),
                        attributes: op.attributes.clone(),
                    },
                    None => op.clone(),
                },
                Insert::Text(_) => op.clone(),
            })
            .collect::<Vec<_>>();
        Self::from(ops)
    }

    /// Serializes the delta to JSON.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl From<Vec<Op>> for Delta {
    fn from(ops: Vec<Op>) -> Self {
        Self { ops }
    }
}
