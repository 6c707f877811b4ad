// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Inline syntax that CommonMark and GFM do not know about.
//!
//! Two extensions are supported:
//!
//! - `==highlighted text==`, which becomes a `mark` element, and
//! - `<u>underlined text</u>`, which becomes a `u` element.
//!
//! The rules run over literal runs of text after the `markdown` crate has
//! parsed the document, so they never interfere with standard syntax.
//! Text the author escaped, with a backslash or a character reference, is
//! never read as one of them.

use crate::markdown::tree::{Tag, TreeNode};
use log::trace;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static HIGHLIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^==(.*?)==").expect("invalid highlight pattern"));

static UNDERLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<u>(.*?)</u>").expect("invalid underline pattern"));

/// A named, decimal, or hexadecimal character reference.
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("invalid entity pattern")
});

/// Stands in for each byte of escaped text when the rules look for markup.
const MASK: char = '\0';

/// A span of custom syntax recognized by an [`InlineRule`].
#[derive(Debug, PartialEq, Eq)]
pub struct Span {
    /// The element the span becomes.
    pub tag: Tag,

    /// Where the span's text sits, relative to the start of the match.
    pub content: Range<usize>,

    /// The number of bytes the whole span covers, delimiters included.
    pub len: usize,
}

/// A rule that recognizes a span of custom inline syntax.
pub trait InlineRule {
    /// The character every match of this rule starts with.
    fn trigger(&self) -> char;

    /// Tries to match the rule at the very start of `source`, returning the
    /// span it covers, or `None` if the rule does not apply.
    fn apply(&self, source: &str) -> Option<Span>;
}

/// The span around the text captured by `re` at the start of `source`.
/// Empty captures do not count as a match.
fn capture(re: &Regex, tag: Tag, source: &str) -> Option<Span> {
    let captures = re.captures(source)?;
    let content = captures.get(1)?.range();
    if content.is_empty() {
        return None;
    }
    let len = captures.get(0)?.end();
    Some(Span { tag, content, len })
}

/// Highlighted text: `==like this==`.
#[derive(Debug, Default)]
pub struct Highlight;

impl InlineRule for Highlight {
    fn trigger(&self) -> char {
        '='
    }

    fn apply(&self, source: &str) -> Option<Span> {
        capture(&HIGHLIGHT_RE, Tag::Mark, source)
    }
}

/// Underlined text: `<u>like this</u>`.
#[derive(Debug, Default)]
pub struct Underline;

impl InlineRule for Underline {
    fn trigger(&self) -> char {
        '<'
    }

    fn apply(&self, source: &str) -> Option<Span> {
        capture(&UNDERLINE_RE, Tag::Underline, source)
    }
}

/// The rules applied to every literal run, in priority order.
pub fn default_rules() -> Vec<Box<dyn InlineRule>> {
    vec![Box::new(Highlight), Box::new(Underline)]
}

/// A run of literal text waiting to be scanned.
///
/// Alongside the text itself, the run keeps a masked copy in which every
/// character the author escaped, with a backslash or a character reference,
/// is blanked out byte for byte. Rules only ever see the masked copy, so
/// escaped characters can never act as delimiters, but the text they wrap is
/// taken from the real one.
#[derive(Debug, Default)]
pub struct Literal {
    text: String,
    masked: String,
}

impl Literal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text the rules may read as markup, such as raw inline HTML.
    pub fn push_markup(&mut self, text: &str) {
        self.text.push_str(text);
        self.masked.push_str(text);
    }

    /// Text that is never markup.
    pub fn push_escaped(&mut self, text: &str) {
        self.text.push_str(text);
        self.masked.extend(std::iter::repeat_n(MASK, text.len()));
    }

    /// Parsed text, given as both its parsed `value` and the `source` it
    /// was parsed from.
    ///
    /// Characters that came from a backslash escape or a character
    /// reference in `source` are pushed as escaped. Everything else,
    /// including anything that cannot be lined up with `source`, is pushed
    /// as markup.
    pub fn push_parsed(&mut self, value: &str, source: &str) {
        let mut rest = source;
        let mut in_reference = false;
        let mut buf = [0; 4];

        for (i, c) in value.char_indices() {
            let ch: &str = c.encode_utf8(&mut buf);
            loop {
                let mut next = rest.chars();
                if let (Some('\\'), Some(escaped)) = (next.next(), next.next()) {
                    if escaped == c && c.is_ascii_punctuation() {
                        self.push_escaped(ch);
                        rest = &rest[2..];
                        in_reference = false;
                        break;
                    }
                }

                if let Some(reference) = ENTITY_RE.find(rest) {
                    // A reference the parser left alone appears verbatim.
                    if !value[i..].starts_with(reference.as_str()) {
                        self.push_escaped(ch);
                        rest = &rest[reference.end()..];
                        in_reference = true;
                        break;
                    }
                }

                match rest.chars().next() {
                    Some(s) if s == c => {
                        self.push_markup(ch);
                        rest = &rest[s.len_utf8()..];
                        in_reference = false;
                        break;
                    }
                    // Some references expand to more than one character.
                    _ if in_reference => {
                        self.push_escaped(ch);
                        break;
                    }
                    // Whitespace the parser dropped, as around line endings.
                    Some(s) if s.is_whitespace() => rest = &rest[s.len_utf8()..],
                    _ => {
                        self.push_markup(ch);
                        break;
                    }
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<&str> for Literal {
    fn from(markup: &str) -> Self {
        let mut literal = Literal::new();
        literal.push_markup(markup);
        literal
    }
}

/// Splits `literal` into text and the elements recognized by `rules`.
///
/// Scanning moves left to right. At each character that triggers a rule,
/// the rules are tried in order and the first match wins; otherwise the
/// character is kept as literal text.
pub fn scan(literal: &Literal, rules: &[Box<dyn InlineRule>]) -> Vec<TreeNode> {
    let Literal { text, masked } = literal;
    let mut nodes = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while let Some(c) = masked[pos..].chars().next() {
        let matched = rules
            .iter()
            .filter(|rule| rule.trigger() == c)
            .find_map(|rule| rule.apply(&masked[pos..]));

        match matched {
            Some(Span { tag, content, len }) => {
                trace!("inline rule matched at byte {pos}: {tag}");
                if start < pos {
                    nodes.push(TreeNode::text(&text[start..pos]));
                }
                let content = &text[pos + content.start..pos + content.end];
                nodes.push(TreeNode::element(tag, vec![TreeNode::text(content)]));
                pos += len;
                start = pos;
            }
            None => pos += c.len_utf8(),
        }
    }

    if start < text.len() {
        nodes.push(TreeNode::text(&text[start..]));
    }

    nodes
}
