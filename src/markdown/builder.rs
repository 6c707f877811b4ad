// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Builds the document tree from an mdast.
//!
//! Each container node gets its own sub-builder, which collects the
//! container's children before the container itself is pushed onto its
//! parent. Adjacent text and unrecognized inline HTML are gathered into a
//! literal run and handed to the inline rules only when the run ends, so that
//! custom syntax split across the two is still recognized.
//!
//! Paired inline HTML tags that stand for formatting, such as `<b>` and
//! `</b>`, become elements of their own. A tag left open when its container
//! ends is kept as text.

use crate::markdown::inline::{self, InlineRule, Literal};
use crate::markdown::tree::{Element, Tag, TreeNode};
use crate::markdown::{TextAppendable, Visitable, Visitor};
use log::trace;
use markdown::mdast::{
    Code, Definition, FootnoteReference, Heading, Html, Image, ImageReference, InlineCode, Link,
    LinkReference, List, ListItem, Node, Text,
};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z][A-Za-z0-9]*)(?:\s[^<>]*?)?\s*(/)?>$")
        .expect("invalid open tag pattern")
});

static CLOSE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^</([A-Za-z][A-Za-z0-9]*)\s*>$").expect("invalid close tag pattern")
});

/// Link reference definitions, by normalized identifier.
pub type Definitions = HashMap<String, String>;

fn normalize_identifier(identifier: &str) -> String {
    identifier.to_lowercase()
}

/// Collects every link reference definition beneath `root`.
///
/// When an identifier is defined more than once, the first definition wins.
pub fn definitions(root: &Node) -> Definitions {
    let mut definitions = Definitions::new();
    collect_definitions(root, &mut definitions);
    definitions
}

fn collect_definitions(node: &Node, definitions: &mut Definitions) {
    if let Node::Definition(Definition {
        identifier, url, ..
    }) = node
    {
        definitions
            .entry(normalize_identifier(identifier))
            .or_insert_with(|| url.clone());
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, definitions);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Context {
    /// Block HTML may appear here.
    flow: bool,

    /// Paragraphs are unwrapped, as they are in tight lists.
    tight: bool,
}

impl Context {
    const FLOW: Context = Context {
        flow: true,
        tight: false,
    };

    const PHRASING: Context = Context {
        flow: false,
        tight: false,
    };
}

/// True for tags that inline HTML may open and close around text.
fn is_inline_format(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Strong | Tag::Emphasis | Tag::Underline | Tag::Mark | Tag::Strike | Tag::Code
    )
}

/// An inline HTML tag waiting for its closing tag.
#[derive(Debug)]
struct OpenTag {
    tag: Tag,
    raw: String,
    nodes: Vec<TreeNode>,
}

/// Pushes `node`, joining it onto a preceding text node when both are text.
fn append_node(nodes: &mut Vec<TreeNode>, node: TreeNode) {
    match (nodes.last_mut(), node) {
        (Some(TreeNode::Text(last)), TreeNode::Text(text)) => last.push_str(&text),
        (_, node) => nodes.push(node),
    }
}

/// Visits an mdast, producing [`TreeNode`]s.
pub struct TreeBuilder<'a> {
    nodes: Vec<TreeNode>,
    open: Vec<OpenTag>,
    literal: Literal,
    context: Context,
    source: &'a str,
    definitions: &'a Definitions,
    rules: &'a [Box<dyn InlineRule>],
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder for a whole document parsed from `source`.
    ///
    /// Link and image references are resolved against `definitions`, and
    /// literal text is run through `rules`.
    pub fn new(
        source: &'a str,
        definitions: &'a Definitions,
        rules: &'a [Box<dyn InlineRule>],
    ) -> Self {
        Self {
            nodes: Vec::new(),
            open: Vec::new(),
            literal: Literal::new(),
            context: Context::FLOW,
            source,
            definitions,
            rules,
        }
    }

    /// Builds the children of `node` in `context`.
    fn build_children(&self, node: &Node, context: Context) -> Vec<TreeNode> {
        let mut subbuilder = TreeBuilder {
            context,
            ..TreeBuilder::new(self.source, self.definitions, self.rules)
        };
        node.accept_children(&mut subbuilder);
        subbuilder.finish()
    }

    /// Where new nodes go: inside the innermost open inline tag, if any.
    fn target(&mut self) -> &mut Vec<TreeNode> {
        match self.open.last_mut() {
            Some(open) => &mut open.nodes,
            None => &mut self.nodes,
        }
    }

    fn push(&mut self, node: impl Into<TreeNode>) {
        self.flush();
        self.target().push(node.into());
    }

    fn push_element(&mut self, element: Element, node: &Node, context: Context) {
        let children = self.build_children(node, context);
        self.push(element.with_children(children));
    }

    /// Ends the current literal run, running the inline rules over it.
    fn flush(&mut self) {
        if !self.literal.is_empty() {
            let literal = std::mem::take(&mut self.literal);
            let nodes = inline::scan(&literal, self.rules);
            self.target().extend(nodes);
        }
    }

    /// Closes every inline tag opened beyond `depth`, keeping each one's
    /// raw tag as text ahead of its contents.
    fn unwind(&mut self, depth: usize) {
        self.flush();
        while self.open.len() > depth {
            let Some(open) = self.open.pop() else { break };
            trace!("unclosed inline html kept as text: {:?}", open.raw);
            let target = self.target();
            append_node(target, TreeNode::Text(open.raw));
            for node in open.nodes {
                append_node(target, node);
            }
        }
    }

    fn resolve(&self, identifier: &str) -> Option<&str> {
        self.definitions
            .get(&normalize_identifier(identifier))
            .map(String::as_str)
    }

    fn visit_paragraph(&mut self, node: &Node) {
        if self.context.tight {
            trace!("unwrapping paragraph in tight list item");
            let context = self.context;
            let depth = self.open.len();
            self.flush();
            self.context = Context {
                flow: false,
                ..context
            };
            node.accept_children(self);
            self.unwind(depth);
            self.context = context;
        } else {
            self.push_element(Element::new(Tag::Paragraph), node, Context::PHRASING);
        }
    }

    fn visit_text(&mut self, text: &Text) {
        let source = self.source;
        let source = text
            .position
            .as_ref()
            .and_then(|position| source.get(position.start.offset..position.end.offset));
        match source {
            Some(source) => self.literal.push_parsed(&text.value, source),
            None => self.push_text(&text.value),
        }
    }

    fn visit_html(&mut self, html: &str) {
        if self.context.flow {
            trace!("block html kept as a literal paragraph: {html:?}");
            let children = inline::scan(&Literal::from(html.trim_end()), self.rules);
            self.push(Element::new(Tag::Paragraph).with_children(children));
        } else {
            self.visit_inline_html(html);
        }
    }

    fn visit_inline_html(&mut self, html: &str) {
        if let Some(captures) = CLOSE_TAG_RE.captures(html) {
            let tag = Tag::from_name(&captures[1]);
            if self.open.last().is_some_and(|open| open.tag == tag) {
                self.flush();
                if let Some(open) = self.open.pop() {
                    self.push(TreeNode::element(open.tag, open.nodes));
                }
                return;
            }
        } else if let Some(captures) = OPEN_TAG_RE.captures(html) {
            let tag = Tag::from_name(&captures[1]);
            let self_closing = captures.get(2).is_some();
            if tag == Tag::Break {
                self.push(Element::new(Tag::Break));
                return;
            }
            if is_inline_format(&tag) && !self_closing {
                self.flush();
                self.open.push(OpenTag {
                    tag,
                    raw: html.to_string(),
                    nodes: Vec::new(),
                });
                return;
            }
        }
        trace!("inline html kept as text: {html:?}");
        self.push_text(html);
    }

    fn visit_heading(&mut self, depth: u8, node: &Node) {
        let level = depth.clamp(1, 6);
        self.push_element(Element::new(Tag::Heading(level)), node, Context::PHRASING);
    }

    fn visit_list(&mut self, list: &List, node: &Node) {
        let tag = if list.ordered {
            Tag::OrderedList
        } else {
            Tag::UnorderedList
        };
        let context = Context {
            flow: true,
            tight: !list.spread,
        };
        self.push_element(Element::new(tag), node, context);
    }

    fn visit_list_item(&mut self, item: &ListItem, node: &Node) {
        let context = Context {
            flow: true,
            tight: self.context.tight && !item.spread,
        };
        let mut children = Vec::new();
        if let Some(checked) = item.checked {
            let checkbox = Element::new(Tag::Input).with_attribute("type", "checkbox");
            let checkbox = if checked {
                checkbox.with_attribute("checked", "checked")
            } else {
                checkbox
            };
            children.push(checkbox.into());
        }
        children.extend(self.build_children(node, context));
        self.push(Element::new(Tag::ListItem).with_children(children));
    }

    fn visit_link(&mut self, url: &str, node: &Node) {
        let link = Element::new(Tag::Link).with_attribute("href", url);
        self.push_element(link, node, Context::PHRASING);
    }

    fn visit_link_reference(&mut self, identifier: &str, node: &Node) {
        match self.resolve(identifier).map(String::from) {
            Some(url) => self.visit_link(&url, node),
            None => self.swallow(node),
        }
    }

    fn visit_image(&mut self, url: &str, alt: &str) {
        let image = Element::new(Tag::Image)
            .with_attribute("src", url)
            .with_attribute("alt", alt);
        self.push(image);
    }

    fn visit_image_reference(&mut self, identifier: &str, alt: &str) {
        match self.resolve(identifier).map(String::from) {
            Some(url) => self.visit_image(&url, alt),
            None => self.literal.push_escaped(alt),
        }
    }

    fn visit_inline_code(&mut self, code: &str) {
        self.push(TreeNode::element(Tag::Code, vec![TreeNode::text(code)]));
    }

    fn visit_code(&mut self, code: &str, lang: Option<&str>) {
        trace!("got code:\n{code}");
        let content = TreeNode::text(code);
        let children = match lang {
            Some(lang) => {
                let code = Element::new(Tag::Code)
                    .with_attribute("class", format!("language-{lang}"))
                    .with_children(vec![content]);
                vec![code.into()]
            }
            None => vec![content],
        };
        self.push(TreeNode::element(Tag::Pre, children));
    }

    fn visit_table(&mut self, node: &Node) {
        let rows = node
            .children()
            .map(|rows| {
                rows.iter()
                    .enumerate()
                    .map(|(i, row)| self.build_row(row, i == 0))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        self.push(Element::new(Tag::Table).with_children(rows));
    }

    /// Builds a table row. The cells of the first row are headers.
    fn build_row(&self, row: &Node, header: bool) -> TreeNode {
        let tag = if header {
            Tag::TableHeader
        } else {
            Tag::TableCell
        };
        let cells = row
            .children()
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| {
                        let children = self.build_children(cell, Context::PHRASING);
                        TreeNode::element(tag.clone(), children)
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        TreeNode::element(Tag::TableRow, cells)
    }

    fn visit_footnote_reference(&mut self, label: &str) {
        let marker = TreeNode::text(format!("[^{label}]"));
        self.push(TreeNode::element(
            Tag::Other(String::from("sup")),
            vec![marker],
        ));
    }
}

impl Visitor for TreeBuilder<'_> {
    type Output = Vec<TreeNode>;

    fn finish(mut self) -> Self::Output {
        self.unwind(0);
        self.nodes
    }

    fn visit(&mut self, node: &Node) {
        match node {
            Node::Root(_) => self.swallow(node),
            Node::Paragraph(_) => self.visit_paragraph(node),
            Node::Text(text) => self.visit_text(text),
            Node::Html(Html { value, .. }) => self.visit_html(value),
            Node::Heading(Heading { depth, .. }) => self.visit_heading(*depth, node),
            Node::Blockquote(_) => {
                self.push_element(Element::new(Tag::Blockquote), node, Context::FLOW)
            }
            Node::List(list) => self.visit_list(list, node),
            Node::ListItem(item) => self.visit_list_item(item, node),
            Node::Emphasis(_) => {
                self.push_element(Element::new(Tag::Emphasis), node, Context::PHRASING)
            }
            Node::Strong(_) => self.push_element(Element::new(Tag::Strong), node, Context::PHRASING),
            Node::Delete(_) => self.push_element(Element::new(Tag::Strike), node, Context::PHRASING),
            Node::Link(Link { url, .. }) => self.visit_link(url, node),
            Node::LinkReference(LinkReference { identifier, .. }) => {
                self.visit_link_reference(identifier, node)
            }
            Node::Image(Image { url, alt, .. }) => self.visit_image(url, alt),
            Node::ImageReference(ImageReference {
                identifier, alt, ..
            }) => self.visit_image_reference(identifier, alt),
            Node::InlineCode(InlineCode { value, .. }) => self.visit_inline_code(value),
            Node::Code(Code { value, lang, .. }) => self.visit_code(value, lang.as_deref()),
            Node::Break(_) => self.push(Element::new(Tag::Break)),
            Node::ThematicBreak(_) => self.push(Element::new(Tag::ThematicBreak)),
            Node::Table(_) => self.visit_table(node),
            Node::Definition(_) => trace!("dropping definition: {node:?}"),
            Node::FootnoteReference(FootnoteReference {
                identifier, label, ..
            }) => self.visit_footnote_reference(label.as_deref().unwrap_or(identifier)),
            Node::FootnoteDefinition(_) => self.swallow(node),
            _ => self.unknown(node),
        }
    }
}

impl TextAppendable for TreeBuilder<'_> {
    fn push_text(&mut self, text: &str) {
        trace!("appending text to literal run {:?}: {text:?}", self.literal.as_str());
        self.literal.push_markup(text);
    }
}

#[cfg(test)]
mod tests {
    use crate::markdown::parse;
    use crate::markdown::tree::{Element, Tag, TreeNode};
    use crate::test_utils::do_logging;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> TreeNode {
        TreeNode::text(value)
    }

    fn el(tag: Tag, children: Vec<TreeNode>) -> TreeNode {
        TreeNode::element(tag, children)
    }

    fn parse_ok(markup: &str) -> Vec<TreeNode> {
        parse(markup).expect("markdown should parse")
    }

    #[test]
    fn it_wraps_text_in_paragraphs() {
        assert_eq!(
            parse_ok("Lorem ipsum"),
            vec![el(Tag::Paragraph, vec![text("Lorem ipsum")])]
        );
    }

    #[test]
    fn it_builds_nested_emphasis() {
        assert_eq!(
            parse_ok("**_both_**"),
            vec![el(
                Tag::Paragraph,
                vec![el(Tag::Strong, vec![el(Tag::Emphasis, vec![text("both")])])]
            )]
        );
    }

    #[test]
    fn it_builds_headings() {
        assert_eq!(
            parse_ok("### Title"),
            vec![el(Tag::Heading(3), vec![text("Title")])]
        );
    }

    #[test]
    fn it_builds_links() {
        let link = Element::new(Tag::Link)
            .with_attribute("href", "https://example.com")
            .with_children(vec![text("site")]);
        assert_eq!(
            parse_ok("[site](https://example.com)"),
            vec![el(Tag::Paragraph, vec![link.into()])]
        );
    }

    #[test]
    fn it_resolves_link_references() {
        let markup = indoc! {"
            [site][Example]

            [example]: https://example.com
        "};
        let link = Element::new(Tag::Link)
            .with_attribute("href", "https://example.com")
            .with_children(vec![text("site")]);
        assert_eq!(parse_ok(markup), vec![el(Tag::Paragraph, vec![link.into()])]);
    }

    #[test]
    fn it_builds_images_without_children() {
        let image = Element::new(Tag::Image)
            .with_attribute("src", "http://x/y.png")
            .with_attribute("alt", "alt");
        assert_eq!(
            parse_ok("![alt](http://x/y.png)"),
            vec![el(Tag::Paragraph, vec![image.into()])]
        );
    }

    #[test]
    fn it_builds_fenced_code_with_a_language_class() {
        let markup = indoc! {"
            ```rust
            fn main() {}
            ```
        "};
        let code = Element::new(Tag::Code)
            .with_attribute("class", "language-rust")
            .with_children(vec![text("fn main() {}")]);
        assert_eq!(parse_ok(markup), vec![el(Tag::Pre, vec![code.into()])]);
    }

    #[test]
    fn it_builds_plain_code_blocks_without_a_code_element() {
        let markup = "    let x = 1;";
        assert_eq!(
            parse_ok(markup),
            vec![el(Tag::Pre, vec![text("let x = 1;")])]
        );
    }

    #[test]
    fn it_unwraps_paragraphs_in_tight_lists() {
        let markup = indoc! {"
            - one
            - two
        "};
        assert_eq!(
            parse_ok(markup),
            vec![el(
                Tag::UnorderedList,
                vec![
                    el(Tag::ListItem, vec![text("one")]),
                    el(Tag::ListItem, vec![text("two")]),
                ]
            )]
        );
    }

    #[test]
    fn it_keeps_paragraphs_in_loose_lists() {
        let markup = indoc! {"
            1. one

            2. two
        "};
        assert_eq!(
            parse_ok(markup),
            vec![el(
                Tag::OrderedList,
                vec![
                    el(Tag::ListItem, vec![el(Tag::Paragraph, vec![text("one")])]),
                    el(Tag::ListItem, vec![el(Tag::Paragraph, vec![text("two")])]),
                ]
            )]
        );
    }

    #[test]
    fn it_prepends_checkboxes_to_task_items() {
        do_logging();
        let unchecked = Element::new(Tag::Input).with_attribute("type", "checkbox");
        let checked = unchecked.clone().with_attribute("checked", "checked");
        let markup = indoc! {"
            - [ ] todo
            - [x] done
        "};
        assert_eq!(
            parse_ok(markup),
            vec![el(
                Tag::UnorderedList,
                vec![
                    el(Tag::ListItem, vec![unchecked.into(), text("todo")]),
                    el(Tag::ListItem, vec![checked.into(), text("done")]),
                ]
            )]
        );
    }

    #[test]
    fn it_applies_inline_rules_to_text() {
        assert_eq!(
            parse_ok("a ==mark== b"),
            vec![el(
                Tag::Paragraph,
                vec![
                    text("a "),
                    el(Tag::Mark, vec![text("mark")]),
                    text(" b")
                ]
            )]
        );
    }

    #[test]
    fn it_builds_underlines_from_inline_html() {
        assert_eq!(
            parse_ok("an <u>underlined</u> word"),
            vec![el(
                Tag::Paragraph,
                vec![
                    text("an "),
                    el(Tag::Underline, vec![text("underlined")]),
                    text(" word")
                ]
            )]
        );
    }

    #[test]
    fn it_keeps_other_inline_html_as_text() {
        assert_eq!(
            parse_ok("this HTML has <span>inline text</span>"),
            vec![el(
                Tag::Paragraph,
                vec![text("this HTML has <span>inline text</span>")]
            )]
        );
    }

    #[test]
    fn it_does_not_apply_inline_rules_to_code() {
        assert_eq!(
            parse_ok("`==x==`"),
            vec![el(
                Tag::Paragraph,
                vec![el(Tag::Code, vec![text("==x==")])]
            )]
        );
    }

    #[test]
    fn it_builds_strikethrough() {
        assert_eq!(
            parse_ok("~~gone~~"),
            vec![el(
                Tag::Paragraph,
                vec![el(Tag::Strike, vec![text("gone")])]
            )]
        );
    }

    #[test]
    fn it_builds_blockquotes_around_paragraphs() {
        assert_eq!(
            parse_ok("> quoted"),
            vec![el(
                Tag::Blockquote,
                vec![el(Tag::Paragraph, vec![text("quoted")])]
            )]
        );
    }

    #[test]
    fn it_builds_hard_breaks() {
        assert_eq!(
            parse_ok("one  \ntwo"),
            vec![el(
                Tag::Paragraph,
                vec![text("one"), Element::new(Tag::Break).into(), text("two")]
            )]
        );
    }

    #[test]
    fn it_keeps_escaped_highlights_literal() {
        assert_eq!(
            parse_ok(r"a \==esc\== b"),
            vec![el(Tag::Paragraph, vec![text("a ==esc== b")])]
        );
    }

    #[test]
    fn it_keeps_underlines_from_character_references_literal() {
        assert_eq!(
            parse_ok("a &lt;u&gt;ent&lt;/u&gt; b"),
            vec![el(Tag::Paragraph, vec![text("a <u>ent</u> b")])]
        );
    }

    #[test]
    fn it_keeps_escaped_underlines_literal() {
        assert_eq!(
            parse_ok(r"a \<u>esc\</u> b"),
            vec![el(Tag::Paragraph, vec![text("a <u>esc</u> b")])]
        );
    }

    #[test]
    fn it_builds_formatting_from_inline_html_aliases() {
        assert_eq!(
            parse_ok("a <b>bold</b> <i>it</i> <s>st</s> <ins>ins</ins> b"),
            vec![el(
                Tag::Paragraph,
                vec![
                    text("a "),
                    el(Tag::Strong, vec![text("bold")]),
                    text(" "),
                    el(Tag::Emphasis, vec![text("it")]),
                    text(" "),
                    el(Tag::Strike, vec![text("st")]),
                    text(" "),
                    el(Tag::Underline, vec![text("ins")]),
                    text(" b"),
                ]
            )]
        );
    }

    #[test]
    fn it_nests_inline_html_around_markdown() {
        assert_eq!(
            parse_ok("<u>**both**</u>"),
            vec![el(
                Tag::Paragraph,
                vec![el(
                    Tag::Underline,
                    vec![el(Tag::Strong, vec![text("both")])]
                )]
            )]
        );
    }

    #[test]
    fn it_builds_breaks_from_inline_html() {
        let br = || TreeNode::from(Element::new(Tag::Break));
        assert_eq!(
            parse_ok("a<br>b<br />c"),
            vec![el(
                Tag::Paragraph,
                vec![text("a"), br(), text("b"), br(), text("c")]
            )]
        );
    }

    #[test]
    fn it_keeps_unclosed_inline_html_as_text() {
        assert_eq!(
            parse_ok("a <b>open"),
            vec![el(Tag::Paragraph, vec![text("a <b>open")])]
        );
    }

    #[test]
    fn it_keeps_mismatched_closing_html_as_text() {
        assert_eq!(
            parse_ok("a </i> b"),
            vec![el(Tag::Paragraph, vec![text("a </i> b")])]
        );
    }

    #[test]
    fn it_builds_inline_html_in_tight_lists() {
        assert_eq!(
            parse_ok("- a <b>x</b>"),
            vec![el(
                Tag::UnorderedList,
                vec![el(
                    Tag::ListItem,
                    vec![text("a "), el(Tag::Strong, vec![text("x")])]
                )]
            )]
        );
    }

    #[test]
    fn it_builds_table_headers_from_the_first_row() {
        let markup = indoc! {"
            | a | b |
            |---|---|
            | 1 | 2 |
        "};
        assert_eq!(
            parse_ok(markup),
            vec![el(
                Tag::Table,
                vec![
                    el(
                        Tag::TableRow,
                        vec![
                            el(Tag::TableHeader, vec![text("a")]),
                            el(Tag::TableHeader, vec![text("b")]),
                        ]
                    ),
                    el(
                        Tag::TableRow,
                        vec![
                            el(Tag::TableCell, vec![text("1")]),
                            el(Tag::TableCell, vec![text("2")]),
                        ]
                    ),
                ]
            )]
        );
    }
}
