// mdelta
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Markdown parsing.
//!
//! Markdown source is parsed by the [`markdown`] crate into an mdast, which
//! is then walked by a [`Visitor`] that builds the simpler
//! [document tree](tree) consumed by the delta converter. The
//! [inline rules](inline) for highlighted and underlined text are applied
//! while the tree is built.
//!
//! # See also
//!
//! - [CommonMark](https://commonmark.org/), for the CommonMark specification.
//! - [GitHub Flavored Markdown](https://github.github.com/gfm/), for the
//!   tables, strikethrough, task lists and autolinks that are also supported.

mod builder;
pub mod inline;
pub mod tree;

pub use tree::{Element, Tag, TreeNode};

use builder::TreeBuilder;
use log::{trace, warn};
use markdown::ParseOptions;
use markdown::mdast::Node;
use thiserror::Error;

/// An error parsing Markdown source.
#[derive(Debug, Error)]
pub enum Error {
    /// The Markdown parser rejected the source.
    #[error("could not parse markdown: {0}")]
    Parse(String),
}

/// Parses Markdown source into a sequence of top-level tree nodes.
///
/// GitHub Flavored Markdown is enabled, along with the
/// [default inline rules](inline::default_rules).
pub fn parse(markup: &str) -> Result<Vec<TreeNode>, Error> {
    let mdast =
        markdown::to_mdast(markup, &parse_options()).map_err(|e| Error::Parse(e.to_string()))?;
    let definitions = builder::definitions(&mdast);
    let rules = inline::default_rules();
    let mut builder = TreeBuilder::new(markup, &definitions, &rules);
    mdast.accept(&mut builder);
    Ok(builder.finish())
}

fn parse_options() -> ParseOptions {
    ParseOptions::gfm()
}

/// "Visit" a node and build some output from it.
///
/// For example, a `Visitor` can embody an algorithm used to visit each node
/// in an abstract syntax tree and emit another tree.
pub trait Visitor {
    /// What the visitor produces once it has seen every node.
    type Output;

    /// Consumes the visitor, returning what it built.
    fn finish(self) -> Self::Output;

    /// "Visit" a particular node in a graph.
    fn visit(&mut self, node: &Node);

    /// "Swallows" a node.
    ///
    /// Nothing is done by the visitor for the node, but it continues visiting
    /// the node's children. This is generally used to accept a known node
    /// when there is no further processing necessary for that particular node.
    fn swallow(&mut self, node: &Node)
    where
        Self: Sized,
    {
        trace!("swallowing node: {node:?}");
        node.accept_children(self);
    }

    /// Indicates that the visitor was asked to visit an unexpected node
    /// that it does not know how to process.
    ///
    /// By default, the visitor will log a warning and continue.
    fn unknown(&self, node: &Node) {
        warn!("unhandled node: {node:#?}");
    }
}

/// A data structure that can be visited.
pub trait Visitable {
    /// Accept a visitor for processing the visitable item.
    fn accept<V: Visitor>(&self, visitor: &mut V);

    /// Accept a visitor for processing all child nodes.
    fn accept_children<V: Visitor>(&self, visitor: &mut V);
}

impl Visitable for Node {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit(self);
    }

    fn accept_children<V: Visitor>(&self, visitor: &mut V) {
        if let Some(children) = self.children() {
            for child in children {
                child.accept(visitor);
            }
        }
    }
}

/// A data type that can append text.
trait TextAppendable {
    /// Appends `text` to the target data structure.
    fn push_text(&mut self, text: &str);
}

#[cfg(test)]
pub(crate) mod test_utils;
