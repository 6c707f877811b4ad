// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! mdelta converts Markdown into the rich-text deltas used by Quill-style
//! editors. A delta is a flat list of insert operations, each carrying the
//! formatting (bold, headers, list membership, links, and so on) that
//! applies to it.
//!
//! # Examples
//!
//! Convert Markdown from the command line:
//!
//! ```bash
//! mdelta '**Bold** text'
//! ```
//!
//! which prints
//!
//! ```json
//! {"ops":[{"insert":"Bold","attributes":{"bold":true}},{"insert":" text\n"}]}
//! ```
//!
//! Or from Rust:
//!
//! ```
//! let delta = mdelta::markdown_to_delta("- [x] done");
//! assert_eq!(delta.plain_text(), "done\n\n");
//! ```
//!
//! Get usage and help for the tool:
//!
//! ```bash
//! mdelta --help
//! ```
//!
//! # Supported syntax
//!
//! CommonMark plus the GitHub Flavored Markdown extensions (tables,
//! strikethrough, task lists, autolinks and footnotes), along with two
//! extensions of its own:
//!
//! - `==highlighted text==`
//! - `<u>underlined text</u>`
//!
//! Media shortcodes such as `![[media:<uuid>]]` are removed before the
//! document is parsed.
//!
//! # License
//!
//! mdelta is licensed under the terms of the [Apache License 2.0]. Please
//! see the LICENSE file accompanying this source code or visit the previous
//! link for more information on licensing.
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0

pub mod cli;
pub mod delta;
pub mod document;
pub mod markdown;
pub mod media;

pub use document::{markdown_to_delta, try_markdown_to_delta};

#[cfg(test)]
mod test_utils;
