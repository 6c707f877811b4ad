// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Converts whole Markdown documents into deltas.

use crate::delta::convert::{self, convert};
use crate::delta::{Attributes, Delta, Op};
use crate::{markdown, media};
use log::{debug, error};
use std::error::Error as _;
use thiserror::Error;

/// An error converting a document.
#[derive(Debug, Error)]
pub enum Error {
    /// The Markdown source could not be parsed.
    #[error("Markdown error: {0}")]
    Markdown(#[from] markdown::Error),

    /// The parsed document could not be converted.
    #[error("Conversion error: {0}")]
    Convert(#[from] convert::Error),
}

impl Error {
    /// A short name for the kind of error, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Markdown(_) => "markdown",
            Error::Convert(_) => "convert",
        }
    }
}

/// Converts Markdown source into a delta.
///
/// Media shortcodes are stripped and trailing whitespace is trimmed before
/// the source is parsed. The result always ends with a newline, as editors
/// require.
///
/// This function never fails. If the document cannot be converted, the
/// error is logged and the source text is returned unformatted, followed by
/// a newline.
///
/// # Examples
///
/// ```
/// use mdelta::markdown_to_delta;
/// let delta = markdown_to_delta("**Bold** text");
/// assert_eq!(
///     delta.to_json(false).unwrap(),
///     r#"{"ops":[{"insert":"Bold","attributes":{"bold":true}},{"insert":" text\n"}]}"#
/// );
/// ```
pub fn markdown_to_delta(markup: &str) -> Delta {
    let stripped = media::strip_shortcodes(markup);
    if stripped.is_empty() {
        debug!("nothing to convert");
        return Delta::newline();
    }

    recover(&stripped, convert_stripped(&stripped))
}

/// Converts Markdown source into a delta, returning an error if the
/// document cannot be converted.
///
/// Like [`markdown_to_delta()`], media shortcodes are stripped first, and
/// empty documents become a single newline.
pub fn try_markdown_to_delta(markup: &str) -> Result<Delta, Error> {
    let stripped = media::strip_shortcodes(markup);
    if stripped.is_empty() {
        return Ok(Delta::newline());
    }
    convert_stripped(&stripped)
}

fn convert_stripped(stripped: &str) -> Result<Delta, Error> {
    let tree = markdown::parse(stripped)?;
    debug!("parsed {} top-level nodes", tree.len());

    let mut delta = Delta::new();
    convert(&tree, &mut delta)?;
    delta.ensure_trailing_newline();
    debug!("converted into {} ops", delta.len());

    Ok(delta)
}

/// Returns the converted delta, or if conversion failed, logs the error and
/// returns the [fallback] delta for `stripped`.
fn recover(stripped: &str, result: Result<Delta, Error>) -> Delta {
    result.unwrap_or_else(|err| {
        error!("could not convert markdown ({}): {err}", err.kind());
        let mut source = err.source();
        while let Some(cause) = source {
            error!("  caused by: {cause}");
            source = cause.source();
        }
        fallback(stripped)
    })
}

/// The unformatted source text, followed by a newline.
fn fallback(stripped: &str) -> Delta {
    Delta::from(vec![Op::text(stripped, &Attributes::new()), Op::newline()])
}
