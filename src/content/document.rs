//! Metadata/content extraction for posts and pages

use serde::Serialize;

use super::metadata::{find_block, Metadata};
use super::MarkdownRenderer;
use crate::error::{ContentError, Result};

/// A post or page ready for template injection
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub metadata: Metadata,
    /// Body rendered to HTML
    pub content: String,
}

/// Split the metadata block out of `raw` and render the rest as HTML.
///
/// Fails with [`ContentError::MalformedDocument`] when there is no block and
/// with [`ContentError::MalformedMetadata`] when the block is not JSON.
pub fn extract(raw: &str, renderer: &MarkdownRenderer) -> Result<RenderedDocument> {
    let span = find_block(raw).ok_or(ContentError::MalformedDocument)?;
    let metadata = Metadata::parse_block(span.interior(raw))?;

    let mut body = String::with_capacity(raw.len() - (span.end - span.start));
    body.push_str(&raw[..span.start]);
    body.push_str(&raw[span.end..]);

    Ok(RenderedDocument {
        metadata,
        content: renderer.render(&body),
    })
}
