//! Embedded metadata block parsing
//!
//! Every post and page carries one JSON object written between `@@:` and
//! `:@@` markers, e.g.
//!
//! ```text
//! @@:"title": "Hello", "date": "2016-03-15":@@
//! ```
//!
//! Swapping the markers for braces turns the block into a JSON object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ContentError, Result};

/// Start marker of a metadata block
pub const BLOCK_START: &str = "@@:";

/// End marker of a metadata block
pub const BLOCK_END: &str = ":@@";

/// Metadata of a post or page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    #[serde(alias = "Title")]
    pub title: Option<String>,
    #[serde(alias = "Date")]
    pub date: Option<String>,
    /// External target of a link post
    #[serde(alias = "Link")]
    pub link: Option<String>,
    #[serde(alias = "LinkPost")]
    pub link_post: bool,
    #[serde(alias = "Permalink")]
    pub permalink: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_author: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Location of a metadata block inside a document, in byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Offset of the start marker
    pub start: usize,
    /// Offset just past the end marker
    pub end: usize,
}

impl BlockSpan {
    /// Text between the markers
    pub fn interior<'a>(&self, doc: &'a str) -> &'a str {
        &doc[self.start + BLOCK_START.len()..self.end - BLOCK_END.len()]
    }
}

/// Find the first metadata block in a document.
///
/// The end marker is the first `:@@` following the start marker, so a block
/// may span several lines. Later blocks are ignored.
pub fn find_block(doc: &str) -> Option<BlockSpan> {
    let start = doc.find(BLOCK_START)?;
    let search_from = start + BLOCK_START.len();
    let end = doc[search_from..].find(BLOCK_END)? + search_from + BLOCK_END.len();
    Some(BlockSpan { start, end })
}

impl Metadata {
    /// Parse the interior of a metadata block as a JSON object
    pub fn parse_block(interior: &str) -> Result<Self> {
        let json = format!("{{{}}}", interior);
        serde_json::from_str(&json).map_err(ContentError::MalformedMetadata)
    }

    /// Title to display, falling back to the site default
    pub fn title_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(default)
    }
}
