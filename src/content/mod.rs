//! Content module - posts, pages, metadata extraction and markdown rendering

pub mod document;
mod markdown;
pub mod metadata;
pub mod repository;

pub use document::{extract, RenderedDocument};
pub use markdown::{MarkdownRenderer, DEFAULT_THEME};
pub use metadata::Metadata;
pub use repository::{ContentSource, LocalContentSource, PostRepository};
