//! amelie: a minimal markdown blog server
//!
//! Posts and pages are markdown files carrying one embedded JSON metadata
//! block (`@@: ... :@@`). They are read from a content directory, rendered
//! on request and served as a blogroll, single posts, monthly archives and
//! static pages.

pub mod blogroll;
pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod server;
pub mod templates;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use content::{ContentSource, LocalContentSource, MarkdownRenderer, PostRepository};

/// The blog application rooted at a content directory
#[derive(Clone)]
pub struct Amelie {
    /// Content root (config/, blog/, page/, static/)
    pub content_root: PathBuf,
    /// Syntect theme for fenced code blocks, `None` to disable highlighting
    pub highlight_theme: Option<String>,
}

impl Amelie {
    /// Create a new instance for a content directory
    pub fn new<P: AsRef<Path>>(content_root: P) -> Self {
        Self {
            content_root: content_root.as_ref().to_path_buf(),
            highlight_theme: Some(content::DEFAULT_THEME.to_string()),
        }
    }

    /// Disable or change code highlighting
    pub fn with_highlight_theme(mut self, theme: Option<String>) -> Self {
        self.highlight_theme = theme;
        self
    }

    /// Directory served verbatim at the site root
    pub fn static_dir(&self) -> PathBuf {
        self.content_root.join("static")
    }

    /// Directory holding the pages
    pub fn page_dir(&self) -> PathBuf {
        self.content_root.join("page")
    }

    pub fn content_source(&self) -> Arc<dyn ContentSource> {
        Arc::new(LocalContentSource::new(&self.content_root))
    }

    pub fn repository(&self) -> PostRepository {
        PostRepository::new(self.content_source())
    }

    pub fn markdown_renderer(&self) -> MarkdownRenderer {
        MarkdownRenderer::with_theme(self.highlight_theme.as_deref())
    }
}
