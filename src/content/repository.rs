//! Post repository - reads the manifest, posts and pages from the content root

use async_trait::async_trait;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ContentError, Result};

/// Manifest location relative to the content root
pub const MANIFEST_PATH: &str = "blog/postList.json";

/// Read-only access to files under a content root
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Read a file given its path relative to the content root
    async fn read_to_string(&self, relative: &Path) -> io::Result<String>;

    /// Human-readable location of a relative path, used in errors and logs
    fn describe(&self, relative: &Path) -> PathBuf {
        relative.to_path_buf()
    }
}

/// Content source backed by a local (possibly cloud-synced) directory
pub struct LocalContentSource {
    pub root: PathBuf,
}

impl LocalContentSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for LocalContentSource {
    async fn read_to_string(&self, relative: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(self.root.join(relative)).await
    }

    fn describe(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

#[derive(Deserialize)]
struct Manifest {
    posts: Vec<String>,
}

/// Loads posts and pages by identifier
#[derive(Clone)]
pub struct PostRepository {
    source: Arc<dyn ContentSource>,
}

impl PostRepository {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    /// Repository over a local content directory
    pub fn local<P: Into<PathBuf>>(root: P) -> Self {
        Self::new(Arc::new(LocalContentSource::new(root)))
    }

    /// List post identifiers in manifest order
    pub async fn list_manifest(&self) -> Result<Vec<String>> {
        let path = Path::new(MANIFEST_PATH);
        let unavailable = |message: String| ContentError::ManifestUnavailable {
            path: self.source.describe(path),
            message,
        };

        let raw = self
            .source
            .read_to_string(path)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let manifest: Manifest =
            serde_json::from_str(&raw).map_err(|e| unavailable(e.to_string()))?;

        Ok(manifest.posts)
    }

    /// Load the raw markdown of a post, e.g. `2016/03/15/my-post`
    pub async fn load_post(&self, identifier: &str) -> Result<String> {
        if !is_safe_identifier(identifier) {
            return Err(ContentError::PostNotFound(identifier.to_string()));
        }
        let path = PathBuf::from(format!("blog/{}.md", identifier));
        tracing::debug!("Loading post {:?}", path);
        self.source
            .read_to_string(&path)
            .await
            .map_err(|_| ContentError::PostNotFound(identifier.to_string()))
    }

    /// Load the raw markdown of a page by slug
    pub async fn load_page(&self, slug: &str) -> Result<String> {
        if !is_safe_identifier(slug) || slug.contains('/') {
            return Err(ContentError::PageNotFound(slug.to_string()));
        }
        let path = PathBuf::from(format!("page/{}.md", slug));
        tracing::debug!("Loading page {:?}", path);
        self.source
            .read_to_string(&path)
            .await
            .map_err(|_| ContentError::PageNotFound(slug.to_string()))
    }
}

/// Whether an identifier stays inside its content directory
fn is_safe_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && !identifier.contains('\\')
        && !identifier.contains('\0')
        && identifier
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
