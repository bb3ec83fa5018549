//! Blogroll assembly
//!
//! Turns the manifest's post identifiers into an ordered list of rendered
//! posts. Identifiers embed zero-padded `year/month/day/slug` segments, so
//! reverse lexical order is newest first, with same-day posts in reverse
//! alphabetical order of their slug.

use std::sync::Arc;
use tokio::task::JoinSet;

use crate::content::{extract, MarkdownRenderer, PostRepository, RenderedDocument};
use crate::error::{ContentError, Result};

/// Which posts to include in a blogroll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogrollQuery {
    /// Maximum number of posts, `None` for all
    pub max_count: Option<usize>,
    /// Substring every identifier must contain, e.g. `"2016/03/"`
    pub filter: Option<String>,
}

impl BlogrollQuery {
    /// Every post
    pub fn all() -> Self {
        Self::default()
    }

    /// The `count` most recent posts
    pub fn latest(count: usize) -> Self {
        Self {
            max_count: Some(count),
            filter: None,
        }
    }

    /// All posts of one month
    pub fn month(year: &str, month: &str) -> Self {
        Self {
            max_count: None,
            filter: Some(format!("{}/{}/", year, month)),
        }
    }
}

/// Order, filter and limit post identifiers.
///
/// Filtering is a plain substring test, so `"1"` also matches day `11`.
pub fn select_identifiers(mut identifiers: Vec<String>, query: &BlogrollQuery) -> Vec<String> {
    identifiers.sort();
    identifiers.reverse();

    let filter = query.filter.as_deref().unwrap_or("");
    let max_count = query.max_count.unwrap_or(usize::MAX);

    identifiers
        .into_iter()
        .filter(|id| id.contains(filter))
        .take(max_count)
        .collect()
}

/// Loads and renders blogrolls
#[derive(Clone)]
pub struct BlogrollAssembler {
    repo: PostRepository,
    renderer: Arc<MarkdownRenderer>,
}

impl BlogrollAssembler {
    pub fn new(repo: PostRepository, renderer: Arc<MarkdownRenderer>) -> Self {
        Self { repo, renderer }
    }

    /// Read the manifest and assemble the posts selected by `query`
    pub async fn blogroll(&self, query: &BlogrollQuery) -> Result<Vec<RenderedDocument>> {
        let identifiers = self.repo.list_manifest().await?;
        self.assemble(identifiers, query).await
    }

    /// Assemble the posts selected by `query` from the given identifiers.
    ///
    /// Posts are loaded concurrently and returned in selection order. The
    /// first failure aborts the whole batch.
    pub async fn assemble(
        &self,
        identifiers: Vec<String>,
        query: &BlogrollQuery,
    ) -> Result<Vec<RenderedDocument>> {
        let selected = select_identifiers(identifiers, query);

        let mut tasks = JoinSet::new();
        for (index, identifier) in selected.iter().cloned().enumerate() {
            let repo = self.repo.clone();
            let renderer = self.renderer.clone();
            tasks.spawn(async move {
                let raw = repo.load_post(&identifier).await?;
                let doc = extract(&raw, &renderer)?;
                Ok::<_, ContentError>((index, doc))
            });
        }

        let mut slots: Vec<Option<RenderedDocument>> = selected.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((index, doc))) => slots[index] = Some(doc),
                Ok(Err(e)) => {
                    tracing::warn!("Blogroll aborted: {}", e);
                    // dropping the set cancels the remaining loads
                    return Err(e);
                }
                Err(join_error) => match join_error.try_into_panic() {
                    Ok(payload) => std::panic::resume_unwind(payload),
                    Err(cancelled) => tracing::warn!("Blogroll load cancelled: {}", cancelled),
                },
            }
        }

        slots
            .into_iter()
            .zip(selected)
            .map(|(slot, identifier)| slot.ok_or(ContentError::PostNotFound(identifier)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::repository::testing::{post, MemorySource};
    use crate::content::repository::{ContentSource, MANIFEST_PATH};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// Source that answers each post after its own delay and records the
    /// order in which reads complete
    struct DelayedSource {
        inner: MemorySource,
        delays: Vec<(&'static str, u64)>,
        finished: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl ContentSource for DelayedSource {
        async fn read_to_string(&self, relative: &Path) -> io::Result<String> {
            let delay = self
                .delays
                .iter()
                .find(|(path, _)| Path::new(path) == relative)
                .map_or(0, |(_, ms)| *ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let result = self.inner.read_to_string(relative).await;
            self.finished.lock().push(relative.to_path_buf());
            result
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample_source() -> MemorySource {
        let source = MemorySource::new();
        source.add_file(
            MANIFEST_PATH,
            r#"{"posts": ["2019/12/31/c", "2020/01/02/a", "2020/01/01/b"]}"#,
        );
        source.add_file("blog/2020/01/02/a.md", &post("A"));
        source.add_file("blog/2020/01/01/b.md", &post("B"));
        source.add_file("blog/2019/12/31/c.md", &post("C"));
        source
    }

    fn assembler(source: MemorySource) -> BlogrollAssembler {
        BlogrollAssembler::new(
            PostRepository::new(Arc::new(source)),
            Arc::new(MarkdownRenderer::plain()),
        )
    }

    fn titles(docs: &[RenderedDocument]) -> Vec<&str> {
        docs.iter()
            .map(|d| d.metadata.title.as_deref().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_select_reverse_lexical() {
        let selected = select_identifiers(
            ids(&["2020/01/01/b", "2019/12/31/c", "2020/01/02/a"]),
            &BlogrollQuery::all(),
        );
        assert_eq!(selected, ids(&["2020/01/02/a", "2020/01/01/b", "2019/12/31/c"]));
    }

    #[test]
    fn test_select_same_day_reverse_alphabetical() {
        let selected = select_identifiers(
            ids(&["2020/01/01/apple", "2020/01/01/banana"]),
            &BlogrollQuery::all(),
        );
        assert_eq!(selected, ids(&["2020/01/01/banana", "2020/01/01/apple"]));
    }

    #[test]
    fn test_select_limit() {
        let selected = select_identifiers(
            ids(&["2020/01/02/a", "2020/01/01/b", "2019/12/31/c"]),
            &BlogrollQuery::latest(2),
        );
        assert_eq!(selected, ids(&["2020/01/02/a", "2020/01/01/b"]));
    }

    #[test]
    fn test_select_filter_then_limit() {
        let query = BlogrollQuery {
            max_count: Some(1),
            filter: Some("2019/".to_string()),
        };
        let selected = select_identifiers(
            ids(&["2020/01/02/a", "2020/01/01/b", "2019/12/31/c"]),
            &query,
        );
        assert_eq!(selected, ids(&["2019/12/31/c"]));
    }

    #[test]
    fn test_select_month_filter() {
        let selected = select_identifiers(
            ids(&["2020/01/02/a", "2020/02/01/x", "2020/01/01/b"]),
            &BlogrollQuery::month("2020", "01"),
        );
        assert_eq!(selected, ids(&["2020/01/02/a", "2020/01/01/b"]));
    }

    #[test]
    fn test_select_loose_substring_match() {
        let query = BlogrollQuery {
            max_count: None,
            filter: Some("1".to_string()),
        };
        let selected = select_identifiers(ids(&["2020/02/22/x", "2020/02/11/y"]), &query);
        assert_eq!(selected, ids(&["2020/02/11/y"]));
    }

    #[tokio::test]
    async fn test_blogroll_orders_posts() {
        let docs = assembler(sample_source())
            .blogroll(&BlogrollQuery::all())
            .await
            .unwrap();
        assert_eq!(titles(&docs), vec!["A", "B", "C"]);
        assert!(docs[0].content.contains("Body of A."));
    }

    #[tokio::test]
    async fn test_blogroll_limit_loads_only_selected() {
        let source = sample_source();
        // c is outside the limit, so its absence must not matter
        source.remove_file("blog/2019/12/31/c.md");
        let docs = assembler(source)
            .blogroll(&BlogrollQuery::latest(2))
            .await
            .unwrap();
        assert_eq!(titles(&docs), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_blogroll_all_or_nothing() {
        let source = sample_source();
        source.add_file("blog/2020/01/01/b.md", "no metadata block");
        let result = assembler(source).blogroll(&BlogrollQuery::all()).await;
        assert!(matches!(result, Err(ContentError::MalformedDocument)));

        let source = sample_source();
        source.remove_file("blog/2020/01/02/a.md");
        let result = assembler(source).blogroll(&BlogrollQuery::all()).await;
        assert!(matches!(result, Err(ContentError::PostNotFound(id)) if id == "2020/01/02/a"));
    }

    #[tokio::test]
    async fn test_blogroll_missing_manifest() {
        let result = assembler(MemorySource::new())
            .blogroll(&BlogrollQuery::all())
            .await;
        assert!(matches!(result, Err(ContentError::ManifestUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_empty_selection() {
        let docs = assembler(sample_source())
            .blogroll(&BlogrollQuery::month("1999", "01"))
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_blogroll_keeps_order_when_loads_finish_out_of_order() {
        let source = Arc::new(DelayedSource {
            inner: sample_source(),
            delays: vec![
                ("blog/2020/01/02/a.md", 60),
                ("blog/2020/01/01/b.md", 30),
            ],
            finished: Mutex::new(Vec::new()),
        });
        let assembler = BlogrollAssembler::new(
            PostRepository::new(source.clone()),
            Arc::new(MarkdownRenderer::plain()),
        );

        let docs = assembler.blogroll(&BlogrollQuery::all()).await.unwrap();
        assert_eq!(titles(&docs), vec!["A", "B", "C"]);
        assert_eq!(
            *source.finished.lock(),
            vec![
                PathBuf::from(MANIFEST_PATH),
                PathBuf::from("blog/2019/12/31/c.md"),
                PathBuf::from("blog/2020/01/01/b.md"),
                PathBuf::from("blog/2020/01/02/a.md"),
            ]
        );
    }
}
