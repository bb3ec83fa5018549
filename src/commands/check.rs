//! Validate site content

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

use super::list::page_slugs;
use crate::content::{extract, MarkdownRenderer, PostRepository};
use crate::Amelie;

lazy_static! {
    // zero-padded dates keep reverse lexical order chronological
    static ref IDENTIFIER_REGEX: Regex =
        Regex::new(r"^\d{4}/\d{2}/\d{2}/[^/]+$").unwrap();
}

/// Outcome of checking every post and page
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Number of documents loaded
    pub checked: usize,
    /// Identifiers that break blogroll ordering
    pub warnings: Vec<String>,
    /// Documents that failed to load or extract, with the reason
    pub failures: Vec<(String, String)>,
}

/// Whether a post identifier follows the `YYYY/MM/DD/slug` layout
pub fn is_well_formed_identifier(identifier: &str) -> bool {
    IDENTIFIER_REGEX.is_match(identifier)
}

/// Load and extract every manifest post and the given pages
pub async fn check_documents(
    repo: &PostRepository,
    renderer: &MarkdownRenderer,
    pages: &[String],
) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    for identifier in repo.list_manifest().await? {
        if !is_well_formed_identifier(&identifier) {
            report.warnings.push(identifier.clone());
        }
        report.checked += 1;
        let result = match repo.load_post(&identifier).await {
            Ok(raw) => extract(&raw, renderer).map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            report.failures.push((format!("post {}", identifier), e.to_string()));
        }
    }

    for slug in pages {
        report.checked += 1;
        let result = match repo.load_page(slug).await {
            Ok(raw) => extract(&raw, renderer).map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            report.failures.push((format!("page {}", slug), e.to_string()));
        }
    }

    Ok(report)
}

/// Run the check command
pub async fn run(amelie: &Amelie) -> Result<()> {
    let renderer = MarkdownRenderer::plain();
    let pages = page_slugs(&amelie.page_dir());
    let report = check_documents(&amelie.repository(), &renderer, &pages).await?;

    for identifier in &report.warnings {
        tracing::warn!(
            "Identifier {:?} is not YYYY/MM/DD/slug; blogroll order may be wrong",
            identifier
        );
    }
    for (document, reason) in &report.failures {
        println!("  FAIL {}: {}", document, reason);
    }
    println!(
        "Checked {} documents: {} failed, {} warnings",
        report.checked,
        report.failures.len(),
        report.warnings.len()
    );

    if !report.failures.is_empty() {
        anyhow::bail!("{} documents failed to load", report.failures.len());
    }
    Ok(())
}
