//! List site content

use anyhow::Result;
use std::path::Path;
use walkdir::WalkDir;

use crate::blogroll::{select_identifiers, BlogrollQuery};
use crate::content::metadata::{find_block, Metadata};
use crate::Amelie;

/// List site content by type
pub async fn run(amelie: &Amelie, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let repo = amelie.repository();
            let identifiers = select_identifiers(repo.list_manifest().await?, &BlogrollQuery::all());
            println!("Posts ({}):", identifiers.len());
            for identifier in identifiers {
                let metadata = match repo.load_post(&identifier).await {
                    Ok(raw) => read_metadata(&raw),
                    Err(_) => None,
                };
                match metadata {
                    Some(meta) => println!(
                        "  {} - {} [{}]",
                        meta.date.as_deref().unwrap_or("????-??-??"),
                        meta.title.as_deref().unwrap_or("(untitled)"),
                        identifier
                    ),
                    None => println!("  (unreadable) [{}]", identifier),
                }
            }
        }
        "page" | "pages" => {
            let slugs = page_slugs(&amelie.page_dir());
            println!("Pages ({}):", slugs.len());
            for slug in slugs {
                println!("  /{}", slug);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, page", content_type);
        }
    }

    Ok(())
}

/// Parse only the metadata block of a document
fn read_metadata(raw: &str) -> Option<Metadata> {
    let span = find_block(raw)?;
    Metadata::parse_block(span.interior(raw)).ok()
}

/// Slugs of all markdown pages directly inside `page_dir`, sorted
pub fn page_slugs(page_dir: &Path) -> Vec<String> {
    let mut slugs: Vec<String> = WalkDir::new(page_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("md"))
        .filter_map(|e| {
            e.path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .collect();
    slugs.sort();
    slugs
}
