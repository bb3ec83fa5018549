//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Every page shares `layout.html`,
//! which carries the SEO meta tags, navbar, description and footer.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteSettings;
use crate::content::RenderedDocument;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

/// Values shared by every page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta<'a> {
    title: &'a str,
    site_title: &'a str,
    meta_description: &'a str,
    meta_keywords: &'a str,
    meta_author: &'a str,
    navbar: &'a str,
    description: &'a str,
    copyright_year: i32,
}

impl<'a> PageMeta<'a> {
    fn site(settings: &'a SiteSettings) -> Self {
        Self {
            title: &settings.default_title,
            site_title: &settings.default_title,
            meta_description: &settings.meta_description,
            meta_keywords: &settings.meta_keywords,
            meta_author: &settings.meta_author,
            navbar: &settings.navbar,
            description: &settings.description,
            copyright_year: settings.current_year,
        }
    }

    /// Site values overridden by a document's own title and SEO fields
    fn document(settings: &'a SiteSettings, doc: &'a RenderedDocument) -> Self {
        let meta = &doc.metadata;
        Self {
            title: meta.title_or(&settings.default_title),
            meta_description: or_site(&meta.meta_description, &settings.meta_description),
            meta_keywords: or_site(&meta.meta_keywords, &settings.meta_keywords),
            meta_author: or_site(&meta.meta_author, &settings.meta_author),
            ..Self::site(settings)
        }
    }

    fn into_context(self) -> Result<Context> {
        Ok(Context::from_serialize(self)?)
    }
}

fn or_site<'a>(value: &'a Option<String>, site: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or(site)
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Rendered markdown is inserted as-is; templates escape text fields
        // explicitly
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("page.html", include_str!("theme/page.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            ("error.html", include_str!("theme/error.html")),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a blogroll (homepage, full blogroll or monthly archive)
    pub fn render_blogroll(
        &self,
        settings: &SiteSettings,
        posts: &[RenderedDocument],
        read_more: bool,
    ) -> Result<String> {
        let mut context = PageMeta::site(settings).into_context()?;
        context.insert("posts", posts);
        context.insert("readMore", &read_more);
        Ok(self.tera.render("index.html", &context)?)
    }

    /// Render a single post
    pub fn render_post(&self, settings: &SiteSettings, post: &RenderedDocument) -> Result<String> {
        let mut context = PageMeta::document(settings, post).into_context()?;
        context.insert("posts", std::slice::from_ref(post));
        context.insert("readMore", &false);
        Ok(self.tera.render("index.html", &context)?)
    }

    /// Render a static page
    pub fn render_page(&self, settings: &SiteSettings, page: &RenderedDocument) -> Result<String> {
        let mut context = PageMeta::document(settings, page).into_context()?;
        context.insert("page", &page.content);
        Ok(self.tera.render("page.html", &context)?)
    }

    /// Render the not-found page
    pub fn render_not_found(&self, settings: &SiteSettings) -> Result<String> {
        let context = PageMeta::site(settings).into_context()?;
        Ok(self.tera.render("not_found.html", &context)?)
    }

    /// Render the generic error page
    pub fn render_error(&self, settings: &SiteSettings) -> Result<String> {
        let context = PageMeta::site(settings).into_context()?;
        Ok(self.tera.render("error.html", &context)?)
    }
}

/// Tera filter: format a metadata date as "March 15, 2016"
///
/// Dates that cannot be parsed are returned as written.
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%B %-d, %Y".to_string(),
    };

    Ok(tera::Value::String(
        parse_date(&s)
            .map(|date| date.format(&format).to_string())
            .unwrap_or(s),
    ))
}

/// Parse a date string in the formats posts commonly use
fn parse_date(s: &str) -> Option<chrono::NaiveDate> {
    let s = s.trim();
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

    formats
        .iter()
        .find_map(|fmt| chrono::NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{extract, MarkdownRenderer};

    fn settings() -> SiteSettings {
        SiteSettings {
            description: "<p>About this blog</p>".to_string(),
            navbar: "<p><a href=\"/about\">About</a></p>".to_string(),
            meta_description: "Site description".to_string(),
            meta_keywords: "site,keywords".to_string(),
            meta_author: "Site Author".to_string(),
            default_title: "My Blog".to_string(),
            current_year: 2024,
            ..Default::default()
        }
    }

    fn doc(raw: &str) -> RenderedDocument {
        extract(raw, &MarkdownRenderer::plain()).unwrap()
    }

    #[test]
    fn test_render_blogroll() {
        let renderer = TemplateRenderer::new().unwrap();
        let posts = vec![
            doc(r#"@@:"title": "First", "date": "2020-01-02", "permalink": "/blog/2020/01/02/first/":@@ Hello"#),
            doc(r#"@@:"title": "Linked", "link": "https://example.com", "linkPost": true:@@ Look"#),
        ];
        let html = renderer.render_blogroll(&settings(), &posts, true).unwrap();

        assert!(html.contains("<title>My Blog</title>"));
        assert!(html.contains(r#"<meta name="description" content="Site description">"#));
        assert!(html.contains(r#"<a href="/about">About</a>"#));
        assert!(html.contains(r#"href="/blog/2020/01/02/first/""#));
        assert!(html.contains("January 2, 2020"));
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains("Read more"));
        assert!(html.contains("2024"));
    }

    #[test]
    fn test_blogroll_links_are_attribute_safe() {
        let renderer = TemplateRenderer::new().unwrap();
        let posts = vec![
            doc(r#"@@:"title": "Q", "link": "https://example.com/?a=1&b=\"x\"", "linkPost": true:@@ Q"#),
            doc(r#"@@:"title": "P", "permalink": "/blog/2020/01/02/p\"><script>/":@@ P"#),
        ];
        let html = renderer.render_blogroll(&settings(), &posts, true).unwrap();

        assert!(html.contains(r#"href="https://example.com/?a=1&amp;b=&quot;x&quot;""#));
        assert!(html.contains(r#"href="/blog/2020/01/02/p&quot;&gt;&lt;script&gt;/""#));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_post_overrides_seo() {
        let renderer = TemplateRenderer::new().unwrap();
        let post = doc(r#"@@:"title": "A & B", "metaAuthor": "Guest":@@ Body"#);
        let html = renderer.render_post(&settings(), &post).unwrap();

        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains(r#"<meta name="author" content="Guest">"#));
        assert!(html.contains(r#"<meta name="keywords" content="site,keywords">"#));
        assert!(!html.contains("Read more"));
    }

    #[test]
    fn test_render_page_without_title() {
        let renderer = TemplateRenderer::new().unwrap();
        let page = doc("@@:\"metaDescription\": \"About page\":@@\n# About\n");
        let html = renderer.render_page(&settings(), &page).unwrap();

        assert!(html.contains("<title>My Blog</title>"));
        assert!(html.contains(r#"content="About page""#));
        assert!(html.contains("<h1>About</h1>"));
    }

    #[test]
    fn test_render_not_found_and_error() {
        let renderer = TemplateRenderer::new().unwrap();
        assert!(renderer
            .render_not_found(&settings())
            .unwrap()
            .contains("Page not found"));
        assert!(renderer
            .render_error(&settings())
            .unwrap()
            .contains("Something went wrong"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2016-03-15"),
            chrono::NaiveDate::from_ymd_opt(2016, 3, 15)
        );
        assert_eq!(
            parse_date("2016/03/15"),
            chrono::NaiveDate::from_ymd_opt(2016, 3, 15)
        );
        assert_eq!(parse_date("sometime"), None);
    }
}
