//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Default syntect theme for fenced code blocks
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Markdown renderer with optional syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

impl MarkdownRenderer {
    /// Create a renderer that highlights code blocks with the default theme
    pub fn new() -> Self {
        Self::with_theme(Some(DEFAULT_THEME))
    }

    /// Create a renderer that leaves code blocks unhighlighted
    pub fn plain() -> Self {
        Self::with_theme(None)
    }

    /// Create with a named syntect theme, or `None` to disable highlighting
    pub fn with_theme(theme: Option<&str>) -> Self {
        let theme = theme.and_then(|name| {
            let mut themes = ThemeSet::load_defaults().themes;
            let found = themes.remove(name);
            if found.is_none() {
                tracing::warn!("Unknown highlight theme {:?}, highlighting disabled", name);
            }
            found
        });

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        // Some(lang) while inside a fenced block we are going to highlight
        let mut code_block: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref lang)))
                    if self.theme.is_some() && !lang.is_empty() =>
                {
                    code_block = Some(lang.to_string());
                    code_block_content.clear();
                }
                Event::Text(text) if code_block.is_some() => {
                    code_block_content.push_str(&text);
                }
                Event::End(TagEnd::CodeBlock) if code_block.is_some() => {
                    let lang = code_block.take().unwrap_or_default();
                    let highlighted = self.highlight_code(&code_block_content, &lang);
                    events.push(Event::Html(CowStr::from(highlighted)));
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang));

        let highlighted = match (syntax, &self.theme) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
            }
            _ => None,
        };

        highlighted.unwrap_or_else(|| {
            format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                html_escape(lang),
                html_escape(code)
            )
        })
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
