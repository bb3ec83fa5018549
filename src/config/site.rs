//! Site configuration (config/*.json and config/*.md)

use serde::{Deserialize, Serialize};

/// Default configuration refresh interval in milliseconds (30 minutes)
pub const DEFAULT_CONFIG_TTL_MS: u64 = 1_800_000;

/// Default `Cache-Control` max-age in seconds
pub const DEFAULT_CACHE_MAX_AGE: u64 = 300;

/// Default number of posts on the homepage
pub const DEFAULT_HOMEPAGE_POSTS: usize = 5;

/// Settings for running the app (config/app-config.json)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Refresh interval of the site configuration in milliseconds
    #[serde(rename = "configTTL")]
    pub config_ttl: Option<u64>,
    /// `Cache-Control` max-age in seconds
    pub cache_max_age: Option<u64>,
    pub homepage_posts: Option<usize>,
}

/// Display metadata of the site (config/site-config.json)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_author: Option<String>,
    pub default_title: Option<String>,
}

/// A complete snapshot of the site settings used to render pages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    /// Site description, rendered from config/description.md
    pub description: String,
    /// Navigation bar, rendered from config/navbar.md
    pub navbar: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub meta_author: String,
    pub default_title: String,
    pub current_year: i32,
    pub config_ttl_ms: u64,
    pub cache_max_age: u64,
    pub homepage_posts: usize,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            description: String::new(),
            navbar: String::new(),
            meta_description: String::new(),
            meta_keywords: String::new(),
            meta_author: String::new(),
            default_title: String::new(),
            current_year: 0,
            config_ttl_ms: DEFAULT_CONFIG_TTL_MS,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            homepage_posts: DEFAULT_HOMEPAGE_POSTS,
        }
    }
}

impl SiteSettings {
    /// Build a snapshot from freshly loaded config sources.
    ///
    /// Missing, empty and zero values keep the defaults.
    pub fn from_sources(
        description_html: String,
        navbar_html: String,
        app: AppConfig,
        site: SiteConfig,
        current_year: i32,
    ) -> Self {
        let defaults = Self::default();
        let text = |value: Option<String>, default: String| {
            value.filter(|v| !v.is_empty()).unwrap_or(default)
        };

        Self {
            description: description_html,
            navbar: navbar_html,
            meta_description: text(site.meta_description, defaults.meta_description),
            meta_keywords: text(site.meta_keywords, defaults.meta_keywords),
            meta_author: text(site.meta_author, defaults.meta_author),
            default_title: text(site.default_title, defaults.default_title),
            current_year,
            config_ttl_ms: app
                .config_ttl
                .filter(|v| *v > 0)
                .unwrap_or(defaults.config_ttl_ms),
            cache_max_age: app
                .cache_max_age
                .filter(|v| *v > 0)
                .unwrap_or(defaults.cache_max_age),
            homepage_posts: app
                .homepage_posts
                .filter(|v| *v > 0)
                .unwrap_or(defaults.homepage_posts),
        }
    }

    /// `Cache-Control` header value for content responses
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age)
    }
}
