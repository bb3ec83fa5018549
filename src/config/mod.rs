//! Configuration module

mod site;

pub use site::AppConfig;
pub use site::SiteConfig;
pub use site::SiteSettings;
pub use site::{DEFAULT_CACHE_MAX_AGE, DEFAULT_CONFIG_TTL_MS, DEFAULT_HOMEPAGE_POSTS};
