//! Configuration cache
//!
//! Site-wide display settings are read from four small files under
//! `config/` and kept in memory. Requests never wait for a reload: when the
//! snapshot is older than its TTL, a refresh is spawned in the background
//! and the request renders with the snapshot it already has.

use chrono::{DateTime, Datelike, Duration, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{AppConfig, SiteConfig, SiteSettings};
use crate::content::{ContentSource, MarkdownRenderer};
use crate::error::{ContentError, Result};

const DESCRIPTION_FILE: &str = "config/description.md";
const NAVBAR_FILE: &str = "config/navbar.md";
const APP_CONFIG_FILE: &str = "config/app-config.json";
const SITE_CONFIG_FILE: &str = "config/site-config.json";

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clears the in-flight flag when a background refresh ends, even by panic
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Snapshot {
    settings: Arc<SiteSettings>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Lazily refreshed site settings
pub struct ConfigCache {
    source: Arc<dyn ContentSource>,
    renderer: Arc<MarkdownRenderer>,
    clock: Arc<dyn Clock>,
    snapshot: RwLock<Snapshot>,
    refreshing: AtomicBool,
}

impl ConfigCache {
    /// Create an empty cache; it is expired until the first refresh succeeds
    pub fn new(source: Arc<dyn ContentSource>, renderer: Arc<MarkdownRenderer>) -> Self {
        Self::with_clock(source, renderer, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn ContentSource>,
        renderer: Arc<MarkdownRenderer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            renderer,
            clock,
            snapshot: RwLock::new(Snapshot {
                settings: Arc::new(SiteSettings::default()),
                refreshed_at: None,
            }),
            refreshing: AtomicBool::new(false),
        }
    }

    /// The current settings snapshot
    pub fn current(&self) -> Arc<SiteSettings> {
        self.snapshot.read().settings.clone()
    }

    /// Whether the snapshot is older than its TTL (or was never loaded)
    pub fn is_expired(&self) -> bool {
        let snapshot = self.snapshot.read();
        match snapshot.refreshed_at {
            None => true,
            Some(at) => {
                let ttl = Duration::milliseconds(
                    i64::try_from(snapshot.settings.config_ttl_ms).unwrap_or(i64::MAX),
                );
                self.clock.now() - at > ttl
            }
        }
    }

    /// Reload all config files and swap in a new snapshot.
    ///
    /// If any file cannot be read or parsed, the previous snapshot stays.
    pub async fn refresh(&self) -> Result<Arc<SiteSettings>> {
        let (description, navbar, app, site) = tokio::try_join!(
            self.read_text(DESCRIPTION_FILE),
            self.read_text(NAVBAR_FILE),
            self.read_json::<AppConfig>(APP_CONFIG_FILE),
            self.read_json::<SiteConfig>(SITE_CONFIG_FILE),
        )?;

        let now = self.clock.now();
        let settings = Arc::new(SiteSettings::from_sources(
            self.renderer.render(&description),
            self.renderer.render(&navbar),
            app,
            site,
            now.year(),
        ));

        *self.snapshot.write() = Snapshot {
            settings: settings.clone(),
            refreshed_at: Some(now),
        };
        tracing::info!("Site configuration refreshed");

        Ok(settings)
    }

    /// Spawn a background refresh when expired and return the current
    /// snapshot without waiting for it.
    pub fn refresh_if_expired(self: &Arc<Self>) -> Arc<SiteSettings> {
        if self.is_expired() && !self.refreshing.swap(true, Ordering::AcqRel) {
            let cache = Arc::clone(self);
            tokio::spawn(async move {
                let _guard = RefreshGuard(&cache.refreshing);
                if let Err(e) = cache.refresh().await {
                    tracing::warn!("Keeping previous site configuration: {}", e);
                }
            });
        }
        self.current()
    }

    async fn read_text(&self, relative: &str) -> Result<String> {
        let path = Path::new(relative);
        self.source
            .read_to_string(path)
            .await
            .map_err(|e| ContentError::ConfigUnavailable {
                path: self.source.describe(path),
                message: e.to_string(),
            })
    }

    async fn read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T> {
        let raw = self.read_text(relative).await?;
        serde_json::from_str(&raw).map_err(|e| ContentError::ConfigUnavailable {
            path: self.source.describe(Path::new(relative)),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Clock that only moves when told to
    pub struct FakeClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FakeClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock();
            *now += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }
}
