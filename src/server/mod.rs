//! Blog HTTP server

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::blogroll::{BlogrollAssembler, BlogrollQuery};
use crate::cache::ConfigCache;
use crate::config::SiteSettings;
use crate::content::{extract, ContentSource, MarkdownRenderer, PostRepository};
use crate::error::ContentError;
use crate::templates::TemplateRenderer;
use crate::Amelie;

/// Where requests that match nothing are sent
const NOT_FOUND_PATH: &str = "/404";

/// Server state shared by all handlers
pub struct AppState {
    repo: PostRepository,
    blogroll: BlogrollAssembler,
    renderer: Arc<MarkdownRenderer>,
    templates: TemplateRenderer,
    config: Arc<ConfigCache>,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        source: Arc<dyn ContentSource>,
        static_dir: PathBuf,
        renderer: MarkdownRenderer,
    ) -> Result<Self> {
        let renderer = Arc::new(renderer);
        let repo = PostRepository::new(source.clone());

        Ok(Self {
            blogroll: BlogrollAssembler::new(repo.clone(), renderer.clone()),
            config: Arc::new(ConfigCache::new(source, renderer.clone())),
            templates: TemplateRenderer::new()?,
            repo,
            renderer,
            static_dir,
        })
    }

    /// The site configuration cache
    pub fn config(&self) -> &Arc<ConfigCache> {
        &self.config
    }

    /// Turn a rendering result into a response
    fn respond(&self, settings: &SiteSettings, result: Result<String, AppError>) -> Response {
        match result {
            Ok(html) => (
                [(header::CACHE_CONTROL, settings.cache_control())],
                Html(html),
            )
                .into_response(),
            Err(AppError::NotFound) => redirect_not_found(),
            Err(AppError::Internal(e)) => {
                tracing::warn!("Request failed: {:#}", e);
                let body = self
                    .templates
                    .render_error(settings)
                    .unwrap_or_else(|_| "Internal server error".to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
            }
        }
    }
}

/// Why a page could not be rendered
#[derive(Error, Debug)]
enum AppError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ContentError> for AppError {
    fn from(e: ContentError) -> Self {
        AppError::Internal(e.into())
    }
}

impl AppError {
    /// Failures loading a single post or page send the reader to the 404 page
    fn document(e: ContentError) -> Self {
        if e.is_not_found() {
            tracing::debug!("{}", e);
            AppError::NotFound
        } else {
            e.into()
        }
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(homepage))
        .route("/blogroll", get(full_blogroll))
        .route("/blog/:year/:month/:day/:post", get(single_post))
        .route("/blog/:year/:month/:day/:post/", get(single_post))
        .route("/blog/:year/:month", get(monthly_archive))
        .route("/blog/:year/:month/", get(monthly_archive))
        .route(NOT_FOUND_PATH, get(not_found))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}

/// Start the blog server
pub async fn start(amelie: &Amelie, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(
        amelie.content_source(),
        amelie.static_dir(),
        amelie.markdown_renderer(),
    )?);

    if let Err(e) = state.config.refresh().await {
        tracing::warn!("Starting with default site configuration: {}", e);
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    tracing::info!(
        "Serving {:?} at http://{}:{}",
        amelie.content_root,
        ip,
        port
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Homepage: the most recent posts
async fn homepage(State(state): State<Arc<AppState>>) -> Response {
    let settings = state.config.refresh_if_expired();
    let query = BlogrollQuery::latest(settings.homepage_posts);
    let result = render_blogroll(&state, &settings, &query, true).await;
    state.respond(&settings, result)
}

/// Every post
async fn full_blogroll(State(state): State<Arc<AppState>>) -> Response {
    let settings = state.config.refresh_if_expired();
    let result = render_blogroll(&state, &settings, &BlogrollQuery::all(), false).await;
    state.respond(&settings, result)
}

/// All posts of one month
async fn monthly_archive(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(String, String)>,
) -> Response {
    let settings = state.config.refresh_if_expired();
    let query = BlogrollQuery::month(&year, &month);
    let result = render_blogroll(&state, &settings, &query, false).await;
    state.respond(&settings, result)
}

async fn render_blogroll(
    state: &AppState,
    settings: &SiteSettings,
    query: &BlogrollQuery,
    read_more: bool,
) -> Result<String, AppError> {
    let posts = state.blogroll.blogroll(query).await?;
    Ok(state.templates.render_blogroll(settings, &posts, read_more)?)
}

/// A single post by its permalink
async fn single_post(
    State(state): State<Arc<AppState>>,
    Path((year, month, day, post)): Path<(String, String, String, String)>,
) -> Response {
    let settings = state.config.refresh_if_expired();
    let identifier = format!("{}/{}/{}/{}", year, month, day, post);
    let result = render_post(&state, &settings, &identifier).await;
    state.respond(&settings, result)
}

async fn render_post(
    state: &AppState,
    settings: &SiteSettings,
    identifier: &str,
) -> Result<String, AppError> {
    let raw = state
        .repo
        .load_post(identifier)
        .await
        .map_err(AppError::document)?;
    let post = extract(&raw, &state.renderer).map_err(AppError::document)?;
    Ok(state.templates.render_post(settings, &post)?)
}

async fn render_page(
    state: &AppState,
    settings: &SiteSettings,
    slug: &str,
) -> Result<String, AppError> {
    let raw = state.repo.load_page(slug).await.map_err(AppError::document)?;
    let page = extract(&raw, &state.renderer).map_err(AppError::document)?;
    Ok(state.templates.render_page(settings, &page)?)
}

/// The not-found page
async fn not_found(State(state): State<Arc<AppState>>) -> Response {
    let settings = state.config.refresh_if_expired();
    match state.templates.render_not_found(&settings) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            tracing::warn!("Failed to render not-found page: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

/// Fallback handler: static files first, then pages, then the 404 page
async fn fallback_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return redirect_not_found();
    }

    let path = request.uri().path().to_string();

    let mut service = ServeDir::new(&state.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => {
            return response.into_response();
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to serve static file {}: {}", path, e),
    }

    match page_slug(&path) {
        Some(slug) => {
            let settings = state.config.refresh_if_expired();
            let result = render_page(&state, &settings, &slug).await;
            state.respond(&settings, result)
        }
        None => redirect_not_found(),
    }
}

/// Temporary (302) redirect to the not-found page
fn redirect_not_found() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, NOT_FOUND_PATH)]).into_response()
}

/// Decoded slug of a single-segment path such as `/about` or `/about/`
fn page_slug(path: &str) -> Option<String> {
    let slug = path.strip_prefix('/')?;
    let slug = slug.strip_suffix('/').unwrap_or(slug);
    if slug.is_empty() || slug.contains('/') {
        return None;
    }
    let decoded = percent_decode_str(slug).decode_utf8().ok()?;
    Some(decoded.into_owned())
}
