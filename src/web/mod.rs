//! HTTP surface: routes, shared state, and server startup.
//!
//! | Module | Role |
//! |--------|------|
//! | [`public`] | Home, menu, blog, post detail, not-found |
//! | [`auth`] | Login, logout, and the admin gate middleware |
//! | [`admin`] | Dashboard and the post/dish/category forms |
//! | [`forms`] | Multipart form parsing |
//! | [`flash`] | One-shot notification cookie |
//! | [`views`] | Maud page templates |
//! | [`error`] | Fallback error responses |
//!
//! ## Routes
//!
//! ```text
//! GET  /                          home: popular dishes, latest posts
//! GET  /menu?category=            dishes, filtered by category
//! GET  /blog?q=                   posts, filtered by title
//! GET  /blog/{id}                 one post
//! GET  /login   POST /login       admin login
//! POST /logout
//! GET  /admin                     ┐
//! GET  /admin/{kind}/new          │
//! POST /admin/{kind}              │ gated: no session redirects to
//! GET  /admin/{kind}/{id}/edit    │ /login?next=...
//! POST /admin/{kind}/{id}         │ {kind} is posts or dishes
//! GET  /admin/{kind}/{id}/delete  │
//! POST /admin/{kind}/{id}/delete  │
//! POST /admin/categories          ┘
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod flash;
pub mod forms;
pub mod public;
pub mod views;

use crate::auth::{Credentials, SessionStore};
use crate::config::{SiteConfig, SiteInfo};
use crate::content::ContentService;
use crate::media::{self, MediaError, MediaHost};
use crate::store::{self, ContentStore, StoreError};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use thiserror::Error;
use tokio::{net::TcpListener, signal};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Room for the text fields and multipart framing around an image.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("could not connect to the content store: {0}")]
    Store(#[from] StoreError),
    #[error("could not set up the media host: {0}")]
    Media(#[from] MediaError),
    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything handlers share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub content: ContentService,
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<Credentials>,
    pub site: Arc<SiteInfo>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &SiteConfig,
        store: Arc<dyn ContentStore>,
        media: Arc<dyn MediaHost>,
    ) -> Self {
        Self {
            content: ContentService::new(store, media, config.media.max_upload_bytes),
            sessions: Arc::new(SessionStore::new(config.admin.session_hours)),
            credentials: Arc::new(Credentials::from_config(&config.admin)),
            site: Arc::new(config.site.clone()),
            max_upload_bytes: config.media.max_upload_bytes,
        }
    }

    /// Connect the backends named in config.
    pub fn from_config(config: &SiteConfig) -> Result<Self, ServeError> {
        let store = store::connect(&config.store)?;
        let media = media::connect(&config.media)?;
        Ok(Self::new(config, store, media))
    }
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/posts/new", get(admin::new_post))
        .route("/admin/posts", post(admin::create_post))
        .route("/admin/posts/{id}/edit", get(admin::edit_post))
        .route("/admin/posts/{id}", post(admin::update_post))
        .route(
            "/admin/posts/{id}/delete",
            get(admin::confirm_delete_post).post(admin::delete_post),
        )
        .route("/admin/dishes/new", get(admin::new_dish))
        .route("/admin/dishes", post(admin::create_dish))
        .route("/admin/dishes/{id}/edit", get(admin::edit_dish))
        .route("/admin/dishes/{id}", post(admin::update_dish))
        .route(
            "/admin/dishes/{id}/delete",
            get(admin::confirm_delete_dish).post(admin::delete_dish),
        )
        .route("/admin/categories", post(admin::add_category))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let body_limit = state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(public::home))
        .route("/menu", get(public::menu))
        .route("/blog", get(public::blog))
        .route("/blog/{id}", get(public::post_detail))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .merge(admin)
        .fallback(public::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Bind, serve until Ctrl+C or SIGTERM, then drain.
pub async fn serve(config: &SiteConfig) -> Result<(), ServeError> {
    let state = AppState::from_config(config)?;
    if !state.credentials.login_enabled() {
        warn!("admin.password_sha256 is empty; admin login is disabled");
    }
    info!(
        store = ?config.store.backend,
        media = ?config.media.backend,
        "backends ready"
    );

    let address = config.server.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
