//! HTTP server: JSON post API plus the generated pages

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::{Post, PostRepository};
use crate::Blog;

/// Server state, shared read-only between requests
pub struct AppState {
    repository: PostRepository,
    public_dir: PathBuf,
}

impl AppState {
    pub fn new(blog: &Blog) -> Self {
        Self {
            repository: blog.repository(),
            public_dir: blog.public_dir.clone(),
        }
    }
}

/// Errors returned by the API handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("post not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] crate::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "404").into_response(),
            ApiError::Repository(e) => {
                tracing::error!("Repository error: {}", e);
                let body = Json(json!({ "message": e.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[derive(Serialize)]
struct PostsResponse {
    posts: Vec<Post>,
}

#[derive(Serialize)]
struct PostResponse {
    post: Post,
}

/// GET /api/posts
async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<PostsResponse>, ApiError> {
    let posts = state.repository.list_posts().await?;
    Ok(Json(PostsResponse { posts }))
}

/// GET /api/posts/:slug
async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    match state.repository.get_post(&slug).await? {
        Some(post) => Ok(Json(PostResponse { post })),
        None => Err(ApiError::NotFound),
    }
}

/// Create the router: API routes first, generated pages for everything else
pub fn router(state: Arc<AppState>) -> Router {
    let pages = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/:slug", get(get_post))
        .fallback_service(pages)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the server, optionally regenerating pages when posts change
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool) -> Result<()> {
    let app = router(Arc::new(AppState::new(blog)));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    if watch {
        println!("Watching {} for changes...", blog.posts_dir.display());
        let blog = blog.clone();
        let runtime = tokio::runtime::Handle::current();
        // Detached so it cannot hold up runtime shutdown
        std::thread::spawn(move || {
            if let Err(e) = watch_and_regenerate(&blog, &runtime) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Regenerate the pages whenever the posts directory changes
///
/// A failed regeneration is logged and the previous pages stay in place.
fn watch_and_regenerate(blog: &Blog, runtime: &tokio::runtime::Handle) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(&blog.posts_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", blog.posts_dir);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let name = e
                            .path
                            .file_name()
                            .map(|n| n.to_string_lossy())
                            .unwrap_or_default();
                        !name.starts_with('.') && !name.ends_with('~')
                    })
                    .collect();

                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }

                match runtime.block_on(blog.generate()) {
                    Ok(count) => tracing::info!("Regenerated {} post pages", count),
                    Err(e) => tracing::error!("Regeneration failed: {}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::warn!("Received SIGTERM, shutting down...");
        }
    }
}
