//! Main note server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult, INTERNAL_ERROR_MESSAGE};
use crate::handler::{HandlerContext, RequestHandler};
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use notepad_protocol::{ErrorResponse, NoteResponse, ProtocolError, SaveResponse};
use notepad_storage::{InMemoryNoteStore, NoteStore, SqliteNoteStore};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// The note server.
///
/// Owns the store and request handler and exposes them over HTTP. The
/// handler can also be driven directly, which is how in-process clients
/// and tests talk to it.
///
/// # Example
///
/// ```no_run
/// use notepad_sync_server::{NoteServer, ServerConfig};
///
/// # async fn run() -> notepad_sync_server::ServerResult<()> {
/// let config = ServerConfig::default().with_database("data/notes.db");
/// NoteServer::open(config)?.serve().await
/// # }
/// ```
pub struct NoteServer {
    handler: Arc<RequestHandler>,
    context: Arc<HandlerContext>,
}

impl NoteServer {
    /// Creates a server over an existing store.
    pub fn new(config: ServerConfig, store: Arc<dyn NoteStore>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store));
        let handler = Arc::new(RequestHandler::new(Arc::clone(&context)));

        Self { handler, context }
    }

    /// Creates a server that keeps notes in memory.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(config, Arc::new(InMemoryNoteStore::new()))
    }

    /// Creates a server with the store selected by the configuration:
    /// SQLite when a database path is set, memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store: Arc<dyn NoteStore> = match &config.database_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "using sqlite note store");
                Arc::new(SqliteNoteStore::open(path)?)
            }
            None => {
                tracing::info!("using in-memory note store");
                Arc::new(InMemoryNoteStore::new())
            }
        };
        Ok(Self::new(config, store))
    }

    /// Returns the request handler.
    pub fn handler(&self) -> Arc<RequestHandler> {
        Arc::clone(&self.handler)
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Returns the number of stored notes.
    pub fn note_count(&self) -> ServerResult<usize> {
        Ok(self.context.store.count()?)
    }

    /// Builds the HTTP router.
    pub fn router(&self) -> Router {
        let config = &self.context.config;

        let api = Router::new()
            .route(
                "/note/:slug",
                get(get_note).put(save_note).post(save_note),
            )
            .fallback(not_found);

        let app = Router::new().nest("/api", api);
        let app = match &config.static_dir {
            Some(dir) => app.fallback_service(
                ServeDir::new(dir)
                    .append_index_html_on_directories(true)
                    .fallback(ServeFile::new(dir.join("index.html"))),
            ),
            None => app.fallback(not_found),
        };

        app.layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.handler))
    }

    /// Binds the configured address and serves until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.context.config.bind_addr).await?;
        self.serve_with(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails.
    pub async fn serve_with<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!("Notepad is running on http://{addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Notepad stopped");
        Ok(())
    }
}

async fn get_note(
    State(handler): State<Arc<RequestHandler>>,
    slug: Result<Path<String>, PathRejection>,
) -> ServerResult<Json<NoteResponse>> {
    let slug = route_slug(slug)?;
    run_blocking(move || handler.get(&slug)).await.map(Json)
}

async fn save_note(
    State(handler): State<Arc<RequestHandler>>,
    slug: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> ServerResult<Json<SaveResponse>> {
    let slug = route_slug(slug)?;
    run_blocking(move || handler.handle_save(&slug, &body))
        .await
        .map(Json)
}

async fn not_found(uri: Uri) -> ServerError {
    ServerError::NotFound(uri.path().to_string())
}

/// A route parameter that does not percent-decode to UTF-8 cannot be a
/// valid slug.
fn route_slug(slug: Result<Path<String>, PathRejection>) -> ServerResult<String> {
    match slug {
        Ok(Path(slug)) => Ok(slug),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "undecodable slug");
            Err(ProtocolError::invalid_slug(String::new()).into())
        }
    }
}

/// Runs a store call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ServerResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("handler task failed: {e}")))?
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
