/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware. Project-scoped route groups sit behind the session
/// middleware; the per-project permission gate runs inside each handler with
/// that handler's allowed-role set.

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::auth::session;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token verification
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                # Health check (public)
/// └── /api/v1/                               # API v1 (session required)
///     ├── /tasks/
///     │   ├── GET/POST   /:project_id               # list / create
///     │   ├── GET/PUT/DELETE /:project_id/t/:task_id # detail / patch / delete
///     │   ├── POST       /:project_id/t/:task_id/subtasks
///     │   └── PUT/DELETE /:project_id/st/:subtask_id
///     └── /notes/
///         ├── GET/POST   /:project_id
///         └── GET/PUT/DELETE /:project_id/n/:note_id
/// ```
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let task_routes = Router::new()
        .route(
            "/:project_id",
            get(routes::tasks::get_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:project_id/t/:task_id",
            get(routes::tasks::get_task_by_id)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:project_id/t/:task_id/subtasks",
            post(routes::tasks::create_subtask),
        )
        .route(
            "/:project_id/st/:subtask_id",
            put(routes::tasks::update_subtask).delete(routes::tasks::delete_subtask),
        );

    let note_routes = Router::new()
        .route(
            "/:project_id",
            get(routes::notes::get_notes).post(routes::notes::create_note),
        )
        .route(
            "/:project_id/n/:note_id",
            get(routes::notes::get_note_by_id)
                .put(routes::notes::update_note)
                .delete(routes::notes::delete_note),
        );

    // All project-scoped routes require a resolved session
    let v1_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/notes", note_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Session middleware
///
/// Resolves the caller from the `accessToken` cookie or the Authorization
/// header and injects a `CurrentUser` into request extensions. Rejects with
/// 401 before any handler runs when the credential is missing or invalid.
async fn session_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session::resolve_from_headers(&state.db, state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
