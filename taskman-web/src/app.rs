/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskman_shared::repository::Repositories;
/// use taskman_web::{app::AppState, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Repositories::in_memory(), config, None)?;
/// let app = taskman_web::app::build_app(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{method_override::method_override, security::SecurityHeadersLayer},
    routes,
    views::Views,
};
use axum::{extract::Request, routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use taskman_shared::models::{Label, Status};
use taskman_shared::repository::Repositories;
use tower::{util::MapRequestLayer, Layer};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    compression::CompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,

    pub config: Arc<Config>,

    pub views: Arc<Views>,

    /// Present when running on PostgreSQL; used by the health check
    pub db: Option<PgPool>,
}

impl AppState {
    /// # Errors
    ///
    /// Fails when an embedded template does not compile.
    pub fn new(repos: Repositories, config: Config, db: Option<PgPool>) -> anyhow::Result<Self> {
        Ok(Self {
            repos,
            config: Arc::new(config),
            views: Arc::new(Views::new()?),
            db,
        })
    }
}

/// The router wrapped in the method override, ready to serve
pub type App = tower::util::MapRequest<Router, fn(Request) -> Request>;

/// Builds the router with all routes and middleware
///
/// ```text
/// /                         welcome page
/// /health                   JSON health check
/// /session/new, /session    sign in (POST), sign out (DELETE)
/// /users[/new|/:id/edit]    registration, profile edit and delete (owner only)
/// /statuses[...]            status CRUD (signed in)
/// /labels[...]              label CRUD (signed in)
/// /tasks[...]               task CRUD and filtered list (signed in)
/// ```
pub fn build_router(state: AppState) -> Router {
    use routes::{catalog, health, sessions, tasks, users, welcome};

    let session_routes = Router::new()
        .route("/new", get(sessions::new))
        .route("/", axum::routing::post(sessions::create).delete(sessions::delete));

    let user_routes = Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/new", get(users::new))
        .route("/:id/edit", get(users::edit))
        .route("/:id", axum::routing::patch(users::update).delete(users::delete));

    let task_routes = Router::new()
        .route("/", get(tasks::index).post(tasks::create))
        .route("/new", get(tasks::new))
        .route("/:id/edit", get(tasks::edit))
        .route(
            "/:id",
            get(tasks::show).patch(tasks::update).delete(tasks::delete),
        );

    Router::new()
        .route("/", get(welcome::index))
        .route("/health", get(health::health_check))
        .nest("/session", session_routes)
        .nest("/users", user_routes)
        .nest("/statuses", catalog_routes::<Status>())
        .nest("/labels", catalog_routes::<Label>())
        .nest("/tasks", task_routes)
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(SecurityHeadersLayer::new(state.config.session.secure_cookies))
        .with_state(state)
}

fn catalog_routes<E: routes::catalog::CatalogPage>() -> Router<AppState>
where
    E::New: validator::Validate,
    E::Patch: validator::Validate,
{
    use routes::catalog;

    Router::new()
        .route("/", get(catalog::index::<E>).post(catalog::create::<E>))
        .route("/new", get(catalog::new::<E>))
        .route("/:id/edit", get(catalog::edit::<E>))
        .route(
            "/:id",
            axum::routing::patch(catalog::update::<E>).delete(catalog::delete::<E>),
        )
}

/// Builds the router and puts the method override in front of routing
pub fn build_app(state: AppState) -> App {
    MapRequestLayer::new(method_override as fn(Request) -> Request).layer(build_router(state))
}
