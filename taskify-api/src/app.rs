/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskify_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskify_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
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

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// ├── /auth/                           # Authentication (public)
/// │   ├── POST /register
/// │   ├── POST /login
/// │   └── POST /logout
/// ├── /task/                           # Tasks (member or admin)
/// │   ├── GET    /list
/// │   ├── POST   /create               # member only
/// │   ├── PUT    /update/:id
/// │   └── DELETE /delete/:id
/// ├── /stats/                          # Statistics (member or admin)
/// │   └── GET /overview
/// ├── /admin/                          # Administration (admin only)
/// │   ├── GET   /dashboard/overview
/// │   ├── GET   /tasks
/// │   ├── PATCH /tasks/:task_id/assign
/// │   ├── POST  /users
/// │   ├── GET   /users
/// │   ├── PUT   /users/:id
/// │   ├── DELETE /users/:id
/// │   └── PATCH /users/:id/role
/// └── /users/                          # Legacy aliases (admin only)
///     ├── GET   /
///     └── PATCH /:id/role
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Access guard (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    // Task routes (members and admins); creation is member-only, since a
    // created task is always self-assigned
    let task_routes = Router::new()
        .route("/list", get(routes::tasks::list))
        .route("/update/:id", put(routes::tasks::update))
        .route("/delete/:id", delete(routes::tasks::delete))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_member_or_admin,
        ))
        .merge(
            Router::new()
                .route("/create", post(routes::tasks::create))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    auth::require_member,
                )),
        );

    // Stats routes (members and admins, scoped per role)
    let stats_routes = Router::new()
        .route("/overview", get(routes::stats::overview))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_member_or_admin,
        ));

    // Admin routes (admin only)
    let admin_routes = Router::new()
        .route(
            "/dashboard/overview",
            get(routes::admin::dashboard_overview),
        )
        .route("/tasks", get(routes::admin::list_tasks))
        .route("/tasks/:task_id/assign", patch(routes::admin::assign_task))
        .route(
            "/users",
            post(routes::admin::create_user).get(routes::admin::list_users),
        )
        .route(
            "/users/:id",
            put(routes::admin::update_user).delete(routes::admin::delete_user),
        )
        .route("/users/:id/role", patch(routes::admin::update_user_role))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    // Legacy user routes (admin only)
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id/role", patch(routes::users::update_user_role))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/task", task_routes)
        .nest("/stats", stats_routes)
        .nest("/admin", admin_routes)
        .nest("/users", user_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
