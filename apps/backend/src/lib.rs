pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exercise_core::MissingChildPolicy;

use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// How resolution treats components whose child exercise was deleted
    pub missing_child_policy: MissingChildPolicy,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let missing_child_policy = missing_child_policy_from_env();

    let state = AppState {
        db: Arc::new(db),
        missing_child_policy,
    };

    let app = build_router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    // Admin routes get the admin guard on top of the shared auth layer
    let admin_routes = Router::new()
        .route("/api/admin/users", get(routes::admin::list_users))
        .route("/api/admin/users/:id", put(routes::admin::update_user))
        .route("/api/admin/users/:id", delete(routes::admin::delete_user))
        .layer(middleware::from_fn(routes::auth::require_admin));

    let protected_routes = Router::new()
        // Account routes
        .route("/api/account/password", put(routes::users::change_password))
        .route("/api/account", delete(routes::users::deactivate))
        // Exercise routes
        .route("/api/exercises", get(routes::exercises::list))
        .route("/api/exercises", post(routes::exercises::create))
        .route("/api/exercises/:id", get(routes::exercises::get))
        .route("/api/exercises/:id", put(routes::exercises::update))
        .route("/api/exercises/:id", delete(routes::exercises::delete))
        .route("/api/exercises/:id/compound", get(routes::exercises::get_compound))
        .route("/api/exercises/:id/assignable", get(routes::exercises::list_assignable))
        // Component routes
        .route("/api/exercises/:id/components", post(routes::exercises::add_component))
        .route("/api/components/swap", post(routes::exercises::swap_components))
        .route("/api/components/:id", put(routes::exercises::update_component))
        .route("/api/components/:id", delete(routes::exercises::remove_component))
        // Routine routes
        .route("/api/routines", get(routes::routines::list))
        .route("/api/routines", post(routes::routines::create))
        .route("/api/routines/:id", get(routes::routines::get))
        .route("/api/routines/:id", put(routes::routines::update))
        .route("/api/routines/:id", delete(routes::routines::delete))
        .route("/api/routines/:id/exercises", post(routes::routines::add_exercise))
        .route("/api/routines/:id/reorder", put(routes::routines::reorder))
        .route("/api/routines/:id/duplicate", post(routes::routines::duplicate))
        .route("/api/routine-exercises/:id", put(routes::routines::update_exercise))
        .route("/api/routine-exercises/:id", delete(routes::routines::remove_exercise))
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(routes::users::register))
        .route("/api/auth/login", post(routes::users::login))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolution policy for dangling child references, from the environment.
fn missing_child_policy_from_env() -> MissingChildPolicy {
    std::env::var("MISSING_CHILD_POLICY")
        .ok()
        .and_then(|v| MissingChildPolicy::from_str(&v))
        .unwrap_or_default()
}

async fn health_check() -> &'static str {
    "OK"
}
