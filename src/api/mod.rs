mod handlers;
mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub use middleware::{Caller, SecurityConfig, StaticTokens, TokenVerifier};

/// Build the API router with tokens loaded from the environment.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, SecurityConfig::from_env())
}

pub fn create_router_with_config(db: Database, config: SecurityConfig) -> Router {
    let protected = Router::new()
        // Current user
        .route("/user", get(handlers::get_current_user).put(handlers::update_current_user))
        .route("/users/{user_id}", get(handlers::get_user))
        // Goals
        .route("/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route(
            "/goals/{goal_id}",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .delete(handlers::delete_goal),
        )
        // Logs
        .route(
            "/goals/{goal_id}/logs",
            get(handlers::list_logs).post(handlers::create_log),
        )
        .route(
            "/goals/{goal_id}/logs/{log_id}",
            put(handlers::update_log).delete(handlers::delete_log),
        )
        .route_layer(from_fn_with_state(config, middleware::auth_middleware));

    let api = Router::new()
        .merge(protected)
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
