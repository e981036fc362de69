use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{AuthConfig, Config, ServerConfig};
use crate::db::Store;

pub mod auth;
mod categories;
mod error;
mod products;
mod types;
mod users;

pub use error::{ApiError, FieldError, StandardError};
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub auth: AuthConfig,

    pub server: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            auth: config.auth.clone(),
            server: config.server.clone(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/oauth/token", post(auth::issue_token))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .route("/categories", get(categories::list_categories))
        .route("/categories/{id}", get(categories::get_category));

    let catalog_write_routes = Router::new()
        .route("/products", post(products::create_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}", delete(products::delete_product))
        .route("/categories", post(categories::create_category))
        .route("/categories/{id}", put(categories::update_category))
        .route("/categories/{id}", delete(categories::delete_category))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_operator_or_admin,
        ));

    let user_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let cors_origins = &state.server.cors_allowed_origins;
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(public_routes)
        .merge(catalog_write_routes)
        .merge(user_routes)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(error::standard_error_body))
}
