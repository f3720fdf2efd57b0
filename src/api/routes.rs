//! API routes

use crate::api::handlers::{
    create_shop_item, delete_shop_item, get_shop_item, health_check, list_shop_items,
    update_shop_item, AppState,
};
use crate::auth::handlers::{get_me, login, register};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Routes reachable without a token
pub fn build_public_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(state)
}

/// Routes behind bearer authentication
///
/// The auth layer is a route layer, so unknown paths still fall through
/// to the 404 fallback instead of answering 401.
pub fn build_protected_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/shopItem", get(list_shop_items).post(create_shop_item))
        .route(
            "/shopItem/:id",
            get(get_shop_item)
                .patch(update_shop_item)
                .delete(delete_shop_item),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}
