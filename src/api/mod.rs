//! HTTP surface of the install flow:
//! - /shopify_install: redirect the merchant to the grant page
//! - /shopify_token: OAuth callback, token exchange, webhook registration
//! - /shopify_uninstall: clear the stored token
//! - /status: health check

pub mod routes;

use crate::SharedState;
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: SharedState) -> Router {
    routes::install_router(state).layer(TraceLayer::new_for_http())
}
