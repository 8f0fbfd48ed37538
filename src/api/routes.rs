//! Route handlers for the install flow.
//!
//! Every request Shopify redirects to us carries an `hmac` over its query
//! string. It is checked before anything else happens.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::crypto::NONCE_TTL_SECS;
use crate::error::InstallError;
use crate::shopify::{ApiVersion, Session, ShopDomain, Subscription, APP_UNINSTALLED};
use crate::webhooks::shopify as shopify_webhooks;
use crate::SharedState;

type Params = HashMap<String, String>;

pub fn install_router(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/shopify_install", get(app_launched))
        .route("/shopify_token", get(app_installed))
        .route(
            "/shopify_uninstall",
            get(app_uninstalled).post(shopify_webhooks::uninstall_webhook),
        )
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn status(State(state): State<SharedState>) -> impl IntoResponse {
    let installed = state.store.is_installed().await.unwrap_or_else(|e| {
        warn!("Could not read stored token: {e}");
        false
    });
    Json(json!({
        "status": "ok",
        "service": "shopify-install",
        "version": env!("CARGO_PKG_VERSION"),
        "installed": installed,
    }))
}

// =============================================================================
// Install
// =============================================================================

/// GET /shopify_install: send the merchant to the permission grant page.
async fn app_launched(
    State(state): State<SharedState>,
    Query(params): Query<Params>,
) -> Result<Response, InstallError> {
    require_signed(&state, &params)?;
    let shop = resolve_shop(&state, &params)?;

    match state.store.is_installed().await {
        Ok(true) => info!(%shop, "App was already authenticated"),
        Ok(false) => {}
        Err(e) => warn!(%shop, "Could not read stored token: {e}"),
    }

    let version = ApiVersion::parse(&state.config.api_version).inspect_err(|e| {
        error!("Unsupported API version has been configured: {e}");
    })?;
    let session = Session::new(shop.clone(), version);

    let now = Utc::now().timestamp();
    let nonce = state.nonces.issue(now).await;
    let signed_state = state.crypto.sign_state(&format!("{shop}:{nonce}:{now}"))?;

    let permission_url = session.create_permission_url(
        &state.config.api_key,
        &state.config.scopes,
        &state.config.auth_callback_url(),
        &signed_state,
    );

    info!(%shop, "Redirecting to permission grant page");
    Ok(found(permission_url))
}

// =============================================================================
// OAuth callback
// =============================================================================

/// GET /shopify_token: exchange the code, store the token, subscribe to uninstall.
async fn app_installed(
    State(state): State<SharedState>,
    Query(params): Query<Params>,
) -> Result<Response, InstallError> {
    require_signed(&state, &params)?;
    let shop = resolve_shop(&state, &params)?;

    let code = params
        .get("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| InstallError::BadRequest("missing code".into()))?;
    let signed_state = params.get("state").ok_or(InstallError::InvalidState)?;

    let now = Utc::now().timestamp();
    let install_state = InstallState::parse(&state.crypto.verify_state(signed_state)?)?;

    if now - install_state.issued_at > NONCE_TTL_SECS {
        return Err(InstallError::BadRequest("install session expired".into()));
    }
    if install_state.shop != shop.as_str() {
        warn!(%shop, state_shop = %install_state.shop, "state issued for another shop");
        return Err(InstallError::InvalidState);
    }
    if !state.nonces.consume(&install_state.nonce, now).await {
        warn!(%shop, "state nonce unknown or already used");
        return Err(InstallError::InvalidState);
    }

    let version = ApiVersion::parse(&state.config.api_version)?;

    let token = state.shopify.request_token(&shop, code).await?;
    state.store.save(&token.access_token).await?;
    info!(%shop, scope = %token.scope, "Access token obtained and stored");

    let session = Session::with_token(shop.clone(), version, token.access_token);
    let subscription = state
        .shopify
        .create_webhook(&session, APP_UNINSTALLED, &state.config.uninstall_callback_url())
        .await
        .inspect_err(|e| error!(%shop, "Uninstall webhook registration failed: {e}"))?;
    match subscription {
        Subscription::Created(webhook) => {
            info!(%shop, webhook_id = webhook.id, topic = %webhook.topic, "Uninstall webhook registered");
        }
        Subscription::AlreadyExists => {
            info!(%shop, "Uninstall webhook already registered");
        }
    }

    Ok(found(state.config.post_install_url(shop.as_str())))
}

// =============================================================================
// Uninstall
// =============================================================================

/// GET /shopify_uninstall: signed redirect variant; forget the token.
async fn app_uninstalled(
    State(state): State<SharedState>,
    Query(params): Query<Params>,
) -> Result<Response, InstallError> {
    require_signed(&state, &params)?;
    let shop = resolve_shop(&state, &params)?;

    state.store.clear().await?;
    info!(%shop, "Uninstall request");

    Ok(found(state.config.post_install_url(shop.as_str())))
}

// =============================================================================
// Helpers
// =============================================================================

/// `shop:nonce:issued_at`, as carried (signed) in the OAuth `state` parameter.
#[derive(Debug, PartialEq)]
struct InstallState {
    shop: String,
    nonce: String,
    issued_at: i64,
}

impl InstallState {
    fn parse(raw: &str) -> Result<Self, InstallError> {
        let mut parts = raw.splitn(3, ':');
        let (Some(shop), Some(nonce), Some(issued_at)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(InstallError::InvalidState);
        };
        let issued_at = issued_at.parse().map_err(|_| InstallError::InvalidState)?;

        Ok(Self {
            shop: shop.to_string(),
            nonce: nonce.to_string(),
            issued_at,
        })
    }
}

fn require_signed(state: &SharedState, params: &Params) -> Result<(), InstallError> {
    if !state.crypto.validate_params(params) {
        error!("Invalid params received");
        return Err(InstallError::InvalidParams("hmac validation failed".into()));
    }
    Ok(())
}

/// The `shop` query parameter, or the configured shop when absent.
fn resolve_shop(state: &SharedState, params: &Params) -> Result<ShopDomain, InstallError> {
    let raw = params
        .get("shop")
        .map(String::as_str)
        .unwrap_or(&state.config.shop_name);
    ShopDomain::parse(raw)
}

/// 302, the status Shopify's embedded-app redirects expect.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_state_parse() {
        let parsed = InstallState::parse("demo.myshopify.com:ab12:1700000000").unwrap();
        assert_eq!(
            parsed,
            InstallState {
                shop: "demo.myshopify.com".into(),
                nonce: "ab12".into(),
                issued_at: 1_700_000_000,
            }
        );
    }

    #[test]
    fn test_install_state_rejects_malformed() {
        assert!(InstallState::parse("demo.myshopify.com:ab12").is_err());
        assert!(InstallState::parse("demo.myshopify.com:ab12:soon").is_err());
        assert!(InstallState::parse("").is_err());
    }

    #[test]
    fn test_found_sets_location() {
        let resp = found("https://demo.myshopify.com/admin/apps/".into());
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers()[header::LOCATION],
            "https://demo.myshopify.com/admin/apps/"
        );
    }
}
