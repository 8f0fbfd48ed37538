/// Shopify webhook delivery for `app/uninstalled`.
///
/// Shopify POSTs the shop JSON and signs the raw body:
/// `X-Shopify-Hmac-Sha256` = base64(HMAC-SHA256(body, app secret)).
/// A verified delivery clears the stored token.
use axum::{extract::State, http::HeaderMap, response::Json};
use serde_json::{json, Value};

use crate::shopify::APP_UNINSTALLED;
use crate::{error::InstallError, SharedState};

const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
const TOPIC_HEADER: &str = "x-shopify-topic";
const SHOP_HEADER: &str = "x-shopify-shop-domain";

/// POST /shopify_uninstall
pub async fn uninstall_webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<Value>, InstallError> {
    let signature = headers
        .get(HMAC_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("[Webhook:Shopify] missing {HMAC_HEADER} header");
            InstallError::Unauthorized
        })?;

    if !state.crypto.verify_webhook(&body, signature) {
        tracing::warn!("[Webhook:Shopify] signature mismatch; rejecting");
        return Err(InstallError::Unauthorized);
    }

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let shop = header(SHOP_HEADER).unwrap_or("unknown");

    // Deliveries without a topic header are taken to be the one topic we subscribe to.
    match header(TOPIC_HEADER) {
        Some(topic) if topic != APP_UNINSTALLED => {
            tracing::debug!("[Webhook:Shopify] unhandled topic {topic} from {shop}");
        }
        _ => {
            state.store.clear().await?;
            tracing::info!("[Webhook:Shopify] app uninstalled from {shop}; token cleared");
        }
    }

    Ok(Json(json!({ "received": true })))
}
