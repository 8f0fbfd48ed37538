use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::session::{Session, ShopDomain};
use super::traits::{AccessToken, ShopifyApi, Subscription, Webhook};
use crate::error::InstallError;

/// `ShopifyApi` over HTTPS.
///
/// Quirks:
/// - The token endpoint is per shop, not a global authorization server.
/// - Admin REST calls authenticate with `X-Shopify-Access-Token`, not `Authorization`.
/// - Resource bodies are wrapped in a singular envelope (`{"webhook": {...}}`).
/// - A duplicate webhook subscription is a 422 validation error, not a conflict.
pub struct ShopifyClient {
    api_key: String,
    api_secret: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    webhook: Webhook,
}

impl ShopifyClient {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ShopifyApi for ShopifyClient {
    async fn request_token(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessToken, InstallError> {
        let url = format!("https://{shop}/admin/oauth/access_token");
        let resp = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(&json!({
                "client_id": self.api_key,
                "client_secret": self.api_secret,
                "code": code,
            }))
            .send()
            .await
            .map_err(|e| InstallError::Platform(format!("Token exchange request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(InstallError::Platform(format!(
                "Token exchange failed ({status}): {body}"
            )));
        }

        let token: AccessToken = resp
            .json()
            .await
            .map_err(|e| InstallError::Platform(format!("Failed to parse token response: {e}")))?;

        if token.access_token.is_empty() {
            return Err(InstallError::Platform("Token response had no access_token".into()));
        }

        Ok(token)
    }

    async fn create_webhook(
        &self,
        session: &Session,
        topic: &str,
        address: &str,
    ) -> Result<Subscription, InstallError> {
        let token = session
            .token
            .as_deref()
            .ok_or_else(|| InstallError::Internal("session has no access token".into()))?;

        let resp = self
            .http
            .post(session.admin_url("webhooks.json"))
            .header("X-Shopify-Access-Token", token)
            .json(&webhook_payload(topic, address))
            .send()
            .await
            .map_err(|e| InstallError::Platform(format!("Webhook request failed: {e}")))?;

        if resp.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!("webhook {topic} rejected as duplicate: {body}");
            return Ok(Subscription::AlreadyExists);
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(InstallError::Platform(format!(
                "Webhook creation failed ({status}): {body}"
            )));
        }

        let envelope: WebhookEnvelope = resp
            .json()
            .await
            .map_err(|e| InstallError::Platform(format!("Failed to parse webhook response: {e}")))?;

        Ok(Subscription::Created(envelope.webhook))
    }
}

fn webhook_payload(topic: &str, address: &str) -> serde_json::Value {
    json!({
        "webhook": {
            "topic": topic,
            "address": address,
            "format": "json",
        }
    })
}
