use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::session::{Session, ShopDomain};
use crate::error::InstallError;

/// Topic Shopify fires when a merchant removes the app.
pub const APP_UNINSTALLED: &str = "app/uninstalled";

/// Offline access token returned by the code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub scope: String,
}

/// A webhook subscription as the Admin API reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: u64,
    pub topic: String,
    pub address: String,
    #[serde(default)]
    pub format: String,
}

/// Outcome of subscribing to a webhook topic.
#[derive(Debug, Clone)]
pub enum Subscription {
    Created(Webhook),
    /// Shopify refused with 422: this address already listens to the topic.
    AlreadyExists,
}

/// The slice of Shopify's OAuth and Admin APIs the install flow needs.
#[async_trait]
pub trait ShopifyApi: Send + Sync {
    /// Exchange the authorization `code` from the callback for an access token.
    async fn request_token(&self, shop: &ShopDomain, code: &str)
        -> Result<AccessToken, InstallError>;

    /// Subscribe `address` to `topic`. The session must carry a token.
    async fn create_webhook(
        &self,
        session: &Session,
        topic: &str,
        address: &str,
    ) -> Result<Subscription, InstallError>;
}
