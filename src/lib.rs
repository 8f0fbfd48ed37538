pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod shopify;
pub mod store;
pub mod webhooks;

pub use config::Config;
pub use error::InstallError;

use std::sync::Arc;

/// Shared application state passed to all API handlers.
pub struct AppState {
    pub config: Config,
    pub store: store::TokenStore,
    pub crypto: crypto::CryptoEngine,
    pub nonces: crypto::NonceLedger,
    pub shopify: Box<dyn shopify::ShopifyApi>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire up crypto and storage from `config` around a Shopify API implementation.
    pub fn new(config: Config, shopify: Box<dyn shopify::ShopifyApi>) -> Result<Self, InstallError> {
        let engine = crypto::CryptoEngine::new(&config.api_secret)?;
        let cipher = config
            .token_encryption_key
            .as_deref()
            .map(crypto::TokenCipher::new)
            .transpose()?;
        let store = store::TokenStore::new(config.token_path.clone(), cipher);

        Ok(Self {
            config,
            store,
            crypto: engine,
            nonces: crypto::NonceLedger::new(),
            shopify,
        })
    }
}
