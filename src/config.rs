use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_SCOPES: &str =
    "write_script_tags,read_script_tags,read_products,read_customers,read_orders,read_discounts";

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,
    /// Public URL Shopify calls back into (no trailing slash).
    pub base_url: String,

    // ── Shopify app ─────────────────────────────────────────────────────
    pub api_key: String,
    /// Client secret. Also the HMAC key for request validation and state signing.
    pub api_secret: String,
    /// Shop used when a request carries no `shop` parameter.
    pub shop_name: String,
    pub api_version: String,
    pub scopes: Vec<String>,

    // ── Storage ─────────────────────────────────────────────────────────
    pub token_path: PathBuf,
    /// 32-byte base64-encoded key for AES-256-GCM at rest. Plaintext file when unset.
    pub token_encryption_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("APP_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("Invalid PORT")?,
            base_url,

            api_key: std::env::var("SHOPIFY_API_KEY")
                .context("SHOPIFY_API_KEY is required")?,
            api_secret: std::env::var("SHOPIFY_API_SECRET")
                .context("SHOPIFY_API_SECRET is required")?,
            shop_name: std::env::var("SHOPIFY_SHOP_NAME")
                .context("SHOPIFY_SHOP_NAME is required (e.g. my-shop)")?,
            api_version: std::env::var("SHOPIFY_API_VERSION")
                .unwrap_or_else(|_| "2020-07".into()),
            scopes: parse_scopes(
                &std::env::var("SHOPIFY_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.into()),
            ),

            token_path: std::env::var("TOKEN_PATH")
                .unwrap_or_else(|_| "ACCESS_TOKEN.txt".into())
                .into(),
            token_encryption_key: std::env::var("TOKEN_ENCRYPTION_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
        })
    }

    /// Where Shopify sends the merchant after they grant permissions.
    pub fn auth_callback_url(&self) -> String {
        format!("{}/shopify_token", self.base_url)
    }

    /// Address registered for the `app/uninstalled` webhook.
    pub fn uninstall_callback_url(&self) -> String {
        format!("{}/shopify_uninstall", self.base_url)
    }

    /// The shop admin's app list, where the merchant lands after install.
    pub fn post_install_url(&self, shop: &str) -> String {
        format!("https://{shop}/admin/apps/")
    }
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
