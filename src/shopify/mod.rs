mod client;
mod session;
mod traits;

pub use client::ShopifyClient;
pub use session::{ApiVersion, Session, ShopDomain};
pub use traits::{AccessToken, ShopifyApi, Subscription, Webhook, APP_UNINSTALLED};
