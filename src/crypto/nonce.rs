use rand::RngCore;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// How long an issued nonce stays redeemable.
pub const NONCE_TTL_SECS: i64 = 10 * 60;

/// Nonces handed out with install redirects. Each can be redeemed once, by the
/// matching OAuth callback, within [`NONCE_TTL_SECS`].
#[derive(Default)]
pub struct NonceLedger {
    issued: Mutex<HashMap<String, i64>>,
}

impl NonceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a nonce issued at `now` (unix seconds).
    pub async fn issue(&self, now: i64) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let nonce = hex::encode(bytes);

        let mut issued = self.issued.lock().await;
        issued.retain(|_, at| now - *at <= NONCE_TTL_SECS);
        issued.insert(nonce.clone(), now);
        nonce
    }

    /// Redeem `nonce`. False if it was never issued, already used, or expired.
    pub async fn consume(&self, nonce: &str, now: i64) -> bool {
        match self.issued.lock().await.remove(nonce) {
            Some(at) => now - at <= NONCE_TTL_SECS,
            None => false,
        }
    }
}
