use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::{BTreeMap, HashMap};

use crate::error::InstallError;

type HmacSha256 = Hmac<Sha256>;

/// Signed requests older than this are refused.
const PARAMS_MAX_AGE_SECS: i64 = 24 * 3600;

/// Helper to create an HMAC instance, resolving trait ambiguity.
fn new_hmac(key: &[u8]) -> Result<HmacSha256, InstallError> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| InstallError::Crypto(format!("HMAC init failed: {e}")))
}

/// HMAC operations keyed by the app's client secret: Shopify request and
/// webhook signatures, plus signing of our own OAuth `state` parameter.
pub struct CryptoEngine {
    hmac_key: Vec<u8>,
}

impl CryptoEngine {
    pub fn new(api_secret: &str) -> Result<Self, InstallError> {
        if api_secret.is_empty() {
            return Err(InstallError::Crypto("API secret must not be empty".into()));
        }
        Ok(Self {
            hmac_key: api_secret.as_bytes().to_vec(),
        })
    }

    /// Check the `hmac` query parameter Shopify attaches to requests it
    /// redirects to the app.
    pub fn validate_params(&self, params: &HashMap<String, String>) -> bool {
        self.validate_params_at(params, Utc::now().timestamp())
    }

    fn validate_params_at(&self, params: &HashMap<String, String>, now: i64) -> bool {
        let fresh = params
            .get("timestamp")
            .and_then(|ts| ts.parse::<i64>().ok())
            .is_some_and(|ts| ts >= now - PARAMS_MAX_AGE_SECS);
        if !fresh {
            tracing::debug!("signed params missing or stale timestamp");
            return false;
        }

        let Some(expected) = params.get("hmac").and_then(|h| hex::decode(h).ok()) else {
            return false;
        };

        let Ok(mut mac) = new_hmac(&self.hmac_key) else {
            return false;
        };
        mac.update(signature_message(params).as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Compute the hex `hmac` value Shopify would send for `params`.
    pub fn sign_params(&self, params: &HashMap<String, String>) -> Result<String, InstallError> {
        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(signature_message(params).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify the `X-Shopify-Hmac-Sha256` header of a webhook delivery
    /// against the raw request body.
    pub fn verify_webhook(&self, body: &[u8], header: &str) -> bool {
        let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(header.trim()) else {
            return false;
        };
        let Ok(mut mac) = new_hmac(&self.hmac_key) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }

    /// base64 HMAC of a webhook body, as sent in `X-Shopify-Hmac-Sha256`.
    pub fn sign_webhook(&self, body: &[u8]) -> Result<String, InstallError> {
        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(body);
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Sign a state parameter with HMAC-SHA256. Returns base64(hmac || payload).
    pub fn sign_state(&self, payload: &str) -> Result<String, InstallError> {
        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        let mut combined = signature.to_vec();
        combined.extend_from_slice(payload.as_bytes());

        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&combined))
    }

    /// Verify and extract a signed state parameter.
    pub fn verify_state(&self, signed: &str) -> Result<String, InstallError> {
        let combined = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signed)
            .map_err(|_| InstallError::InvalidState)?;

        if combined.len() < 32 {
            return Err(InstallError::InvalidState);
        }

        let (signature, payload_bytes) = combined.split_at(32);

        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(payload_bytes);
        mac.verify_slice(signature)
            .map_err(|_| InstallError::InvalidState)?;

        String::from_utf8(payload_bytes.to_vec()).map_err(|_| InstallError::InvalidState)
    }
}

/// `key=value` pairs sorted by key and joined with `&`, excluding the
/// signature fields themselves. `%` and `&` are escaped everywhere and `=`
/// in keys so a value can't forge a pair boundary.
fn signature_message(params: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<String, String> = params
        .iter()
        .filter(|(k, _)| k.as_str() != "hmac" && k.as_str() != "signature")
        .map(|(k, v)| (escape(k).replace('=', "%3D"), escape(v)))
        .collect();

    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn escape(s: &str) -> String {
    s.replace('%', "%25").replace('&', "%26")
}
