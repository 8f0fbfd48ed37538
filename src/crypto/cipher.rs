use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::Engine as _;
use rand::RngCore;

use crate::error::InstallError;

/// AES-256-GCM for the stored access token. Output is base64(nonce || ciphertext).
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Create a cipher from a base64-encoded 32-byte key.
    pub fn new(key_b64: &str) -> Result<Self, InstallError> {
        let key = base64::engine::general_purpose::STANDARD
            .decode(key_b64)
            .map_err(|e| InstallError::Crypto(format!("Invalid TOKEN_ENCRYPTION_KEY base64: {e}")))?;

        if key.len() != 32 {
            return Err(InstallError::Crypto(format!(
                "TOKEN_ENCRYPTION_KEY must be 32 bytes, got {}",
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| InstallError::Crypto(format!("Failed to init AES cipher: {e}")))?;

        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, InstallError> {
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| InstallError::Crypto(format!("Encryption failed: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
    }

    pub fn decrypt(&self, encrypted_b64: &str) -> Result<String, InstallError> {
        let combined = base64::engine::general_purpose::STANDARD
            .decode(encrypted_b64)
            .map_err(|e| InstallError::Crypto(format!("Invalid base64: {e}")))?;

        if combined.len() < 12 {
            return Err(InstallError::Crypto("Ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| InstallError::Crypto(format!("Decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| InstallError::Crypto(format!("Invalid UTF-8 after decrypt: {e}")))
    }
}
