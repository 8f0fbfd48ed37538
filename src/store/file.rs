//! Single-file token store.
//!
//! One shop, one token: the file holds the access token (optionally
//! AES-GCM encrypted) or nothing. An empty or missing file means the app is
//! not installed.

use std::path::{Path, PathBuf};

use crate::crypto::TokenCipher;
use crate::error::InstallError;

pub struct TokenStore {
    path: PathBuf,
    cipher: Option<TokenCipher>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>, cipher: Option<TokenCipher>) -> Self {
        Self {
            path: path.into(),
            cipher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored token, if any.
    pub async fn load(&self) -> Result<Option<String>, InstallError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        match &self.cipher {
            Some(cipher) => cipher.decrypt(raw).map(Some),
            None => Ok(Some(raw.to_string())),
        }
    }

    /// Replace whatever is stored with `token`.
    pub async fn save(&self, token: &str) -> Result<(), InstallError> {
        let contents = match &self.cipher {
            Some(cipher) => cipher.encrypt(token)?,
            None => token.to_string(),
        };
        tokio::fs::write(&self.path, contents).await?;
        tracing::debug!(path = %self.path.display(), "access token stored");
        Ok(())
    }

    /// Forget the token. The file is truncated, not removed.
    pub async fn clear(&self) -> Result<(), InstallError> {
        tokio::fs::write(&self.path, b"").await?;
        tracing::debug!(path = %self.path.display(), "access token cleared");
        Ok(())
    }

    pub async fn is_installed(&self) -> Result<bool, InstallError> {
        Ok(self.load().await?.is_some())
    }
}
