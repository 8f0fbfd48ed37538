//! Request signature checks, OAuth state signing and token encryption at rest.

mod cipher;
mod engine;
mod nonce;

pub use cipher::TokenCipher;
pub use engine::CryptoEngine;
pub use nonce::{NonceLedger, NONCE_TTL_SECS};
