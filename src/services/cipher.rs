// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Encryption of OAuth tokens at rest.
//!
//! Tokens are sealed with AES-256-GCM under a key derived from the server
//! secret via HKDF-SHA256. Each value is bound to its owning user through the
//! associated data, so a ciphertext copied onto another user's row will not
//! open. Stored format: base64url(nonce || ciphertext || tag).

use crate::error::AppError;
use anyhow::anyhow;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hkdf::Hkdf;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::sync::Arc;

const HKDF_SALT: &[u8] = b"scheduler-api/token-cipher";
const HKDF_INFO: &[u8] = b"google-oauth-tokens:v1";

/// Bytes of entropy in an OAuth state token.
pub const STATE_TOKEN_BYTES: usize = 32;

/// Symmetric cipher for credential storage.
#[derive(Clone)]
pub struct TokenCipher {
    key: Arc<LessSafeKey>,
    rng: SystemRandom,
}

impl TokenCipher {
    /// Derive the cipher key from the server secret.
    pub fn from_secret(secret: &str) -> anyhow::Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("token cipher secret must not be empty");
        }

        let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
        let mut key_bytes = [0u8; 32];
        hkdf.expand(HKDF_INFO, &mut key_bytes)
            .map_err(|_| anyhow!("HKDF expand failed"))?;

        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| anyhow!("invalid AES-256-GCM key"))?;

        Ok(Self {
            key: Arc::new(LessSafeKey::new(unbound)),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt `plaintext` for `user_id`.
    pub fn encrypt(&self, plaintext: &str, user_id: i64) -> Result<String, AppError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| AppError::Internal(anyhow!("system RNG failure")))?;

        let mut sealed = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(associated_data(user_id)),
                &mut sealed,
            )
            .map_err(|_| AppError::Internal(anyhow!("token encryption failed")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt) for the same user.
    ///
    /// Returns `None` for malformed, tampered, or foreign ciphertext.
    pub fn decrypt(&self, token: &str, user_id: i64) -> Option<String> {
        let raw = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return None;
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).ok()?;
        let mut buffer = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::from(associated_data(user_id)), &mut buffer)
            .ok()?;

        String::from_utf8(plaintext.to_vec()).ok()
    }

    /// Decrypt an optional stored column.
    pub fn decrypt_opt(&self, token: Option<&str>, user_id: i64) -> Option<String> {
        token.and_then(|t| self.decrypt(t, user_id))
    }

    /// Random URL-safe token (used for OAuth `state`).
    pub fn random_token(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; STATE_TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow!("system RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

fn associated_data(user_id: i64) -> String {
    format!("user_id:{user_id}")
}
