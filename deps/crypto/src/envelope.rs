// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Payload envelope: AES-256-CBC with PKCS#7 padding, authenticated by
//! HMAC-SHA256 over the ciphertext.

use aes::Aes256;
use anyhow::{anyhow, Result};
use cipher::block_padding::Pkcs7;
use cipher::{BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::HashAlgorithm;

/// AES-256 key length.
pub const AES_KEY_LEN: usize = 32;
/// CBC initialisation vector length.
pub const IV_LEN: usize = 16;
/// Envelope HMAC key length.
pub const HMAC_KEY_LEN: usize = 16;
/// Serialised session-secret length (`aesKey || iv || hmacKey`).
pub const SESSION_SECRET_LEN: usize = AES_KEY_LEN + IV_LEN + HMAC_KEY_LEN;
/// HMAC-SHA256 tag length.
pub const TAG_LEN: usize = 32;

/// Per-request session key material. Created once per attestation request,
/// released into the credential blob, zeroised on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionSecret {
    aes_key: [u8; AES_KEY_LEN],
    iv: [u8; IV_LEN],
    hmac_key: [u8; HMAC_KEY_LEN],
}

impl SessionSecret {
    /// Draw fresh key material from the OS CSPRNG.
    pub fn generate() -> Result<Self> {
        let mut secret = SessionSecret {
            aes_key: [0u8; AES_KEY_LEN],
            iv: [0u8; IV_LEN],
            hmac_key: [0u8; HMAC_KEY_LEN],
        };
        OsRng
            .try_fill_bytes(&mut secret.aes_key)
            .and_then(|_| OsRng.try_fill_bytes(&mut secret.iv))
            .and_then(|_| OsRng.try_fill_bytes(&mut secret.hmac_key))
            .map_err(|e| anyhow!("drawing session secret: {e}"))?;
        Ok(secret)
    }

    /// The 64-byte concatenation released to the client through the
    /// credential blob's `encIdentity`.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Vec::with_capacity(SESSION_SECRET_LEN);
        out.extend_from_slice(&self.aes_key);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.hmac_key);
        Zeroizing::new(out)
    }

    /// Encrypt `payload` and tag the ciphertext.
    pub fn seal(&self, payload: &[u8]) -> Result<([u8; TAG_LEN], Vec<u8>)> {
        let ciphertext = cbc::Encryptor::<Aes256>::new_from_slices(&self.aes_key, &self.iv)
            .map_err(|e| anyhow!("illegal envelope key material: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(payload);

        let tag = HashAlgorithm::Sha256.hmac(&self.hmac_key, &[&ciphertext])?;
        let tag: [u8; TAG_LEN] = tag
            .try_into()
            .map_err(|_| anyhow!("unexpected envelope tag length"))?;

        Ok((tag, ciphertext))
    }
}
