// Copyright (c) 2025 Alibaba Cloud
// Copyright (c) 2025 Intel Corporation
//
// SPDX-License-Identifier: Apache-2.0
//

use anyhow::{anyhow, Result};
use hmac::{Mac, SimpleHmac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::digest::core_api::BlockSizeUser;
use sha2::{Digest, Sha256, Sha384, Sha512};
use strum::{AsRefStr, Display, EnumString};

/// Hash algorithms carried in TPM structures, PCR banks and event logs.
///
/// Variants are declared in ascending TPM algorithm-identifier order so the
/// derived `Ord` matches the canonical wire ordering.
#[derive(
    EnumString,
    AsRefStr,
    Display,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[strum(serialize = "sha1")]
    Sha1,

    #[default]
    #[strum(serialize = "sha256")]
    Sha256,

    #[strum(serialize = "sha384")]
    Sha384,

    #[strum(serialize = "sha512")]
    Sha512,
}

fn hash_material<D: Digest>(material: &[u8]) -> Vec<u8> {
    D::new().chain_update(material).finalize().to_vec()
}

fn hmac_material<D: Digest + BlockSizeUser>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>> {
    let mut mac =
        SimpleHmac::<D>::new_from_slice(key).map_err(|e| anyhow!("illegal HMAC key: {e}"))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

impl HashAlgorithm {
    /// Return the hash value length in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Return the hash value length in bits
    pub fn digest_bits(&self) -> u16 {
        (self.digest_len() * 8) as u16
    }

    /// TPM 2.0 algorithm identifier (TPM_ALG_ID)
    pub fn tpm_alg_id(&self) -> u16 {
        match self {
            HashAlgorithm::Sha1 => 0x0004,
            HashAlgorithm::Sha256 => 0x000B,
            HashAlgorithm::Sha384 => 0x000C,
            HashAlgorithm::Sha512 => 0x000D,
        }
    }

    /// Map a TPM 2.0 algorithm identifier back to a hash algorithm.
    pub fn from_tpm_alg_id(id: u16) -> Option<Self> {
        match id {
            0x0004 => Some(HashAlgorithm::Sha1),
            0x000B => Some(HashAlgorithm::Sha256),
            0x000C => Some(HashAlgorithm::Sha384),
            0x000D => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    pub fn digest(&self, material: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => hash_material::<Sha1>(material),
            HashAlgorithm::Sha256 => hash_material::<Sha256>(material),
            HashAlgorithm::Sha384 => hash_material::<Sha384>(material),
            HashAlgorithm::Sha512 => hash_material::<Sha512>(material),
        }
    }

    /// HMAC over the concatenation of `parts` under `key`.
    pub fn hmac(&self, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>> {
        match self {
            HashAlgorithm::Sha1 => hmac_material::<Sha1>(key, parts),
            HashAlgorithm::Sha256 => hmac_material::<Sha256>(key, parts),
            HashAlgorithm::Sha384 => hmac_material::<Sha384>(key, parts),
            HashAlgorithm::Sha512 => hmac_material::<Sha512>(key, parts),
        }
    }

    /// Return a list of all supported hash algorithms.
    pub fn list_all() -> Vec<Self> {
        vec![
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_algorithm_from_str() {
        assert_eq!(
            "sha1".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha1
        );
        assert_eq!(
            "sha256".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha256
        );
        assert!("sha256-384".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_tpm_alg_id_round_trip() {
        for alg in HashAlgorithm::list_all() {
            assert_eq!(HashAlgorithm::from_tpm_alg_id(alg.tpm_alg_id()), Some(alg));
        }
        assert_eq!(HashAlgorithm::from_tpm_alg_id(0x0010), None);
    }

    #[test]
    fn test_digest_len() {
        assert_eq!(HashAlgorithm::Sha1.digest_len(), 20);
        assert_eq!(HashAlgorithm::Sha256.digest_len(), 32);
        assert_eq!(HashAlgorithm::Sha384.digest_len(), 48);
        assert_eq!(HashAlgorithm::Sha512.digest_len(), 64);
        assert_eq!(HashAlgorithm::Sha256.digest(b"x").len(), 32);
    }

    #[test]
    fn test_hmac_matches_known_vector() {
        // RFC 4231 test case 2
        let tag = HashAlgorithm::Sha256
            .hmac(b"Jefe", &[b"what do ya want ", b"for nothing?"])
            .unwrap();
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
