// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Hand-marshalled TPM fixtures shared across the crate's tests.

use crypto::HashAlgorithm;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};

/// fixedTPM | stClear | fixedParent | sensitiveDataOrigin | userWithAuth |
/// restricted | sign
pub const REQUIRED_AK_ATTRS: u32 = 0x0005_0076;

/// Marshal a TPMT_PUBLIC for an RSA-2048 signing key (RSASSA/SHA-256,
/// SHA-256 name-alg).
pub fn rsa_public_bytes(modulus: &[u8], attrs: u32) -> Vec<u8> {
    rsa_public_bytes_with_bits(modulus, attrs, 2048)
}

pub fn rsa_public_bytes_with_bits(modulus: &[u8], attrs: u32, key_bits: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001u16.to_be_bytes()); // TPM_ALG_RSA
    out.extend_from_slice(&0x000Bu16.to_be_bytes()); // nameAlg = SHA-256
    out.extend_from_slice(&attrs.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // empty authPolicy
    out.extend_from_slice(&0x0010u16.to_be_bytes()); // symmetric = TPM_ALG_NULL
    out.extend_from_slice(&0x0014u16.to_be_bytes()); // scheme = TPM_ALG_RSASSA
    out.extend_from_slice(&0x000Bu16.to_be_bytes()); // scheme hash = SHA-256
    out.extend_from_slice(&key_bits.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // exponent default (65537)
    out.extend_from_slice(&(modulus.len() as u16).to_be_bytes());
    out.extend_from_slice(modulus);
    out
}

/// Marshal a TPML_PCR_SELECTION. The bitmap's bit `n` selects PCR `n`.
pub fn selection_bytes(selections: &[(HashAlgorithm, u32)]) -> Vec<u8> {
    let mut out = (selections.len() as u32).to_be_bytes().to_vec();
    for (alg, bitmap) in selections {
        out.extend_from_slice(&alg.tpm_alg_id().to_be_bytes());
        out.push(3);
        out.extend_from_slice(&bitmap.to_le_bytes()[..3]);
    }
    out
}

/// Marshal a TPMS_ATTEST quote body.
pub fn attest_bytes(
    extra: &[u8],
    selections: &[(HashAlgorithm, u32)],
    pcr_digest: &[u8],
) -> Vec<u8> {
    let mut out = 0xFF54_4347u32.to_be_bytes().to_vec();
    out.extend_from_slice(&0x8018u16.to_be_bytes());

    let signer = [0x11u8; 34]; // opaque qualified-signer name
    out.extend_from_slice(&(signer.len() as u16).to_be_bytes());
    out.extend_from_slice(&signer);

    out.extend_from_slice(&(extra.len() as u16).to_be_bytes());
    out.extend_from_slice(extra);

    out.extend_from_slice(&77u64.to_be_bytes()); // clock
    out.extend_from_slice(&3u32.to_be_bytes()); // resetCount
    out.extend_from_slice(&1u32.to_be_bytes()); // restartCount
    out.push(1); // safe
    out.extend_from_slice(&0x2020_0312u64.to_be_bytes()); // firmwareVersion

    out.extend_from_slice(&selection_bytes(selections));
    out.extend_from_slice(&(pcr_digest.len() as u16).to_be_bytes());
    out.extend_from_slice(pcr_digest);
    out
}

/// Marshal a `.pcr` file: selection header plus digests in canonical order.
/// `values` must be sorted by ascending index.
pub fn pcr_file_bytes(alg: HashAlgorithm, values: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut bitmap = 0u32;
    for (index, _) in values {
        bitmap |= 1 << index;
    }
    let mut out = selection_bytes(&[(alg, bitmap)]);
    for (_, value) in values {
        out.extend_from_slice(value);
    }
    out
}

/// A synthetic attesting device: a fresh RSA AK plus a quote it signed.
pub struct TestDevice {
    pub ak_pub: Vec<u8>,
    pub quote: Vec<u8>,
    pub sig: Vec<u8>,
    pub pcr: Vec<u8>,
    pub qualified_signer_len: usize,
}

impl TestDevice {
    /// Quote the given SHA-256 PCR values (sorted by index) under a fresh
    /// RSA-2048 AK, binding `nonce` as extraData.
    pub fn new(nonce: &[u8], pcr_values: &[(u8, Vec<u8>)]) -> Self {
        let key = RsaPrivateKey::new(&mut OsRng, 2048).expect("generate test AK");
        let modulus = key.n().to_bytes_be();
        let ak_pub = rsa_public_bytes(&modulus, REQUIRED_AK_ATTRS);

        let mut bitmap = 0u32;
        let mut preimage = Vec::new();
        for (index, value) in pcr_values {
            bitmap |= 1 << index;
            preimage.extend_from_slice(value);
        }
        let pcr_digest = HashAlgorithm::Sha256.digest(&preimage);

        let quote = attest_bytes(nonce, &[(HashAlgorithm::Sha256, bitmap)], &pcr_digest);

        let digest = HashAlgorithm::Sha256.digest(&quote);
        let signature = key
            .sign(Pkcs1v15Sign::new::<sha2::Sha256>(), &digest)
            .expect("sign test quote");

        let mut sig = vec![0x00, 0x14, 0x00, 0x0B]; // RSASSA / SHA-256
        sig.extend_from_slice(&(signature.len() as u16).to_be_bytes());
        sig.extend_from_slice(&signature);

        TestDevice {
            ak_pub,
            quote,
            sig,
            pcr: pcr_file_bytes(HashAlgorithm::Sha256, pcr_values),
            qualified_signer_len: 34,
        }
    }
}
