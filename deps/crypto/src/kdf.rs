// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! TPM 2.0 KDFa (SP800-108 counter-mode KDF, TPM 2.0 Part 1 §11.4.10.2).

use anyhow::Result;

use crate::HashAlgorithm;

/// KDFa label used to derive the credential symmetric key.
pub const KDF_LABEL_STORAGE: &str = "STORAGE";
/// KDFa label used to derive the credential integrity HMAC key.
pub const KDF_LABEL_INTEGRITY: &str = "INTEGRITY";

/// Derive `bits` bits of key material.
///
/// Each iteration computes
/// `HMAC(key, be32(counter) || label || 0x00 || context_u || context_v || be32(bits))`
/// with the counter starting at 1. When `bits` is not a whole number of
/// octets, the excess leading bits of the first octet are masked off.
pub fn kdf_a(
    alg: HashAlgorithm,
    key: &[u8],
    label: &str,
    context_u: &[u8],
    context_v: &[u8],
    bits: u16,
) -> Result<Vec<u8>> {
    let bytes_needed = (usize::from(bits) + 7) / 8;
    let bits_be = u32::from(bits).to_be_bytes();

    let mut out = Vec::with_capacity(bytes_needed);
    let mut counter: u32 = 0;
    while out.len() < bytes_needed {
        counter += 1;
        let block = alg.hmac(
            key,
            &[
                &counter.to_be_bytes(),
                label.as_bytes(),
                &[0u8],
                context_u,
                context_v,
                &bits_be,
            ],
        )?;
        out.extend_from_slice(&block);
    }
    out.truncate(bytes_needed);

    let partial = bits % 8;
    if partial != 0 {
        out[0] &= (1u8 << partial) - 1;
    }

    Ok(out)
}
