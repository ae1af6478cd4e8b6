// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Cryptographic verification of a TPM quote against the expected nonce and
//! the client-declared PCR values.

use crypto::HashAlgorithm;
use ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::Signature;
use rsa::Pkcs1v15Sign;
use subtle::ConstantTimeEq;

use crate::error::AttestError;
use crate::tpm::{AkPublic, Attest, PcrFile, PublicKey, SigningScheme, TpmtSignature};

fn pkcs1v15_for(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
    }
}

/// Verify the quote end to end. All checks must pass; there is no partial
/// acceptance.
///
/// 1. Unmarshal, asserting magic and attest type.
/// 2. `extraData == nonce`, constant time.
/// 3. The quoted selection equals the selection implied by the PCR file.
/// 4. The quoted `pcrDigest` equals the digest recomputed over the client's
///    PCR values in canonical selection order.
/// 5. The signature verifies over the raw quote bytes under the AK, with
///    the AK's declared scheme.
pub fn verify_quote(
    ak: &AkPublic,
    quote: &[u8],
    sig: &[u8],
    nonce: &[u8],
    pcrs: &PcrFile,
) -> Result<Attest, AttestError> {
    let attest = Attest::parse(quote)?;

    if !bool::from(attest.extra_data.ct_eq(nonce)) {
        return Err(AttestError::BadQuote(
            "extraData does not match the expected nonce".to_string(),
        ));
    }

    if attest.pcr_selection != pcrs.selection {
        return Err(AttestError::BadQuote(
            "quoted PCR selection differs from the supplied PCR values".to_string(),
        ));
    }

    let signature = TpmtSignature::parse(sig)?;
    match (&ak.scheme, &signature) {
        (Some(SigningScheme::RsaSsa(h)), TpmtSignature::RsaSsa { hash, .. }) if h == hash => {}
        (Some(SigningScheme::EcDsa(h)), TpmtSignature::EcDsa { hash, .. }) if h == hash => {}
        _ => {
            return Err(AttestError::BadQuote(
                "signature scheme does not match the AK's declared scheme".to_string(),
            ))
        }
    }

    let preimage = pcrs.bank.digest_preimage(&attest.pcr_selection)?;
    let recomputed = signature.hash().digest(&preimage);
    if !bool::from(recomputed.ct_eq(&attest.pcr_digest)) {
        return Err(AttestError::BadQuote(
            "pcrDigest does not match the supplied PCR values".to_string(),
        ));
    }

    let digest = signature.hash().digest(quote);
    match (&ak.key, &signature) {
        (PublicKey::Rsa(key), TpmtSignature::RsaSsa { hash, signature: s }) => key
            .verify(pkcs1v15_for(*hash), &digest, s)
            .map_err(|e| AttestError::BadQuote(format!("RSA signature rejected: {e}")))?,
        (PublicKey::EcdsaP256(key), TpmtSignature::EcDsa { r, s, .. }) => {
            if r.len() != 32 || s.len() != 32 {
                return Err(AttestError::BadQuote(format!(
                    "P-256 signature with {}/{} byte scalars",
                    r.len(),
                    s.len()
                )));
            }
            let sig = Signature::from_scalars(
                p256::FieldBytes::clone_from_slice(r),
                p256::FieldBytes::clone_from_slice(s),
            )
            .map_err(|e| AttestError::BadQuote(format!("invalid ECDSA scalars: {e}")))?;
            key.verify_prehash(&digest, &sig)
                .map_err(|e| AttestError::BadQuote(format!("ECDSA signature rejected: {e}")))?
        }
        _ => {
            return Err(AttestError::BadQuote(
                "signature algorithm does not match the AK key type".to_string(),
            ))
        }
    }

    Ok(attest)
}
