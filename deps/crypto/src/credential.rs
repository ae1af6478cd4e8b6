// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! TPM2 `MakeCredential` blob construction.
//!
//! Builds the credential-activation blob that binds a secret to an EK/AK
//! pair. Only the TPM holding the EK private key can recover the wrapped
//! seed, and `ActivateCredential` releases the secret only when the loaded
//! object's name equals the AK name baked into the KDF derivation.

use aes::Aes128;
use anyhow::anyhow;
use cfb_mode::Encryptor;
use cipher::{AsyncStreamCipher, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::kdf::{kdf_a, KDF_LABEL_INTEGRITY, KDF_LABEL_STORAGE};
use crate::HashAlgorithm;

/// OAEP label for credential seed protection (TPM 2.0 Part 1, Annex B.10.4).
/// The trailing NUL is part of the label.
const OAEP_LABEL_IDENTITY: &str = "IDENTITY\0";

/// Size of the random seed wrapped under the EK.
const CREDENTIAL_SEED_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The EK public key rejected the OAEP seed wrap.
    #[error("OAEP seed wrap rejected by endorsement key: {0}")]
    SeedWrap(#[source] rsa::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn oaep_for(alg: HashAlgorithm) -> Oaep {
    match alg {
        HashAlgorithm::Sha1 => Oaep::new_with_label::<Sha1, _>(OAEP_LABEL_IDENTITY),
        HashAlgorithm::Sha256 => Oaep::new_with_label::<Sha256, _>(OAEP_LABEL_IDENTITY),
        HashAlgorithm::Sha384 => Oaep::new_with_label::<Sha384, _>(OAEP_LABEL_IDENTITY),
        HashAlgorithm::Sha512 => Oaep::new_with_label::<Sha512, _>(OAEP_LABEL_IDENTITY),
    }
}

/// Build a `MakeCredential`-equivalent blob binding `secret` to the EK/AK
/// identity.
///
/// Returns `TPM2B_ID_OBJECT || TPM2B_ENCRYPTED_SECRET`, both length-prefixed,
/// ready to be fed to `TPM2_ActivateCredential` on the client.
pub fn make_credential(
    ek: &RsaPublicKey,
    name_alg: HashAlgorithm,
    ak_name: &[u8],
    secret: &[u8],
) -> Result<Vec<u8>, CredentialError> {
    let mut seed = Zeroizing::new([0u8; CREDENTIAL_SEED_LEN]);
    OsRng
        .try_fill_bytes(&mut seed[..])
        .map_err(|e| anyhow!("drawing credential seed: {e}"))?;

    let wrapped_seed = ek
        .encrypt(&mut OsRng, oaep_for(name_alg), &seed[..])
        .map_err(CredentialError::SeedWrap)?;

    // encIdentity = CFB(KDFa(seed, "STORAGE", akName), iv=0, TPM2B(secret))
    let sym_key = Zeroizing::new(
        kdf_a(name_alg, &seed[..], KDF_LABEL_STORAGE, ak_name, &[], 128)
            .map_err(CredentialError::Other)?,
    );
    let mut enc_identity = Vec::with_capacity(2 + secret.len());
    enc_identity.extend_from_slice(&(secret.len() as u16).to_be_bytes());
    enc_identity.extend_from_slice(secret);
    let iv = [0u8; 16];
    Encryptor::<Aes128>::new_from_slices(&sym_key, &iv)
        .map_err(|e| anyhow!("illegal CFB key material: {e}"))?
        .encrypt(&mut enc_identity);

    // outerHMAC = HMAC(KDFa(seed, "INTEGRITY"), encIdentity || akName)
    let hmac_key = Zeroizing::new(
        kdf_a(
            name_alg,
            &seed[..],
            KDF_LABEL_INTEGRITY,
            &[],
            &[],
            name_alg.digest_bits(),
        )
        .map_err(CredentialError::Other)?,
    );
    let outer_hmac = name_alg
        .hmac(&hmac_key, &[&enc_identity, ak_name])
        .map_err(CredentialError::Other)?;

    // TPM2B_ID_OBJECT carries a TPM2B_DIGEST followed by the raw encIdentity.
    let mut id_object = Vec::with_capacity(2 + outer_hmac.len() + enc_identity.len());
    id_object.extend_from_slice(&(outer_hmac.len() as u16).to_be_bytes());
    id_object.extend_from_slice(&outer_hmac);
    id_object.extend_from_slice(&enc_identity);

    let mut blob = Vec::with_capacity(2 + id_object.len() + 2 + wrapped_seed.len());
    blob.extend_from_slice(&(id_object.len() as u16).to_be_bytes());
    blob.extend_from_slice(&id_object);
    blob.extend_from_slice(&(wrapped_seed.len() as u16).to_be_bytes());
    blob.extend_from_slice(&wrapped_seed);

    Ok(blob)
}
