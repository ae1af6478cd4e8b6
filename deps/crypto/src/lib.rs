// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Cryptographic primitives shared across the attestation server: the hash
//! algorithm registry, the TPM 2.0 KDFa, `MakeCredential` blob construction
//! and the sealed-payload envelope.

pub mod algorithms;
pub mod credential;
pub mod envelope;
pub mod kdf;

pub use algorithms::HashAlgorithm;
pub use credential::{make_credential, CredentialError};
pub use envelope::{SessionSecret, SESSION_SECRET_LEN, TAG_LEN};
pub use kdf::kdf_a;
