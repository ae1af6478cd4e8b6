// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

use crypto::HashAlgorithm;
use thiserror::Error;

/// Fault taxonomy of the attestation pipeline.
///
/// The inner strings are operator diagnostics; clients only ever see the
/// stable reason phrase from [`AttestError::reason`] and the HTTP status
/// from [`AttestError::status`].
#[derive(Debug, Error)]
pub enum AttestError {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("attestation key rejected: {0}")]
    BadAk(String),

    #[error("quote rejected: {0}")]
    BadQuote(String),

    #[error("event log does not carry algorithm {0}")]
    InvalidEventlogAlg(HashAlgorithm),

    #[error("event log replay mismatch: {0}")]
    BadEventlog(String),

    #[error("endorsement key rejected: {0}")]
    BadEk(String),

    #[error("policy verifier rejected the device: {0}")]
    VerifyFailed(String),

    #[error("sealing failed: {0}")]
    Sealing(String),
}

impl AttestError {
    /// HTTP status the orchestrator maps this fault to.
    pub fn status(&self) -> u16 {
        match self {
            AttestError::Sealing(_) => 500,
            _ => 403,
        }
    }

    /// Stable reason phrase sent in the response body.
    pub fn reason(&self) -> String {
        match self {
            AttestError::MissingField(field) => format!("MISSING_FIELD:{field}"),
            AttestError::Malformed(_) => "MALFORMED".to_string(),
            AttestError::BadAk(_) => "BAD_AK".to_string(),
            AttestError::BadQuote(_) => "BAD_QUOTE".to_string(),
            AttestError::InvalidEventlogAlg(alg) => format!("INVALID_EVENTLOG_ALG:{alg}"),
            AttestError::BadEventlog(_) => "BAD_EVENTLOG".to_string(),
            AttestError::BadEk(_) => "BAD_EK".to_string(),
            AttestError::VerifyFailed(_) => "VERIFY_FAILED".to_string(),
            AttestError::Sealing(_) => "SEALING_FAILED".to_string(),
        }
    }
}
