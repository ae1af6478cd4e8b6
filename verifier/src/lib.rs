// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Attestation verifier core.
//!
//! A client proves its TPM holds a quoted PCR state and receives a payload
//! sealed to its EK/AK identity. The pipeline is forward-only and
//! single-shot:
//!
//! `Receive → ValidateInputs → ParseAK → ValidateAK → ValidateQuote →
//! ValidateEventLog → InvokePolicy → Seal → Respond`
//!
//! Every request owns its state; nothing persists across requests and
//! parallel requests share no locks.

use std::path::PathBuf;

use crypto::envelope::TAG_LEN;
use crypto::{make_credential, CredentialError, SessionSecret};
use log::{debug, info};
use subtle::ConstantTimeEq;

pub mod ak;
pub mod error;
pub mod eventlog;
pub mod policy;
pub mod quote;
pub mod tpm;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::AttestError;

use eventlog::ima::ImaLog;
use eventlog::EventLog;
use policy::PolicyVerifier;
use tpm::{AkPublic, EkPublic, PcrFile};
use workspace::RequestWorkspace;

/// Shortest nonce the protocol accepts.
pub const MIN_NONCE_LEN: usize = 8;

/// Immutable service configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Directory holding the external policy verifier.
    pub bindir: PathBuf,

    /// Reject requests that carry no boot event log.
    pub require_eventlog: bool,

    /// When set, `extraData` must equal this server-issued nonce; the
    /// client-nonce path stays available when unset.
    pub server_nonce: Option<Vec<u8>>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            bindir: PathBuf::from("."),
            require_eventlog: false,
            server_nonce: None,
        }
    }
}

/// The decoded multipart form of one attestation request.
#[derive(Debug, Default)]
pub struct AttestRequest {
    pub quote: Vec<u8>,
    pub sig: Vec<u8>,
    pub pcr: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ak_pub: Vec<u8>,
    pub ek_pub: Vec<u8>,
    pub eventlog: Option<Vec<u8>>,
    pub imalog: Option<Vec<u8>>,
}

impl AttestRequest {
    /// Every received part under its field name, for the policy workspace.
    fn parts(&self) -> Vec<(&'static str, &[u8])> {
        let mut parts: Vec<(&'static str, &[u8])> = vec![
            ("quote", &self.quote),
            ("sig", &self.sig),
            ("pcr", &self.pcr),
            ("nonce", &self.nonce),
            ("ak.pub", &self.ak_pub),
            ("ek.pub", &self.ek_pub),
        ];
        if let Some(eventlog) = &self.eventlog {
            parts.push(("eventlog", eventlog));
        }
        if let Some(imalog) = &self.imalog {
            parts.push(("imalog", imalog));
        }
        parts
    }
}

/// The sealed wire response: `credentialBlob || tag || ciphertext`.
/// Clients locate the fields through the blob's TPM length prefixes.
#[derive(Debug)]
pub struct SealedResponse {
    pub credential_blob: Vec<u8>,
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl SealedResponse {
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(self.credential_blob.len() + self.tag.len() + self.ciphertext.len());
        out.extend_from_slice(&self.credential_blob);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }
}

pub struct Verifier {
    config: VerifierConfig,
    policy: PolicyVerifier,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        let policy = PolicyVerifier::new(&config.bindir);
        Verifier { config, policy }
    }

    /// Run one attestation request through the pipeline. Any failure
    /// terminates the request with the mapped fault; nothing is retried.
    pub async fn attest(&self, request: &AttestRequest) -> Result<SealedResponse, AttestError> {
        // ValidateInputs
        if request.nonce.len() < MIN_NONCE_LEN {
            return Err(AttestError::Malformed(format!(
                "nonce is {} bytes, minimum {MIN_NONCE_LEN}",
                request.nonce.len()
            )));
        }
        if let Some(server_nonce) = &self.config.server_nonce {
            if !bool::from(request.nonce.ct_eq(server_nonce)) {
                return Err(AttestError::BadQuote(
                    "nonce does not match the server-issued nonce".to_string(),
                ));
            }
        }

        // ParseAK / ValidateAK
        let ak = AkPublic::parse(&request.ak_pub)?;
        ak::validate(&ak)?;

        let ek = EkPublic::parse(&request.ek_pub)?;
        let ek_hash = ek.ek_hash();

        // ValidateQuote
        let pcrs = PcrFile::parse(&request.pcr)?;
        let attest = quote::verify_quote(&ak, &request.quote, &request.sig, &request.nonce, &pcrs)?;
        debug!(
            "quote verified for {ek_hash}: resets={} extraData={}",
            attest.reset_count,
            hex::encode(&attest.extra_data)
        );

        // ValidateEventLog
        match &request.eventlog {
            Some(eventlog) => EventLog::parse(eventlog)?.replay(&pcrs.bank)?,
            None if self.config.require_eventlog => {
                return Err(AttestError::BadEventlog(
                    "no event log supplied and the server requires one".to_string(),
                ))
            }
            None => debug!("no event log supplied for {ek_hash}, accepted by policy"),
        }
        if let Some(imalog) = &request.imalog {
            ImaLog::parse(imalog)?.replay(&pcrs.bank)?;
        }

        // InvokePolicy
        let ws = RequestWorkspace::new()
            .map_err(|e| AttestError::Sealing(format!("request workspace: {e:#}")))?;
        for (name, bytes) in request.parts() {
            ws.write_part(name, bytes)
                .map_err(|e| AttestError::Sealing(format!("request workspace: {e:#}")))?;
        }
        let payload = self.policy.verify(&ek_hash, ws.path()).await?;

        // Seal
        let secret = SessionSecret::generate()
            .map_err(|e| AttestError::Sealing(format!("session secret: {e:#}")))?;
        let credential_blob = make_credential(&ek.key, ek.name_alg, &ak.name(), &secret.to_bytes())
            .map_err(|e| match e {
                CredentialError::SeedWrap(e) => {
                    AttestError::BadEk(format!("OAEP seed wrap: {e}"))
                }
                CredentialError::Other(e) => AttestError::Sealing(format!("{e:#}")),
            })?;
        let (tag, ciphertext) = secret
            .seal(&payload)
            .map_err(|e| AttestError::Sealing(format!("payload envelope: {e:#}")))?;

        info!("sealed {} payload bytes for {ek_hash}", payload.len());
        Ok(SealedResponse {
            credential_blob,
            tag,
            ciphertext,
        })
    }
}
