// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Linux IMA runtime measurement log replay.
//!
//! Each line of the ASCII log is
//! `<pcr> <template-hash> <template-name> <template-data...>`; the template
//! hash is what the kernel extends into the IMA PCR. A zeroed template hash
//! marks a violation entry, which the kernel extends as all-FF. Banks wider
//! than the template hash are extended with the hash zero-padded to the bank
//! width.

use std::collections::BTreeMap;

use crypto::HashAlgorithm;

use crate::error::AttestError;
use crate::tpm::{Digest, PcrBank};

/// PCR the kernel dedicates to IMA measurements.
pub const IMA_PCR: u8 = 10;

pub struct ImaLog {
    /// Template hashes per PCR, in log order.
    entries: BTreeMap<u8, Vec<Vec<u8>>>,
}

impl ImaLog {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AttestError::Malformed(format!("IMA log is not UTF-8: {e}")))?;

        let mut entries: BTreeMap<u8, Vec<Vec<u8>>> = BTreeMap::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(pcr), Some(template_hash)) = (fields.next(), fields.next()) else {
                return Err(AttestError::Malformed(format!(
                    "IMA log line {} has fewer than two fields",
                    lineno + 1
                )));
            };
            let pcr: u8 = pcr.parse().map_err(|_| {
                AttestError::Malformed(format!("IMA log line {}: bad PCR index", lineno + 1))
            })?;
            let template_hash = hex::decode(template_hash).map_err(|_| {
                AttestError::Malformed(format!(
                    "IMA log line {}: template hash is not hex",
                    lineno + 1
                ))
            })?;
            entries.entry(pcr).or_default().push(template_hash);
        }

        Ok(ImaLog { entries })
    }

    /// Replay the log against every quoted bank that covers an IMA PCR.
    pub fn replay(&self, bank: &PcrBank) -> Result<(), AttestError> {
        for (alg, pcrs) in bank.iter() {
            for (&pcr, hashes) in &self.entries {
                let Some(quoted) = pcrs.get(&pcr) else {
                    continue;
                };

                let mut acc = vec![0u8; alg.digest_len()];
                for hash in hashes {
                    if hash.len() > alg.digest_len() {
                        return Err(AttestError::Malformed(format!(
                            "IMA template hash wider than the {alg} bank"
                        )));
                    }
                    let mut value = if hash.iter().all(|b| *b == 0) {
                        // violation entry
                        vec![0xFFu8; alg.digest_len()]
                    } else {
                        hash.clone()
                    };
                    value.resize(alg.digest_len(), 0);

                    acc.extend_from_slice(&value);
                    acc = alg.digest(&acc);
                }

                if &Digest::new(alg, acc)? != quoted {
                    return Err(AttestError::BadEventlog(format!(
                        "IMA PCR {alg}:{pcr} does not match the log replay"
                    )));
                }
            }
        }
        Ok(())
    }
}
