// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! TCG binary measurement log parsing and PCR replay.
//!
//! The log opens with a SHA1-format `TCG_PCR_EVENT` carrying the
//! `Spec ID Event03` structure that declares the digest algorithms; the
//! remaining entries are crypto-agile `TCG_PCR_EVENT2`. All integers are
//! little-endian, unlike the TPM structures proper.

use std::collections::BTreeMap;

use crypto::HashAlgorithm;

use crate::error::AttestError;
use crate::tpm::wire::Reader;
use crate::tpm::{Digest, PcrBank, PCR_MAX};

pub mod ima;

const EV_NO_ACTION: u32 = 0x0000_0003;

const SPEC_ID_SIGNATURE: &[u8; 16] = b"Spec ID Event03\0";
const STARTUP_LOCALITY_SIGNATURE: &[u8; 16] = b"StartupLocality\0";

struct MeasuredEvent {
    pcr_index: u32,
    event_type: u32,
    digests: Vec<(HashAlgorithm, Vec<u8>)>,
}

/// Parsed TCG measurement log.
pub struct EventLog {
    /// (algorithm id, digest size) pairs declared by the Spec ID header.
    declared: Vec<(u16, u16)>,
    events: Vec<MeasuredEvent>,
    /// StartupLocality seeds, keyed by PCR index.
    locality: BTreeMap<u32, u8>,
}

impl EventLog {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestError> {
        let mut r = Reader::new(bytes);

        // Header: SHA1-format TCG_PCR_EVENT wrapping the Spec ID structure.
        let header_pcr = r.read_u32_le()?;
        let header_type = r.read_u32_le()?;
        let _sha1_digest = r.take(20)?;
        let header_len = r.read_u32_le()? as usize;
        let header = r.take(header_len)?;
        if header_pcr != 0 || header_type != EV_NO_ACTION {
            return Err(AttestError::Malformed(
                "event log does not open with a Spec ID header event".to_string(),
            ));
        }

        let mut h = Reader::new(header);
        if h.take(16)? != SPEC_ID_SIGNATURE {
            return Err(AttestError::Malformed(
                "event log header is not Spec ID Event03".to_string(),
            ));
        }
        let _platform_class = h.read_u32_le()?;
        let _spec_version_minor = h.read_u8()?;
        let _spec_version_major = h.read_u8()?;
        let _errata = h.read_u8()?;
        let _uintn_size = h.read_u8()?;
        let alg_count = h.read_u32_le()?;
        if alg_count == 0 || alg_count > 8 {
            return Err(AttestError::Malformed(format!(
                "implausible Spec ID algorithm count {alg_count}"
            )));
        }
        let mut declared = Vec::with_capacity(alg_count as usize);
        for _ in 0..alg_count {
            let alg_id = h.read_u16_le()?;
            let size = h.read_u16_le()?;
            if size == 0 || size > 64 {
                return Err(AttestError::Malformed(format!(
                    "implausible digest size {size} for algorithm {alg_id:#06x}"
                )));
            }
            declared.push((alg_id, size));
        }
        // vendorInfo is ignored

        let mut events = Vec::new();
        let mut locality = BTreeMap::new();
        while !r.is_empty() {
            let pcr_index = r.read_u32_le()?;
            let event_type = r.read_u32_le()?;
            if pcr_index > PCR_MAX as u32 {
                return Err(AttestError::Malformed(format!(
                    "event targets PCR {pcr_index}"
                )));
            }

            let digest_count = r.read_u32_le()?;
            if digest_count as usize > declared.len() {
                return Err(AttestError::Malformed(format!(
                    "event carries {digest_count} digests, log declares {}",
                    declared.len()
                )));
            }
            let mut digests = Vec::with_capacity(digest_count as usize);
            for _ in 0..digest_count {
                let alg_id = r.read_u16_le()?;
                let (_, size) = declared
                    .iter()
                    .find(|(id, _)| *id == alg_id)
                    .ok_or_else(|| {
                        AttestError::Malformed(format!(
                            "event digest algorithm {alg_id:#06x} not declared by the log"
                        ))
                    })?;
                let value = r.take(*size as usize)?;
                // Digest banks the verifier cannot compute are carried but skipped.
                if let Some(alg) = HashAlgorithm::from_tpm_alg_id(alg_id) {
                    digests.push((alg, value.to_vec()));
                }
            }

            let data_len = r.read_u32_le()? as usize;
            let data = r.take(data_len)?;

            if event_type == EV_NO_ACTION
                && data.len() >= 17
                && &data[..16] == STARTUP_LOCALITY_SIGNATURE
            {
                locality.insert(pcr_index, data[16]);
            }

            events.push(MeasuredEvent {
                pcr_index,
                event_type,
                digests,
            });
        }

        Ok(EventLog {
            declared,
            events,
            locality,
        })
    }

    /// Whether the Spec ID header declared `alg`.
    pub fn declares(&self, alg: HashAlgorithm) -> bool {
        let id = alg.tpm_alg_id();
        self.declared.iter().any(|(alg_id, _)| *alg_id == id)
    }

    /// Initial accumulator for `(alg, pcr)`: all zeros, or zeros ending in
    /// the locality byte when a StartupLocality event seeded the PCR.
    fn initial(&self, alg: HashAlgorithm, pcr: u8) -> Vec<u8> {
        let mut acc = vec![0u8; alg.digest_len()];
        if let Some(locality) = self.locality.get(&(pcr as u32)) {
            acc[alg.digest_len() - 1] = *locality;
        }
        acc
    }

    /// Replay the log against the quoted PCR bank.
    ///
    /// A quoted PCR with no log events is accepted: the log may have been
    /// closed before that PCR was extended. Log algorithms the quote does
    /// not cover are ignored.
    pub fn replay(&self, bank: &PcrBank) -> Result<(), AttestError> {
        for (alg, pcrs) in bank.iter() {
            if !self.declares(alg) {
                return Err(AttestError::InvalidEventlogAlg(alg));
            }

            for (&index, quoted) in pcrs {
                let mut acc: Option<Vec<u8>> = None;
                for event in &self.events {
                    if event.pcr_index != index as u32 || event.event_type == EV_NO_ACTION {
                        continue;
                    }
                    let Some((_, value)) = event.digests.iter().find(|(a, _)| *a == alg) else {
                        continue;
                    };
                    let mut preimage = acc.take().unwrap_or_else(|| self.initial(alg, index));
                    preimage.extend_from_slice(value);
                    acc = Some(alg.digest(&preimage));
                }

                let Some(replayed) = acc else {
                    continue;
                };
                if &Digest::new(alg, replayed)? != quoted {
                    return Err(AttestError::BadEventlog(format!(
                        "PCR {alg}:{index} does not match the log replay"
                    )));
                }
            }
        }
        Ok(())
    }
}
