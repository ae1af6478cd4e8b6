// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Decoder for the TPM 2.0 wire structures the protocol exchanges:
//! `TPMT_PUBLIC` (AK and EK), `TPMS_ATTEST`, `TPMT_SIGNATURE` and the
//! `tpm2-tools` PCR value file.

use std::collections::{BTreeMap, BTreeSet};

use crypto::HashAlgorithm;
use p256::ecdsa::VerifyingKey;
use rsa::{BigUint, RsaPublicKey};
use subtle::ConstantTimeEq;

use crate::error::AttestError;

pub mod wire;

use wire::{Reader, WireError};

/// TPM_GENERATED_VALUE: every TPMS_ATTEST starts with this magic.
pub const TPM_GENERATED_VALUE: u32 = 0xFF54_4347;
/// TPM_ST_ATTEST_QUOTE
pub const TPM_ST_ATTEST_QUOTE: u16 = 0x8018;

const TPM_ALG_RSA: u16 = 0x0001;
const TPM_ALG_NULL: u16 = 0x0010;
const TPM_ALG_RSASSA: u16 = 0x0014;
const TPM_ALG_ECDSA: u16 = 0x0018;
const TPM_ALG_ECC: u16 = 0x0023;

const TPM_ECC_NIST_P256: u16 = 0x0003;

/// Highest PCR index addressed by the protocol.
pub const PCR_MAX: u8 = 23;

impl From<WireError> for AttestError {
    fn from(e: WireError) -> Self {
        AttestError::Malformed(e.to_string())
    }
}

/// TPMA_OBJECT attribute bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectAttributes(pub u32);

impl ObjectAttributes {
    pub const FIXED_TPM: u32 = 1 << 1;
    pub const ST_CLEAR: u32 = 1 << 2;
    pub const FIXED_PARENT: u32 = 1 << 4;
    pub const SENSITIVE_DATA_ORIGIN: u32 = 1 << 5;
    pub const USER_WITH_AUTH: u32 = 1 << 6;
    pub const ADMIN_WITH_POLICY: u32 = 1 << 7;
    pub const NO_DA: u32 = 1 << 10;
    pub const RESTRICTED: u32 = 1 << 16;
    pub const DECRYPT: u32 = 1 << 17;
    pub const SIGN: u32 = 1 << 18;

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, mask: u32) -> bool {
        self.0 & mask == mask
    }
}

/// A digest tagged with its algorithm. Same-algorithm comparison is
/// constant time.
#[derive(Debug, Clone, Eq)]
pub struct Digest {
    pub alg: HashAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    pub fn new(alg: HashAlgorithm, bytes: Vec<u8>) -> Result<Self, AttestError> {
        if bytes.len() != alg.digest_len() {
            return Err(AttestError::Malformed(format!(
                "{} digest has {} bytes, expected {}",
                alg,
                bytes.len(),
                alg.digest_len()
            )));
        }
        Ok(Digest { alg, bytes })
    }

    /// The all-zero digest, the initial PCR accumulator.
    pub fn zero(alg: HashAlgorithm) -> Self {
        Digest {
            alg,
            bytes: vec![0u8; alg.digest_len()],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for Digest {
    fn eq(&self, other: &Self) -> bool {
        self.alg == other.alg && bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

/// TPML_PCR_SELECTION: per-algorithm PCR bitmaps in wire order.
#[derive(Debug, Clone)]
pub struct PcrSelection {
    selections: Vec<(HashAlgorithm, Vec<u8>)>,
}

impl PcrSelection {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, AttestError> {
        let count = r.read_u32()?;
        if count == 0 || count > 8 {
            return Err(AttestError::Malformed(format!(
                "implausible PCR selection count {count}"
            )));
        }

        let mut selections = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let alg_id = r.read_u16()?;
            let alg = HashAlgorithm::from_tpm_alg_id(alg_id).ok_or_else(|| {
                AttestError::Malformed(format!("unknown hash algorithm {alg_id:#06x}"))
            })?;
            let size = r.read_u8()? as usize;
            if size == 0 || size > 3 {
                return Err(AttestError::Malformed(format!(
                    "PCR select size {size} outside [1, 3]"
                )));
            }
            selections.push((alg, r.take(size)?.to_vec()));
        }

        Ok(PcrSelection { selections })
    }

    /// Canonical view: ascending algorithm id, ascending PCR index.
    pub fn canonical(&self) -> BTreeMap<HashAlgorithm, BTreeSet<u8>> {
        let mut out: BTreeMap<HashAlgorithm, BTreeSet<u8>> = BTreeMap::new();
        for (alg, bitmap) in &self.selections {
            let entry = out.entry(*alg).or_default();
            for (byte_idx, byte) in bitmap.iter().enumerate() {
                for bit in 0..8 {
                    if byte & (1 << bit) != 0 {
                        entry.insert((byte_idx * 8 + bit) as u8);
                    }
                }
            }
        }
        out
    }
}

impl PartialEq for PcrSelection {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for PcrSelection {}

/// PCR values keyed by algorithm and index, canonically ordered.
#[derive(Debug, Clone, Default)]
pub struct PcrBank(BTreeMap<HashAlgorithm, BTreeMap<u8, Digest>>);

impl PcrBank {
    pub fn insert(&mut self, index: u8, digest: Digest) -> Result<(), AttestError> {
        if index > PCR_MAX {
            return Err(AttestError::Malformed(format!(
                "PCR index {index} outside [0, {PCR_MAX}]"
            )));
        }
        self.0.entry(digest.alg).or_default().insert(index, digest);
        Ok(())
    }

    pub fn get(&self, alg: HashAlgorithm, index: u8) -> Option<&Digest> {
        self.0.get(&alg).and_then(|bank| bank.get(&index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (HashAlgorithm, &BTreeMap<u8, Digest>)> {
        self.0.iter().map(|(alg, bank)| (*alg, bank))
    }

    /// Concatenation of the selected digests in canonical order, the
    /// preimage of the quote's `pcrDigest`.
    pub fn digest_preimage(&self, selection: &PcrSelection) -> Result<Vec<u8>, AttestError> {
        let mut out = Vec::new();
        for (alg, indices) in selection.canonical() {
            for index in indices {
                let digest = self.get(alg, index).ok_or_else(|| {
                    AttestError::Malformed(format!("PCR {alg}:{index} selected but not supplied"))
                })?;
                out.extend_from_slice(digest.as_bytes());
            }
        }
        Ok(out)
    }
}

/// Client-declared PCR values in the `tpm2-tools` `.pcr` layout: a
/// TPML_PCR_SELECTION header followed by the selected digests concatenated
/// in canonical order.
#[derive(Debug, Clone)]
pub struct PcrFile {
    pub selection: PcrSelection,
    pub bank: PcrBank,
}

impl PcrFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestError> {
        let mut r = Reader::new(bytes);
        let selection = PcrSelection::parse(&mut r)?;

        let mut bank = PcrBank::default();
        for (alg, indices) in selection.canonical() {
            for index in indices {
                let digest = Digest::new(alg, r.take(alg.digest_len())?.to_vec())?;
                bank.insert(index, digest)?;
            }
        }
        r.expect_end()?;

        Ok(PcrFile { selection, bank })
    }
}

/// Signing scheme declared by a `TPMT_PUBLIC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScheme {
    RsaSsa(HashAlgorithm),
    EcDsa(HashAlgorithm),
}

/// Public key extracted from a `TPMT_PUBLIC`.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(VerifyingKey),
}

struct ParsedPublic {
    raw: Vec<u8>,
    object_type: u16,
    name_alg: HashAlgorithm,
    attributes: ObjectAttributes,
    scheme: Option<SigningScheme>,
    rsa_key_bits: u16,
    key: PublicKey,
}

fn read_sym_def(r: &mut Reader<'_>) -> Result<(), AttestError> {
    let alg = r.read_u16()?;
    if alg != TPM_ALG_NULL {
        let _key_bits = r.read_u16()?;
        let _mode = r.read_u16()?;
    }
    Ok(())
}

fn read_scheme(r: &mut Reader<'_>) -> Result<Option<SigningScheme>, AttestError> {
    let scheme = r.read_u16()?;
    match scheme {
        TPM_ALG_NULL => Ok(None),
        TPM_ALG_RSASSA | TPM_ALG_ECDSA => {
            let hash_id = r.read_u16()?;
            let hash = HashAlgorithm::from_tpm_alg_id(hash_id).ok_or_else(|| {
                AttestError::Malformed(format!("unknown scheme hash {hash_id:#06x}"))
            })?;
            Ok(Some(if scheme == TPM_ALG_RSASSA {
                SigningScheme::RsaSsa(hash)
            } else {
                SigningScheme::EcDsa(hash)
            }))
        }
        other => Err(AttestError::Malformed(format!(
            "unsupported scheme {other:#06x}"
        ))),
    }
}

/// Strip an optional TPM2B_PUBLIC size wrapper, returning the TPMT_PUBLIC
/// area. `tpm2_createak -u` emits the wrapped form; raw TPMT_PUBLIC starts
/// with an object type, which never collides with a plausible size prefix.
fn public_area(bytes: &[u8]) -> Result<&[u8], AttestError> {
    if bytes.len() < 2 {
        return Err(AttestError::Malformed("public area too short".to_string()));
    }
    let head = u16::from_be_bytes([bytes[0], bytes[1]]);
    if head == TPM_ALG_RSA || head == TPM_ALG_ECC {
        return Ok(bytes);
    }
    let inner = &bytes[2..];
    if head as usize != inner.len() {
        return Err(AttestError::Malformed(format!(
            "TPM2B_PUBLIC size {head} does not match {} remaining bytes",
            inner.len()
        )));
    }
    Ok(inner)
}

fn parse_public(bytes: &[u8]) -> Result<ParsedPublic, AttestError> {
    let area = public_area(bytes)?;
    let mut r = Reader::new(area);

    let object_type = r.read_u16()?;
    let name_alg_id = r.read_u16()?;
    let name_alg = HashAlgorithm::from_tpm_alg_id(name_alg_id).ok_or_else(|| {
        AttestError::Malformed(format!("unknown name algorithm {name_alg_id:#06x}"))
    })?;
    let attributes = ObjectAttributes(r.read_u32()?);
    let _auth_policy = r.read_tpm2b()?;

    let (scheme, rsa_key_bits, key) = match object_type {
        TPM_ALG_RSA => {
            read_sym_def(&mut r)?;
            let scheme = read_scheme(&mut r)?;
            if matches!(scheme, Some(SigningScheme::EcDsa(_))) {
                return Err(AttestError::Malformed(
                    "ECDSA scheme on an RSA key".to_string(),
                ));
            }
            let key_bits = r.read_u16()?;
            let exponent = match r.read_u32()? {
                0 => 65537u32,
                e => e,
            };
            let modulus = r.read_tpm2b()?;
            let key = RsaPublicKey::new(
                BigUint::from_bytes_be(modulus),
                BigUint::from(exponent),
            )
            .map_err(|e| AttestError::Malformed(format!("invalid RSA public key: {e}")))?;
            (scheme, key_bits, PublicKey::Rsa(key))
        }
        TPM_ALG_ECC => {
            read_sym_def(&mut r)?;
            let scheme = read_scheme(&mut r)?;
            if matches!(scheme, Some(SigningScheme::RsaSsa(_))) {
                return Err(AttestError::Malformed(
                    "RSASSA scheme on an ECC key".to_string(),
                ));
            }
            let curve = r.read_u16()?;
            if curve != TPM_ECC_NIST_P256 {
                return Err(AttestError::Malformed(format!(
                    "unsupported ECC curve {curve:#06x}"
                )));
            }
            // kdf scheme, TPM_ALG_NULL for signing keys
            let kdf = r.read_u16()?;
            if kdf != TPM_ALG_NULL {
                let _kdf_hash = r.read_u16()?;
            }
            let x = r.read_tpm2b()?;
            let y = r.read_tpm2b()?;
            if x.len() != 32 || y.len() != 32 {
                return Err(AttestError::Malformed(format!(
                    "P-256 point with {}/{} byte coordinates",
                    x.len(),
                    y.len()
                )));
            }
            let mut sec1 = Vec::with_capacity(65);
            sec1.push(0x04);
            sec1.extend_from_slice(x);
            sec1.extend_from_slice(y);
            let key = VerifyingKey::from_sec1_bytes(&sec1)
                .map_err(|e| AttestError::Malformed(format!("invalid P-256 point: {e}")))?;
            (scheme, 0, PublicKey::EcdsaP256(key))
        }
        other => {
            return Err(AttestError::Malformed(format!(
                "unsupported object type {other:#06x}"
            )))
        }
    };
    r.expect_end()?;

    Ok(ParsedPublic {
        raw: area.to_vec(),
        object_type,
        name_alg,
        attributes,
        scheme,
        rsa_key_bits,
        key,
    })
}

/// Parsed `TPMT_PUBLIC` of the Attestation Key.
#[derive(Debug)]
pub struct AkPublic {
    raw: Vec<u8>,
    pub name_alg: HashAlgorithm,
    pub attributes: ObjectAttributes,
    pub scheme: Option<SigningScheme>,
    pub key: PublicKey,
}

impl AkPublic {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestError> {
        let parsed = parse_public(bytes)?;
        Ok(AkPublic {
            raw: parsed.raw,
            name_alg: parsed.name_alg,
            attributes: parsed.attributes,
            scheme: parsed.scheme,
            key: parsed.key,
        })
    }

    /// `name = nameAlg || H_nameAlg(TPMT_PUBLIC)`
    pub fn name(&self) -> Vec<u8> {
        let mut name = self.name_alg.tpm_alg_id().to_be_bytes().to_vec();
        name.extend_from_slice(&self.name_alg.digest(&self.raw));
        name
    }
}

/// Parsed `TPMT_PUBLIC` of the Endorsement Key. RSA-2048 only.
#[derive(Debug)]
pub struct EkPublic {
    raw: Vec<u8>,
    pub name_alg: HashAlgorithm,
    pub key: RsaPublicKey,
}

impl EkPublic {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestError> {
        let parsed = parse_public(bytes)?;
        if parsed.object_type != TPM_ALG_RSA {
            return Err(AttestError::BadEk("endorsement key is not RSA".to_string()));
        }
        if parsed.rsa_key_bits != 2048 {
            return Err(AttestError::BadEk(format!(
                "endorsement key is RSA-{}, expected RSA-2048",
                parsed.rsa_key_bits
            )));
        }
        let PublicKey::Rsa(key) = parsed.key else {
            return Err(AttestError::BadEk("endorsement key is not RSA".to_string()));
        };
        Ok(EkPublic {
            raw: parsed.raw,
            name_alg: parsed.name_alg,
            key,
        })
    }

    /// Stable device identity keying the policy database:
    /// hex `SHA-256(TPMT_PUBLIC)`.
    pub fn ek_hash(&self) -> String {
        hex::encode(HashAlgorithm::Sha256.digest(&self.raw))
    }
}

/// Parsed `TPMS_ATTEST` quote body.
#[derive(Debug)]
pub struct Attest {
    pub qualified_signer: Vec<u8>,
    pub extra_data: Vec<u8>,
    pub clock: u64,
    pub reset_count: u32,
    pub restart_count: u32,
    pub safe: bool,
    pub firmware_version: u64,
    pub pcr_selection: PcrSelection,
    pub pcr_digest: Vec<u8>,
}

impl Attest {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestError> {
        let mut r = Reader::new(bytes);

        let magic = r.read_u32()?;
        if magic != TPM_GENERATED_VALUE {
            return Err(AttestError::BadQuote(format!(
                "attest magic {magic:#010x} is not TPM_GENERATED_VALUE"
            )));
        }
        let st = r.read_u16()?;
        if st != TPM_ST_ATTEST_QUOTE {
            return Err(AttestError::BadQuote(format!(
                "attest type {st:#06x} is not TPM_ST_ATTEST_QUOTE"
            )));
        }

        let qualified_signer = r.read_tpm2b()?.to_vec();
        let extra_data = r.read_tpm2b()?.to_vec();

        let clock = r.read_u64()?;
        let reset_count = r.read_u32()?;
        let restart_count = r.read_u32()?;
        let safe = r.read_u8()? != 0;
        let firmware_version = r.read_u64()?;

        let pcr_selection = PcrSelection::parse(&mut r)?;
        let pcr_digest = r.read_tpm2b()?.to_vec();
        r.expect_end()?;

        Ok(Attest {
            qualified_signer,
            extra_data,
            clock,
            reset_count,
            restart_count,
            safe,
            firmware_version,
            pcr_selection,
            pcr_digest,
        })
    }
}

/// Parsed `TPMT_SIGNATURE`.
#[derive(Debug)]
pub enum TpmtSignature {
    RsaSsa {
        hash: HashAlgorithm,
        signature: Vec<u8>,
    },
    EcDsa {
        hash: HashAlgorithm,
        r: Vec<u8>,
        s: Vec<u8>,
    },
}

impl TpmtSignature {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestError> {
        let mut r = Reader::new(bytes);
        let alg = r.read_u16()?;
        let hash_id = r.read_u16()?;
        let hash = HashAlgorithm::from_tpm_alg_id(hash_id).ok_or_else(|| {
            AttestError::Malformed(format!("unknown signature hash {hash_id:#06x}"))
        })?;

        let sig = match alg {
            TPM_ALG_RSASSA => TpmtSignature::RsaSsa {
                hash,
                signature: r.read_tpm2b()?.to_vec(),
            },
            TPM_ALG_ECDSA => {
                let sig_r = r.read_tpm2b()?.to_vec();
                let sig_s = r.read_tpm2b()?.to_vec();
                TpmtSignature::EcDsa {
                    hash,
                    r: sig_r,
                    s: sig_s,
                }
            }
            other => {
                return Err(AttestError::Malformed(format!(
                    "unsupported signature algorithm {other:#06x}"
                )))
            }
        };
        r.expect_end()?;
        Ok(sig)
    }

    pub fn hash(&self) -> HashAlgorithm {
        match self {
            TpmtSignature::RsaSsa { hash, .. } => *hash,
            TpmtSignature::EcDsa { hash, .. } => *hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_parse_rsa_ak_public() {
        let modulus = [0xABu8; 256];
        let bytes = testutil::rsa_public_bytes(&modulus, testutil::REQUIRED_AK_ATTRS);
        let ak = AkPublic::parse(&bytes).unwrap();

        assert_eq!(ak.name_alg, HashAlgorithm::Sha256);
        assert_eq!(ak.attributes.bits(), testutil::REQUIRED_AK_ATTRS);
        assert_eq!(
            ak.scheme,
            Some(SigningScheme::RsaSsa(HashAlgorithm::Sha256))
        );

        let name = ak.name();
        assert_eq!(name.len(), 34);
        assert_eq!(&name[..2], &[0x00, 0x0B]);
        assert_eq!(&name[2..], HashAlgorithm::Sha256.digest(&bytes).as_slice());
    }

    #[test]
    fn test_parse_accepts_tpm2b_wrapper() {
        let modulus = [0x33u8; 256];
        let inner = testutil::rsa_public_bytes(&modulus, testutil::REQUIRED_AK_ATTRS);
        let mut wrapped = (inner.len() as u16).to_be_bytes().to_vec();
        wrapped.extend_from_slice(&inner);

        let ak = AkPublic::parse(&wrapped).unwrap();
        // The name covers the TPMT_PUBLIC area, not the wrapper.
        assert_eq!(&ak.name()[2..], HashAlgorithm::Sha256.digest(&inner).as_slice());
    }

    #[test]
    fn test_parse_rejects_trailing_bytes() {
        let modulus = [0x33u8; 256];
        let mut bytes = testutil::rsa_public_bytes(&modulus, testutil::REQUIRED_AK_ATTRS);
        bytes.push(0x00);
        assert!(matches!(
            AkPublic::parse(&bytes),
            Err(AttestError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_name_alg() {
        let modulus = [0x33u8; 256];
        let mut bytes = testutil::rsa_public_bytes(&modulus, testutil::REQUIRED_AK_ATTRS);
        // nameAlg is at offset 2
        bytes[2] = 0x00;
        bytes[3] = 0x42;
        assert!(matches!(
            AkPublic::parse(&bytes),
            Err(AttestError::Malformed(_))
        ));
    }

    #[test]
    fn test_ek_rejects_small_key() {
        let modulus = [0x44u8; 128]; // RSA-1024
        let bytes = testutil::rsa_public_bytes_with_bits(&modulus, 0x000300B2, 1024);
        assert!(matches!(
            EkPublic::parse(&bytes),
            Err(AttestError::BadEk(_))
        ));
    }

    #[test]
    fn test_ek_hash_stable() {
        let modulus = [0x44u8; 256];
        let bytes = testutil::rsa_public_bytes(&modulus, testutil::REQUIRED_AK_ATTRS);
        let ek = EkPublic::parse(&bytes).unwrap();
        assert_eq!(
            ek.ek_hash(),
            hex::encode(HashAlgorithm::Sha256.digest(&bytes))
        );
    }

    #[test]
    fn test_attest_parse_round() {
        let digest = HashAlgorithm::Sha256.digest(b"pcrs");
        let bytes = testutil::attest_bytes(b"nonce-bytes", &[(HashAlgorithm::Sha256, 0x00FFFF)], &digest);
        let attest = Attest::parse(&bytes).unwrap();

        assert_eq!(attest.extra_data, b"nonce-bytes");
        assert_eq!(attest.pcr_digest, digest);
        let canonical = attest.pcr_selection.canonical();
        let pcrs = canonical.get(&HashAlgorithm::Sha256).unwrap();
        assert_eq!(pcrs.len(), 16);
        assert!(pcrs.contains(&0) && pcrs.contains(&15) && !pcrs.contains(&16));
    }

    #[test]
    fn test_attest_rejects_bad_magic() {
        let digest = HashAlgorithm::Sha256.digest(b"pcrs");
        let mut bytes =
            testutil::attest_bytes(b"nonce-bytes", &[(HashAlgorithm::Sha256, 0x00FFFF)], &digest);
        bytes[0] = 0x00;
        assert!(matches!(
            Attest::parse(&bytes),
            Err(AttestError::BadQuote(_))
        ));
    }

    #[test]
    fn test_pcr_file_round_trip() {
        let values: Vec<(u8, Vec<u8>)> = (0u8..8)
            .map(|i| (i, HashAlgorithm::Sha256.digest(&[i])))
            .collect();
        let bytes = testutil::pcr_file_bytes(HashAlgorithm::Sha256, &values);
        let file = PcrFile::parse(&bytes).unwrap();

        for (index, value) in &values {
            assert_eq!(
                file.bank.get(HashAlgorithm::Sha256, *index).unwrap().as_bytes(),
                value.as_slice()
            );
        }
        assert!(file.bank.get(HashAlgorithm::Sha256, 8).is_none());
    }

    #[test]
    fn test_pcr_file_rejects_truncated_digests() {
        let values: Vec<(u8, Vec<u8>)> = vec![(0, HashAlgorithm::Sha256.digest(b"a"))];
        let mut bytes = testutil::pcr_file_bytes(HashAlgorithm::Sha256, &values);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            PcrFile::parse(&bytes),
            Err(AttestError::Malformed(_))
        ));
    }

    #[test]
    fn test_signature_parse() {
        let mut bytes = vec![0x00, 0x14, 0x00, 0x0B];
        bytes.extend_from_slice(&(4u16).to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        let sig = TpmtSignature::parse(&bytes).unwrap();
        assert!(matches!(
            sig,
            TpmtSignature::RsaSsa { hash: HashAlgorithm::Sha256, .. }
        ));

        // unsupported algorithm id
        let bytes = [0x00u8, 0x16, 0x00, 0x0B, 0x00, 0x00];
        assert!(matches!(
            TpmtSignature::parse(&bytes),
            Err(AttestError::Malformed(_))
        ));
    }

    #[test]
    fn test_digest_equality_requires_same_alg() {
        let a = Digest::new(HashAlgorithm::Sha256, vec![0u8; 32]).unwrap();
        let b = Digest::zero(HashAlgorithm::Sha256);
        assert_eq!(a, b);

        let c = Digest::zero(HashAlgorithm::Sha1);
        assert_ne!(
            Digest::new(HashAlgorithm::Sha1, vec![0u8; 20]).unwrap().alg,
            b.alg
        );
        assert_eq!(c, Digest::zero(HashAlgorithm::Sha1));
    }
}
