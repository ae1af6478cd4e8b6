// Copyright (c) 2025 Alibaba Cloud
//
// SPDX-License-Identifier: Apache-2.0
//

//! Attestation Key policy gate.

use crate::error::AttestError;
use crate::tpm::{AkPublic, ObjectAttributes};

/// The exact attribute set a usable AK must carry. `restricted | sign` keep
/// the key from signing TPM-external data; `stClear` invalidates the key on
/// reboot, binding its signatures to the current boot.
pub const REQUIRED_AK_ATTRIBUTES: u32 = ObjectAttributes::FIXED_TPM
    | ObjectAttributes::ST_CLEAR
    | ObjectAttributes::FIXED_PARENT
    | ObjectAttributes::SENSITIVE_DATA_ORIGIN
    | ObjectAttributes::USER_WITH_AUTH
    | ObjectAttributes::RESTRICTED
    | ObjectAttributes::SIGN;

/// Accept the AK iff its attributes are exactly the required set and it
/// declares a signing scheme. Nothing more, nothing less.
pub fn validate(ak: &AkPublic) -> Result<(), AttestError> {
    let bits = ak.attributes.bits();
    if bits != REQUIRED_AK_ATTRIBUTES {
        return Err(AttestError::BadAk(format!(
            "object attributes {bits:#010x}, required {REQUIRED_AK_ATTRIBUTES:#010x}"
        )));
    }
    if ak.scheme.is_none() {
        return Err(AttestError::BadAk(
            "attestation key declares no signing scheme".to_string(),
        ));
    }
    Ok(())
}
