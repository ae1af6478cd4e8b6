// Copyright (c) 2025 Intel Corporation
//
// SPDX-License-Identifier: Apache-2.0
//

//! Invocation of the external policy verifier.
//!
//! The verifier is an operator-supplied program deciding whether the
//! attesting device, identified by its EK hash, is authorised. On success
//! its stdout is the payload to seal. It receives no attestation secrets,
//! only the request workspace.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::process::Command;

use crate::error::AttestError;

/// Program name looked up under the configured bindir.
const VERIFY_PROGRAM: &str = "verify";

pub struct PolicyVerifier {
    bindir: PathBuf,
}

impl PolicyVerifier {
    pub fn new(bindir: impl Into<PathBuf>) -> Self {
        PolicyVerifier {
            bindir: bindir.into(),
        }
    }

    /// Run `<bindir>/verify <ek_hex> <workspace>` and capture the payload.
    pub async fn verify(&self, ek_hex: &str, workspace: &Path) -> Result<Vec<u8>, AttestError> {
        let program = self.bindir.join(VERIFY_PROGRAM);
        debug!("invoking policy verifier {} for {ek_hex}", program.display());

        let output = Command::new(&program)
            .arg(ek_hex)
            .arg(workspace)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AttestError::VerifyFailed(format!(
                    "failed to launch {}: {e}",
                    program.display()
                ))
            })?;

        if !output.stderr.is_empty() {
            warn!(
                "policy verifier diagnostics for {ek_hex}: {}",
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        if !output.status.success() {
            return Err(AttestError::VerifyFailed(format!(
                "policy verifier exited with {} for {ek_hex}",
                output.status
            )));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn stub_verifier(dir: &Path, script: &str) {
        let path = dir.join(VERIFY_PROGRAM);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_payload_captured_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        stub_verifier(
            dir.path(),
            "#!/bin/sh\nprintf 'sealed-payload for %s' \"$1\"\n",
        );

        let payload = PolicyVerifier::new(dir.path())
            .verify("00aa", workspace.path())
            .await
            .unwrap();
        assert_eq!(payload, b"sealed-payload for 00aa");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        stub_verifier(dir.path(), "#!/bin/sh\necho 'unknown device' >&2\nexit 1\n");

        let err = PolicyVerifier::new(dir.path())
            .verify("00aa", workspace.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestError::VerifyFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();

        let err = PolicyVerifier::new(dir.path())
            .verify("00aa", workspace.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestError::VerifyFailed(_)));
    }
}
