// Copyright (c) 2025 Intel Corporation
//
// SPDX-License-Identifier: Apache-2.0
//

//! Per-request scratch directory handed to the policy verifier.
//!
//! The directory owns every file written into it and is removed on all exit
//! paths, including panics, through `TempDir`'s drop. Permissions are opened
//! up so a privilege-separated verifier uid can read the request files.

use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

pub struct RequestWorkspace {
    dir: TempDir,
}

impl RequestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("attest-")
            .tempdir()
            .context("create request workspace")?;
        std::fs::set_permissions(dir.path(), Permissions::from_mode(0o755))
            .context("open up workspace permissions")?;
        Ok(RequestWorkspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Store a received form part under its field name.
    pub fn write_part(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).with_context(|| format!("write workspace file {name}"))?;
        std::fs::set_permissions(&path, Permissions::from_mode(0o644))
            .with_context(|| format!("set permissions on workspace file {name}"))?;
        Ok(())
    }
}
