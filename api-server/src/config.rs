// Copyright (c) 2025 Intel Corporation
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use serde::Deserialize;
use verifier::VerifierConfig;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/attest-server/attest-server.toml";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Environment override for the policy-verifier directory.
const BINDIR_ENV: &str = "BINDIR";

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory holding the external `verify` program.
    #[serde(default = "default_bindir")]
    pub bindir: String,

    /// Reject requests without a boot event log.
    #[serde(default)]
    pub require_eventlog: bool,

    /// Hex-encoded server-issued nonce all quotes must embed. Unset keeps
    /// the client-nonce path.
    #[serde(default)]
    pub server_nonce_hex: Option<String>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_bindir() -> String {
    ".".to_string()
}

pub fn load_config(path: &str) -> Result<ServerConfig> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::with_name(path).required(false))
        .build()
        .context(format!("failed to load attest server config: {}", path))?;

    let mut cfg: ServerConfig = settings
        .try_deserialize()
        .context("failed to deserialize attest server config")?;

    if let Ok(bindir) = std::env::var(BINDIR_ENV) {
        cfg.bindir = bindir;
    }

    Ok(cfg)
}

impl ServerConfig {
    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        let server_nonce = self
            .server_nonce_hex
            .as_deref()
            .map(hex::decode)
            .transpose()
            .context("server_nonce_hex is not valid hex")?;

        Ok(VerifierConfig {
            bindir: self.bindir.clone().into(),
            require_eventlog: self.require_eventlog,
            server_nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let cfg = load_config("/nonexistent/attest-server").unwrap();
        assert_eq!(cfg.bind, DEFAULT_BIND);
        assert!(!cfg.require_eventlog);
        assert!(cfg.server_nonce_hex.is_none());
    }

    #[test]
    fn test_verifier_config_decodes_nonce() {
        let cfg = ServerConfig {
            bind: DEFAULT_BIND.to_string(),
            bindir: "/usr/libexec/attest".to_string(),
            require_eventlog: true,
            server_nonce_hex: Some("6846c0d0aabbccdd".to_string()),
        };
        let vc = cfg.verifier_config().unwrap();
        assert_eq!(vc.server_nonce.as_deref(), Some(&hex::decode("6846c0d0aabbccdd").unwrap()[..]));
        assert!(vc.require_eventlog);

        let bad = ServerConfig {
            server_nonce_hex: Some("zz".to_string()),
            ..cfg
        };
        assert!(bad.verifier_config().is_err());
    }
}
