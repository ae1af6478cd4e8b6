// Copyright (c) 2025 Intel Corporation
//
// SPDX-License-Identifier: Apache-2.0
//

use clap::Parser;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use verifier::{Verifier, VerifierConfig};

mod config;
mod handler;

use config::{load_config, DEFAULT_CONFIG_PATH};

pub type GenericError = Box<dyn std::error::Error + Send + Sync>;
type Result<T> = std::result::Result<T, GenericError>;

/// Attestation server arguments info.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path for the attestation server
    #[arg(default_value_t = DEFAULT_CONFIG_PATH.to_string(), short, long = "config")]
    config: String,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    println!(
        "Starting attestation server with config {} (bind {}, bindir {})",
        args.config, config.bind, config.bindir
    );

    let address: SocketAddr = config.bind.parse().expect("Failed to parse the address");

    let verifier_config: VerifierConfig = config.verifier_config()?;
    let verifier = Arc::new(Verifier::new(verifier_config));

    let attest_service = make_service_fn(|_conn: &AddrStream| {
        let verifier = verifier.clone();

        async move {
            Ok::<_, GenericError>(service_fn(move |req| {
                let verifier = verifier.clone();
                async move { handler::handle(verifier, req).await }
            }))
        }
    });

    let server = Server::bind(&address).serve(attest_service);

    println!("Attestation server listening on http://{}", config.bind);

    if let Err(e) = server.await {
        eprintln!("Attestation server error: {}", e);
    }

    Ok(())
}
