// Copyright (c) 2025 Intel Corporation
//
// SPDX-License-Identifier: Apache-2.0

//! Request intake: multipart form decoding and fault-to-status mapping.

use std::sync::Arc;

use hyper::header::CONTENT_TYPE;
use hyper::{Body, Method, Request, Response, StatusCode};
use log::{debug, warn};
use multer::Multipart;
use verifier::{AttestError, AttestRequest, Verifier};

use crate::GenericError;

/// Accepted multipart field names, matching the filenames the policy
/// verifier later sees in its workspace.
const FIELD_QUOTE: &str = "quote";
const FIELD_SIG: &str = "sig";
const FIELD_PCR: &str = "pcr";
const FIELD_NONCE: &str = "nonce";
const FIELD_AK: &str = "ak.pub";
const FIELD_EK: &str = "ek.pub";
const FIELD_EVENTLOG: &str = "eventlog";
const FIELD_IMALOG: &str = "imalog";

pub async fn handle(
    verifier: Arc<Verifier>,
    req: Request<Body>,
) -> Result<Response<Body>, GenericError> {
    match (req.method(), req.uri().path()) {
        (&Method::POST, "/") => attest(verifier, req).await,
        (&Method::GET, "/healthz") => Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("OK"))?),
        (&Method::POST, _) => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())?),
        _ => Ok(Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .body(Body::empty())?),
    }
}

async fn attest(
    verifier: Arc<Verifier>,
    req: Request<Body>,
) -> Result<Response<Body>, GenericError> {
    match attest_inner(verifier, req).await {
        Ok(sealed) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(sealed))?),
        Err(e) => {
            warn!("attestation rejected: {e}");
            Ok(Response::builder()
                .status(StatusCode::from_u16(e.status()).unwrap_or(StatusCode::FORBIDDEN))
                .body(Body::from(e.reason()))?)
        }
    }
}

async fn attest_inner(
    verifier: Arc<Verifier>,
    req: Request<Body>,
) -> Result<Vec<u8>, AttestError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let boundary = multer::parse_boundary(&content_type)
        .map_err(|e| AttestError::Malformed(format!("not a multipart form: {e}")))?;

    let request = read_form(Multipart::new(req.into_body(), boundary)).await?;
    let sealed = verifier.attest(&request).await?;
    Ok(sealed.into_bytes())
}

async fn read_form(mut multipart: Multipart<'_>) -> Result<AttestRequest, AttestError> {
    let mut quote = None;
    let mut sig = None;
    let mut pcr = None;
    let mut nonce = None;
    let mut ak_pub = None;
    let mut ek_pub = None;
    let mut eventlog = None;
    let mut imalog = None;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AttestError::Malformed(format!("reading multipart form: {e}")))?;
        let Some(field) = field else {
            break;
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AttestError::Malformed(format!("reading field `{name}`: {e}")))?
            .to_vec();

        match name.as_str() {
            FIELD_QUOTE => quote = Some(bytes),
            FIELD_SIG => sig = Some(bytes),
            FIELD_PCR => pcr = Some(bytes),
            FIELD_NONCE => nonce = Some(bytes),
            FIELD_AK => ak_pub = Some(bytes),
            FIELD_EK => ek_pub = Some(bytes),
            FIELD_EVENTLOG => eventlog = Some(bytes),
            FIELD_IMALOG => imalog = Some(bytes),
            other => debug!("ignoring unknown form field `{other}`"),
        }
    }

    let require = |part: Option<Vec<u8>>, name: &str| {
        part.ok_or_else(|| AttestError::MissingField(name.to_string()))
    };

    Ok(AttestRequest {
        quote: require(quote, FIELD_QUOTE)?,
        sig: require(sig, FIELD_SIG)?,
        pcr: require(pcr, FIELD_PCR)?,
        nonce: require(nonce, FIELD_NONCE)?,
        ak_pub: require(ak_pub, FIELD_AK)?,
        ek_pub: require(ek_pub, FIELD_EK)?,
        eventlog,
        imalog,
    })
}
