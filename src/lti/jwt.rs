// ABOUTME: Compact JWS parsing and RS256 signature verification for platform id_tokens
// ABOUTME: Structure and algorithm are checked before any key material is touched
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::lti::RS256;
use crate::errors::LtiError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;

/// JOSE header fields used for verification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoseHeader {
    /// Signature algorithm
    pub alg: String,
    /// Signing key id
    #[serde(default)]
    pub kid: Option<String>,
    /// Media type
    #[serde(default)]
    pub typ: Option<String>,
}

/// A structurally valid token whose signature has not yet been checked
#[derive(Debug, Clone)]
pub struct UnverifiedToken<'a> {
    /// Decoded header
    pub header: JoseHeader,
    signing_input: &'a str,
    payload: &'a str,
    signature: Vec<u8>,
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, LtiError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| LtiError::MalformedToken(format!("{name} is not base64url: {e}")))
}

/// Split and decode a compact JWS
///
/// # Errors
///
/// Returns [`LtiError::MalformedToken`] unless the token has exactly three
/// non-empty base64url segments, a JSON header, and `alg` of RS256
pub fn parse_token(token: &str) -> Result<UnverifiedToken<'_>, LtiError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(LtiError::MalformedToken(
            "expected exactly three segments".to_owned(),
        ));
    };
    if header_b64.is_empty() || payload_b64.is_empty() || signature_b64.is_empty() {
        return Err(LtiError::MalformedToken("empty segment".to_owned()));
    }

    let header_bytes = decode_segment("header", header_b64)?;
    let header: JoseHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| LtiError::MalformedToken(format!("header is not valid JSON: {e}")))?;
    if header.alg != RS256 {
        return Err(LtiError::MalformedToken(format!(
            "unsupported alg {}",
            header.alg
        )));
    }
    let signature = decode_segment("signature", signature_b64)?;

    let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
    Ok(UnverifiedToken {
        header,
        signing_input,
        payload: payload_b64,
        signature,
    })
}

impl UnverifiedToken<'_> {
    /// Check the RS256 signature against a PEM `SubjectPublicKeyInfo`
    ///
    /// # Errors
    ///
    /// Returns [`LtiError::KeyNotFound`] if the PEM does not load as an RSA
    /// key, and [`LtiError::SignatureInvalid`] if verification fails
    pub fn verify(&self, public_key_pem: &str) -> Result<(), LtiError> {
        let key = RsaPublicKey::from_public_key_pem(public_key_pem)
            .map_err(|e| LtiError::KeyNotFound(format!("public key rejected: {e}")))?;
        verify_rs256(&key, self.signing_input.as_bytes(), &self.signature)
    }

    /// Decode the payload once the signature has been verified
    ///
    /// # Errors
    ///
    /// Returns [`LtiError::MalformedToken`] if the payload is not the expected JSON
    pub fn claims<T: DeserializeOwned>(&self) -> Result<T, LtiError> {
        let bytes = decode_segment("payload", self.payload)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| LtiError::MalformedToken(format!("payload rejected: {e}")))
    }
}

/// Verify a PKCS#1 v1.5 SHA-256 signature
///
/// # Errors
///
/// Returns [`LtiError::SignatureInvalid`] on any mismatch
pub fn verify_rs256(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<(), LtiError> {
    let signature = Signature::try_from(signature).map_err(|_| LtiError::SignatureInvalid)?;
    VerifyingKey::<Sha256>::new(key.clone())
        .verify(message, &signature)
        .map_err(|_| LtiError::SignatureInvalid)
}
