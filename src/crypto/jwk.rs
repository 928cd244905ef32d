// ABOUTME: JSON Web Key types and pure conversion of RSA JWK components into PEM public keys
// ABOUTME: Decodes base64url modulus/exponent, builds SubjectPublicKeyInfo DER, and armors it as PEM
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::asn1::{rsa_subject_public_key_info, Asn1Error};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// PEM armor label for `SubjectPublicKeyInfo`
const PEM_LABEL: &str = "PUBLIC KEY";

/// PEM body line width
const PEM_LINE_WIDTH: usize = 64;

/// A single key from a platform key set (RFC 7517)
///
/// Only RSA members are modelled; unknown members are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type, `RSA` for usable keys
    pub kty: String,
    /// Key identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Intended use (`sig` or `enc`)
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA modulus, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

/// Key set document served at a platform's `jwks_uri`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Published keys
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Find a key by `kid`
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

/// Failures converting a JWK into a public key
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyConversionError {
    /// `kty` is not RSA
    #[error("unsupported key type {0}")]
    UnsupportedKeyType(String),
    /// `n` or `e` absent or empty
    #[error("RSA component {0} is missing")]
    MissingComponent(&'static str),
    /// `n` or `e` not valid base64url
    #[error("RSA component {component} is not valid base64url: {reason}")]
    InvalidBase64 {
        /// Component name
        component: &'static str,
        /// Decoder message
        reason: String,
    },
    /// DER assembly failed
    #[error("DER encoding failed: {0}")]
    Der(#[from] Asn1Error),
}

/// Reconstructed RSA public key in both binary and armored forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKeyPem {
    /// `SubjectPublicKeyInfo` DER
    pub der: Vec<u8>,
    /// PEM armored DER
    pub pem: String,
}

impl TryFrom<&JsonWebKey> for RsaPublicKeyPem {
    type Error = KeyConversionError;

    fn try_from(jwk: &JsonWebKey) -> Result<Self, Self::Error> {
        if jwk.kty != crate::constants::lti::KTY_RSA {
            return Err(KeyConversionError::UnsupportedKeyType(jwk.kty.clone()));
        }
        let n = jwk
            .n
            .as_deref()
            .ok_or(KeyConversionError::MissingComponent("n"))?;
        let e = jwk
            .e
            .as_deref()
            .ok_or(KeyConversionError::MissingComponent("e"))?;
        jwk_to_pem(n, e)
    }
}

/// Convert base64url RSA components into a PEM encoded public key
///
/// Padding characters are tolerated. A leading zero byte on the modulus is
/// dropped before re-encoding.
///
/// # Errors
///
/// Returns an error for empty or undecodable components
pub fn jwk_to_pem(n: &str, e: &str) -> Result<RsaPublicKeyPem, KeyConversionError> {
    let modulus = decode_component("n", n)?;
    let exponent = decode_component("e", e)?;
    let der = rsa_subject_public_key_info(&modulus, &exponent)?;
    let pem = der_to_pem(&der);
    Ok(RsaPublicKeyPem { der, pem })
}

/// Decode a base64url value, with or without `=` padding
///
/// # Errors
///
/// Returns an error if the value is empty or not base64url
pub fn decode_component(
    component: &'static str,
    value: &str,
) -> Result<Vec<u8>, KeyConversionError> {
    let trimmed = value.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(KeyConversionError::MissingComponent(component));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| KeyConversionError::InvalidBase64 {
            component,
            reason: e.to_string(),
        })?;
    if bytes.is_empty() {
        return Err(KeyConversionError::MissingComponent(component));
    }
    Ok(bytes)
}

/// Armor DER bytes as a `PUBLIC KEY` PEM block with 64-column lines
#[must_use]
pub fn der_to_pem(der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.push_str("-----BEGIN ");
    pem.push_str(PEM_LABEL);
    pem.push_str("-----\n");
    for (i, c) in body.chars().enumerate() {
        if i > 0 && i % PEM_LINE_WIDTH == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str("\n-----END ");
    pem.push_str(PEM_LABEL);
    pem.push_str("-----\n");
    pem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pem_lines_wrap_at_64_columns() {
        let pem = der_to_pem(&[0xAB; 120]);
        let lines: Vec<&str> = pem.lines().collect();
        assert_eq!(lines.first().copied(), Some("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(lines.last().copied(), Some("-----END PUBLIC KEY-----"));
        // 120 bytes -> 160 base64 chars -> 64 + 64 + 32
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 64);
        assert_eq!(lines[3].len(), 32);
        assert!(pem.ends_with('\n'));
    }

    #[test]
    fn test_padding_tolerated() {
        assert_eq!(decode_component("e", "AQAB").unwrap(), vec![1, 0, 1]);
        assert_eq!(decode_component("e", "AQ==").unwrap(), vec![1]);
        assert_eq!(decode_component("e", "AQ").unwrap(), vec![1]);
    }

    #[test]
    fn test_invalid_components_rejected() {
        assert_eq!(
            decode_component("n", ""),
            Err(KeyConversionError::MissingComponent("n"))
        );
        assert!(matches!(
            decode_component("n", "not*base64"),
            Err(KeyConversionError::InvalidBase64 { component: "n", .. })
        ));
    }

    #[test]
    fn test_non_rsa_key_rejected() {
        let jwk = JsonWebKey {
            kty: "EC".to_owned(),
            kid: Some("k1".to_owned()),
            alg: None,
            key_use: None,
            n: None,
            e: None,
        };
        assert_eq!(
            RsaPublicKeyPem::try_from(&jwk),
            Err(KeyConversionError::UnsupportedKeyType("EC".to_owned()))
        );
    }

    #[test]
    fn test_small_key_structure() {
        // n = 0x80 0x01 needs a pad byte, e = 65537
        let converted = jwk_to_pem("gAE", "AQAB").unwrap();
        let expected_rsa_key = [0x30, 0x0A, 0x02, 0x03, 0x00, 0x80, 0x01, 0x02, 0x03, 0x01, 0x00, 0x01];
        assert!(converted.der.ends_with(&expected_rsa_key));
        assert!(converted.pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
    }

    #[test]
    fn test_key_set_lookup_by_kid() {
        let set: JsonWebKeySet = serde_json::from_str(
            r#"{"keys":[{"kty":"RSA","kid":"a","use":"sig","n":"gAE","e":"AQAB","x5c":["ignored"]}]}"#,
        )
        .unwrap();
        assert_eq!(set.find("a").and_then(|k| k.key_use.as_deref()), Some("sig"));
        assert!(set.find("b").is_none());
    }
}
