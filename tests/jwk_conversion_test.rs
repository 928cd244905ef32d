// ABOUTME: Integration tests for JWK to PEM conversion against independently produced key material
// ABOUTME: Compares our DER/PEM with OpenSSL and the rsa crate and checks a fixed reference signature
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common::{fixture, platform_jwks, KID_A, KID_B};
use coursedesk_server::crypto::{jwk_to_pem, RsaPublicKeyPem};
use coursedesk_server::errors::LtiError;
use coursedesk_server::lti::jwt::verify_rs256;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

const REFERENCE_INPUT: &[u8] = b"coursedesk reference signing input";

fn fixture_public_key(name: &str) -> RsaPublicKey {
    let private = RsaPrivateKey::from_pkcs1_pem(&fixture(name)).unwrap();
    RsaPublicKey::from(&private)
}

fn reference_signature() -> Vec<u8> {
    let encoded = fixture("reference_signature.txt");
    URL_SAFE_NO_PAD
        .decode(encoded.trim().trim_end_matches('='))
        .unwrap()
}

fn converted(kid: &str) -> RsaPublicKeyPem {
    let jwks = platform_jwks();
    RsaPublicKeyPem::try_from(jwks.find(kid).unwrap()).unwrap()
}

#[test]
fn test_pem_matches_openssl_output() {
    assert_eq!(converted(KID_A).pem, fixture("platform_a_public.pem"));
}

#[test]
fn test_der_matches_rsa_crate_encoding() {
    for (kid, key) in [(KID_A, "platform_a.pem"), (KID_B, "platform_b.pem")] {
        let expected = fixture_public_key(key).to_public_key_der().unwrap();
        assert_eq!(converted(kid).der, expected.as_bytes(), "kid {kid}");
    }
}

#[test]
fn test_converted_pem_loads_as_same_key() {
    let loaded = RsaPublicKey::from_public_key_pem(&converted(KID_A).pem).unwrap();
    assert_eq!(loaded, fixture_public_key("platform_a.pem"));
}

#[test]
fn test_zero_padded_modulus_yields_identical_der() {
    let jwks = platform_jwks();
    let key = jwks.find(KID_A).unwrap();
    let n = key.n.as_deref().unwrap();
    let e = key.e.as_deref().unwrap();

    let mut padded = vec![0u8];
    padded.extend(URL_SAFE_NO_PAD.decode(n).unwrap());
    let padded_n = URL_SAFE_NO_PAD.encode(&padded);
    assert!(padded_n.starts_with("AJv6"));

    assert_eq!(jwk_to_pem(&padded_n, e).unwrap().der, converted(KID_A).der);
}

#[test]
fn test_padded_base64_components_are_accepted() {
    let jwks = platform_jwks();
    let key = jwks.find(KID_A).unwrap();
    let n = key.n.as_deref().unwrap();
    let padded_n = format!("{n}==");
    let pem = jwk_to_pem(&padded_n, "AQAB=").unwrap();
    assert_eq!(pem.der, converted(KID_A).der);
}

#[test]
fn test_reference_signature_verifies_with_converted_key() {
    let key = RsaPublicKey::from_public_key_pem(&converted(KID_A).pem).unwrap();
    verify_rs256(&key, REFERENCE_INPUT, &reference_signature()).unwrap();
}

#[test]
fn test_reference_signature_fails_with_other_key() {
    let key = RsaPublicKey::from_public_key_pem(&converted(KID_B).pem).unwrap();
    let result = verify_rs256(&key, REFERENCE_INPUT, &reference_signature());
    assert!(matches!(result, Err(LtiError::SignatureInvalid)));
}

#[test]
fn test_reference_signature_fails_on_altered_input() {
    let key = RsaPublicKey::from_public_key_pem(&converted(KID_A).pem).unwrap();
    let result = verify_rs256(&key, b"coursedesk reference signing input!", &reference_signature());
    assert!(matches!(result, Err(LtiError::SignatureInvalid)));
}
