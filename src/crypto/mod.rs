// ABOUTME: Cryptographic building blocks for launch verification and session issuance
// ABOUTME: DER/PEM key reconstruction, JWK types, and random token helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// DER writer for RSA `SubjectPublicKeyInfo`
pub mod asn1;
/// JSON Web Key types and JWK to PEM conversion
pub mod jwk;
/// Opaque token generation and hashing
pub mod tokens;

pub use jwk::{jwk_to_pem, JsonWebKey, JsonWebKeySet, KeyConversionError, RsaPublicKeyPem};
pub use tokens::{constant_time_eq, generate_token, hash_token};
