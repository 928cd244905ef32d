// ABOUTME: Random opaque token generation and one-way hashing for state, nonce, and session ids
// ABOUTME: Tokens are 256-bit CSPRNG values rendered as lowercase hex
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Entropy per generated token
pub const TOKEN_BYTES: usize = 32;

/// Generate a 256-bit random token as 64 hex characters
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of a token, hex encoded, for storage at rest
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Compare two secrets without short-circuiting on the first differing byte
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
