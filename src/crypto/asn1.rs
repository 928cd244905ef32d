// ABOUTME: Minimal DER writer used to assemble RSA SubjectPublicKeyInfo structures
// ABOUTME: Length prefixes are bounds-checked; INTEGER contents are normalised to canonical form
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! DER encoding helpers
//!
//! Only the handful of ASN.1 types needed for an RSA `SubjectPublicKeyInfo` are
//! supported. Content lengths are limited to two length octets (65535 bytes),
//! which comfortably covers RSA moduli up to 16384 bits.

use thiserror::Error;

/// ASN.1 INTEGER tag
pub const TAG_INTEGER: u8 = 0x02;
/// ASN.1 BIT STRING tag
pub const TAG_BIT_STRING: u8 = 0x03;
/// ASN.1 constructed SEQUENCE tag
pub const TAG_SEQUENCE: u8 = 0x30;

/// Largest content length this writer will encode
pub const MAX_CONTENT_LEN: usize = 0xFFFF;

/// `AlgorithmIdentifier { rsaEncryption (1.2.840.113549.1.1.1), NULL }`
pub const RSA_ENCRYPTION_ALGORITHM_ID: [u8; 15] = [
    0x30, 0x0D, 0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01, 0x05, 0x00,
];

/// DER encoding failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Asn1Error {
    /// Content does not fit in a two-octet length
    #[error("content length {0} exceeds the DER length limit of 65535 bytes")]
    LengthOverflow(usize),
    /// INTEGER magnitude was empty
    #[error("INTEGER content is empty")]
    EmptyInteger,
}

/// Encode a DER length prefix
///
/// # Errors
///
/// Returns [`Asn1Error::LengthOverflow`] for lengths above [`MAX_CONTENT_LEN`]
pub fn asn1_length(len: usize) -> Result<Vec<u8>, Asn1Error> {
    match len {
        0..=0x7F => Ok(vec![len as u8]),
        0x80..=0xFF => Ok(vec![0x81, len as u8]),
        0x100..=MAX_CONTENT_LEN => Ok(vec![0x82, (len >> 8) as u8, (len & 0xFF) as u8]),
        _ => Err(Asn1Error::LengthOverflow(len)),
    }
}

/// Append-only DER byte builder
#[derive(Debug, Default, Clone)]
pub struct DerWriter {
    buf: Vec<u8>,
}

impl DerWriter {
    /// Empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag-length-value element
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is too long to encode
    pub fn tlv(&mut self, tag: u8, content: &[u8]) -> Result<&mut Self, Asn1Error> {
        let length = asn1_length(content.len())?;
        self.buf.reserve(1 + length.len() + content.len());
        self.buf.push(tag);
        self.buf.extend_from_slice(&length);
        self.buf.extend_from_slice(content);
        Ok(self)
    }

    /// Bytes written so far
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode an unsigned big-endian magnitude as a DER INTEGER
///
/// Redundant leading zero bytes are stripped and a single `0x00` is prepended
/// when the first remaining byte has its high bit set, so the value is never
/// read back as negative.
///
/// # Errors
///
/// Returns an error for empty input or oversized content
pub fn asn1_integer(magnitude: &[u8]) -> Result<Vec<u8>, Asn1Error> {
    if magnitude.is_empty() {
        return Err(Asn1Error::EmptyInteger);
    }

    let start = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len() - 1);
    let trimmed = &magnitude[start..];

    let mut content = Vec::with_capacity(trimmed.len() + 1);
    if trimmed.first().is_some_and(|&b| b & 0x80 != 0) {
        content.push(0x00);
    }
    content.extend_from_slice(trimmed);

    let mut writer = DerWriter::new();
    writer.tlv(TAG_INTEGER, &content)?;
    Ok(writer.finish())
}

/// Wrap already-encoded elements in a SEQUENCE
///
/// # Errors
///
/// Returns an error if the concatenated content is too long
pub fn asn1_sequence(elements: &[&[u8]]) -> Result<Vec<u8>, Asn1Error> {
    let content = elements.concat();
    let mut writer = DerWriter::new();
    writer.tlv(TAG_SEQUENCE, &content)?;
    Ok(writer.finish())
}

/// Encode bytes as a BIT STRING with zero unused bits
///
/// # Errors
///
/// Returns an error if the content is too long
pub fn asn1_bit_string(bytes: &[u8]) -> Result<Vec<u8>, Asn1Error> {
    let mut content = Vec::with_capacity(bytes.len() + 1);
    content.push(0x00);
    content.extend_from_slice(bytes);
    let mut writer = DerWriter::new();
    writer.tlv(TAG_BIT_STRING, &content)?;
    Ok(writer.finish())
}

/// Build the DER `SubjectPublicKeyInfo` for an RSA key from its raw components
///
/// # Errors
///
/// Returns an error if either component is empty or the structure is too large
pub fn rsa_subject_public_key_info(modulus: &[u8], exponent: &[u8]) -> Result<Vec<u8>, Asn1Error> {
    let n = asn1_integer(modulus)?;
    let e = asn1_integer(exponent)?;
    let rsa_public_key = asn1_sequence(&[&n, &e])?;
    let subject_public_key = asn1_bit_string(&rsa_public_key)?;
    asn1_sequence(&[&RSA_ENCRYPTION_ALGORITHM_ID, &subject_public_key])
}
