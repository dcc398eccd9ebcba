// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deterministic key derivation (HKDF-SHA384, RFC 5869).
//!
//! Turns an operator-supplied secret plus a context label into key material.
//! The same `(secret, context)` pair always produces the same byte stream,
//! so a restarted server derives the same JWT signing key.
//!
//! ## Salt
//!
//! The salt is a public constant shared by every deployment. Knowing it does
//! not reveal any key: the operator secret is still required. It is decoded
//! once at startup into a [`KeySalt`] which is then passed by reference to
//! every derivation.
//!
//! Changing the salt constant changes every derived key and invalidates all
//! tokens issued before the change.

use std::io::{self, Read};

use base64ct::{Base64UrlUnpadded, Encoding};
use hkdf::Hkdf;
use sha2::Sha384;

/// SHA-384 output width in bytes.
const HASH_LEN: usize = 48;

/// Maximum number of bytes a single derivation stream can produce.
pub const MAX_STREAM_LEN: usize = 255 * HASH_LEN;

/// Built-in salt, base64url without padding (128 bytes decoded).
const EMBEDDED_SALT: &str = "liL1g3zrBg6UwNIR_1R1JC1txDfIzjGQPzVzkrhQtDgPkNe0iEOuaKbAY1zR7HRpz8KvA0aypSM8UDg5-rleJB5yBmehYxTSkc1kyge8I-fG-lyVZQX4KKGKvsSErRgvxOBQ9puxbFHnnonEOsmE6pimqu6vRx7PxXFwG-NSxYo";

#[derive(Debug, thiserror::Error)]
pub enum KeyGenError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("keygen initialization failed: {0}")]
    Initialization(String),

    #[error("key stream error: {0}")]
    Stream(#[from] io::Error),
}

/// Decoded HKDF salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySalt(Vec<u8>);

impl KeySalt {
    /// Decode the built-in salt constant.
    ///
    /// Failure means a broken build and should abort startup.
    pub fn embedded() -> Result<Self, KeyGenError> {
        Self::from_encoded(EMBEDDED_SALT)
    }

    fn from_encoded(encoded: &str) -> Result<Self, KeyGenError> {
        Base64UrlUnpadded::decode_vec(encoded)
            .map(Self)
            .map_err(|e| KeyGenError::Initialization(format!("salt decode: {e}")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Extendable-output key stream bound to one `(secret, context)` pair.
///
/// Each `read` continues where the previous one stopped, so successive reads
/// yield independent-looking chunks of the same derivation.
pub struct KeyGen {
    hkdf: Hkdf<Sha384>,
    info: Vec<u8>,
    position: usize,
}

impl KeyGen {
    pub fn new(salt: &KeySalt, secret: &str, context: &str) -> Result<Self, KeyGenError> {
        Ok(Self {
            hkdf: Hkdf::<Sha384>::new(Some(salt.as_bytes()), secret.as_bytes()),
            info: context.as_bytes().to_vec(),
            position: 0,
        })
    }

    /// Bytes left before the stream hits the RFC 5869 output limit.
    pub fn remaining(&self) -> usize {
        MAX_STREAM_LEN - self.position
    }
}

impl Read for KeyGen {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.len() > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "key stream output limit reached",
            ));
        }

        // HKDF output is prefix-stable: expand up to the new end and keep the tail.
        let end = self.position + buf.len();
        let mut okm = vec![0u8; end];
        self.hkdf
            .expand(&self.info, &mut okm)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        buf.copy_from_slice(&okm[self.position..]);
        self.position = end;
        Ok(buf.len())
    }
}

/// Derive `size` bytes of key material for `(secret, context)`.
///
/// Equivalent to reading the first `size` bytes of a fresh [`KeyGen`].
pub fn generate(
    salt: &KeySalt,
    secret: &str,
    context: &str,
    size: usize,
) -> Result<Vec<u8>, KeyGenError> {
    if size == 0 {
        return Err(KeyGenError::InvalidArgument("key size must be positive"));
    }
    let mut key = vec![0u8; size];
    KeyGen::new(salt, secret, context)?.read_exact(&mut key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt() -> KeySalt {
        KeySalt::embedded().unwrap()
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn embedded_salt_decodes() {
        assert_eq!(salt().as_bytes().len(), 128);
    }

    #[test]
    fn malformed_salt_is_initialization_error() {
        let err = KeySalt::from_encoded("not*base64!").unwrap_err();
        assert!(matches!(err, KeyGenError::Initialization(_)));
    }

    #[test]
    fn generate_matches_known_output() {
        let key = generate(&salt(), "test secret", "JWT signature key", 32).unwrap();
        assert_eq!(
            hex(&key),
            "9e612da1862590e1dda0a07ac1436e3e428bcd30ccaa9b92e842ff74d596ab66"
        );

        let empty = generate(&salt(), "", "", 16).unwrap();
        assert_eq!(hex(&empty), "062b89dc4ca5d038013c40a8953a2c47");
    }

    #[test]
    fn same_inputs_same_key() {
        let a = generate(&salt(), "secret", "ctx", 64).unwrap();
        let b = generate(&salt(), "secret", "ctx", 64).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn different_secret_different_key() {
        let a = generate(&salt(), "secret", "ctx", 32).unwrap();
        let b = generate(&salt(), "secret2", "ctx", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_context_different_key() {
        let a = generate(&salt(), "secret", "ctx", 32).unwrap();
        let b = generate(&salt(), "secret", "other ctx", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_size_different_key() {
        let a = generate(&salt(), "secret", "ctx", 32).unwrap();
        let b = generate(&salt(), "secret", "ctx", 48).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn zero_size_is_invalid_argument() {
        let err = generate(&salt(), "secret", "ctx", 0).unwrap_err();
        assert!(matches!(err, KeyGenError::InvalidArgument(_)));
    }

    #[test]
    fn sequential_reads_are_reproducible_and_distinct() {
        let salt = salt();
        let mut first = KeyGen::new(&salt, "secret", "ctx").unwrap();
        let mut second = KeyGen::new(&salt, "secret", "ctx").unwrap();

        let mut chunks = Vec::new();
        for _ in 0..3 {
            let mut a = [0u8; 16];
            let mut b = [0u8; 16];
            first.read_exact(&mut a).unwrap();
            second.read_exact(&mut b).unwrap();
            assert_eq!(a, b);
            chunks.push(a);
        }
        assert_ne!(chunks[0], chunks[1]);
        assert_ne!(chunks[1], chunks[2]);
        assert_ne!(chunks[0], chunks[2]);
    }

    #[test]
    fn chunked_reads_match_single_read() {
        let salt = salt();
        let whole = generate(&salt, "secret", "ctx", 100).unwrap();

        let mut stream = KeyGen::new(&salt, "secret", "ctx").unwrap();
        let mut pieces = vec![0u8; 100];
        stream.read_exact(&mut pieces[..30]).unwrap();
        stream.read_exact(&mut pieces[30..47]).unwrap();
        stream.read_exact(&mut pieces[47..]).unwrap();

        assert_eq!(whole, pieces);
    }

    #[test]
    fn stream_stops_at_output_limit() {
        let mut stream = KeyGen::new(&salt(), "secret", "ctx").unwrap();
        let mut all = vec![0u8; MAX_STREAM_LEN];
        stream.read_exact(&mut all).unwrap();
        assert_eq!(stream.remaining(), 0);

        let mut one = [0u8; 1];
        assert!(stream.read(&mut one).is_err());
        assert!(generate(&salt(), "secret", "ctx", MAX_STREAM_LEN + 1).is_err());
    }
}
