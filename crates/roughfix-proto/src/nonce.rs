// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Client nonce generation and validation.
//!
//! The nonce is the client's only unpredictable contribution to an exchange
//! and the anchor of the Merkle leaf recomputation, so its length is enforced
//! at construction: a [`Nonce`] value always holds exactly 32 bytes.

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::error::NonceError;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 32;

/// A 32-byte client nonce.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Generate a fresh nonce from the OS cryptographically secure random
    /// generator.
    ///
    /// Failure of the underlying generator is fatal to the call and surfaces
    /// as [`NonceError::RandomUnavailable`]; there is no fallback to a
    /// weaker source.
    pub fn generate() -> Result<Nonce, NonceError> {
        let mut bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| NonceError::RandomUnavailable)?;
        Ok(Nonce(bytes))
    }

    /// Construct a nonce from caller-supplied material.
    ///
    /// The slice must be exactly 32 bytes; any other length is a
    /// configuration error, not a protocol error.
    pub fn from_slice(bytes: &[u8]) -> Result<Nonce, NonceError> {
        if bytes.len() != NONCE_LEN {
            return Err(NonceError::InvalidNonceLength {
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; NONCE_LEN];
        out.copy_from_slice(bytes);
        Ok(Nonce(out))
    }

    /// The raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Nonce {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; NONCE_LEN]> for Nonce {
    fn from(bytes: [u8; NONCE_LEN]) -> Nonce {
        Nonce(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct() {
        let a = Nonce::generate().unwrap();
        let b = Nonce::generate().unwrap();
        // Equal 32-byte nonces from a CSPRNG would be astronomically unlikely.
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_slice_exact_length() {
        let nonce = Nonce::from_slice(&[7u8; 32]).unwrap();
        assert_eq!(nonce.as_bytes(), &[7u8; 32]);
    }

    #[test]
    fn test_from_slice_too_short() {
        assert_eq!(
            Nonce::from_slice(&[0u8; 31]),
            Err(NonceError::InvalidNonceLength { actual: 31 })
        );
    }

    #[test]
    fn test_from_slice_too_long() {
        assert_eq!(
            Nonce::from_slice(&[0u8; 33]),
            Err(NonceError::InvalidNonceLength { actual: 33 })
        );
    }
}
