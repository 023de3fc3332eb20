// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime request building.
//!
//! A request carries the client nonce plus zero-filled padding so the
//! serialized message reaches the protocol's minimum request size. The
//! padding keeps requests at least as large as any response, which defeats
//! use of the protocol as a DDoS reflection amplifier.

use crate::nonce::{Nonce, NONCE_LEN};
use crate::wire::{self, tag};

/// Minimum serialized request size in bytes.
pub const MIN_REQUEST_SIZE: usize = 1024;

/// Build a padded request message for the given nonce.
///
/// Deterministic given the nonce; no I/O. The output is exactly
/// [`MIN_REQUEST_SIZE`] bytes: tags `PAD` and `NONC` in wire order, with the
/// padding sized to fill the remainder.
pub fn build_request(nonce: &Nonce) -> Vec<u8> {
    // An unpadded single-tag message is 4 + 4 + 32 = 40 bytes, so padding is
    // always required to reach the floor. Header for two tags:
    // 4 (count) + 4 (one offset) + 8 (two tags).
    const HEADER_LEN: usize = 4 + 4 + 2 * 4;
    let pad_len = MIN_REQUEST_SIZE - HEADER_LEN - NONCE_LEN;
    let padding = vec![0u8; pad_len];

    // Sorted by LE u32 value: PAD\0 < NONC.
    let request = wire::encode(&[(tag::PAD, padding.as_slice()), (tag::NONC, nonce.as_bytes())]);
    debug_assert_eq!(request.len(), MIN_REQUEST_SIZE);
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Message;

    #[test]
    fn test_request_is_min_size() {
        let nonce = Nonce::from([0xAB; 32]);
        let request = build_request(&nonce);
        assert_eq!(request.len(), MIN_REQUEST_SIZE);
    }

    #[test]
    fn test_request_contains_nonce() {
        let nonce = Nonce::from([0x5C; 32]);
        let request = build_request(&nonce);
        let msg = Message::parse(&request).unwrap();
        assert_eq!(msg.require(&tag::NONC).unwrap(), nonce.as_bytes());
    }

    #[test]
    fn test_request_padding_is_zero_filled() {
        let nonce = Nonce::from([1u8; 32]);
        let request = build_request(&nonce);
        let msg = Message::parse(&request).unwrap();
        let pad = msg.require(&tag::PAD).unwrap();
        assert!(pad.iter().all(|&b| b == 0));
        assert_eq!(pad.len(), MIN_REQUEST_SIZE - 16 - NONCE_LEN);
    }

    #[test]
    fn test_request_deterministic() {
        let nonce = Nonce::from([9u8; 32]);
        assert_eq!(build_request(&nonce), build_request(&nonce));
    }
}
