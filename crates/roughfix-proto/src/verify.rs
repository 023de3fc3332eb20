// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime response verification: chained Ed25519 signatures and the
//! SHA-512 Merkle inclusion proof.
//!
//! Verification is a bounded, deterministic CPU computation with no I/O.
//! The midpoint and radius are released to the caller only after the
//! certificate signature, the response signature, the Merkle path, and the
//! delegation bounds have all checked out; any failure is a hard stop.

use ring::{digest, signature};

use crate::error::VerifyError;
use crate::nonce::Nonce;
use crate::timestamp::{RoughTimestamp, SignedTime};
use crate::wire::{read_u32_le, read_u64_le, tag, Message};

/// Context string prepended to the delegation (certificate) signature.
///
/// Distinct from [`RESPONSE_CONTEXT`] so a signature produced in one context
/// can never be replayed as valid in the other. Servers and test fixtures
/// sign with these exact byte strings, trailing NUL included.
pub const DELEGATION_CONTEXT: &[u8] = b"RoughTime v1 delegation signature--\x00";

/// Context string prepended to the signed-response signature.
pub const RESPONSE_CONTEXT: &[u8] = b"RoughTime v1 response signature\x00";

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Merkle hash length in bytes (SHA-512 truncated).
pub const HASH_LEN: usize = 32;

/// Compute the Merkle leaf hash for a client nonce.
///
/// `SHA-512(0x00 || nonce)[..32]`. The `0x00` prefix domain-separates leaves
/// from internal nodes.
pub fn leaf_hash(nonce: &Nonce) -> [u8; HASH_LEN] {
    let mut input = [0u8; 1 + 32];
    input[0] = 0x00;
    input[1..].copy_from_slice(nonce.as_bytes());
    truncated_sha512(&input)
}

/// Compute a Merkle internal-node hash from two child hashes.
///
/// `SHA-512(0x01 || left || right)[..32]`.
pub fn node_hash(left: &[u8; HASH_LEN], right: &[u8; HASH_LEN]) -> [u8; HASH_LEN] {
    let mut input = [0u8; 1 + 2 * HASH_LEN];
    input[0] = 0x01;
    input[1..1 + HASH_LEN].copy_from_slice(left);
    input[1 + HASH_LEN..].copy_from_slice(right);
    truncated_sha512(&input)
}

fn truncated_sha512(input: &[u8]) -> [u8; HASH_LEN] {
    let full = digest::digest(&digest::SHA512, input);
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&full.as_ref()[..HASH_LEN]);
    out
}

/// Verify an Ed25519 signature over `context || message`.
fn verify_signature(
    public_key: &[u8],
    context: &'static [u8],
    message: &[u8],
    sig: &[u8],
) -> Result<(), ring::error::Unspecified> {
    let pk = signature::UnparsedPublicKey::new(&signature::ED25519, public_key);
    let mut signed = Vec::with_capacity(context.len() + message.len());
    signed.extend_from_slice(context);
    signed.extend_from_slice(message);
    pk.verify(&signed, sig)
}

/// Verify the Merkle inclusion path from the nonce's leaf to `root`.
///
/// `path` is consumed in 32-byte sibling chunks; at each level the
/// corresponding low bit of `index` decides whether the running hash is the
/// left or right child, and `index` is shifted right by one.
fn verify_merkle_path(
    nonce: &Nonce,
    root: &[u8],
    path: &[u8],
    mut index: u32,
) -> Result<(), VerifyError> {
    if !path.len().is_multiple_of(HASH_LEN) {
        return Err(VerifyError::MerklePathMismatch);
    }

    let mut current = leaf_hash(nonce);
    for sibling in path.chunks_exact(HASH_LEN) {
        let mut sib = [0u8; HASH_LEN];
        sib.copy_from_slice(sibling);
        current = if index & 1 == 0 {
            node_hash(&current, &sib)
        } else {
            node_hash(&sib, &current)
        };
        index >>= 1;
    }

    // Residual index bits would place the leaf outside a tree of this depth.
    if index != 0 {
        return Err(VerifyError::MerklePathMismatch);
    }

    if current != root[..HASH_LEN] {
        return Err(VerifyError::MerklePathMismatch);
    }
    Ok(())
}

/// Fully verify a Roughtime response and extract the signed time.
///
/// Pipeline:
/// 1. parse the top-level message;
/// 2. parse the nested `CERT`, `DELE`, and `SREP` messages;
/// 3. verify `CERT.SIG` by the root key over the byte-exact `DELE` encoding
///    under the delegation context;
/// 4. verify the top-level `SIG` by the delegated key over the byte-exact
///    `SREP` encoding under the response context;
/// 5. recompute the nonce's leaf and walk `PATH`/`INDX` to `SREP.ROOT`;
/// 6. check the midpoint against the delegation's `MINT`/`MAXT` window;
/// 7. only then return the midpoint and radius.
pub fn verify_response(
    response: &[u8],
    nonce: &Nonce,
    root_public_key: &[u8; PUBLIC_KEY_LEN],
) -> Result<SignedTime, VerifyError> {
    let msg = Message::parse(response)?;

    // Certificate: nested (DELE, SIG), with SIG by the long-term root key.
    let cert = msg.nested(&tag::CERT)?;
    let dele_bytes = cert.require(&tag::DELE)?;
    let cert_sig = cert.require_fixed(&tag::SIG, SIGNATURE_LEN)?;
    verify_signature(root_public_key, DELEGATION_CONTEXT, dele_bytes, cert_sig)
        .map_err(|_| VerifyError::InvalidCertificateSignature)?;

    // Top-level signature over SREP by the delegated key from DELE.
    let dele = Message::parse(dele_bytes)?;
    let delegated_pk = dele.require_fixed(&tag::PUBK, PUBLIC_KEY_LEN)?;
    let srep_bytes = msg.require(&tag::SREP)?;
    let response_sig = msg.require_fixed(&tag::SIG, SIGNATURE_LEN)?;
    verify_signature(delegated_pk, RESPONSE_CONTEXT, srep_bytes, response_sig)
        .map_err(|_| VerifyError::InvalidResponseSignature)?;

    // Merkle inclusion of the client's nonce.
    let srep = Message::parse(srep_bytes)?;
    let root = srep.require_fixed(&tag::ROOT, HASH_LEN)?;
    let index = read_u32_le(msg.require(&tag::INDX)?, &tag::INDX)?;
    let path = msg.require(&tag::PATH)?;
    verify_merkle_path(nonce, root, path, index)?;

    // Midpoint must fall inside the delegation's validity window.
    let midpoint = read_u64_le(srep.require(&tag::MIDP)?, &tag::MIDP)?;
    let radius_us = read_u32_le(srep.require(&tag::RADI)?, &tag::RADI)?;
    let min_time = read_u64_le(dele.require(&tag::MINT)?, &tag::MINT)?;
    let max_time = read_u64_le(dele.require(&tag::MAXT)?, &tag::MAXT)?;
    if midpoint < min_time || midpoint > max_time {
        return Err(VerifyError::DelegationOutOfBounds);
    }

    Ok(SignedTime {
        midpoint: RoughTimestamp::from_raw(midpoint),
        radius_us,
    })
}
