// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared fixture builder: assembles fully signed Roughtime responses from
//! locally generated root and delegated keypairs, mirroring what a server
//! would produce for a single-client batch.

use ring::signature::{Ed25519KeyPair, KeyPair};

use roughfix_proto::nonce::Nonce;
use roughfix_proto::verify::{leaf_hash, DELEGATION_CONTEXT, RESPONSE_CONTEXT};
use roughfix_proto::wire::{self, tag};

/// A deterministic server identity: long-term root key plus delegated key.
pub struct ServerKeys {
    pub root: Ed25519KeyPair,
    pub delegated: Ed25519KeyPair,
}

impl ServerKeys {
    /// Derive both keypairs from fixed seeds so fixtures are reproducible.
    pub fn fixed() -> ServerKeys {
        ServerKeys {
            root: Ed25519KeyPair::from_seed_unchecked(&[0x11; 32]).unwrap(),
            delegated: Ed25519KeyPair::from_seed_unchecked(&[0x22; 32]).unwrap(),
        }
    }

    pub fn root_public_key(&self) -> [u8; 32] {
        let mut pk = [0u8; 32];
        pk.copy_from_slice(self.root.public_key().as_ref());
        pk
    }
}

/// Parameters for a synthesized response.
pub struct ResponseParams {
    pub midpoint: u64,
    pub radius_us: u32,
    pub min_time: u64,
    pub max_time: u64,
    /// Merkle root override; defaults to the leaf hash of the nonce
    /// (single-leaf tree).
    pub root_hash: Option<[u8; 32]>,
    /// Inclusion path; empty for a single-leaf tree.
    pub path: Vec<u8>,
    pub index: u32,
}

impl ResponseParams {
    /// A single-leaf batch whose midpoint sits inside the delegation window.
    pub fn single_leaf(midpoint: u64, radius_us: u32) -> ResponseParams {
        ResponseParams {
            midpoint,
            radius_us,
            min_time: midpoint.saturating_sub(1_000_000),
            max_time: midpoint.saturating_add(1_000_000),
            root_hash: None,
            path: Vec::new(),
            index: 0,
        }
    }
}

/// Assemble and sign a complete response for `nonce`.
pub fn build_response(keys: &ServerKeys, nonce: &Nonce, params: &ResponseParams) -> Vec<u8> {
    // DELE, sorted: PUBK < MINT < MAXT.
    let dele = wire::encode(&[
        (tag::PUBK, keys.delegated.public_key().as_ref()),
        (tag::MINT, &params.min_time.to_le_bytes()),
        (tag::MAXT, &params.max_time.to_le_bytes()),
    ]);

    // Certificate signature: root key over the delegation context.
    let mut to_sign = DELEGATION_CONTEXT.to_vec();
    to_sign.extend_from_slice(&dele);
    let cert_sig = keys.root.sign(&to_sign);

    // CERT, sorted: SIG < DELE.
    let cert = wire::encode(&[(tag::SIG, cert_sig.as_ref()), (tag::DELE, &dele)]);

    // SREP, sorted: RADI < MIDP < ROOT.
    let root_hash = params.root_hash.unwrap_or_else(|| leaf_hash(nonce));
    let srep = wire::encode(&[
        (tag::RADI, &params.radius_us.to_le_bytes()),
        (tag::MIDP, &params.midpoint.to_le_bytes()),
        (tag::ROOT, &root_hash),
    ]);

    // Response signature: delegated key over the response context.
    let mut to_sign = RESPONSE_CONTEXT.to_vec();
    to_sign.extend_from_slice(&srep);
    let response_sig = keys.delegated.sign(&to_sign);

    // Top level, sorted: SIG < PATH < SREP < CERT < INDX.
    wire::encode(&[
        (tag::SIG, response_sig.as_ref()),
        (tag::PATH, &params.path),
        (tag::SREP, &srep),
        (tag::CERT, &cert),
        (tag::INDX, &params.index.to_le_bytes()),
    ])
}
