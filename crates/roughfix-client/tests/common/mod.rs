// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures: a canned-response transport and a locally signed
//! single-leaf Roughtime response, so session tests can exercise the full
//! verify path without a network or a real server.

use std::time::Duration;

use ring::signature::{Ed25519KeyPair, KeyPair};

use roughfix_client::error::TransportError;
use roughfix_client::transport::Transport;
use roughfix_proto::nonce::Nonce;
use roughfix_proto::verify::{leaf_hash, DELEGATION_CONTEXT, RESPONSE_CONTEXT};
use roughfix_proto::wire::{self, tag};

/// Transport that returns a pre-baked response regardless of the request.
pub struct CannedTransport {
    pub response: Vec<u8>,
}

impl Transport for CannedTransport {
    fn send_and_receive(
        &self,
        _address: &str,
        request: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        assert_eq!(request.len(), roughfix_proto::MIN_REQUEST_SIZE);
        Ok(self.response.clone())
    }
}

/// Server identity with deterministic keys.
pub struct ServerKeys {
    pub root: Ed25519KeyPair,
    pub delegated: Ed25519KeyPair,
}

impl ServerKeys {
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

/// Build a signed single-leaf response for `nonce` with the given midpoint.
pub fn build_response(keys: &ServerKeys, nonce: &Nonce, midpoint: u64, radius_us: u32) -> Vec<u8> {
    let dele = wire::encode(&[
        (tag::PUBK, keys.delegated.public_key().as_ref()),
        (tag::MINT, &midpoint.saturating_sub(1_000_000).to_le_bytes()),
        (tag::MAXT, &midpoint.saturating_add(1_000_000).to_le_bytes()),
    ]);
    let mut to_sign = DELEGATION_CONTEXT.to_vec();
    to_sign.extend_from_slice(&dele);
    let cert_sig = keys.root.sign(&to_sign);
    let cert = wire::encode(&[(tag::SIG, cert_sig.as_ref()), (tag::DELE, &dele)]);

    let root_hash = leaf_hash(nonce);
    let srep = wire::encode(&[
        (tag::RADI, &radius_us.to_le_bytes()),
        (tag::MIDP, &midpoint.to_le_bytes()),
        (tag::ROOT, &root_hash),
    ]);
    let mut to_sign = RESPONSE_CONTEXT.to_vec();
    to_sign.extend_from_slice(&srep);
    let response_sig = keys.delegated.sign(&to_sign);

    wire::encode(&[
        (tag::SIG, response_sig.as_ref()),
        (tag::PATH, &[]),
        (tag::SREP, &srep),
        (tag::CERT, &cert),
        (tag::INDX, &0u32.to_le_bytes()),
    ])
}
