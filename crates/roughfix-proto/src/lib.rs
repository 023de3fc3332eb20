// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime protocol engine: wire format, request building, and
//! cryptographic response verification.
//!
//! Roughtime is an authenticated coarse time protocol: the server returns a
//! midpoint timestamp and an error radius, signed by a delegated Ed25519 key
//! whose authority the long-term root key vouches for, with the client's
//! nonce bound into a SHA-512 Merkle tree covering the response batch.
//!
//! This crate is the pure protocol core; the only I/O it performs is
//! reading the OS random generator for nonces. Transports and session
//! orchestration live in `roughfix-client`.
//!
//! # Usage
//!
//! ```no_run
//! use roughfix_proto::nonce::Nonce;
//! use roughfix_proto::request::build_request;
//! use roughfix_proto::verify::verify_response;
//!
//! let nonce = Nonce::generate().unwrap();
//! let request = build_request(&nonce);
//!
//! // Send `request` via UDP to a Roughtime server, receive `response`.
//! # let response: Vec<u8> = vec![];
//! # let root_public_key = [0u8; 32];
//!
//! let time = verify_response(&response, &nonce, &root_public_key).unwrap();
//! let epoch_secs = time.midpoint.to_epoch_secs(1_000).unwrap();
//! println!("{epoch_secs} seconds since epoch, ±{}us", time.radius_us);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

/// Error types for decoding, verification, and nonce handling.
pub mod error;

/// Client nonce generation and validation.
pub mod nonce;

/// Padded request building.
pub mod request;

/// MJD timestamp decoding and epoch conversion.
pub mod timestamp;

/// Signature and Merkle path verification of responses.
pub mod verify;

/// Tag-value message wire codec.
pub mod wire;

pub use error::{DecodeError, NonceError, VerifyError};
pub use nonce::{Nonce, NONCE_LEN};
pub use request::{build_request, MIN_REQUEST_SIZE};
pub use timestamp::{RoughTimestamp, SignedTime};
pub use verify::verify_response;
