// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Client error taxonomy.
//!
//! Configuration errors are reported before any network activity;
//! transport and verification errors abort the current exchange and are
//! retried only by the caller's repeat loop.

use std::fmt;
use std::io;

use roughfix_proto::{NonceError, VerifyError};

/// Errors that can occur during a Roughtime exchange.
#[derive(Debug)]
pub enum ClientError {
    /// Invalid configuration (bad key/nonce material, bad address).
    Config(ConfigError),
    /// The transport failed to complete the round trip.
    Transport(TransportError),
    /// The response failed decoding or cryptographic verification.
    Verify(VerifyError),
    /// Underlying I/O error outside the transport path.
    Io(io::Error),
}

/// Configuration errors, fatal before any network activity.
#[derive(Clone, Debug)]
pub enum ConfigError {
    /// Key or nonce material was not valid base64.
    InvalidBase64 {
        /// Which flag carried the bad value.
        what: &'static str,
        /// Decoder detail.
        detail: String,
    },
    /// The public key did not decode to exactly 32 bytes.
    InvalidKeyLength {
        /// Decoded length.
        actual: usize,
    },
    /// The nonce failed validation.
    InvalidNonce(NonceError),
}

/// Transport-level failures for a single request/response round trip.
#[derive(Debug)]
pub enum TransportError {
    /// The address resolved to no socket addresses.
    NoAddresses {
        /// The address that failed to resolve.
        address: String,
    },
    /// The configured timeout elapsed while awaiting the response.
    Timeout,
    /// Socket-level failure (bind, send, receive).
    Io(io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(e) => write!(f, "configuration error: {e}"),
            ClientError::Transport(e) => write!(f, "transport error: {e}"),
            ClientError::Verify(e) => write!(f, "verification error: {e}"),
            ClientError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBase64 { what, detail } => {
                write!(f, "invalid base64 {what}: {detail}")
            }
            ConfigError::InvalidKeyLength { actual } => {
                write!(f, "public key must decode to 32 bytes, got {actual}")
            }
            ConfigError::InvalidNonce(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NoAddresses { address } => {
                write!(f, "address resolved to no socket addresses: {address}")
            }
            TransportError::Timeout => write!(f, "request timed out"),
            TransportError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Config(e) => Some(e),
            ClientError::Transport(e) => Some(e),
            ClientError::Verify(e) => Some(e),
            ClientError::Io(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidNonce(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> ClientError {
        ClientError::Config(err)
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> ClientError {
        ClientError::Transport(err)
    }
}

impl From<VerifyError> for ClientError {
    fn from(err: VerifyError) -> ClientError {
        ClientError::Verify(err)
    }
}

impl From<NonceError> for ClientError {
    fn from(err: NonceError) -> ClientError {
        ClientError::Config(ConfigError::InvalidNonce(err))
    }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> ClientError {
        ClientError::Io(err)
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> TransportError {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TransportError::Timeout,
            _ => TransportError::Io(err),
        }
    }
}
