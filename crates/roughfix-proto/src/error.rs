// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for Roughtime message decoding and verification.
//!
//! Decoding and verification failures are kept as separate types because they
//! carry different trust implications: a [`DecodeError`] means the buffer was
//! not a well-formed message at all, while a [`VerifyError`] means a
//! well-formed message failed a cryptographic check. Wire-level failures
//! inside the verifier surface as [`VerifyError::MalformedResponse`].

use core::fmt;
use std::io;

/// Errors produced while decoding a tag-value message from raw bytes.
///
/// Decoding never panics and never returns a partial result; any structural
/// defect in the buffer yields exactly one of these variants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// The buffer is shorter than the structure it declares.
    TruncatedBuffer {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
    /// The message declares zero tags.
    EmptyMessage,
    /// Tags are not in strictly ascending little-endian order (this also
    /// covers duplicate tags).
    BadTagOrder,
    /// A value offset is non-monotonic or points beyond the value region.
    OffsetOutOfRange,
    /// Size arithmetic on declared counts would overflow.
    IntegerOverflow,
    /// A required tag is absent.
    MissingTag {
        /// The 4-byte ASCII tag that was expected.
        tag: [u8; 4],
    },
    /// A tag's value has an unexpected length.
    TagLengthMismatch {
        /// The 4-byte ASCII tag.
        tag: [u8; 4],
        /// The expected length in bytes.
        expected: usize,
        /// The actual length in bytes.
        actual: usize,
    },
}

/// Errors produced while verifying a Roughtime response.
///
/// Every variant is fatal to the exchange; the verifier never returns time
/// values alongside an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VerifyError {
    /// The response (or one of its nested messages) failed to decode.
    MalformedResponse(DecodeError),
    /// The certificate signature over the delegation is not a valid Ed25519
    /// signature by the root public key.
    InvalidCertificateSignature,
    /// The top-level signature over the signed response is not a valid
    /// Ed25519 signature by the delegated public key.
    InvalidResponseSignature,
    /// The Merkle inclusion path does not connect the nonce's leaf to the
    /// advertised root.
    MerklePathMismatch,
    /// The midpoint lies outside the delegation's validity window.
    DelegationOutOfBounds,
}

/// Errors produced by the nonce source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NonceError {
    /// Caller-supplied nonce material was not exactly 32 bytes.
    InvalidNonceLength {
        /// The length that was supplied.
        actual: usize,
    },
    /// The OS random generator failed. Never degraded to a weaker source.
    RandomUnavailable,
}

fn tag_str(tag: &[u8; 4]) -> &str {
    core::str::from_utf8(tag).unwrap_or("????")
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedBuffer { needed, available } => {
                write!(f, "message truncated: needed {needed} bytes, got {available}")
            }
            DecodeError::EmptyMessage => write!(f, "message declares zero tags"),
            DecodeError::BadTagOrder => write!(f, "tags not in strictly ascending order"),
            DecodeError::OffsetOutOfRange => write!(f, "value offset out of range"),
            DecodeError::IntegerOverflow => write!(f, "declared sizes overflow"),
            DecodeError::MissingTag { tag } => {
                write!(f, "missing required tag: {}", tag_str(tag))
            }
            DecodeError::TagLengthMismatch {
                tag,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "tag {} has invalid length: expected {expected}, got {actual}",
                    tag_str(tag)
                )
            }
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::MalformedResponse(e) => write!(f, "malformed response: {e}"),
            VerifyError::InvalidCertificateSignature => {
                write!(f, "invalid certificate signature over delegation")
            }
            VerifyError::InvalidResponseSignature => {
                write!(f, "invalid signature over signed response")
            }
            VerifyError::MerklePathMismatch => {
                write!(f, "Merkle inclusion path does not match root")
            }
            VerifyError::DelegationOutOfBounds => {
                write!(f, "midpoint outside delegation validity window")
            }
        }
    }
}

impl fmt::Display for NonceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonceError::InvalidNonceLength { actual } => {
                write!(f, "nonce must be 32 bytes, got {actual}")
            }
            NonceError::RandomUnavailable => {
                write!(f, "OS random generator unavailable")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
impl std::error::Error for NonceError {}

impl std::error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerifyError::MalformedResponse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for VerifyError {
    fn from(err: DecodeError) -> VerifyError {
        VerifyError::MalformedResponse(err)
    }
}

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> io::Error {
        let kind = match &err {
            DecodeError::TruncatedBuffer { .. } => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

impl From<VerifyError> for io::Error {
    fn from(err: VerifyError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

impl From<NonceError> for io::Error {
    fn from(err: NonceError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_truncated() {
        let err = DecodeError::TruncatedBuffer {
            needed: 16,
            available: 4,
        };
        assert_eq!(err.to_string(), "message truncated: needed 16 bytes, got 4");
    }

    #[test]
    fn test_display_missing_tag() {
        let err = DecodeError::MissingTag { tag: *b"NONC" };
        assert_eq!(err.to_string(), "missing required tag: NONC");
    }

    #[test]
    fn test_display_tag_length_mismatch() {
        let err = DecodeError::TagLengthMismatch {
            tag: *b"ROOT",
            expected: 32,
            actual: 16,
        };
        assert_eq!(
            err.to_string(),
            "tag ROOT has invalid length: expected 32, got 16"
        );
    }

    #[test]
    fn test_decode_error_wraps_as_malformed_response() {
        let verify: VerifyError = DecodeError::BadTagOrder.into();
        assert_eq!(
            verify,
            VerifyError::MalformedResponse(DecodeError::BadTagOrder)
        );
        assert!(verify.to_string().contains("ascending"));
    }

    #[test]
    fn test_into_io_error_kinds() {
        let io_err: io::Error = DecodeError::TruncatedBuffer {
            needed: 8,
            available: 0,
        }
        .into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);

        let io_err: io::Error = VerifyError::MerklePathMismatch.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);

        let io_err: io::Error = NonceError::RandomUnavailable.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_verify_error_source_chain() {
        let err = VerifyError::MalformedResponse(DecodeError::OffsetOutOfRange);
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "value offset out of range");
    }
}
