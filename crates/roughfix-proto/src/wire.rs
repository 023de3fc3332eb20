// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime tag-value message wire codec.
//!
//! Messages are tag-value maps: a tag count, a cumulative offset table, the
//! sorted tag table, then the concatenated value region. A value's length is
//! inferred from the next offset, so only the offset table bounds the values.
//!
//! Layout:
//! ```text
//! num_tags: u32 LE
//! offsets:  [u32 LE; N-1]   (cumulative end offsets into the value region)
//! tags:     [[u8; 4]; N]    (strictly ascending by LE u32 value)
//! values:   [u8]            (concatenated, 4-byte aligned except the last)
//! ```
//!
//! Decoding is a pure, zero-copy transform over the caller's buffer. All
//! size arithmetic on attacker-controlled counts is overflow-checked, and
//! every structural defect maps to a typed [`DecodeError`].

use crate::error::DecodeError;

/// A 4-byte message tag, compared as a little-endian `u32` for sort order.
pub type Tag = [u8; 4];

/// Well-known Roughtime tag constants.
pub mod tag {
    use super::Tag;

    /// Certificate: nested message containing DELE and SIG.
    pub const CERT: Tag = *b"CERT";
    /// Delegation: nested message containing PUBK, MINT, MAXT.
    pub const DELE: Tag = *b"DELE";
    /// Index of the client's leaf in the response Merkle tree.
    pub const INDX: Tag = *b"INDX";
    /// Maximum delegation validity timestamp.
    pub const MAXT: Tag = *b"MAXT";
    /// Midpoint timestamp (MJD/microseconds encoding).
    pub const MIDP: Tag = *b"MIDP";
    /// Minimum delegation validity timestamp.
    pub const MINT: Tag = *b"MINT";
    /// Client nonce (32 bytes).
    pub const NONC: Tag = *b"NONC";
    /// Request padding (zero-filled).
    pub const PAD: Tag = *b"PAD\0";
    /// Merkle inclusion path (32-byte siblings).
    pub const PATH: Tag = *b"PATH";
    /// Delegated public key (32 bytes, Ed25519).
    pub const PUBK: Tag = *b"PUBK";
    /// Error radius in microseconds.
    pub const RADI: Tag = *b"RADI";
    /// Merkle tree root (32 bytes).
    pub const ROOT: Tag = *b"ROOT";
    /// Ed25519 signature (64 bytes).
    pub const SIG: Tag = *b"SIG\0";
    /// Signed response: nested message containing RADI, MIDP, ROOT.
    pub const SREP: Tag = *b"SREP";
}

/// A zero-copy parsed tag-value message referencing borrowed data.
#[derive(Debug, PartialEq)]
pub struct Message<'a> {
    num_tags: u32,
    offsets: &'a [u8],
    tags: &'a [u8],
    values: &'a [u8],
}

impl<'a> Message<'a> {
    /// Parse a tag-value message from raw bytes.
    ///
    /// Rejects empty messages, truncated headers, out-of-order or duplicate
    /// tags, and non-monotonic or out-of-range offsets. Never reads past the
    /// supplied buffer.
    pub fn parse(buf: &'a [u8]) -> Result<Self, DecodeError> {
        if buf.len() < 4 {
            return Err(DecodeError::TruncatedBuffer {
                needed: 4,
                available: buf.len(),
            });
        }

        let num_tags = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if num_tags == 0 {
            return Err(DecodeError::EmptyMessage);
        }

        // Header: 4 (num_tags) + 4*(N-1) (offsets) + 4*N (tags). The count
        // is attacker-controlled, so the multiplications are checked.
        let n = num_tags as usize;
        let offsets_len = (n - 1)
            .checked_mul(4)
            .ok_or(DecodeError::IntegerOverflow)?;
        let tags_len = n.checked_mul(4).ok_or(DecodeError::IntegerOverflow)?;
        let header_len = offsets_len
            .checked_add(tags_len)
            .and_then(|l| l.checked_add(4))
            .ok_or(DecodeError::IntegerOverflow)?;

        if buf.len() < header_len {
            return Err(DecodeError::TruncatedBuffer {
                needed: header_len,
                available: buf.len(),
            });
        }

        let offsets = &buf[4..4 + offsets_len];
        let tags = &buf[4 + offsets_len..header_len];
        let values = &buf[header_len..];

        // Tags must be strictly ascending by LE u32 value; equality means a
        // duplicate and is rejected the same way.
        for i in 1..n {
            let prev = tag_to_u32(&tags[(i - 1) * 4..i * 4]);
            let curr = tag_to_u32(&tags[i * 4..(i + 1) * 4]);
            if prev >= curr {
                return Err(DecodeError::BadTagOrder);
            }
        }

        // Offsets must be monotonically non-decreasing and in bounds.
        let mut prev_offset = 0u32;
        for i in 0..offsets_len / 4 {
            let off = u32::from_le_bytes([
                offsets[i * 4],
                offsets[i * 4 + 1],
                offsets[i * 4 + 2],
                offsets[i * 4 + 3],
            ]);
            if off < prev_offset || off as usize > values.len() {
                return Err(DecodeError::OffsetOutOfRange);
            }
            prev_offset = off;
        }

        Ok(Message {
            num_tags,
            offsets,
            tags,
            values,
        })
    }

    /// Number of tags in the message.
    pub fn tag_count(&self) -> usize {
        self.num_tags as usize
    }

    /// Look up a tag's value. Returns `None` if the tag is not present.
    pub fn get(&self, tag: &Tag) -> Option<&'a [u8]> {
        let target = tag_to_u32(tag);

        for i in 0..self.num_tags as usize {
            let t = tag_to_u32(&self.tags[i * 4..(i + 1) * 4]);
            if t == target {
                let start = if i == 0 {
                    0
                } else {
                    self.offset_at(i - 1) as usize
                };
                let end = if i == self.num_tags as usize - 1 {
                    self.values.len()
                } else {
                    self.offset_at(i) as usize
                };
                return Some(&self.values[start..end]);
            }
        }
        None
    }

    /// Look up a required tag. Returns `MissingTag` if not found.
    pub fn require(&self, tag: &Tag) -> Result<&'a [u8], DecodeError> {
        self.get(tag).ok_or(DecodeError::MissingTag { tag: *tag })
    }

    /// Look up a required tag whose value must have an exact length.
    pub fn require_fixed(&self, tag: &Tag, len: usize) -> Result<&'a [u8], DecodeError> {
        let value = self.require(tag)?;
        if value.len() != len {
            return Err(DecodeError::TagLengthMismatch {
                tag: *tag,
                expected: len,
                actual: value.len(),
            });
        }
        Ok(value)
    }

    /// Parse a nested tag-value message from a tag's value.
    pub fn nested(&self, tag: &Tag) -> Result<Message<'a>, DecodeError> {
        Message::parse(self.require(tag)?)
    }

    fn offset_at(&self, idx: usize) -> u32 {
        u32::from_le_bytes([
            self.offsets[idx * 4],
            self.offsets[idx * 4 + 1],
            self.offsets[idx * 4 + 2],
            self.offsets[idx * 4 + 3],
        ])
    }
}

/// Serialize a tag-value message from sorted tag-value pairs.
///
/// This is the encoding half of the codec: deterministic, no I/O. Only this
/// crate's own request/fixture builders call it, so sort order and value
/// alignment are enforced with debug assertions rather than runtime errors.
///
/// # Panics
///
/// In debug builds, panics if tags are not strictly ascending by LE u32
/// value or if a value other than the last is not 4-byte aligned.
pub fn encode(entries: &[(Tag, &[u8])]) -> Vec<u8> {
    let num_tags = entries.len() as u32;
    if num_tags == 0 {
        return 0u32.to_le_bytes().to_vec();
    }

    for i in 1..entries.len() {
        debug_assert!(
            tag_to_u32(&entries[i - 1].0) < tag_to_u32(&entries[i].0),
            "tags must be strictly ascending in LE u32 order"
        );
    }
    for entry in entries.iter().take(entries.len() - 1) {
        debug_assert!(
            entry.1.len() % 4 == 0,
            "all values except the last must be 4-byte aligned"
        );
    }

    let offsets_len = (entries.len() - 1) * 4;
    let tags_len = entries.len() * 4;
    let values_len: usize = entries.iter().map(|e| e.1.len()).sum();
    let mut buf = Vec::with_capacity(4 + offsets_len + tags_len + values_len);

    buf.extend_from_slice(&num_tags.to_le_bytes());

    // Cumulative end offsets (N-1 entries).
    let mut cumulative = 0u32;
    for entry in entries.iter().take(entries.len() - 1) {
        cumulative += entry.1.len() as u32;
        buf.extend_from_slice(&cumulative.to_le_bytes());
    }

    for entry in entries {
        buf.extend_from_slice(&entry.0);
    }
    for entry in entries {
        buf.extend_from_slice(entry.1);
    }

    buf
}

/// Extract a little-endian `u32` from an exactly-4-byte tag value.
pub fn read_u32_le(data: &[u8], tag: &Tag) -> Result<u32, DecodeError> {
    if data.len() != 4 {
        return Err(DecodeError::TagLengthMismatch {
            tag: *tag,
            expected: 4,
            actual: data.len(),
        });
    }
    Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

/// Extract a little-endian `u64` from an exactly-8-byte tag value.
pub fn read_u64_le(data: &[u8], tag: &Tag) -> Result<u64, DecodeError> {
    if data.len() != 8 {
        return Err(DecodeError::TagLengthMismatch {
            tag: *tag,
            expected: 8,
            actual: data.len(),
        });
    }
    Ok(u64::from_le_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]))
}

/// Convert a 4-byte tag to a u32 for ordering comparison.
fn tag_to_u32(tag: &[u8]) -> u32 {
    u32::from_le_bytes([tag[0], tag[1], tag[2], tag[3]])
}
