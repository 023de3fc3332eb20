// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Modified-Julian-Date timestamp decoding and epoch conversion.
//!
//! A Roughtime timestamp is a `u64` whose most significant 3 bytes hold the
//! integer part of a Modified Julian Date (days since 17 November 1858) and
//! whose least significant 5 bytes count UTC microseconds since midnight on
//! that day. 1 January 1970 is MJD 40,587.
//!
//! All conversion arithmetic is checked: overflow (or a day before the Unix
//! epoch) is reported as a decode error, never silently wrapped.

use crate::error::DecodeError;

/// Number of Julian days from 17 November 1858 to 1 January 1970.
pub const MJD_UNIX_EPOCH_DAYS: u64 = 40_587;

const SECONDS_PER_DAY: u64 = 86_400;
const MICROS_PER_SECOND: u64 = 1_000_000;

/// Number of bits holding the microseconds-of-day field.
const MICROS_BITS: u32 = 40;
const MICROS_MASK: u64 = (1 << MICROS_BITS) - 1;

/// A raw 64-bit Roughtime timestamp in MJD/microseconds encoding.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct RoughTimestamp(u64);

impl RoughTimestamp {
    /// Wrap a raw wire-format timestamp.
    pub fn from_raw(raw: u64) -> RoughTimestamp {
        RoughTimestamp(raw)
    }

    /// The raw wire-format value.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// The Modified Julian Day count (upper 24 bits).
    pub fn mjd(self) -> u64 {
        self.0 >> MICROS_BITS
    }

    /// Microseconds since midnight UTC on the MJD day (lower 40 bits).
    pub fn micros_of_day(self) -> u64 {
        self.0 & MICROS_MASK
    }

    /// Convert to microseconds since the Unix epoch, corrected by half the
    /// measured round-trip time.
    ///
    /// The half-round-trip term projects the server's send-time estimate to
    /// "now" under the symmetric-path assumption. Timestamps before the Unix
    /// epoch and any intermediate overflow are rejected as
    /// [`DecodeError::IntegerOverflow`].
    pub fn to_epoch_us(self, round_trip_us: u64) -> Result<u64, DecodeError> {
        let days = self
            .mjd()
            .checked_sub(MJD_UNIX_EPOCH_DAYS)
            .ok_or(DecodeError::IntegerOverflow)?;
        days.checked_mul(SECONDS_PER_DAY)
            .and_then(|s| s.checked_mul(MICROS_PER_SECOND))
            .and_then(|us| us.checked_add(self.micros_of_day()))
            .and_then(|us| us.checked_add(round_trip_us / 2))
            .ok_or(DecodeError::IntegerOverflow)
    }

    /// Convert to whole seconds since the Unix epoch, corrected by half the
    /// measured round-trip time.
    pub fn to_epoch_secs(self, round_trip_us: u64) -> Result<u64, DecodeError> {
        Ok(self.to_epoch_us(round_trip_us)? / MICROS_PER_SECOND)
    }
}

/// A verified midpoint/radius pair extracted from a Roughtime response.
///
/// Only constructed by the response verifier after both signature checks and
/// the Merkle path check have succeeded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SignedTime {
    /// Midpoint timestamp in MJD/microseconds encoding.
    pub midpoint: RoughTimestamp,
    /// Server-stated error radius in microseconds.
    pub radius_us: u32,
}
