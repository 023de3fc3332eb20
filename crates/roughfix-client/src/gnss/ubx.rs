// UBX binary protocol framing and NAV-PVT decoding.
//
// Frames are scanned incrementally: sync bytes 0xB5 0x62, class, id, LE u16
// payload length, payload, then a two-byte Fletcher checksum over everything
// from the class byte onward. Any defect drops back to sync search; the
// parser never trusts the declared length beyond a fixed ceiling.

use core::fmt;

use chrono::NaiveDate;

use super::{FixType, GnssFix};

/// First UBX sync byte.
pub const SYNC1: u8 = 0xB5;
/// Second UBX sync byte.
pub const SYNC2: u8 = 0x62;

/// Hard ceiling on accepted payload lengths. Frames declaring more are
/// discarded before any buffering happens.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// UBX-NAV-PVT message class.
pub const NAV_CLASS: u8 = 0x01;
/// UBX-NAV-PVT message id.
pub const NAV_PVT_ID: u8 = 0x07;
/// Minimum UBX-NAV-PVT payload length.
pub const NAV_PVT_LEN: usize = 92;

/// Errors from UBX payload decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UbxError {
    /// Payload shorter than the message's fixed layout.
    TruncatedPayload {
        /// Bytes required by the layout.
        needed: usize,
        /// Bytes present.
        available: usize,
    },
}

impl fmt::Display for UbxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UbxError::TruncatedPayload { needed, available } => {
                write!(f, "UBX payload truncated: needed {needed} bytes, got {available}")
            }
        }
    }
}

impl std::error::Error for UbxError {}

/// A complete, checksum-verified UBX frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    /// Message class byte.
    pub class: u8,
    /// Message id byte.
    pub id: u8,
    /// Message payload.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Whether this frame is a NAV-PVT navigation solution.
    pub fn is_nav_pvt(&self) -> bool {
        self.class == NAV_CLASS && self.id == NAV_PVT_ID
    }
}

#[derive(Clone, Copy, Debug)]
enum State {
    Sync1,
    Sync2,
    Class,
    Id,
    LenLo,
    LenHi,
    Payload,
    CkA,
    CkB,
}

/// Incremental UBX frame scanner.
///
/// Feed bytes one at a time with [`FrameParser::push`]; a complete frame is
/// returned once its checksum verifies. Corrupt input silently resynchronizes
/// on the next sync sequence.
#[derive(Debug)]
pub struct FrameParser {
    state: State,
    class: u8,
    id: u8,
    len: usize,
    payload: Vec<u8>,
    ck_a: u8,
    ck_b: u8,
}

impl Default for FrameParser {
    fn default() -> Self {
        FrameParser::new()
    }
}

impl FrameParser {
    /// Create a parser in sync-search state.
    pub fn new() -> FrameParser {
        FrameParser {
            state: State::Sync1,
            class: 0,
            id: 0,
            len: 0,
            payload: Vec::new(),
            ck_a: 0,
            ck_b: 0,
        }
    }

    fn checksum_add(&mut self, byte: u8) {
        self.ck_a = self.ck_a.wrapping_add(byte);
        self.ck_b = self.ck_b.wrapping_add(self.ck_a);
    }

    /// Consume one input byte; returns a frame when one completes.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            State::Sync1 => {
                if byte == SYNC1 {
                    self.state = State::Sync2;
                }
            }
            State::Sync2 => {
                self.state = match byte {
                    SYNC2 => State::Class,
                    SYNC1 => State::Sync2,
                    _ => State::Sync1,
                };
            }
            State::Class => {
                self.class = byte;
                self.ck_a = 0;
                self.ck_b = 0;
                self.checksum_add(byte);
                self.state = State::Id;
            }
            State::Id => {
                self.id = byte;
                self.checksum_add(byte);
                self.state = State::LenLo;
            }
            State::LenLo => {
                self.len = byte as usize;
                self.checksum_add(byte);
                self.state = State::LenHi;
            }
            State::LenHi => {
                self.len |= (byte as usize) << 8;
                self.checksum_add(byte);
                if self.len > MAX_PAYLOAD_LEN {
                    self.state = State::Sync1;
                } else {
                    self.payload.clear();
                    self.payload.reserve(self.len);
                    self.state = if self.len == 0 {
                        State::CkA
                    } else {
                        State::Payload
                    };
                }
            }
            State::Payload => {
                self.payload.push(byte);
                self.checksum_add(byte);
                if self.payload.len() == self.len {
                    self.state = State::CkA;
                }
            }
            State::CkA => {
                self.state = if byte == self.ck_a {
                    State::CkB
                } else {
                    State::Sync1
                };
            }
            State::CkB => {
                self.state = State::Sync1;
                if byte == self.ck_b {
                    return Some(Frame {
                        class: self.class,
                        id: self.id,
                        payload: core::mem::take(&mut self.payload),
                    });
                }
            }
        }
        None
    }
}

/// Decoded UBX-NAV-PVT fields relevant to timing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NavPvt {
    /// UTC year.
    pub year: u16,
    /// UTC month (1-12).
    pub month: u8,
    /// UTC day of month (1-31).
    pub day: u8,
    /// UTC hour.
    pub hour: u8,
    /// UTC minute.
    pub min: u8,
    /// UTC second (may read 60 during a leap second).
    pub sec: u8,
    /// Validity flags: bit 0 validDate, bit 1 validTime, bit 2 fullyResolved.
    pub valid: u8,
    /// Time accuracy estimate in nanoseconds.
    pub t_acc_ns: u32,
    /// Sub-second UTC correction in nanoseconds (signed).
    pub nano: i32,
    /// Fix type byte.
    pub fix_type: u8,
    /// Fix status flags: bit 0 gnssFixOK.
    pub flags: u8,
    /// Number of satellites used in the solution.
    pub num_sv: u8,
}

const VALID_DATE: u8 = 0x01;
const VALID_TIME: u8 = 0x02;
const FULLY_RESOLVED: u8 = 0x04;
const FLAGS_GNSS_FIX_OK: u8 = 0x01;

impl NavPvt {
    /// Decode a NAV-PVT payload.
    pub fn parse(payload: &[u8]) -> Result<NavPvt, UbxError> {
        if payload.len() < NAV_PVT_LEN {
            return Err(UbxError::TruncatedPayload {
                needed: NAV_PVT_LEN,
                available: payload.len(),
            });
        }
        Ok(NavPvt {
            year: u16::from_le_bytes([payload[4], payload[5]]),
            month: payload[6],
            day: payload[7],
            hour: payload[8],
            min: payload[9],
            sec: payload[10],
            valid: payload[11],
            t_acc_ns: u32::from_le_bytes([payload[12], payload[13], payload[14], payload[15]]),
            nano: i32::from_le_bytes([payload[16], payload[17], payload[18], payload[19]]),
            fix_type: payload[20],
            flags: payload[21],
            num_sv: payload[23],
        })
    }

    /// Whether both the date and time fields are flagged valid.
    pub fn time_valid(&self) -> bool {
        self.valid & (VALID_DATE | VALID_TIME) == (VALID_DATE | VALID_TIME)
    }

    /// Whether UTC time is fully resolved (sub-second field trustworthy).
    pub fn fully_resolved(&self) -> bool {
        self.valid & FULLY_RESOLVED != 0
    }

    /// Convert to a [`GnssFix`].
    ///
    /// The UTC timestamp is only populated when the calendar fields are
    /// flagged valid and form a real date; otherwise the fix carries
    /// `valid_time: false` and a zero timestamp.
    pub fn to_fix(&self) -> GnssFix {
        let utc_us = self.utc_epoch_us();
        GnssFix {
            utc_us: utc_us.unwrap_or(0),
            valid_time: utc_us.is_some(),
            fully_resolved: self.fully_resolved(),
            fix_ok: self.flags & FLAGS_GNSS_FIX_OK != 0,
            fix_type: FixType::from_raw(self.fix_type),
            num_satellites: self.num_sv,
            time_accuracy_ns: self.t_acc_ns,
        }
    }

    fn utc_epoch_us(&self) -> Option<i64> {
        if !self.time_valid() {
            return None;
        }
        // A leap second reads as sec=60; clamp into the previous second the
        // way gpsd does rather than rejecting the whole fix.
        let sec = self.sec.min(59);
        let date = NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?;
        let dt = date.and_hms_opt(self.hour as u32, self.min as u32, sec as u32)?;
        let secs = dt.and_utc().timestamp();
        Some(secs * 1_000_000 + (self.nano / 1_000) as i64)
    }
}
