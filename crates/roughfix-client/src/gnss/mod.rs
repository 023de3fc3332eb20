// GNSS collaborator: UBX decoding, serial ingestion, and the shared fix
// snapshot consumed by the Roughtime session driver.
//
// The ingestion side runs on its own thread and only ever publishes complete
// snapshots; the exchange side only ever reads the latest one. Neither flow
// blocks the other.

use std::sync::{Arc, Mutex};
use std::time::Instant;

pub mod receiver;
pub mod ubx;

pub use receiver::{GnssReceiver, GnssReceiverConfig};

/// GNSS fix quality, from the UBX fixType field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FixType {
    /// No position fix.
    NoFix,
    /// Dead reckoning only.
    DeadReckoning,
    /// Two-dimensional fix.
    Fix2D,
    /// Three-dimensional fix.
    Fix3D,
    /// Combined GNSS and dead reckoning.
    GnssDeadReckoning,
    /// Time-only fix (survey-in / timing receivers).
    TimeOnly,
    /// Reserved or unknown value.
    Unknown(u8),
}

impl FixType {
    /// Map the raw UBX fixType byte.
    pub fn from_raw(raw: u8) -> FixType {
        match raw {
            0 => FixType::NoFix,
            1 => FixType::DeadReckoning,
            2 => FixType::Fix2D,
            3 => FixType::Fix3D,
            4 => FixType::GnssDeadReckoning,
            5 => FixType::TimeOnly,
            other => FixType::Unknown(other),
        }
    }

    /// Whether the receiver is producing usable time (position not required).
    pub fn provides_time(&self) -> bool {
        !matches!(self, FixType::NoFix | FixType::Unknown(_))
    }
}

/// A decoded navigation fix, reduced to the fields the time comparison needs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GnssFix {
    /// UTC timestamp of the fix in microseconds since the Unix epoch.
    /// Only meaningful when `valid_time` is set.
    pub utc_us: i64,
    /// Whether the receiver flagged date and time valid and they formed a
    /// real calendar instant.
    pub valid_time: bool,
    /// Whether UTC is fully resolved (sub-second field trustworthy).
    pub fully_resolved: bool,
    /// Receiver's own fix-OK gate.
    pub fix_ok: bool,
    /// Fix quality.
    pub fix_type: FixType,
    /// Satellites used in the solution.
    pub num_satellites: u8,
    /// Receiver's time accuracy estimate in nanoseconds.
    pub time_accuracy_ns: u32,
}

/// A fix paired with the monotonic instant its frame was read from the
/// transport. The arrival instant lets the session driver correct for
/// processing latency between frame arrival and the Roughtime exchange.
#[derive(Clone, Copy, Debug)]
pub struct GnssSnapshot {
    /// The decoded fix.
    pub fix: GnssFix,
    /// Monotonic arrival instant of the frame.
    pub arrival: Instant,
}

/// Shared slot holding the most recent GNSS snapshot.
///
/// A single mutex guards the whole snapshot, so readers always observe a
/// consistent fix/arrival pair and never a partially updated one. Writers
/// replace the slot wholesale.
#[derive(Clone, Debug, Default)]
pub struct FixStore {
    slot: Arc<Mutex<Option<GnssSnapshot>>>,
}

impl FixStore {
    /// Create an empty store.
    pub fn new() -> FixStore {
        FixStore::default()
    }

    /// Publish a new snapshot, replacing any previous one.
    pub fn publish(&self, fix: GnssFix, arrival: Instant) {
        let mut slot = self.slot.lock().expect("GNSS snapshot lock poisoned");
        *slot = Some(GnssSnapshot { fix, arrival });
    }

    /// The most recent snapshot, if any fix has been published yet.
    ///
    /// Possibly stale by design: the exchange loop reads whatever is
    /// available rather than waiting for an update.
    pub fn latest(&self) -> Option<GnssSnapshot> {
        *self.slot.lock().expect("GNSS snapshot lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(utc_us: i64) -> GnssFix {
        GnssFix {
            utc_us,
            valid_time: true,
            fully_resolved: true,
            fix_ok: true,
            fix_type: FixType::Fix3D,
            num_satellites: 8,
            time_accuracy_ns: 100,
        }
    }

    #[test]
    fn test_store_starts_empty() {
        assert!(FixStore::new().latest().is_none());
    }

    #[test]
    fn test_store_returns_latest() {
        let store = FixStore::new();
        let t0 = Instant::now();
        store.publish(fix(1_000), t0);
        store.publish(fix(2_000), t0);
        let snap = store.latest().unwrap();
        assert_eq!(snap.fix.utc_us, 2_000);
    }

    #[test]
    fn test_store_clone_shares_slot() {
        let store = FixStore::new();
        let reader = store.clone();
        store.publish(fix(7), Instant::now());
        assert_eq!(reader.latest().unwrap().fix.utc_us, 7);
    }

    #[test]
    fn test_concurrent_publish_and_read() {
        let store = FixStore::new();
        let writer = store.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..1_000 {
                writer.publish(fix(i), Instant::now());
            }
        });
        // Readers only ever see complete snapshots.
        for _ in 0..1_000 {
            if let Some(snap) = store.latest() {
                assert!(snap.fix.valid_time);
            }
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_fix_type_mapping() {
        assert_eq!(FixType::from_raw(0), FixType::NoFix);
        assert_eq!(FixType::from_raw(3), FixType::Fix3D);
        assert_eq!(FixType::from_raw(5), FixType::TimeOnly);
        assert_eq!(FixType::from_raw(9), FixType::Unknown(9));
        assert!(FixType::TimeOnly.provides_time());
        assert!(!FixType::NoFix.provides_time());
    }
}
