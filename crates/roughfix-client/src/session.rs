// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime session driver.
//!
//! A [`Session`] owns the per-exchange context (address, root public key,
//! timeout, optional pinned nonce) and drives one request/verify cycle at a
//! time through the state machine `Idle → Requesting → AwaitingResponse →
//! Verified | Failed`. Replay protection comes from the nonce-to-response
//! binding checked by the verifier, so a forged or recorded earlier response
//! can never satisfy a later exchange's nonce.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use roughfix_proto::verify::PUBLIC_KEY_LEN;
use roughfix_proto::{build_request, verify_response, Nonce, SignedTime};

use crate::error::{ClientError, ConfigError};
use crate::gnss::{FixStore, GnssSnapshot};
use crate::transport::Transport;

/// Default exchange timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a Roughtime session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Server address as `host:port`.
    pub address: String,
    /// Long-term root Ed25519 public key.
    pub root_public_key: [u8; PUBLIC_KEY_LEN],
    /// Bound on how long a single round trip may take.
    pub timeout: Duration,
    /// Pinned nonce. When `None`, each exchange draws a fresh random nonce;
    /// a pinned nonce is intended for reproducing exchanges, not production.
    pub nonce: Option<Nonce>,
}

impl SessionConfig {
    /// Configuration with the default timeout and per-exchange nonces.
    pub fn new(address: impl Into<String>, root_public_key: [u8; PUBLIC_KEY_LEN]) -> SessionConfig {
        SessionConfig {
            address: address.into(),
            root_public_key,
            timeout: DEFAULT_TIMEOUT,
            nonce: None,
        }
    }
}

/// Observable state of the session's exchange cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// No exchange in progress.
    Idle,
    /// Building the request.
    Requesting,
    /// Request handed to the transport; awaiting the response.
    AwaitingResponse,
    /// Last exchange completed and verified.
    Verified,
    /// Last exchange failed; re-entering `exchange` starts a fresh cycle.
    Failed,
}

/// The result of one verified exchange.
#[derive(Clone, Copy, Debug)]
pub struct ExchangeReport {
    /// Measured round-trip time.
    pub round_trip: Duration,
    /// Corrected epoch estimate in microseconds (midpoint plus half the
    /// round trip).
    pub epoch_us: u64,
    /// Server-stated error radius in microseconds.
    pub radius_us: u32,
    /// Roughtime estimate minus the local system clock, in microseconds.
    /// Positive means the local clock is behind.
    pub system_offset_us: i64,
    /// Roughtime estimate minus the GNSS clock, in microseconds; present
    /// only when a valid GNSS fix snapshot was available.
    pub gnss_offset_us: Option<i64>,
}

/// Drives request/verify cycles against one Roughtime server.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
}

impl Session {
    /// Create an idle session.
    pub fn new(config: SessionConfig) -> Session {
        Session {
            config,
            state: SessionState::Idle,
        }
    }

    /// The session's current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Perform one request/verify exchange.
    ///
    /// Reads the most recent GNSS snapshot (possibly stale, never waited
    /// for) when a store is supplied. No retry happens here; the caller's
    /// repeat loop decides whether to try again after a failure.
    pub fn exchange<T: Transport>(
        &mut self,
        transport: &T,
        gnss: Option<&FixStore>,
    ) -> Result<ExchangeReport, ClientError> {
        self.state = SessionState::Requesting;
        let result = self.run_exchange(transport, gnss);
        self.state = match result {
            Ok(_) => SessionState::Verified,
            Err(_) => SessionState::Failed,
        };
        result
    }

    fn run_exchange<T: Transport>(
        &mut self,
        transport: &T,
        gnss: Option<&FixStore>,
    ) -> Result<ExchangeReport, ClientError> {
        let nonce = match self.config.nonce {
            Some(nonce) => nonce,
            None => Nonce::generate()?,
        };
        let request = build_request(&nonce);

        let sent_at = Instant::now();
        self.state = SessionState::AwaitingResponse;
        let response =
            transport.send_and_receive(&self.config.address, &request, self.config.timeout)?;
        let received_at = Instant::now();
        let round_trip = received_at.duration_since(sent_at);

        let SignedTime {
            midpoint,
            radius_us,
        } = verify_response(&response, &nonce, &self.config.root_public_key)?;

        // Half-round-trip correction projects the server's estimate to the
        // receive instant under the symmetric-path assumption.
        let round_trip_us = round_trip.as_micros() as u64;
        let epoch_us = midpoint
            .to_epoch_us(round_trip_us)
            .map_err(roughfix_proto::VerifyError::from)?;
        debug!("verified midpoint raw={} rtt={round_trip_us}us", midpoint.raw());

        let system_offset_us = epoch_us as i64 - system_now_us();
        let gnss_offset_us = gnss
            .and_then(|store| store.latest())
            .and_then(|snapshot| gnss_offset_us(epoch_us, &snapshot, received_at));

        Ok(ExchangeReport {
            round_trip,
            epoch_us,
            radius_us,
            system_offset_us,
            gnss_offset_us,
        })
    }
}

/// Offset of the Roughtime estimate against a GNSS fix, in microseconds.
///
/// This adjustment is deliberately separate from the half-round-trip
/// correction already folded into `epoch_us`: the estimate is first aged
/// back by the interval between the GNSS frame's monotonic arrival and the
/// response's arrival, so both clocks are compared at the same instant (the
/// frame's arrival). The fix timestamp is UTC as reported by the receiver,
/// so no GPS-UTC leap adjustment is applied.
pub fn gnss_offset_us(
    epoch_us: u64,
    snapshot: &GnssSnapshot,
    received_at: Instant,
) -> Option<i64> {
    if !snapshot.fix.valid_time {
        return None;
    }
    let age = received_at.checked_duration_since(snapshot.arrival)?;
    let age_us = i64::try_from(age.as_micros()).ok()?;
    let estimate_at_arrival = (epoch_us as i64).checked_sub(age_us)?;
    Some(estimate_at_arrival - snapshot.fix.utc_us)
}

fn system_now_us() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_micros() as i64,
        Err(before) => -(before.duration().as_micros() as i64),
    }
}

/// Cooperative cancellation flag shared between a signal handler (or any
/// other requester) and the repeat/interval loop.
///
/// The holder of the flag only ever sets it; the loop checks it at
/// iteration boundaries and never mid-verification.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A fresh, unset flag.
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleep in short slices so cancellation cuts the interval wait short.
    pub fn sleep_interruptibly(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;
            std::thread::sleep(remaining.min(Duration::from_millis(100)));
        }
        if self.is_cancelled() {
            info!("cancellation requested, stopping");
        }
    }
}

// ── Configuration decoding ──────────────────────────────────────────

/// Decode a base64 root public key; must decode to exactly 32 bytes.
pub fn decode_public_key(encoded: &str) -> Result<[u8; PUBLIC_KEY_LEN], ConfigError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ConfigError::InvalidBase64 {
            what: "public key",
            detail: e.to_string(),
        })?;
    if bytes.len() != PUBLIC_KEY_LEN {
        return Err(ConfigError::InvalidKeyLength {
            actual: bytes.len(),
        });
    }
    let mut key = [0u8; PUBLIC_KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// Decode a base64 fixed nonce; must decode to exactly 32 bytes.
pub fn decode_nonce(encoded: &str) -> Result<Nonce, ConfigError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ConfigError::InvalidBase64 {
            what: "nonce",
            detail: e.to_string(),
        })?;
    Nonce::from_slice(&bytes).map_err(ConfigError::InvalidNonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::gnss::{FixType, GnssFix};
    use base64::Engine as _;

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn send_and_receive(
            &self,
            _address: &str,
            _request: &[u8],
            _timeout: Duration,
        ) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Timeout)
        }
    }

    struct GarbageTransport;

    impl Transport for GarbageTransport {
        fn send_and_receive(
            &self,
            _address: &str,
            request: &[u8],
            _timeout: Duration,
        ) -> Result<Vec<u8>, TransportError> {
            // A well-sized request must have been handed over.
            assert_eq!(request.len(), roughfix_proto::MIN_REQUEST_SIZE);
            Ok(vec![0xFF; 128])
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig::new("localhost:2002", [0u8; 32])
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new(test_config());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_transport_failure_ends_failed() {
        let mut session = Session::new(test_config());
        let result = session.exchange(&FailingTransport, None);
        assert!(matches!(
            result,
            Err(ClientError::Transport(TransportError::Timeout))
        ));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_garbage_response_ends_failed() {
        let mut session = Session::new(test_config());
        let result = session.exchange(&GarbageTransport, None);
        assert!(matches!(result, Err(ClientError::Verify(_))));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_failed_session_can_retry() {
        let mut session = Session::new(test_config());
        let _ = session.exchange(&FailingTransport, None);
        assert_eq!(session.state(), SessionState::Failed);
        // A later exchange runs a full fresh cycle.
        let _ = session.exchange(&GarbageTransport, None);
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_gnss_offset_ages_estimate_to_arrival() {
        let arrival = Instant::now();
        let received_at = arrival + Duration::from_micros(250_000);
        let snapshot = GnssSnapshot {
            fix: GnssFix {
                utc_us: 1_000_000_000,
                valid_time: true,
                fully_resolved: true,
                fix_ok: true,
                fix_type: FixType::Fix3D,
                num_satellites: 10,
                time_accuracy_ns: 50,
            },
            arrival,
        };
        // Estimate at receive time: 1_000_300_000; aged back by 250 ms of
        // processing latency it lands 50 ms ahead of the fix.
        let offset = gnss_offset_us(1_000_300_000, &snapshot, received_at).unwrap();
        assert_eq!(offset, 50_000);
    }

    #[test]
    fn test_gnss_offset_requires_valid_time() {
        let arrival = Instant::now();
        let snapshot = GnssSnapshot {
            fix: GnssFix {
                utc_us: 0,
                valid_time: false,
                fully_resolved: false,
                fix_ok: false,
                fix_type: FixType::NoFix,
                num_satellites: 0,
                time_accuracy_ns: 0,
            },
            arrival,
        };
        assert!(gnss_offset_us(1_000_000, &snapshot, arrival).is_none());
    }

    #[test]
    fn test_cancel_flag_latches() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let remote = flag.clone();
        remote.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_cancelled_sleep_returns_promptly() {
        let flag = CancelFlag::new();
        flag.cancel();
        let start = Instant::now();
        flag.sleep_interruptibly(Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_decode_public_key_round_trip() {
        let encoded = BASE64.encode([0xAB; 32]);
        assert_eq!(decode_public_key(&encoded).unwrap(), [0xAB; 32]);
    }

    #[test]
    fn test_decode_public_key_wrong_length() {
        let encoded = BASE64.encode([0xAB; 16]);
        assert!(matches!(
            decode_public_key(&encoded),
            Err(ConfigError::InvalidKeyLength { actual: 16 })
        ));
    }

    #[test]
    fn test_decode_public_key_bad_base64() {
        assert!(matches!(
            decode_public_key("not!base64@@"),
            Err(ConfigError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn test_decode_nonce_lengths() {
        assert!(decode_nonce(&BASE64.encode([1u8; 32])).is_ok());
        for bad in [31usize, 33] {
            let encoded = BASE64.encode(vec![1u8; bad]);
            assert!(matches!(
                decode_nonce(&encoded),
                Err(ConfigError::InvalidNonce(_))
            ));
        }
    }
}
