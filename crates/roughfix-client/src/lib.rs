// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Roughtime session driver with GNSS cross-check.

This crate wires the `roughfix-proto` protocol engine to the outside world:
a blocking UDP transport, a session state machine measuring round-trip
times and deriving clock offsets, and a GNSS collaborator that ingests UBX
NAV-PVT solutions from a serial receiver into a shared snapshot the
exchange loop can read without blocking.

# Example

```no_run
use roughfix_client::session::{Session, SessionConfig, decode_public_key};
use roughfix_client::transport::UdpTransport;

let key = decode_public_key("0GD7c3yP8xEc4Zl2zeuN2SlLvDVVocjsPSL8/Rl/7zg=").unwrap();
let mut session = Session::new(SessionConfig::new("roughtime.example.net:2002", key));
let report = session.exchange(&UdpTransport, None).unwrap();
println!(
    "epoch {}us ±{}us, system offset {}us",
    report.epoch_us, report.radius_us, report.system_offset_us
);
```
*/

#![warn(missing_docs)]
#![deny(unsafe_code)]

/// Client error taxonomy.
pub mod error;

/// GNSS collaborator: UBX decoding, serial ingestion, shared fix snapshot.
pub mod gnss;

/// Session driver and exchange reporting.
pub mod session;

/// Transport seam and the blocking UDP implementation.
pub mod transport;

// Re-export the protocol engine for callers that need direct access.
pub use roughfix_proto as proto;

pub use error::{ClientError, ConfigError, TransportError};
pub use session::{CancelFlag, ExchangeReport, Session, SessionConfig, SessionState};
pub use transport::{Transport, UdpTransport};
