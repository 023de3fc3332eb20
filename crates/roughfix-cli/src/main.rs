// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! `roughfix`: query a Roughtime server, verify the signed timestamp, and
//! report the offset against the system clock and (optionally) a serial
//! GNSS receiver.

use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use roughfix_client::gnss::{GnssReceiver, GnssReceiverConfig};
use roughfix_client::session::{
    decode_nonce, decode_public_key, CancelFlag, Session, SessionConfig,
};
use roughfix_client::transport::UdpTransport;
use roughfix_client::ClientError;

/// Offset ceiling against the system clock when no GNSS receiver is
/// attached. An estimate this far off means either clock cannot be trusted.
const MAX_SYSTEM_OFFSET_US: i64 = 10 * 60 * 1_000_000;

#[derive(Debug, Parser)]
#[command(
    name = "roughfix",
    version,
    about = "Authenticated Roughtime client with optional GNSS cross-check"
)]
struct Args {
    /// Roughtime server address as <hostname:port>.
    #[arg(long)]
    host: String,

    /// Base64 root public key (must decode to exactly 32 bytes).
    #[arg(long)]
    key: String,

    /// Base64 fixed nonce overriding random generation (must decode to
    /// exactly 32 bytes).
    #[arg(long)]
    nonce: Option<String>,

    /// Delay in seconds between repeated exchanges.
    #[arg(long, default_value_t = 1)]
    intervals: u64,

    /// Number of exchanges to perform.
    #[arg(long, default_value_t = 1)]
    repeats: u32,

    /// Serial device of the GNSS receiver (e.g. /dev/ttyUSB0).
    #[arg(long)]
    gpsport: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Configuration errors are fatal before any network activity.
    let root_public_key = match decode_public_key(&args.key) {
        Ok(key) => key,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let nonce = match args.nonce.as_deref().map(decode_nonce).transpose() {
        Ok(nonce) => nonce,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if args.repeats < 1 {
        error!("at least one exchange has to be performed");
        return ExitCode::FAILURE;
    }

    let receiver = match args.gpsport {
        Some(device) => {
            match GnssReceiver::spawn(GnssReceiverConfig {
                device,
                ..GnssReceiverConfig::default()
            }) {
                Ok(receiver) => Some(receiver),
                Err(e) => {
                    error!("{e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => None,
    };
    let store = receiver.as_ref().map(|r| r.store());

    // The signal handler's only job is to set the flag; the loop notices it
    // at iteration boundaries.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            warn!("failed to install signal handler: {e}");
        }
    }

    let mut config = SessionConfig::new(args.host, root_public_key);
    config.nonce = nonce;
    let mut session = Session::new(config);
    let transport = UdpTransport;
    let interval = Duration::from_secs(args.intervals);

    let mut status = ExitCode::SUCCESS;
    for attempt in 1..=args.repeats {
        if cancel.is_cancelled() {
            info!("terminating");
            break;
        }

        println!("--------------- START ---------------");
        match session.exchange(&transport, store.as_ref()) {
            Ok(report) => {
                println!("Received reply in {}us.", report.round_trip.as_micros());
                println!(
                    "Current time is {}us from the epoch, ±{}us",
                    report.epoch_us, report.radius_us
                );
                println!(
                    "System clock differs from that estimate by {}us.",
                    report.system_offset_us
                );
                if let Some(offset) = report.gnss_offset_us {
                    println!("GNSS clock differs from that estimate by {offset}us.");
                }

                if store.is_none() && report.system_offset_us.abs() > MAX_SYSTEM_OFFSET_US {
                    error!("system clock offset exceeds the ten-minute safety threshold");
                    status = ExitCode::FAILURE;
                    println!("--------------- STOP ---------------");
                    break;
                }
            }
            Err(e) => {
                report_exchange_error(&e);
                if args.repeats == 1 {
                    status = ExitCode::FAILURE;
                }
            }
        }
        println!("--------------- STOP ---------------");

        if attempt < args.repeats {
            cancel.sleep_interruptibly(interval);
        }
    }

    status
}

fn report_exchange_error(err: &ClientError) {
    match err {
        ClientError::Transport(e) => error!("error making request: {e}"),
        ClientError::Verify(e) => error!("error verifying response: {e}"),
        other => error!("exchange failed: {other}"),
    }
}
