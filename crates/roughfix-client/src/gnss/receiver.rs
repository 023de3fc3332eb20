// Serial GNSS ingestion worker.
//
// Reads UBX bytes from a serial device on a dedicated thread, decodes
// NAV-PVT solutions, and publishes each one into the shared FixStore
// together with its monotonic arrival instant. The loop never touches the
// network and stops cooperatively via a shared flag.

use log::{debug, warn};
use serialport::SerialPort;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::ubx::{FrameParser, NavPvt};
use super::FixStore;

/// Serial GNSS receiver configuration.
#[derive(Clone, Debug)]
pub struct GnssReceiverConfig {
    /// Serial device path (e.g. "/dev/ttyUSB0", "/dev/ttyACM0", "COM3").
    pub device: PathBuf,
    /// Baud rate; u-blox modules default to 9600.
    pub baud_rate: u32,
}

impl Default for GnssReceiverConfig {
    fn default() -> Self {
        GnssReceiverConfig {
            device: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 9_600,
        }
    }
}

/// Handle to a running GNSS ingestion worker.
///
/// Dropping the handle signals the worker to stop and joins it.
pub struct GnssReceiver {
    store: FixStore,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl GnssReceiver {
    /// Open the serial device and start the ingestion thread.
    pub fn spawn(config: GnssReceiverConfig) -> io::Result<GnssReceiver> {
        let port = serialport::new(config.device.to_string_lossy(), config.baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| io::Error::other(format!("failed to open GNSS serial port: {e}")))?;

        let store = FixStore::new();
        let stop = Arc::new(AtomicBool::new(false));

        let worker_store = store.clone();
        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("gnss-ingest".into())
            .spawn(move || ingest_loop(port, worker_store, worker_stop))?;

        Ok(GnssReceiver {
            store,
            stop,
            worker: Some(worker),
        })
    }

    /// The shared snapshot store fed by this receiver.
    pub fn store(&self) -> FixStore {
        self.store.clone()
    }
}

impl Drop for GnssReceiver {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn ingest_loop(mut port: Box<dyn SerialPort>, store: FixStore, stop: Arc<AtomicBool>) {
    let mut parser = FrameParser::new();
    let mut buf = [0u8; 512];

    while !stop.load(Ordering::Relaxed) {
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                // Arrival is stamped once per read burst; NAV-PVT frames
                // complete within a burst at navigation-rate traffic.
                let arrival = Instant::now();
                for &byte in &buf[..n] {
                    let Some(frame) = parser.push(byte) else {
                        continue;
                    };
                    if !frame.is_nav_pvt() {
                        continue;
                    }
                    match NavPvt::parse(&frame.payload) {
                        Ok(pvt) => {
                            let fix = pvt.to_fix();
                            debug!(
                                "GNSS fix: type={:?} sats={} valid_time={} tAcc={}ns",
                                fix.fix_type, fix.num_satellites, fix.valid_time,
                                fix.time_accuracy_ns
                            );
                            store.publish(fix, arrival);
                        }
                        Err(e) => debug!("NAV-PVT decode error: {e}"),
                    }
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!("GNSS serial read error: {e}");
                break;
            }
        }
    }

    debug!("GNSS ingestion loop exiting");
}
