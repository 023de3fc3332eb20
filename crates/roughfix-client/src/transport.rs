// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! UDP transport for Roughtime exchanges.
//!
//! The session driver talks to the network only through the [`Transport`]
//! trait: one synchronous request/response round trip with a caller-supplied
//! timeout. The UDP implementation keeps a single outstanding request and a
//! fixed-ceiling receive buffer; it never sizes allocations from data the
//! peer controls.

use log::debug;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use roughfix_proto::MIN_REQUEST_SIZE;

use crate::error::TransportError;

/// Receive buffer ceiling. Responses are larger than requests but bounded;
/// anything beyond this is discarded by the datagram layer.
pub const RECV_BUF_SIZE: usize = 3 * MIN_REQUEST_SIZE;

/// A synchronous request/response transport.
///
/// Implementations perform exactly one round trip per call and must bound
/// the wait by `timeout`. The core never opens sockets itself.
pub trait Transport {
    /// Send `request` to `address` (`host:port`) and return the raw response.
    fn send_and_receive(
        &self,
        address: &str,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Blocking UDP transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpTransport;

/// Select the appropriate bind address based on the target address family.
fn bind_addr_for(target: &SocketAddr) -> &'static str {
    match target {
        SocketAddr::V4(_) => "0.0.0.0:0",
        SocketAddr::V6(_) => "[::]:0",
    }
}

impl Transport for UdpTransport {
    fn send_and_receive(
        &self,
        address: &str,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        // Resolve eagerly so resolution failure is distinguishable from a
        // network failure.
        let resolved: Vec<SocketAddr> = address
            .to_socket_addrs()
            .map_err(TransportError::Io)?
            .collect();
        let target = *resolved
            .first()
            .ok_or_else(|| TransportError::NoAddresses {
                address: address.to_string(),
            })?;

        let sock = UdpSocket::bind(bind_addr_for(&target))?;
        sock.set_read_timeout(Some(timeout))?;
        sock.set_write_timeout(Some(timeout))?;

        let sent = sock.send_to(request, target)?;
        debug!("sent {sent} bytes to {target:?}");

        let mut recv_buf = [0u8; RECV_BUF_SIZE];
        let (recv_len, src_addr) = sock.recv_from(&mut recv_buf)?;
        debug!("recv {recv_len} bytes from {src_addr:?}");

        Ok(recv_buf[..recv_len].to_vec())
    }
}
