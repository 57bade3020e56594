//! Local port probing
//!
//! Port-forwards get a preferred local port; when it's taken we scan upward
//! for the next free one with a bind probe.

use crate::error::{OpsError, Result};
use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};
use tracing::debug;

/// How far past the preferred port the scan goes
const SCAN_RANGE: u16 = 200;

/// Check whether a local TCP port can currently be bound
#[must_use]
pub fn port_free(port: u16) -> bool {
    TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// Pick the first free local port at or above `preferred`
pub fn pick_port(preferred: u16) -> Result<u16> {
    pick_port_in(preferred, SCAN_RANGE)
}

/// Pick the first free port in `preferred..preferred+range`, erroring when
/// every port in the range is taken
pub fn pick_port_in(preferred: u16, range: u16) -> Result<u16> {
    let end = preferred.saturating_add(range);
    for port in preferred..end {
        if port_free(port) {
            if port != preferred {
                debug!("Preferred port {} taken, using {}", preferred, port);
            }
            return Ok(port);
        }
    }
    Err(OpsError::NoFreePort { preferred })
}
