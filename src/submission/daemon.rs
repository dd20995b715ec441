// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! UDP submitter for the local X-Ray daemon.
//!
//! The daemon accepts one segment document per datagram, preceded by a
//! protocol header line. Delivery is fire and forget; failures are logged
//! and swallowed.

use std::env;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use anyhow::{Context, Result};

use crate::submission::SegmentSubmitter;
use crate::trace::Trace;

/// Address used when `AWS_XRAY_DAEMON_ADDRESS` is not set.
pub const DEFAULT_DAEMON_ADDRESS: &str = "127.0.0.1:2000";

const DAEMON_ADDRESS_VAR: &str = "AWS_XRAY_DAEMON_ADDRESS";

const PROTOCOL_HEADER: &str = r#"{"format": "json", "version": 1}"#;

/// Ships each sampled trace to the X-Ray daemon as a single UDP datagram.
pub struct DaemonSubmitter {
    socket: UdpSocket,
    daemon: SocketAddr,
}

impl DaemonSubmitter {
    /// Create a submitter targeting the given daemon address.
    ///
    /// Binding the local socket is the only fallible step; once
    /// constructed, submission itself never reports errors.
    pub fn new(addr: impl ToSocketAddrs) -> Result<Self> {
        let daemon = addr
            .to_socket_addrs()
            .context("invalid daemon address")?
            .next()
            .context("daemon address did not resolve")?;
        let socket = UdpSocket::bind("0.0.0.0:0").context("failed to bind local UDP socket")?;

        Ok(Self { socket, daemon })
    }

    /// Create a submitter from `AWS_XRAY_DAEMON_ADDRESS`, falling back to
    /// [`DEFAULT_DAEMON_ADDRESS`].
    pub fn from_env() -> Result<Self> {
        match env::var(DAEMON_ADDRESS_VAR) {
            Ok(addr) => Self::new(addr.as_str()),
            Err(_) => Self::new(DEFAULT_DAEMON_ADDRESS),
        }
    }
}

impl SegmentSubmitter for DaemonSubmitter {
    fn submit_segment(&self, trace: &Trace) {
        let document = match serde_json::to_string(trace) {
            Ok(document) => document,
            Err(err) => {
                log::warn!("failed to serialize trace document: {err}");
                return;
            }
        };

        let datagram = format!("{PROTOCOL_HEADER}\n{document}");

        if let Err(err) = self.socket.send_to(datagram.as_bytes(), self.daemon) {
            log::warn!("failed to send trace to daemon at {}: {err}", self.daemon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_submits_protocol_header_and_document() {
        let daemon = UdpSocket::bind("127.0.0.1:0").unwrap();
        daemon
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        let submitter = DaemonSubmitter::new(daemon.local_addr().unwrap()).unwrap();

        let mut trace = Trace::new();
        trace.set_name("daemon-test");
        trace.begin(100).end();
        trace.submit(&submitter);

        let mut buf = [0u8; 64 * 1024];
        let (received, _) = daemon.recv_from(&mut buf).unwrap();
        let datagram = std::str::from_utf8(&buf[..received]).unwrap();

        let (header, document) = datagram.split_once('\n').unwrap();
        assert_eq!(header, PROTOCOL_HEADER);

        let document: serde_json::Value = serde_json::from_str(document).unwrap();
        assert_eq!(document["name"], "daemon-test");
        assert_eq!(
            document["trace_id"],
            trace.trace_id().unwrap().as_str()
        );
    }
}
