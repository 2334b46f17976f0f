//! SSDP M-SEARCH client
//!
//! Sends one multicast search and collects unicast replies until the socket
//! read timeout fires.

use crate::error::{DiscoveryError, Result};
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;

const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// The headers of one SSDP search reply that discovery cares about
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SsdpResponse {
    pub location: String,
    pub search_target: String,
    pub usn: String,
    pub server: Option<String>,
}

pub(crate) struct SsdpClient {
    socket: UdpSocket,
}

impl SsdpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| DiscoveryError::Network(format!("Failed to bind UDP socket: {e}")))?;
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| DiscoveryError::Network(format!("Failed to set read timeout: {e}")))?;
        socket
            .set_multicast_loop_v4(true)
            .map_err(|e| DiscoveryError::Network(format!("Failed to set multicast loop: {e}")))?;

        Ok(Self { socket })
    }

    /// Send an M-SEARCH for `search_target` and gather every well-formed reply.
    ///
    /// Malformed datagrams are skipped. The search ends at the first read
    /// timeout; any other socket error fails the search.
    pub fn search(&self, search_target: &str) -> Result<Vec<SsdpResponse>> {
        let request = format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {SSDP_MULTICAST_ADDR}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: 2\r\n\
             ST: {search_target}\r\n\
             USER-AGENT: sonos-driver/1.0 UPnP/1.0\r\n\
             \r\n"
        );

        self.socket
            .send_to(request.as_bytes(), SSDP_MULTICAST_ADDR)
            .map_err(|e| DiscoveryError::Network(format!("Failed to send M-SEARCH: {e}")))?;

        let mut buffer = [0u8; 2048];
        let mut responses = Vec::new();
        loop {
            match self.socket.recv_from(&mut buffer) {
                Ok((size, from)) => match std::str::from_utf8(&buffer[..size])
                    .ok()
                    .and_then(parse_ssdp_response)
                {
                    Some(response) => responses.push(response),
                    None => tracing::trace!(%from, "ignoring malformed SSDP reply"),
                },
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    break
                }
                Err(e) => return Err(DiscoveryError::Network(format!("Socket error: {e}"))),
            }
        }

        tracing::debug!(count = responses.len(), "SSDP search finished");
        Ok(responses)
    }
}

/// Parse an SSDP reply. `LOCATION`, `ST` and `USN` are required.
pub(crate) fn parse_ssdp_response(text: &str) -> Option<SsdpResponse> {
    let mut location = None;
    let mut search_target = None;
    let mut usn = None;
    let mut server = None;

    for line in text.lines().map(str::trim) {
        if let Some(value) = header_value(line, "LOCATION") {
            location = Some(value);
        } else if let Some(value) = header_value(line, "ST") {
            search_target = Some(value);
        } else if let Some(value) = header_value(line, "USN") {
            usn = Some(value);
        } else if let Some(value) = header_value(line, "SERVER") {
            server = Some(value);
        }
    }

    Some(SsdpResponse {
        location: location?,
        search_target: search_target?,
        usn: usn?,
        server,
    })
}

/// Value of `name: value` when the header name matches case-insensitively
fn header_value(line: &str, name: &str) -> Option<String> {
    let (key, value) = line.split_once(':')?;
    key.trim()
        .eq_ignore_ascii_case(name)
        .then(|| value.trim().to_string())
}
