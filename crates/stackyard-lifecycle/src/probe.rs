//! HTTP readiness probing against published host ports.
//!
//! The probe only confirms that something behind the port accepts
//! connections and answers; it does not judge semantic health. Any HTTP
//! response (including 4xx/5xx) counts as ready, and so does a
//! connection that was accepted but answered with something reqwest
//! cannot digest. Refused connections and timeouts do not.

use std::time::Duration;

use reqwest::blocking::Client;

/// Per-attempt probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds the blocking client used for readiness probes.
#[must_use]
pub fn probe_client() -> Client {
    Client::builder()
        .timeout(PROBE_TIMEOUT)
        .connect_timeout(PROBE_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Probes one host port on the loopback interface.
#[must_use]
pub fn probe_port(client: &Client, port: u16) -> bool {
    let url = format!("http://127.0.0.1:{port}/");
    match client.get(&url).send() {
        Ok(response) => {
            tracing::debug!(port, status = %response.status(), "probe answered");
            true
        }
        Err(error) => {
            let connected = !(error.is_connect() || error.is_timeout());
            tracing::debug!(port, %error, connected, "probe errored");
            connected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn reserve_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    }

    #[test]
    fn refused_connection_is_not_ready() {
        let port = reserve_port();
        // Listener dropped; the port now refuses connections.
        assert!(!probe_port(&probe_client(), port));
    }

    #[test]
    fn http_error_response_counts_as_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let server = std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0_u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(
                    b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                );
            }
        });

        assert!(probe_port(&probe_client(), port));
        server.join().expect("server thread");
    }
}
