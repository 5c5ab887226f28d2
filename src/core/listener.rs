//! Loopback callback listener for browser SSO.
//!
//! The identity provider finishes the browser sign-in by redirecting to
//! `http://localhost:<port>/?token=<urlencoded-token>`. This module binds an
//! ephemeral local port, launches the platform-default browser at the IdP
//! URL, and blocks for exactly that one request. The listener and the
//! browser are two independent OS processes meeting over localhost, so the
//! listener is bound (and given a short settle delay) before the browser is
//! ever launched.
//!
//! Everything here is synchronous; the async pipeline drives it through
//! `spawn_blocking`.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{Result, SightError};

/// Query prefix the browser redirect must carry.
const TOKEN_REQUEST_PREFIX: &str = "?token=";

/// Poll interval for the bounded accept loop.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Delay between binding the listener and launching the browser, covering
/// the window where the OS has accepted the bind but is not yet accepting
/// connections.
const LISTENER_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Confirmation page sent back to the browser; cosmetic only.
const SUCCESS_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=UTF-8\r\nConnection: close\r\n\r\n\
<!DOCTYPE html><html><head><meta charset=\"UTF-8\"/>\
<title> SAML Response for Snowflake </title></head>\
<body>Your identity was confirmed and propagated to sfsight. \
You can close this window now and go back to where you started from.\
</body></html>";

/// Bind `127.0.0.1:0`, read the OS-assigned port, release it.
///
/// # Errors
///
/// Propagates the bind failure.
pub fn pick_unused_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// Run the whole SSO rendezvous: bind `port`, launch the browser at
/// `idp_url`, and wait for the single callback request.
///
/// `timeout` of `None` blocks indefinitely; `Some(d)` turns expiry into a
/// distinct [`SightError::SsoTimeout`].
///
/// # Errors
///
/// `ProtocolViolation` when the inbound request is not the expected GET,
/// `SsoTimeout` on expiry, `Io` on socket failures.
pub fn run_sso_callback(idp_url: &str, port: u16, timeout: Option<Duration>) -> Result<String> {
    let listeners = bind_loopback(port)?;

    // Let the sockets settle before the browser can possibly navigate.
    std::thread::sleep(LISTENER_SETTLE_DELAY);

    info!(port, "opening system browser for SSO sign-in");
    if let Err(e) = open::that(idp_url) {
        return Err(SightError::Network(format!(
            "unable to launch the default browser: {e}"
        )));
    }

    wait_for_token(&listeners, timeout)
}

/// Bind the callback port on IPv4 loopback, and on IPv6 loopback when the
/// host resolves `localhost` there too. The IPv6 bind is best-effort.
///
/// # Errors
///
/// Propagates the IPv4 bind failure; IPv6 failures are swallowed.
pub fn bind_loopback(port: u16) -> Result<Vec<TcpListener>> {
    let v4 = TcpListener::bind(("127.0.0.1", port))?;
    v4.set_nonblocking(true)?;
    let mut listeners = vec![v4];

    if let Ok(v6) = TcpListener::bind(("::1", port)) {
        if v6.set_nonblocking(true).is_ok() {
            listeners.push(v6);
        }
    }

    Ok(listeners)
}

/// Block for exactly one inbound request on any of `listeners`, extract the
/// token, answer with the confirmation page.
///
/// The listeners are released when this returns, on every path.
///
/// # Errors
///
/// `ProtocolViolation` on a malformed request, `SsoTimeout` on expiry.
pub fn wait_for_token(
    listeners: &[TcpListener],
    timeout: Option<Duration>,
) -> Result<String> {
    let started = Instant::now();

    loop {
        for listener in listeners {
            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "SSO callback connection accepted");
                    return handle_callback(stream);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(SightError::Io(e)),
            }
        }

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                return Err(SightError::SsoTimeout {
                    seconds: limit.as_secs(),
                });
            }
        }
        std::thread::sleep(ACCEPT_POLL_INTERVAL);
    }
}

fn handle_callback(mut stream: TcpStream) -> Result<String> {
    stream.set_read_timeout(Some(Duration::from_secs(10)))?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let token = validate_and_extract_token(&request_line)?;

    // The page is cosmetic; a failed write must not discard the token.
    if let Err(e) = stream.write_all(SUCCESS_RESPONSE.as_bytes()) {
        warn!("confirmation page not delivered to browser: {e}");
    }

    Ok(token)
}

/// Validate the request line (`GET /?token=... HTTP/1.1`) and URL-decode the
/// token.
fn validate_and_extract_token(request_line: &str) -> Result<String> {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();

    if method != "GET" {
        return Err(SightError::ProtocolViolation(format!(
            "expected GET, got {method}"
        )));
    }

    let query = target.trim_start_matches('/');
    if !query.starts_with(TOKEN_REQUEST_PREFIX) {
        return Err(SightError::ProtocolViolation(format!(
            "query does not carry the token prefix: {target}"
        )));
    }

    let encoded = &query[TOKEN_REQUEST_PREFIX.len()..];
    let token = urlencoding::decode(encoded)
        .map_err(|e| SightError::ProtocolViolation(format!("token is not valid UTF-8: {e}")))?
        .into_owned();

    if token.is_empty() {
        return Err(SightError::ProtocolViolation("empty token".into()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_url_decoded_token() {
        let token =
            validate_and_extract_token("GET /?token=abc%3D%3D%20def HTTP/1.1\r\n").unwrap();
        assert_eq!(token, "abc== def");
    }

    #[test]
    fn rejects_non_get() {
        let err = validate_and_extract_token("POST /?token=abc HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, SightError::ProtocolViolation(_)));
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = validate_and_extract_token("GET /?code=abc HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, SightError::ProtocolViolation(_)));
    }

    #[test]
    fn picked_port_is_reusable() {
        let port = pick_unused_port().unwrap();
        // port was released, so binding it again must work
        let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
        drop(listener);
    }
}
