//! SSO loopback listener tests with a plain TCP client standing in for the
//! browser redirect.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use sfsight::SightError;
use sfsight::core::listener::{bind_loopback, pick_unused_port, wait_for_token};

fn connect_and_send(port: u16, request: &str) -> std::thread::JoinHandle<String> {
    let request = request.to_string();
    std::thread::spawn(move || {
        // The accept loop polls; give it a moment to start.
        std::thread::sleep(Duration::from_millis(100));
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).ok();
        response
    })
}

#[test]
fn delivers_url_decoded_token_and_confirmation_page() {
    let port = pick_unused_port().unwrap();
    let listeners = bind_loopback(port).unwrap();
    let browser = connect_and_send(port, "GET /?token=saml%3Dtoken%20value HTTP/1.1\r\n\r\n");

    let token = wait_for_token(&listeners, Some(Duration::from_secs(5))).unwrap();
    assert_eq!(token, "saml=token value");

    let response = browser.join().unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("identity was confirmed"));
}

#[test]
fn non_get_request_is_a_protocol_violation() {
    let port = pick_unused_port().unwrap();
    let listeners = bind_loopback(port).unwrap();
    let browser = connect_and_send(port, "POST /?token=abc HTTP/1.1\r\n\r\n");

    let err = wait_for_token(&listeners, Some(Duration::from_secs(5))).unwrap_err();
    assert!(matches!(err, SightError::ProtocolViolation(_)));
    browser.join().unwrap();
}

#[test]
fn port_is_released_after_failure() {
    let port = pick_unused_port().unwrap();
    {
        let listeners = bind_loopback(port).unwrap();
        let browser = connect_and_send(port, "GET /?code=wrong HTTP/1.1\r\n\r\n");
        let err = wait_for_token(&listeners, Some(Duration::from_secs(5))).unwrap_err();
        assert!(matches!(err, SightError::ProtocolViolation(_)));
        browser.join().unwrap();
    }
    // Dropping the listeners must free the port.
    let rebound = TcpListener::bind(("127.0.0.1", port)).unwrap();
    drop(rebound);
}

#[test]
fn bounded_wait_expires_as_sso_timeout() {
    let port = pick_unused_port().unwrap();
    let listeners = bind_loopback(port).unwrap();

    let err = wait_for_token(&listeners, Some(Duration::from_millis(200))).unwrap_err();
    assert!(matches!(err, SightError::SsoTimeout { .. }));
}
