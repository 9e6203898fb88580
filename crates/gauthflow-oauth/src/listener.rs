//! One-shot loopback listener for the authorization redirect.
//!
//! The provider redirects the user's browser back to the loopback address
//! with the authorization `code` and the anti-forgery `state` in the query
//! string. The listener accepts that single request, answers with a small
//! HTML page, and hands the captured pair back to the flow as one
//! structured message.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error};

use crate::error::{AuthError, AuthResult};

/// Parameters captured from the provider redirect.
///
/// Parameters absent from the query string are left empty: a missing state
/// fails the downstream equality check, and a missing code is rejected by
/// the token endpoint rather than diagnosed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResult {
    /// The `state` query parameter.
    pub state: String,
    /// The `code` query parameter.
    pub code: String,
}

/// Local HTTP server that captures the single expected redirect.
#[derive(Debug)]
pub struct RedirectListener {
    listener: TcpListener,
}

impl RedirectListener {
    /// Binds the listener on the given loopback port.
    pub fn bind(port: u16) -> AuthResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        debug!("listening for the redirect on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    /// The port the listener is bound to.
    pub fn port(&self) -> AuthResult<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Blocks until the redirect arrives and returns the captured pair.
    ///
    /// With `timeout` set, waiting is bounded; `None` waits forever. The
    /// accept loop runs on a background thread that is deliberately not
    /// joined -- exactly one exchange happens per process run, and the
    /// socket is reclaimed at process exit.
    pub fn recv(self, timeout: Option<Duration>) -> AuthResult<CallbackResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for stream in self.listener.incoming() {
                match stream {
                    Ok(stream) => {
                        if let Some(result) = handle_redirect(stream) {
                            let _ = tx.send(result);
                            return;
                        }
                    }
                    Err(e) => error!("failed to accept connection: {}", e),
                }
            }
        });

        match timeout {
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(result) => Ok(result),
                Err(mpsc::RecvTimeoutError::Timeout) => Err(AuthError::Timeout),
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(AuthError::ListenerClosed),
            },
            None => rx.recv().map_err(|_| AuthError::ListenerClosed),
        }
    }
}

/// Handles one inbound connection; returns the captured parameters for the
/// first well-formed GET request.
fn handle_redirect(mut stream: TcpStream) -> Option<CallbackResult> {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();

    if reader.read_line(&mut request_line).is_err() {
        return None;
    }

    // Request line: GET /any/path?code=...&state=... HTTP/1.1
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 || parts[0] != "GET" {
        respond(&mut stream, "HTTP/1.1 400 Bad Request", "Unexpected request.");
        return None;
    }

    let path = parts[1];
    let query = path.find('?').map(|i| &path[i + 1..]).unwrap_or("");
    let result = parse_query(query);

    respond(
        &mut stream,
        "HTTP/1.1 200 OK",
        "Authorization received. You can close this window and return to the terminal.",
    );

    Some(result)
}

/// Extracts `code` and `state` from a query string, in any order.
fn parse_query(query: &str) -> CallbackResult {
    let mut state = String::new();
    let mut code = String::new();

    for param in query.split('&') {
        let mut kv = param.splitn(2, '=');
        if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
            match key {
                "code" => code = urlencoding::decode(value).unwrap_or_default().into_owned(),
                "state" => state = urlencoding::decode(value).unwrap_or_default().into_owned(),
                _ => {}
            }
        }
    }

    CallbackResult { state, code }
}

fn respond(stream: &mut TcpStream, status: &str, message: &str) {
    let response = format!(
        "{status}\r\nContent-Type: text/html\r\n\r\n<html><body><p>{message}</p></body></html>"
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_extraction_is_order_independent() {
        let a = parse_query("state=S&code=C");
        let b = parse_query("code=C&state=S");
        assert_eq!(a, b);
        assert_eq!(a.state, "S");
        assert_eq!(a.code, "C");
    }

    #[test]
    fn missing_parameters_are_empty() {
        let result = parse_query("code=C");
        assert_eq!(result.state, "");
        assert_eq!(result.code, "C");

        let empty = parse_query("");
        assert_eq!(empty.state, "");
        assert_eq!(empty.code, "");
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let result = parse_query("scope=email&state=S&authuser=0&code=C");
        assert_eq!(result.state, "S");
        assert_eq!(result.code, "C");
    }

    #[test]
    fn values_are_percent_decoded() {
        let result = parse_query("code=4%2FabcDEF&state=a%2Bb%3D");
        assert_eq!(result.code, "4/abcDEF");
        assert_eq!(result.state, "a+b=");
    }

    #[test]
    fn delivers_callback_from_a_real_request() {
        let listener = RedirectListener::bind(0).unwrap();
        let port = listener.port().unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            stream
                .write_all(b"GET /?state=S123&code=C456 HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .unwrap();
            let mut reader = BufReader::new(&stream);
            let mut status_line = String::new();
            reader.read_line(&mut status_line).unwrap();
            status_line
        });

        let result = listener.recv(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(result.state, "S123");
        assert_eq!(result.code, "C456");

        let status_line = client.join().unwrap();
        assert!(status_line.starts_with("HTTP/1.1 200"));
    }

    #[test]
    fn captures_parameters_on_any_path() {
        let listener = RedirectListener::bind(0).unwrap();
        let port = listener.port().unwrap();

        thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            stream
                .write_all(b"GET /oauth2/callback?code=C&state=S HTTP/1.1\r\n\r\n")
                .unwrap();
        });

        let result = listener.recv(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(result, CallbackResult {
            state: "S".to_string(),
            code: "C".to_string(),
        });
    }

    #[test]
    fn times_out_without_a_callback() {
        let listener = RedirectListener::bind(0).unwrap();
        let err = listener.recv(Some(Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, AuthError::Timeout));
    }
}
