//! HTTP/1.1 request framing
//!
//! Every request has the same shape: `GET`, a fixed header set, no body.
//! `Connection: close` is what lets the reader treat peer shutdown as the
//! end of the response.

use crate::target::RequestTarget;

/// Value of the `Accept` header
pub const ACCEPT: &str = "text/html,application/json";

/// Value of the `Accept-Encoding` header. Only gzip is decoded.
pub const ACCEPT_ENCODING: &str = "gzip, deflate";

/// Serialize the GET request for `target`
pub fn frame_request(target: &RequestTarget, user_agent: &str) -> Vec<u8> {
    let mut request = format!("GET {} HTTP/1.1\r\n", target.request_path());
    request.push_str(&format!("Host: {}\r\n", target.host_header()));
    request.push_str(&format!("User-Agent: {}\r\n", user_agent));
    request.push_str(&format!("Accept: {}\r\n", ACCEPT));
    request.push_str(&format!("Accept-Encoding: {}\r\n", ACCEPT_ENCODING));
    request.push_str("Connection: close\r\n");
    request.push_str("\r\n");
    request.into_bytes()
}
