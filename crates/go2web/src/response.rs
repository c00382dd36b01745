//! Response reading and decoding
//!
//! The reader pulls bytes until the peer closes the stream. The decoder
//! splits headers from body, undoes chunked framing and gzip, then turns
//! the body into text. Only a missing header/body boundary is fatal; every
//! decoding step after that degrades to the bytes it was given.

use crate::error::FetchError;
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::io::{self, Read};
use tracing::{debug, warn};

/// Read buffer size
const READ_CHUNK: usize = 4096;

/// Header/body separator
const BOUNDARY: &[u8] = b"\r\n\r\n";

/// Read until a zero-length read signals peer closure
///
/// Relies on the request having sent `Connection: close`. There is no read
/// timeout: a peer that never closes stalls the caller.
pub fn read_to_close<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => response.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // TLS peers commonly drop the socket without close_notify
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }

    Ok(response)
}

/// Response bytes split at the first blank line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub header_block: Vec<u8>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Split at the first CRLF CRLF; no boundary means the response is malformed
    pub fn split(bytes: &[u8]) -> Result<Self, FetchError> {
        let header_end = bytes
            .windows(BOUNDARY.len())
            .position(|w| w == BOUNDARY)
            .ok_or(FetchError::MalformedResponse)?;

        Ok(Self {
            header_block: bytes[..header_end].to_vec(),
            body: bytes[header_end + BOUNDARY.len()..].to_vec(),
        })
    }
}

/// Which decoder produced the response text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    /// Every byte mapped to the code point of the same value
    Latin1,
}

/// Fully decoded response
#[derive(Debug, Clone)]
pub struct DecodedResponse {
    pub status_line: String,
    /// Numeric status, if the status line was well formed
    pub status: Option<u16>,
    /// Lowercased header names; the last occurrence of a name wins
    pub headers: HashMap<String, String>,
    pub text: String,
    pub charset: Charset,
}

impl DecodedResponse {
    /// Decode split response bytes into text
    pub fn decode(raw: RawResponse) -> Self {
        let header_block = String::from_utf8_lossy(&raw.header_block);
        let (status_line, headers) = parse_header_block(&header_block);
        let status = parse_status_code(&status_line);

        let mut body = raw.body;

        if header_contains(&headers, "transfer-encoding", "chunked") {
            match dechunk(&body) {
                Some(joined) => body = joined,
                None => warn!("Malformed chunked body, using raw bytes"),
            }
        }

        if header_contains(&headers, "content-encoding", "gzip") {
            match gunzip(&body) {
                Ok(inflated) => body = inflated,
                Err(e) => warn!(error = %e, "Gzip decoding failed, using raw bytes"),
            }
        }

        let (text, charset) = decode_text(&body);
        if charset != Charset::Utf8 {
            debug!(?charset, "Body was not valid UTF-8");
        }

        Self {
            status_line,
            status,
            headers,
            text,
            charset,
        }
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Split the header block into its status line and a header map
fn parse_header_block(block: &str) -> (String, HashMap<String, String>) {
    let mut lines = block.lines();
    let status_line = lines.next().unwrap_or_default().trim().to_string();

    let headers = lines
        .filter_map(|line| {
            // Obsolete folded continuation lines are dropped
            if line.starts_with(char::is_whitespace) {
                return None;
            }
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect();

    (status_line, headers)
}

/// Parse the numeric code from a status line like `HTTP/1.1 302 Found`
pub fn parse_status_code(status_line: &str) -> Option<u16> {
    let mut parts = status_line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

fn header_contains(headers: &HashMap<String, String>, name: &str, token: &str) -> bool {
    headers
        .get(name)
        .map(|v| v.to_ascii_lowercase().contains(token))
        .unwrap_or(false)
}

/// Undo `Transfer-Encoding: chunked` framing; `None` if the framing is broken
fn dechunk(body: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len());
    let mut rest = body;

    loop {
        let line_end = rest.windows(2).position(|w| w == b"\r\n")?;
        let size_line = std::str::from_utf8(&rest[..line_end]).ok()?;
        let size_hex = size_line.split(';').next()?.trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        rest = &rest[line_end + 2..];

        if size == 0 {
            // Trailers, if any, are ignored
            return Some(out);
        }

        let end = size.checked_add(2)?;
        if rest.get(size..end) != Some(b"\r\n".as_slice()) {
            return None;
        }
        out.extend_from_slice(&rest[..size]);
        rest = &rest[end..];
    }
}

fn gunzip(body: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(body);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Decode bytes to text: UTF-8, else Latin-1
///
/// Latin-1 assigns a character to every byte value, so it cannot fail and
/// no lossy step is ever needed after it. C1 bytes (0x80..=0x9F) come
/// through as control characters.
pub fn decode_text(bytes: &[u8]) -> (String, Charset) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), Charset::Utf8),
        Err(_) => {
            let text = bytes.iter().map(|&b| char::from(b)).collect();
            (text, Charset::Latin1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn response(head: &str, body: &[u8]) -> DecodedResponse {
        let mut bytes = head.as_bytes().to_vec();
        bytes.extend_from_slice(body);
        DecodedResponse::decode(RawResponse::split(&bytes).unwrap())
    }

    /// Reader that hands out small pieces, then fails like a rustls unclean close
    struct UncleanClose {
        data: Cursor<Vec<u8>>,
    }

    impl Read for UncleanClose {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let limit = buf.len().min(3);
            match self.data.read(&mut buf[..limit])? {
                0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_read_to_close_accumulates_everything() {
        let payload = vec![b'x'; READ_CHUNK * 3 + 17];
        let mut reader = Cursor::new(payload.clone());
        assert_eq!(read_to_close(&mut reader).unwrap(), payload);
    }

    #[test]
    fn test_read_to_close_tolerates_unclean_tls_close() {
        let mut reader = UncleanClose {
            data: Cursor::new(b"HTTP/1.1 200 OK\r\n\r\nhi".to_vec()),
        };
        assert_eq!(
            read_to_close(&mut reader).unwrap(),
            b"HTTP/1.1 200 OK\r\n\r\nhi".to_vec()
        );
    }

    #[test]
    fn test_split_at_first_boundary() {
        let raw = RawResponse::split(b"HTTP/1.1 200 OK\r\nA: b\r\n\r\nbody\r\n\r\nmore").unwrap();
        assert_eq!(raw.header_block, b"HTTP/1.1 200 OK\r\nA: b".to_vec());
        assert_eq!(raw.body, b"body\r\n\r\nmore".to_vec());
    }

    #[test]
    fn test_split_without_boundary_is_malformed() {
        let err = RawResponse::split(b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse));
        assert!(matches!(
            RawResponse::split(b"").unwrap_err(),
            FetchError::MalformedResponse
        ));
    }

    #[test]
    fn test_empty_body_is_not_malformed() {
        let decoded = response("HTTP/1.1 204 No Content\r\n\r\n", b"");
        assert_eq!(decoded.status, Some(204));
        assert_eq!(decoded.text, "");
    }

    #[test]
    fn test_parse_status_code() {
        assert_eq!(parse_status_code("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(parse_status_code("HTTP/1.0 302 Found"), Some(302));
        assert_eq!(parse_status_code("HTTP/1.1 301"), Some(301));
        assert_eq!(parse_status_code("HTTP/1.1 2000 Weird"), None);
        assert_eq!(parse_status_code("garbage 302"), None);
        assert_eq!(parse_status_code(""), None);
    }

    #[test]
    fn test_headers_case_insensitive() {
        let decoded = response(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nX-Thing:  spaced \r\n\r\n",
            b"ok",
        );
        assert_eq!(decoded.status_line, "HTTP/1.1 200 OK");
        assert_eq!(decoded.header("content-type"), Some("text/html"));
        assert_eq!(decoded.header("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(decoded.header("x-thing"), Some("spaced"));
        assert_eq!(decoded.header("location"), None);
    }

    #[test]
    fn test_gzip_body_is_inflated() {
        let body = gzip(b"<p>compressed</p>");
        let decoded = response(
            "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\n\r\n",
            &body,
        );
        assert_eq!(decoded.text, "<p>compressed</p>");
    }

    #[test]
    fn test_gzip_header_value_case_insensitive() {
        let body = gzip(b"hello");
        let decoded = response("HTTP/1.1 200 OK\r\ncontent-encoding: GZIP\r\n\r\n", &body);
        assert_eq!(decoded.text, "hello");
    }

    #[test]
    fn test_bad_gzip_falls_back_to_raw() {
        let decoded = response(
            "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\n\r\n",
            b"not actually gzip",
        );
        assert_eq!(decoded.text, "not actually gzip");
    }

    #[test]
    fn test_deflate_is_not_decoded() {
        // deflate is advertised in Accept-Encoding but has no decoder
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"deflated text").unwrap();
        let body = encoder.finish().unwrap();

        let decoded = response("HTTP/1.1 200 OK\r\nContent-Encoding: deflate\r\n\r\n", &body);
        assert_ne!(decoded.text, "deflated text");
        assert_eq!(decoded.text, decode_text(&body).0);
    }

    #[test]
    fn test_chunked_body() {
        let decoded = response(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n",
            b"5\r\nHello\r\n7;ext=1\r\n world.\r\n0\r\n\r\n",
        );
        assert_eq!(decoded.text, "Hello world.");
    }

    #[test]
    fn test_chunked_then_gzip() {
        let compressed = gzip(b"chunked and gzipped");
        let mut body = format!("{:x}\r\n", compressed.len()).into_bytes();
        body.extend_from_slice(&compressed);
        body.extend_from_slice(b"\r\n0\r\n\r\n");

        let decoded = response(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Encoding: gzip\r\n\r\n",
            &body,
        );
        assert_eq!(decoded.text, "chunked and gzipped");
    }

    #[test]
    fn test_oversized_chunk_size_falls_back_to_raw() {
        let body = b"ffffffffffffffff\r\nabc\r\n0\r\n\r\n";
        let decoded = response("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n", body);
        assert_eq!(decoded.text, String::from_utf8_lossy(body));
        assert_eq!(dechunk(body), None);
    }

    #[test]
    fn test_chunk_longer_than_body_falls_back_to_raw() {
        assert_eq!(dechunk(b"20\r\nshort\r\n0\r\n\r\n"), None);
    }

    #[test]
    fn test_broken_chunked_falls_back_to_raw() {
        let decoded = response(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n",
            b"zz\r\nnot chunked",
        );
        assert_eq!(decoded.text, "zz\r\nnot chunked");
    }

    #[test]
    fn test_decode_text_utf8() {
        let (text, charset) = decode_text("héllo wörld".as_bytes());
        assert_eq!(text, "héllo wörld");
        assert_eq!(charset, Charset::Utf8);
    }

    #[test]
    fn test_decode_text_latin1_fallback() {
        // "café" in Latin-1 is invalid UTF-8
        let (text, charset) = decode_text(&[b'c', b'a', b'f', 0xE9]);
        assert_eq!(text, "café");
        assert_eq!(charset, Charset::Latin1);
    }

    #[test]
    fn test_decode_text_latin1_keeps_c1_bytes() {
        // cp1252 smart quotes are C1 controls in Latin-1; the é must survive
        let (text, charset) = decode_text(&[b'c', b'a', b'f', 0xE9, b' ', 0x93, b'x', 0x94]);
        assert_eq!(charset, Charset::Latin1);
        assert_eq!(text, "café \u{93}x\u{94}");
        assert!(!text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_decode_text_never_fails() {
        let bytes: Vec<u8> = (0..=255).collect();
        let (text, charset) = decode_text(&bytes);
        assert_eq!(charset, Charset::Latin1);
        assert_eq!(text.chars().count(), 256);
    }
}
