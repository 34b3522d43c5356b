//! Sprig networking
//!
//! Request/response model, content-kind decoding, and the async
//! `Transport` seam the engine fetches through.

mod decode;
mod request;
mod transport;

pub use decode::Decoded;
pub use request::{Method, Request};
pub use transport::{HttpTransport, Transport, TransportFuture};

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Get header value (case-insensitive name)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get body as text
    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.body.clone()).map_err(|e| NetError::Decode(e.to_string()))
    }
}

/// Network error
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> Response {
        Response {
            status,
            headers: vec![("Content-Type".into(), "text/plain".into())],
            body: b"hello".to_vec(),
        }
    }

    #[test]
    fn test_ok_range() {
        assert!(response(200).ok());
        assert!(response(204).ok());
        assert!(!response(301).ok());
        assert!(!response(404).ok());
        assert!(!response(500).ok());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = response(200);
        assert_eq!(resp.header("content-type"), Some("text/plain"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_text() {
        assert_eq!(response(200).text().unwrap(), "hello");
    }
}
