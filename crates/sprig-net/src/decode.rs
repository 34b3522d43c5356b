//! Response decoding
//!
//! Responses carry either structured data or plain text, selected by
//! the declared content kind. Structured wins whenever the content type
//! says JSON; a body that then fails to parse is a decode error, not
//! silently downgraded to text.

use crate::{NetError, Response};

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Structured data (JSON content kinds)
    Json(serde_json::Value),
    /// Everything else
    Text(String),
}

impl Decoded {
    /// Decode a response body by its declared content kind
    pub fn from_response(response: &Response) -> Result<Decoded, NetError> {
        let content_type = response.header("content-type").unwrap_or("");
        if is_json_kind(content_type) {
            let value = serde_json::from_slice(&response.body)
                .map_err(|e| NetError::Decode(e.to_string()))?;
            Ok(Decoded::Json(value))
        } else {
            Ok(Decoded::Text(
                String::from_utf8_lossy(&response.body).into_owned(),
            ))
        }
    }
}

fn is_json_kind(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content_type: &str, body: &[u8]) -> Response {
        Response {
            status: 200,
            headers: vec![("Content-Type".into(), content_type.into())],
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_json_kind() {
        let resp = response("application/json", br#"{"items":["a","b"]}"#);
        assert_eq!(
            Decoded::from_response(&resp).unwrap(),
            Decoded::Json(json!({"items": ["a", "b"]}))
        );
    }

    #[test]
    fn test_json_with_charset_and_suffix() {
        let resp = response("application/json; charset=utf-8", b"[1]");
        assert!(matches!(Decoded::from_response(&resp).unwrap(), Decoded::Json(_)));

        let resp = response("application/hal+json", b"{}");
        assert!(matches!(Decoded::from_response(&resp).unwrap(), Decoded::Json(_)));
    }

    #[test]
    fn test_plain_text() {
        let resp = response("text/html", b"<p>hi</p>");
        assert_eq!(
            Decoded::from_response(&resp).unwrap(),
            Decoded::Text("<p>hi</p>".into())
        );
    }

    #[test]
    fn test_missing_content_type_is_text() {
        let resp = Response {
            status: 200,
            headers: vec![],
            body: b"raw".to_vec(),
        };
        assert_eq!(Decoded::from_response(&resp).unwrap(), Decoded::Text("raw".into()));
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let resp = response("application/json", b"{not json");
        assert!(matches!(
            Decoded::from_response(&resp),
            Err(NetError::Decode(_))
        ));
    }
}
