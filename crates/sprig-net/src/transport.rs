//! Transport
//!
//! The engine fetches through the `Transport` trait so hosts (and
//! tests) can substitute their own client. The bundled `HttpTransport`
//! speaks plain HTTP/1.1 over smol's async TCP with `Connection:
//! close` framing. HTTPS is not implemented here; a host needing TLS
//! supplies its own `Transport`.

use std::future::Future;
use std::pin::Pin;

use smol::io::{AsyncReadExt, AsyncWriteExt};
use smol::net::TcpStream;

use crate::{NetError, Request, Response};

/// Future returned by a transport
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response, NetError>>>>;

/// Pluggable request executor
pub trait Transport {
    fn send(&self, request: Request) -> TransportFuture;
}

/// Plain HTTP/1.1 transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    user_agent: String,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            user_agent: "Sprig/0.1".into(),
        }
    }

    pub fn with_user_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> TransportFuture {
        let user_agent = self.user_agent.clone();
        Box::pin(async move { execute(&user_agent, request).await })
    }
}

async fn execute(user_agent: &str, req: Request) -> Result<Response, NetError> {
    let url = UrlParts::parse(&req.url)?;
    tracing::info!("HTTP {} {}", req.method.as_str(), req.url);

    let mut stream = TcpStream::connect(url.authority())
        .await
        .map_err(|e| NetError::Network(format!("connection failed: {}", e)))?;

    let payload = build_request(user_agent, &url, &req);
    stream
        .write_all(&payload)
        .await
        .map_err(|e| NetError::Network(format!("write failed: {}", e)))?;

    let mut raw = Vec::new();
    stream
        .read_to_end(&mut raw)
        .await
        .map_err(|e| NetError::Network(format!("read failed: {}", e)))?;

    parse_response(&raw)
}

fn build_request(user_agent: &str, url: &UrlParts, req: &Request) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} HTTP/1.1\r\n",
        req.method.as_str(),
        url.path_and_query()
    ));
    out.push_str(&format!("Host: {}\r\n", url.host_with_port()));
    out.push_str(&format!("User-Agent: {}\r\n", user_agent));
    out.push_str("Connection: close\r\n");
    for (name, value) in &req.headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    if let Some(body) = &req.body {
        out.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    out.push_str("\r\n");

    let mut bytes = out.into_bytes();
    if let Some(body) = &req.body {
        bytes.extend_from_slice(body);
    }
    bytes
}

fn parse_response(raw: &[u8]) -> Result<Response, NetError> {
    let split = find_header_end(raw)
        .ok_or_else(|| NetError::Network("malformed response: no header terminator".into()))?;
    let head = String::from_utf8_lossy(&raw[..split]);
    let mut lines = head.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| NetError::Network("empty response".into()))?;
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| NetError::Network(format!("bad status line: {}", status_line)))?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(NetError::Network(format!("bad header line: {}", line)));
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let rest = &raw[split + 4..];
    let chunked = headers
        .iter()
        .any(|(n, v)| n.eq_ignore_ascii_case("transfer-encoding") && v.contains("chunked"));
    let body = if chunked {
        dechunk(rest)?
    } else {
        let declared = headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok());
        match declared {
            Some(len) if len <= rest.len() => rest[..len].to_vec(),
            _ => rest.to_vec(),
        }
    };

    Ok(Response {
        status,
        headers,
        body,
    })
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

fn dechunk(mut rest: &[u8]) -> Result<Vec<u8>, NetError> {
    let mut body = Vec::new();
    loop {
        let line_end = rest
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| NetError::Network("malformed chunk size".into()))?;
        let size_text = String::from_utf8_lossy(&rest[..line_end]);
        let size = usize::from_str_radix(size_text.trim().split(';').next().unwrap_or(""), 16)
            .map_err(|_| NetError::Network(format!("bad chunk size: {}", size_text)))?;
        rest = &rest[line_end + 2..];
        if size == 0 {
            break;
        }
        if rest.len() < size {
            return Err(NetError::Network("truncated chunk".into()));
        }
        body.extend_from_slice(&rest[..size]);
        rest = &rest[size..];
        if rest.starts_with(b"\r\n") {
            rest = &rest[2..];
        }
    }
    Ok(body)
}

/// Simple URL parsing (for internal use)
#[derive(Debug)]
struct UrlParts {
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl UrlParts {
    fn parse(url: &str) -> Result<Self, NetError> {
        if url.starts_with("https://") {
            return Err(NetError::InvalidUrl(
                "https is not supported by the bundled transport".into(),
            ));
        }
        let Some(rest) = url.strip_prefix("http://") else {
            return Err(NetError::InvalidUrl(format!("invalid scheme: {}", url)));
        };

        let (host_port, path_query) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        let (host, port) = if let Some(colon) = host_port.rfind(':') {
            let port: u16 = host_port[colon + 1..]
                .parse()
                .map_err(|_| NetError::InvalidUrl("invalid port".into()))?;
            (host_port[..colon].to_string(), Some(port))
        } else {
            (host_port.to_string(), None)
        };
        if host.is_empty() {
            return Err(NetError::InvalidUrl("missing host".into()));
        }

        let (path, query) = match path_query.find('?') {
            Some(i) => (&path_query[..i], Some(path_query[i + 1..].to_string())),
            None => (path_query, None),
        };

        Ok(Self {
            host,
            port,
            path: path.to_string(),
            query,
        })
    }

    fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    fn host_with_port(&self) -> String {
        match self.port {
            Some(p) => format!("{}:{}", self.host, p),
            None => self.host.clone(),
        }
    }

    fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(80))
    }
}
