//! Plain HTTP handling on the WebSocket listener.
//!
//! Anything that is not a WebSocket upgrade is answered with a small
//! `text/plain` response and closed. `GET /health` is what load balancers
//! poll; every other path gets a generic body.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on the request head we are willing to buffer.
pub(crate) const MAX_HEAD_BYTES: usize = 8 * 1024;

const MAX_HEADERS: usize = 64;

/// Body returned for `/health`.
pub const HEALTH_BODY: &str = "ok";

/// Body returned for every other plain HTTP path.
pub const GENERIC_BODY: &str = "tandem relay";

/// What a plain HTTP request is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRoute {
    /// `/health`, matched exactly (a query string falls through to `Other`).
    Health,
    /// Any other path.
    Other(String),
}

impl StatusRoute {
    fn from_path(path: &str) -> Self {
        if path == "/health" {
            Self::Health
        } else {
            Self::Other(path.to_string())
        }
    }

    /// The response body for this route.
    pub fn body(&self) -> &'static str {
        match self {
            Self::Health => HEALTH_BODY,
            Self::Other(_) => GENERIC_BODY,
        }
    }
}

/// How the listener should treat a freshly read request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestKind {
    Upgrade,
    Status(StatusRoute),
}

/// Reads from `stream` until a complete HTTP request head is buffered.
///
/// Returns every byte read so far, which may include data past the head.
pub(crate) async fn read_request_head<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before request head",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return Ok(buf);
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
    }
}

/// Parses a buffered request head. `None` means it was not valid HTTP.
pub(crate) fn classify(head: &[u8]) -> Option<RequestKind> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);
    match request.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        _ => return None,
    }

    let upgrade = request.headers.iter().any(|h| {
        h.name.eq_ignore_ascii_case("upgrade")
            && std::str::from_utf8(h.value)
                .map(|v| v.to_ascii_lowercase().contains("websocket"))
                .unwrap_or(false)
    });
    if upgrade {
        return Some(RequestKind::Upgrade);
    }

    let path = request.path.unwrap_or("/");
    Some(RequestKind::Status(StatusRoute::from_path(path)))
}

/// Writes a `200 OK` plain-text response for `route` and shuts the stream.
pub(crate) async fn respond<S>(stream: &mut S, route: &StatusRoute) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let body = route.body();
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
