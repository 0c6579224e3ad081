//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! A background task owns the listener and only accepts sockets. Each
//! socket is negotiated in its own task (request head, then either a
//! status reply or the WebSocket handshake), so a slow or silent client
//! never holds up anyone else. Finished connections are queued for
//! [`accept`](Transport::accept).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::rewind::Rewind;
use crate::status::{self, RequestKind};
use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How long a client gets to send its request head.
const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the WebSocket handshake may take once the head is in.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Negotiated connections waiting for `accept`.
const ACCEPT_QUEUE: usize = 128;

type WsStream = tokio_tungstenite::WebSocketStream<Rewind<TcpStream>>;
type Accepted = Result<WebSocketConnection, TransportError>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
///
/// Plain HTTP requests that arrive on the same port are answered with a
/// status response (see [`StatusRoute`](crate::StatusRoute)) and never
/// surface from [`accept`](Transport::accept).
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    incoming: mpsc::Receiver<Accepted>,
    acceptor: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let local_addr = listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");

        let (tx, incoming) = mpsc::channel(ACCEPT_QUEUE);
        let acceptor = tokio::spawn(accept_loop(listener, tx));
        Ok(Self {
            local_addr,
            incoming,
            acceptor,
        })
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Waits for the next negotiated WebSocket connection.
    ///
    /// Cancel-safe: dropping the future loses no connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        match self.incoming.recv().await {
            Some(accepted) => accepted,
            None => Err(TransportError::AcceptFailed(std::io::Error::other(
                "listener task stopped",
            ))),
        }
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

/// Accepts sockets and hands each one to its own negotiation task.
async fn accept_loop(listener: TcpListener, tx: mpsc::Sender<Accepted>) {
    loop {
        let accepted = tokio::select! {
            _ = tx.closed() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, addr)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    match negotiate(stream, addr).await {
                        Ok(Some(conn)) => {
                            let _ = tx.send(Ok(conn)).await;
                        }
                        Ok(None) => {}
                        Err(e) => tracing::debug!(error = %e, "handshake failed"),
                    }
                });
            }
            Err(e) => {
                if tx.send(Err(TransportError::AcceptFailed(e))).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Reads the request head and either answers it as plain HTTP (`None`) or
/// completes the WebSocket handshake.
async fn negotiate(
    mut stream: TcpStream,
    addr: SocketAddr,
) -> Result<Option<WebSocketConnection>, TransportError> {
    let head = match tokio::time::timeout(HEAD_TIMEOUT, status::read_request_head(&mut stream))
        .await
    {
        Ok(Ok(head)) => head,
        Ok(Err(e)) => {
            return Err(TransportError::HandshakeFailed(format!("{addr}: {e}")));
        }
        Err(_) => {
            return Err(TransportError::HandshakeFailed(format!(
                "{addr}: request head timed out"
            )));
        }
    };

    match status::classify(&head) {
        Some(RequestKind::Upgrade) => {
            let handshake = tokio_tungstenite::accept_async(Rewind::new(head, stream));
            let ws = match tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake).await {
                Ok(Ok(ws)) => ws,
                Ok(Err(e)) => {
                    return Err(TransportError::HandshakeFailed(format!("{addr}: {e}")));
                }
                Err(_) => {
                    return Err(TransportError::HandshakeFailed(format!(
                        "{addr}: websocket handshake timed out"
                    )));
                }
            };

            let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
            tracing::debug!(%id, %addr, "accepted WebSocket connection");
            Ok(Some(WebSocketConnection::new(id, ws)))
        }
        Some(RequestKind::Status(route)) => {
            tracing::trace!(%addr, ?route, "plain HTTP request");
            if let Err(e) = status::respond(&mut stream, &route).await {
                tracing::debug!(%addr, error = %e, "status response failed");
            }
            Ok(None)
        }
        None => Err(TransportError::HandshakeFailed(format!(
            "{addr}: malformed request head"
        ))),
    }
}

/// A single WebSocket connection.
///
/// The socket is split so one task can block in [`recv`](Connection::recv)
/// while another sends.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    open: AtomicBool,
}

impl WebSocketConnection {
    fn new(id: ConnectionId, ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            open: AtomicBool::new(true),
        }
    }

    fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, text: &str) -> Result<(), Self::Error> {
        if !self.is_open() {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }
        let result = self
            .sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await;
        result.map_err(|e| {
            self.mark_closed();
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.mark_closed();
                    return Ok(None);
                }
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    self.mark_closed();
                    let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, e);
                    return Err(TransportError::ReceiveFailed(err));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.mark_closed();
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
