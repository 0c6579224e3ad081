//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client or a raw TCP socket.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use tandem_transport::{Connection, GENERIC_BODY, HEALTH_BODY, Transport, WebSocketTransport};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    type ClientWs = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    async fn plain_get(addr: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.expect("tcp connect");
        let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\n\r\n");
        stream.write_all(request.as_bytes()).await.expect("write");
        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .expect("read response");
        response
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");
        assert!(server_conn.id().into_inner() > 0);
        assert!(server_conn.is_open());

        // --- Server sends, client receives ---
        server_conn
            .send(r#"{"t":"ready"}"#)
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"t":"ready"}"#);

        // --- Client sends, server receives ---
        client_ws
            .send(Message::Text(r#"{"t":"start"}"#.into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"t":"start"}"#);

        server_conn.close().await.expect("close should succeed");
        assert!(!server_conn.is_open());
        assert!(server_conn.send("late").await.is_err());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
        assert!(!server_conn.is_open());
    }

    #[tokio::test]
    async fn test_health_endpoint_on_same_listener() {
        let (mut transport, addr) = bind().await;

        // Status requests are answered by the listener task; nothing
        // surfaces from accept() until a WebSocket arrives.
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let health = plain_get(&addr, "/health").await;
        assert!(health.starts_with("HTTP/1.1 200 OK"), "got {health}");
        assert!(health.contains("text/plain"));
        assert!(health.ends_with(HEALTH_BODY));

        let other = plain_get(&addr, "/anything").await;
        assert!(other.starts_with("HTTP/1.1 200 OK"));
        assert!(other.ends_with(GENERIC_BODY));

        // The listener still hands out WebSocket connections afterwards.
        let _client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();
        assert!(server_conn.is_open());
    }

    #[tokio::test]
    async fn test_silent_socket_does_not_block_other_clients() {
        let (mut transport, addr) = bind().await;

        // Connects and never sends a request head.
        let _silent = TcpStream::connect(&addr).await.expect("tcp connect");

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let started = std::time::Instant::now();
        let _client_ws = connect_client(&addr).await;
        let server_conn = tokio::time::timeout(std::time::Duration::from_secs(1), server_handle)
            .await
            .expect("accept should not wait on the silent socket")
            .unwrap();
        assert!(server_conn.is_open());
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }
}
