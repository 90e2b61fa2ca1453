//! Integration tests for the WebSocket client connection.
//!
//! These tests spin up a real WebSocket server on a random local port and
//! drive it with raw `tokio-tungstenite` calls, so what the client sees is
//! exactly what a game server would produce on the wire.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use gamelink_transport::{
        Connection, Frame, TransportError, WebSocketConnection,
    };
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a listener on a random port and connects a client to it.
    /// Returns the client connection and the server side of the socket.
    async fn connected_pair() -> (WebSocketConnection, ServerWs) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("should accept");
            tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake should succeed")
        });

        let client = WebSocketConnection::connect(&format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let server_ws = server.await.expect("task should complete");
        (client, server_ws)
    }

    #[tokio::test]
    async fn test_text_frames_flow_both_ways() {
        let (client, mut server) = connected_pair().await;
        assert!(client.id().into_inner() > 0);

        server
            .send(Message::Text("hello from server".into()))
            .await
            .unwrap();
        let frame = client.recv().await.expect("recv").expect("frame");
        assert_eq!(frame, Frame::Text("hello from server".into()));

        client
            .send(Frame::Text("hello from client".into()))
            .await
            .expect("send should succeed");
        let msg = server.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "hello from client");
    }

    #[tokio::test]
    async fn test_binary_frame_is_reported_as_binary() {
        let (client, mut server) = connected_pair().await;

        server
            .send(Message::Binary(vec![1, 2, 3].into()))
            .await
            .unwrap();
        let frame = client.recv().await.expect("recv").expect("frame");
        assert_eq!(frame, Frame::Binary(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_normal_close() {
        let (client, mut server) = connected_pair().await;

        server
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: String::new().into(),
            })))
            .await
            .unwrap();

        let result = client.recv().await.expect("recv should not error");
        assert!(result.is_none(), "normal close is a clean end of stream");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_going_away() {
        let (client, mut server) = connected_pair().await;

        server
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Away,
                reason: "restarting".to_string().into(),
            })))
            .await
            .unwrap();

        assert!(client.recv().await.expect("clean close").is_none());
    }

    #[tokio::test]
    async fn test_recv_errors_on_abnormal_close_code() {
        let (client, mut server) = connected_pair().await;

        server
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Error,
                reason: "boom".to_string().into(),
            })))
            .await
            .unwrap();

        match client.recv().await {
            Err(TransportError::ConnectionClosed(reason)) => {
                assert!(reason.contains("1011"), "got {reason}");
                assert!(reason.contains("boom"), "got {reason}");
            }
            other => panic!("expected ConnectionClosed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_sends_close_frame_to_server() {
        let (client, mut server) = connected_pair().await;

        client.close().await.expect("close should succeed");

        let msg = server.next().await.unwrap().unwrap();
        match msg {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, CloseCode::Normal);
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_abort_wakes_pending_recv() {
        let (client, _server) = connected_pair().await;
        let client = std::sync::Arc::new(client);

        let reader = {
            let client = std::sync::Arc::clone(&client);
            tokio::spawn(async move { client.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        client.abort();

        let result = tokio::time::timeout(Duration::from_secs(2), reader)
            .await
            .expect("recv should return after abort")
            .expect("task should complete");
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = WebSocketConnection::connect(&format!("ws://{addr}")).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }
}
